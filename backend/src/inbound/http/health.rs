//! Health endpoints: the public healthcheck plus liveness and readiness
//! probes for orchestrators and load balancers.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

use super::state::HttpState;

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Healthcheck payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthcheckResponse {
    #[schema(example = "available")]
    pub status: &'static str,
    #[schema(example = "development")]
    pub environment: String,
}

/// Report that the API is available and which environment it runs in.
#[utoipa::path(
    get,
    path = "/v1/healthcheck",
    tags = ["health"],
    security([]),
    responses((status = 200, description = "API available", body = HealthcheckResponse))
)]
pub async fn healthcheck(state: web::Data<HttpState>) -> web::Json<HealthcheckResponse> {
    web::Json(HealthcheckResponse {
        status: "available",
        environment: state.environment.clone(),
    })
}

/// Readiness probe. Return 200 once start-up work (migrations, admin
/// bootstrap) has finished.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::App;
    use rstest::rstest;

    #[rstest]
    fn starts_live_but_not_ready() {
        let state = HealthState::new();
        assert!(state.is_alive());
        assert!(!state.is_ready());
    }

    #[rstest]
    #[actix_web::test]
    async fn probes_follow_state_transitions() {
        let state = web::Data::new(HealthState::new());
        let app = actix_web::test::init_service(
            App::new()
                .app_data(state.clone())
                .route("/health/ready", web::get().to(ready))
                .route("/health/live", web::get().to(live)),
        )
        .await;

        let res = actix_web::test::call_service(&app, actix_web::test::TestRequest::get().uri("/health/ready").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.mark_ready();
        let res = actix_web::test::call_service(&app, actix_web::test::TestRequest::get().uri("/health/ready").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );

        state.mark_unhealthy();
        let res = actix_web::test::call_service(&app, actix_web::test::TestRequest::get().uri("/health/live").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
