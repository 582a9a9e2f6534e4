//! Login and logout handlers.
//!
//! ```text
//! POST /v1/auth/login {"username":"alice","password":"..."}
//! POST /v1/auth/logout
//! ```

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{ApiResult, Error, LoginCredentials};

use super::schemas::UserEnvelope;
use super::state::HttpState;
use super::validation::credential_errors;

/// Login request body.
///
/// Missing fields are treated as empty and reported per field.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Authenticate and set the session cookie.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserEnvelope,
            headers(("Set-Cookie" = String, description = "accessToken session cookie"))),
        (status = 400, description = "Malformed body", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 422, description = "Validation failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&body.username, &body.password)
        .map_err(credential_errors)?;
    let session = state.login.login(&credentials).await?;
    let cookie = state.cookies.session_cookie(&session.token)?;
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(UserEnvelope::from(session.user)))
}

/// Clear the session cookie.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared",
            headers(("Set-Cookie" = String, description = "expired accessToken cookie")))
    ),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
pub async fn logout(state: web::Data<HttpState>) -> HttpResponse {
    HttpResponse::NoContent()
        .cookie(state.cookies.cleared_cookie())
        .finish()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{AuthenticatedSession, SessionToken};
    use crate::inbound::http::session::ACCESS_TOKEN_COOKIE;
    use crate::inbound::http::test_utils::{TestPorts, sample_user, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use chrono::{Duration, Utc};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn login_sets_the_session_cookie() {
        let mut ports = TestPorts::default();
        ports
            .login
            .expect_login()
            .withf(|creds| creds.username() == "alice" && creds.password() == "hunter22")
            .returning(|_| {
                Ok(AuthenticatedSession {
                    user: sample_user("alice", "alice@example.com", true),
                    token: SessionToken {
                        value: "signed".into(),
                        expires_at: Utc::now() + Duration::hours(24),
                    },
                })
            });
        let app = test::init_service(test_app(ports)).await;

        let req = test::TestRequest::post()
            .uri("/v1/auth/login")
            .set_json(json!({"username": " alice ", "password": "hunter22"}))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res
            .response()
            .cookies()
            .find(|c| c.name() == ACCESS_TOKEN_COOKIE)
            .expect("session cookie");
        assert_eq!(cookie.value(), "signed");
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["user"]["username"], "alice");
    }

    #[actix_web::test]
    async fn bad_credentials_are_unauthorised() {
        let mut ports = TestPorts::default();
        ports
            .login
            .expect_login()
            .returning(|_| Err(Error::invalid_credentials()));
        let app = test::init_service(test_app(ports)).await;

        let req = test::TestRequest::post()
            .uri("/v1/auth/login")
            .set_json(json!({"username": "alice", "password": "wrong"}))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::InvalidCredentials.as_str());
    }

    #[actix_web::test]
    async fn blank_fields_fail_validation_before_the_service() {
        let app = test::init_service(test_app(TestPorts::default())).await;
        let req = test::TestRequest::post()
            .uri("/v1/auth/login")
            .set_json(json!({"username": "  "}))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(res).await;
        assert!(body["details"]["username"].is_string());
        assert!(body["details"]["password"].is_string());
    }

    #[actix_web::test]
    async fn logout_clears_the_cookie_without_a_session() {
        let app = test::init_service(test_app(TestPorts::default())).await;
        let req = test::TestRequest::post().uri("/v1/auth/logout").to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let cookie = res
            .response()
            .cookies()
            .find(|c| c.name() == ACCESS_TOKEN_COOKIE)
            .expect("cleared cookie");
        assert!(cookie.value().is_empty());
    }
}
