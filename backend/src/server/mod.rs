//! Server construction, middleware wiring, and shutdown handling.

mod state_builders;

pub use state_builders::{Components, bootstrap_admin, build_components};

use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::{Span, info};

use whenworks::Trace;
use whenworks::config::ServerSettings;
#[cfg(debug_assertions)]
use whenworks::doc::ApiDoc;
use whenworks::inbound::http::health::HealthState;
use whenworks::inbound::http::routes;
use whenworks::signals::wait_for_signal;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    components: Components,
    health_state: web::Data<HealthState>,
    span: Span,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let Components { http_state, tokens, .. } = components;
    let route_span = span.clone();
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace::new(span));

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.configure(move |cfg| routes::configure(cfg, tokens, route_span))
}

/// Bind the HTTP server. Signals are handled by [`shutdown_on_signal`].
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    components: Components,
    settings: &ServerSettings,
    span: &Span,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let span = span.clone();
    let server = HttpServer::new(move || {
        build_app(components.clone(), server_health_state.clone(), span.clone())
    })
    .keep_alive(settings.keep_alive())
    .client_request_timeout(settings.client_request_timeout())
    .shutdown_timeout(settings.shutdown_timeout().as_secs())
    .disable_signals()
    .bind(settings.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}

/// Wait for SIGINT or SIGTERM, fail the probes, then stop gracefully.
pub async fn shutdown_on_signal(
    handle: ServerHandle,
    health_state: web::Data<HealthState>,
    span: Span,
) {
    wait_for_signal(&span).await;
    health_state.mark_unhealthy();
    span.in_scope(|| info!("shutdown requested, draining in-flight requests"));
    handle.stop(true).await;
}
