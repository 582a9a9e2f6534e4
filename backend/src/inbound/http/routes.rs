//! Route table for the HTTP API.
//!
//! Every resource registers a method-not-allowed fallback so a known path
//! requested with the wrong method yields `405 METHOD_NOT_ALLOWED`; unknown
//! paths fall through to the application default and yield
//! `404 ROUTE_NOT_FOUND`. Callers register [`HttpState`] and
//! [`HealthState`] as app data.
//!
//! [`HttpState`]: super::state::HttpState
//! [`HealthState`]: super::health::HealthState

use std::sync::Arc;

use actix_web::{Resource, web};
use tracing::Span;

use crate::domain::ports::SessionTokens;
use crate::middleware::{RequireAdmin, RequireAuthenticated};

use super::error::{json_error_handler, method_not_allowed, route_not_found};
use super::{auth, health, me, users};

/// Resource whose unmatched methods answer `405`.
fn resource(path: &str) -> Resource {
    web::resource(path).default_service(web::to(method_not_allowed))
}

/// Register the API routes, body limits, and fallbacks.
///
/// `tokens` validates session cookies for the guarded scopes; guard events
/// are recorded inside `span`.
pub fn configure(cfg: &mut web::ServiceConfig, tokens: Arc<dyn SessionTokens>, span: Span) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(
            web::scope("/v1")
                .service(resource("/healthcheck").route(web::get().to(health::healthcheck)))
                .service(resource("/auth/login").route(web::post().to(auth::login)))
                .service(resource("/auth/logout").route(web::post().to(auth::logout)))
                .service(
                    web::scope("/me")
                        .wrap(RequireAuthenticated::new(Arc::clone(&tokens), span.clone()))
                        .service(
                            resource("")
                                .route(web::get().to(me::get_me))
                                .route(web::patch().to(me::update_me)),
                        )
                        .service(
                            resource("/update-password")
                                .route(web::post().to(me::update_password)),
                        ),
                )
                .service(
                    web::scope("/users")
                        .wrap(RequireAdmin::new(span.clone()))
                        .wrap(RequireAuthenticated::new(tokens, span))
                        .service(
                            resource("")
                                .route(web::get().to(users::list_users))
                                .route(web::post().to(users::create_user)),
                        )
                        .service(
                            resource("/{id}")
                                .route(web::get().to(users::get_user))
                                .route(web::patch().to(users::update_user))
                                .route(web::delete().to(users::delete_user)),
                        )
                        .service(
                            resource("/{id}/reset-password")
                                .route(web::post().to(users::reset_password)),
                        ),
                ),
        )
        .service(resource("/health/ready").route(web::get().to(health::ready)))
        .service(resource("/health/live").route(web::get().to(health::live)))
        .default_service(web::to(route_not_found));
}
