//! Builders wiring the Diesel, Argon2, and JWT adapters into domain services.

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::WrapErr;
use mockable::{Clock, DefaultClock};
use tracing::{Span, info_span};

use whenworks::config::ApiConfig;
use whenworks::domain::ports::SessionTokens;
use whenworks::domain::{
    AdminBootstrap, NotificationDispatcher, UserAdminPorts, UserAdminService,
    UserLoginService, UserProfileService,
};
use whenworks::inbound::http::state::{HttpState, HttpStatePorts};
use whenworks::outbound::persistence::{DbPool, DieselUserRepository};
use whenworks::outbound::queue::DieselEmailQueue;
use whenworks::outbound::security::{
    Argon2PasswordHasher, JwtSessionTokens, RandomPasswordGenerator,
};

/// Per-worker application data.
#[derive(Clone)]
pub struct Components {
    /// Handler state shared by every Actix worker.
    pub http_state: web::Data<HttpState>,
    /// Session verifier used by the auth middleware.
    pub tokens: Arc<dyn SessionTokens>,
    users: Arc<DieselUserRepository>,
    hasher: Arc<Argon2PasswordHasher>,
}

fn child_span(parent: &Span, component: &'static str) -> Span {
    info_span!(parent: parent, "component", name = component)
}

/// Build the driving ports over the database pool.
///
/// # Errors
/// Fails on an unusable JWT secret or retry budget, or when the hasher cannot
/// be set up.
pub fn build_components(
    config: &ApiConfig,
    pool: DbPool,
    span: &Span,
) -> color_eyre::Result<Components> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let hasher = Arc::new(Argon2PasswordHasher::new().wrap_err("password hasher set-up failed")?);
    let tokens = Arc::new(JwtSessionTokens::new(
        &config.jwt.secret()?,
        config.jwt.expiry(),
        clock,
    ));
    let queue = Arc::new(DieselEmailQueue::new(pool));
    let notifications = Arc::new(NotificationDispatcher::new(
        queue,
        config.queue.retry_policy()?,
        child_span(span, "notifications"),
    ));

    let login = UserLoginService::new(
        Arc::clone(&users),
        Arc::clone(&hasher),
        Arc::clone(&tokens),
        child_span(span, "login"),
    );
    let profile = UserProfileService::new(
        Arc::clone(&users),
        Arc::clone(&hasher),
        child_span(span, "profile"),
    );
    let admin = UserAdminService::new(
        UserAdminPorts {
            users: Arc::clone(&users),
            hasher: Arc::clone(&hasher),
            passwords: Arc::new(RandomPasswordGenerator),
            notifications,
        },
        child_span(span, "user_admin"),
    );

    let http_state = HttpState::new(
        HttpStatePorts {
            login: Arc::new(login),
            profile: Arc::new(profile),
            admin: Arc::new(admin),
        },
        config.app.environment(),
    );
    Ok(Components {
        http_state: web::Data::new(http_state),
        tokens,
        users,
        hasher,
    })
}

/// Ensure an administrator exists before serving traffic.
///
/// # Errors
/// Fails when the directory has no administrator and none is configured,
/// or when the bootstrap settings are invalid.
pub async fn bootstrap_admin(
    components: &Components,
    config: &ApiConfig,
    span: &Span,
) -> color_eyre::Result<()> {
    let initial = config.initial_admin.initial_admin()?;
    let bootstrap = AdminBootstrap::new(
        Arc::clone(&components.users),
        Arc::clone(&components.hasher),
        child_span(span, "bootstrap"),
    );
    bootstrap
        .ensure_admin(initial.as_ref())
        .await
        .wrap_err("administrator bootstrap failed")?;
    Ok(())
}
