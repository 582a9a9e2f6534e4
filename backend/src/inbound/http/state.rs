//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{LoginService, ProfileService, UserAdministration};

use super::session::SessionCookiePolicy;

/// Parameter object bundling the driving ports used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Login and session issuance.
    pub login: Arc<dyn LoginService>,
    /// The caller's own profile and password.
    pub profile: Arc<dyn ProfileService>,
    /// Administrator user management.
    pub admin: Arc<dyn UserAdministration>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Login and session issuance.
    pub login: Arc<dyn LoginService>,
    /// The caller's own profile and password.
    pub profile: Arc<dyn ProfileService>,
    /// Administrator user management.
    pub admin: Arc<dyn UserAdministration>,
    /// Deployment environment reported by the healthcheck.
    pub environment: String,
    /// Attributes for the session cookie.
    pub cookies: SessionCookiePolicy,
}

impl HttpState {
    /// Construct state for the named environment.
    ///
    /// # Examples
    /// ```no_run
    /// use whenworks::inbound::http::state::{HttpState, HttpStatePorts};
    /// # fn ports() -> HttpStatePorts { unimplemented!() }
    ///
    /// let state = HttpState::new(ports(), "development");
    /// assert!(!state.cookies.is_production());
    /// ```
    pub fn new(ports: HttpStatePorts, environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let cookies = SessionCookiePolicy::for_environment(&environment);
        Self {
            login: ports.login,
            profile: ports.profile,
            admin: ports.admin,
            environment,
            cookies,
        }
    }
}
