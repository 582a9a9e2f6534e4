//! Application-wide and HTTP server settings.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
const DEFAULT_CLIENT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Deployment environment.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "APP")]
pub struct AppSettings {
    /// `development`, `staging`, `production`, ...
    #[ortho_config(default = DEFAULT_ENVIRONMENT.to_owned())]
    pub environment: Option<String>,
}

impl AppSettings {
    /// Configured environment name, `development` when unset.
    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// Production enables secure cookies and JSON logs.
    pub fn is_production(&self) -> bool {
        self.environment().eq_ignore_ascii_case("production")
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SERVER")]
pub struct ServerSettings {
    /// Interface to bind, `0.0.0.0` by default.
    pub host: Option<String>,
    /// TCP port, 3000 by default.
    #[ortho_config(default = DEFAULT_PORT)]
    pub port: Option<u16>,
    /// Seconds in-flight requests get to finish after a stop signal.
    pub shutdown_timeout_secs: Option<u64>,
    /// Idle keep-alive window in seconds.
    pub keep_alive_secs: Option<u64>,
    /// Seconds a client has to send the request head.
    pub client_request_timeout_secs: Option<u64>,
}

impl ServerSettings {
    /// Address tuple for `HttpServer::bind`.
    pub fn bind_addr(&self) -> (String, u16) {
        (
            self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Grace period for in-flight requests on shutdown.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(
            self.shutdown_timeout_secs
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        )
    }

    /// Idle keep-alive window.
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.unwrap_or(DEFAULT_KEEP_ALIVE_SECS))
    }

    /// Deadline for receiving the request head.
    pub fn client_request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.client_request_timeout_secs
                .unwrap_or(DEFAULT_CLIENT_REQUEST_TIMEOUT_SECS),
        )
    }
}
