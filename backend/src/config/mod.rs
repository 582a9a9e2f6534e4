//! Process configuration loaded from environment variables via OrthoConfig.
//!
//! Each concern has its own settings struct and prefix (`SERVER_`,
//! `DATABASE_`, `JWT_`, ...). Raw values are optional; accessors apply
//! defaults and validating accessors turn them into the typed inputs the
//! adapters expect. Anything invalid aborts start-up with a [`ConfigError`].

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;

mod app;
mod auth;
mod database;
mod email;

pub use app::{AppSettings, ServerSettings};
pub use auth::{InitialAdminSettings, JwtSettings, JWT_SECRET_MIN_BYTES};
pub use database::DatabaseSettings;
pub use email::{QueueSettings, SmtpSettings, WorkerSettings};

/// Name passed as `argv[0]` when settings are loaded without CLI arguments.
const PROGRAM_NAME: &str = "whenworks";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The loader itself failed, e.g. an unparsable number.
    #[error("failed to load {concern} settings: {message}")]
    Load {
        /// Settings group being loaded.
        concern: &'static str,
        /// Loader error text.
        message: String,
    },
    /// A required variable was not set.
    #[error("{variable} must be set")]
    Missing {
        /// Environment variable name.
        variable: &'static str,
    },
    /// A variable was set to an unusable value.
    #[error("{variable} is invalid: {message}")]
    Invalid {
        /// Environment variable name.
        variable: &'static str,
        /// Reason the value was rejected.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(variable: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            variable,
            message: message.into(),
        }
    }
}

/// Load one settings group from the environment, ignoring CLI arguments.
pub fn load<T: OrthoConfig>(concern: &'static str) -> Result<T, ConfigError> {
    T::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(|err| ConfigError::Load {
        concern,
        message: err.to_string(),
    })
}

pub(crate) fn require<T>(value: Option<T>, variable: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing { variable })
}

/// Seconds from `value` or `default`, rejecting zero.
pub(crate) fn positive_secs(
    value: Option<u64>,
    default: u64,
    variable: &'static str,
) -> Result<Duration, ConfigError> {
    match value.unwrap_or(default) {
        0 => Err(ConfigError::invalid(variable, "must be at least 1 second")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

/// Settings needed by the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `APP_*`
    pub app: AppSettings,
    /// `SERVER_*`
    pub server: ServerSettings,
    /// `DATABASE_*`
    pub database: DatabaseSettings,
    /// `JWT_*`
    pub jwt: JwtSettings,
    /// `QUEUE_*`
    pub queue: QueueSettings,
    /// `INITIAL_ADMIN_*`
    pub initial_admin: InitialAdminSettings,
}

impl ApiConfig {
    /// Load every group the API server reads.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            app: load("app")?,
            server: load("server")?,
            database: load("database")?,
            jwt: load("jwt")?,
            queue: load("queue")?,
            initial_admin: load("initial admin")?,
        })
    }
}

/// Settings needed by the email worker.
#[derive(Debug, Clone)]
pub struct WorkerProcessConfig {
    /// `APP_*`
    pub app: AppSettings,
    /// `DATABASE_*`
    pub database: DatabaseSettings,
    /// `WORKER_*`
    pub worker: WorkerSettings,
    /// `SMTP_*`
    pub smtp: SmtpSettings,
}

impl WorkerProcessConfig {
    /// Load every group the worker reads.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            app: load("app")?,
            database: load("database")?,
            worker: load("worker")?,
            smtp: load("smtp")?,
        })
    }
}
