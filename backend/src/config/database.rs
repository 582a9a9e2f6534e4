//! Database connection settings.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

use super::{ConfigError, positive_secs, require};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL connection settings shared by the API and the worker.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DATABASE")]
pub struct DatabaseSettings {
    /// `postgres://` connection string.
    pub url: Option<String>,
    /// Pool size.
    #[ortho_config(default = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: Option<u32>,
    /// Deadline for each repository call, in seconds.
    pub query_timeout_secs: Option<u64>,
    /// How long a checkout may wait for a free connection, in seconds.
    pub connect_timeout_secs: Option<u64>,
}

impl DatabaseSettings {
    /// Connection string; required.
    pub fn url(&self) -> Result<&str, ConfigError> {
        require(self.url.as_deref(), "DATABASE_URL")
    }

    /// Pool configuration with defaults applied.
    ///
    /// Size and both timeouts must be positive: a zero query deadline would
    /// fail every call and bb8 refuses a zero checkout timeout.
    pub fn pool_config(&self) -> Result<PoolConfig, ConfigError> {
        let max_connections = self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(ConfigError::invalid(
                "DATABASE_MAX_CONNECTIONS",
                "must be at least 1",
            ));
        }
        let checkout_timeout = positive_secs(
            self.connect_timeout_secs,
            DEFAULT_CONNECT_TIMEOUT_SECS,
            "DATABASE_CONNECT_TIMEOUT_SECS",
        )?;
        let query_timeout = positive_secs(
            self.query_timeout_secs,
            DEFAULT_QUERY_TIMEOUT_SECS,
            "DATABASE_QUERY_TIMEOUT_SECS",
        )?;
        Ok(PoolConfig {
            database_url: self.url()?.to_owned(),
            max_size: max_connections,
            checkout_timeout,
            query_timeout,
        })
    }
}
