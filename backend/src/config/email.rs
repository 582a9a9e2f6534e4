//! Email queue, worker pool, and SMTP relay settings.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::{EmailWorkerConfig, RetryPolicy};
use crate::outbound::mail::SmtpMailerConfig;

use super::{ConfigError, positive_secs, require};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONCURRENCY: usize = 10;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_WORKER_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 10;

/// Retry budget stamped onto each enqueued job.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "QUEUE")]
pub struct QueueSettings {
    /// Retries after the first attempt.
    #[ortho_config(default = DEFAULT_MAX_RETRIES)]
    pub max_retries: Option<u32>,
    /// Per-attempt delivery budget in seconds.
    pub task_timeout_secs: Option<u64>,
}

impl QueueSettings {
    /// Retry budget for new jobs; the task timeout must be positive.
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let timeout = positive_secs(
            self.task_timeout_secs,
            DEFAULT_TASK_TIMEOUT_SECS,
            "QUEUE_TASK_TIMEOUT_SECS",
        )?;
        Ok(RetryPolicy {
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            timeout_secs: timeout.as_secs(),
        })
    }
}

/// Worker pool sizing and shutdown behaviour.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "WORKER")]
pub struct WorkerSettings {
    /// Jobs processed at once.
    #[ortho_config(default = DEFAULT_CONCURRENCY)]
    pub concurrency: Option<usize>,
    /// Idle wait between empty claims, in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Seconds in-flight jobs get to finish after a stop signal.
    pub shutdown_timeout_secs: Option<u64>,
}

impl WorkerSettings {
    /// Pool configuration; concurrency and the poll interval must be
    /// positive.
    pub fn worker_config(&self) -> Result<EmailWorkerConfig, ConfigError> {
        let concurrency = self.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::invalid(
                "WORKER_CONCURRENCY",
                "must be at least 1",
            ));
        }
        let poll_interval_ms = self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "WORKER_POLL_INTERVAL_MS",
                "must be at least 1 millisecond",
            ));
        }
        Ok(EmailWorkerConfig {
            concurrency,
            poll_interval: Duration::from_millis(poll_interval_ms),
            shutdown_timeout: Duration::from_secs(
                self.shutdown_timeout_secs
                    .unwrap_or(DEFAULT_WORKER_SHUTDOWN_SECS),
            ),
        })
    }
}

/// SMTP relay used by the worker.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SMTP")]
pub struct SmtpSettings {
    /// Relay host name.
    pub host: Option<String>,
    /// Relay port, 587 by default.
    #[ortho_config(default = DEFAULT_SMTP_PORT)]
    pub port: Option<u16>,
    /// Login name; requires the password.
    pub username: Option<String>,
    /// Login password; requires the username.
    pub password: Option<String>,
    /// Sender mailbox, e.g. `WhenWorks <no-reply@example.com>`.
    pub from: Option<String>,
    /// Connection and command timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Upgrade with STARTTLS; on unless set to `false`. Kept off the CLI
    /// layer, whose switch would always report `false`.
    #[ortho_config(skip_cli)]
    pub starttls: Option<bool>,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .field("timeout_secs", &self.timeout_secs)
            .field("starttls", &self.starttls)
            .finish()
    }
}

impl SmtpSettings {
    /// Whether the connection is upgraded with STARTTLS.
    pub fn starttls(&self) -> bool {
        self.starttls.unwrap_or(true)
    }

    /// Transport configuration; host and sender are required.
    pub fn mailer_config(&self) -> Result<SmtpMailerConfig, ConfigError> {
        let host = require(self.host.clone(), "SMTP_HOST")?;
        let from = require(self.from.clone(), "SMTP_FROM")?;
        let credentials = match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Some((username.clone(), Zeroizing::new(password.clone())))
            }
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing {
                variable: "SMTP_PASSWORD",
            }),
            (None, Some(_)) => return Err(ConfigError::Missing {
                variable: "SMTP_USERNAME",
            }),
        };
        Ok(SmtpMailerConfig {
            host,
            port: self.port.unwrap_or(DEFAULT_SMTP_PORT),
            credentials,
            from,
            timeout: positive_secs(
                self.timeout_secs,
                DEFAULT_SMTP_TIMEOUT_SECS,
                "SMTP_TIMEOUT_SECS",
            )?,
            starttls: self.starttls(),
        })
    }
}
