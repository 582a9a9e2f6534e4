//! Email notification jobs exchanged between the API and the worker.
//!
//! The API serialises an [`EmailJob`] into the durable queue; the worker
//! claims it back as a [`ClaimedEmailJob`] and decides between success,
//! another attempt, or permanent failure.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EmailAddress;

/// Delay before the first retry.
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(5);
/// Upper bound for the retry delay.
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(600);

/// Kind of transactional email, used as the job tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailKind {
    /// Welcome message carrying the initial temporary password.
    #[serde(rename = "email:new_user")]
    NewUser,
    /// Notice carrying a temporary password after an administrator reset.
    #[serde(rename = "email:password_reset")]
    PasswordReset,
}

impl EmailKind {
    /// Tag stored alongside the job.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewUser => "email:new_user",
            Self::PasswordReset => "email:password_reset",
        }
    }

    /// Parse a stored tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "email:new_user" => Some(Self::NewUser),
            "email:password_reset" => Some(Self::PasswordReset),
            _ => None,
        }
    }
}

impl std::fmt::Display for EmailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values substituted into an email template.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplateData {
    /// Recipient display name.
    pub name: String,
    /// Recipient login name.
    pub username: String,
    /// Temporary password in plaintext.
    pub password: String,
}

impl std::fmt::Debug for EmailTemplateData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailTemplateData")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"..")
            .finish()
    }
}

/// Retry budget attached to each job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    /// Deadline for a single delivery attempt.
    pub timeout_secs: u64,
}

impl RetryPolicy {
    /// Per-attempt deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// "Send this email" unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    /// Template selector.
    pub kind: EmailKind,
    /// Destination address.
    pub recipient: EmailAddress,
    /// Template values.
    pub template: EmailTemplateData,
    /// Retry budget.
    pub retry: RetryPolicy,
}

/// A job claimed by a worker, with its attempt counter already incremented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedEmailJob {
    /// Queue identifier.
    pub id: Uuid,
    /// Decoded job body.
    pub job: EmailJob,
    /// Attempts made so far, including the current one.
    pub attempts: u32,
}

/// What the worker does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Try again after the delay.
    Retry(Duration),
    /// Retry budget exhausted.
    GiveUp,
}

impl ClaimedEmailJob {
    /// Decide how to handle a failed attempt.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use whenworks::domain::FailureDisposition;
    /// # use whenworks::domain::{ClaimedEmailJob, EmailAddress, EmailJob, EmailKind,
    /// #     EmailTemplateData, RetryPolicy};
    /// # let job = EmailJob {
    /// #     kind: EmailKind::NewUser,
    /// #     recipient: EmailAddress::new("a@x.com").unwrap(),
    /// #     template: EmailTemplateData {
    /// #         name: "A".into(), username: "a".into(), password: "p".into(),
    /// #     },
    /// #     retry: RetryPolicy { max_retries: 3, timeout_secs: 30 },
    /// # };
    /// let claimed = ClaimedEmailJob { id: uuid::Uuid::nil(), job, attempts: 2 };
    /// assert_eq!(
    ///     claimed.disposition_after_failure(),
    ///     FailureDisposition::Retry(Duration::from_secs(10)),
    /// );
    /// ```
    #[must_use]
    pub fn disposition_after_failure(&self) -> FailureDisposition {
        if self.attempts <= self.job.retry.max_retries {
            FailureDisposition::Retry(retry_backoff(self.attempts))
        } else {
            FailureDisposition::GiveUp
        }
    }
}

/// Exponential backoff: `5s * 2^(attempts - 1)`, capped at ten minutes.
#[must_use]
pub fn retry_backoff(attempts: u32) -> Duration {
    let exponent = attempts.saturating_sub(1).min(16);
    let factor = 1_u32 << exponent;
    RETRY_BASE_DELAY
        .checked_mul(factor)
        .map_or(RETRY_MAX_DELAY, |delay| delay.min(RETRY_MAX_DELAY))
}
