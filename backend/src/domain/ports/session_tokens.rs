//! Port for issuing and validating signed session tokens.

use chrono::{DateTime, Utc};

use crate::domain::{Requester, User};

use super::define_port_error;

define_port_error! {
    /// Errors raised by session token adapters.
    pub enum SessionTokenError {
        /// Signing failed.
        Issue { message: String } => "failed to issue session token: {message}",
        /// Signature, expiry, or claims were rejected.
        Invalid => "session token is invalid",
    }
}

/// Signed token plus its expiry, used for the cookie lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    /// Encoded token.
    pub value: String,
    /// Moment the token stops validating.
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates stateless session tokens.
#[cfg_attr(test, mockall::automock)]
pub trait SessionTokens: Send + Sync {
    /// Issue a token for `user` with the configured lifetime.
    fn issue(&self, user: &User) -> Result<SessionToken, SessionTokenError>;

    /// Validate a token and derive the caller's identity.
    fn validate(&self, token: &str) -> Result<Requester, SessionTokenError>;
}
