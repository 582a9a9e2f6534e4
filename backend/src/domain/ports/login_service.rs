//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call it to authenticate credentials without knowing the
//! backing infrastructure, so HTTP handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, User};

use super::SessionToken;

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    /// The authenticated user.
    pub user: User,
    /// Session token for the cookie.
    pub token: SessionToken,
}

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Verify credentials and return the user record.
    ///
    /// Unknown usernames and wrong passwords yield the same
    /// `INVALID_CREDENTIALS` error.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Authenticate and issue a session token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthenticatedSession, Error>;
}
