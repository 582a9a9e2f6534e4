//! Port for generating temporary passwords.

use crate::domain::TemporaryPassword;

/// Length of generated temporary passwords.
pub const TEMPORARY_PASSWORD_LEN: usize = 12;

/// Produces one-time passwords for new accounts and resets.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordGenerator: Send + Sync {
    /// Generate a fresh alphanumeric password.
    fn generate(&self) -> TemporaryPassword;
}
