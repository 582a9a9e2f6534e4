//! Port for one-way password hashing.

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHasherError {
        /// Hash computation failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// Stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
    }
}

/// Hashes and verifies passwords.
///
/// Implementations are CPU bound; callers on the async runtime should expect
/// each call to take tens of milliseconds.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted hash of `password`.
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError>;

    /// Check `password` against `hash`. A mismatch is `Ok(false)`.
    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHasherError>;

    /// Hash verified when the user does not exist, keeping timing uniform.
    fn dummy_hash(&self) -> PasswordHash;
}
