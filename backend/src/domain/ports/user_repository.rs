//! Port abstraction for user persistence adapters and their errors.
//!
//! Adapters never pre-check uniqueness: they attempt the write and translate
//! the store's unique-constraint violations into typed conflicts.

use async_trait::async_trait;

use crate::domain::{NewUser, PasswordHash, User, UserAccount, UserChanges, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The call did not finish within the configured query timeout.
        Timeout { operation: String } => "user repository {operation} timed out",
        /// Another user already holds the username.
        UsernameConflict => "username already exists",
        /// Another user already holds the email address.
        EmailConflict => "email already exists",
        /// No user matched the identifier.
        NotFound => "user not found",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; the store assigns `id` and `created_at`.
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user and stored credential by username.
    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// Fetch a user and stored credential by identifier.
    async fn find_account_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// All users, newest first.
    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Write the mutable profile fields. Zero affected rows yields
    /// [`UserRepositoryError::NotFound`].
    async fn update(&self, id: &UserId, changes: &UserChanges)
    -> Result<User, UserRepositoryError>;

    /// Replace only the stored password hash.
    async fn update_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError>;

    /// Remove a user. Zero affected rows yields
    /// [`UserRepositoryError::NotFound`].
    async fn delete(&self, id: &UserId) -> Result<(), UserRepositoryError>;

    /// Whether at least one administrator exists.
    async fn admin_exists(&self) -> Result<bool, UserRepositoryError>;
}
