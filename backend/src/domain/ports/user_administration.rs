//! Driving port for administrator user management.

use async_trait::async_trait;

use crate::domain::{DisplayName, EmailAddress, Error, User, UserChanges, UserId, Username};

/// Validated input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    /// Login name.
    pub username: Username,
    /// Email address that receives the temporary password.
    pub email: EmailAddress,
    /// Display name.
    pub name: DisplayName,
}

/// Administrator use-cases over the user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAdministration: Send + Sync {
    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, Error>;

    /// Create a non-admin user with a temporary password and queue the
    /// welcome email.
    async fn create_user(&self, request: CreateUserRequest) -> Result<User, Error>;

    /// Fetch a single user.
    async fn get_user(&self, id: &UserId) -> Result<User, Error>;

    /// Update email, name, and/or admin flag.
    async fn update_user(&self, id: &UserId, changes: UserChanges) -> Result<User, Error>;

    /// Remove a user.
    async fn delete_user(&self, id: &UserId) -> Result<(), Error>;

    /// Replace the password with a temporary one and queue the reset email.
    async fn reset_password(&self, id: &UserId) -> Result<(), Error>;
}
