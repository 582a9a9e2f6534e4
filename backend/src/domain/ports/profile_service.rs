//! Driving port for self-service profile management.

use async_trait::async_trait;

use crate::domain::{Error, PasswordChange, Requester, User, UserChanges};

/// Use-cases available to any authenticated user on their own record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Load the caller's record.
    async fn current_user(&self, requester: &Requester) -> Result<User, Error>;

    /// Update the caller's email and/or name. Empty changes are rejected
    /// with `BAD_REQUEST` before any store access.
    async fn update_profile(
        &self,
        requester: &Requester,
        changes: UserChanges,
    ) -> Result<User, Error>;

    /// Replace the caller's password after checking the current one.
    async fn change_password(
        &self,
        requester: &Requester,
        change: &PasswordChange,
    ) -> Result<(), Error>;
}
