//! Self-service profile use-cases for the authenticated caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, Span, info};

use crate::domain::credentials::{hash_password, verify_password};
use crate::domain::ports::{PasswordHasher, ProfileService, UserRepository};
use crate::domain::repository_errors::map_user_repository_error;
use crate::domain::{Error, PasswordChange, Requester, User, UserChanges};

/// Message returned when a patch carries no fields.
pub const EMPTY_UPDATE_MESSAGE: &str = "at least one field must be provided";

/// Profile service over the user repository.
pub struct UserProfileService<R, H> {
    users: Arc<R>,
    hasher: Arc<H>,
    span: Span,
}

impl<R, H> UserProfileService<R, H> {
    /// Create the service. Events are recorded inside `span`.
    pub fn new(users: Arc<R>, hasher: Arc<H>, span: Span) -> Self {
        Self {
            users,
            hasher,
            span,
        }
    }
}

#[async_trait]
impl<R, H> ProfileService for UserProfileService<R, H>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn current_user(&self, requester: &Requester) -> Result<User, Error> {
        self.users
            .find_by_id(requester.user_id())
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(Error::user_not_found)
    }

    async fn update_profile(
        &self,
        requester: &Requester,
        changes: UserChanges,
    ) -> Result<User, Error> {
        if changes.email.is_none() && changes.name.is_none() {
            return Err(Error::bad_request(EMPTY_UPDATE_MESSAGE));
        }
        // Callers cannot promote themselves.
        let changes = UserChanges {
            is_admin: None,
            ..changes
        };
        let user = self
            .users
            .update(requester.user_id(), &changes)
            .await
            .map_err(map_user_repository_error)?;
        self.span.in_scope(|| {
            info!(user_id = %user.id(), "profile updated");
        });
        Ok(user)
    }

    async fn change_password(
        &self,
        requester: &Requester,
        change: &PasswordChange,
    ) -> Result<(), Error> {
        async {
            let account = self
                .users
                .find_account_by_id(requester.user_id())
                .await
                .map_err(map_user_repository_error)?
                .ok_or_else(Error::user_not_found)?;

            let matches =
                verify_password(&self.hasher, change.old_password(), account.password_hash)
                    .await?;
            if !matches {
                return Err(Error::invalid_password());
            }

            let hash = hash_password(&self.hasher, change.new_password()).await?;
            self.users
                .update_password_hash(requester.user_id(), &hash)
                .await
                .map_err(map_user_repository_error)?;
            info!(user_id = %requester.user_id(), "password changed");
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }
}
