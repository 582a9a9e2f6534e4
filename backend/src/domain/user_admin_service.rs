//! Administrator user-management use-cases.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, Span, info};

use crate::domain::credentials::hash_password;
use crate::domain::notification_dispatcher::NotificationDispatcher;
use crate::domain::ports::{
    CreateUserRequest, EmailQueue, PasswordGenerator, PasswordHasher, UserAdministration,
    UserRepository,
};
use crate::domain::profile_service::EMPTY_UPDATE_MESSAGE;
use crate::domain::repository_errors::map_user_repository_error;
use crate::domain::{EmailKind, Error, NewUser, User, UserChanges, UserId};

/// Driven ports needed by [`UserAdminService`].
pub struct UserAdminPorts<R, H, G, Q> {
    /// User directory.
    pub users: Arc<R>,
    /// Password hasher for temporary passwords.
    pub hasher: Arc<H>,
    /// Temporary password source.
    pub passwords: Arc<G>,
    /// Notification dispatch for welcome and reset emails.
    pub notifications: Arc<NotificationDispatcher<Q>>,
}

/// Administrator service over the user directory.
pub struct UserAdminService<R, H, G, Q> {
    users: Arc<R>,
    hasher: Arc<H>,
    passwords: Arc<G>,
    notifications: Arc<NotificationDispatcher<Q>>,
    span: Span,
}

impl<R, H, G, Q> UserAdminService<R, H, G, Q> {
    /// Create the service. Events are recorded inside `span`.
    pub fn new(ports: UserAdminPorts<R, H, G, Q>, span: Span) -> Self {
        let UserAdminPorts {
            users,
            hasher,
            passwords,
            notifications,
        } = ports;
        Self {
            users,
            hasher,
            passwords,
            notifications,
            span,
        }
    }
}

impl<R, H, G, Q> UserAdminService<R, H, G, Q>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
    G: PasswordGenerator,
    Q: EmailQueue,
{
    async fn find_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(Error::user_not_found)
    }
}

#[async_trait]
impl<R, H, G, Q> UserAdministration for UserAdminService<R, H, G, Q>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
    G: PasswordGenerator + 'static,
    Q: EmailQueue + 'static,
{
    async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.users
            .list_all()
            .await
            .map_err(map_user_repository_error)
    }

    async fn create_user(&self, request: CreateUserRequest) -> Result<User, Error> {
        async {
            let password = self.passwords.generate();
            let password_hash = hash_password(&self.hasher, password.expose()).await?;
            let new_user = NewUser {
                username: request.username,
                email: request.email,
                name: request.name,
                password_hash,
                is_admin: false,
            };
            let user = self
                .users
                .create(&new_user)
                .await
                .map_err(map_user_repository_error)?;
            info!(user_id = %user.id(), username = %user.username(), "user created");

            self.notifications
                .dispatch(EmailKind::NewUser, &user, &password)
                .await;
            Ok(user)
        }
        .instrument(self.span.clone())
        .await
    }

    async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        self.find_user(id).await
    }

    async fn update_user(&self, id: &UserId, changes: UserChanges) -> Result<User, Error> {
        if changes.is_empty() {
            return Err(Error::bad_request(EMPTY_UPDATE_MESSAGE));
        }
        let user = self
            .users
            .update(id, &changes)
            .await
            .map_err(map_user_repository_error)?;
        self.span.in_scope(|| {
            info!(user_id = %user.id(), "user updated");
        });
        Ok(user)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), Error> {
        self.users
            .delete(id)
            .await
            .map_err(map_user_repository_error)?;
        self.span.in_scope(|| {
            info!(user_id = %id, "user deleted");
        });
        Ok(())
    }

    async fn reset_password(&self, id: &UserId) -> Result<(), Error> {
        async {
            let user = self.find_user(id).await?;
            let password = self.passwords.generate();
            let hash = hash_password(&self.hasher, password.expose()).await?;
            self.users
                .update_password_hash(id, &hash)
                .await
                .map_err(map_user_repository_error)?;
            info!(user_id = %id, "password reset");

            self.notifications
                .dispatch(EmailKind::PasswordReset, &user, &password)
                .await;
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }
}
