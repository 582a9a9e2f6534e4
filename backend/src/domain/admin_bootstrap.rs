//! Start-up creation of the first administrator account.

use std::sync::Arc;

use tracing::{Instrument, Span, info};
use zeroize::Zeroizing;

use crate::domain::credentials::hash_password;
use crate::domain::ports::{PasswordHasher, UserRepository};
use crate::domain::repository_errors::map_user_repository_error;
use crate::domain::{DisplayName, EmailAddress, Error, NewUser, User, Username};

/// Display name given to the bootstrapped administrator.
pub const INITIAL_ADMIN_NAME: &str = "Admin";

/// Credentials for the administrator created on an empty directory.
#[derive(Debug, Clone)]
pub struct InitialAdmin {
    /// Login name.
    pub username: Username,
    /// Email address.
    pub email: EmailAddress,
    /// Initial password in plaintext.
    pub password: Zeroizing<String>,
}

/// Result of [`AdminBootstrap::ensure_admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// An administrator already existed; nothing changed.
    AlreadyPresent,
    /// A new administrator was created.
    Created(User),
}

/// Ensures at least one administrator exists.
pub struct AdminBootstrap<R, H> {
    users: Arc<R>,
    hasher: Arc<H>,
    span: Span,
}

impl<R, H> AdminBootstrap<R, H>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
{
    /// Create the bootstrapper. Events are recorded inside `span`.
    pub fn new(users: Arc<R>, hasher: Arc<H>, span: Span) -> Self {
        Self {
            users,
            hasher,
            span,
        }
    }

    /// Create the initial administrator when none exists.
    ///
    /// # Errors
    /// Fails when the directory has no administrator and `initial` is
    /// `None`, or when the store rejects the insert.
    pub async fn ensure_admin(
        &self,
        initial: Option<&InitialAdmin>,
    ) -> Result<BootstrapOutcome, Error> {
        async {
            let exists = self
                .users
                .admin_exists()
                .await
                .map_err(map_user_repository_error)?;
            if exists {
                info!("administrator already exists, skipping bootstrap");
                return Ok(BootstrapOutcome::AlreadyPresent);
            }

            let initial = initial.ok_or_else(|| {
                Error::internal(
                    "no administrator exists and no initial administrator is configured",
                )
            })?;
            let name = DisplayName::new(INITIAL_ADMIN_NAME)
                .map_err(|err| Error::internal(format!("invalid administrator name: {err}")))?;
            let password_hash = hash_password(&self.hasher, initial.password.as_str()).await?;
            let user = self
                .users
                .create(&NewUser {
                    username: initial.username.clone(),
                    email: initial.email.clone(),
                    name,
                    password_hash,
                    is_admin: true,
                })
                .await
                .map_err(map_user_repository_error)?;
            info!(
                user_id = %user.id(),
                username = %user.username(),
                "initial administrator created"
            );
            Ok(BootstrapOutcome::Created(user))
        }
        .instrument(self.span.clone())
        .await
    }
}
