//! Authentication primitives: login credentials, password changes, and the
//! typed identity of an authenticated caller.
//!
//! Inbound adapters build these through validating constructors before they
//! talk to a driving port.

use std::fmt;

use zeroize::Zeroizing;

use super::{User, UserId};

/// Minimum length for a new password.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Current password was blank during a password change.
    #[error("old password must not be empty")]
    EmptyOldPassword,
    /// Replacement password is shorter than [`PASSWORD_MIN_LEN`].
    #[error("new password must be at least {min} characters")]
    NewPasswordTooShort {
        /// Minimum accepted length in characters.
        min: usize,
    },
}

impl CredentialValidationError {
    /// Request field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyUsername => "username",
            Self::EmptyPassword => "password",
            Self::EmptyOldPassword => "old_password",
            Self::NewPasswordTooShort { .. } => "new_password",
        }
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace.
///
/// # Examples
/// ```
/// use whenworks::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" alice ", "hunter22").unwrap();
/// assert_eq!(creds.username(), "alice");
/// assert_eq!(creds.password(), "hunter22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    ///
    /// Every invalid field is reported, not only the first.
    pub fn try_from_parts(
        username: &str,
        password: &str,
    ) -> Result<Self, Vec<CredentialValidationError>> {
        let normalized = username.trim();
        let mut errors = Vec::new();
        if normalized.is_empty() {
            errors.push(CredentialValidationError::EmptyUsername);
        }
        if password.is_empty() {
            errors.push(CredentialValidationError::EmptyPassword);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated request to replace the caller's password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    old_password: Zeroizing<String>,
    new_password: Zeroizing<String>,
}

impl PasswordChange {
    /// Validate the old and new password inputs.
    pub fn try_from_parts(
        old_password: &str,
        new_password: &str,
    ) -> Result<Self, Vec<CredentialValidationError>> {
        let mut errors = Vec::new();
        if old_password.is_empty() {
            errors.push(CredentialValidationError::EmptyOldPassword);
        }
        if new_password.chars().count() < PASSWORD_MIN_LEN {
            errors.push(CredentialValidationError::NewPasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            old_password: Zeroizing::new(old_password.to_owned()),
            new_password: Zeroizing::new(new_password.to_owned()),
        })
    }

    /// Password the caller claims is current.
    pub fn old_password(&self) -> &str {
        self.old_password.as_str()
    }

    /// Replacement password.
    pub fn new_password(&self) -> &str {
        self.new_password.as_str()
    }
}

/// Generated one-time password sent to a user by email.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryPassword(Zeroizing<String>);

impl TemporaryPassword {
    /// Wrap a generated password.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Plaintext value, needed for hashing and for the outgoing email.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for TemporaryPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemporaryPassword(..)")
    }
}

/// Authenticated caller derived from a validated session token.
///
/// Carried in request extensions by the authentication middleware and read
/// back by handlers through an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    user_id: UserId,
    username: String,
    is_admin: bool,
}

impl Requester {
    /// Build a requester from token claims.
    pub fn new(user_id: UserId, username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_admin,
        }
    }

    /// Identifier of the caller.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Username recorded in the token.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Whether the token grants administrator rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self::new(*user.id(), user.username().as_str(), user.is_admin())
    }
}
