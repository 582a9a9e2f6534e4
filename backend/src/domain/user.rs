//! User data model.
//!
//! Newtypes validate their input on construction so services and adapters
//! never handle an unchecked username, email address, or display name.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 64;
/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 100;
/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 254;

/// Validation errors raised by the user newtypes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier was not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// Username was blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Username exceeded [`USERNAME_MAX`].
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Upper bound in characters.
        max: usize,
    },
    /// Username contained whitespace.
    #[error("username must not contain whitespace")]
    UsernameWhitespace,
    /// Email was blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email did not look like `local@domain.tld`.
    #[error("email must be a valid email address")]
    InvalidEmail,
    /// Display name was blank once trimmed.
    #[error("name must not be empty")]
    EmptyDisplayName,
    /// Display name exceeded [`DISPLAY_NAME_MAX`].
    #[error("name must be at most {max} characters")]
    DisplayNameTooLong {
        /// Upper bound in characters.
        max: usize,
    },
}

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse an identifier from its textual UUID form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login name, unique across users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`]; surrounding whitespace is trimmed.
    pub fn new(username: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = username.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(UserValidationError::UsernameWhitespace);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the username.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static EMAIL_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn email_regex() -> Option<&'static Regex> {
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]+$").ok())
        .as_ref()
}

/// Email address, unique across users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`]; surrounding whitespace is
    /// trimmed.
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = email.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let matches = email_regex().is_some_and(|re| re.is_match(trimmed));
        if !matches || trimmed.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Human readable name shown in the UI and in emails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`]; surrounding whitespace is
    /// trimmed.
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Stored password hash in PHC string format.
///
/// Deliberately not `Serialize`: hashes never leave the persistence and
/// credential layers.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a password hasher.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the encoded hash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Application user as exposed to clients.
///
/// ## Invariants
/// - `username` and `email` are unique across users (enforced by the store).
/// - The password hash is not part of this type; see [`UserAccount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    #[schema(value_type = String, example = "alice")]
    username: Username,
    #[schema(value_type = String, example = "alice@example.com")]
    email: EmailAddress,
    #[schema(value_type = String, example = "Alice")]
    name: DisplayName,
    is_admin: bool,
    #[schema(value_type = String, example = "2025-01-01T00:00:00Z")]
    created_at: DateTime<Utc>,
}

/// Validated components needed to build a [`User`].
#[derive(Debug, Clone)]
pub struct UserParts {
    /// Stable identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Unique email address.
    pub email: EmailAddress,
    /// Display name.
    pub name: DisplayName,
    /// Administrator flag.
    pub is_admin: bool,
    /// Creation timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a user from validated parts.
    #[must_use]
    pub fn new(parts: UserParts) -> Self {
        let UserParts {
            id,
            username,
            email,
            name,
            is_admin,
            created_at,
        } = parts;
        Self {
            id,
            username,
            email,
            name,
            is_admin,
            created_at,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Login name.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// Email address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Whether the user holds administrator rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply a patch of mutable fields, returning the updated user.
    #[must_use]
    pub fn with_changes(mut self, changes: UserChanges) -> Self {
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(is_admin) = changes.is_admin {
            self.is_admin = is_admin;
        }
        self
    }
}

/// Partial update of the mutable user fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// Replacement email address.
    pub email: Option<EmailAddress>,
    /// Replacement display name.
    pub name: Option<DisplayName>,
    /// Replacement administrator flag.
    pub is_admin: Option<bool>,
}

impl UserChanges {
    /// True when no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.is_admin.is_none()
    }
}

/// A user together with the stored credential, as read by the credential
/// component.
#[derive(Debug, Clone)]
pub struct UserAccount {
    /// Public user record.
    pub user: User,
    /// Stored password hash.
    pub password_hash: PasswordHash,
}

/// Insert request for a new user; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name.
    pub username: Username,
    /// Unique email address.
    pub email: EmailAddress,
    /// Display name.
    pub name: DisplayName,
    /// Hash of the initial password.
    pub password_hash: PasswordHash,
    /// Administrator flag.
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDto {
    id: UserId,
    username: String,
    email: String,
    name: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            username: value.username.into(),
            email: value.email.into(),
            name: value.name.into(),
            is_admin: value.is_admin,
            created_at: value.created_at,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserValidationError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        Ok(Self::new(UserParts {
            id: value.id,
            username: Username::new(value.username)?,
            email: EmailAddress::new(value.email)?,
            name: DisplayName::new(value.name)?,
            is_admin: value.is_admin,
            created_at: value.created_at,
        }))
    }
}
