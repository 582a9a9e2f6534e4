//! Session signing and initial administrator settings.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::{EmailAddress, InitialAdmin, Username};

use super::{ConfigError, require};

/// Shortest accepted HS256 signing secret.
pub const JWT_SECRET_MIN_BYTES: usize = 32;
const DEFAULT_EXPIRY_SECS: u64 = 86_400;
const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Session token signing settings.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "JWT")]
pub struct JwtSettings {
    /// HS256 signing secret.
    pub secret: Option<String>,
    /// Session lifetime in seconds, one day by default.
    #[ortho_config(default = DEFAULT_EXPIRY_SECS)]
    pub expiry_secs: Option<u64>,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

impl JwtSettings {
    /// Signing secret of at least [`JWT_SECRET_MIN_BYTES`] bytes.
    pub fn secret(&self) -> Result<Zeroizing<String>, ConfigError> {
        let secret = require(self.secret.as_ref(), "JWT_SECRET")?;
        if secret.len() < JWT_SECRET_MIN_BYTES {
            return Err(ConfigError::invalid(
                "JWT_SECRET",
                format!("must be at least {JWT_SECRET_MIN_BYTES} bytes"),
            ));
        }
        Ok(Zeroizing::new(secret.clone()))
    }

    /// Token and cookie lifetime.
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs.unwrap_or(DEFAULT_EXPIRY_SECS))
    }
}

/// Credentials for the administrator created when none exists.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "INITIAL_ADMIN")]
pub struct InitialAdminSettings {
    /// Administrator login name, `admin` by default.
    #[ortho_config(default = DEFAULT_ADMIN_USERNAME.to_owned())]
    pub username: Option<String>,
    /// Administrator email; required together with the password.
    pub email: Option<String>,
    /// Administrator password; required together with the email.
    pub password: Option<String>,
}

impl std::fmt::Debug for InitialAdminSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitialAdminSettings")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl InitialAdminSettings {
    /// Validated bootstrap credentials.
    ///
    /// `None` when neither email nor password is set; supplying only one of
    /// them is an error.
    pub fn initial_admin(&self) -> Result<Option<InitialAdmin>, ConfigError> {
        let (email, password) = match (&self.email, &self.password) {
            (None, None) => return Ok(None),
            (email, password) => (
                require(email.as_deref(), "INITIAL_ADMIN_EMAIL")?,
                require(password.as_deref(), "INITIAL_ADMIN_PASSWORD")?,
            ),
        };
        if password.is_empty() {
            return Err(ConfigError::invalid(
                "INITIAL_ADMIN_PASSWORD",
                "must not be empty",
            ));
        }
        let username = Username::new(self.username.as_deref().unwrap_or(DEFAULT_ADMIN_USERNAME))
            .map_err(|err| ConfigError::invalid("INITIAL_ADMIN_USERNAME", err.to_string()))?;
        let email = EmailAddress::new(email)
            .map_err(|err| ConfigError::invalid("INITIAL_ADMIN_EMAIL", err.to_string()))?;
        Ok(Some(InitialAdmin {
            username,
            email,
            password: Zeroizing::new(password.to_owned()),
        }))
    }
}
