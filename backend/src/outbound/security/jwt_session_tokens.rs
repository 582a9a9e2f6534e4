//! HS256 session tokens built on `jsonwebtoken`.
//!
//! Expiry is checked against the injected clock rather than the library's
//! system time, so tests can move time without sleeping.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{SessionToken, SessionTokenError, SessionTokens};
use crate::domain::{Requester, User, UserId};

/// Claims carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    username: String,
    is_admin: bool,
    iat: i64,
    exp: i64,
}

/// Stateless session tokens signed with a shared secret.
pub struct JwtSessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: ChronoDuration,
    clock: Arc<dyn Clock>,
}

impl JwtSessionTokens {
    /// Build a token service from the signing secret and token lifetime.
    pub fn new(
        secret: &Zeroizing<String>,
        lifetime: std::time::Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lifetime = ChronoDuration::from_std(lifetime).unwrap_or(ChronoDuration::MAX);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
            clock,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl SessionTokens for JwtSessionTokens {
    fn issue(&self, user: &User) -> Result<SessionToken, SessionTokenError> {
        let now = self.clock.utc();
        let expires_at = self.expiry_from(now);
        let claims = Claims {
            user_id: user.id().to_string(),
            username: user.username().as_str().to_owned(),
            is_admin: user.is_admin(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| SessionTokenError::issue(err.to_string()))?;
        Ok(SessionToken { value, expires_at })
    }

    fn validate(&self, token: &str) -> Result<Requester, SessionTokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Self::validation()).map_err(|err| {
            debug!(error = %err, "session token rejected");
            SessionTokenError::invalid()
        })?;
        let claims = data.claims;
        if claims.exp <= self.clock.utc().timestamp() {
            debug!("session token expired");
            return Err(SessionTokenError::invalid());
        }
        let user_id = UserId::new(&claims.user_id).map_err(|_| SessionTokenError::invalid())?;
        Ok(Requester::new(user_id, claims.username, claims.is_admin))
    }
}
