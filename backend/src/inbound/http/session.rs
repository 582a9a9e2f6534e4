//! Session cookie policy.
//!
//! The session itself is a signed token (see the `SessionTokens` port); this
//! module only decides how that token travels in the `accessToken` cookie.

use actix_web::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};

use crate::domain::Error;
use crate::domain::ports::SessionToken;

/// Cookie carrying the session token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Attributes applied to session cookies.
///
/// `HttpOnly` and `Secure` are only set in production so that local tooling
/// served over plain HTTP can read and send the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCookiePolicy {
    production: bool,
}

impl SessionCookiePolicy {
    /// Policy for the named deployment environment.
    #[must_use]
    pub fn for_environment(environment: &str) -> Self {
        Self {
            production: environment.eq_ignore_ascii_case("production"),
        }
    }

    /// Whether cookies carry the production-only attributes.
    #[must_use]
    pub const fn is_production(self) -> bool {
        self.production
    }

    /// Cookie holding `token`, expiring with it.
    ///
    /// # Errors
    /// Fails when the expiry cannot be represented as a cookie date.
    pub fn session_cookie(self, token: &SessionToken) -> Result<Cookie<'static>, Error> {
        let expires = to_offset(token.expires_at)?;
        Ok(self.base(token.value.clone()).expires(expires).finish())
    }

    /// Empty cookie already expired, used to clear the session.
    #[must_use]
    pub fn cleared_cookie(self) -> Cookie<'static> {
        let expired = OffsetDateTime::now_utc() - CookieDuration::hours(1);
        self.base(String::new()).expires(expired).finish()
    }

    fn base(self, value: String) -> actix_web::cookie::CookieBuilder<'static> {
        Cookie::build(ACCESS_TOKEN_COOKIE, value)
            .path("/")
            .same_site(SameSite::Strict)
            .http_only(self.production)
            .secure(self.production)
    }
}

fn to_offset(at: DateTime<Utc>) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|err| Error::internal(format!("session expiry out of range: {err}")))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn token() -> SessionToken {
        SessionToken {
            value: "signed.jwt.value".into(),
            expires_at: Utc
                .with_ymd_and_hms(2030, 1, 2, 3, 4, 5)
                .single()
                .expect("valid time"),
        }
    }

    #[rstest]
    #[case("production", true)]
    #[case("Production", true)]
    #[case("development", false)]
    #[case("staging", false)]
    fn production_is_detected(#[case] environment: &str, #[case] expected: bool) {
        assert_eq!(
            SessionCookiePolicy::for_environment(environment).is_production(),
            expected
        );
    }

    #[rstest]
    fn session_cookie_carries_token_and_expiry() {
        let cookie = SessionCookiePolicy::for_environment("development")
            .session_cookie(&token())
            .expect("cookie");
        assert_eq!(cookie.name(), ACCESS_TOKEN_COOKIE);
        assert_eq!(cookie.value(), "signed.jwt.value");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.http_only(), Some(false));
        assert_eq!(cookie.secure(), Some(false));
        let expires = cookie.expires_datetime().expect("expiry");
        assert_eq!(expires.unix_timestamp(), token().expires_at.timestamp());
    }

    #[rstest]
    fn production_cookies_are_locked_down() {
        let cookie = SessionCookiePolicy::for_environment("production")
            .session_cookie(&token())
            .expect("cookie");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[rstest]
    fn cleared_cookie_is_empty_and_expired() {
        let cookie = SessionCookiePolicy::for_environment("development").cleared_cookie();
        assert_eq!(cookie.value(), "");
        let expires = cookie.expires_datetime().expect("expiry");
        assert!(expires < OffsetDateTime::now_utc());
    }
}
