//! Credential verification and session issuance.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, Span, debug, info};

use crate::domain::credentials::verify_password;
use crate::domain::ports::{
    AuthenticatedSession, LoginService, PasswordHasher, SessionTokens, UserRepository,
};
use crate::domain::repository_errors::map_user_repository_error;
use crate::domain::{Error, LoginCredentials, User};

/// Login service backed by the user repository, a password hasher, and a
/// session token codec.
pub struct UserLoginService<R, H, T> {
    users: Arc<R>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    span: Span,
}

impl<R, H, T> UserLoginService<R, H, T> {
    /// Create the service. Events are recorded inside `span`.
    pub fn new(users: Arc<R>, hasher: Arc<H>, tokens: Arc<T>, span: Span) -> Self {
        Self {
            users,
            hasher,
            tokens,
            span,
        }
    }
}

#[async_trait]
impl<R, H, T> LoginService for UserLoginService<R, H, T>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
    T: SessionTokens + 'static,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        async {
            let account = self
                .users
                .find_account_by_username(credentials.username())
                .await
                .map_err(map_user_repository_error)?;

            let Some(account) = account else {
                // Verify against a dummy hash so timing does not reveal
                // whether the username exists.
                verify_password(&self.hasher, credentials.password(), self.hasher.dummy_hash())
                    .await?;
                debug!(username = credentials.username(), "login for unknown user");
                return Err(Error::invalid_credentials());
            };

            let matches = verify_password(
                &self.hasher,
                credentials.password(),
                account.password_hash.clone(),
            )
            .await?;
            if !matches {
                debug!(username = credentials.username(), "login with wrong password");
                return Err(Error::invalid_credentials());
            }
            Ok(account.user)
        }
        .instrument(self.span.clone())
        .await
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthenticatedSession, Error> {
        let user = self.authenticate(credentials).await?;
        let token = self
            .tokens
            .issue(&user)
            .map_err(|err| Error::internal(err.to_string()))?;
        self.span.in_scope(|| {
            info!(user_id = %user.id(), "user logged in");
        });
        Ok(AuthenticatedSession { user, token })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockPasswordHasher, MockSessionTokens, MockUserRepository, SessionToken,
        SessionTokenError, UserRepositoryError,
    };
    use crate::domain::{
        DisplayName, EmailAddress, ErrorCode, PasswordHash, UserAccount, UserId, UserParts,
        Username,
    };
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    type Service = UserLoginService<MockUserRepository, MockPasswordHasher, MockSessionTokens>;

    fn account(is_admin: bool) -> UserAccount {
        UserAccount {
            user: User::new(UserParts {
                id: UserId::random(),
                username: Username::new("alice").expect("username"),
                email: EmailAddress::new("alice@example.com").expect("email"),
                name: DisplayName::new("Alice").expect("name"),
                is_admin,
                created_at: Utc::now(),
            }),
            password_hash: PasswordHash::new("stored-hash"),
        }
    }

    fn hasher_accepting(password: &'static str) -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_dummy_hash()
            .returning(|| PasswordHash::new("dummy-hash"));
        hasher
            .expect_verify()
            .returning(move |candidate, hash| Ok(candidate == password && hash.as_str() == "stored-hash"));
        hasher
    }

    fn service(users: MockUserRepository, hasher: MockPasswordHasher) -> Service {
        service_with_tokens(users, hasher, MockSessionTokens::new())
    }

    fn service_with_tokens(
        users: MockUserRepository,
        hasher: MockPasswordHasher,
        tokens: MockSessionTokens,
    ) -> Service {
        UserLoginService::new(
            Arc::new(users),
            Arc::new(hasher),
            Arc::new(tokens),
            Span::none(),
        )
    }

    fn credentials(username: &str, password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts(username, password).expect("credentials shape")
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[tokio::test]
    async fn authenticate_reports_stored_admin_flag(#[case] is_admin: bool) {
        let stored = account(is_admin);
        let expected = stored.user.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_account_by_username()
            .withf(|username| username == "alice")
            .times(1)
            .return_once(move |_| Ok(Some(stored)));

        let user = service(users, hasher_accepting("hunter22"))
            .authenticate(&credentials("alice", "hunter22"))
            .await
            .expect("authentication succeeds");

        assert_eq!(user, expected);
        assert_eq!(user.is_admin(), is_admin);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let stored = account(false);
        let mut known = MockUserRepository::new();
        known
            .expect_find_account_by_username()
            .return_once(move |_| Ok(Some(stored)));
        let wrong_password = service(known, hasher_accepting("hunter22"))
            .authenticate(&credentials("alice", "nope"))
            .await
            .expect_err("wrong password fails");

        let mut unknown = MockUserRepository::new();
        unknown
            .expect_find_account_by_username()
            .return_once(|_| Ok(None));
        let unknown_user = service(unknown, hasher_accepting("hunter22"))
            .authenticate(&credentials("mallory", "hunter22"))
            .await
            .expect_err("unknown user fails");

        assert_eq!(wrong_password.code(), ErrorCode::InvalidCredentials);
        assert_eq!(wrong_password.code(), unknown_user.code());
        assert_eq!(wrong_password.message(), unknown_user.message());
    }

    #[tokio::test]
    async fn unknown_user_still_runs_a_verification() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_account_by_username()
            .return_once(|_| Ok(None));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_dummy_hash()
            .times(1)
            .returning(|| PasswordHash::new("dummy-hash"));
        hasher
            .expect_verify()
            .withf(|_, hash| hash.as_str() == "dummy-hash")
            .times(1)
            .returning(|_, _| Ok(false));

        let err = service(users, hasher)
            .authenticate(&credentials("ghost", "whatever"))
            .await
            .expect_err("unknown user fails");
        assert_eq!(err.code(), ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn repository_failure_is_internal() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_account_by_username()
            .return_once(|_| Err(UserRepositoryError::connection("refused")));

        let err = service(users, MockPasswordHasher::new())
            .authenticate(&credentials("alice", "hunter22"))
            .await
            .expect_err("storage failure");
        assert_eq!(err.code(), ErrorCode::InternalServerError);
    }

    #[tokio::test]
    async fn login_issues_a_token_for_the_user() {
        let stored = account(true);
        let user_id = *stored.user.id();
        let mut users = MockUserRepository::new();
        users
            .expect_find_account_by_username()
            .return_once(move |_| Ok(Some(stored)));
        let mut tokens = MockSessionTokens::new();
        let expires_at = Utc
            .with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp");
        tokens
            .expect_issue()
            .withf(move |user| *user.id() == user_id)
            .times(1)
            .returning(move |_| {
                Ok(SessionToken {
                    value: "signed".into(),
                    expires_at,
                })
            });

        let session = service_with_tokens(users, hasher_accepting("hunter22"), tokens)
            .login(&credentials("alice", "hunter22"))
            .await
            .expect("login succeeds");
        assert_eq!(session.token.value, "signed");
        assert_eq!(session.token.expires_at, expires_at);
        assert_eq!(*session.user.id(), user_id);
    }

    #[tokio::test]
    async fn token_failure_is_internal() {
        let stored = account(false);
        let mut users = MockUserRepository::new();
        users
            .expect_find_account_by_username()
            .return_once(move |_| Ok(Some(stored)));
        let mut tokens = MockSessionTokens::new();
        tokens
            .expect_issue()
            .returning(|_| Err(SessionTokenError::issue("bad key")));

        let err = service_with_tokens(users, hasher_accepting("hunter22"), tokens)
            .login(&credentials("alice", "hunter22"))
            .await
            .expect_err("token failure");
        assert_eq!(err.code(), ErrorCode::InternalServerError);
    }
}
