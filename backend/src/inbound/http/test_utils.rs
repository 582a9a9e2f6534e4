//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, Error, web};
use chrono::Utc;
use tracing::Span;

use crate::Trace;
use crate::domain::ports::{
    MockLoginService, MockProfileService, MockSessionTokens, MockUserAdministration,
    SessionTokenError,
};
use crate::domain::{DisplayName, EmailAddress, Requester, User, UserId, UserParts, Username};

use super::health::HealthState;
use super::routes;
use super::session::ACCESS_TOKEN_COOKIE;
use super::state::{HttpState, HttpStatePorts};

/// Token accepted for the administrator caller.
pub(crate) const ADMIN_TOKEN: &str = "admin-token";
/// Token accepted for the regular caller.
pub(crate) const MEMBER_TOKEN: &str = "member-token";

/// Mock ports wired into [`test_app`].
#[derive(Default)]
pub(crate) struct TestPorts {
    pub login: MockLoginService,
    pub profile: MockProfileService,
    pub admin: MockUserAdministration,
}

pub(crate) fn admin_requester() -> Requester {
    Requester::new(
        UserId::new("00000000-0000-4000-8000-000000000001").expect("admin id"),
        "admin",
        true,
    )
}

pub(crate) fn member_requester() -> Requester {
    Requester::new(
        UserId::new("00000000-0000-4000-8000-000000000002").expect("member id"),
        "member",
        false,
    )
}

pub(crate) fn sample_user(username: &str, email: &str, is_admin: bool) -> User {
    User::new(UserParts {
        id: UserId::random(),
        username: Username::new(username).expect("username"),
        email: EmailAddress::new(email).expect("email"),
        name: DisplayName::new("Sample User").expect("name"),
        is_admin,
        created_at: Utc::now(),
    })
}

pub(crate) fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::new(ACCESS_TOKEN_COOKIE, token.to_owned())
}

fn session_tokens() -> MockSessionTokens {
    let mut tokens = MockSessionTokens::new();
    tokens.expect_validate().returning(|token| match token {
        ADMIN_TOKEN => Ok(admin_requester()),
        MEMBER_TOKEN => Ok(member_requester()),
        _ => Err(SessionTokenError::invalid()),
    });
    tokens
}

/// Full route table over mock ports, wrapped in the trace middleware.
pub(crate) fn test_app(
    ports: TestPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(
        HttpStatePorts {
            login: Arc::new(ports.login),
            profile: Arc::new(ports.profile),
            admin: Arc::new(ports.admin),
        },
        "test",
    );
    let tokens: Arc<dyn crate::domain::ports::SessionTokens> = Arc::new(session_tokens());
    App::new()
        .wrap(Trace::new(Span::none()))
        .app_data(web::Data::new(state))
        .app_data(web::Data::new(HealthState::new()))
        .configure(move |cfg| routes::configure(cfg, tokens, Span::none()))
}
