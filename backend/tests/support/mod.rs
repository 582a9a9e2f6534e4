//! Shared harness for the integration suites.
//!
//! Wires the real domain services, JWT session tokens, route table, and
//! middleware over the in-memory adapters from `whenworks::test_support`.

use std::sync::Arc;
use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::{Clock, DefaultClock};
use tracing::Span;
use zeroize::Zeroizing;

use whenworks::Trace;
use whenworks::domain::ports::SessionTokens;
use whenworks::domain::{
    AdminBootstrap, EmailAddress, InitialAdmin, NotificationDispatcher, RetryPolicy,
    UserAdminPorts, UserAdminService, UserLoginService, UserProfileService, Username,
};
use whenworks::inbound::http::health::HealthState;
use whenworks::inbound::http::routes;
use whenworks::inbound::http::state::{HttpState, HttpStatePorts};
use whenworks::outbound::security::JwtSessionTokens;
use whenworks::test_support::{
    FixedPasswordGenerator, InMemoryEmailQueue, InMemoryUserRepository, PlainPasswordHasher,
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "s3cret-admin";
pub const TEMPORARY_PASSWORD: &str = "Temp0rary123";
const SECRET: &str = "integration-secret-at-least-32-bytes!";

/// In-memory adapters plus the HTTP state built on them.
pub struct Harness {
    pub users: Arc<InMemoryUserRepository>,
    pub queue: Arc<InMemoryEmailQueue>,
    pub passwords: Arc<FixedPasswordGenerator>,
    state: web::Data<HttpState>,
    tokens: Arc<dyn SessionTokens>,
}

impl Harness {
    /// Services over empty stores, with the initial administrator created.
    pub async fn bootstrapped() -> Self {
        let harness = Self::new();
        AdminBootstrap::new(
            Arc::clone(&harness.users),
            Arc::new(PlainPasswordHasher),
            Span::none(),
        )
        .ensure_admin(Some(&InitialAdmin {
            username: Username::new(ADMIN_USERNAME).expect("username"),
            email: EmailAddress::new("admin@example.com").expect("email"),
            password: Zeroizing::new(ADMIN_PASSWORD.to_owned()),
        }))
        .await
        .expect("bootstrap");
        harness
    }

    fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let queue = Arc::new(InMemoryEmailQueue::new());
        let passwords = Arc::new(FixedPasswordGenerator::new(TEMPORARY_PASSWORD));
        let hasher = Arc::new(PlainPasswordHasher);
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let tokens = Arc::new(JwtSessionTokens::new(
            &Zeroizing::new(SECRET.to_owned()),
            Duration::from_secs(3600),
            clock,
        ));
        let notifications = Arc::new(NotificationDispatcher::new(
            Arc::clone(&queue),
            RetryPolicy {
                max_retries: 3,
                timeout_secs: 30,
            },
            Span::none(),
        ));
        let state = HttpState::new(
            HttpStatePorts {
                login: Arc::new(UserLoginService::new(
                    Arc::clone(&users),
                    Arc::clone(&hasher),
                    Arc::clone(&tokens),
                    Span::none(),
                )),
                profile: Arc::new(UserProfileService::new(
                    Arc::clone(&users),
                    Arc::clone(&hasher),
                    Span::none(),
                )),
                admin: Arc::new(UserAdminService::new(
                    UserAdminPorts {
                        users: Arc::clone(&users),
                        hasher,
                        passwords: Arc::clone(&passwords),
                        notifications,
                    },
                    Span::none(),
                )),
            },
            "test",
        );
        Self {
            users,
            queue,
            passwords,
            state: web::Data::new(state),
            tokens,
        }
    }

    /// The production route table and middleware over this harness.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let tokens = Arc::clone(&self.tokens);
        App::new()
            .wrap(Trace::new(Span::none()))
            .app_data(self.state.clone())
            .app_data(web::Data::new(HealthState::new()))
            .configure(move |cfg| routes::configure(cfg, tokens, Span::none()))
    }
}
