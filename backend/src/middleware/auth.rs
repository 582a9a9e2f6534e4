//! Authentication and authorisation guards.
//!
//! `RequireAuthenticated` validates the `accessToken` cookie and stores the
//! resulting [`Requester`] in the request extensions. `RequireAdmin` reads
//! that value back, so it must sit inside `RequireAuthenticated`:
//!
//! ```ignore
//! web::scope("/users")
//!     .wrap(RequireAdmin::new(span.clone()))
//!     .wrap(RequireAuthenticated::new(tokens, span))
//! ```
//!
//! Rejections are returned as responses, not errors, so outer middleware
//! still sees them and adds the trace header.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Span, debug, error};

use crate::domain::ports::SessionTokens;
use crate::domain::{Error as DomainError, Requester};
use crate::inbound::http::session::ACCESS_TOKEN_COOKIE;

/// Rejects requests without a valid session cookie with `401 UNAUTHORIZED`.
#[derive(Clone)]
pub struct RequireAuthenticated {
    tokens: Arc<dyn SessionTokens>,
    span: Span,
}

impl RequireAuthenticated {
    /// Guard validating cookies with `tokens`.
    pub fn new(tokens: Arc<dyn SessionTokens>, span: Span) -> Self {
        Self { tokens, span }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuthenticated
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAuthenticatedMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthenticatedMiddleware {
            service: Rc::new(service),
            tokens: Arc::clone(&self.tokens),
            span: self.span.clone(),
        }))
    }
}

/// Service wrapper produced by [`RequireAuthenticated`].
pub struct RequireAuthenticatedMiddleware<S> {
    service: Rc<S>,
    tokens: Arc<dyn SessionTokens>,
    span: Span,
}

impl<S> RequireAuthenticatedMiddleware<S> {
    fn requester(&self, req: &ServiceRequest) -> Option<Requester> {
        let cookie = req.cookie(ACCESS_TOKEN_COOKIE)?;
        let token = cookie.value();
        if token.is_empty() {
            return None;
        }
        match self.tokens.validate(token) {
            Ok(requester) => Some(requester),
            Err(err) => {
                self.span
                    .in_scope(|| debug!(error = %err, uri = %req.uri(), "session rejected"));
                None
            }
        }
    }
}

impl<S, B> Service<ServiceRequest> for RequireAuthenticatedMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.requester(&req) {
            Some(requester) => {
                req.extensions_mut().insert(requester);
                let service = Rc::clone(&self.service);
                Box::pin(async move {
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                })
            }
            None => Box::pin(async move {
                Ok(req
                    .error_response(DomainError::unauthorized())
                    .map_into_right_body())
            }),
        }
    }
}

/// Rejects authenticated callers without the admin flag with
/// `403 FORBIDDEN`.
///
/// A request reaching this guard without a [`Requester`] is a wiring bug and
/// yields `500 INTERNAL_SERVER_ERROR`.
#[derive(Clone)]
pub struct RequireAdmin {
    span: Span,
}

impl RequireAdmin {
    /// Guard recording wiring errors inside `span`.
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAdmin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAdminMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAdminMiddleware {
            service: Rc::new(service),
            span: self.span.clone(),
        }))
    }
}

/// Service wrapper produced by [`RequireAdmin`].
pub struct RequireAdminMiddleware<S> {
    service: Rc<S>,
    span: Span,
}

impl<S, B> Service<ServiceRequest> for RequireAdminMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let is_admin = req.extensions().get::<Requester>().map(Requester::is_admin);
        match is_admin {
            Some(true) => {
                let service = Rc::clone(&self.service);
                Box::pin(async move {
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                })
            }
            Some(false) => Box::pin(async move {
                Ok(req
                    .error_response(DomainError::forbidden())
                    .map_into_right_body())
            }),
            None => {
                self.span.in_scope(|| {
                    error!(
                        method = %req.method(),
                        uri = %req.uri(),
                        "admin guard reached without an authenticated requester"
                    );
                });
                Box::pin(async move {
                    Ok(req
                        .error_response(DomainError::internal(
                            "admin guard requires an authenticated requester",
                        ))
                        .map_into_right_body())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MockSessionTokens, SessionTokenError};
    use crate::domain::{ErrorCode, UserId};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::middleware::Condition;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;
    use serde_json::Value;

    fn tokens_accepting(token: &'static str, is_admin: bool) -> Arc<dyn SessionTokens> {
        let mut tokens = MockSessionTokens::new();
        tokens.expect_validate().returning(move |value| {
            if value == token {
                Ok(Requester::new(UserId::random(), "alice", is_admin))
            } else {
                Err(SessionTokenError::invalid())
            }
        });
        Arc::new(tokens)
    }

    async fn whoami(req: actix_web::HttpRequest) -> HttpResponse {
        let name = req
            .extensions()
            .get::<Requester>()
            .map(|r| r.username().to_owned())
            .unwrap_or_default();
        HttpResponse::Ok().body(name)
    }

    async fn status_and_code(
        tokens: Arc<dyn SessionTokens>,
        admin: bool,
        cookie: Option<&str>,
    ) -> (StatusCode, Option<String>) {
        let app = test::init_service(
            App::new().service(
                web::scope("/guarded")
                    .route("", web::get().to(whoami))
                    .wrap(Condition::new(admin, RequireAdmin::new(Span::none())))
                    .wrap(RequireAuthenticated::new(tokens, Span::none())),
            ),
        )
        .await;
        let mut req = test::TestRequest::get().uri("/guarded");
        if let Some(value) = cookie {
            req = req.cookie(Cookie::new(ACCESS_TOKEN_COOKIE, value.to_owned()));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        let code = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|v| v["code"].as_str().map(str::to_owned));
        (status, code)
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("forged"))]
    #[actix_web::test]
    async fn missing_or_invalid_cookies_are_unauthorised(#[case] cookie: Option<&str>) {
        let (status, code) = status_and_code(tokens_accepting("good", true), false, cookie).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code.as_deref(), Some("UNAUTHORIZED"));
    }

    #[rstest]
    #[actix_web::test]
    async fn valid_cookies_reach_the_handler() {
        let (status, _) = status_and_code(tokens_accepting("good", false), false, Some("good")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn non_admins_are_forbidden() {
        let (status, code) = status_and_code(tokens_accepting("good", false), true, Some("good")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code.as_deref(), Some("FORBIDDEN"));
    }

    #[rstest]
    #[actix_web::test]
    async fn admins_pass_both_guards() {
        let (status, _) = status_and_code(tokens_accepting("good", true), true, Some("good")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn admin_guard_without_authentication_is_internal_error() {
        let app = test::init_service(
            App::new().service(
                web::scope("/guarded")
                    .wrap(RequireAdmin::new(Span::none()))
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/guarded").to_request()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::InternalServerError.as_str());
    }
}
