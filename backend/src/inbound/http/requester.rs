//! Extractor for the authenticated caller.
//!
//! `RequireAuthenticated` stores a [`Requester`] in the request extensions;
//! handlers behind it take `Requester` as an argument. A missing value means
//! the route was wired without the middleware.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{Ready, ready};
use tracing::error;

use crate::domain::{Error, Requester};

impl FromRequest for Requester {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let requester = req.extensions().get::<Requester>().cloned();
        ready(requester.ok_or_else(|| {
            error!(
                method = %req.method(),
                uri = %req.uri(),
                "requester missing from request; authentication middleware not applied"
            );
            Error::internal("requester missing from request extensions")
        }))
    }
}
