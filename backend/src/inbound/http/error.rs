//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into the JSON envelope and status codes
//! clients rely on. Internal errors are redacted here; the original message
//! stays attached to the response for the trace middleware to log.

use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};

use crate::domain::{ApiResult, Error, ErrorCode, TRACE_ID_HEADER};

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized | ErrorCode::InvalidCredentials | ErrorCode::InvalidPassword => {
            StatusCode::UNAUTHORIZED
        }
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::UserNotFound | ErrorCode::RouteNotFound => StatusCode::NOT_FOUND,
        ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ErrorCode::UsernameConflict | ErrorCode::EmailConflict => StatusCode::CONFLICT,
        ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(self.redacted())
    }
}

/// Turn body extraction failures into `BAD_REQUEST` envelopes.
///
/// Registered through `web::JsonConfig`; covers malformed JSON, unknown
/// fields, wrong content types, and oversized bodies.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "request body must be JSON".to_owned(),
        JsonPayloadError::Deserialize(inner) => format!("request body is invalid: {inner}"),
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            "request body is too large".to_owned()
        }
        other => format!("request body could not be read: {other}"),
    };
    Error::bad_request(message).into()
}

/// Fallback for paths no route matches.
pub async fn route_not_found() -> ApiResult<HttpResponse> {
    Err(Error::route_not_found())
}

/// Fallback for known paths requested with an unsupported method.
pub async fn method_not_allowed() -> ApiResult<HttpResponse> {
    Err(Error::method_not_allowed())
}
