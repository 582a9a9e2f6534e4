//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP adapter maps them to JSON
//! envelopes and status codes; the worker only logs them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::TraceId;

/// Message returned to clients for every internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// One or more fields failed validation.
    ValidationFailed,
    /// The request is malformed or missing required input.
    BadRequest,
    /// Session cookie is missing or invalid.
    Unauthorized,
    /// Username or password did not match.
    InvalidCredentials,
    /// The caller's current password did not match.
    InvalidPassword,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The referenced user does not exist.
    UserNotFound,
    /// No route matches the request path.
    RouteNotFound,
    /// The route exists but not for this method.
    MethodNotAllowed,
    /// Another user already holds the username.
    #[serde(rename = "USER_USERNAME_CONFLICT")]
    UsernameConflict,
    /// Another user already holds the email address.
    #[serde(rename = "USER_EMAIL_CONFLICT")]
    EmailConflict,
    /// An unexpected failure occurred.
    InternalServerError,
}

impl ErrorCode {
    /// Wire representation of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::UsernameConflict => "USER_USERNAME_CONFLICT",
            Self::EmailConflict => "USER_EMAIL_CONFLICT",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload shared by every inbound adapter.
///
/// Serialises as `{"code", "message", "details"}`; `details` is `null` when
/// absent. The trace identifier travels in a response header instead of the
/// body.
///
/// # Examples
/// ```
/// use whenworks::domain::{Error, ErrorCode};
///
/// let err = Error::user_not_found();
/// assert_eq!(err.code(), ErrorCode::UserNotFound);
/// assert_eq!(err.message(), "user not found");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Error {
    #[schema(example = "USER_NOT_FOUND")]
    code: ErrorCode,
    #[schema(example = "user not found")]
    message: String,
    details: Option<Value>,
    #[serde(skip)]
    trace_id: Option<String>,
}

impl Error {
    /// Create an error, capturing the trace identifier in scope if any.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary structured details.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Trace identifier captured when the error was created.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Attach structured details to the error.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Override the captured trace identifier.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Per-field validation failure; `details` maps field names to reasons.
    pub fn validation_failed(details: Value) -> Self {
        Self::new(
            ErrorCode::ValidationFailed,
            "one or more fields failed validation",
        )
        .with_details(details)
    }

    /// Malformed or incomplete request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Missing or invalid session.
    pub fn unauthorized() -> Self {
        Self::new(
            ErrorCode::Unauthorized,
            "you must be authenticated to access this resource",
        )
    }

    /// Username/password mismatch; identical for unknown users.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "invalid username or password")
    }

    /// Wrong current password during a password change.
    pub fn invalid_password() -> Self {
        Self::new(ErrorCode::InvalidPassword, "old password is incorrect")
    }

    /// Authenticated caller lacks administrator rights.
    pub fn forbidden() -> Self {
        Self::new(
            ErrorCode::Forbidden,
            "you do not have permission to access this resource",
        )
    }

    /// Referenced user does not exist.
    pub fn user_not_found() -> Self {
        Self::new(ErrorCode::UserNotFound, "user not found")
    }

    /// No route matches the request path.
    pub fn route_not_found() -> Self {
        Self::new(
            ErrorCode::RouteNotFound,
            "the requested route could not be found",
        )
    }

    /// Route exists but not for the request method.
    pub fn method_not_allowed() -> Self {
        Self::new(
            ErrorCode::MethodNotAllowed,
            "the requested method is not allowed for the specified route",
        )
    }

    /// Username already taken.
    pub fn username_conflict() -> Self {
        Self::new(ErrorCode::UsernameConflict, "username already exists")
    }

    /// Email address already taken.
    pub fn email_conflict() -> Self {
        Self::new(ErrorCode::EmailConflict, "email already exists")
    }

    /// Unexpected failure. The message is for logs; adapters redact it.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    /// Copy of this error that is safe to show to clients.
    ///
    /// Internal errors lose their diagnostic message and details; every
    /// other code is returned unchanged.
    #[must_use]
    pub fn redacted(&self) -> Self {
        if self.code == ErrorCode::InternalServerError {
            Self {
                code: self.code,
                message: INTERNAL_ERROR_MESSAGE.to_owned(),
                details: None,
                trace_id: self.trace_id.clone(),
            }
        } else {
            self.clone()
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}
