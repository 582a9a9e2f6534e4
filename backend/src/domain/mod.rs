//! Domain primitives, services, and ports.
//!
//! Purpose: define strongly typed entities used by the HTTP API, the email
//! worker, and the persistence adapters, plus the services implementing the
//! driving ports. Nothing here depends on Actix, Diesel, or SMTP.
//!
//! Public surface:
//! - `Error`/`ErrorCode`: transport-agnostic error payload.
//! - `User` and its validated field types.
//! - `LoginCredentials`, `PasswordChange`, `Requester`: authentication inputs
//!   and the authenticated caller.
//! - `EmailJob` and friends: notification jobs.
//! - Services: `UserLoginService`, `UserProfileService`, `UserAdminService`,
//!   `NotificationDispatcher`, `AdminBootstrap`, `EmailDelivery`, and the
//!   `EmailWorker` pool.

pub mod ports;

mod admin_bootstrap;
mod auth;
mod auth_service;
mod credentials;
mod email_delivery;
mod email_template;
mod email_worker;
pub mod error;
mod notification;
mod notification_dispatcher;
mod profile_service;
mod repository_errors;
mod trace_id;
mod user;
mod user_admin_service;

pub use self::admin_bootstrap::{
    AdminBootstrap, BootstrapOutcome, INITIAL_ADMIN_NAME, InitialAdmin,
};
pub use self::auth::{
    CredentialValidationError, LoginCredentials, PASSWORD_MIN_LEN, PasswordChange, Requester,
    TemporaryPassword,
};
pub use self::auth_service::UserLoginService;
pub use self::email_delivery::{DeliveryError, EmailDelivery};
pub use self::email_template::{RenderedEmail, render_email, subject_for};
pub use self::email_worker::{
    DrainReport, EmailWorker, EmailWorkerConfig, JobOutcome, STALE_CLAIM_GRACE,
};
pub use self::error::{Error, ErrorCode, INTERNAL_ERROR_MESSAGE};
pub use self::notification::{
    ClaimedEmailJob, EmailJob, EmailKind, EmailTemplateData, FailureDisposition,
    RETRY_BASE_DELAY, RETRY_MAX_DELAY, RetryPolicy, retry_backoff,
};
pub use self::notification_dispatcher::NotificationDispatcher;
pub use self::profile_service::{EMPTY_UPDATE_MESSAGE, UserProfileService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, EMAIL_MAX, EmailAddress, NewUser, PasswordHash,
    USERNAME_MAX, User, UserAccount, UserChanges, UserId, UserParts, UserValidationError,
    Username,
};
pub use self::user_admin_service::{UserAdminPorts, UserAdminService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use whenworks::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden())
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
