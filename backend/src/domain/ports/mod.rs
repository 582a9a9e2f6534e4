//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`UserRepository`, `PasswordHasher`, `SessionTokens`,
//! `EmailQueue`, `EmailJobStore`, `Mailer`, `PasswordGenerator`) are
//! implemented by outbound adapters. Driving ports (`LoginService`,
//! `ProfileService`, `UserAdministration`) are implemented by domain services
//! and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod email_job_store;
mod email_queue;
mod login_service;
mod mailer;
mod password_generator;
mod password_hasher;
mod profile_service;
mod session_tokens;
mod user_administration;
mod user_repository;

#[cfg(test)]
pub use email_job_store::MockEmailJobStore;
pub use email_job_store::{EmailJobStore, EmailJobStoreError};
#[cfg(test)]
pub use email_queue::MockEmailQueue;
pub use email_queue::{EmailQueue, JobDispatchError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{AuthenticatedSession, LoginService};
#[cfg(test)]
pub use mailer::MockMailer;
pub use mailer::{Mailer, MailerError, OutgoingEmail};
#[cfg(test)]
pub use password_generator::MockPasswordGenerator;
pub use password_generator::{PasswordGenerator, TEMPORARY_PASSWORD_LEN};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use profile_service::MockProfileService;
pub use profile_service::ProfileService;
#[cfg(test)]
pub use session_tokens::MockSessionTokens;
pub use session_tokens::{SessionToken, SessionTokenError, SessionTokens};
#[cfg(test)]
pub use user_administration::MockUserAdministration;
pub use user_administration::{CreateUserRequest, UserAdministration};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
