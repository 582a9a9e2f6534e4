//! Translation of driven-port errors into domain errors.

use crate::domain::Error;
use crate::domain::ports::{PasswordHasherError, UserRepositoryError};

/// Map a user repository failure onto the client-facing error taxonomy.
///
/// Conflicts and missing rows keep their meaning; every infrastructure
/// failure becomes an internal error carrying the diagnostic message.
pub(crate) fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::UsernameConflict => Error::username_conflict(),
        UserRepositoryError::EmailConflict => Error::email_conflict(),
        UserRepositoryError::NotFound => Error::user_not_found(),
        UserRepositoryError::Connection { message } => {
            Error::internal(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::Timeout { operation } => {
            Error::internal(format!("user repository {operation} timed out"))
        }
    }
}

pub(crate) fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(error.to_string())
}
