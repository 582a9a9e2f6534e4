//! Shared validation helpers for inbound HTTP adapters.
//!
//! Field-level failures become a single `VALIDATION_FAILED` error whose
//! `details` object maps each offending field to its reason.

use serde_json::{Map, Value};

use crate::domain::{
    CredentialValidationError, DisplayName, EmailAddress, Error, UserId, UserValidationError,
    Username,
};

/// Collects per-field failures while a request body is validated.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Map<String, Value>);

impl FieldErrors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `reason` for `field`; the first failure per field wins.
    pub(crate) fn add(&mut self, field: &str, reason: impl ToString) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| Value::String(reason.to_string()));
    }

    /// Keep a validated value, recording the failure under its field.
    pub(crate) fn check<T>(&mut self, result: Result<T, UserValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.add(user_field(&err), &err);
                None
            }
        }
    }

    pub(crate) fn into_result(self) -> Result<(), Error> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::validation_failed(Value::Object(self.0)))
        }
    }
}

/// Request field a user validation error refers to.
pub(crate) const fn user_field(err: &UserValidationError) -> &'static str {
    match err {
        UserValidationError::InvalidId => "id",
        UserValidationError::EmptyUsername
        | UserValidationError::UsernameTooLong { .. }
        | UserValidationError::UsernameWhitespace => "username",
        UserValidationError::EmptyEmail | UserValidationError::InvalidEmail => "email",
        UserValidationError::EmptyDisplayName | UserValidationError::DisplayNameTooLong { .. } => {
            "name"
        }
    }
}

/// Fold credential validation errors into a `VALIDATION_FAILED` error.
pub(crate) fn credential_errors(errors: Vec<CredentialValidationError>) -> Error {
    let mut fields = FieldErrors::new();
    for err in &errors {
        fields.add(err.field(), err);
    }
    Error::validation_failed(Value::Object(fields.0))
}

/// Parse a user id taken from the request path.
pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| Error::bad_request("invalid user id"))
}

/// Validate a required string field, recording a "must be provided" failure
/// when it is absent.
pub(crate) fn required<T>(
    fields: &mut FieldErrors,
    name: &str,
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T, UserValidationError>,
) -> Option<T> {
    match value {
        Some(raw) => fields.check(parse(raw)),
        None => {
            fields.add(name, "must be provided");
            None
        }
    }
}

/// Validate an optional email field.
pub(crate) fn optional_email(
    fields: &mut FieldErrors,
    value: Option<&str>,
) -> Option<EmailAddress> {
    value.and_then(|raw| fields.check(EmailAddress::new(raw)))
}

/// Validate an optional display-name field.
pub(crate) fn optional_name(fields: &mut FieldErrors, value: Option<&str>) -> Option<DisplayName> {
    value.and_then(|raw| fields.check(DisplayName::new(raw)))
}

/// Validate a required username field.
pub(crate) fn required_username(fields: &mut FieldErrors, value: Option<&str>) -> Option<Username> {
    required(fields, "username", value, |raw| Username::new(raw))
}
