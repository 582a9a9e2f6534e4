//! Self-service handlers for the authenticated caller.
//!
//! ```text
//! GET   /v1/me
//! PATCH /v1/me {"email":"new@example.com"}
//! POST  /v1/me/update-password {"old_password":"...","new_password":"..."}
//! ```

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{ApiResult, Error, PasswordChange, Requester, UserChanges};

use super::schemas::UserEnvelope;
use super::state::HttpState;
use super::validation::{FieldErrors, credential_errors, optional_email, optional_name};

/// Body for `PATCH /v1/me`. At least one field is required.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateMeRequest {
    /// Replacement email address.
    pub email: Option<String>,
    /// Replacement display name.
    pub name: Option<String>,
}

/// Body for `POST /v1/me/update-password`.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePasswordRequest {
    /// Current password.
    #[serde(default)]
    pub old_password: String,
    /// Replacement password.
    #[serde(default)]
    pub new_password: String,
}

/// Return the caller's record.
#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Current user", body = UserEnvelope),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["me"],
    operation_id = "getMe"
)]
pub async fn get_me(
    state: web::Data<HttpState>,
    requester: Requester,
) -> ApiResult<web::Json<UserEnvelope>> {
    let user = state.profile.current_user(&requester).await?;
    Ok(web::Json(user.into()))
}

/// Update the caller's email and/or name.
#[utoipa::path(
    patch,
    path = "/v1/me",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated user", body = UserEnvelope),
        (status = 400, description = "No fields provided or malformed body", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Email already exists", body = Error),
        (status = 422, description = "Validation failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["me"],
    operation_id = "updateMe"
)]
pub async fn update_me(
    state: web::Data<HttpState>,
    requester: Requester,
    payload: web::Json<UpdateMeRequest>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let body = payload.into_inner();
    let mut fields = FieldErrors::new();
    let changes = UserChanges {
        email: optional_email(&mut fields, body.email.as_deref()),
        name: optional_name(&mut fields, body.name.as_deref()),
        is_admin: None,
    };
    fields.into_result()?;
    let user = state.profile.update_profile(&requester, changes).await?;
    Ok(web::Json(user.into()))
}

/// Replace the caller's password.
#[utoipa::path(
    post,
    path = "/v1/me/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Malformed body", body = Error),
        (status = 401, description = "Unauthorised or old password incorrect", body = Error),
        (status = 422, description = "Validation failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["me"],
    operation_id = "updatePassword"
)]
pub async fn update_password(
    state: web::Data<HttpState>,
    requester: Requester,
    payload: web::Json<UpdatePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let change = PasswordChange::try_from_parts(&body.old_password, &body.new_password)
        .map_err(credential_errors)?;
    state.profile.change_password(&requester, &change).await?;
    Ok(HttpResponse::NoContent().finish())
}
