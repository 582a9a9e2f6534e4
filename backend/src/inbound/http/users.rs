//! Administrator user-management handlers.
//!
//! ```text
//! GET    /v1/users
//! POST   /v1/users {"username":"bob","email":"bob@example.com","name":"Bob"}
//! GET    /v1/users/{id}
//! PATCH  /v1/users/{id} {"is_admin":true}
//! DELETE /v1/users/{id}
//! POST   /v1/users/{id}/reset-password
//! ```

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::ports::CreateUserRequest;
use crate::domain::{ApiResult, DisplayName, EmailAddress, Error, UserChanges};

use super::schemas::{UserEnvelope, UsersEnvelope};
use super::state::HttpState;
use super::validation::{
    FieldErrors, optional_email, optional_name, parse_user_id, required, required_username,
};

/// Body for `POST /v1/users`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateUserBody {
    /// Unique login name; no whitespace.
    pub username: Option<String>,
    /// Unique email address; receives the temporary password.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
}

/// Body for `PATCH /v1/users/{id}`. At least one field is required.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserBody {
    /// Replacement email address.
    pub email: Option<String>,
    /// Replacement display name.
    pub name: Option<String>,
    /// Grant or revoke administrator rights.
    pub is_admin: Option<bool>,
}

impl CreateUserBody {
    fn validate(self) -> Result<CreateUserRequest, Error> {
        let mut fields = FieldErrors::new();
        let username = required_username(&mut fields, self.username.as_deref());
        let email = required(&mut fields, "email", self.email.as_deref(), |raw| {
            EmailAddress::new(raw)
        });
        let name = required(&mut fields, "name", self.name.as_deref(), |raw| {
            DisplayName::new(raw)
        });
        fields.into_result()?;
        match (username, email, name) {
            (Some(username), Some(email), Some(name)) => Ok(CreateUserRequest {
                username,
                email,
                name,
            }),
            _ => Err(Error::internal("validated user fields missing")),
        }
    }
}

impl UpdateUserBody {
    fn validate(self) -> Result<UserChanges, Error> {
        let mut fields = FieldErrors::new();
        let changes = UserChanges {
            email: optional_email(&mut fields, self.email.as_deref()),
            name: optional_name(&mut fields, self.name.as_deref()),
            is_admin: self.is_admin,
        };
        fields.into_result()?;
        Ok(changes)
    }
}

/// List all users, newest first.
#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "Users", body = UsersEnvelope),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<UsersEnvelope>> {
    let users = state.admin.list_users().await?;
    Ok(web::Json(UsersEnvelope { users }))
}

/// Create a user and email them a temporary password.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserBody,
    responses(
        (status = 201, description = "User created", body = UserEnvelope),
        (status = 400, description = "Malformed body", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Username or email already exists", body = Error),
        (status = 422, description = "Validation failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserBody>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner().validate()?;
    let user = state.admin.create_user(request).await?;
    Ok(HttpResponse::Created().json(UserEnvelope::from(user)))
}

/// Fetch one user.
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 200, description = "User", body = UserEnvelope),
        (status = 400, description = "Invalid user id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let id = parse_user_id(&path)?;
    let user = state.admin.get_user(&id).await?;
    Ok(web::Json(user.into()))
}

/// Update a user's email, name, and/or admin flag.
#[utoipa::path(
    patch,
    path = "/v1/users/{id}",
    params(("id" = String, Path, description = "User id (UUID)")),
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "Updated user", body = UserEnvelope),
        (status = 400, description = "Invalid id, empty or malformed body", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 409, description = "Email already exists", body = Error),
        (status = 422, description = "Validation failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserBody>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let id = parse_user_id(&path)?;
    let changes = payload.into_inner().validate()?;
    let user = state.admin.update_user(&id, changes).await?;
    Ok(web::Json(user.into()))
}

/// Delete a user.
#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid user id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path)?;
    state.admin.delete_user(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Replace a user's password with a temporary one and email it.
#[utoipa::path(
    post,
    path = "/v1/users/{id}/reset-password",
    params(("id" = String, Path, description = "User id (UUID)")),
    responses(
        (status = 204, description = "Password reset; email queued"),
        (status = 400, description = "Invalid user id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "resetPassword"
)]
pub async fn reset_password(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path)?;
    state.admin.reset_password(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}
