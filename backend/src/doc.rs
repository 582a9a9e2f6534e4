//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer, the
//! request and response bodies, and the `accessToken` cookie security
//! scheme. Swagger UI serves it at `/docs` in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, User};
use crate::inbound::http::auth::LoginRequest;
use crate::inbound::http::health::HealthcheckResponse;
use crate::inbound::http::me::{UpdateMeRequest, UpdatePasswordRequest};
use crate::inbound::http::schemas::{UserEnvelope, UsersEnvelope};
use crate::inbound::http::session::ACCESS_TOKEN_COOKIE;
use crate::inbound::http::users::{CreateUserBody, UpdateUserBody};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                ACCESS_TOKEN_COOKIE,
                "Signed session token issued by POST /v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "WhenWorks API",
        description = "User directory, session authentication, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::health::healthcheck,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::me::get_me,
        crate::inbound::http::me::update_me,
        crate::inbound::http::me::update_password,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::users::reset_password,
    ),
    components(schemas(
        User,
        Error,
        ErrorCode,
        UserEnvelope,
        UsersEnvelope,
        LoginRequest,
        UpdateMeRequest,
        UpdatePasswordRequest,
        CreateUserBody,
        UpdateUserBody,
        HealthcheckResponse,
    )),
    tags(
        (name = "auth", description = "Session login and logout"),
        (name = "me", description = "Self-service profile management"),
        (name = "users", description = "Administrator user management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error = schemas.get("Error").expect("Error schema");
        assert_object_schema_has_field(error, "code");
        assert_object_schema_has_field(error, "message");
    }

    #[rstest]
    fn user_schema_never_exposes_a_password() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let user = schemas.get("User").expect("User schema");
        assert_object_schema_has_field(user, "id");
        assert_object_schema_has_field(user, "is_admin");
        if let RefOr::T(Schema::Object(obj)) = user {
            assert!(!obj.properties.contains_key("password_hash"));
        }
    }

    #[rstest]
    #[case("/v1/auth/login")]
    #[case("/v1/me/update-password")]
    #[case("/v1/users/{id}/reset-password")]
    #[case("/health/live")]
    fn endpoints_are_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
