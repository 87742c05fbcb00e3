//! OpenAPI/Utoipa configuration.

use crate::api::{AUTH_TAG, SECRETS_TAG, health::MISC_TAG};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // The opaque session cookie issued after login; protected
            // endpoints answer 303 to /login without it.
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "id",
                    "Opaque session cookie issued after a successful login.",
                ))),
            );
        }
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Secret Sharer API",
        version = "1.0.0",
        description = "Local and federated login in front of a per-user secret vault."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = AUTH_TAG, description = "Local and federated authentication endpoints"),
        (name = SECRETS_TAG, description = "Gate-checked secret endpoints")
    )
)]
pub struct ApiDoc;
