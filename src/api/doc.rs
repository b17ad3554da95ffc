use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const FUNCTIONS_TAG: &str = "Functions";
pub const REALTIME_TAG: &str = "Realtime";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "launchpad-edge",
        description = "Edge functions for the agent token launchpad",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::api::dto::UnauthorizedResponse,
            crate::realtime::ChangeOperation,
        )
    ),
    tags(
        (name = FUNCTIONS_TAG, description = "Third-party API proxies and launchpad bookkeeping"),
        (name = REALTIME_TAG, description = "Database change stream"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let header = |name: &str, description: &str| {
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    name,
                    description,
                )))
            };
            components.add_security_scheme(
                "apikey",
                header("apikey", "Project anon key; `Authorization: Bearer <key>` also accepted"),
            );
            components.add_security_scheme(
                "vanitySecret",
                header("x-vanity-secret", "Shared secret of the vanity keypair grinder"),
            );
            components.add_security_scheme(
                "webhookSecret",
                header("x-webhook-secret", "Shared secret configured on the database webhook"),
            );
        }
    }
}
