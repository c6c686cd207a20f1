//! OpenAPI document and Swagger UI, served in the local environment only.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use todo_core::{PingResponse, Todo};

/// Swagger UI mount point
pub const SWAGGER_PATH: &str = "/api/swagger";

/// OpenAPI document path
pub const OPENAPI_PATH: &str = "/api/swagger/doc.json";

/// OpenAPI description of the Todo API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Todo API",
        description = "Backend Todo API",
        license(name = "Apache 2.0", url = "http://www.apache.org/licenses/LICENSE-2.0.html")
    ),
    paths(crate::handlers::ping, crate::handlers::get_todo),
    components(schemas(Todo, PingResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "ping", description = "Liveness"),
        (name = "todos", description = "Todo resource")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "ApiKeyAuth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-KEY"))),
            );
        }
    }
}

/// Swagger UI serving the generated document
#[must_use]
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(SWAGGER_PATH).url(OPENAPI_PATH, ApiDoc::openapi())
}
