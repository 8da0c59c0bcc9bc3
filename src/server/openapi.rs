//! OpenAPI document for the sticker API, served as JSON.

use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use super::AppContext;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stickerforge API",
        description = "Converts short videos into animated WebP stickers",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "/", description = "Default server")
    ),
    paths(
        super::routes_api::health,
        super::routes_api::convert,
        super::routes_api::download,
        super::routes_api::cleanup,
    ),
    components(
        schemas(
            super::routes_api::HealthResponse,
            super::routes_api::ConvertForm,
            super::routes_api::ConvertResponse,
            super::routes_api::CleanupResponse,
            super::routes_api::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "stickers", description = "Conversion, download and cleanup"),
    )
)]
pub struct ApiDoc;

pub fn openapi_routes() -> Router<AppContext> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
