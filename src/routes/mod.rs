use axum::{Json, Router, routing};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{app_state::AppState, swagger};

pub mod health;
pub mod orders;
pub mod products;
pub mod tracking;
pub mod users;

/// Plain `{message}` body for endpoints with nothing else to return.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// All API routes with their OpenAPI docs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    orders::routes_with_openapi()
        .merge(products::routes_with_openapi())
        .merge(users::routes_with_openapi())
        .merge(tracking::routes_with_openapi())
        .merge(health::routes_with_openapi())
}

async fn api_root() -> Json<MessageRes> {
    Json(MessageRes::new("TechStore API is running"))
}

/// The complete application: API, Swagger UI and request tracing.
pub fn app(state: AppState) -> Router {
    let (router, openapi) = routes_with_openapi().split_for_parts();
    let swagger_ui = swagger::create_swagger_ui(openapi);

    router
        .route("/api", routing::get(api_root))
        .with_state(state)
        .merge(swagger_ui)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
