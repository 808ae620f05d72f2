use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, ErrorRes},
    app_state::AppState,
    domain::{Category, Product},
    middleware::AuthUser,
    stores::StoreError,
    validation::{self, ProductInput},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_products, create_product))
        .routes(utoipa_axum::routes!(get_product))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct ProductFilter {
    /// One of the catalog categories, or `all`.
    category: Option<String>,
}

/// Fetch the catalog, optionally narrowed to one category.
#[utoipa::path(
    get,
    path = "/api/products",
    tags = ["Products"],
    params(ProductFilter),
    responses(
        (status = 200, description = "List products", body = Vec<Product>),
        (status = 400, description = "Unknown category", body = ErrorRes)
    )
)]
async fn get_products(
    State(state): State<AppState>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(filter) = filter?;
    let category = match filter.category.as_deref() {
        None | Some("") | Some("all") => None,
        Some(name) => Some(name.parse::<Category>().map_err(AppError::Validation)?),
    };
    Ok(Json(state.stores.catalog.list_products(category).await?))
}

/// Fetch a single product.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tags = ["Products"],
    params(
        ("id" = i32, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = Product),
        (status = 404, description = "Product not found", body = ErrorRes)
    )
)]
async fn get_product(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    match state.stores.catalog.find_product(id).await {
        Ok(product) => Ok(Json(product)),
        Err(StoreError::NotFound) => Err(AppError::NotFound("Product not found".into())),
        Err(err) => Err(err.into()),
    }
}

/// Add a product to the catalog.
#[utoipa::path(
    post,
    path = "/api/products",
    tags = ["Products"],
    security(("bearerAuth" = [])),
    request_body = ProductInput,
    responses(
        (status = 201, description = "Created product successfully", body = Product),
        (status = 400, description = "Invalid product", body = ErrorRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes)
    )
)]
async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = body?;
    let product = validation::validate_product(input)?;
    let product = state.stores.catalog.create_product(product).await?;
    info!("User {user_id} created product #{}", product.id);
    Ok((StatusCode::CREATED, Json(product)))
}
