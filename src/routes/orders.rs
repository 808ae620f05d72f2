use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, ErrorRes},
    app_state::AppState,
    domain::{Order, PaymentResult},
    middleware::AuthUser,
    validation::OrderInput,
};

/// Order routes. Every endpoint requires a bearer token.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(create_order, get_my_orders))
        .routes(utoipa_axum::routes!(get_my_orders_alias))
        .routes(utoipa_axum::routes!(get_order))
        .routes(utoipa_axum::routes!(pay_order))
}

/// Place an order from the caller's cart.
#[utoipa::path(
    post,
    path = "/api/orders",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = OrderInput,
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Invalid order", body = ErrorRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes),
        (status = 500, description = "Order was not saved", body = ErrorRes)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<OrderInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = body?;
    let order = state.orders.place_order(user_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List the caller's orders, newest first.
#[utoipa::path(
    get,
    path = "/api/orders",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my orders", body = Vec<Order>),
        (status = 401, description = "Missing or invalid token", body = ErrorRes)
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.orders.list_orders_for_user(user_id).await?))
}

/// Same as `GET /api/orders`, kept for the storefront's order history page.
#[utoipa::path(
    get,
    path = "/api/orders/myorders",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my orders", body = Vec<Order>),
        (status = 401, description = "Missing or invalid token", body = ErrorRes)
    )
)]
async fn get_my_orders_alias(
    state: State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    get_my_orders(state, user).await
}

/// Fetch one of the caller's orders.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = Order),
        (status = 403, description = "Order belongs to another user", body = ErrorRes),
        (status = 404, description = "Order not found", body = ErrorRes)
    )
)]
async fn get_order(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    Ok(Json(state.orders.get_order(id, user_id).await?))
}

/// Mark one of the caller's orders as paid.
#[utoipa::path(
    put,
    path = "/api/orders/{id}/pay",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = i32, Path, description = "Order ID to mark as paid")
    ),
    request_body = PaymentResult,
    responses(
        (status = 200, description = "Order paid", body = Order),
        (status = 403, description = "Order belongs to another user", body = ErrorRes),
        (status = 404, description = "Order not found", body = ErrorRes)
    )
)]
async fn pay_order(
    id: Result<Path<i32>, PathRejection>,
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<PaymentResult>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(payment_result) = body?;
    Ok(Json(state.orders.mark_order_paid(id, user_id, payment_result).await?))
}
