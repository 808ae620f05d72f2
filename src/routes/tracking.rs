use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, ErrorRes},
    app_state::AppState,
    domain::ActivityType,
    middleware::{AuthUser, RequestMeta},
    routes::MessageRes,
    services::TrackingInput,
};

/// Storefront analytics. Anonymous callers are accepted; a valid token attributes the event.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(track_login))
        .routes(utoipa_axum::routes!(track_logout))
        .routes(utoipa_axum::routes!(track_product_view))
        .routes(utoipa_axum::routes!(track_add_to_cart))
        .routes(utoipa_axum::routes!(track_remove_from_cart))
        .routes(utoipa_axum::routes!(track_checkout_start))
        .routes(utoipa_axum::routes!(track_checkout_complete))
        .routes(utoipa_axum::routes!(track_page_visit))
}

type TrackResult = Result<(StatusCode, Json<MessageRes>), AppError>;

struct Event {
    kind: ActivityType,
    status: StatusCode,
    message: &'static str,
}

async fn track(
    state: AppState,
    event: Event,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let Json(input) = body?;
    state
        .tracking
        .record(event.kind, input, meta, caller.map(|AuthUser(id)| id))
        .await?;
    Ok((event.status, Json(MessageRes::new(event.message))))
}

#[utoipa::path(
    post,
    path = "/api/tracking/login",
    tags = ["Tracking"],
    request_body = TrackingInput,
    responses(
        (status = 201, description = "Tracked", body = MessageRes),
        (status = 400, description = "Malformed body", body = ErrorRes)
    )
)]
async fn track_login(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let event = Event {
        kind: ActivityType::Login,
        status: StatusCode::CREATED,
        message: "Login tracked successfully",
    };
    track(state, event, caller, meta, body).await
}

#[utoipa::path(
    post,
    path = "/api/tracking/logout",
    tags = ["Tracking"],
    request_body = TrackingInput,
    responses(
        (status = 200, description = "Tracked", body = MessageRes),
        (status = 400, description = "Malformed body", body = ErrorRes)
    )
)]
async fn track_logout(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let event = Event {
        kind: ActivityType::Logout,
        status: StatusCode::OK,
        message: "Logout tracked successfully",
    };
    track(state, event, caller, meta, body).await
}

#[utoipa::path(
    post,
    path = "/api/tracking/product-view",
    tags = ["Tracking"],
    request_body = TrackingInput,
    responses(
        (status = 201, description = "Tracked", body = MessageRes),
        (status = 400, description = "Missing product_id", body = ErrorRes)
    )
)]
async fn track_product_view(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let event = Event {
        kind: ActivityType::ProductView,
        status: StatusCode::CREATED,
        message: "Product view tracked successfully",
    };
    track(state, event, caller, meta, body).await
}

#[utoipa::path(
    post,
    path = "/api/tracking/add-to-cart",
    tags = ["Tracking"],
    request_body = TrackingInput,
    responses(
        (status = 201, description = "Tracked", body = MessageRes),
        (status = 400, description = "Missing product_id", body = ErrorRes)
    )
)]
async fn track_add_to_cart(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let event = Event {
        kind: ActivityType::AddToCart,
        status: StatusCode::CREATED,
        message: "Add to cart tracked successfully",
    };
    track(state, event, caller, meta, body).await
}

#[utoipa::path(
    post,
    path = "/api/tracking/remove-from-cart",
    tags = ["Tracking"],
    request_body = TrackingInput,
    responses(
        (status = 200, description = "Tracked", body = MessageRes),
        (status = 400, description = "Missing product_id", body = ErrorRes)
    )
)]
async fn track_remove_from_cart(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let event = Event {
        kind: ActivityType::RemoveFromCart,
        status: StatusCode::OK,
        message: "Remove from cart tracked successfully",
    };
    track(state, event, caller, meta, body).await
}

#[utoipa::path(
    post,
    path = "/api/tracking/checkout-start",
    tags = ["Tracking"],
    request_body = TrackingInput,
    responses(
        (status = 201, description = "Tracked", body = MessageRes),
        (status = 400, description = "Malformed body", body = ErrorRes)
    )
)]
async fn track_checkout_start(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let event = Event {
        kind: ActivityType::CheckoutStart,
        status: StatusCode::CREATED,
        message: "Checkout start tracked successfully",
    };
    track(state, event, caller, meta, body).await
}

#[utoipa::path(
    post,
    path = "/api/tracking/checkout-complete",
    tags = ["Tracking"],
    request_body = TrackingInput,
    responses(
        (status = 201, description = "Tracked", body = MessageRes),
        (status = 400, description = "Malformed body", body = ErrorRes)
    )
)]
async fn track_checkout_complete(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let event = Event {
        kind: ActivityType::CheckoutComplete,
        status: StatusCode::CREATED,
        message: "Checkout complete tracked successfully",
    };
    track(state, event, caller, meta, body).await
}

#[utoipa::path(
    post,
    path = "/api/tracking/page-visit",
    tags = ["Tracking"],
    request_body = TrackingInput,
    responses(
        (status = 201, description = "Tracked", body = MessageRes),
        (status = 400, description = "Malformed body", body = ErrorRes)
    )
)]
async fn track_page_visit(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    meta: RequestMeta,
    body: Result<Json<TrackingInput>, JsonRejection>,
) -> TrackResult {
    let event = Event {
        kind: ActivityType::PageVisit,
        status: StatusCode::CREATED,
        message: "Page visit tracked successfully",
    };
    track(state, event, caller, meta, body).await
}
