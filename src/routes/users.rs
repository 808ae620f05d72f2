use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, ErrorRes},
    app_state::AppState,
    middleware::AuthUser,
    services::{AuthRes, ProfileRes},
    validation::{LoginInput, RegistrationInput},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(register))
        .routes(utoipa_axum::routes!(login))
        .routes(utoipa_axum::routes!(get_profile))
}

/// Create an account and sign in.
#[utoipa::path(
    post,
    path = "/api/users/register",
    tags = ["Users"],
    request_body = RegistrationInput,
    responses(
        (status = 201, description = "Registered", body = AuthRes),
        (status = 400, description = "Validation failed", body = ErrorRes),
        (status = 409, description = "Email already registered", body = ErrorRes)
    )
)]
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = body?;
    let res = state.accounts.register(input).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/users/login",
    tags = ["Users"],
    request_body = LoginInput,
    responses(
        (status = 200, description = "Signed in", body = AuthRes),
        (status = 401, description = "Invalid email or password", body = ErrorRes)
    )
)]
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = body?;
    Ok(Json(state.accounts.login(input).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    tags = ["Users"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Profile of the caller", body = ProfileRes),
        (status = 401, description = "Missing or invalid token", body = ErrorRes)
    )
)]
async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.accounts.profile(user_id).await?))
}
