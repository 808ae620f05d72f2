use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::stores::StoreError;

/// One failed field of a multi-field validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or incomplete request; detected before anything is written.
    #[error("{0}")]
    Validation(String),

    #[error("Validation failed")]
    ValidationFields(Vec<FieldError>),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The order transaction rolled back. Nothing from the request was persisted.
    #[error("Order could not be saved, no changes were made")]
    Persistence(#[source] anyhow::Error),

    /// The order committed but reading it back failed; re-fetch by id, do not resubmit.
    #[error("Order #{order_id} was placed but could not be loaded, fetch it again by id")]
    ReadBack {
        order_id: i32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal server error")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::ValidationFields(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::ReadBack { .. } | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::InsufficientStock { product_id } => {
                AppError::Validation(format!("Insufficient stock for product {product_id}"))
            }
            StoreError::DuplicateEmail(_) => {
                AppError::Conflict("User already exists with this email".into())
            }
            StoreError::Backend(err) => AppError::Other(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_client_error() {
            tracing::warn!("Rejected request ({status}): {message}");
        }

        let body = match self {
            AppError::ValidationFields(errors) => json!({ "message": message, "errors": errors }),
            AppError::ReadBack { order_id, source } => {
                tracing::error!("Read-back of order #{order_id} failed: {source:?}");
                json!({ "message": message, "orderId": order_id })
            }
            AppError::Persistence(err) => {
                tracing::error!("Order transaction rolled back: {err:?}");
                json!({ "message": message })
            }
            AppError::Other(err) => {
                tracing::error!("Unhandled error: {err:?}");
                json!({ "message": message })
            }
            _ => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}
