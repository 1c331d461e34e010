use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use stockwatch_catalog::onboarding::{FieldErrors, OnboardingError};
use stockwatch_core::StoreError;

#[derive(Debug)]
pub enum AppError {
    /// Field-scoped validation failures; the body is the field → messages
    /// map so callers can show every error at once.
    Validation(FieldErrors),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!(errors))).into_response()
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<OnboardingError> for AppError {
    fn from(err: OnboardingError) -> Self {
        match err {
            OnboardingError::Invalid(errors) => AppError::Validation(errors),
            OnboardingError::Store(store_err) => store_err.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => AppError::NotFound(format!("{entity} not found")),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Unavailable(cause) => AppError::Internal(cause),
        }
    }
}
