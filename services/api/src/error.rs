//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::validation::ValidationErrors;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// No or invalid credentials
    #[error("Authentication credentials were not provided.")]
    Unauthorized,

    /// Malformed, expired or revoked token
    #[error("Invalid token.")]
    InvalidToken,

    /// Authenticated, but not allowed to touch the object
    #[error("{0}")]
    Forbidden(String),

    /// Lookup by id found nothing
    #[error("{0}")]
    NotFound(String),

    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    /// Field-level validation failures
    #[error("Invalid input")]
    Validation(ValidationErrors),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Repository or storage failure
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => {
                ApiError::NotFound("Not found.".to_string())
            }
            other => {
                error!("Path extraction failed: {}", other.body_text());
                ApiError::InternalServerError
            }
        }
    }
}

impl From<axum_extra::extract::QueryRejection> for ApiError {
    fn from(rejection: axum_extra::extract::QueryRejection) -> Self {
        ApiError::BadRequest(rejection.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.".to_string(),
            ),
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token.".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Unexpected(e) => {
                error!("Unexpected error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": body }))).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_codes() {
        assert_eq!(render(ApiError::Unauthorized).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(render(ApiError::InvalidToken).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            render(ApiError::Forbidden("no".into())).await.0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            render(ApiError::NotFound("gone".into())).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            render(ApiError::Unexpected(anyhow::anyhow!("boom"))).await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_detail_body() {
        let (status, body) = render(ApiError::BadRequest("Recipe is already in favorites".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": "Recipe is already in favorites" }));
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak() {
        let (_, body) = render(ApiError::Unexpected(anyhow::anyhow!("password=hunter2"))).await;
        assert_eq!(body["detail"], "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_body_is_field_map() {
        let mut errors = ValidationErrors::default();
        errors.add("cooking_time", "Ensure this value is greater than or equal to 1.");
        let (status, body) = render(errors.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "cooking_time": ["Ensure this value is greater than or equal to 1."] })
        );
    }
}
