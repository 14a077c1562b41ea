//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::token::Claims;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    AppState,
    jwt::unix_now,
    middleware::auth_middleware,
    models::{LoginRequest, TokenResponse},
};

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/token/logout/", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/token/login/", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Exchange email and password for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = payload.email.trim().to_lowercase();
    info!("Login attempt for: {}", email);

    if !state.rate_limiter.is_allowed(&email).await {
        warn!("Login for {} throttled", email);
        return Err(AuthError::TooManyAttempts);
    }

    let user = state
        .user_repository
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid = state
        .user_repository
        .verify_password(&user, &payload.password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            AuthError::InternalServerError
        })?;

    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    state.rate_limiter.reset(&email).await;

    let auth_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    Ok((StatusCode::OK, Json(TokenResponse { auth_token })))
}

/// Revoke the presented token for the rest of its lifetime
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Logout request for user {}", claims.sub);

    let now = unix_now().map_err(|e| {
        error!("{}", e);
        AuthError::InternalServerError
    })?;

    state
        .redis_pool
        .revoke_token(claims.jti, claims.remaining_lifetime(now))
        .await
        .map_err(|e| {
            error!("Failed to revoke token: {}", e);
            AuthError::InternalServerError
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Custom error type for authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,
    #[error("Too many login attempts, try again later.")]
    TooManyAttempts,
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            AuthError::InvalidCredentials => serde_json::json!({
                "non_field_errors": [self.to_string()],
            }),
            _ => serde_json::json!({ "detail": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_credentials_shape() {
        let (status, body) = body_json(AuthError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["non_field_errors"][0],
            "Unable to log in with provided credentials."
        );
    }

    #[tokio::test]
    async fn test_throttled_shape() {
        let (status, body) = body_json(AuthError::TooManyAttempts).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
