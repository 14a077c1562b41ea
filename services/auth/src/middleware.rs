//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use common::token::extract_token;
use tracing::error;

use crate::AppState;

/// Validate the access token and hand its claims to the handler
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(extract_token)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        error!("Failed to validate token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    let is_revoked = state
        .redis_pool
        .is_token_revoked(claims.jti)
        .await
        .map_err(|e| {
            error!("Failed to check if token is revoked: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if is_revoked {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
