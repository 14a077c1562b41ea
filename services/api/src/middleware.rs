//! Authentication middleware for JWT token validation
//!
//! The API accepts anonymous requests: a missing `Authorization` header
//! simply leaves the request unauthenticated. A header that is present but
//! carries an invalid, expired or revoked token is rejected with 401.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use common::token::{Claims, extract_token};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use std::{convert::Infallible, env};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub is_superuser: bool,
    pub token_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            is_superuser: claims.is_superuser(),
            token_id: claims.jti,
        }
    }
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Public key for verifying tokens
    pub public_key: String,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// `JWT_PUBLIC_KEY` holds either the PEM itself or a path to it. Relative
    /// paths are tried from the working directory, then from the crate root.
    pub fn from_env() -> Result<Self, String> {
        let public_key = env::var("JWT_PUBLIC_KEY")
            .map_err(|_| "JWT_PUBLIC_KEY environment variable not set".to_string())?;

        let public_key = if public_key.starts_with("-----BEGIN") {
            public_key
        } else {
            std::fs::read_to_string(&public_key)
                .or_else(|_| {
                    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                    path.push(&public_key);
                    std::fs::read_to_string(path)
                })
                .map_err(|e| format!("Failed to read public key file: {}", e))?
                .trim()
                .to_string()
        };

        Ok(JwtConfig { public_key })
    }
}

/// Verifies access tokens issued by the auth service
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> anyhow::Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to create decoding key: {}", e))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }
}

/// Attach an [`AuthUser`] to the request when a valid token is presented
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(extract_token)
        .ok_or(ApiError::InvalidToken)?;

    let claims = state.verifier.verify(token).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::InvalidToken
    })?;

    let is_revoked = state
        .redis_pool
        .is_token_revoked(claims.jti)
        .await
        .map_err(|e| {
            error!("Failed to check if token is revoked: {}", e);
            ApiError::InternalServerError
        })?;
    if is_revoked {
        return Err(ApiError::InvalidToken);
    }

    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}

/// The authenticated caller; rejects anonymous requests with 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// The caller if authenticated
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
