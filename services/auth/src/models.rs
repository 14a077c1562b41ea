//! Authentication service models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The slice of a user row the auth service needs
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_superuser: bool,
}

/// Request for token login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for token login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}
