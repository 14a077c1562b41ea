//! User models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::recipe::RecipeSummary;

/// User entity
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, as seen by the viewer
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Request for user registration
///
/// Every field is optional here so a missing one becomes a validation
/// message rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

/// Validated registration data with the plain-text password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Response for a freshly registered user
#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for CreatedUserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Request for a password change
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// A followed author with a preview of their recipes
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserProfile,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

/// `?recipes_limit=` on subscription endpoints
#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<i64>,
}
