//! User repository for credential lookups

use anyhow::Result;
use common::password;
use sqlx::PgPool;
use tracing::info;

use crate::models::User;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by email, the login identifier
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        info!("Finding user by email: {}", email);

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_superuser
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Verify a user's password
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        password::verify_password(password, &user.password_hash)
    }
}
