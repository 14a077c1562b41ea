use anyhow::Result;
use sqlx::PgPool;

use crate::models::user::{NewUser, User, UserProfile};

/// Profile columns plus whether viewer `$1` follows the row's user
const PROFILE_SELECT: &str = r#"
    SELECT u.email, u.id, u.username, u.first_name, u.last_name,
           EXISTS (
               SELECT 1 FROM subscriptions s
               WHERE s.user_id = $1 AND s.author_id = u.id
           ) AS is_subscribed
    FROM users u
"#;

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user, hashing the password
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let password_hash = common::password::hash_password(&new_user.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// One profile as seen by `viewer`
    pub async fn profile(&self, viewer: Option<i64>, id: i64) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!("{} WHERE u.id = $2", PROFILE_SELECT))
            .bind(viewer)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    /// Profiles for a set of users, in no particular order
    pub async fn profiles_by_ids(&self, viewer: Option<i64>, ids: &[i64]) -> Result<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let profiles =
            sqlx::query_as::<_, UserProfile>(&format!("{} WHERE u.id = ANY($2)", PROFILE_SELECT))
                .bind(viewer)
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(profiles)
    }

    /// Page of all users ordered by id
    pub async fn list_profiles(
        &self,
        viewer: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserProfile>> {
        let profiles = sqlx::query_as::<_, UserProfile>(&format!(
            "{} ORDER BY u.id LIMIT $2 OFFSET $3",
            PROFILE_SELECT
        ))
        .bind(viewer)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Replace the password hash
    pub async fn set_password(&self, id: i64, new_password: &str) -> Result<()> {
        let password_hash = common::password::hash_password(new_password)?;

        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
