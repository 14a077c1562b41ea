use anyhow::Result;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::models::{recipe::RecipeSummaryRow, user::UserProfile};

/// Follow relations between users
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Follow `author_id`; false when the pair already existed
    pub async fn create(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unfollow; false when there was nothing to remove
    pub async fn delete(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Page of authors the user follows, most recent follow first
    pub async fn list_authors(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<UserProfile>> {
        let authors = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT u.email, u.id, u.username, u.first_name, u.last_name,
                   TRUE AS is_subscribed
            FROM subscriptions s
            JOIN users u ON u.id = s.author_id
            WHERE s.user_id = $1
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    pub async fn count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Newest recipes of each author, at most `per_author` each when given
    pub async fn recipes_for_authors(
        &self,
        author_ids: &[i64],
        per_author: Option<i64>,
    ) -> Result<Vec<RecipeSummaryRow>> {
        let rows = sqlx::query_as::<_, RecipeSummaryRow>(
            r#"
            SELECT id, author_id, name, image, cooking_time
            FROM (
                SELECT r.id, r.author_id, r.name, r.image, r.cooking_time, r.pub_date,
                       ROW_NUMBER() OVER (
                           PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC
                       ) AS position
                FROM recipes r
                WHERE r.author_id = ANY($1)
            ) ranked
            WHERE $2::BIGINT IS NULL OR position <= $2
            ORDER BY author_id, position
            "#,
        )
        .bind(author_ids)
        .bind(per_author)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Total number of recipes per author
    pub async fn recipe_counts(&self, author_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT author_id, COUNT(*)
            FROM recipes
            WHERE author_id = ANY($1)
            GROUP BY author_id
            "#,
        )
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
