use anyhow::Result;
use sqlx::PgPool;

use crate::models::tag::{RecipeTagRow, Tag};

/// Tag repository; tags are managed by administrators, the API only reads them
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    /// Which of `ids` do not exist
    pub async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM tags WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(super::missing_ids(ids, &found))
    }

    /// Tags of several recipes at once
    pub async fn for_recipes(&self, recipe_ids: &[i64]) -> Result<Vec<RecipeTagRow>> {
        let rows = sqlx::query_as::<_, RecipeTagRow>(
            r#"
            SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
            FROM recipe_tags rt
            JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY rt.recipe_id, t.id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
