use anyhow::Result;
use sqlx::{PgConnection, PgPool};

use crate::models::ingredient::Ingredient;

/// Ingredient catalog repository
#[derive(Clone)]
pub struct IngredientRepository {
    pool: PgPool,
}

impl IngredientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All ingredients, optionally those whose name starts with `prefix`
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, measurement_unit
            FROM ingredients
            WHERE $1::TEXT IS NULL OR starts_with(name, $1)
            ORDER BY name, id
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(ingredients)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ingredient)
    }

    /// Which of `ids` do not exist
    pub async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM ingredients WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(super::missing_ids(ids, &found))
    }

    /// Find by (name, unit) or insert; the flag is true when a row was created
    pub async fn get_or_create(
        conn: &mut PgConnection,
        name: &str,
        measurement_unit: &str,
    ) -> sqlx::Result<(Ingredient, bool)> {
        let existing = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, name, measurement_unit
            FROM ingredients
            WHERE name = $1 AND measurement_unit = $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(measurement_unit)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(ingredient) = existing {
            return Ok((ingredient, false));
        }

        let created = sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            RETURNING id, name, measurement_unit
            "#,
        )
        .bind(name)
        .bind(measurement_unit)
        .fetch_one(&mut *conn)
        .await?;

        Ok((created, true))
    }
}
