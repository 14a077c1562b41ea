use anyhow::Result;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;

use crate::models::recipe::{
    CartLine, RecipeData, RecipeFilter, RecipeIngredientRow, RecipeRow, RecipeSummaryRow,
};

/// Per-user recipe lists sharing the same (user, recipe) shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn table(self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping_cart",
        }
    }
}

/// Which of a batch of recipes the viewer has favorited or put in the cart
#[derive(Debug, Default)]
pub struct ViewerFlags {
    pub favorited: HashSet<i64>,
    pub in_shopping_cart: HashSet<i64>,
}

/// Recipe repository for database operations
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

impl RecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Page of recipes matching `filter`, newest first, with the total count
    pub async fn list(
        &self,
        viewer: Option<i64>,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RecipeRow>, i64)> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM recipes r WHERE TRUE");
        push_filters(&mut count_query, viewer, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT r.id, r.author_id, r.name, r.text, r.image, r.cooking_time, r.pub_date \
             FROM recipes r WHERE TRUE",
        );
        push_filters(&mut query, viewer, filter);
        query
            .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = query
            .build_query_as::<RecipeRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Find a recipe by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<RecipeRow>> {
        let recipe = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT id, author_id, name, text, image, cooking_time, pub_date
            FROM recipes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipe)
    }

    /// Insert a recipe with its tags and ingredients in one transaction
    pub async fn create(&self, author_id: i64, data: &RecipeData) -> Result<i64> {
        let image = data
            .image
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("A new recipe needs an image"))?;

        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (author_id, name, text, image, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(&data.name)
        .bind(&data.text)
        .bind(image)
        .bind(data.cooking_time)
        .fetch_one(&mut *tx)
        .await?;

        insert_links(&mut *tx, id, data).await?;
        tx.commit().await?;

        Ok(id)
    }

    /// Overwrite a recipe and replace its tags and ingredients
    ///
    /// The image is kept when `data.image` is `None`.
    pub async fn update(&self, id: i64, data: &RecipeData) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE recipes
            SET name = $1, text = $2, cooking_time = $3, image = COALESCE($4, image)
            WHERE id = $5
            "#,
        )
        .bind(&data.name)
        .bind(&data.text)
        .bind(data.cooking_time)
        .bind(data.image.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM ingredient_amounts WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_links(&mut *tx, id, data).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Delete a recipe; links, favorites and cart entries cascade
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ingredient lines of several recipes at once
    pub async fn ingredients_for(&self, recipe_ids: &[i64]) -> Result<Vec<RecipeIngredientRow>> {
        let rows = sqlx::query_as::<_, RecipeIngredientRow>(
            r#"
            SELECT ia.recipe_id, i.id, i.name, i.measurement_unit, ia.amount
            FROM ingredient_amounts ia
            JOIN ingredients i ON i.id = ia.ingredient_id
            WHERE ia.recipe_id = ANY($1)
            ORDER BY ia.recipe_id, ia.id
            "#,
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Favorite and cart membership of `recipe_ids` for the viewer
    pub async fn viewer_flags(&self, viewer: Option<i64>, recipe_ids: &[i64]) -> Result<ViewerFlags> {
        let Some(user_id) = viewer else {
            return Ok(ViewerFlags::default());
        };

        let mut flags = ViewerFlags::default();
        for list in [RecipeList::Favorites, RecipeList::ShoppingCart] {
            let ids: Vec<i64> = sqlx::query_scalar(&format!(
                "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = ANY($2)",
                list.table()
            ))
            .bind(user_id)
            .bind(recipe_ids)
            .fetch_all(&self.pool)
            .await?;

            let set = ids.into_iter().collect();
            match list {
                RecipeList::Favorites => flags.favorited = set,
                RecipeList::ShoppingCart => flags.in_shopping_cart = set,
            }
        }

        Ok(flags)
    }

    /// Add a recipe to a list; false when it was already there
    pub async fn add_to_list(&self, list: RecipeList, user_id: i64, recipe_id: i64) -> Result<bool> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            list.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a recipe from a list; false when it was not there
    pub async fn remove_from_list(
        &self,
        list: RecipeList,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
            list.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every ingredient line of every recipe in the user's cart
    pub async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT i.id AS ingredient_id, i.name, i.measurement_unit, ia.amount
            FROM shopping_cart sc
            JOIN ingredient_amounts ia ON ia.recipe_id = sc.recipe_id
            JOIN ingredients i ON i.id = ia.ingredient_id
            WHERE sc.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    pub async fn summary(&self, id: i64) -> Result<Option<RecipeSummaryRow>> {
        let summary = sqlx::query_as::<_, RecipeSummaryRow>(
            "SELECT id, author_id, name, image, cooking_time FROM recipes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary)
    }
}

/// Append the list filters as `AND ...` clauses to a query over `recipes r`
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, viewer: Option<i64>, filter: &RecipeFilter) {
    if !filter.tags.is_empty() {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }

    if !filter.author.is_empty() {
        query
            .push(" AND r.author_id = ANY(")
            .push_bind(filter.author.clone())
            .push(")");
    }

    // Only meaningful for a signed-in viewer
    if let Some(user_id) = viewer {
        if filter.favorited_only() {
            query
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        if filter.in_shopping_cart_only() {
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM shopping_cart sc WHERE sc.recipe_id = r.id AND sc.user_id = ",
                )
                .push_bind(user_id)
                .push(")");
        }
    }
}

async fn insert_links(conn: &mut PgConnection, recipe_id: i64, data: &RecipeData) -> Result<()> {
    if !data.tag_ids.is_empty() {
        let mut query = QueryBuilder::<Postgres>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query.push_values(&data.tag_ids, |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        query.build().execute(&mut *conn).await?;
    }

    if !data.ingredients.is_empty() {
        let mut query = QueryBuilder::<Postgres>::new(
            "INSERT INTO ingredient_amounts (recipe_id, ingredient_id, amount) ",
        );
        query.push_values(&data.ingredients, |mut row, item| {
            row.push_bind(recipe_id)
                .push_bind(item.ingredient_id)
                .push_bind(item.amount);
        });
        query.build().execute(&mut *conn).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_sql() {
        let filter = RecipeFilter {
            tags: vec!["lunch".to_string()],
            author: vec![1, 2],
            is_favorited: Some("1".to_string()),
            is_in_shopping_cart: None,
        };

        let mut query = QueryBuilder::<Postgres>::new("SELECT r.id FROM recipes r WHERE TRUE");
        push_filters(&mut query, Some(7), &filter);
        let sql = query.sql();

        assert!(sql.contains("t.slug = ANY($1)"));
        assert!(sql.contains("r.author_id = ANY($2)"));
        assert!(sql.contains("f.user_id = $3"));
        assert!(!sql.contains("shopping_cart"));
    }

    #[test]
    fn test_viewer_filters_ignored_for_anonymous() {
        let filter = RecipeFilter {
            is_favorited: Some("true".to_string()),
            is_in_shopping_cart: Some("1".to_string()),
            ..Default::default()
        };

        let mut query = QueryBuilder::<Postgres>::new("SELECT r.id FROM recipes r WHERE TRUE");
        push_filters(&mut query, None, &filter);

        assert_eq!(query.sql(), "SELECT r.id FROM recipes r WHERE TRUE");
    }
}
