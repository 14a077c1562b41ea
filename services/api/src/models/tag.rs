//! Tag model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tag entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// A tag attached to a recipe, as fetched for a batch of recipes
#[derive(Debug, Clone, FromRow)]
pub struct RecipeTagRow {
    pub recipe_id: i64,
    #[sqlx(flatten)]
    pub tag: Tag,
}
