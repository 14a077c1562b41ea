//! Ingredient model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Ingredient entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// Query parameters for ingredient listing
#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    /// Prefix of the ingredient name
    pub name: Option<String>,
}
