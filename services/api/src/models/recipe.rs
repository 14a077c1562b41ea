//! Recipe models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{tag::Tag, user::UserProfile};

/// Recipe row
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub text: String,
    /// Path relative to the media root
    pub image: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

/// One ingredient line of a recipe, as fetched for a batch of recipes
#[derive(Debug, Clone, FromRow)]
pub struct RecipeIngredientRow {
    pub recipe_id: i64,
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Ingredient line in a recipe response
#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredientRow> for RecipeIngredient {
    fn from(row: RecipeIngredientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            measurement_unit: row.measurement_unit,
            amount: row.amount,
        }
    }
}

/// Full recipe representation
#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserProfile,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Short recipe row used by favorites, the cart and subscriptions
#[derive(Debug, Clone, FromRow)]
pub struct RecipeSummaryRow {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// Short recipe representation
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// One `{id, amount}` entry of a recipe write payload
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmountInput {
    pub id: i64,
    pub amount: i64,
}

/// Recipe create/update payload
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeWriteRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    /// Base64 data URL
    pub image: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<IngredientAmountInput>>,
}

/// Validated ingredient link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: i64,
    pub amount: i32,
}

/// Recipe data ready to be written; `image` is a stored media path
#[derive(Debug, Clone)]
pub struct RecipeData {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tag_ids: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Recipe list filters
///
/// `tags` and `author` repeat (`?tags=breakfast&tags=lunch`) and match any
/// of the given values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Vec<i64>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

impl RecipeFilter {
    pub fn favorited_only(&self) -> bool {
        parse_flag(self.is_favorited.as_deref())
    }

    pub fn in_shopping_cart_only(&self) -> bool {
        parse_flag(self.is_in_shopping_cart.as_deref())
    }
}

/// Query-string boolean; anything unrecognised counts as unset
fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

/// Ingredient total contributed by one cart recipe
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub ingredient_id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("1")));
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("True")));
        assert!(!parse_flag(Some("0")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("maybe")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_filter_flags() {
        let filter = RecipeFilter {
            is_favorited: Some("1".to_string()),
            is_in_shopping_cart: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(filter.favorited_only());
        assert!(!filter.in_shopping_cart_only());
        assert!(!RecipeFilter::default().favorited_only());
    }
}
