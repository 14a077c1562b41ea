use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use super::{ApiPath, ApiQuery};
use crate::{
    error::{ApiError, ApiResult},
    models::ingredient::IngredientQuery,
    state::AppState,
};

/// Ingredient catalog, optionally narrowed by `?name=` prefix
pub async fn list_ingredients(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IngredientQuery>,
) -> ApiResult<impl IntoResponse> {
    let prefix = query.name.as_deref().filter(|name| !name.is_empty());
    Ok(Json(state.ingredient_repository.list(prefix).await?))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let ingredient = state
        .ingredient_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ingredient not found.".to_string()))?;

    Ok(Json(ingredient))
}
