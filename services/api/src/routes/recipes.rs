//! Recipe endpoints, favorites, the shopping cart and its download

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::{Method, StatusCode, header},
    response::IntoResponse,
};
use std::collections::HashMap;
use tracing::{info, warn};

use super::{ApiJson, ApiPath, ApiQuery};
use crate::{
    error::{ApiError, ApiResult},
    middleware::{CurrentUser, MaybeUser},
    models::recipe::{
        RecipeData, RecipeFilter, RecipeIngredient, RecipeResponse, RecipeRow, RecipeSummary,
        RecipeWriteRequest,
    },
    pagination::{Page, PageParams},
    permissions::{Access, has_object_permission},
    repositories::RecipeList,
    shopping_list,
    state::AppState,
    validation::{self, RecipeWrite, ValidRecipe, ValidationErrors},
};

fn recipe_not_found() -> ApiError {
    ApiError::NotFound("Recipe not found.".to_string())
}

/// List recipes, newest first
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiQuery(filter): ApiQuery<RecipeFilter>,
    ApiQuery(params): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<impl IntoResponse> {
    let (rows, count) = state
        .recipe_repository
        .list(viewer.id(), &filter, params.limit(), params.offset())
        .await?;

    let results = build_responses(&state, viewer.id(), rows).await?;
    Ok(Json(Page::new(results, count, params, &uri)))
}

/// Get a recipe by ID
pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let row = state
        .recipe_repository
        .find_by_id(id)
        .await?
        .ok_or_else(recipe_not_found)?;

    Ok(Json(build_response(&state, viewer.id(), row).await?))
}

/// Publish a recipe as the caller
pub async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<RecipeWriteRequest>,
) -> ApiResult<impl IntoResponse> {
    let recipe = validation::validate_recipe(&payload, RecipeWrite::Create)?;
    check_references(&state, &recipe).await?;

    let data = store_image(&state, recipe).await?;
    let id = match state.recipe_repository.create(user.id, &data).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(image) = &data.image {
                state.media.remove(image).await;
            }
            return Err(e.into());
        }
    };
    info!("User {} created recipe {}", user.id, id);

    let row = state
        .recipe_repository
        .find_by_id(id)
        .await?
        .ok_or_else(recipe_not_found)?;

    Ok((
        StatusCode::CREATED,
        Json(build_response(&state, Some(user.id), row).await?),
    ))
}

/// Replace a recipe's fields, tags and ingredients
pub async fn update_recipe(
    State(state): State<AppState>,
    method: Method,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipeWriteRequest>,
) -> ApiResult<impl IntoResponse> {
    let existing = state
        .recipe_repository
        .find_by_id(id)
        .await?
        .ok_or_else(recipe_not_found)?;
    has_object_permission(Access::from_method(&method), Some(&user), existing.author_id)?;

    let recipe = validation::validate_recipe(&payload, RecipeWrite::Update)?;
    check_references(&state, &recipe).await?;

    let data = store_image(&state, recipe).await?;
    if let Err(e) = state.recipe_repository.update(id, &data).await {
        if let Some(image) = &data.image {
            state.media.remove(image).await;
        }
        return Err(e.into());
    }
    if data.image.is_some() {
        state.media.remove(&existing.image).await;
    }
    info!("User {} updated recipe {}", user.id, id);

    let row = state
        .recipe_repository
        .find_by_id(id)
        .await?
        .ok_or_else(recipe_not_found)?;

    Ok(Json(build_response(&state, Some(user.id), row).await?))
}

/// Delete a recipe and its image
pub async fn delete_recipe(
    State(state): State<AppState>,
    method: Method,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let existing = state
        .recipe_repository
        .find_by_id(id)
        .await?
        .ok_or_else(recipe_not_found)?;
    has_object_permission(Access::from_method(&method), Some(&user), existing.author_id)?;

    if state.recipe_repository.delete(id).await? {
        state.media.remove(&existing.image).await;
        info!("User {} deleted recipe {}", user.id, id);
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    add_to_list(&state, RecipeList::Favorites, user.id, id).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    remove_from_list(&state, RecipeList::Favorites, user.id, id).await
}

pub async fn add_to_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    add_to_list(&state, RecipeList::ShoppingCart, user.id, id).await
}

pub async fn remove_from_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    remove_from_list(&state, RecipeList::ShoppingCart, user.id, id).await
}

/// Summed ingredients of every recipe in the caller's cart, as a text file
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let lines = state.recipe_repository.cart_lines(user.id).await?;
    let body = shopping_list::render(&shopping_list::aggregate(lines));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", shopping_list::FILENAME),
            ),
        ],
        body,
    ))
}

async fn add_to_list(
    state: &AppState,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<(StatusCode, Json<RecipeSummary>)> {
    let row = state
        .recipe_repository
        .summary(recipe_id)
        .await?
        .ok_or_else(recipe_not_found)?;

    if !state
        .recipe_repository
        .add_to_list(list, user_id, recipe_id)
        .await?
    {
        let message = match list {
            RecipeList::Favorites => "Recipe is already in favorites.",
            RecipeList::ShoppingCart => "Recipe is already in the shopping cart.",
        };
        return Err(ApiError::BadRequest(message.to_string()));
    }

    Ok((
        StatusCode::CREATED,
        Json(RecipeSummary {
            id: row.id,
            name: row.name,
            image: state.media.url(&row.image),
            cooking_time: row.cooking_time,
        }),
    ))
}

async fn remove_from_list(
    state: &AppState,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> ApiResult<StatusCode> {
    if state.recipe_repository.summary(recipe_id).await?.is_none() {
        return Err(recipe_not_found());
    }

    if !state
        .recipe_repository
        .remove_from_list(list, user_id, recipe_id)
        .await?
    {
        let message = match list {
            RecipeList::Favorites => "Recipe is not in favorites.",
            RecipeList::ShoppingCart => "Recipe is not in the shopping cart.",
        };
        return Err(ApiError::BadRequest(message.to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Reject tag and ingredient ids that do not exist
async fn check_references(state: &AppState, recipe: &ValidRecipe) -> ApiResult<()> {
    let mut errors = ValidationErrors::default();

    for id in state.tag_repository.missing_ids(&recipe.tag_ids).await? {
        errors.add("tags", format!("Tag {} does not exist.", id));
    }

    let ingredient_ids: Vec<i64> = recipe.ingredients.iter().map(|i| i.ingredient_id).collect();
    for id in state
        .ingredient_repository
        .missing_ids(&ingredient_ids)
        .await?
    {
        errors.add("ingredients", format!("Ingredient {} does not exist.", id));
    }

    errors.into_result(()).map_err(ApiError::from)
}

/// Write the uploaded image, if any, and swap it for its stored path
async fn store_image(state: &AppState, recipe: ValidRecipe) -> ApiResult<RecipeData> {
    let image = match &recipe.image {
        Some(decoded) => Some(state.media.save_recipe_image(decoded).await?),
        None => None,
    };

    Ok(RecipeData {
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        image,
        tag_ids: recipe.tag_ids,
        ingredients: recipe.ingredients,
    })
}

async fn build_response(
    state: &AppState,
    viewer: Option<i64>,
    row: RecipeRow,
) -> ApiResult<RecipeResponse> {
    build_responses(state, viewer, vec![row])
        .await?
        .pop()
        .ok_or(ApiError::InternalServerError)
}

/// Assemble full representations for a page of recipes with batched lookups
async fn build_responses(
    state: &AppState,
    viewer: Option<i64>,
    rows: Vec<RecipeRow>,
) -> ApiResult<Vec<RecipeResponse>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<i64> = rows.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let mut tags: HashMap<i64, Vec<_>> = HashMap::new();
    for row in state.tag_repository.for_recipes(&recipe_ids).await? {
        tags.entry(row.recipe_id).or_default().push(row.tag);
    }

    let mut ingredients: HashMap<i64, Vec<RecipeIngredient>> = HashMap::new();
    for row in state.recipe_repository.ingredients_for(&recipe_ids).await? {
        ingredients
            .entry(row.recipe_id)
            .or_default()
            .push(RecipeIngredient::from(row));
    }

    let authors: HashMap<i64, _> = state
        .user_repository
        .profiles_by_ids(viewer, &author_ids)
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile))
        .collect();

    let flags = state
        .recipe_repository
        .viewer_flags(viewer, &recipe_ids)
        .await?;

    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(author) = authors.get(&row.author_id).cloned() else {
            warn!("Recipe {} references missing author {}", row.id, row.author_id);
            continue;
        };

        responses.push(RecipeResponse {
            id: row.id,
            tags: tags.remove(&row.id).unwrap_or_default(),
            author,
            ingredients: ingredients.remove(&row.id).unwrap_or_default(),
            is_favorited: flags.favorited.contains(&row.id),
            is_in_shopping_cart: flags.in_shopping_cart.contains(&row.id),
            name: row.name,
            image: state.media.url(&row.image),
            text: row.text,
            cooking_time: row.cooking_time,
        });
    }

    Ok(responses)
}
