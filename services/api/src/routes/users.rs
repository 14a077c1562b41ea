//! Account, profile and subscription endpoints

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::error::is_unique_violation;
use std::collections::HashMap;
use tracing::info;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::{
    error::{ApiError, ApiResult},
    middleware::{CurrentUser, MaybeUser},
    models::{
        recipe::RecipeSummary,
        user::{
            CreateUserRequest, CreatedUserResponse, RecipesLimitQuery, SetPasswordRequest,
            SubscriptionResponse, UserProfile,
        },
    },
    pagination::{Page, PageParams},
    state::AppState,
    validation::{self, ValidationErrors},
};

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found.".to_string())
}

/// List all users
pub async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiQuery(params): ApiQuery<PageParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<impl IntoResponse> {
    let profiles = state
        .user_repository
        .list_profiles(viewer.id(), params.limit(), params.offset())
        .await?;
    let count = state.user_repository.count().await?;

    Ok(Json(Page::new(profiles, count, params, &uri)))
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_user = validation::validate_new_user(&payload)?;

    let mut errors = ValidationErrors::default();
    if state.user_repository.email_exists(&new_user.email).await? {
        errors.add("email", "A user with that email already exists.");
    }
    if state.user_repository.username_exists(&new_user.username).await? {
        errors.add("username", "A user with that username already exists.");
    }
    errors.into_result(())?;

    let user = match state.user_repository.create(&new_user).await {
        Ok(user) => user,
        Err(e)
            if e.downcast_ref::<sqlx::Error>()
                .is_some_and(is_unique_violation) =>
        {
            let mut errors = ValidationErrors::default();
            errors.add("non_field_errors", "A user with that email or username already exists.");
            return Err(errors.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!("Registered user {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(CreatedUserResponse::from(user))))
}

/// Profile of the caller
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .user_repository
        .profile(Some(user.id), user.id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(profile))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .user_repository
        .profile(viewer.id(), id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(profile))
}

/// Change the caller's password
pub async fn set_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<SetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let (current, new) = validation::validate_set_password(&payload)?;

    let account = state
        .user_repository
        .find_by_id(user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !common::password::verify_password(&current, &account.password_hash)? {
        let mut errors = ValidationErrors::default();
        errors.add("current_password", "Wrong password.");
        return Err(errors.into());
    }

    state.user_repository.set_password(user.id, &new).await?;
    info!("User {} changed their password", user.id);

    Ok(StatusCode::NO_CONTENT)
}

/// Authors the caller follows, each with a preview of their recipes
pub async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(limit): ApiQuery<RecipesLimitQuery>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<impl IntoResponse> {
    let authors = state
        .subscription_repository
        .list_authors(user.id, params.limit(), params.offset())
        .await?;
    let count = state.subscription_repository.count(user.id).await?;

    let results = subscription_responses(&state, authors, limit.recipes_limit).await?;
    Ok(Json(Page::new(results, count, params, &uri)))
}

/// Follow an author
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(author_id): ApiPath<i64>,
    ApiQuery(limit): ApiQuery<RecipesLimitQuery>,
) -> ApiResult<impl IntoResponse> {
    let author = state
        .user_repository
        .profile(Some(user.id), author_id)
        .await?
        .ok_or_else(user_not_found)?;

    validation::validate_subscription(user.id, author_id, author.is_subscribed)?;

    if !state.subscription_repository.create(user.id, author_id).await? {
        return Err(ApiError::BadRequest(
            "You are already subscribed to this author.".to_string(),
        ));
    }

    let author = UserProfile {
        is_subscribed: true,
        ..author
    };
    let mut response = subscription_responses(&state, vec![author], limit.recipes_limit).await?;
    let response = response
        .pop()
        .ok_or_else(|| anyhow::anyhow!("Subscription response missing for author {}", author_id))?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Unfollow an author
pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(author_id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.user_repository.find_by_id(author_id).await?.is_none() {
        return Err(user_not_found());
    }

    if !state.subscription_repository.delete(user.id, author_id).await? {
        return Err(ApiError::BadRequest(
            "You are not subscribed to this author.".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Attach recipe previews and counts to followed authors
async fn subscription_responses(
    state: &AppState,
    authors: Vec<UserProfile>,
    recipes_limit: Option<i64>,
) -> ApiResult<Vec<SubscriptionResponse>> {
    let author_ids: Vec<i64> = authors.iter().map(|a| a.id).collect();
    let per_author = recipes_limit.map(|n| n.max(0));

    let mut recipes: HashMap<i64, Vec<RecipeSummary>> = HashMap::new();
    for row in state
        .subscription_repository
        .recipes_for_authors(&author_ids, per_author)
        .await?
    {
        recipes.entry(row.author_id).or_default().push(RecipeSummary {
            id: row.id,
            name: row.name,
            image: state.media.url(&row.image),
            cooking_time: row.cooking_time,
        });
    }
    let counts = state
        .subscription_repository
        .recipe_counts(&author_ids)
        .await?;

    Ok(authors
        .into_iter()
        .map(|author| SubscriptionResponse {
            recipes: recipes.remove(&author.id).unwrap_or_default(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
            author,
        })
        .collect())
}
