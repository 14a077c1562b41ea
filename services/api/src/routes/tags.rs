use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use super::ApiPath;
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// All tags, unpaginated
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.tag_repository.list().await?))
}

pub async fn get_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .tag_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found.".to_string()))?;

    Ok(Json(tag))
}
