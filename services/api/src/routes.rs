//! API service routes

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{error::ApiError, middleware::auth_middleware, state::AppState};

mod ingredients;
mod recipes;
mod tags;
mod users;

/// JSON body extractor that reports malformed payloads as `{"detail": ...}`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor; ids that do not parse are a 404
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query extractor accepting repeated keys, with JSON rejections
#[derive(FromRequestParts)]
#[from_request(via(axum_extra::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/me/", get(users::me))
        .route("/users/set_password/", post(users::set_password))
        .route("/users/subscriptions/", get(users::subscriptions))
        .route("/users/:id/", get(users::get_user))
        .route(
            "/users/:id/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/tags/", get(tags::list_tags))
        .route("/tags/:id/", get(tags::get_tag))
        .route("/ingredients/", get(ingredients::list_ingredients))
        .route("/ingredients/:id/", get(ingredients::get_ingredient))
        .route(
            "/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/:id/",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/:id/favorite/",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart/",
            post(recipes::add_to_shopping_cart).delete(recipes::remove_from_shopping_cart),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api);

    if let Some(mount) = state.media.mount_path() {
        router = router.nest_service(mount, ServeDir::new(state.media.root()));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Authors {
        #[serde(default)]
        author: Vec<i64>,
    }

    fn extractor_router() -> Router {
        Router::new()
            .route(
                "/items/:id/",
                get(|ApiPath(id): ApiPath<i64>| async move { id.to_string() }),
            )
            .route(
                "/items/",
                get(|ApiQuery(q): ApiQuery<Authors>| async move { format!("{:?}", q.author) }),
            )
    }

    async fn call(uri: &str) -> (StatusCode, String) {
        let response = extractor_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_path_and_repeated_query_keys() {
        assert_eq!(call("/items/42/").await, (StatusCode::OK, "42".to_string()));
        assert_eq!(
            call("/items/?author=1&author=2").await,
            (StatusCode::OK, "[1, 2]".to_string())
        );
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_not_found() {
        let (status, body) = call("/items/abc/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["detail"], "Not found.");
    }

    #[tokio::test]
    async fn test_bad_query_value_is_json_bad_request() {
        let (status, body) = call("/items/?author=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(body["detail"].is_string());
    }
}
