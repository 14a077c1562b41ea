//! Application state shared across handlers

use common::cache::RedisPool;
use sqlx::PgPool;

use crate::{
    images::MediaStorage,
    middleware::JwtVerifier,
    repositories::{
        IngredientRepository, RecipeRepository, SubscriptionRepository, TagRepository,
        UserRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub verifier: JwtVerifier,
    pub media: MediaStorage,
    pub user_repository: UserRepository,
    pub recipe_repository: RecipeRepository,
    pub tag_repository: TagRepository,
    pub ingredient_repository: IngredientRepository,
    pub subscription_repository: SubscriptionRepository,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        redis_pool: RedisPool,
        verifier: JwtVerifier,
        media: MediaStorage,
    ) -> Self {
        Self {
            user_repository: UserRepository::new(db_pool.clone()),
            recipe_repository: RecipeRepository::new(db_pool.clone()),
            tag_repository: TagRepository::new(db_pool.clone()),
            ingredient_repository: IngredientRepository::new(db_pool.clone()),
            subscription_repository: SubscriptionRepository::new(db_pool.clone()),
            db_pool,
            redis_pool,
            verifier,
            media,
        }
    }
}
