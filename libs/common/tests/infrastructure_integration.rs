//! Integration tests for the infrastructure components
//!
//! These tests verify that PostgreSQL (with the Foodgram schema) and Redis
//! are reachable. They need both servers, so they only run with
//! `cargo test -- --ignored`.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
};
use sqlx::Row;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires PostgreSQL and Redis"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    assert!(health_check(&pool).await?, "Database health check failed");

    run_migrations(&pool).await?;

    let row = sqlx::query("SELECT COUNT(*) AS tables FROM information_schema.tables WHERE table_name IN ('users', 'recipes', 'ingredients', 'tags', 'favorites', 'shopping_cart', 'subscriptions', 'ingredient_amounts', 'recipe_tags')")
        .fetch_one(&pool)
        .await?;
    let tables: i64 = row.get("tables");
    assert_eq!(tables, 9, "Foodgram schema is incomplete");

    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;
    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let token_id = Uuid::new_v4();
    redis_pool.revoke_token(token_id, 10).await?;
    assert!(redis_pool.is_token_revoked(token_id).await?);

    Ok(())
}
