use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod jwt;
mod middleware;
mod models;
mod rate_limiter;
mod repositories;
mod routes;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
};
use tokio::net::TcpListener;

use crate::{
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::UserRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub rate_limiter: RateLimiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;

    let app_state = AppState {
        redis_pool,
        jwt_service,
        user_repository: UserRepository::new(pool),
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
    };

    let app = routes::create_router(app_state);

    let addr = std::env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("Authentication service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
