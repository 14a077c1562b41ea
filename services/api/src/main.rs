use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{
    config::ServerConfig,
    images::MediaStorage,
    middleware::{JwtConfig, JwtVerifier},
    routes,
    state::AppState,
};
use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let server_config = ServerConfig::from_env()?;

    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;
    info!("Database migrations applied");

    let redis_pool = RedisPool::new(&RedisConfig::from_env()?).await?;

    let jwt_config = JwtConfig::from_env().map_err(anyhow::Error::msg)?;
    let verifier = JwtVerifier::new(&jwt_config)?;

    let media = MediaStorage::new(&server_config.media_root, &server_config.media_url);
    tokio::fs::create_dir_all(media.root()).await?;

    let app_state = AppState::new(pool, redis_pool, verifier, media);
    let app = routes::create_router(app_state);

    let addr = server_config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("API service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
