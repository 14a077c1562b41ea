//! Redis cache module for the Foodgram services
//!
//! This module provides functionality for connecting to Redis and performing
//! the few cache operations the services need: get/set with TTL, delete and
//! the revoked-token list used by logout.

use anyhow::Result;
use redis::{AsyncCommands, Client};
use tracing::info;
use uuid::Uuid;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Ok(RedisConfig { url })
    }
}

/// Redis client handle, cheap to clone into request state
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Initialize a new Redis client
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Set a key-value pair in Redis with optional TTL
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        let mut conn = self.get_connection().await?;

        if let Some(ttl) = ttl_seconds {
            let _: () = conn.set_ex(key, value, ttl).await?;
        } else {
            let _: () = conn.set(key, value).await?;
        }

        Ok(())
    }

    /// Get a value from Redis by key
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Delete a key from Redis
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await?;
        Ok(())
    }

    /// Record a token id as revoked for `ttl_seconds`
    ///
    /// A zero TTL means the token is already expired and nothing is stored.
    pub async fn revoke_token(&self, token_id: Uuid, ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        self.set(&revoked_token_key(token_id), "1", Some(ttl_seconds))
            .await
    }

    /// Check whether a token id has been revoked
    pub async fn is_token_revoked(&self, token_id: Uuid) -> Result<bool> {
        Ok(self.get(&revoked_token_key(token_id)).await?.is_some())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

fn revoked_token_key(token_id: Uuid) -> String {
    format!("revoked_token:{}", token_id)
}
