//! Common library for the Foodgram services
//!
//! This crate provides shared functionality used by the auth and API
//! services: database connectivity and migrations, error handling, the Redis
//! client, password hashing and access token claims.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     println!("Database health check: {}", health_check(&pool).await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
pub mod password;
pub mod token;
