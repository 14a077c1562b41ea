//! Import the ingredient catalog from a two-column CSV file
//!
//! Usage: `load_ingredients [PATH]`. Without a path the file comes from
//! `FOODGRAM_INGREDIENTS_CSV`, falling back to `data/ingredients.csv`.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{config::ServerConfig, import};
use common::database::{self, DatabaseConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => PathBuf::from(ServerConfig::from_env()?.ingredients_csv),
    };

    info!("Reading ingredients from {}", path.display());
    let records = import::read_catalog_file(&path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    let pool = database::init_pool(&DatabaseConfig::from_env()?).await?;
    database::run_migrations(&pool).await?;

    let summary = import::import_catalog(&pool, &records)
        .await
        .with_context(|| format!("Failed to import {}", path.display()))?;

    info!(
        "Imported {} ingredients ({} created, {} already present)",
        records.len(),
        summary.created,
        summary.existing
    );

    Ok(())
}
