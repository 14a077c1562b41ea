//! Ingredient catalog import from a two-column CSV file
//!
//! Each row is `name,measurement_unit` with no header. The whole file is
//! parsed before anything is written, and all inserts share one transaction,
//! so a bad file leaves the catalog untouched.

use sqlx::PgPool;
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;

use crate::repositories::IngredientRepository;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: {message}")]
    InvalidRow { line: u64, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub existing: usize,
}

/// Parse every row, failing on the first malformed one
pub fn read_catalog<R: Read>(reader: R) -> Result<Vec<IngredientRecord>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != 2 {
            return Err(ImportError::InvalidRow {
                line,
                message: format!("expected 2 fields, found {}", record.len()),
            });
        }
        let (name, unit) = (&record[0], &record[1]);
        if name.is_empty() || unit.is_empty() {
            return Err(ImportError::InvalidRow {
                line,
                message: "name and measurement unit must not be empty".to_string(),
            });
        }

        records.push(IngredientRecord {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        });
    }

    Ok(records)
}

/// Read a catalog file from disk
pub fn read_catalog_file(path: &Path) -> Result<Vec<IngredientRecord>, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_catalog(file)
}

/// Get-or-create every record by (name, unit)
pub async fn import_catalog(
    pool: &PgPool,
    records: &[IngredientRecord],
) -> Result<ImportSummary, ImportError> {
    let mut tx = pool.begin().await?;
    let mut summary = ImportSummary::default();

    for record in records {
        let (ingredient, created) = IngredientRepository::get_or_create(
            &mut *tx,
            &record.name,
            &record.measurement_unit,
        )
        .await?;

        if created {
            summary.created += 1;
        } else {
            info!(
                "Ingredient {} ({}) already exists",
                ingredient.name, ingredient.measurement_unit
            );
            summary.existing += 1;
        }
    }

    tx.commit().await?;
    Ok(summary)
}
