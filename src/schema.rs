// src/schema.rs

use crate::paths::BankPaths;
use crate::table::{Table, TableError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Number of reference rows kept as illustrative samples.
const SAMPLE_ROWS: usize = 2;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("CSV not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}

/// Shape of a bank's reference table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub sample_rows: Vec<Map<String, Value>>,
}

impl Schema {
    pub fn from_table(table: &Table) -> Self {
        Self {
            columns: table.columns().to_vec(),
            row_count: table.len(),
            sample_rows: table.records().take(SAMPLE_ROWS).map(|r| r.to_json()).collect(),
        }
    }
}

/// Derive the schema from the bank's reference CSV.
pub fn analyze(paths: &BankPaths) -> Result<Schema, SchemaError> {
    let csv_path = &paths.csv;
    if !csv_path.exists() {
        return Err(SchemaError::MissingInput(csv_path.clone()));
    }

    let table = Table::from_csv_path(csv_path).map_err(|source| SchemaError::Load {
        path: csv_path.clone(),
        source,
    })?;

    let schema = Schema::from_table(&table);
    info!(
        bank = %paths.bank,
        columns = schema.columns.len(),
        rows = schema.row_count,
        "Analyzed reference table"
    );
    if let Ok(json) = serde_json::to_string_pretty(&schema) {
        debug!(schema = %json, "Derived schema");
    }

    Ok(schema)
}
