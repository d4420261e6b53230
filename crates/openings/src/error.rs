//! Catalogue error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed TSV row {line}: {reason}")]
    Tsv { line: usize, reason: &'static str },
}
