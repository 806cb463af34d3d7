//! Catalog error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from catalog loading and validation.
///
/// Malformed step data is a load-time concern: once a catalog loads
/// successfully, the engine may assume every procedure is well-formed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog has no procedures")]
    Empty,

    #[error("duplicate procedure id {id}")]
    DuplicateProcedure { id: i64 },

    #[error("procedure {id} ('{name}') has no steps")]
    EmptySteps { id: i64, name: String },

    #[error("procedure {id} step {step_id} has empty action code")]
    EmptyActionCode { id: i64, step_id: u32 },
}
