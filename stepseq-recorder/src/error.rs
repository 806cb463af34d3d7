//! Recorder error types.

use thiserror::Error;

/// Errors from recording and reading sample files.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("sample file version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u64, actual: u64 },

    #[error("sample file corrupt: {reason}")]
    Corrupt { reason: String },
}
