//! Core error types.

use thiserror::Error;

/// Host expression evaluation failure.
///
/// The engine treats expressions as opaque; this carries whatever reason
/// the host evaluator reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expression evaluation failed: {reason}")]
pub struct EvalError {
    pub reason: String,
}

impl EvalError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors from the procedure engine.
///
/// None of these are fatal: the controller recovers every error path by
/// clearing the active request and returning the runner to idle.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("procedure {id} has no steps")]
    EmptyProcedure { id: i64 },

    #[error("runner advanced without a loaded procedure")]
    NoProcedureLoaded,

    #[error(transparent)]
    Eval(#[from] EvalError),
}
