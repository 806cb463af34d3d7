//! # stepseq-core
//!
//! Step-sequencing procedure engine for tick-driven hosts.
//!
//! This crate provides:
//! - Procedure and step data model
//! - The procedure runner state machine (one step transition per tick)
//! - The preset controller bridging host request/guard variables
//! - Collaborator traits for the host's variable store, expression
//!   evaluator, and procedure catalog

pub mod controller;
pub mod error;
pub mod host;
pub mod runner;
pub mod step;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{PresetController, TickOutcome};
pub use error::{CoreError, EvalError};
pub use host::{
    almost_equal, EvalOutput, ExpressionEvaluator, MemoryVariableStore, ProcedureCatalog,
    VariableStore,
};
pub use runner::{ProcedureRunner, Progress, RunnerPhase, StepOutcome};
pub use step::{Procedure, ProcedureStep, StepKind};
