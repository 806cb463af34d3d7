//! Host collaborator interfaces.
//!
//! The engine never reaches into the host directly. Everything
//! side-effecting goes through these traits, injected by the embedding
//! host: a key-addressed variable store, an opaque expression evaluator,
//! and a procedure catalog.

use crate::error::EvalError;
use crate::step::Procedure;
use std::collections::HashMap;
use std::sync::Arc;

/// Tolerance for comparing evaluator float results to zero. Host
/// evaluation carries no integer contract, so exact float equality is
/// never used.
pub const TRUTHINESS_EPSILON: f64 = 1e-7;

/// Epsilon-tolerant float equality.
pub fn almost_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= TRUTHINESS_EPSILON
}

/// Tri-typed result of a host expression evaluation.
///
/// Interpretation of the components is evaluator-defined, except that the
/// float component is the sole truthiness signal used by the runner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalOutput {
    pub number: f64,
    pub integer: i64,
    pub text: String,
}

impl EvalOutput {
    /// Builds an output carrying a single numeric result.
    pub fn number(value: f64) -> Self {
        Self {
            number: value,
            integer: value as i64,
            text: String::new(),
        }
    }

    /// True if the float component is not approximately zero.
    pub fn is_truthy(&self) -> bool {
        !almost_equal(self.number, 0.0)
    }
}

/// Executes opaque host-side expressions.
///
/// Evaluation may be expensive or side-effecting; the runner calls this
/// at most once per visible step transition.
pub trait ExpressionEvaluator {
    fn evaluate(&mut self, code: &str) -> Result<EvalOutput, EvalError>;
}

/// Key-addressed host variable store.
///
/// The controller reads its request, guard, and readiness keys every tick
/// and expects them on an auto-refresh cadence; progress keys are written
/// on demand. Refresh cadence itself is the host's concern.
pub trait VariableStore {
    /// Reads a named variable. Unknown names read as 0.0.
    fn read(&self, name: &str) -> f64;

    /// Writes a named variable immediately.
    fn write(&mut self, name: &str, value: f64);
}

/// Maps a numeric procedure id to its step sequence.
pub trait ProcedureCatalog {
    fn lookup(&self, id: i64) -> Option<Arc<Procedure>>;
}

/// In-memory variable store, used by tests and the CLI host.
#[derive(Debug, Clone, Default)]
pub struct MemoryVariableStore {
    values: HashMap<String, f64>,
}

impl MemoryVariableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VariableStore for MemoryVariableStore {
    fn read(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    fn write(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_almost_equal_boundaries() {
        assert!(almost_equal(0.0, 0.0));
        assert!(almost_equal(0.0, TRUTHINESS_EPSILON));
        assert!(!almost_equal(0.0, TRUTHINESS_EPSILON * 2.0));
        assert!(almost_equal(1.0, 1.0 + TRUTHINESS_EPSILON / 2.0));
    }

    #[test]
    fn test_eval_output_truthiness() {
        assert!(EvalOutput::number(1.0).is_truthy());
        assert!(EvalOutput::number(-1.0).is_truthy());
        assert!(!EvalOutput::number(0.0).is_truthy());
        // Float noise around zero is still falsy.
        assert!(!EvalOutput::number(TRUTHINESS_EPSILON / 2.0).is_truthy());
    }

    #[test]
    fn test_memory_store_defaults_to_zero() {
        let mut store = MemoryVariableStore::new();
        assert_eq!(store.read("MISSING"), 0.0);

        store.write("REQUEST", 7.0);
        assert_eq!(store.read("REQUEST"), 7.0);

        store.write("REQUEST", 0.0);
        assert_eq!(store.read("REQUEST"), 0.0);
    }
}
