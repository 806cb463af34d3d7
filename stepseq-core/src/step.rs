//! Procedure and step definitions.
//!
//! A procedure is an ordered, finite, non-empty sequence of steps. Steps
//! are immutable once loaded; the runner only ever borrows them.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// How a step participates in the procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Effectful step: the action code is executed once.
    #[default]
    Action,
    /// Wait step: the action code is a predicate, retested every eligible
    /// tick until it evaluates truthy.
    Condition,
}

/// One unit of work in a procedure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureStep {
    /// Stable identifier, reported as progress metadata.
    pub id: u32,

    /// Human-readable description, used only for logging.
    pub description: String,

    /// Action vs. wait-for-condition.
    #[serde(default)]
    pub kind: StepKind,

    /// Opaque host expression: the effect for action steps, the predicate
    /// for condition steps.
    pub action_code: String,

    /// Optional predicate; a truthy result means the desired state already
    /// holds and the action is skipped without evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_state_check: Option<String>,

    /// Minimum time after this step fires before the next step is
    /// considered. For condition steps this is the retest interval.
    #[serde(default)]
    pub delay_after_ms: u64,
}

impl ProcedureStep {
    /// Returns true if this is a wait-for-condition step.
    pub fn is_condition(&self) -> bool {
        self.kind == StepKind::Condition
    }
}

/// An ordered, finite, non-empty sequence of steps identified by a
/// numeric id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Procedure {
    /// Numeric procedure id, matched against the host's request value.
    pub id: i64,

    /// Display name, used only for logging.
    pub name: String,

    steps: Vec<ProcedureStep>,
}

impl Procedure {
    /// Creates a procedure, rejecting an empty step list.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        steps: Vec<ProcedureStep>,
    ) -> Result<Self, CoreError> {
        if steps.is_empty() {
            return Err(CoreError::EmptyProcedure { id });
        }
        Ok(Self {
            id,
            name: name.into(),
            steps,
        })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the procedure has no steps. Deserialized procedures bypass
    /// `new`, so loaders must check this before use.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the step at the given index.
    pub fn step(&self, index: usize) -> Option<&ProcedureStep> {
        self.steps.get(index)
    }

    /// All steps in order.
    pub fn steps(&self) -> &[ProcedureStep] {
        &self.steps
    }
}
