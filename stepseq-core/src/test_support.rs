//! Shared test doubles for engine tests.

use crate::error::EvalError;
use crate::host::{EvalOutput, ExpressionEvaluator, ProcedureCatalog};
use crate::step::{Procedure, ProcedureStep, StepKind};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Evaluator that replays scripted results and records every evaluated
/// expression in call order.
#[derive(Default)]
pub struct ScriptedEvaluator {
    queued: HashMap<String, VecDeque<f64>>,
    fixed: HashMap<String, f64>,
    pub calls: Vec<String>,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every evaluation of `code` yields `value`.
    pub fn returns(&mut self, code: &str, value: f64) {
        self.fixed.insert(code.to_string(), value);
    }

    /// Successive evaluations of `code` yield the queued values, then fall
    /// back to any fixed value, then 0.0.
    pub fn queue(&mut self, code: &str, values: &[f64]) {
        self.queued
            .entry(code.to_string())
            .or_default()
            .extend(values.iter().copied());
    }

    pub fn call_count(&self, code: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == code).count()
    }
}

impl ExpressionEvaluator for ScriptedEvaluator {
    fn evaluate(&mut self, code: &str) -> Result<EvalOutput, EvalError> {
        self.calls.push(code.to_string());
        let value = self
            .queued
            .get_mut(code)
            .and_then(|q| q.pop_front())
            .or_else(|| self.fixed.get(code).copied())
            .unwrap_or(0.0);
        Ok(EvalOutput::number(value))
    }
}

/// Evaluator that fails every call.
pub struct FailingEvaluator;

impl ExpressionEvaluator for FailingEvaluator {
    fn evaluate(&mut self, code: &str) -> Result<EvalOutput, EvalError> {
        Err(EvalError::new(format!("no handler for '{code}'")))
    }
}

/// Catalog backed by a plain map.
#[derive(Default)]
pub struct MapCatalog {
    procedures: HashMap<i64, Arc<Procedure>>,
}

impl MapCatalog {
    pub fn with(procedures: impl IntoIterator<Item = Arc<Procedure>>) -> Self {
        Self {
            procedures: procedures.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

impl ProcedureCatalog for MapCatalog {
    fn lookup(&self, id: i64) -> Option<Arc<Procedure>> {
        self.procedures.get(&id).cloned()
    }
}

pub fn action(id: u32, code: &str, delay_after_ms: u64) -> ProcedureStep {
    ProcedureStep {
        id,
        description: format!("step {id}"),
        kind: StepKind::Action,
        action_code: code.to_string(),
        expected_state_check: None,
        delay_after_ms,
    }
}

pub fn action_with_check(id: u32, code: &str, check: &str, delay_after_ms: u64) -> ProcedureStep {
    ProcedureStep {
        expected_state_check: Some(check.to_string()),
        ..action(id, code, delay_after_ms)
    }
}

pub fn condition(id: u32, code: &str, delay_after_ms: u64) -> ProcedureStep {
    ProcedureStep {
        kind: StepKind::Condition,
        ..action(id, code, delay_after_ms)
    }
}

pub fn procedure(id: i64, steps: Vec<ProcedureStep>) -> Arc<Procedure> {
    Arc::new(Procedure::new(id, format!("procedure {id}"), steps).unwrap())
}
