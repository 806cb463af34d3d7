//! In-memory host shim for running catalogs outside a real host.
//!
//! Real hosts supply their own expression evaluator; this one understands
//! just enough to author and validate catalogs:
//!
//! - `set NAME VALUE` writes a shim variable and yields VALUE
//! - any other token reads the named shim variable (missing reads as 0)
//!
//! Shim variables are the evaluator's own world, separate from the
//! controller's variable store, so a `set` in one step makes later
//! condition tests and expected-state checks against that name truthy.

use std::collections::HashMap;
use stepseq_core::{EvalError, EvalOutput, ExpressionEvaluator};

/// Evaluator over a private map of named values.
#[derive(Debug, Default)]
pub struct VarOpsEvaluator {
    values: HashMap<String, f64>,
    evaluations: u64,
}

impl VarOpsEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of expressions evaluated so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Pre-seeds a variable, e.g. to satisfy a condition step up front.
    pub fn seed(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

impl ExpressionEvaluator for VarOpsEvaluator {
    fn evaluate(&mut self, code: &str) -> Result<EvalOutput, EvalError> {
        self.evaluations += 1;
        let mut parts = code.split_whitespace();

        match parts.next() {
            Some("set") => {
                let name = parts
                    .next()
                    .ok_or_else(|| EvalError::new(format!("set without a name: '{code}'")))?;
                let value: f64 = parts
                    .next()
                    .ok_or_else(|| EvalError::new(format!("set without a value: '{code}'")))?
                    .parse()
                    .map_err(|_| EvalError::new(format!("bad value in '{code}'")))?;
                if parts.next().is_some() {
                    return Err(EvalError::new(format!("trailing tokens in '{code}'")));
                }
                self.values.insert(name.to_string(), value);
                Ok(EvalOutput::number(value))
            }
            Some(name) => {
                if parts.next().is_some() {
                    return Err(EvalError::new(format!("trailing tokens in '{code}'")));
                }
                Ok(EvalOutput::number(
                    self.values.get(name).copied().unwrap_or(0.0),
                ))
            }
            None => Err(EvalError::new("empty expression".to_string())),
        }
    }
}
