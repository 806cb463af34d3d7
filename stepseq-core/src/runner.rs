//! Procedure runner state machine.
//!
//! The runner single-steps a loaded procedure forward in time. It is
//! invoked once per host tick, never blocks, and performs at most one
//! visible step transition per call, which amortizes potentially
//! expensive host evaluations across frames. It tolerates being left
//! mid-procedure and resumed on any later tick.

use crate::error::CoreError;
use crate::host::ExpressionEvaluator;
use crate::step::Procedure;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle phase of the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerPhase {
    /// No procedure loaded.
    #[default]
    Idle,
    /// Waiting out the previous step's post-delay.
    Waiting,
    /// Eligible to evaluate the current step on the next advance.
    Transitioning,
    /// Past the last step; the next advance reports completion.
    Complete,
}

/// Progress metadata published when a step is evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Fractional completion in [0, 1], computed before the index
    /// advances: it reflects the step being evaluated this tick.
    pub fraction: f64,
    /// Identifier of the step being evaluated.
    pub step_id: u32,
}

/// Result of one `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The whole procedure has finished; the runner is idle again.
    Complete,
    /// Still inside the previous step's post-delay.
    Waiting,
    /// Condition step tested falsy; it stays current and is retested
    /// after its declared delay.
    ConditionPending(Progress),
    /// Condition step tested truthy; advanced with no extra delay.
    ConditionSatisfied(Progress),
    /// Expected state already held; the action was skipped without being
    /// evaluated, with no extra delay.
    Skipped,
    /// The step's action was executed.
    Executed(Progress),
}

impl StepOutcome {
    /// Progress to publish for this outcome, if any. Skipped steps
    /// publish nothing.
    pub fn progress(&self) -> Option<Progress> {
        match self {
            StepOutcome::ConditionPending(p)
            | StepOutcome::ConditionSatisfied(p)
            | StepOutcome::Executed(p) => Some(*p),
            _ => None,
        }
    }
}

/// Single-steps a loaded procedure forward in time.
#[derive(Default)]
pub struct ProcedureRunner {
    phase: RunnerPhase,
    procedure: Option<Arc<Procedure>>,
    step_index: usize,
    elapsed: Duration,
    next_allowed: Duration,
}

impl ProcedureRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a procedure and arms its first step. No host side effects.
    pub fn start(&mut self, procedure: Arc<Procedure>) -> Result<(), CoreError> {
        if procedure.is_empty() {
            return Err(CoreError::EmptyProcedure { id: procedure.id });
        }
        self.step_index = 0;
        self.elapsed = Duration::ZERO;
        self.next_allowed = Duration::ZERO;
        self.phase = RunnerPhase::Transitioning;
        self.procedure = Some(procedure);
        Ok(())
    }

    /// Abandons the current procedure and returns to idle. Safe to call
    /// at any step index.
    pub fn cancel(&mut self) {
        self.procedure = None;
        self.phase = RunnerPhase::Idle;
    }

    pub fn is_active(&self) -> bool {
        self.phase != RunnerPhase::Idle
    }

    pub fn phase(&self) -> RunnerPhase {
        self.phase
    }

    /// Index of the step the runner will consider next; equals the
    /// procedure length once all steps are done.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Advances the procedure by one tick.
    ///
    /// Exactly one of {condition test, skip check, action execution}
    /// happens per call that is not a pure wait, and the step index never
    /// moves by more than one. Evaluator failures propagate; the caller
    /// decides whether to abort.
    pub fn advance(
        &mut self,
        dt: Duration,
        evaluator: &mut dyn ExpressionEvaluator,
    ) -> Result<StepOutcome, CoreError> {
        let procedure = Arc::clone(self.procedure.as_ref().ok_or(CoreError::NoProcedureLoaded)?);

        if self.step_index >= procedure.len() {
            self.procedure = None;
            self.phase = RunnerPhase::Idle;
            return Ok(StepOutcome::Complete);
        }

        self.elapsed += dt;

        // Equality still waits: the declared delay is a minimum.
        if self.elapsed <= self.next_allowed {
            self.phase = RunnerPhase::Waiting;
            return Ok(StepOutcome::Waiting);
        }
        self.phase = RunnerPhase::Transitioning;

        let step = &procedure.steps()[self.step_index];

        // Charged up front so every branch pays the declared delay unless
        // it explicitly zeroes it.
        self.next_allowed = self.elapsed + Duration::from_millis(step.delay_after_ms);

        let progress = Progress {
            fraction: self.step_index as f64 / procedure.len() as f64,
            step_id: step.id,
        };

        if step.is_condition() {
            let result = evaluator.evaluate(&step.action_code)?;
            tracing::debug!(
                index = self.step_index,
                description = %step.description,
                retest_ms = step.delay_after_ms,
                "condition step tested"
            );
            if result.is_truthy() {
                self.next_allowed = Duration::ZERO;
                self.advance_index(procedure.len());
                return Ok(StepOutcome::ConditionSatisfied(progress));
            }
            return Ok(StepOutcome::ConditionPending(progress));
        }

        if let Some(check) = &step.expected_state_check {
            let result = evaluator.evaluate(check)?;
            if result.is_truthy() {
                tracing::debug!(
                    index = self.step_index,
                    description = %step.description,
                    "expected state already holds, skipping"
                );
                self.next_allowed = Duration::ZERO;
                self.advance_index(procedure.len());
                return Ok(StepOutcome::Skipped);
            }
        }

        tracing::debug!(
            index = self.step_index,
            description = %step.description,
            delay_after_ms = step.delay_after_ms,
            "executing step"
        );
        evaluator.evaluate(&step.action_code)?;
        self.advance_index(procedure.len());
        Ok(StepOutcome::Executed(progress))
    }

    fn advance_index(&mut self, len: usize) {
        self.step_index += 1;
        if self.step_index >= len {
            self.phase = RunnerPhase::Complete;
        }
    }
}
