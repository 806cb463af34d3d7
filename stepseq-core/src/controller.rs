//! Preset controller.
//!
//! Bridges the host's request/guard/progress variables to the procedure
//! runner. This is the only component that talks to the variable store
//! and the catalog; the runner only ever sees the evaluator.
//!
//! Variable cadence note: the request, guard, and readiness keys are read
//! on every tick and should be kept fresh by the host; progress keys are
//! only written when something changed. The controller never writes the
//! guard variable.

use crate::host::{almost_equal, ExpressionEvaluator, ProcedureCatalog, VariableStore};
use crate::runner::{ProcedureRunner, StepOutcome};
use std::time::Duration;

/// Host request: a positive procedure id asks for that procedure, 0 means
/// no request (or an interrupt of the running one).
pub const REQUEST_VAR: &str = "PRESET_LOAD_REQUEST";
/// Fractional progress of the running procedure, in [0, 1].
pub const PROGRESS_VAR: &str = "PRESET_LOAD_PROGRESS";
/// Identifier of the step currently executing.
pub const PROGRESS_ID_VAR: &str = "PRESET_LOAD_CURRENT_ID";
/// Guard precondition: procedures only start or continue while truthy.
pub const GUARD_VAR: &str = "ON_GROUND";
/// Host readiness: ticks are deferred until this is truthy.
pub const READY_VAR: &str = "HOST_READY";
/// When truthy, skipped steps are logged at info level.
pub const VERBOSE_VAR: &str = "PRESET_VERBOSE";

/// Observable result of one controller tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// `initialize` has not been called; the tick was skipped.
    NotInitialized,
    /// Host not ready yet; silently deferred.
    Deferred,
    /// No request and nothing running.
    Idle,
    /// A new request was accepted and the procedure armed.
    Started { id: i64 },
    /// The running procedure advanced (or waited) this tick.
    Running(StepOutcome),
    /// The running procedure completed this tick.
    Finished { id: i64 },
    /// The request was withdrawn mid-procedure.
    Cancelled { id: i64 },
    /// A request arrived (or a run continued) while the guard was false.
    GuardViolation { id: i64 },
    /// The requested id is not in the catalog.
    UnknownProcedure { id: i64 },
    /// Evaluation failed mid-procedure; the run was aborted.
    Faulted { id: i64 },
}

/// Drives procedure requests from the host, owning the runner.
#[derive(Default)]
pub struct PresetController {
    runner: ProcedureRunner,
    active_request_id: i64,
    initialized: bool,
}

impl PresetController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears any stale request left in the store and marks the
    /// controller ready to tick.
    pub fn initialize(&mut self, store: &mut impl VariableStore) {
        store.write(REQUEST_VAR, 0.0);
        self.initialized = true;
        tracing::info!("preset controller initialized");
    }

    /// Id of the procedure currently being driven, 0 if none.
    pub fn active_request_id(&self) -> i64 {
        self.active_request_id
    }

    pub fn runner(&self) -> &ProcedureRunner {
        &self.runner
    }

    /// Runs one controller tick. Never returns an error: every failure
    /// path recovers locally by clearing the request and idling the
    /// runner, so a bad procedure can never stall the host frame loop.
    pub fn tick(
        &mut self,
        dt: Duration,
        store: &mut impl VariableStore,
        evaluator: &mut impl ExpressionEvaluator,
        catalog: &impl ProcedureCatalog,
    ) -> TickOutcome {
        if !self.initialized {
            tracing::error!("tick before initialize");
            return TickOutcome::NotInitialized;
        }

        if !truthy(store.read(READY_VAR)) {
            return TickOutcome::Deferred;
        }

        let request = store.read(REQUEST_VAR) as i64;
        if request > 0 {
            self.tick_requested(dt, request, store, evaluator, catalog)
        } else if self.runner.is_active() {
            // Cancellation. Progress outputs are deliberately left as
            // they were; they reset when the next procedure starts.
            let id = self.active_request_id;
            tracing::info!(id, "procedure cancelled");
            self.runner.cancel();
            self.active_request_id = 0;
            TickOutcome::Cancelled { id }
        } else {
            TickOutcome::Idle
        }
    }

    fn tick_requested(
        &mut self,
        dt: Duration,
        request: i64,
        store: &mut impl VariableStore,
        evaluator: &mut impl ExpressionEvaluator,
        catalog: &impl ProcedureCatalog,
    ) -> TickOutcome {
        if !truthy(store.read(GUARD_VAR)) {
            tracing::warn!(
                request,
                "procedure requested while guard precondition is false"
            );
            store.write(REQUEST_VAR, 0.0);
            self.runner.cancel();
            self.active_request_id = 0;
            return TickOutcome::GuardViolation { id: request };
        }

        if !self.runner.is_active() {
            let Some(procedure) = catalog.lookup(request) else {
                tracing::warn!(request, "requested procedure not in catalog");
                store.write(REQUEST_VAR, 0.0);
                return TickOutcome::UnknownProcedure { id: request };
            };
            if let Err(e) = self.runner.start(procedure) {
                tracing::warn!(request, error = %e, "procedure rejected");
                store.write(REQUEST_VAR, 0.0);
                return TickOutcome::Faulted { id: request };
            }
            self.active_request_id = request;
            store.write(PROGRESS_VAR, 0.0);
            store.write(PROGRESS_ID_VAR, 0.0);
            tracing::info!(id = request, "procedure starting");
            return TickOutcome::Started { id: request };
        }

        // Re-pin the request to the running procedure: only 0 is accepted
        // as an interrupt signal while a procedure is active.
        store.write(REQUEST_VAR, self.active_request_id as f64);

        match self.runner.advance(dt, evaluator) {
            Ok(StepOutcome::Complete) => {
                let id = self.active_request_id;
                tracing::info!(id, "procedure done");
                store.write(PROGRESS_VAR, 0.0);
                store.write(PROGRESS_ID_VAR, 0.0);
                store.write(REQUEST_VAR, 0.0);
                self.active_request_id = 0;
                TickOutcome::Finished { id }
            }
            Ok(outcome) => {
                if let Some(progress) = outcome.progress() {
                    store.write(PROGRESS_VAR, progress.fraction);
                    store.write(PROGRESS_ID_VAR, f64::from(progress.step_id));
                }
                if outcome == StepOutcome::Skipped && truthy(store.read(VERBOSE_VAR)) {
                    tracing::info!(
                        id = self.active_request_id,
                        index = self.runner.step_index().saturating_sub(1),
                        "expected state already set, step skipped"
                    );
                }
                TickOutcome::Running(outcome)
            }
            Err(e) => {
                let id = self.active_request_id;
                tracing::warn!(id, error = %e, "procedure aborted");
                store.write(REQUEST_VAR, 0.0);
                self.runner.cancel();
                self.active_request_id = 0;
                TickOutcome::Faulted { id }
            }
        }
    }
}

fn truthy(value: f64) -> bool {
    !almost_equal(value, 0.0)
}
