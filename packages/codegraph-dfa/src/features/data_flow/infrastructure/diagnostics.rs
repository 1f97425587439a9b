//! Diagnostic sink adapters

use crate::errors::DfaError;
use crate::features::data_flow::ports::DiagnosticSink;
use parking_lot::Mutex;
use tracing::{error, warn};

/// Forwards engine events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn internal_error(&self, method: &str, err: &DfaError) {
        error!(method, code = err.code(), "data flow analysis aborted: {}", err);
    }

    fn too_complex(&self, method: &str, processed_states: usize) {
        warn!(method, processed_states, "data flow analysis too complex");
    }

    fn cancelled(&self, method: &str) {
        warn!(method, "data flow analysis cancelled");
    }

    fn infeasible_condition(&self, method: &str, instruction: usize) {
        warn!(method, instruction, "condition has no feasible outcome");
    }
}

/// Recorded engine event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    InternalError { method: String, error: DfaError },
    TooComplex { method: String, processed_states: usize },
    Cancelled { method: String },
    InfeasibleCondition { method: String, instruction: usize },
}

/// Keeps every event in memory (tests, batch summaries)
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<DiagnosticEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn internal_error(&self, method: &str, error: &DfaError) {
        self.events.lock().push(DiagnosticEvent::InternalError {
            method: method.to_string(),
            error: error.clone(),
        });
    }

    fn too_complex(&self, method: &str, processed_states: usize) {
        self.events.lock().push(DiagnosticEvent::TooComplex {
            method: method.to_string(),
            processed_states,
        });
    }

    fn cancelled(&self, method: &str) {
        self.events.lock().push(DiagnosticEvent::Cancelled {
            method: method.to_string(),
        });
    }

    fn infeasible_condition(&self, method: &str, instruction: usize) {
        self.events.lock().push(DiagnosticEvent::InfeasibleCondition {
            method: method.to_string(),
            instruction,
        });
    }
}
