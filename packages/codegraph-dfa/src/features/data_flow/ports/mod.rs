//! Data Flow Ports - Interface Layer (Hexagonal Architecture)
//!
//! External collaborators of the interpreter, abstracted as traits:
//! - `TypeHierarchy`: subtype queries for instanceof/cast reasoning
//! - `DiagnosticSink`: where engine-internal problems are reported
//!
//! Both are `Send + Sync` so one instance can serve every runner of a batch.

use super::domain::TypeId;
use crate::errors::DfaError;

// ═══════════════════════════════════════════════════════════════════════════
// Secondary Ports (Driven/Output)
// ═══════════════════════════════════════════════════════════════════════════

/// Type Hierarchy Port
///
/// Answers subtype questions about `TypeId`s handed out by the linearizer.
///
/// # Implementors
/// - `ClassHierarchy` (in-memory class/interface table)
pub trait TypeHierarchy: Send + Sync {
    /// `sub <: sup` (reflexive)
    fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool;

    /// No object can be an instance of both types
    ///
    /// The default is conservative: nothing is disjoint.
    fn are_disjoint(&self, _a: TypeId, _b: TypeId) -> bool {
        false
    }

    /// Display name for diagnostics
    fn type_name(&self, ty: TypeId) -> String {
        format!("{:?}", ty)
    }
}

/// Diagnostic Sink Port
///
/// Receives engine-internal events. Program defects never go through here.
///
/// # Implementors
/// - `TracingDiagnostics` (forwards to `tracing`)
/// - `CollectingDiagnostics` (keeps events for inspection)
pub trait DiagnosticSink: Send + Sync {
    /// Malformed instruction stream; the method analysis was aborted
    fn internal_error(&self, method: &str, error: &DfaError);

    /// State bound exceeded; the method analysis was abandoned
    fn too_complex(&self, method: &str, processed_states: usize);

    /// Host cancelled the method analysis
    fn cancelled(&self, _method: &str) {}

    /// A condition at `instruction` had neither outcome feasible: the state
    /// reaching it was already contradictory (usually an inconsistent type
    /// hierarchy). Analysis continues.
    fn infeasible_condition(&self, _method: &str, _instruction: usize) {}
}
