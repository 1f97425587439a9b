/*
 * Data Flow Analysis
 *
 * Abstract interpreter over linearized method bodies. Detects:
 * - Null dereferences
 * - Impossible casts
 * - @NotNull contract violations (assignment, argument, return)
 * - Conditions that are always true/false
 * - instanceof checks that only guard against null
 *
 * Architecture:
 * - Domain: Value, Instruction, Defect models
 * - Ports: TypeHierarchy, DiagnosticSink
 * - Infrastructure: ValueFactory, MemoryState, DataFlowRunner, adapters
 * - Application: DataFlowAnalyzer (single method + rayon batch)
 *
 * Algorithm:
 * - Worklist over (instruction, memory state) pairs
 * - Fork at relational conditions, prune infeasible branches
 * - Integer bounds learned from ordering comparisons against constants
 * - Per-instruction state dedup guarantees termination
 */

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{BatchSummary, DataFlowAnalyzer};
pub use domain::*;
pub use infrastructure::{
    CancellationToken, ClassHierarchy, CollectingDiagnostics, ControlFlow, ControlFlowBuilder,
    DataFlowRunner, DiagnosticEvent, Label, MemoryState, TracingDiagnostics, ValueFactory,
};
pub use ports::{DiagnosticSink, TypeHierarchy};
