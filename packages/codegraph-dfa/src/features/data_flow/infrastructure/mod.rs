//! Data Flow infrastructure
//!
//! Interpreter machinery: value interning, memory states, instruction
//! semantics and the worklist runner, plus in-memory port adapters.

mod control_flow;
mod diagnostics;
mod instruction_semantics;
mod memory_state;
mod runner;
mod type_hierarchy;
mod value_factory;

pub use control_flow::{ControlFlow, ControlFlowBuilder, Label};
pub use diagnostics::{CollectingDiagnostics, DiagnosticEvent, TracingDiagnostics};
pub use instruction_semantics::InstructionState;
pub use memory_state::{MemoryState, StateContext, VariableState};
pub use runner::{BranchReachability, CancellationToken, DataFlowRunner};
pub use type_hierarchy::ClassHierarchy;
pub use value_factory::{InternerStats, ValueFactory};
