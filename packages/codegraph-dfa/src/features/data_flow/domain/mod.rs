/*
 * Data Flow Domain Models
 *
 * Core types of the abstract interpreter: values, instructions, findings.
 */

mod defect;
mod instruction;
mod range;
mod value;

pub use defect::{AnalysisReport, Defect, DefectKind, RunStats, RunStatus};
pub use instruction::{BinaryOp, CallResult, Instruction, MethodContract};
pub use range::IntRange;
pub use value::{
    ConstValue, Nullability, RelationType, TypeId, Value, ValueId, VariableDescriptor,
    VariableKind,
};
