//! Error types for codegraph-dfa
//!
//! Engine-internal errors only. Program defects found by the analysis are
//! not errors; they are reported as `Defect`s.

use thiserror::Error;

use crate::features::data_flow::domain::ValueId;

/// Internal error of a single method analysis.
///
/// Every variant indicates a malformed instruction stream coming from the
/// linearizer. The runner turns them into `RunStatus::Aborted` for the
/// offending method only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DfaError {
    /// Pop from an empty operand stack
    #[error("instruction #{instruction} popped an empty stack")]
    EmptyStack { instruction: usize },

    /// `ReturnFromSub` without a pending `Gosub`
    #[error("instruction #{instruction} returned from a subroutine that was never entered")]
    EmptyOffsetStack { instruction: usize },

    /// Instruction index outside the program
    #[error("instruction index {index} out of range (program has {len} instructions)")]
    InstructionOutOfRange { index: usize, len: usize },

    /// Jump to an index outside the program
    #[error("instruction #{instruction} jumps to {target}, program has {len} instructions")]
    InvalidJumpTarget {
        instruction: usize,
        target: usize,
        len: usize,
    },

    /// Value id not known to the value factory
    #[error("value {0:?} is not registered in the value factory")]
    InvalidValue(ValueId),

    /// Builder label used by a jump but never bound to an index
    #[error("label {label} is referenced but never bound")]
    UnboundLabel { label: usize },

    /// Serialized value table that would shift or alias value ids
    #[error("value table entry {index} is invalid: {reason}")]
    InvalidValueTable { index: usize, reason: &'static str },
}

impl DfaError {
    /// Short machine-friendly name, used in diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            DfaError::EmptyStack { .. } => "empty-stack",
            DfaError::EmptyOffsetStack { .. } => "empty-offset-stack",
            DfaError::InstructionOutOfRange { .. } => "instruction-out-of-range",
            DfaError::InvalidJumpTarget { .. } => "invalid-jump-target",
            DfaError::InvalidValue(_) => "invalid-value",
            DfaError::UnboundLabel { .. } => "unbound-label",
            DfaError::InvalidValueTable { .. } => "invalid-value-table",
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, DfaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DfaError::EmptyStack { instruction: 3 };
        assert_eq!(err.to_string(), "instruction #3 popped an empty stack");
        assert_eq!(err.code(), "empty-stack");

        let err = DfaError::InvalidJumpTarget {
            instruction: 1,
            target: 9,
            len: 4,
        };
        assert!(err.to_string().contains("jumps to 9"));

        let err = DfaError::InvalidValueTable {
            index: 0,
            reason: "expected a built-in value",
        };
        assert_eq!(
            err.to_string(),
            "value table entry 0 is invalid: expected a built-in value"
        );
        assert_eq!(err.code(), "invalid-value-table");
    }
}
