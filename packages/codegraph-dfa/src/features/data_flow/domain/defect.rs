/*
 * Analysis Findings
 *
 * Defects found by the interpreter plus the per-method outcome handed back
 * to the reporting layer.
 */

use crate::shared::models::SourceAnchor;
use serde::{Deserialize, Serialize};

/// Defect kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// Dereference of a value that is null (or `@Nullable` and unchecked)
    NullDereference,

    /// Cast that can never succeed for a non-null operand
    ClassCast,

    /// Nullable value stored into a `@NotNull` variable
    NotNullAssignment,

    /// Nullable value passed to a `@NotNull` parameter
    PassingNullArgument,

    /// Nullable value returned from a `@NotNull` method
    NullableReturn,

    /// Condition only ever evaluates to true
    ConditionAlwaysTrue,

    /// Condition only ever evaluates to false (impossible instanceof included)
    ConditionAlwaysFalse,

    /// `instanceof` that only fails for null, replaceable by a null check
    RedundantInstanceof,
}

impl DefectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectKind::NullDereference => "null-dereference",
            DefectKind::ClassCast => "class-cast",
            DefectKind::NotNullAssignment => "not-null-assignment",
            DefectKind::PassingNullArgument => "passing-null-argument",
            DefectKind::NullableReturn => "nullable-return",
            DefectKind::ConditionAlwaysTrue => "condition-always-true",
            DefectKind::ConditionAlwaysFalse => "condition-always-false",
            DefectKind::RedundantInstanceof => "redundant-instanceof",
        }
    }

    /// Defects that come from branch reachability rather than a hook
    pub fn is_condition(&self) -> bool {
        matches!(
            self,
            DefectKind::ConditionAlwaysTrue
                | DefectKind::ConditionAlwaysFalse
                | DefectKind::RedundantInstanceof
        )
    }
}

impl std::fmt::Display for DefectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected program defect
///
/// Ordered so that a set of defects iterates deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Defect {
    pub kind: DefectKind,
    /// Index of the triggering instruction
    pub instruction: usize,
    pub anchor: Option<SourceAnchor>,
}

impl Defect {
    pub fn new(kind: DefectKind, instruction: usize, anchor: Option<SourceAnchor>) -> Self {
        Self {
            kind,
            instruction,
            anchor,
        }
    }
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.anchor {
            Some(anchor) => write!(f, "{} at #{} ({})", self.kind, self.instruction, anchor),
            None => write!(f, "{} at #{}", self.kind, self.instruction),
        }
    }
}

/// How a single method analysis ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Worklist drained; defects are final
    Completed,
    /// State bound exceeded
    TooComplex { limit: usize },
    /// Host cancelled the run
    Cancelled,
    /// Malformed instruction stream
    Aborted { reason: String },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

/// Interpreter counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// (instruction, state) pairs handed to `apply`
    pub processed_states: usize,
    /// Pairs skipped because an equal state was already processed
    pub deduplicated_states: usize,
    /// Pairs skipped because a more general state was already processed
    #[serde(default)]
    pub subsumed_states: usize,
    /// Pairs dropped because a condition was infeasible
    pub pruned_branches: usize,
    /// Largest worklist size observed
    pub max_worklist: usize,
}

/// Result of analyzing one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub method: String,
    #[serde(flatten)]
    pub status: RunStatus,
    /// Sorted; empty unless `status` is `Completed`
    pub defects: Vec<Defect>,
    pub stats: RunStats,
}

impl AnalysisReport {
    pub fn is_clean(&self) -> bool {
        self.status.is_completed() && self.defects.is_empty()
    }

    pub fn defects_of(&self, kind: DefectKind) -> impl Iterator<Item = &Defect> {
        self.defects.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: DefectKind) -> usize {
        self.defects_of(kind).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
