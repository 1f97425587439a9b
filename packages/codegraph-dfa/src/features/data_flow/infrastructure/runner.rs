/*
 * Data Flow Runner
 *
 * Worklist interpreter over one ControlFlow:
 *
 *   worklist = [(0, initial_state)]
 *   while let Some((i, s)) = worklist.pop_front():
 *       cancelled?            -> Cancelled
 *       s seen at i?          -> skip
 *       s implied at i?       -> skip (only with subsume_states)
 *       processed > bound?    -> TooComplex
 *       worklist += apply(i, s)
 *
 * Termination follows from per-instruction dedup: memory states are finite
 * over the method's values, so every (instruction, state) pair is processed
 * at most once. With dedup disabled only `max_states` bounds loops.
 *
 * A run is single-threaded and owns all of its mutable data, including a
 * private copy of the value factory.
 */

use crate::config::DataFlowConfig;
use crate::errors::Result;
use crate::features::data_flow::domain::{
    AnalysisReport, BinaryOp, Defect, DefectKind, Instruction, Nullability, RunStats, RunStatus,
    VariableKind,
};
use crate::features::data_flow::infrastructure::{
    ControlFlow, InstructionState, MemoryState, StateContext, TracingDiagnostics, ValueFactory,
};
use crate::features::data_flow::ports::{DiagnosticSink, TypeHierarchy};
use rustc_hash::FxHashSet;
use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Cooperative cancellation flag shared between host and runner(s)
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Which outcomes of a condition were observed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchReachability {
    pub visited: bool,
    pub true_reachable: bool,
    pub false_reachable: bool,
    /// An `instanceof` failed for an operand not proven null
    pub fails_for_non_null: bool,
}

/// Worklist interpreter for a single method
pub struct DataFlowRunner<'a> {
    pub(super) flow: &'a ControlFlow,
    pub(super) hierarchy: &'a dyn TypeHierarchy,
    pub(super) factory: ValueFactory,
    config: DataFlowConfig,
    processed: Vec<FxHashSet<MemoryState>>,
    pub(super) branches: Vec<BranchReachability>,
    defects: BTreeSet<Defect>,
    pub(super) stats: RunStats,
    /// Conditions reached only by contradictory states
    pub(super) infeasible_conditions: BTreeSet<usize>,
    cancellation: CancellationToken,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<'a> DataFlowRunner<'a> {
    pub fn new(flow: &'a ControlFlow, hierarchy: &'a dyn TypeHierarchy, config: DataFlowConfig) -> Self {
        let len = flow.len();
        Self {
            flow,
            hierarchy,
            factory: flow.factory().clone(),
            config,
            processed: vec![FxHashSet::default(); len],
            branches: vec![BranchReachability::default(); len],
            defects: BTreeSet::new(),
            stats: RunStats::default(),
            infeasible_conditions: BTreeSet::new(),
            cancellation: CancellationToken::default(),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub(super) fn ctx(&self) -> StateContext<'_> {
        StateContext::new(&self.factory, self.hierarchy)
    }

    /// Analyze the method. Findings are kept only for completed runs.
    pub fn run(mut self, method: &str) -> AnalysisReport {
        debug!(method, instructions = self.flow.len(), "data flow run started");

        let status = match self.interpret() {
            Ok(status) => status,
            Err(err) => {
                self.diagnostics.internal_error(method, &err);
                RunStatus::Aborted {
                    reason: err.to_string(),
                }
            }
        };

        match &status {
            RunStatus::TooComplex { .. } => {
                self.diagnostics
                    .too_complex(method, self.stats.processed_states);
            }
            RunStatus::Cancelled => self.diagnostics.cancelled(method),
            _ => {}
        }
        for &index in &self.infeasible_conditions {
            self.diagnostics.infeasible_condition(method, index);
        }

        let defects = if status.is_completed() {
            self.report_conditions();
            std::mem::take(&mut self.defects).into_iter().collect()
        } else {
            Vec::new()
        };

        debug!(
            method,
            processed = self.stats.processed_states,
            deduplicated = self.stats.deduplicated_states,
            subsumed = self.stats.subsumed_states,
            interned = self.factory.stats().unique_values,
            defects = defects.len(),
            "data flow run finished"
        );

        AnalysisReport {
            method: method.to_string(),
            status,
            defects,
            stats: self.stats,
        }
    }

    fn interpret(&mut self) -> Result<RunStatus> {
        self.flow.validate()?;
        if self.flow.is_empty() {
            return Ok(RunStatus::Completed);
        }

        let mut worklist = VecDeque::new();
        worklist.push_back(InstructionState {
            index: 0,
            state: self.initial_state(),
        });

        while let Some(InstructionState { index, state }) = worklist.pop_front() {
            if self.cancellation.is_cancelled() {
                return Ok(RunStatus::Cancelled);
            }

            if self.already_covered(index, &state) {
                continue;
            }

            if self.stats.processed_states >= self.config.max_states {
                return Ok(RunStatus::TooComplex {
                    limit: self.config.max_states,
                });
            }
            self.stats.processed_states += 1;

            let flow = self.flow;
            let instruction = flow.instruction(index)?;
            trace!(index, %instruction, stack = state.stack_len(), "apply");

            let successors = self.apply(index, instruction, state)?;
            worklist.extend(successors);
            self.stats.max_worklist = self.stats.max_worklist.max(worklist.len());
        }

        Ok(RunStatus::Completed)
    }

    /// Whether `state` at `index` adds nothing to what was processed there:
    /// an equal state, or with `subsume_states` a more general one. Records
    /// `state` as processed otherwise.
    fn already_covered(&mut self, index: usize, state: &MemoryState) -> bool {
        if !self.config.deduplicate_states {
            return false;
        }
        let ctx = StateContext::new(&self.factory, self.hierarchy);
        let Some(seen) = self.processed.get_mut(index) else {
            return false;
        };
        if seen.contains(state) {
            self.stats.deduplicated_states += 1;
            return true;
        }
        if self.config.subsume_states && seen.iter().any(|p| p.is_super_state_of(state, &ctx)) {
            self.stats.subsumed_states += 1;
            return true;
        }
        seen.insert(state.clone());
        false
    }

    /// Entry state: `@NotNull` parameters are assumed non-null
    fn initial_state(&self) -> MemoryState {
        let mut state = MemoryState::new();
        let ctx = self.ctx();
        for (id, descriptor) in self.factory.variables() {
            if descriptor.kind == VariableKind::Parameter
                && descriptor.nullability == Nullability::NotNull
            {
                // Distinct pairs between fresh singletons cannot contradict
                let _ = state.apply_not_null(id, &ctx);
            }
        }
        state
    }

    /// Turn branch reachability into condition findings
    fn report_conditions(&mut self) {
        let flow = self.flow;
        for (index, branch) in self.branches.iter().enumerate() {
            if !branch.visited {
                continue;
            }
            let Ok(instruction) = flow.instruction(index) else {
                continue;
            };
            let Some(anchor) = instruction.anchor() else {
                continue;
            };

            if self.config.report_constant_conditions {
                let kind = match (branch.true_reachable, branch.false_reachable) {
                    (true, false) => Some(DefectKind::ConditionAlwaysTrue),
                    (false, true) => Some(DefectKind::ConditionAlwaysFalse),
                    _ => None,
                };
                if let Some(kind) = kind {
                    self.defects.insert(Defect::new(kind, index, Some(anchor)));
                }
            }

            let is_instanceof = matches!(
                instruction,
                Instruction::Binop {
                    op: BinaryOp::InstanceOf,
                    ..
                }
            );
            if self.config.report_redundant_instanceof
                && is_instanceof
                && branch.true_reachable
                && branch.false_reachable
                && !branch.fails_for_non_null
            {
                self.defects.insert(Defect::new(
                    DefectKind::RedundantInstanceof,
                    index,
                    Some(anchor),
                ));
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Hooks (record only)
    // ═══════════════════════════════════════════════════════════════════════

    fn record(&mut self, kind: DefectKind, index: usize) {
        let anchor = self.flow.instruction(index).ok().and_then(Instruction::anchor);
        trace!(index, kind = kind.as_str(), "defect");
        self.defects.insert(Defect::new(kind, index, anchor));
    }

    pub fn on_instruction_produces_npe(&mut self, index: usize) {
        self.record(DefectKind::NullDereference, index);
    }

    pub fn on_instruction_produces_cce(&mut self, index: usize) {
        self.record(DefectKind::ClassCast, index);
    }

    pub fn on_assigning_to_not_nullable_variable(&mut self, index: usize) {
        self.record(DefectKind::NotNullAssignment, index);
    }

    pub fn on_passing_null_argument(&mut self, index: usize) {
        self.record(DefectKind::PassingNullArgument, index);
    }

    pub fn on_nullable_return(&mut self, index: usize) {
        self.record(DefectKind::NullableReturn, index);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Introspection
    // ═══════════════════════════════════════════════════════════════════════

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn branch(&self, index: usize) -> Option<&BranchReachability> {
        self.branches.get(index)
    }
}
