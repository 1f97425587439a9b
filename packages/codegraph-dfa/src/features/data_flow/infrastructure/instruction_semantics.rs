/*
 * Instruction Semantics
 *
 * Transition function of the interpreter: one (instruction, state) pair in,
 * zero or more successor pairs out.
 *
 *   0 successors   infeasible path, method exit, or a fatal defect
 *   1 successor    straight-line code
 *   2 successors   fork on a relation (true copy + false original)
 *
 * Instructions only call runner hooks to report; they never decide what
 * ends up in the final report.
 *
 * Before a variable is rebound or flushed, stack slots naming it are
 * replaced by a snapshot of its current value (constant, non-null of a
 * known type, or unknown), so values pushed earlier keep their meaning.
 */

use crate::errors::{DfaError, Result};
use crate::features::data_flow::domain::{
    BinaryOp, CallResult, ConstValue, Instruction, MethodContract, Nullability, RelationType,
    TypeId, Value, ValueId,
};
use crate::features::data_flow::infrastructure::{DataFlowRunner, MemoryState};
use tracing::trace;

/// A memory state waiting to be processed at an instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionState {
    pub index: usize,
    pub state: MemoryState,
}

impl InstructionState {
    pub fn new(index: usize, state: MemoryState) -> Self {
        Self { index, state }
    }
}

impl DataFlowRunner<'_> {
    /// Apply `instruction` (at `index`) to `state`
    pub(super) fn apply(
        &mut self,
        index: usize,
        instruction: &Instruction,
        mut state: MemoryState,
    ) -> Result<Vec<InstructionState>> {
        match instruction {
            Instruction::Push { value, .. } => {
                if !self.factory.contains(*value) {
                    return Err(DfaError::InvalidValue(*value));
                }
                state.push(*value);
                Ok(self.next(index, state))
            }
            Instruction::Pop => {
                state.pop(index)?;
                Ok(self.next(index, state))
            }
            Instruction::Dup => {
                let top = state.pop(index)?;
                state.push(top);
                state.push(top);
                Ok(self.next(index, state))
            }
            Instruction::Swap => {
                let a = state.pop(index)?;
                let b = state.pop(index)?;
                state.push(a);
                state.push(b);
                Ok(self.next(index, state))
            }
            Instruction::Assign { .. } => self.apply_assign(index, state),
            Instruction::Binop { op, .. } => self.apply_binop(index, *op, state),
            Instruction::Not => {
                let value = state.pop(index)?;
                let negated = match value {
                    ValueId::TRUE => ValueId::FALSE,
                    ValueId::FALSE => ValueId::TRUE,
                    other if matches!(self.factory.get(other), Some(Value::Relation { .. })) => {
                        self.factory.negate(other)
                    }
                    _ => ValueId::UNKNOWN,
                };
                state.push(negated);
                Ok(self.next(index, state))
            }
            Instruction::ConditionalGoto {
                target, negated, ..
            } => self.apply_conditional_goto(index, *target, *negated, state),
            Instruction::Goto { target } => Ok(vec![InstructionState::new(*target, state)]),
            Instruction::Return => Ok(Vec::new()),
            Instruction::EmptyStack => {
                state.empty_stack();
                Ok(self.next(index, state))
            }
            Instruction::FlushVariable { variable } => {
                match variable {
                    Some(var) => {
                        self.detach_from_stack(*var, &mut state);
                        state.flush_variable(*var, &self.ctx());
                    }
                    None => {
                        for value in state.stack_values() {
                            if self.factory.is_variable(value) {
                                self.detach_from_stack(value, &mut state);
                            }
                        }
                        state.flush_all_variables();
                    }
                }
                Ok(self.next(index, state))
            }
            Instruction::FieldReference { .. } => {
                let qualifier = state.pop(index)?;
                if !state.apply_not_null(qualifier, &self.ctx()) {
                    self.on_instruction_produces_npe(index);
                    return Ok(Vec::new());
                }
                Ok(self.next(index, state))
            }
            Instruction::MethodCall {
                arg_count,
                contract,
                ..
            } => self.apply_method_call(index, *arg_count, contract, state),
            Instruction::TypeCast {
                cast_type,
                redundant,
                ..
            } => self.apply_type_cast(index, *cast_type, *redundant, state),
            Instruction::CheckReturnValue { not_null, .. } => {
                let value = state.pop(index)?;
                if *not_null && state.can_be_null(value, &self.ctx()) {
                    self.on_nullable_return(index);
                }
                Ok(self.next(index, state))
            }
            Instruction::Gosub { target } => {
                state.push_offset(index + 1);
                Ok(vec![InstructionState::new(*target, state)])
            }
            Instruction::ReturnFromSub => {
                let offset = state.pop_offset(index)?;
                if offset < self.flow.len() {
                    Ok(vec![InstructionState::new(offset, state)])
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    /// Fall through to `index + 1`; the last instruction exits the method
    fn next(&self, index: usize, state: MemoryState) -> Vec<InstructionState> {
        if index + 1 < self.flow.len() {
            vec![InstructionState::new(index + 1, state)]
        } else {
            Vec::new()
        }
    }

    /// Stand-in for what `var` holds now
    fn snapshot(&mut self, var: ValueId, state: &MemoryState) -> ValueId {
        let ctx = self.ctx();
        if let Some(constant) = state.variable_value(var, &ctx) {
            return constant;
        }
        if !state.is_not_null(var, &ctx) {
            return ValueId::UNKNOWN;
        }
        let ty = state.known_type(var, &ctx);
        self.factory.not_null(ty)
    }

    /// Replace stack slots naming `var` by its snapshot
    fn detach_from_stack(&mut self, var: ValueId, state: &mut MemoryState) {
        if state.stack_contains(var) {
            let snapshot = self.snapshot(var, state);
            state.replace_on_stack(var, snapshot);
        }
    }

    fn apply_assign(&mut self, index: usize, mut state: MemoryState) -> Result<Vec<InstructionState>> {
        let src = state.pop(index)?;
        let dest = state.pop(index)?;

        let dest_not_null = self
            .factory
            .descriptor(dest)
            .map_or(false, |d| d.nullability == Nullability::NotNull);
        if dest_not_null && state.can_be_null(src, &self.ctx()) {
            self.on_assigning_to_not_nullable_variable(index);
        }

        if self.factory.is_variable(dest) && dest != src {
            self.detach_from_stack(dest, &mut state);
            state.set_variable_value(dest, src, &self.ctx());
        }
        state.push(dest);
        Ok(self.next(index, state))
    }

    /// Substitute a variable by the constant it is bound to
    fn resolve_constant(&self, value: ValueId, state: &MemoryState) -> ValueId {
        if self.factory.is_variable(value) {
            state.variable_value(value, &self.ctx()).unwrap_or(value)
        } else {
            value
        }
    }

    fn int_constant(&self, value: ValueId) -> Option<i64> {
        self.factory.get(value)?.as_constant()?.as_int()
    }

    /// Decide a comparison whose operands are, or are bound to, constants
    fn fold(
        &self,
        left: ValueId,
        right: ValueId,
        relation_type: RelationType,
        state: &MemoryState,
    ) -> Option<bool> {
        let l = self.resolve_constant(left, state);
        let r = self.resolve_constant(right, state);
        match relation_type {
            RelationType::Eq | RelationType::Ne => {
                let constants = self.factory.is_constant(l) && self.factory.is_constant(r);
                constants.then(|| (l == r) != (relation_type == RelationType::Ne))
            }
            RelationType::Lt => Some(self.int_constant(l)? < self.int_constant(r)?),
            RelationType::InstanceOf => None,
        }
    }

    fn apply_binop(
        &mut self,
        index: usize,
        op: BinaryOp,
        mut state: MemoryState,
    ) -> Result<Vec<InstructionState>> {
        let right = state.pop(index)?;
        let left = state.pop(index)?;

        // Ordering is interned as `<` with swapped operands and/or negation
        let (relation_type, left, right, negated) = match op {
            BinaryOp::Eq => (RelationType::Eq, left, right, false),
            BinaryOp::Ne => (RelationType::Ne, left, right, false),
            BinaryOp::InstanceOf => (RelationType::InstanceOf, left, right, false),
            BinaryOp::Lt => (RelationType::Lt, left, right, false),
            BinaryOp::Gt => (RelationType::Lt, right, left, false),
            BinaryOp::Ge => (RelationType::Lt, left, right, true),
            BinaryOp::Le => (RelationType::Lt, right, left, true),
            BinaryOp::Concat => {
                let result = self.factory.not_null(None);
                state.push(result);
                return Ok(self.next(index, state));
            }
            BinaryOp::Other => {
                state.push(ValueId::UNKNOWN);
                return Ok(self.next(index, state));
            }
        };

        // Constant folding: no fork, no narrowing
        if let Some(holds) = self.fold(left, right, relation_type, &state) {
            let result = holds != negated;
            self.mark_branch(index, result, !result);
            state.push(self.factory.boolean(result));
            return Ok(self.next(index, state));
        }

        let Some(relation) = self.factory.relation(left, right, relation_type, negated) else {
            self.mark_branch(index, true, true);
            if op == BinaryOp::InstanceOf {
                self.mark_instanceof_failure(index);
            }
            state.push(ValueId::UNKNOWN);
            return Ok(self.next(index, state));
        };
        let negation = self.factory.negate(relation);

        let mut true_state = state.clone();
        let true_feasible = true_state.apply_condition(relation, &self.ctx());
        let mut false_state = state;
        let false_feasible = false_state.apply_condition(negation, &self.ctx());

        self.mark_branch(index, true_feasible, false_feasible);
        if op == BinaryOp::InstanceOf
            && false_feasible
            && !false_state.is_null(left, &self.ctx())
        {
            self.mark_instanceof_failure(index);
        }

        self.record_pruned(index, true_feasible, false_feasible);

        let mut successors = Vec::with_capacity(2);
        if true_feasible {
            true_state.push(ValueId::TRUE);
            successors.extend(self.next(index, true_state));
        }
        if false_feasible {
            false_state.push(ValueId::FALSE);
            successors.extend(self.next(index, false_state));
        }
        Ok(successors)
    }

    fn apply_conditional_goto(
        &mut self,
        index: usize,
        target: usize,
        negated: bool,
        mut state: MemoryState,
    ) -> Result<Vec<InstructionState>> {
        let condition = state.pop(index)?;
        let jump_when = !negated;

        let constant = match self.factory.get(condition) {
            Some(Value::Constant {
                constant: ConstValue::Bool(b),
            }) => Some(*b),
            _ => None,
        };
        if let Some(value) = constant {
            self.mark_branch(index, value, !value);
            let to = if value == jump_when { Some(target) } else { None };
            return Ok(self.branch_to(index, to, state));
        }

        let relation = match self.factory.get(condition) {
            Some(Value::Relation { .. }) => Some(condition),
            Some(Value::Variable { .. }) => {
                self.factory
                    .relation(condition, ValueId::TRUE, RelationType::Eq, false)
            }
            _ => None,
        };
        let Some(relation) = relation else {
            self.mark_branch(index, true, true);
            let mut successors = self.branch_to(index, Some(target), state.clone());
            successors.extend(self.branch_to(index, None, state));
            return Ok(successors);
        };
        let negation = self.factory.negate(relation);

        let mut true_state = state.clone();
        let true_feasible = true_state.apply_condition(relation, &self.ctx());
        let mut false_state = state;
        let false_feasible = false_state.apply_condition(negation, &self.ctx());
        self.mark_branch(index, true_feasible, false_feasible);

        let (true_to, false_to) = if jump_when {
            (Some(target), None)
        } else {
            (None, Some(target))
        };
        self.record_pruned(index, true_feasible, false_feasible);

        let mut successors = Vec::with_capacity(2);
        if true_feasible {
            successors.extend(self.branch_to(index, true_to, true_state));
        }
        if false_feasible {
            successors.extend(self.branch_to(index, false_to, false_state));
        }
        Ok(successors)
    }

    /// `Some(target)` jumps, `None` falls through
    fn branch_to(
        &self,
        index: usize,
        target: Option<usize>,
        state: MemoryState,
    ) -> Vec<InstructionState> {
        match target {
            Some(target) => vec![InstructionState::new(target, state)],
            None => self.next(index, state),
        }
    }

    fn apply_method_call(
        &mut self,
        index: usize,
        arg_count: usize,
        contract: &MethodContract,
        mut state: MemoryState,
    ) -> Result<Vec<InstructionState>> {
        let mut args = Vec::with_capacity(arg_count.min(state.stack_len()));
        for _ in 0..arg_count {
            args.push(state.pop(index)?);
        }
        args.reverse();

        for (position, arg) in args.iter().enumerate() {
            if !contract.param_requires_not_null(position) {
                continue;
            }
            // Past the call the argument was non-null, or the callee threw
            if !state.apply_not_null(*arg, &self.ctx()) {
                self.on_passing_null_argument(index);
            }
        }

        let qualifier = state.pop(index)?;
        if !state.apply_not_null(qualifier, &self.ctx()) {
            self.on_instruction_produces_npe(index);
            return Ok(Vec::new());
        }

        for value in state.stack_values() {
            let is_field = self
                .factory
                .descriptor(value)
                .map_or(false, |d| d.is_flushable_field());
            if is_field {
                self.detach_from_stack(value, &mut state);
            }
        }
        state.flush_fields(&self.ctx());

        let result = match contract.result {
            CallResult::Value(value) => {
                if !self.factory.contains(value) {
                    return Err(DfaError::InvalidValue(value));
                }
                value
            }
            CallResult::Unknown => ValueId::UNKNOWN,
        };
        state.push(result);
        Ok(self.next(index, state))
    }

    fn apply_type_cast(
        &mut self,
        index: usize,
        cast_type: TypeId,
        redundant: bool,
        mut state: MemoryState,
    ) -> Result<Vec<InstructionState>> {
        let operand = state.pop(index)?;
        if redundant {
            state.push(ValueId::UNKNOWN);
            return Ok(self.next(index, state));
        }

        let type_value = self.factory.type_value(cast_type);
        if let Some(relation) =
            self.factory
                .relation(operand, type_value, RelationType::InstanceOf, false)
        {
            let mut narrowed = state.clone();
            if narrowed.apply_instanceof_or_null(relation, &self.ctx()) {
                state = narrowed;
            } else {
                trace!(index, cast = %self.hierarchy.type_name(cast_type), "impossible cast");
                self.on_instruction_produces_cce(index);
            }
        }
        state.push(operand);
        Ok(self.next(index, state))
    }

    fn mark_branch(&mut self, index: usize, true_reachable: bool, false_reachable: bool) {
        if let Some(branch) = self.branches.get_mut(index) {
            branch.visited = true;
            branch.true_reachable |= true_reachable;
            branch.false_reachable |= false_reachable;
        }
    }

    fn mark_instanceof_failure(&mut self, index: usize) {
        if let Some(branch) = self.branches.get_mut(index) {
            branch.fails_for_non_null = true;
        }
    }

    /// No feasible outcome at all means the incoming state was contradictory
    fn record_pruned(&mut self, index: usize, true_feasible: bool, false_feasible: bool) {
        self.stats.pruned_branches += usize::from(!true_feasible) + usize::from(!false_feasible);
        if !true_feasible && !false_feasible {
            trace!(index, "condition has no feasible outcome");
            self.infeasible_conditions.insert(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataFlowConfig;
    use crate::features::data_flow::domain::VariableDescriptor;
    use crate::features::data_flow::infrastructure::{
        ClassHierarchy, ControlFlowBuilder, StateContext, ValueFactory,
    };
    use crate::shared::models::SourceAnchor;

    fn single_step(
        b: ControlFlowBuilder,
        index: usize,
        state: MemoryState,
    ) -> (Vec<InstructionState>, ValueFactory) {
        let flow = b.build().unwrap();
        let hierarchy = ClassHierarchy::new();
        let mut runner = DataFlowRunner::new(&flow, &hierarchy, DataFlowConfig::default());
        let instruction = flow.instruction(index).unwrap().clone();
        let out = runner.apply(index, &instruction, state).unwrap();
        (out, runner.factory.clone())
    }

    #[test]
    fn test_constant_fold_single_successor() {
        let mut b = ControlFlowBuilder::new();
        b.binop(BinaryOp::Eq, None).ret();
        let mut state = MemoryState::new();
        state.push(ValueId::NULL);
        state.push(ValueId::NULL);

        let (out, _) = single_step(b, 0, state);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].state.peek(), Some(ValueId::TRUE));
    }

    #[test]
    fn test_relation_forks_into_two() {
        let mut b = ControlFlowBuilder::new();
        let x = b.variable(VariableDescriptor::local("x"));
        b.binop(BinaryOp::Ne, None).ret();
        let mut state = MemoryState::new();
        state.push(x);
        state.push(ValueId::NULL);

        let (out, _) = single_step(b, 0, state);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].state.peek(), Some(ValueId::TRUE));
        assert_eq!(out[1].state.peek(), Some(ValueId::FALSE));
        assert_ne!(out[0].state, out[1].state);
    }

    #[test]
    fn test_unknown_condition_takes_both_edges() {
        let mut b = ControlFlowBuilder::new();
        let target = b.new_label();
        b.conditional_goto(target, false, None).pop();
        b.bind(target);
        b.ret();
        let mut state = MemoryState::new();
        state.push(ValueId::UNKNOWN);

        let (out, _) = single_step(b, 0, state);
        let targets: Vec<_> = out.iter().map(|s| s.index).collect();
        assert_eq!(targets, vec![2, 1]);
    }

    #[test]
    fn test_not_negates_relation() {
        let mut b = ControlFlowBuilder::new();
        let x = b.variable(VariableDescriptor::local("x"));
        let rel = b
            .factory_mut()
            .relation(x, ValueId::NULL, RelationType::Eq, false)
            .unwrap();
        b.not().ret();
        let mut state = MemoryState::new();
        state.push(rel);

        let (out, mut factory) = single_step(b, 0, state);
        assert_eq!(out[0].state.peek(), Some(factory.negate(rel)));
    }

    #[test]
    fn test_swap_and_dup() {
        let mut b = ControlFlowBuilder::new();
        b.emit(Instruction::Swap).dup().ret();
        let mut state = MemoryState::new();
        state.push(ValueId::TRUE);
        state.push(ValueId::FALSE);

        let (out, _) = single_step(b, 0, state);
        let mut swapped = out[0].state.clone();
        assert_eq!(swapped.pop(0), Ok(ValueId::TRUE));
        assert_eq!(swapped.pop(0), Ok(ValueId::FALSE));
    }

    #[test]
    fn test_null_qualifier_has_no_successor() {
        let mut b = ControlFlowBuilder::new();
        b.field_reference(SourceAnchor::new(1)).push(ValueId::NULL).pop().ret();
        let mut state = MemoryState::new();
        state.push(ValueId::NULL);

        let (out, _) = single_step(b, 0, state);
        assert!(out.is_empty());
    }

    #[test]
    fn test_ordering_of_constants_folds() {
        let mut b = ControlFlowBuilder::new();
        let three = b.constant(ConstValue::Int(3));
        let five = b.constant(ConstValue::Int(5));
        b.binop(BinaryOp::Ge, None).ret();
        let mut state = MemoryState::new();
        state.push(three);
        state.push(five);

        let (out, _) = single_step(b, 0, state);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].state.peek(), Some(ValueId::FALSE));
    }

    #[test]
    fn test_ordering_against_constant_forks() {
        let mut b = ControlFlowBuilder::new();
        let i = b.variable(VariableDescriptor::local("i"));
        let zero = b.constant(ConstValue::Int(0));
        b.binop(BinaryOp::Gt, None).ret();
        let mut state = MemoryState::new();
        state.push(i);
        state.push(zero);

        let (out, factory) = single_step(b, 0, state);
        assert_eq!(out.len(), 2);
        let hierarchy = ClassHierarchy::new();
        let ctx = StateContext::new(&factory, &hierarchy);
        assert_eq!(out[0].state.class_range(i, &ctx).min, 1);
        assert_eq!(out[1].state.class_range(i, &ctx).max, 0);
    }

    #[test]
    fn test_assign_replaces_stale_stack_slots() {
        let mut b = ControlFlowBuilder::new();
        let x = b.variable(VariableDescriptor::local("x"));
        b.assign(SourceAnchor::new(1)).ret();
        let mut state = MemoryState::new();
        state.push(x);
        state.push(x);
        state.push(ValueId::NULL);

        let (out, _) = single_step(b, 0, state);
        let mut after = out[0].state.clone();
        assert_eq!(after.pop(0), Ok(x));
        assert_eq!(after.pop(0), Ok(ValueId::UNKNOWN));
    }

    #[test]
    fn test_gosub_and_return() {
        let mut b = ControlFlowBuilder::new();
        let sub = b.new_label();
        b.gosub(sub).ret();
        b.bind(sub);
        b.return_from_sub();
        let flow = b.build().unwrap();
        let hierarchy = ClassHierarchy::new();
        let mut runner = DataFlowRunner::new(&flow, &hierarchy, DataFlowConfig::default());

        let out = runner
            .apply(0, flow.instruction(0).unwrap(), MemoryState::new())
            .unwrap();
        assert_eq!(out[0].index, 2);
        let back = runner
            .apply(2, flow.instruction(2).unwrap(), out[0].state.clone())
            .unwrap();
        assert_eq!(back[0].index, 1);
    }
}
