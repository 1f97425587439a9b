/*
 * Control Flow
 *
 * A linearized method body: the instruction sequence plus the value factory
 * its operands were interned in. Instruction indices are stable; jumps refer
 * to them directly.
 *
 * ControlFlowBuilder is the label/fixup front end linearizers (and tests)
 * use to emit forward jumps before the target index is known.
 */

use crate::errors::{DfaError, Result};
use crate::features::data_flow::domain::{
    BinaryOp, CallResult, ConstValue, Instruction, MethodContract, TypeId, ValueId,
    VariableDescriptor,
};
use crate::features::data_flow::infrastructure::ValueFactory;
use crate::shared::models::SourceAnchor;
use serde::{Deserialize, Serialize};

/// Validated instruction sequence of one method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlow {
    instructions: Vec<Instruction>,
    factory: ValueFactory,
}

impl ControlFlow {
    pub fn new(instructions: Vec<Instruction>, factory: ValueFactory) -> Result<Self> {
        let flow = Self {
            instructions,
            factory,
        };
        flow.validate()?;
        Ok(flow)
    }

    /// Check jump targets, value operands and relation operands.
    ///
    /// Called again by the runner, since deserialized programs skip `new`.
    pub fn validate(&self) -> Result<()> {
        self.factory.validate()?;
        let len = self.instructions.len();
        for (index, instruction) in self.instructions.iter().enumerate() {
            if let Some(target) = instruction.jump_target() {
                if target >= len {
                    return Err(DfaError::InvalidJumpTarget {
                        instruction: index,
                        target,
                        len,
                    });
                }
            }
            let operand = match instruction {
                Instruction::Push { value, .. } => Some(*value),
                Instruction::FlushVariable { variable } => *variable,
                Instruction::MethodCall {
                    contract:
                        MethodContract {
                            result: CallResult::Value(value),
                            ..
                        },
                    ..
                } => Some(*value),
                _ => None,
            };
            if let Some(value) = operand {
                if !self.factory.contains(value) {
                    return Err(DfaError::InvalidValue(value));
                }
            }
        }
        Ok(())
    }

    pub fn instruction(&self, index: usize) -> Result<&Instruction> {
        self.instructions
            .get(index)
            .ok_or(DfaError::InstructionOutOfRange {
                index,
                len: self.instructions.len(),
            })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn factory(&self) -> &ValueFactory {
        &self.factory
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl std::fmt::Display for ControlFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, instruction) in self.instructions.iter().enumerate() {
            match instruction {
                Instruction::Push { value, .. } => {
                    writeln!(f, "{:>4}: push {}", index, self.factory.describe(*value))?
                }
                other => writeln!(f, "{:>4}: {}", index, other)?,
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════

/// Forward-reference handle for a jump target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Emits instructions and patches jumps once labels are bound
///
/// # Example
/// ```
/// use codegraph_dfa::{ControlFlowBuilder, BinaryOp, SourceAnchor, VariableDescriptor};
///
/// let mut b = ControlFlowBuilder::new();
/// let x = b.variable(VariableDescriptor::local("x"));
/// let null = b.null();
/// let end = b.new_label();
/// b.push(x).push(null).binop(BinaryOp::Eq, None);
/// b.conditional_goto(end, false, None);
/// b.push(x).field_reference(SourceAnchor::new(1));
/// b.bind(end);
/// b.ret();
/// let flow = b.build().unwrap();
/// assert_eq!(flow.len(), 7);
/// ```
#[derive(Debug, Default)]
pub struct ControlFlowBuilder {
    instructions: Vec<Instruction>,
    factory: ValueFactory,
    labels: Vec<Option<usize>>,
    fixups: Vec<(usize, Label)>,
}

impl ControlFlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue interning into an existing factory
    pub fn with_factory(factory: ValueFactory) -> Self {
        Self {
            factory,
            ..Self::default()
        }
    }

    pub fn factory_mut(&mut self) -> &mut ValueFactory {
        &mut self.factory
    }

    /// Index the next emitted instruction will get
    pub fn next_index(&self) -> usize {
        self.instructions.len()
    }

    // ───────────────────────────────────────────────────────────────────────
    // Values
    // ───────────────────────────────────────────────────────────────────────

    pub fn variable(&mut self, descriptor: VariableDescriptor) -> ValueId {
        self.factory.variable(descriptor)
    }

    pub fn null(&self) -> ValueId {
        self.factory.null()
    }

    pub fn boolean(&self, value: bool) -> ValueId {
        self.factory.boolean(value)
    }

    pub fn constant(&mut self, constant: ConstValue) -> ValueId {
        self.factory.constant(constant)
    }

    pub fn type_value(&mut self, ty: TypeId) -> ValueId {
        self.factory.type_value(ty)
    }

    /// Fresh allocation; the site is the current instruction index
    pub fn new_value(&mut self, ty: TypeId) -> ValueId {
        let site = self.instructions.len() as u32;
        self.factory.new_value(ty, site)
    }

    // ───────────────────────────────────────────────────────────────────────
    // Labels
    // ───────────────────────────────────────────────────────────────────────

    pub fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the next instruction index
    pub fn bind(&mut self, label: Label) -> &mut Self {
        if let Some(slot) = self.labels.get_mut(label.0) {
            *slot = Some(self.instructions.len());
        }
        self
    }

    // ───────────────────────────────────────────────────────────────────────
    // Instructions
    // ───────────────────────────────────────────────────────────────────────

    pub fn emit(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    fn emit_jump(&mut self, instruction: Instruction, label: Label) -> &mut Self {
        self.fixups.push((self.instructions.len(), label));
        self.emit(instruction)
    }

    pub fn push(&mut self, value: ValueId) -> &mut Self {
        self.emit(Instruction::push(value))
    }

    pub fn pop(&mut self) -> &mut Self {
        self.emit(Instruction::Pop)
    }

    pub fn dup(&mut self) -> &mut Self {
        self.emit(Instruction::Dup)
    }

    pub fn not(&mut self) -> &mut Self {
        self.emit(Instruction::Not)
    }

    pub fn assign(&mut self, anchor: SourceAnchor) -> &mut Self {
        self.emit(Instruction::assign(anchor))
    }

    pub fn binop(&mut self, op: BinaryOp, anchor: Option<SourceAnchor>) -> &mut Self {
        self.emit(Instruction::binop(op, anchor))
    }

    pub fn field_reference(&mut self, anchor: SourceAnchor) -> &mut Self {
        self.emit(Instruction::field_reference(anchor))
    }

    pub fn method_call(
        &mut self,
        arg_count: usize,
        contract: MethodContract,
        anchor: SourceAnchor,
    ) -> &mut Self {
        self.emit(Instruction::method_call(arg_count, contract, anchor))
    }

    pub fn type_cast(&mut self, ty: TypeId, redundant: bool, anchor: SourceAnchor) -> &mut Self {
        self.emit(Instruction::type_cast(ty, redundant, anchor))
    }

    pub fn check_return_value(&mut self, not_null: bool, anchor: SourceAnchor) -> &mut Self {
        self.emit(Instruction::CheckReturnValue {
            not_null,
            anchor: Some(anchor),
        })
    }

    pub fn flush(&mut self, variable: Option<ValueId>) -> &mut Self {
        self.emit(Instruction::FlushVariable { variable })
    }

    pub fn ret(&mut self) -> &mut Self {
        self.emit(Instruction::Return)
    }

    pub fn goto(&mut self, label: Label) -> &mut Self {
        self.emit_jump(Instruction::Goto { target: 0 }, label)
    }

    /// Jump to `label` when the popped condition is true (false if `negated`)
    pub fn conditional_goto(
        &mut self,
        label: Label,
        negated: bool,
        anchor: Option<SourceAnchor>,
    ) -> &mut Self {
        self.emit_jump(
            Instruction::ConditionalGoto {
                target: 0,
                negated,
                anchor,
            },
            label,
        )
    }

    pub fn gosub(&mut self, label: Label) -> &mut Self {
        self.emit_jump(Instruction::Gosub { target: 0 }, label)
    }

    pub fn return_from_sub(&mut self) -> &mut Self {
        self.emit(Instruction::ReturnFromSub)
    }

    /// Patch jumps and validate
    pub fn build(self) -> Result<ControlFlow> {
        let Self {
            mut instructions,
            factory,
            labels,
            fixups,
        } = self;
        for (index, label) in fixups {
            let target = labels
                .get(label.0)
                .copied()
                .flatten()
                .ok_or(DfaError::UnboundLabel { label: label.0 })?;
            if let Some(instruction) = instructions.get_mut(index) {
                instruction.set_jump_target(target);
            }
        }
        ControlFlow::new(instructions, factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_patches_forward_jumps() {
        let mut b = ControlFlowBuilder::new();
        let end = b.new_label();
        b.goto(end);
        b.push(ValueId::NULL).pop();
        b.bind(end);
        b.ret();
        let flow = b.build().unwrap();
        assert_eq!(flow.instruction(0).unwrap().jump_target(), Some(3));
    }

    #[test]
    fn test_unbound_label_fails() {
        let mut b = ControlFlowBuilder::new();
        let nowhere = b.new_label();
        b.goto(nowhere);
        assert_eq!(b.build().unwrap_err(), DfaError::UnboundLabel { label: 0 });
    }

    #[test]
    fn test_label_at_end_is_invalid_target() {
        let mut b = ControlFlowBuilder::new();
        let end = b.new_label();
        b.goto(end);
        b.bind(end);
        assert!(matches!(
            b.build(),
            Err(DfaError::InvalidJumpTarget { target: 1, len: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_value_rejected() {
        let result = ControlFlow::new(vec![Instruction::push(ValueId(99))], ValueFactory::new());
        assert_eq!(result.unwrap_err(), DfaError::InvalidValue(ValueId(99)));
    }

    #[test]
    fn test_out_of_range_lookup() {
        let flow = ControlFlow::new(vec![Instruction::Return], ValueFactory::new()).unwrap();
        assert_eq!(
            flow.instruction(1).unwrap_err(),
            DfaError::InstructionOutOfRange { index: 1, len: 1 }
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let mut b = ControlFlowBuilder::new();
        let x = b.variable(VariableDescriptor::local("x"));
        b.push(x).field_reference(SourceAnchor::new(3));
        let flow = b.build().unwrap();

        let json = serde_json::to_string(&flow).unwrap();
        let back: ControlFlow = serde_json::from_str(&json).unwrap();
        assert!(back.validate().is_ok());
        assert_eq!(back.instructions(), flow.instructions());
        assert_eq!(back.factory().descriptor(x).map(|d| d.name.as_str()), Some("x"));
    }

    #[test]
    fn test_shifted_value_table_is_rejected() {
        let mut b = ControlFlowBuilder::new();
        let x = b.variable(VariableDescriptor::local("x"));
        b.push(x).field_reference(SourceAnchor::new(3));
        let flow = b.build().unwrap();

        let mut json = serde_json::to_value(&flow).unwrap();
        json["factory"].as_array_mut().unwrap().remove(0);
        assert!(serde_json::from_value::<ControlFlow>(json).is_err());
    }

    #[test]
    fn test_dangling_relation_operand_rejected() {
        let mut b = ControlFlowBuilder::new();
        b.push(ValueId::NULL).pop();
        let flow = b.build().unwrap();

        let mut json = serde_json::to_value(&flow).unwrap();
        json["factory"].as_array_mut().unwrap().push(serde_json::json!({
            "value": "relation",
            "left": 42,
            "right": 1,
            "op": "eq",
            "negated": false
        }));
        let err = serde_json::from_value::<ControlFlow>(json).unwrap_err();
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_display_listing() {
        let mut b = ControlFlowBuilder::new();
        let x = b.variable(VariableDescriptor::local("x"));
        b.push(x).pop();
        let listing = b.build().unwrap().to_string();
        assert!(listing.contains("0: push x"));
        assert!(listing.contains("1: pop"));
    }
}
