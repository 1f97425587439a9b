//! Test data builders
//!
//! `MethodBuilder` emits the instruction patterns a linearizer produces for
//! common statements, handing out a fresh anchor per reportable element.

use codegraph_dfa::{
    BinaryOp, CallResult, ConstValue, ControlFlow, ControlFlowBuilder, Label, MethodContract,
    Nullability, SourceAnchor, TypeId, ValueId, VariableDescriptor,
};

/// Builder for method bodies
#[derive(Debug, Default)]
pub struct MethodBuilder {
    inner: ControlFlowBuilder,
    next_anchor: u64,
}

impl MethodBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&mut self) -> &mut ControlFlowBuilder {
        &mut self.inner
    }

    fn anchor(&mut self) -> SourceAnchor {
        self.next_anchor += 1;
        SourceAnchor::new(self.next_anchor)
    }

    // Values

    pub fn local(&mut self, name: &str) -> ValueId {
        self.inner.variable(VariableDescriptor::local(name))
    }

    pub fn typed_local(&mut self, name: &str, ty: TypeId) -> ValueId {
        self.inner
            .variable(VariableDescriptor::local(name).with_type(ty))
    }

    pub fn not_null_local(&mut self, name: &str) -> ValueId {
        self.inner
            .variable(VariableDescriptor::local(name).with_nullability(Nullability::NotNull))
    }

    pub fn param(&mut self, name: &str, nullability: Nullability) -> ValueId {
        self.inner
            .variable(VariableDescriptor::parameter(name).with_nullability(nullability))
    }

    pub fn field(&mut self, name: &str, nullability: Nullability, is_final: bool) -> ValueId {
        self.inner.variable(
            VariableDescriptor::field(name)
                .with_nullability(nullability)
                .with_final(is_final),
        )
    }

    /// `this`: non-null, no static type
    pub fn this(&mut self) -> ValueId {
        self.inner.factory_mut().not_null(None)
    }

    pub fn fresh(&mut self, ty: TypeId) -> ValueId {
        self.inner.new_value(ty)
    }

    pub fn type_value(&mut self, ty: TypeId) -> ValueId {
        self.inner.type_value(ty)
    }

    pub fn int(&mut self, value: i64) -> ValueId {
        self.inner.constant(ConstValue::Int(value))
    }

    // Statements

    /// `dest = src;`
    pub fn assign(&mut self, dest: ValueId, src: ValueId) -> SourceAnchor {
        let anchor = self.anchor();
        self.inner.push(dest).push(src).assign(anchor).pop();
        anchor
    }

    /// Push `(dest = src)`: the assignment's value stays on the stack
    pub fn assign_expr(&mut self, dest: ValueId, src: ValueId) -> SourceAnchor {
        let anchor = self.anchor();
        self.inner.push(dest).push(src).assign(anchor);
        anchor
    }

    /// `value.field` (value discarded)
    pub fn deref(&mut self, value: ValueId) -> SourceAnchor {
        let anchor = self.anchor();
        self.inner.push(value).field_reference(anchor);
        anchor
    }

    /// Push `left op right`; the boolean stays on the stack
    pub fn compare(&mut self, left: ValueId, op: BinaryOp, right: ValueId) -> SourceAnchor {
        let anchor = self.anchor();
        self.inner.push(left).push(right).binop(op, Some(anchor));
        anchor
    }

    pub fn label(&mut self) -> Label {
        self.inner.new_label()
    }

    pub fn bind(&mut self, label: Label) {
        self.inner.bind(label);
    }

    /// Pop the condition, jump when it is true
    pub fn jump_if_true(&mut self, label: Label) {
        self.inner.conditional_goto(label, false, None);
    }

    /// Pop the condition, jump when it is false
    pub fn jump_if_false(&mut self, label: Label) {
        self.inner.conditional_goto(label, true, None);
    }

    pub fn goto(&mut self, label: Label) {
        self.inner.goto(label);
    }

    /// `qualifier.m(args...);` (result discarded)
    pub fn call(
        &mut self,
        qualifier: ValueId,
        args: &[ValueId],
        not_null_params: Vec<bool>,
        result: CallResult,
    ) -> SourceAnchor {
        let anchor = self.anchor();
        self.inner.push(qualifier);
        for arg in args {
            self.inner.push(*arg);
        }
        self.inner
            .method_call(
                args.len(),
                MethodContract {
                    not_null_params,
                    result,
                },
                anchor,
            )
            .pop();
        anchor
    }

    /// `(T) value;` (result discarded)
    pub fn cast(&mut self, value: ValueId, ty: TypeId, redundant: bool) -> SourceAnchor {
        let anchor = self.anchor();
        self.inner.push(value).type_cast(ty, redundant, anchor).pop();
        anchor
    }

    /// `return value;` from a method declared `@NotNull` or not
    pub fn return_value(&mut self, value: ValueId, not_null: bool) -> SourceAnchor {
        let anchor = self.anchor();
        self.inner.push(value).check_return_value(not_null, anchor).ret();
        anchor
    }

    pub fn ret(&mut self) {
        self.inner.ret();
    }

    /// Build the final ControlFlow
    pub fn build(self) -> ControlFlow {
        self.inner.build().expect("well-formed test program")
    }
}
