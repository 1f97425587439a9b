/*
 * Instruction Set
 *
 * Closed tagged union of the linearized method body. Each variant carries
 * only immutable operands; `SourceAnchor`s are for reporting and are never
 * consulted during symbolic execution.
 *
 * Stack conventions (top of stack on the right):
 *   Push(v)            ... -> ... v
 *   Assign             ... dest src -> ... dest
 *   Binop              ... left right -> ... bool
 *   FieldReference     ... qualifier -> ...
 *   MethodCall(n)      ... qualifier a1..an -> ... result
 *   TypeCast           ... operand -> ... operand'
 */

use super::value::{TypeId, ValueId};
use crate::shared::models::SourceAnchor;
use serde::{Deserialize, Serialize};

/// Binary operator of a `Binop`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    Ne,
    InstanceOf,
    /// Integer ordering, interned as (possibly swapped or negated) `<`
    Lt,
    Le,
    Gt,
    Ge,
    /// String concatenation, always non-null
    Concat,
    /// Arithmetic operators the engine does not model
    Other,
}

impl BinaryOp {
    /// Operators that produce a relation and may fork the state
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::InstanceOf
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
        )
    }
}

/// What a call returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallResult {
    /// Nothing is known about the result
    #[default]
    Unknown,
    /// Pushes the given (usually `New` or `NotNull`) value
    Value(ValueId),
}

/// Nullability contract of the invoked method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MethodContract {
    /// Positional `@NotNull` flags of the parameters
    #[serde(default)]
    pub not_null_params: Vec<bool>,
    #[serde(default)]
    pub result: CallResult,
}

impl MethodContract {
    pub fn param_requires_not_null(&self, index: usize) -> bool {
        self.not_null_params.get(index).copied().unwrap_or(false)
    }
}

/// One unit of the linearized program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    Push {
        value: ValueId,
        #[serde(default)]
        anchor: Option<SourceAnchor>,
    },
    Pop,
    Dup,
    Swap,
    Assign {
        #[serde(default)]
        anchor: Option<SourceAnchor>,
    },
    Binop {
        op: BinaryOp,
        #[serde(default)]
        anchor: Option<SourceAnchor>,
    },
    Not,
    ConditionalGoto {
        target: usize,
        /// Jump when the condition is false
        #[serde(default)]
        negated: bool,
        #[serde(default)]
        anchor: Option<SourceAnchor>,
    },
    Goto {
        target: usize,
    },
    Return,
    EmptyStack,
    /// Forget one variable, or every variable when `None`
    FlushVariable {
        #[serde(default)]
        variable: Option<ValueId>,
    },
    FieldReference {
        #[serde(default)]
        anchor: Option<SourceAnchor>,
    },
    MethodCall {
        arg_count: usize,
        #[serde(default)]
        contract: MethodContract,
        #[serde(default)]
        anchor: Option<SourceAnchor>,
    },
    TypeCast {
        cast_type: TypeId,
        /// Decided by a syntactic check outside the engine
        #[serde(default)]
        redundant: bool,
        #[serde(default)]
        anchor: Option<SourceAnchor>,
    },
    CheckReturnValue {
        /// Enclosing method is declared `@NotNull`
        not_null: bool,
        #[serde(default)]
        anchor: Option<SourceAnchor>,
    },
    Gosub {
        target: usize,
    },
    ReturnFromSub,
}

impl Instruction {
    pub fn push(value: ValueId) -> Self {
        Instruction::Push {
            value,
            anchor: None,
        }
    }

    pub fn assign(anchor: SourceAnchor) -> Self {
        Instruction::Assign {
            anchor: Some(anchor),
        }
    }

    pub fn binop(op: BinaryOp, anchor: Option<SourceAnchor>) -> Self {
        Instruction::Binop { op, anchor }
    }

    pub fn field_reference(anchor: SourceAnchor) -> Self {
        Instruction::FieldReference {
            anchor: Some(anchor),
        }
    }

    pub fn method_call(arg_count: usize, contract: MethodContract, anchor: SourceAnchor) -> Self {
        Instruction::MethodCall {
            arg_count,
            contract,
            anchor: Some(anchor),
        }
    }

    pub fn type_cast(cast_type: TypeId, redundant: bool, anchor: SourceAnchor) -> Self {
        Instruction::TypeCast {
            cast_type,
            redundant,
            anchor: Some(anchor),
        }
    }

    /// Diagnostic anchor, if the instruction carries one
    pub fn anchor(&self) -> Option<SourceAnchor> {
        match self {
            Instruction::Push { anchor, .. }
            | Instruction::Assign { anchor }
            | Instruction::Binop { anchor, .. }
            | Instruction::ConditionalGoto { anchor, .. }
            | Instruction::FieldReference { anchor }
            | Instruction::MethodCall { anchor, .. }
            | Instruction::TypeCast { anchor, .. }
            | Instruction::CheckReturnValue { anchor, .. } => *anchor,
            _ => None,
        }
    }

    /// Explicit jump target, used to validate the program
    pub fn jump_target(&self) -> Option<usize> {
        match self {
            Instruction::ConditionalGoto { target, .. }
            | Instruction::Goto { target }
            | Instruction::Gosub { target } => Some(*target),
            _ => None,
        }
    }

    /// Rewrite the jump target. Only the builder calls this, before the
    /// program is frozen.
    pub(crate) fn set_jump_target(&mut self, new_target: usize) {
        match self {
            Instruction::ConditionalGoto { target, .. }
            | Instruction::Goto { target }
            | Instruction::Gosub { target } => *target = new_target,
            _ => {}
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Push { .. } => "push",
            Instruction::Pop => "pop",
            Instruction::Dup => "dup",
            Instruction::Swap => "swap",
            Instruction::Assign { .. } => "assign",
            Instruction::Binop { .. } => "binop",
            Instruction::Not => "not",
            Instruction::ConditionalGoto { .. } => "cond_goto",
            Instruction::Goto { .. } => "goto",
            Instruction::Return => "return",
            Instruction::EmptyStack => "empty_stack",
            Instruction::FlushVariable { .. } => "flush_variable",
            Instruction::FieldReference { .. } => "field_reference",
            Instruction::MethodCall { .. } => "method_call",
            Instruction::TypeCast { .. } => "type_cast",
            Instruction::CheckReturnValue { .. } => "check_return_value",
            Instruction::Gosub { .. } => "gosub",
            Instruction::ReturnFromSub => "return_from_sub",
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Push { value, .. } => write!(f, "push {:?}", value),
            Instruction::Binop { op, .. } => write!(f, "binop {:?}", op),
            Instruction::ConditionalGoto {
                target, negated, ..
            } => write!(
                f,
                "cond_goto {}{}",
                if *negated { "!" } else { "" },
                target
            ),
            Instruction::Goto { target } => write!(f, "goto {}", target),
            Instruction::Gosub { target } => write!(f, "gosub {}", target),
            Instruction::MethodCall { arg_count, .. } => write!(f, "method_call/{}", arg_count),
            Instruction::TypeCast { cast_type, .. } => write!(f, "type_cast {:?}", cast_type),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_targets() {
        let mut goto = Instruction::Goto { target: 3 };
        assert_eq!(goto.jump_target(), Some(3));
        goto.set_jump_target(7);
        assert_eq!(goto.jump_target(), Some(7));
        assert_eq!(Instruction::Pop.jump_target(), None);
    }

    #[test]
    fn test_anchor_lookup() {
        let anchor = SourceAnchor::new(42);
        assert_eq!(Instruction::field_reference(anchor).anchor(), Some(anchor));
        assert_eq!(Instruction::Pop.anchor(), None);
    }

    #[test]
    fn test_instruction_json_roundtrip() {
        let instruction = Instruction::ConditionalGoto {
            target: 4,
            negated: true,
            anchor: None,
        };
        let json = serde_json::to_string(&instruction).unwrap();
        assert!(json.contains(r#""kind":"conditional_goto""#));
        let back: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, instruction);
    }

    #[test]
    fn test_contract_defaults() {
        let contract = MethodContract {
            not_null_params: vec![false, true],
            result: CallResult::Unknown,
        };
        assert!(contract.param_requires_not_null(1));
        assert!(!contract.param_requires_not_null(0));
        assert!(!contract.param_requires_not_null(5));
    }
}
