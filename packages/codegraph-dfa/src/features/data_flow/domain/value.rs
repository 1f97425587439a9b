/*
 * Symbolic Values
 *
 * Immutable values the interpreter threads through memory states:
 * - Constants (null, booleans, literals)
 * - Variables (identity only, facts live in the memory state)
 * - Relations (binary predicates, usable as stack value and as condition)
 * - Types (right operand of instanceof)
 * - New / NotNull (non-null values of a known static type)
 * - Unknown (top)
 *
 * Values are interned by the ValueFactory; a ValueId is an index into that
 * arena, so identity comparison is a u32 comparison.
 */

use serde::{Deserialize, Serialize};

/// Handle into a `ValueFactory`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

impl ValueId {
    /// Always index 0 of every factory
    pub const UNKNOWN: ValueId = ValueId(0);
    /// The null constant
    pub const NULL: ValueId = ValueId(1);
    /// `true` constant
    pub const TRUE: ValueId = ValueId(2);
    /// `false` constant
    pub const FALSE: ValueId = ValueId(3);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a type known to the `TypeHierarchy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

/// Literal constant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ConstValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ConstValue::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Null => write!(f, "null"),
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Declared nullability annotation of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nullability {
    /// `@NotNull`: assigning a nullable value is a contract violation
    NotNull,
    /// `@Nullable`: dereference requires a null check first
    Nullable,
    /// No annotation
    #[default]
    Unknown,
}

/// Storage class of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Local,
    Parameter,
    /// Heap-reachable; facts are dropped after opaque calls
    Field,
}

/// Identity of a program variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub name: String,
    pub kind: VariableKind,
    #[serde(default)]
    pub nullability: Nullability,
    #[serde(default)]
    pub declared_type: Option<TypeId>,
    /// Final fields survive `flush_fields`
    #[serde(default)]
    pub is_final: bool,
}

impl VariableDescriptor {
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Local)
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Parameter)
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(name, VariableKind::Field)
    }

    fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullability: Nullability::Unknown,
            declared_type: None,
            is_final: false,
        }
    }

    pub fn with_nullability(mut self, nullability: Nullability) -> Self {
        self.nullability = nullability;
        self
    }

    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    /// Field whose facts may be invalidated by an opaque call
    pub fn is_flushable_field(&self) -> bool {
        self.kind == VariableKind::Field && !self.is_final
    }
}

/// Relation operator. `!=` is stored as negated `Eq`; `>` as swapped `Lt`,
/// `>=` and `<=` as negated `Lt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Eq,
    Ne,
    InstanceOf,
    /// Integer `<`
    Lt,
}

impl RelationType {
    pub fn symbol(&self) -> &'static str {
        match self {
            RelationType::Eq => "==",
            RelationType::Ne => "!=",
            RelationType::InstanceOf => "instanceof",
            RelationType::Lt => "<",
        }
    }
}

/// Interned symbolic value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "value", rename_all = "snake_case")]
pub enum Value {
    Unknown,
    Constant { constant: ConstValue },
    Variable { descriptor: VariableDescriptor },
    Relation {
        left: ValueId,
        right: ValueId,
        /// Never `Ne` once interned
        op: RelationType,
        negated: bool,
    },
    Type { ty: TypeId },
    /// Fresh allocation of exact type `ty`
    New { ty: TypeId, site: u32 },
    NotNull { ty: Option<TypeId> },
}

impl Value {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn as_constant(&self) -> Option<&ConstValue> {
        match self {
            Value::Constant { constant } => Some(constant),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableDescriptor> {
        match self {
            Value::Variable { descriptor } => Some(descriptor),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Value::Variable { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Constant { .. })
    }

    /// Variables and constants take part in equivalence classes
    pub fn is_class_member(&self) -> bool {
        self.is_variable() || self.is_constant()
    }

    /// Statically non-null without consulting any state
    pub fn is_statically_not_null(&self) -> bool {
        match self {
            Value::New { .. } | Value::NotNull { .. } | Value::Type { .. } => true,
            Value::Constant { constant } => !constant.is_null(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builders() {
        let field = VariableDescriptor::field("name")
            .with_nullability(Nullability::Nullable)
            .with_type(TypeId(4));
        assert!(field.is_flushable_field());
        assert_eq!(field.declared_type, Some(TypeId(4)));

        let constant = VariableDescriptor::field("INSTANCE").with_final(true);
        assert!(!constant.is_flushable_field());
        assert!(!VariableDescriptor::local("x").is_flushable_field());
    }

    #[test]
    fn test_static_nullness() {
        assert!(Value::New { ty: TypeId(1), site: 0 }.is_statically_not_null());
        assert!(Value::Constant {
            constant: ConstValue::Int(3)
        }
        .is_statically_not_null());
        assert!(!Value::Constant {
            constant: ConstValue::Null
        }
        .is_statically_not_null());
        assert!(!Value::Unknown.is_statically_not_null());
    }

    #[test]
    fn test_value_json_shape() {
        let value = Value::Constant {
            constant: ConstValue::Bool(true),
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            json,
            r#"{"value":"constant","constant":{"kind":"bool","value":true}}"#
        );
    }
}
