/*
 * Value Factory
 *
 * Per-analysis interning arena for symbolic values. Structurally identical
 * requests return the same ValueId, so identity comparison is enough
 * everywhere else in the engine.
 *
 * Layout:
 *   values[0] = Unknown
 *   values[1] = null
 *   values[2] = true
 *   values[3] = false
 *
 * A factory is built together with its ControlFlow and cloned into each
 * runner, so relations created during one run never leak into another.
 */

use crate::errors::{DfaError, Result};
use crate::features::data_flow::domain::{
    ConstValue, RelationType, TypeId, Value, ValueId, VariableDescriptor,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Interning statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InternerStats {
    /// Every `intern` request
    pub requests: usize,
    /// Requests that created a new value
    pub unique_values: usize,
}

/// Interning arena for `Value`s
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct ValueFactory {
    values: Vec<Value>,
    index: FxHashMap<Value, ValueId>,
    stats: InternerStats,
}

impl Default for ValueFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueFactory {
    pub fn new() -> Self {
        let mut factory = Self {
            values: Vec::with_capacity(64),
            index: FxHashMap::default(),
            stats: InternerStats::default(),
        };
        factory.intern(Value::Unknown);
        factory.intern(Value::Constant {
            constant: ConstValue::Null,
        });
        factory.intern(Value::Constant {
            constant: ConstValue::Bool(true),
        });
        factory.intern(Value::Constant {
            constant: ConstValue::Bool(false),
        });
        factory
    }

    fn intern(&mut self, value: Value) -> ValueId {
        self.stats.requests += 1;
        if let Some(&id) = self.index.get(&value) {
            return id;
        }
        let id = ValueId(self.values.len() as u32);
        self.values.push(value.clone());
        self.index.insert(value, id);
        self.stats.unique_values += 1;
        id
    }

    // ───────────────────────────────────────────────────────────────────────
    // Constructors
    // ───────────────────────────────────────────────────────────────────────

    pub fn unknown(&self) -> ValueId {
        ValueId::UNKNOWN
    }

    pub fn null(&self) -> ValueId {
        ValueId::NULL
    }

    pub fn boolean(&self, value: bool) -> ValueId {
        if value {
            ValueId::TRUE
        } else {
            ValueId::FALSE
        }
    }

    pub fn constant(&mut self, constant: ConstValue) -> ValueId {
        self.intern(Value::Constant { constant })
    }

    pub fn variable(&mut self, descriptor: VariableDescriptor) -> ValueId {
        self.intern(Value::Variable { descriptor })
    }

    pub fn type_value(&mut self, ty: TypeId) -> ValueId {
        self.intern(Value::Type { ty })
    }

    /// Fresh allocation of exact type `ty` at allocation site `site`
    pub fn new_value(&mut self, ty: TypeId, site: u32) -> ValueId {
        self.intern(Value::New { ty, site })
    }

    pub fn not_null(&mut self, ty: Option<TypeId>) -> ValueId {
        self.intern(Value::NotNull { ty })
    }

    /// Build `left op right` (negated when `negated`).
    ///
    /// Returns `None` when the operator does not apply to the operands:
    /// unknown operands, types or relations on the left, anything but a
    /// type on the right of `instanceof`.
    ///
    /// `!=` is canonicalized to a negated `==`. Callers express `>`, `>=`
    /// and `<=` through swapped and/or negated `Lt`.
    pub fn relation(
        &mut self,
        left: ValueId,
        right: ValueId,
        op: RelationType,
        negated: bool,
    ) -> Option<ValueId> {
        let left_value = self.get(left)?;
        let right_value = self.get(right)?;

        if left_value.is_unknown() || right_value.is_unknown() {
            return None;
        }
        if matches!(left_value, Value::Type { .. } | Value::Relation { .. }) {
            return None;
        }

        let (op, negated) = match op {
            RelationType::InstanceOf => {
                if !matches!(right_value, Value::Type { .. }) {
                    return None;
                }
                (RelationType::InstanceOf, negated)
            }
            RelationType::Eq | RelationType::Ne | RelationType::Lt => {
                if matches!(right_value, Value::Type { .. } | Value::Relation { .. }) {
                    return None;
                }
                match op {
                    RelationType::Ne => (RelationType::Eq, !negated),
                    op => (op, negated),
                }
            }
        };

        Some(self.intern(Value::Relation {
            left,
            right,
            op,
            negated,
        }))
    }

    /// Flip the negated flag of a relation; other values are returned as is
    pub fn negate(&mut self, relation: ValueId) -> ValueId {
        match self.get(relation) {
            Some(Value::Relation {
                left,
                right,
                op,
                negated,
            }) => {
                let negated_relation = Value::Relation {
                    left: *left,
                    right: *right,
                    op: *op,
                    negated: !*negated,
                };
                self.intern(negated_relation)
            }
            _ => relation,
        }
    }

    // ───────────────────────────────────────────────────────────────────────
    // Queries
    // ───────────────────────────────────────────────────────────────────────

    pub fn get(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id.index())
    }

    /// Like `get`, but an unregistered id is an internal error
    pub fn value(&self, id: ValueId) -> Result<&Value> {
        self.get(id).ok_or(DfaError::InvalidValue(id))
    }

    pub fn contains(&self, id: ValueId) -> bool {
        id.index() < self.values.len()
    }

    pub fn descriptor(&self, id: ValueId) -> Option<&VariableDescriptor> {
        self.get(id).and_then(Value::as_variable)
    }

    pub fn is_variable(&self, id: ValueId) -> bool {
        self.get(id).map_or(false, Value::is_variable)
    }

    pub fn is_constant(&self, id: ValueId) -> bool {
        self.get(id).map_or(false, Value::is_constant)
    }

    pub fn is_unknown(&self, id: ValueId) -> bool {
        self.get(id).map_or(true, Value::is_unknown)
    }

    /// All registered variables, in id order
    pub fn variables(&self) -> impl Iterator<Item = (ValueId, &VariableDescriptor)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_variable().map(|d| (ValueId(i as u32), d)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> &InternerStats {
        &self.stats
    }

    /// Relations only refer to values registered before them
    pub fn validate(&self) -> Result<()> {
        for (index, value) in self.values.iter().enumerate() {
            if let Value::Relation { left, right, .. } = value {
                if let Some(operand) = [*left, *right].into_iter().find(|v| v.index() >= index) {
                    return Err(DfaError::InvalidValue(operand));
                }
            }
        }
        Ok(())
    }

    /// Human-readable rendering, for traces and test failures
    pub fn describe(&self, id: ValueId) -> String {
        match self.get(id) {
            None => format!("<invalid {:?}>", id),
            Some(Value::Unknown) => "?".to_string(),
            Some(Value::Constant { constant }) => constant.to_string(),
            Some(Value::Variable { descriptor }) => descriptor.name.clone(),
            Some(Value::Type { ty }) => format!("type#{}", ty.0),
            Some(Value::New { ty, site }) => format!("new type#{}@{}", ty.0, site),
            Some(Value::NotNull { ty: Some(ty) }) => format!("notnull type#{}", ty.0),
            Some(Value::NotNull { ty: None }) => "notnull".to_string(),
            Some(Value::Relation {
                left,
                right,
                op,
                negated,
            }) => {
                let symbol = match (op, negated) {
                    (RelationType::Eq, true) => "!=",
                    (RelationType::InstanceOf, true) => "!instanceof",
                    (RelationType::Lt, true) => ">=",
                    (op, _) => op.symbol(),
                };
                format!("{} {} {}", self.describe(*left), symbol, self.describe(*right))
            }
        }
    }
}

impl TryFrom<Vec<Value>> for ValueFactory {
    type Error = DfaError;

    /// Rebuild a factory from its serialized value table.
    ///
    /// The table must start with the built-in values and hold every value
    /// once, so each id keeps its position.
    fn try_from(values: Vec<Value>) -> Result<Self> {
        let mut factory = ValueFactory::new();
        let builtins = factory.values.len();
        if values.len() < builtins {
            return Err(DfaError::InvalidValueTable {
                index: values.len(),
                reason: "table is missing built-in values",
            });
        }
        for (index, value) in values.into_iter().enumerate() {
            if index < builtins {
                if factory.values.get(index) != Some(&value) {
                    return Err(DfaError::InvalidValueTable {
                        index,
                        reason: "expected a built-in value",
                    });
                }
                continue;
            }
            if factory.index.contains_key(&value) {
                return Err(DfaError::InvalidValueTable {
                    index,
                    reason: "duplicate of an earlier entry",
                });
            }
            factory.intern(value);
        }
        factory.validate()?;
        Ok(factory)
    }
}

impl From<ValueFactory> for Vec<Value> {
    fn from(factory: ValueFactory) -> Self {
        factory.values
    }
}
