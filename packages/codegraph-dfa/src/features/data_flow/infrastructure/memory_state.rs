/*
 * Memory State
 *
 * Abstract machine state threaded through the interpreter:
 *   - operand stack
 *   - return-offset stack (Gosub / ReturnFromSub)
 *   - equivalence classes over variables and constants
 *   - distinct pairs of class representatives
 *   - per-variable type and integer range facts
 *
 * Non-nullness is not a separate flag: `x != null` is a distinct pair
 * between x's class and null's class.
 *
 * Stack slots hold value ids, so a variable on the stack means "its current
 * value". Callers rebinding a variable replace its stack slots by a
 * snapshot first (`replace_on_stack`).
 *
 * Canonical form (so derived Eq/Hash is the dedup equality):
 *   - a class is keyed by its smallest member
 *   - distinct pairs are stored as (min, max) of representatives
 *   - singleton classes without distinct pairs are dropped
 *   - empty VariableStates are dropped
 */

use crate::errors::{DfaError, Result};
use crate::features::data_flow::domain::{
    ConstValue, IntRange, Nullability, RelationType, TypeId, Value, ValueId,
};
use crate::features::data_flow::infrastructure::ValueFactory;
use crate::features::data_flow::ports::TypeHierarchy;
use std::collections::{BTreeMap, BTreeSet};

static UNKNOWN: Value = Value::Unknown;

/// Read-only collaborators the state consults while narrowing
#[derive(Clone, Copy)]
pub struct StateContext<'a> {
    pub factory: &'a ValueFactory,
    pub hierarchy: &'a dyn TypeHierarchy,
}

impl<'a> StateContext<'a> {
    pub fn new(factory: &'a ValueFactory, hierarchy: &'a dyn TypeHierarchy) -> Self {
        Self { factory, hierarchy }
    }

    fn value(&self, id: ValueId) -> &'a Value {
        self.factory.get(id).unwrap_or(&UNKNOWN)
    }
}

/// Facts of one variable. The type sets hold "if the variable is non-null".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VariableState {
    pub instance_of: BTreeSet<TypeId>,
    pub not_instance_of: BTreeSet<TypeId>,
    /// Integer bounds; `None` is unbounded
    pub range: Option<IntRange>,
}

impl VariableState {
    pub fn is_empty(&self) -> bool {
        self.instance_of.is_empty() && self.not_instance_of.is_empty() && self.range.is_none()
    }

    /// Conjunction of both fact sets
    fn absorb(&mut self, other: VariableState) {
        self.instance_of.extend(other.instance_of);
        self.not_instance_of.extend(other.not_instance_of);
        self.range = match (self.range, other.range) {
            (Some(a), Some(b)) => Some(a.intersect(b)),
            (a, b) => a.or(b),
        };
    }
}

/// Abstract memory at one program point
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MemoryState {
    stack: Vec<ValueId>,
    offsets: Vec<usize>,
    /// rep -> members (rep is the smallest member)
    classes: BTreeMap<ValueId, BTreeSet<ValueId>>,
    /// member -> rep, for every member of `classes`
    class_of: BTreeMap<ValueId, ValueId>,
    distinct: BTreeSet<(ValueId, ValueId)>,
    variables: BTreeMap<ValueId, VariableState>,
}

fn ordered(a: ValueId, b: ValueId) -> (ValueId, ValueId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Operand stack
    // ═══════════════════════════════════════════════════════════════════════

    pub fn push(&mut self, value: ValueId) {
        self.stack.push(value);
    }

    /// Pop the top of stack; `instruction` is the index reported on underflow
    pub fn pop(&mut self, instruction: usize) -> Result<ValueId> {
        self.stack
            .pop()
            .ok_or(DfaError::EmptyStack { instruction })
    }

    pub fn peek(&self) -> Option<ValueId> {
        self.stack.last().copied()
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn empty_stack(&mut self) {
        self.stack.clear();
    }

    pub fn stack_contains(&self, value: ValueId) -> bool {
        self.stack.contains(&value)
    }

    /// Distinct values currently on the stack
    pub fn stack_values(&self) -> BTreeSet<ValueId> {
        self.stack.iter().copied().collect()
    }

    /// Rewrite every stack slot holding `from` to `to`
    pub fn replace_on_stack(&mut self, from: ValueId, to: ValueId) {
        for slot in self.stack.iter_mut().filter(|slot| **slot == from) {
            *slot = to;
        }
    }

    pub fn push_offset(&mut self, offset: usize) {
        self.offsets.push(offset);
    }

    pub fn pop_offset(&mut self, instruction: usize) -> Result<usize> {
        self.offsets
            .pop()
            .ok_or(DfaError::EmptyOffsetStack { instruction })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Equivalence classes
    // ═══════════════════════════════════════════════════════════════════════

    fn rep(&self, value: ValueId) -> ValueId {
        self.class_of.get(&value).copied().unwrap_or(value)
    }

    fn members(&self, rep: ValueId) -> Vec<ValueId> {
        match self.classes.get(&rep) {
            Some(members) => members.iter().copied().collect(),
            None => vec![rep],
        }
    }

    fn ensure_class(&mut self, value: ValueId) {
        if !self.class_of.contains_key(&value) {
            self.classes.insert(value, BTreeSet::from([value]));
            self.class_of.insert(value, value);
        }
    }

    /// The constant held by `rep`'s class, if any
    fn class_constant(&self, rep: ValueId, ctx: &StateContext<'_>) -> Option<ValueId> {
        self.members(rep)
            .into_iter()
            .find(|m| ctx.value(*m).is_constant())
    }

    fn is_distinct(&self, a: ValueId, b: ValueId) -> bool {
        self.distinct.contains(&ordered(self.rep(a), self.rep(b)))
    }

    /// Two values are known equal
    pub fn are_equal(&self, a: ValueId, b: ValueId) -> bool {
        a == b || self.rep(a) == self.rep(b)
    }

    /// Merge the classes of `a` and `b`. `false` if that contradicts a fact.
    fn unite(&mut self, a: ValueId, b: ValueId, ctx: &StateContext<'_>) -> bool {
        let ra = self.rep(a);
        let rb = self.rep(b);
        if ra == rb {
            return true;
        }
        if self.distinct.contains(&ordered(ra, rb)) {
            return false;
        }
        if let (Some(ca), Some(cb)) = (self.class_constant(ra, ctx), self.class_constant(rb, ctx)) {
            if ca != cb {
                return false;
            }
        }

        self.ensure_class(ra);
        self.ensure_class(rb);
        let (keep, gone) = ordered(ra, rb);
        let moved = self.classes.remove(&gone).unwrap_or_default();
        for member in &moved {
            self.class_of.insert(*member, keep);
        }
        self.classes.entry(keep).or_default().extend(moved);

        let rewritten: Vec<_> = self
            .distinct
            .iter()
            .filter(|(x, y)| *x == gone || *y == gone)
            .copied()
            .collect();
        for pair in rewritten {
            self.distinct.remove(&pair);
            let other = if pair.0 == gone { pair.1 } else { pair.0 };
            self.distinct.insert(ordered(keep, other));
        }

        self.check_consistency(keep, ctx)
    }

    /// Record `a != b`. `false` if they are known equal.
    fn make_distinct(&mut self, a: ValueId, b: ValueId, ctx: &StateContext<'_>) -> bool {
        let ra = self.rep(a);
        let rb = self.rep(b);
        if ra == rb {
            return false;
        }
        if let (Some(ca), Some(cb)) = (self.class_constant(ra, ctx), self.class_constant(rb, ctx)) {
            // Constants are pairwise distinct already
            return ca != cb;
        }
        self.ensure_class(ra);
        self.ensure_class(rb);
        self.distinct.insert(ordered(ra, rb));
        true
    }

    fn check_consistency(&mut self, rep: ValueId, ctx: &StateContext<'_>) -> bool {
        !self.class_range(rep, ctx).is_empty() && self.check_type_consistency(rep, ctx)
    }

    /// Contradicting type facts mean the object can only be null
    fn check_type_consistency(&mut self, rep: ValueId, ctx: &StateContext<'_>) -> bool {
        if self.members(rep).contains(&ValueId::NULL) {
            return true;
        }
        let (instance, not_instance) = self.type_facts(rep, ctx);
        let contradiction = instance.iter().any(|i| {
            not_instance
                .iter()
                .any(|n| ctx.hierarchy.is_subtype(*i, *n))
                || instance.iter().any(|j| ctx.hierarchy.are_disjoint(*i, *j))
        });
        if contradiction {
            self.unite(rep, ValueId::NULL, ctx)
        } else {
            true
        }
    }

    /// Instance and non-instance types known for `value`'s class,
    /// declared types included
    fn type_facts(
        &self,
        value: ValueId,
        ctx: &StateContext<'_>,
    ) -> (BTreeSet<TypeId>, BTreeSet<TypeId>) {
        let mut instance = BTreeSet::new();
        let mut not_instance = BTreeSet::new();
        for member in self.members(self.rep(value)) {
            if let Some(descriptor) = ctx.value(member).as_variable() {
                instance.extend(descriptor.declared_type);
            }
            if let Some(state) = self.variables.get(&member) {
                instance.extend(state.instance_of.iter().copied());
                not_instance.extend(state.not_instance_of.iter().copied());
            }
        }
        (instance, not_instance)
    }

    /// Most specific type `value` is known to be an instance of
    pub fn known_type(&self, value: ValueId, ctx: &StateContext<'_>) -> Option<TypeId> {
        let (instance, _) = self.type_facts(value, ctx);
        instance
            .iter()
            .find(|t| instance.iter().all(|o| ctx.hierarchy.is_subtype(**t, *o)))
            .or_else(|| instance.iter().next())
            .copied()
    }

    /// Integer range of `value`'s class: stored bounds of every member,
    /// narrowed to the class constant if it is an integer
    pub fn class_range(&self, value: ValueId, ctx: &StateContext<'_>) -> IntRange {
        let mut range = IntRange::ALL;
        for member in self.members(self.rep(value)) {
            if let Some(k) = ctx.value(member).as_constant().and_then(ConstValue::as_int) {
                range = range.intersect(IntRange::point(k));
            }
            if let Some(bounds) = self.variables.get(&member).and_then(|s| s.range) {
                range = range.intersect(bounds);
            }
        }
        range
    }

    /// Integer constant `value` is or is bound to
    fn int_value(&self, value: ValueId, ctx: &StateContext<'_>) -> Option<i64> {
        let constant = match ctx.value(value) {
            Value::Constant { constant } => Some(constant),
            Value::Variable { .. } => self
                .class_constant(self.rep(value), ctx)
                .and_then(|c| ctx.value(c).as_constant()),
            _ => None,
        };
        constant.and_then(ConstValue::as_int)
    }

    /// Record `value ∈ range`. `false` if that contradicts.
    fn narrow_range(&mut self, value: ValueId, range: IntRange, ctx: &StateContext<'_>) -> bool {
        if range.is_empty() {
            return false;
        }
        match ctx.value(value) {
            Value::Variable { .. } => {
                let state = self.variables.entry(value).or_default();
                let narrowed = state.range.unwrap_or(IntRange::ALL).intersect(range);
                state.range = (!narrowed.is_all()).then_some(narrowed);
                !self.class_range(value, ctx).is_empty()
            }
            Value::Constant { constant } => constant.as_int().map_or(true, |k| range.contains(k)),
            _ => true,
        }
    }

    /// Drop an excluded constant from the bounds of `var`'s class
    fn exclude_from_range(
        &mut self,
        var: ValueId,
        excluded: ValueId,
        ctx: &StateContext<'_>,
    ) -> bool {
        if !ctx.value(var).is_variable() {
            return true;
        }
        let Some(k) = self.int_value(excluded, ctx) else {
            return true;
        };
        let range = self.class_range(var, ctx);
        let trimmed = range.without(k);
        if trimmed == range {
            return true;
        }
        self.narrow_range(var, trimmed, ctx)
    }

    /// Drop facts that carry no information
    fn normalize(&mut self) {
        let referenced: BTreeSet<ValueId> = self
            .distinct
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .collect();
        let dead: Vec<ValueId> = self
            .classes
            .iter()
            .filter(|(rep, members)| members.len() == 1 && !referenced.contains(rep))
            .map(|(rep, _)| *rep)
            .collect();
        for rep in dead {
            self.classes.remove(&rep);
            self.class_of.remove(&rep);
        }
        self.variables.retain(|_, state| !state.is_empty());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════════

    /// Bind `var` to `value`, forgetting everything previously known about it
    pub fn set_variable_value(&mut self, var: ValueId, value: ValueId, ctx: &StateContext<'_>) {
        if var == value {
            return;
        }
        self.flush_variable(var, ctx);
        if !ctx.value(var).is_variable() {
            return;
        }
        match ctx.value(value) {
            Value::Variable { .. } | Value::Constant { .. } => {
                // var is a fresh singleton, so this cannot conflict
                self.unite(var, value, ctx);
            }
            Value::New { ty, .. } => {
                self.make_distinct(var, ValueId::NULL, ctx);
                self.variables
                    .entry(var)
                    .or_default()
                    .instance_of
                    .insert(*ty);
            }
            Value::NotNull { ty } => {
                self.make_distinct(var, ValueId::NULL, ctx);
                if let Some(ty) = ty {
                    self.variables
                        .entry(var)
                        .or_default()
                        .instance_of
                        .insert(*ty);
                }
            }
            Value::Relation { .. } | Value::Type { .. } | Value::Unknown => {}
        }
        self.normalize();
    }

    /// Constant bound to `var`, if known
    pub fn variable_value(&self, var: ValueId, ctx: &StateContext<'_>) -> Option<ValueId> {
        self.class_constant(self.rep(var), ctx)
    }

    pub fn variable_state(&self, var: ValueId) -> Option<&VariableState> {
        self.variables.get(&var)
    }

    /// Forget every fact about `var`.
    ///
    /// Aliases keep what was known about the shared object: `var`'s facts
    /// and declared type move to a remaining variable of its class.
    pub fn flush_variable(&mut self, var: ValueId, ctx: &StateContext<'_>) {
        let mut facts = self.variables.remove(&var).unwrap_or_default();
        let Some(rep) = self.class_of.remove(&var) else {
            return;
        };
        let mut members = self.classes.remove(&rep).unwrap_or_default();
        members.remove(&var);

        let pairs: Vec<_> = self
            .distinct
            .iter()
            .filter(|(a, b)| *a == rep || *b == rep)
            .copied()
            .collect();
        for pair in &pairs {
            self.distinct.remove(pair);
        }

        if let Some(&new_rep) = members.iter().next() {
            for member in &members {
                self.class_of.insert(*member, new_rep);
            }
            self.classes.insert(new_rep, members.clone());
            for (a, b) in pairs {
                let other = if a == rep { b } else { a };
                self.distinct.insert(ordered(new_rep, other));
            }
            if let Some(alias) = members.iter().find(|m| ctx.value(**m).is_variable()) {
                if let Some(descriptor) = ctx.value(var).as_variable() {
                    facts.instance_of.extend(descriptor.declared_type);
                }
                self.variables.entry(*alias).or_default().absorb(facts);
            }
        }
        self.normalize();
    }

    /// Forget every variable fact; the stacks are kept
    pub fn flush_all_variables(&mut self) {
        self.classes.clear();
        self.class_of.clear();
        self.distinct.clear();
        self.variables.clear();
    }

    /// Forget non-final fields, as after an opaque call
    pub fn flush_fields(&mut self, ctx: &StateContext<'_>) {
        let mut tracked: BTreeSet<ValueId> = self.class_of.keys().copied().collect();
        tracked.extend(self.variables.keys().copied());
        for var in tracked {
            if ctx
                .factory
                .descriptor(var)
                .map_or(false, |d| d.is_flushable_field())
            {
                self.flush_variable(var, ctx);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Nullness queries
    // ═══════════════════════════════════════════════════════════════════════

    /// Proven null
    pub fn is_null(&self, value: ValueId, ctx: &StateContext<'_>) -> bool {
        match ctx.value(value) {
            Value::Constant { constant } => constant.is_null(),
            Value::Variable { .. } => {
                self.class_constant(self.rep(value), ctx) == Some(ValueId::NULL)
            }
            _ => false,
        }
    }

    /// Proven non-null
    pub fn is_not_null(&self, value: ValueId, ctx: &StateContext<'_>) -> bool {
        let v = ctx.value(value);
        if v.is_statically_not_null() {
            return true;
        }
        if !v.is_variable() {
            return false;
        }
        match self.class_constant(self.rep(value), ctx) {
            Some(constant) => constant != ValueId::NULL,
            None => self.is_distinct(value, ValueId::NULL),
        }
    }

    /// Null is possible on positive evidence: proven null, or `@Nullable`
    /// and not yet checked. Unknown values never count.
    pub fn can_be_null(&self, value: ValueId, ctx: &StateContext<'_>) -> bool {
        if self.is_null(value, ctx) {
            return true;
        }
        let annotated_nullable = ctx
            .value(value)
            .as_variable()
            .map_or(false, |d| d.nullability == Nullability::Nullable);
        annotated_nullable && !self.is_not_null(value, ctx)
    }

    /// Assume `value` is dereferenced. `false` when it can be null.
    pub fn apply_not_null(&mut self, value: ValueId, ctx: &StateContext<'_>) -> bool {
        if self.can_be_null(value, ctx) {
            return false;
        }
        if ctx.value(value).is_variable() {
            let ok = self.make_distinct(value, ValueId::NULL, ctx);
            self.normalize();
            return ok;
        }
        true
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Conditions
    // ═══════════════════════════════════════════════════════════════════════

    /// Narrow the state by `condition`. `false` means the state is infeasible.
    pub fn apply_condition(&mut self, condition: ValueId, ctx: &StateContext<'_>) -> bool {
        let feasible = match ctx.value(condition) {
            Value::Relation {
                left,
                right,
                op: RelationType::InstanceOf,
                negated,
            } => self.apply_instanceof(*left, *right, *negated, ctx),
            Value::Relation {
                left,
                right,
                op: RelationType::Lt,
                negated,
            } => self.apply_less_than(*left, *right, *negated, ctx),
            Value::Relation {
                left,
                right,
                negated,
                ..
            } => {
                if *negated {
                    self.apply_ne(*left, *right, ctx)
                } else {
                    self.apply_eq(*left, *right, ctx)
                }
            }
            Value::Constant {
                constant: ConstValue::Bool(b),
            } => *b,
            _ => true,
        };
        self.normalize();
        feasible
    }

    fn apply_eq(&mut self, left: ValueId, right: ValueId, ctx: &StateContext<'_>) -> bool {
        if left == right {
            return true;
        }
        let (lv, rv) = (ctx.value(left), ctx.value(right));
        if lv.is_class_member() && rv.is_class_member() {
            return self.unite(left, right, ctx);
        }
        if matches!(lv, Value::New { .. }) || matches!(rv, Value::New { .. }) {
            return false;
        }
        let (member, other) = if lv.is_class_member() {
            (left, rv)
        } else {
            (right, lv)
        };
        match other {
            Value::NotNull { ty } => {
                if self.is_null(member, ctx) {
                    return false;
                }
                if !ctx.value(member).is_variable() {
                    return true;
                }
                if !self.make_distinct(member, ValueId::NULL, ctx) {
                    return false;
                }
                if let Some(ty) = ty {
                    self.variables
                        .entry(member)
                        .or_default()
                        .instance_of
                        .insert(*ty);
                    return self.check_type_consistency(self.rep(member), ctx);
                }
                true
            }
            _ => true,
        }
    }

    fn apply_ne(&mut self, left: ValueId, right: ValueId, ctx: &StateContext<'_>) -> bool {
        if left == right {
            return false;
        }
        let (lv, rv) = (ctx.value(left), ctx.value(right));
        if lv.is_class_member() && rv.is_class_member() {
            return self.make_distinct(left, right, ctx)
                && self.exclude_from_range(left, right, ctx)
                && self.exclude_from_range(right, left, ctx);
        }
        // New/NotNull against anything else: no new fact
        true
    }

    /// `left < right`, or `left >= right` when negated. Bounds are only
    /// learned against integer constants.
    fn apply_less_than(
        &mut self,
        left: ValueId,
        right: ValueId,
        negated: bool,
        ctx: &StateContext<'_>,
    ) -> bool {
        if self.are_equal(left, right) {
            return negated;
        }
        match (self.int_value(left, ctx), self.int_value(right, ctx)) {
            (Some(l), Some(r)) => (l < r) != negated,
            (None, Some(r)) => {
                let bound = if negated {
                    IntRange::at_least(r)
                } else {
                    IntRange::below(r)
                };
                self.narrow_range(left, bound, ctx)
            }
            (Some(l), None) => {
                let bound = if negated {
                    IntRange::at_most(l)
                } else {
                    IntRange::above(l)
                };
                self.narrow_range(right, bound, ctx)
            }
            (None, None) => true,
        }
    }

    fn apply_instanceof(
        &mut self,
        operand: ValueId,
        ty_value: ValueId,
        negated: bool,
        ctx: &StateContext<'_>,
    ) -> bool {
        let Value::Type { ty } = ctx.value(ty_value) else {
            return true;
        };
        let ty = *ty;
        let h = ctx.hierarchy;
        match ctx.value(operand) {
            Value::New { ty: exact, .. } => h.is_subtype(*exact, ty) != negated,
            Value::NotNull { ty: Some(s) } => {
                if negated {
                    !h.is_subtype(*s, ty)
                } else {
                    !h.are_disjoint(*s, ty)
                }
            }
            Value::Constant { constant } if constant.is_null() => negated,
            Value::Variable { .. } => {
                if negated {
                    self.apply_not_instanceof_variable(operand, ty, ctx)
                } else {
                    if self.is_null(operand, ctx) {
                        return false;
                    }
                    if !self.make_distinct(operand, ValueId::NULL, ctx) {
                        return false;
                    }
                    self.record_instance_of(operand, ty, ctx)
                }
            }
            _ => true,
        }
    }

    fn apply_not_instanceof_variable(
        &mut self,
        var: ValueId,
        ty: TypeId,
        ctx: &StateContext<'_>,
    ) -> bool {
        let (instance, _) = self.type_facts(var, ctx);
        if instance.iter().any(|i| ctx.hierarchy.is_subtype(*i, ty)) {
            // Only null fails an instanceof the value already satisfies
            return self.unite(var, ValueId::NULL, ctx);
        }
        self.variables
            .entry(var)
            .or_default()
            .not_instance_of
            .insert(ty);
        true
    }

    /// Record `var instanceof ty` (holding if non-null) after checking it
    /// against the facts already known
    fn record_instance_of(&mut self, var: ValueId, ty: TypeId, ctx: &StateContext<'_>) -> bool {
        let h = ctx.hierarchy;
        let (instance, not_instance) = self.type_facts(var, ctx);
        if not_instance.iter().any(|n| h.is_subtype(ty, *n)) {
            return false;
        }
        if instance.iter().any(|i| h.are_disjoint(*i, ty)) {
            return false;
        }
        if !instance.iter().any(|i| h.is_subtype(*i, ty)) {
            self.variables
                .entry(var)
                .or_default()
                .instance_of
                .insert(ty);
        }
        true
    }

    /// Cast check: null always passes, otherwise narrow to the cast type
    /// without asserting non-nullness. `false` when the cast cannot succeed.
    pub fn apply_instanceof_or_null(&mut self, relation: ValueId, ctx: &StateContext<'_>) -> bool {
        let Value::Relation {
            left,
            right,
            op: RelationType::InstanceOf,
            ..
        } = ctx.value(relation)
        else {
            return true;
        };
        let (operand, ty_value) = (*left, *right);
        if self.is_null(operand, ctx) {
            return true;
        }
        let Value::Type { ty } = ctx.value(ty_value) else {
            return true;
        };
        let ty = *ty;
        let feasible = match ctx.value(operand) {
            Value::Variable { .. } => self.record_instance_of(operand, ty, ctx),
            _ => self.apply_instanceof(operand, ty_value, false, ctx),
        };
        self.normalize();
        feasible
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Subsumption
    // ═══════════════════════════════════════════════════════════════════════

    /// Every fact of `self` also holds in `other`, so `self` describes a
    /// superset of the concrete states `other` describes
    pub fn is_super_state_of(&self, other: &MemoryState, ctx: &StateContext<'_>) -> bool {
        if self.stack != other.stack || self.offsets != other.offsets {
            return false;
        }
        let equalities_hold = self.classes.values().all(|members| {
            let mut reps = members.iter().map(|m| other.rep(*m));
            let first = reps.next();
            reps.all(|r| Some(r) == first)
        });
        if !equalities_hold {
            return false;
        }
        if !self.distinct.iter().all(|(a, b)| other.is_distinct(*a, *b)) {
            return false;
        }
        self.variables.iter().all(|(var, facts)| {
            let (instance, not_instance) = other.type_facts(*var, ctx);
            facts.instance_of.is_subset(&instance)
                && facts.not_instance_of.is_subset(&not_instance)
                && facts
                    .range
                    .map_or(true, |r| r.includes(other.class_range(*var, ctx)))
        })
    }
}
