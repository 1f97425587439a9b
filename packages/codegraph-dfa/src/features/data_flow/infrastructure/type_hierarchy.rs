//! In-memory class hierarchy
//!
//! `TypeHierarchy` adapter over an explicit table of classes and interfaces.
//! Hosts with a real type system implement the port themselves; this one
//! serves tests, benchmarks and small embedders.
//!
//! Disjointness follows single inheritance: two classes are disjoint when
//! neither is a subtype of the other. Interfaces are never disjoint from
//! anything, since some subclass may implement them.

use crate::features::data_flow::domain::TypeId;
use crate::features::data_flow::ports::TypeHierarchy;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default)]
struct TypeEntry {
    name: Option<String>,
    supertypes: Vec<TypeId>,
    is_interface: bool,
}

/// Class/interface table
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    types: FxHashMap<TypeId, TypeEntry>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class with an optional superclass
    pub fn add_class(&mut self, ty: TypeId, superclass: Option<TypeId>) -> &mut Self {
        let entry = self.types.entry(ty).or_default();
        entry.supertypes.extend(superclass);
        self
    }

    pub fn add_interface(&mut self, ty: TypeId) -> &mut Self {
        self.types.entry(ty).or_default().is_interface = true;
        self
    }

    /// Record `ty implements interface` (or an extra super-interface)
    pub fn implement(&mut self, ty: TypeId, interface: TypeId) -> &mut Self {
        self.types.entry(ty).or_default().supertypes.push(interface);
        self.types.entry(interface).or_default().is_interface = true;
        self
    }

    pub fn set_name(&mut self, ty: TypeId, name: impl Into<String>) -> &mut Self {
        self.types.entry(ty).or_default().name = Some(name.into());
        self
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        self.types.get(&ty).map_or(false, |e| e.is_interface)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeHierarchy for ClassHierarchy {
    fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        let mut seen = FxHashSet::default();
        let mut pending = vec![sub];
        while let Some(ty) = pending.pop() {
            if !seen.insert(ty) {
                continue;
            }
            let Some(entry) = self.types.get(&ty) else {
                continue;
            };
            for parent in &entry.supertypes {
                if *parent == sup {
                    return true;
                }
                pending.push(*parent);
            }
        }
        false
    }

    fn are_disjoint(&self, a: TypeId, b: TypeId) -> bool {
        // Unregistered types could be anything
        if !self.types.contains_key(&a) || !self.types.contains_key(&b) {
            return false;
        }
        if self.is_interface(a) || self.is_interface(b) {
            return false;
        }
        !self.is_subtype(a, b) && !self.is_subtype(b, a)
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.types
            .get(&ty)
            .and_then(|e| e.name.clone())
            .unwrap_or_else(|| format!("type#{}", ty.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJECT: TypeId = TypeId(0);
    const STRING: TypeId = TypeId(1);
    const INTEGER: TypeId = TypeId(2);
    const COMPARABLE: TypeId = TypeId(3);

    fn hierarchy() -> ClassHierarchy {
        let mut h = ClassHierarchy::new();
        h.add_class(OBJECT, None)
            .add_class(STRING, Some(OBJECT))
            .add_class(INTEGER, Some(OBJECT))
            .implement(STRING, COMPARABLE)
            .set_name(STRING, "java.lang.String");
        h
    }

    #[test]
    fn test_subtyping_is_reflexive_and_transitive() {
        let h = hierarchy();
        assert!(h.is_subtype(STRING, STRING));
        assert!(h.is_subtype(STRING, OBJECT));
        assert!(h.is_subtype(STRING, COMPARABLE));
        assert!(!h.is_subtype(OBJECT, STRING));
    }

    #[test]
    fn test_disjointness() {
        let h = hierarchy();
        assert!(h.are_disjoint(STRING, INTEGER));
        assert!(!h.are_disjoint(STRING, OBJECT));
        assert!(!h.are_disjoint(INTEGER, COMPARABLE));
        assert!(!h.are_disjoint(STRING, TypeId(99)));
    }

    #[test]
    fn test_type_names() {
        let h = hierarchy();
        assert_eq!(h.type_name(STRING), "java.lang.String");
        assert_eq!(h.type_name(INTEGER), "type#2");
    }
}
