//! Test fixtures
//!
//! A small Java-like type universe and ready-made analyzers.

use codegraph_dfa::{ClassHierarchy, DataFlowAnalyzer, DataFlowConfig, TypeId};
use std::sync::Arc;

pub const OBJECT: TypeId = TypeId(0);
pub const STRING: TypeId = TypeId(1);
pub const INTEGER: TypeId = TypeId(2);
pub const NUMBER: TypeId = TypeId(3);
pub const CHAR_SEQUENCE: TypeId = TypeId(4);

/// Object
/// ├── String (implements CharSequence)
/// └── Number
///     └── Integer
pub fn fixture_hierarchy() -> ClassHierarchy {
    let mut h = ClassHierarchy::new();
    h.add_class(OBJECT, None)
        .add_class(STRING, Some(OBJECT))
        .add_class(NUMBER, Some(OBJECT))
        .add_class(INTEGER, Some(NUMBER))
        .implement(STRING, CHAR_SEQUENCE)
        .set_name(OBJECT, "java.lang.Object")
        .set_name(STRING, "java.lang.String")
        .set_name(NUMBER, "java.lang.Number")
        .set_name(INTEGER, "java.lang.Integer")
        .set_name(CHAR_SEQUENCE, "java.lang.CharSequence");
    h
}

pub fn fixture_analyzer(config: DataFlowConfig) -> DataFlowAnalyzer {
    DataFlowAnalyzer::new(config, Arc::new(fixture_hierarchy())).expect("valid test config")
}

pub fn default_analyzer() -> DataFlowAnalyzer {
    fixture_analyzer(DataFlowConfig::default())
}
