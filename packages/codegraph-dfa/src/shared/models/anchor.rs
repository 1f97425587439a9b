//! Source anchors
//!
//! Opaque handle linking an instruction back to the source element it was
//! generated from. The engine never inspects it.

use serde::{Deserialize, Serialize};

/// Opaque diagnostic handle assigned by the linearizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceAnchor(pub u64);

impl SourceAnchor {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SourceAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}
