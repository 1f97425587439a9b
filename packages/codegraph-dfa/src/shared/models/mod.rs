//! Shared models

mod anchor;

pub use anchor::SourceAnchor;
