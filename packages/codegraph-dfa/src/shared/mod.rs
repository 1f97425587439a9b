//! Shared module - Common types and utilities
//!
//! Types used across features. No analysis logic lives here.

pub mod models;

// Re-exports for convenience
pub use models::*;
