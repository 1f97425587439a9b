/*
 * Codegraph DFA - Data Flow Abstract Interpretation Engine
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (SourceAnchor)
 * - features/    : data_flow slice (domain → ports → infrastructure → application)
 * - config/      : Presets + YAML v1
 * - errors       : Engine-internal error type
 *
 * Per method:
 * - Linearized instructions in, AnalysisReport out
 * - Worklist over (instruction, memory state) with per-instruction dedup,
 *   optionally skipping states subsumed by a processed one
 *
 * Batches:
 * - Independent methods on a Rayon pool (75% of cores by default)
 */

// Crate-level lint configuration
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::unnecessary_map_or)] // map_or style for compatibility
#![allow(clippy::len_without_is_empty)] // Length-only views

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
pub mod shared;

/// Feature modules
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{ConfigError, DataFlowConfig, Preset, Validatable};
pub use errors::{DfaError, Result};
pub use features::data_flow::*;
pub use shared::models::SourceAnchor;
