//! Configuration System
//!
//! Two tiers, as elsewhere in the code graph tooling:
//! - Level 1: Preset - simple one-liner
//! - Level 2: YAML v1 with per-field overrides
//!
//! # Examples
//!
//! ```rust,ignore
//! use codegraph_dfa::config::{DataFlowConfig, Preset};
//!
//! let config = DataFlowConfig::preset(Preset::Fast);
//! let config = DataFlowConfig::preset(Preset::Balanced).max_states(50_000);
//! let config = DataFlowConfig::from_yaml_file("team-inspections.yaml")?;
//! ```

pub mod dfa_config;
pub mod error;
pub mod io;
pub mod preset;
pub mod validation;

// Re-exports
pub use dfa_config::{DataFlowConfig, MAX_STATES_LIMIT, MAX_THREADS};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, DataFlowConfigPatch};
pub use preset::Preset;
pub use validation::Validatable;
