//! Configuration I/O (YAML loading)
//!
//! Defines YAML schema types. Loading and export live on `DataFlowConfig`.

use serde::{Deserialize, Serialize};

/// Supported schema versions
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
///
/// ```yaml
/// version: 1
/// preset: balanced
/// overrides:
///   max_states: 50000
///   report_constant_conditions: false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1); missing is an error, not a default
    #[serde(default)]
    pub version: Option<u32>,

    /// Base preset
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Fine-grained overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<DataFlowConfigPatch>,
}

fn default_preset() -> String {
    "balanced".to_string()
}

/// Patch type for DataFlowConfig (all fields optional)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataFlowConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_states: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplicate_states: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsume_states: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_constant_conditions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_redundant_instanceof: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
}
