//! Data flow engine configuration
//!
//! ```rust,ignore
//! // Preset
//! let config = DataFlowConfig::preset(Preset::Fast);
//!
//! // Preset + override
//! let config = DataFlowConfig::preset(Preset::Balanced).max_states(50_000);
//!
//! // YAML
//! let config = DataFlowConfig::from_yaml_file("dfa.yaml")?;
//! ```

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, DataFlowConfigPatch, SUPPORTED_VERSIONS};
use super::preset::Preset;
use super::validation::{check_range, Validatable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound accepted for `max_states`
pub const MAX_STATES_LIMIT: usize = 10_000_000;

/// Upper bound accepted for `num_threads`
pub const MAX_THREADS: usize = 256;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFlowConfig {
    /// Preset this configuration started from
    #[serde(skip)]
    pub preset: Preset,

    /// Processed (instruction, state) pairs before a method is too complex
    /// (1..=10 000 000)
    pub max_states: usize,

    /// Skip states already processed at the same instruction
    pub deduplicate_states: bool,

    /// Also skip states implied by a more general state processed at the
    /// same instruction. Fewer states, but some nullness findings seen only
    /// on the specific state are lost; requires `deduplicate_states` and
    /// both condition reports off.
    pub subsume_states: bool,

    /// Report conditions that are always true/false
    pub report_constant_conditions: bool,

    /// Report `instanceof` checks replaceable by a null check
    pub report_redundant_instanceof: bool,

    /// Analyze methods of a batch on the rayon pool
    pub parallel: bool,

    /// Worker threads (0 = auto, 75% of cores)
    pub num_threads: usize,
}

impl DataFlowConfig {
    /// Configuration a preset starts from
    pub fn preset(preset: Preset) -> Self {
        let reports = preset.reports_conditions();
        Self {
            preset,
            max_states: preset.max_states(),
            deduplicate_states: true,
            subsume_states: preset.subsumes_states(),
            report_constant_conditions: reports,
            report_redundant_instanceof: reports,
            parallel: true,
            num_threads: 0,
        }
    }

    /// Builder: Set max_states
    pub fn max_states(mut self, v: usize) -> Self {
        self.max_states = v;
        self
    }

    /// Builder: Set deduplicate_states
    pub fn deduplicate_states(mut self, v: bool) -> Self {
        self.deduplicate_states = v;
        self
    }

    /// Builder: Set subsume_states
    pub fn subsume_states(mut self, v: bool) -> Self {
        self.subsume_states = v;
        self
    }

    /// Builder: Set report_constant_conditions
    pub fn report_constant_conditions(mut self, v: bool) -> Self {
        self.report_constant_conditions = v;
        self
    }

    /// Builder: Set report_redundant_instanceof
    pub fn report_redundant_instanceof(mut self, v: bool) -> Self {
        self.report_redundant_instanceof = v;
        self
    }

    /// Builder: Set parallel
    pub fn parallel(mut self, v: bool) -> Self {
        self.parallel = v;
        self
    }

    /// Builder: Set num_threads
    pub fn num_threads(mut self, v: usize) -> Self {
        self.num_threads = v;
        self
    }

    /// Apply patch
    pub fn patch(mut self, patch: &DataFlowConfigPatch) -> Self {
        if let Some(v) = patch.max_states {
            self.max_states = v;
        }
        if let Some(v) = patch.deduplicate_states {
            self.deduplicate_states = v;
        }
        if let Some(v) = patch.subsume_states {
            self.subsume_states = v;
        }
        if let Some(v) = patch.report_constant_conditions {
            self.report_constant_conditions = v;
        }
        if let Some(v) = patch.report_redundant_instanceof {
            self.report_redundant_instanceof = v;
        }
        if let Some(v) = patch.parallel {
            self.parallel = v;
        }
        if let Some(v) = patch.num_threads {
            self.num_threads = v;
        }
        self
    }

    /// Effective worker count: explicit value, or 75% of cores (at least 1)
    pub fn effective_threads(&self) -> usize {
        if self.num_threads > 0 {
            self.num_threads
        } else {
            (num_cpus::get() * 3 / 4).max(1)
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // YAML
    // ═══════════════════════════════════════════════════════════════════════

    /// Load and validate a YAML v1 document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        let version = export.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset: Preset = export.preset.parse()?;

        let mut config = Self::preset(preset);
        if let Some(overrides) = &export.overrides {
            config = config.patch(overrides);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML v1 file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export as YAML v1 (every field written as an override)
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.preset.to_string(),
            overrides: Some(DataFlowConfigPatch {
                max_states: Some(self.max_states),
                deduplicate_states: Some(self.deduplicate_states),
                subsume_states: Some(self.subsume_states),
                report_constant_conditions: Some(self.report_constant_conditions),
                report_redundant_instanceof: Some(self.report_redundant_instanceof),
                parallel: Some(self.parallel),
                num_threads: Some(self.num_threads),
            }),
        };
        Ok(serde_yaml::to_string(&export)?)
    }

    /// Get a human-readable description of the configuration
    pub fn describe(&self) -> String {
        format!(
            "preset={} max_states={} dedup={} subsume={} constant_conditions={} redundant_instanceof={} threads={}",
            self.preset,
            self.max_states,
            self.deduplicate_states,
            self.subsume_states,
            self.report_constant_conditions,
            self.report_redundant_instanceof,
            if self.parallel {
                self.effective_threads()
            } else {
                1
            }
        )
    }
}

impl Default for DataFlowConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

impl Validatable for DataFlowConfig {
    fn validate(&self) -> ConfigResult<()> {
        check_range(
            "max_states",
            self.max_states,
            1,
            MAX_STATES_LIMIT,
            "a method needs at least one processed state",
        )?;
        check_range(
            "num_threads",
            self.num_threads,
            0,
            MAX_THREADS,
            "0 picks 75% of the available cores",
        )?;
        self.check_conflicts()
    }
}

impl DataFlowConfig {
    fn check_conflicts(&self) -> ConfigResult<()> {
        if !self.subsume_states {
            return Ok(());
        }
        if !self.deduplicate_states {
            return Err(ConfigError::Conflict {
                issue: "subsume_states compares against processed states, which are only kept with deduplicate_states".to_string(),
                fix: "set deduplicate_states=true or subsume_states=false".to_string(),
            });
        }
        if self.report_constant_conditions || self.report_redundant_instanceof {
            return Err(ConfigError::Conflict {
                issue: "skipped states leave branches unvisited, so condition findings would be wrong".to_string(),
                fix: "turn off report_constant_conditions and report_redundant_instanceof, or set subsume_states=false".to_string(),
            });
        }
        Ok(())
    }
}
