//! Configuration error types

use thiserror::Error;

/// Why a configuration was rejected
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric field outside its accepted range
    #[error("{field} = {value} is outside {min}..={max}: {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    #[error("configuration has no 'version' field; start the file with 'version: 1'")]
    MissingVersion,

    #[error("configuration version {found} is not supported (supported: {})", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Two options that cannot be combined
    #[error("conflicting options: {issue}. Fix: {fix}")]
    Conflict { issue: String, fix: String },

    #[error("unknown preset '{0}' (expected fast, balanced, thorough or custom)")]
    UnknownPreset(String),

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }
}
