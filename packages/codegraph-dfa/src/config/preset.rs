//! Analysis presets
//!
//! One preset per host situation. A preset fixes the state bound and which
//! condition findings are worth showing; everything else defaults the same.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where the analysis runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Editor highlighting while typing: small bound, nullness findings
    /// only, subsumed states skipped
    Fast,
    /// Batch inspection of a project
    #[default]
    Balanced,
    /// Offline audit of large methods
    Thorough,
    /// Balanced values, expected to be overridden from YAML
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Fast,
        Preset::Balanced,
        Preset::Thorough,
        Preset::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Custom => "custom",
        }
    }

    /// Processed (instruction, state) pairs allowed per method
    pub fn max_states(&self) -> usize {
        match self {
            Self::Fast => 10_000,
            Self::Balanced | Self::Custom => 100_000,
            Self::Thorough => 1_000_000,
        }
    }

    /// Constant-condition and redundant-instanceof findings are reported
    pub fn reports_conditions(&self) -> bool {
        !matches!(self, Self::Fast)
    }

    /// States implied by a processed state are skipped. Only presets
    /// without condition findings may do this.
    pub fn subsumes_states(&self) -> bool {
        matches!(self, Self::Fast)
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!("thorough".parse::<Preset>().unwrap(), Preset::Thorough);
        assert_eq!("FAST".parse::<Preset>().unwrap(), Preset::Fast);
        assert!(matches!(
            "turbo".parse::<Preset>(),
            Err(ConfigError::UnknownPreset(name)) if name == "turbo"
        ));
    }

    #[test]
    fn test_names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.to_string().parse::<Preset>().unwrap(), preset);
        }
    }

    #[test]
    fn test_bounds_grow_with_thoroughness() {
        assert!(Preset::Fast.max_states() < Preset::Balanced.max_states());
        assert!(Preset::Balanced.max_states() < Preset::Thorough.max_states());
        assert_eq!(Preset::Custom.max_states(), Preset::default().max_states());
        assert!(!Preset::Fast.reports_conditions());
        for preset in Preset::ALL {
            assert!(!(preset.subsumes_states() && preset.reports_conditions()));
        }
    }
}
