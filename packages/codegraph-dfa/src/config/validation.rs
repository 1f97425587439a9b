//! Configuration validation

use super::error::{ConfigError, ConfigResult};

/// Configuration that can reject its own values before an analysis starts
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// `value` must lie in `min..=max`
pub(crate) fn check_range(
    field: &str,
    value: usize,
    min: usize,
    max: usize,
    hint: &str,
) -> ConfigResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::range_with_hint(field, value, min, max, hint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range_bounds_are_inclusive() {
        assert!(check_range("n", 1, 1, 3, "").is_ok());
        assert!(check_range("n", 3, 1, 3, "").is_ok());
        assert!(check_range("n", 4, 1, 3, "too many").is_err());
    }
}
