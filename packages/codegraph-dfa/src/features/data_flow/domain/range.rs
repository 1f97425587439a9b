/*
 * Integer Ranges
 *
 * Closed intervals over i64 recorded by ordering comparisons against
 * constants (`x < 10`, `x >= 0`). Only endpoints are tracked: excluding an
 * interior value (`x != 5` inside 0..=10) leaves the range unchanged.
 */

/// Closed interval `min..=max`; empty when `min > max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    /// Every i64
    pub const ALL: IntRange = IntRange {
        min: i64::MIN,
        max: i64::MAX,
    };

    /// Canonical empty range
    pub const EMPTY: IntRange = IntRange { min: 1, max: 0 };

    pub fn new(min: i64, max: i64) -> Self {
        if min > max {
            Self::EMPTY
        } else {
            Self { min, max }
        }
    }

    pub fn point(value: i64) -> Self {
        Self::new(value, value)
    }

    /// `..bound`
    pub fn below(bound: i64) -> Self {
        match bound.checked_sub(1) {
            Some(max) => Self::new(i64::MIN, max),
            None => Self::EMPTY,
        }
    }

    /// `..=bound`
    pub fn at_most(bound: i64) -> Self {
        Self::new(i64::MIN, bound)
    }

    /// `bound + 1..`
    pub fn above(bound: i64) -> Self {
        match bound.checked_add(1) {
            Some(min) => Self::new(min, i64::MAX),
            None => Self::EMPTY,
        }
    }

    /// `bound..`
    pub fn at_least(bound: i64) -> Self {
        Self::new(bound, i64::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn is_all(&self) -> bool {
        *self == Self::ALL
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    /// `other` lies entirely inside `self`
    pub fn includes(&self, other: IntRange) -> bool {
        other.is_empty() || (self.min <= other.min && other.max <= self.max)
    }

    pub fn intersect(&self, other: IntRange) -> IntRange {
        Self::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Drop `value` when it is an endpoint
    pub fn without(&self, value: i64) -> IntRange {
        if self.is_empty() || !self.contains(value) {
            *self
        } else if self.min == value {
            match value.checked_add(1) {
                Some(min) => Self::new(min, self.max),
                None => Self::EMPTY,
            }
        } else if self.max == value {
            match value.checked_sub(1) {
                Some(max) => Self::new(self.min, max),
                None => Self::EMPTY,
            }
        } else {
            *self
        }
    }
}

impl std::fmt::Display for IntRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("{}")
        } else {
            write!(f, "{}..={}", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_at_the_edges_of_i64() {
        assert!(IntRange::below(i64::MIN).is_empty());
        assert!(IntRange::above(i64::MAX).is_empty());
        assert_eq!(IntRange::below(0), IntRange::new(i64::MIN, -1));
        assert_eq!(IntRange::above(0), IntRange::new(1, i64::MAX));
    }

    #[test]
    fn test_intersect_and_includes() {
        let small = IntRange::new(0, 9);
        let large = IntRange::at_least(0);
        assert_eq!(large.intersect(IntRange::below(10)), small);
        assert!(large.includes(small));
        assert!(!small.includes(large));
        assert!(small.intersect(IntRange::above(9)).is_empty());
        assert_eq!(IntRange::new(5, 1), IntRange::EMPTY);
    }

    #[test]
    fn test_without_trims_endpoints_only() {
        let range = IntRange::new(0, 10);
        assert_eq!(range.without(0), IntRange::new(1, 10));
        assert_eq!(range.without(10), IntRange::new(0, 9));
        assert_eq!(range.without(5), range);
        assert!(IntRange::point(3).without(3).is_empty());
        assert_eq!(IntRange::ALL.without(7), IntRange::ALL);
    }

    #[test]
    fn test_display() {
        assert_eq!(IntRange::new(-1, 4).to_string(), "-1..=4");
        assert_eq!(IntRange::EMPTY.to_string(), "{}");
    }
}
