//! Position bounds in steps.

/// Inclusive travel range of an axis, in steps from home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Minimum allowed position.
    pub min: i64,

    /// Maximum allowed position.
    pub max: i64,
}

impl Bounds {
    /// Create new bounds.
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Bounds are valid when non-empty and containing the home position.
    pub fn is_valid(&self) -> bool {
        self.min < self.max && self.contains(0)
    }

    /// Check if a position is within bounds.
    #[inline]
    pub fn contains(&self, position: i64) -> bool {
        position >= self.min && position <= self.max
    }

    /// Return the bound crossed by `target`, if any.
    pub fn violated_by(&self, target: i64) -> Option<i64> {
        if target < self.min {
            Some(self.min)
        } else if target > self.max {
            Some(self.max)
        } else {
            None
        }
    }

    /// Number of steps between the two bounds.
    #[inline]
    pub fn span(&self) -> u64 {
        self.max.abs_diff(self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let bounds = Bounds::new(0, 5000);

        assert!(bounds.contains(0));
        assert!(bounds.contains(5000));
        assert!(!bounds.contains(-1));
        assert!(!bounds.contains(5001));
    }

    #[test]
    fn test_violated_by() {
        let bounds = Bounds::new(-100, 100);

        assert_eq!(bounds.violated_by(0), None);
        assert_eq!(bounds.violated_by(-101), Some(-100));
        assert_eq!(bounds.violated_by(250), Some(100));
    }

    #[test]
    fn test_validity() {
        assert!(Bounds::new(0, 10).is_valid());
        assert!(!Bounds::new(10, 10).is_valid());
        assert!(!Bounds::new(5, 10).is_valid()); // home outside travel
        assert_eq!(Bounds::new(-20, 30).span(), 50);
    }
}
