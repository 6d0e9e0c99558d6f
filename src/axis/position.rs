//! Position tracking for a bounded axis.
//!
//! Provides absolute position tracking in steps against the axis travel range.

use crate::config::Bounds;
use crate::motion::Direction;

/// Axis position tracker.
///
/// Maintains absolute position in steps from home and the range it may
/// occupy once homed.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    /// Current position in steps (from home)
    steps: i64,
    /// Travel range
    bounds: Bounds,
}

impl Position {
    /// Create a tracker at home.
    #[inline]
    pub fn new(bounds: Bounds) -> Self {
        Self { steps: 0, bounds }
    }

    /// Get current position in steps.
    #[inline]
    pub fn steps(&self) -> i64 {
        self.steps
    }

    /// Get the travel range.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Position reached after `count` steps in `direction`.
    #[inline]
    pub fn after(&self, direction: Direction, count: u32) -> i64 {
        self.steps + direction.sign() * i64::from(count)
    }

    /// Move by a number of steps.
    #[inline]
    pub fn move_steps(&mut self, delta: i64) {
        self.steps += delta;
    }

    /// Reset position to home (0 steps).
    #[inline]
    pub fn reset(&mut self) {
        self.steps = 0;
    }

    /// Calculate steps needed to reach an absolute target.
    ///
    /// Returns `None` when the delta does not fit in an `i64`.
    #[inline]
    pub fn steps_to(&self, target: i64) -> Option<i64> {
        target.checked_sub(self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_tracking() {
        let mut pos = Position::new(Bounds::new(0, 5000));

        assert_eq!(pos.steps(), 0);
        pos.move_steps(120);
        pos.move_steps(-20);
        assert_eq!(pos.steps(), 100);
        assert_eq!(pos.after(Direction::Negative, 30), 70);

        pos.reset();
        assert_eq!(pos.steps(), 0);
    }

    #[test]
    fn test_steps_to_target() {
        let mut pos = Position::new(Bounds::new(-500, 500));
        pos.move_steps(-300);

        assert_eq!(pos.steps_to(200), Some(500));
        assert_eq!(pos.steps_to(-400), Some(-100));
        assert_eq!(pos.steps_to(i64::MAX), None);
    }
}
