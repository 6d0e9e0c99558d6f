//! Unit types for timing quantities.
//!
//! Keeps step delays and pulse widths from being confused with step counts.

use core::ops::Sub;

use serde::Deserialize;

/// Duration in whole microseconds.
///
/// Used for inter-step delays, pulse widths and wave program timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Microseconds(pub u32);

impl Microseconds {
    /// Create a new Microseconds value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Get the value as f32 for ramp interpolation.
    #[inline]
    pub fn as_f32(self) -> f32 {
        self.0 as f32
    }

    /// Round an interpolated f32 value back to whole microseconds.
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        if value <= 0.0 {
            Self(0)
        } else {
            Self(libm::roundf(value) as u32)
        }
    }
}

impl Sub for Microseconds {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        assert_eq!(Microseconds::from_f32(1259.4), Microseconds(1259));
        assert_eq!(Microseconds::from_f32(1259.5), Microseconds(1260));
        assert_eq!(Microseconds::from_f32(-3.0), Microseconds(0));
    }

    #[test]
    fn test_saturating_sub() {
        assert_eq!(Microseconds(5) - Microseconds(10), Microseconds(0));
    }
}
