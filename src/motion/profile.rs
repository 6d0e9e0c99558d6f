//! Velocity profile and per-axis ramp calculation.
//!
//! Each axis ramps over its own step count: the delay falls linearly from
//! `max_delay` to `min_delay` across the acceleration ramp, holds at
//! `min_delay` while cruising, and mirrors the ramp on the way down.

use serde::Deserialize;

use crate::config::units::Microseconds;

/// Direction of travel along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Increasing position.
    Positive,
    /// Decreasing position.
    Negative,
}

impl Direction {
    /// Get direction from signed step count.
    #[inline]
    pub fn from_steps(steps: i64) -> Self {
        if steps >= 0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }

    /// Opposite direction.
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }
}

/// Phase of an axis ramp at a given step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    /// Delay shrinking toward cruise speed.
    Accelerating,
    /// Holding `min_delay`.
    Cruising,
    /// Delay growing back toward `max_delay`.
    Decelerating,
    /// Step index past the end of the move.
    Complete,
}

/// Delay-shaping constants for coordinated moves.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct VelocityProfile {
    /// Cruise delay between steps (fastest).
    #[serde(rename = "min_delay_us", default = "default_min_delay")]
    pub min_delay: Microseconds,

    /// Start and end delay between steps (slowest).
    #[serde(rename = "max_delay_us", default = "default_max_delay")]
    pub max_delay: Microseconds,

    /// Ramp length in steps.
    #[serde(default = "default_ramp_steps")]
    pub ramp_steps: u32,

    /// Delay multiplier when both axes fire on one tick.
    #[serde(default = "default_diagonal_boost")]
    pub diagonal_boost: f32,

    /// When false every step runs at `min_delay`.
    #[serde(default = "default_acceleration")]
    pub acceleration: bool,
}

fn default_min_delay() -> Microseconds {
    Microseconds(125)
}

fn default_max_delay() -> Microseconds {
    Microseconds(2000)
}

fn default_ramp_steps() -> u32 {
    200
}

fn default_diagonal_boost() -> f32 {
    0.7
}

fn default_acceleration() -> bool {
    true
}

impl Default for VelocityProfile {
    fn default() -> Self {
        Self {
            min_delay: default_min_delay(),
            max_delay: default_max_delay(),
            ramp_steps: default_ramp_steps(),
            diagonal_boost: default_diagonal_boost(),
            acceleration: default_acceleration(),
        }
    }
}

impl VelocityProfile {
    /// Create a profile with acceleration enabled.
    pub fn new(
        min_delay: Microseconds,
        max_delay: Microseconds,
        ramp_steps: u32,
        diagonal_boost: f32,
    ) -> Self {
        Self {
            min_delay,
            max_delay,
            ramp_steps,
            diagonal_boost,
            acceleration: true,
        }
    }

    /// Ramp length for an axis moving `axis_steps` steps.
    ///
    /// Short moves split their steps evenly between the two ramps, rounding
    /// down, so an odd count leaves one middle step at cruise delay.
    #[inline]
    pub fn effective_ramp(&self, axis_steps: u32) -> u32 {
        if !self.acceleration {
            return 0;
        }
        self.ramp_steps.min(axis_steps / 2)
    }

    /// Get the ramp phase of step `step` out of `axis_steps`.
    pub fn phase_at(&self, step: u32, axis_steps: u32) -> MotionPhase {
        let ramp = self.effective_ramp(axis_steps);
        if step >= axis_steps {
            MotionPhase::Complete
        } else if step < ramp {
            MotionPhase::Accelerating
        } else if step >= axis_steps - ramp {
            MotionPhase::Decelerating
        } else {
            MotionPhase::Cruising
        }
    }

    /// Delay following step `step` of an axis moving `axis_steps` steps.
    pub fn axis_delay(&self, step: u32, axis_steps: u32) -> Microseconds {
        let ramp = self.effective_ramp(axis_steps);
        match self.phase_at(step, axis_steps) {
            MotionPhase::Accelerating => self.ramp_delay(step, ramp),
            MotionPhase::Decelerating => self.ramp_delay(axis_steps - 1 - step, ramp),
            MotionPhase::Cruising | MotionPhase::Complete => self.min_delay,
        }
    }

    /// Apply the diagonal boost to a tick delay, never going below cruise.
    #[inline]
    pub fn boosted(&self, delay: Microseconds) -> Microseconds {
        let boosted = Microseconds::from_f32(delay.as_f32() * self.diagonal_boost);
        boosted.max(self.min_delay)
    }

    fn ramp_delay(&self, step: u32, ramp: u32) -> Microseconds {
        let span = self.max_delay.as_f32() - self.min_delay.as_f32();
        let progress = step as f32 / ramp as f32;
        Microseconds::from_f32(self.max_delay.as_f32() - span * progress)
    }
}
