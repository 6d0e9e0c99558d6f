//! Two-axis interpolation.
//!
//! Turns a displacement into a tick sequence: the dominant axis fires on
//! every tick, a Bresenham accumulator decides when the minor axis joins it,
//! and each tick is paced by the slower of the axes firing on it.

use alloc::vec::Vec;

use crate::axis::{Axis, AxisState};
use crate::config::units::Microseconds;
use crate::config::validate_profile;
use crate::error::{AxisError, MotionError, Result};

use super::profile::{Direction, VelocityProfile};

/// Which axes fire on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FireMask {
    /// Only X steps.
    X,
    /// Only Y steps.
    Y,
    /// Both axes step on the same instant.
    XY,
}

impl FireMask {
    /// Whether `axis` fires on this tick.
    #[inline]
    pub fn fires(self, axis: Axis) -> bool {
        matches!(
            (self, axis),
            (FireMask::XY, _) | (FireMask::X, Axis::X) | (FireMask::Y, Axis::Y)
        )
    }

    /// Whether both axes fire.
    #[inline]
    pub fn is_diagonal(self) -> bool {
        self == FireMask::XY
    }
}

/// One iteration of the interpolation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Axes pulsed on this tick.
    pub fires: FireMask,
    /// Time from this tick's pulse to the next tick.
    pub delay: Microseconds,
}

/// Planned coordinated move.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    ticks: Vec<Tick>,
    x_direction: Direction,
    y_direction: Direction,
    x_steps: u32,
    y_steps: u32,
}

impl Timeline {
    /// A move that goes nowhere.
    pub fn empty() -> Self {
        Self {
            ticks: Vec::new(),
            x_direction: Direction::Positive,
            y_direction: Direction::Positive,
            x_steps: 0,
            y_steps: 0,
        }
    }

    /// Ticks in execution order.
    #[inline]
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Number of ticks.
    #[inline]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Check whether the move issues no pulses.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Direction of travel for an axis.
    #[inline]
    pub fn direction(&self, axis: Axis) -> Direction {
        match axis {
            Axis::X => self.x_direction,
            Axis::Y => self.y_direction,
        }
    }

    /// Pulses an axis will receive.
    #[inline]
    pub fn steps(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x_steps,
            Axis::Y => self.y_steps,
        }
    }

    /// Signed displacement for an axis.
    #[inline]
    pub fn delta(&self, axis: Axis) -> i64 {
        self.direction(axis).sign() * i64::from(self.steps(axis))
    }

    /// Sum of all tick delays.
    pub fn duration(&self) -> u64 {
        self.ticks.iter().map(|t| u64::from(t.delay.0)).sum()
    }

    /// Index of the last tick on which `axis` fires.
    pub fn last_fire(&self, axis: Axis) -> Option<usize> {
        self.ticks.iter().rposition(|t| t.fires.fires(axis))
    }
}

/// Plans coordinated moves against the current axis states.
#[derive(Debug, Clone)]
pub struct MotionCoordinator {
    profile: VelocityProfile,
}

impl MotionCoordinator {
    /// Create a coordinator using `profile` for every move.
    pub fn new(profile: VelocityProfile) -> Self {
        Self { profile }
    }

    /// Get the velocity profile.
    #[inline]
    pub fn profile(&self) -> &VelocityProfile {
        &self.profile
    }

    /// Validate a displacement and interpolate it.
    ///
    /// # Errors
    ///
    /// - `InvalidDelays` or `InvalidDiagonalBoost` if the profile is unusable
    /// - `NotHomed` or `Disabled` if a moving axis cannot be stepped
    /// - `OutOfRange` if either target lies outside its bounds
    /// - `TooLong` if the dominant delta does not fit the tick counter
    pub fn plan(&self, dx: i64, dy: i64, x: &AxisState, y: &AxisState) -> Result<Timeline> {
        validate_profile(&self.profile)?;
        if dx == 0 && dy == 0 {
            return Ok(Timeline::empty());
        }
        check_axis(dx, x)?;
        check_axis(dy, y)?;

        let timeline = self.interpolate(dx, dy)?;
        debug!(
            "planned move dx={} dy={}: {} ticks, {}us",
            dx,
            dy,
            timeline.len(),
            timeline.duration()
        );
        Ok(timeline)
    }

    /// Build the tick sequence for a displacement without checking bounds.
    pub fn interpolate(&self, dx: i64, dy: i64) -> Result<Timeline> {
        let x_steps = step_count(dx)?;
        let y_steps = step_count(dy)?;

        let x_major = x_steps >= y_steps;
        let (major, minor) = if x_major {
            (x_steps, y_steps)
        } else {
            (y_steps, x_steps)
        };

        let mut ticks = Vec::with_capacity(major as usize);
        // End-aligned accumulator: the minor axis fires on the final tick.
        let mut error: u64 = 0;
        let mut minor_step: u32 = 0;

        for step in 0..major {
            error += u64::from(minor);
            let minor_fires = error >= u64::from(major);
            let major_delay = self.profile.axis_delay(step, major);

            let tick = if minor_fires {
                error -= u64::from(major);
                let minor_delay = self.profile.axis_delay(minor_step, minor);
                minor_step += 1;
                Tick {
                    fires: FireMask::XY,
                    delay: self.profile.boosted(major_delay.max(minor_delay)),
                }
            } else {
                Tick {
                    fires: if x_major { FireMask::X } else { FireMask::Y },
                    delay: major_delay,
                }
            };
            ticks.push(tick);
        }

        Ok(Timeline {
            ticks,
            x_direction: Direction::from_steps(dx),
            y_direction: Direction::from_steps(dy),
            x_steps,
            y_steps,
        })
    }
}

fn step_count(delta: i64) -> Result<u32> {
    let steps = delta.unsigned_abs();
    u32::try_from(steps).map_err(|_| MotionError::TooLong { steps }.into())
}

fn check_axis(delta: i64, state: &AxisState) -> Result<()> {
    if delta == 0 {
        return Ok(());
    }
    if !state.homed {
        return Err(AxisError::NotHomed(state.axis).into());
    }
    if !state.enabled {
        return Err(AxisError::Disabled(state.axis).into());
    }

    let out_of_range = MotionError::OutOfRange {
        axis: state.axis,
        target: state.position.saturating_add(delta),
        min: state.min_position,
        max: state.max_position,
    };
    match state.position.checked_add(delta) {
        Some(target) if state.contains(target) => Ok(()),
        _ => Err(out_of_range.into()),
    }
}
