//! Single-axis stepper driver.
//!
//! Generic over embedded-hal 1.0 pin types. Owns the axis position and is the
//! only place it changes.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::config::units::Microseconds;
use crate::config::Bounds;
use crate::error::{AxisError, MotionError, Result};
use crate::motion::Direction;

use super::position::Position;
use super::state::{Axis, AxisPhase, AxisState};

/// Placeholder for a driver line that is not wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconnected;

impl ErrorType for Unconnected {
    type Error = Infallible;
}

impl OutputPin for Unconnected {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Operations the controller and executors need from an axis.
///
/// The executor hooks (`prepare`, `raise_step`, `lower_step`, `commit`,
/// `finish`) split a pulse so a backend can drive both axes' edges together
/// and commit only completed pulses.
pub trait StepAxis {
    /// Which axis this is.
    fn axis(&self) -> Axis;

    /// Snapshot of the axis.
    fn state(&self) -> AxisState;

    /// Current position in steps.
    fn position(&self) -> i64 {
        self.state().position
    }

    /// Signed steps from the current position to `target`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the distance does not fit in an `i64`.
    fn steps_to(&self, target: i64) -> Result<i64>;

    /// Numeric step line identifier, used for wave bitmasks.
    fn step_pin_id(&self) -> u8;

    /// Step pulse width.
    fn pulse_width(&self) -> Microseconds;

    /// Configured homing direction.
    fn home_direction(&self) -> Direction;

    /// Configured homing step delay.
    fn home_delay(&self) -> Microseconds;

    /// Energize the driver.
    fn enable(&mut self) -> Result<()>;

    /// De-energize the driver.
    fn disable(&mut self) -> Result<()>;

    /// Issue one complete pulse and commit it.
    fn step(&mut self, direction: Direction) -> Result<()>;

    /// Seek the home sensor and zero the position.
    ///
    /// Returns the number of steps taken.
    fn home(&mut self, direction: Direction, safe_delay: Microseconds) -> Result<u32>;

    /// Deassert the step line and disable the driver.
    fn emergency_stop(&mut self) -> Result<()>;

    /// Check that `count` steps in `direction` stay inside the bounds.
    fn check_travel(&self, direction: Direction, count: u32) -> Result<()>;

    /// Set the direction line and enter the moving phase.
    fn prepare(&mut self, direction: Direction) -> Result<()>;

    /// Assert the step line.
    fn raise_step(&mut self) -> Result<()>;

    /// Deassert the step line.
    fn lower_step(&mut self) -> Result<()>;

    /// Record `count` completed pulses in `direction`.
    fn commit(&mut self, direction: Direction, count: u32) -> Result<()>;

    /// Leave the moving phase.
    fn finish(&mut self);
}

/// Stepper axis driven through STEP/DIR/EN lines with a home switch.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `EN`: enable pin type, active low (use [`Unconnected`] if not wired)
/// - `HOME`: home switch type (must implement `InputPin`)
/// - `DELAY`: Delay provider (must implement `DelayNs`)
pub struct AxisActuator<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    axis: Axis,
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,
    home_pin: HOME,
    delay: DELAY,

    /// Current absolute position.
    position: Position,

    /// Current direction (cached to avoid unnecessary pin writes).
    current_direction: Option<Direction>,

    homed: bool,
    enabled: bool,
    phase: AxisPhase,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,
    /// Home switch reads LOW when triggered.
    home_active_low: bool,

    step_pin_id: u8,
    pulse_width: Microseconds,
    home_direction: Direction,
    home_delay: Microseconds,
    homing_limit: u32,
}

/// Construction parameters gathered by the builder.
pub(crate) struct ActuatorSettings {
    pub(crate) axis: Axis,
    pub(crate) bounds: Bounds,
    pub(crate) invert_direction: bool,
    pub(crate) home_active_low: bool,
    pub(crate) step_pin_id: u8,
    pub(crate) pulse_width: Microseconds,
    pub(crate) home_direction: Direction,
    pub(crate) home_delay: Microseconds,
    pub(crate) homing_limit: u32,
}

impl<STEP, DIR, EN, HOME, DELAY> AxisActuator<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    /// Create an unhomed axis and energize its driver.
    pub(crate) fn new(
        step_pin: STEP,
        dir_pin: DIR,
        enable_pin: EN,
        home_pin: HOME,
        delay: DELAY,
        settings: ActuatorSettings,
    ) -> Result<Self> {
        let mut actuator = Self {
            axis: settings.axis,
            step_pin,
            dir_pin,
            enable_pin,
            home_pin,
            delay,
            position: Position::new(settings.bounds),
            current_direction: None,
            homed: false,
            enabled: false,
            phase: AxisPhase::Disabled,
            invert_direction: settings.invert_direction,
            home_active_low: settings.home_active_low,
            step_pin_id: settings.step_pin_id,
            pulse_width: settings.pulse_width,
            home_direction: settings.home_direction,
            home_delay: settings.home_delay,
            homing_limit: settings.homing_limit,
        };
        actuator.step_pin.set_low().map_err(|_| actuator.pin_error())?;
        actuator.enable()?;
        Ok(actuator)
    }

    /// Get the travel bounds.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.position.bounds()
    }

    /// Check whether homing has completed.
    #[inline]
    pub fn is_homed(&self) -> bool {
        self.homed
    }

    /// Get the lifecycle phase.
    #[inline]
    pub fn phase(&self) -> AxisPhase {
        self.phase
    }

    /// Get the homing step ceiling.
    #[inline]
    pub fn homing_limit(&self) -> u32 {
        self.homing_limit
    }

    /// Read the home switch.
    pub fn home_triggered(&mut self) -> Result<bool> {
        let high = self.home_pin.is_high().map_err(|_| self.pin_error())?;
        Ok(high != self.home_active_low)
    }

    fn pin_error(&self) -> AxisError {
        AxisError::PinError(self.axis)
    }

    fn idle_phase(&self) -> AxisPhase {
        if self.homed {
            AxisPhase::Idle
        } else {
            AxisPhase::Unhomed
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if !self.enabled {
            return Err(AxisError::Disabled(self.axis).into());
        }
        if !self.homed {
            return Err(AxisError::NotHomed(self.axis).into());
        }
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = match direction {
            Direction::Positive => !self.invert_direction,
            Direction::Negative => self.invert_direction,
        };

        let written = if pin_high {
            self.dir_pin.set_high()
        } else {
            self.dir_pin.set_low()
        };
        written.map_err(|_| self.pin_error())?;

        self.current_direction = Some(direction);
        Ok(())
    }

    /// One full pulse without any bookkeeping.
    fn pulse(&mut self) -> Result<()> {
        self.raise_step()?;
        self.delay.delay_us(self.pulse_width.value());
        self.lower_step()
    }
}

impl<STEP, DIR, EN, HOME, DELAY> StepAxis for AxisActuator<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    #[inline]
    fn axis(&self) -> Axis {
        self.axis
    }

    fn state(&self) -> AxisState {
        let bounds = self.position.bounds();
        AxisState {
            axis: self.axis,
            position: self.position.steps(),
            homed: self.homed,
            min_position: bounds.min,
            max_position: bounds.max,
            inverted: self.invert_direction,
            enabled: self.enabled,
            phase: self.phase,
        }
    }

    #[inline]
    fn position(&self) -> i64 {
        self.position.steps()
    }

    fn steps_to(&self, target: i64) -> Result<i64> {
        self.position.steps_to(target).ok_or_else(|| {
            let bounds = self.position.bounds();
            MotionError::OutOfRange {
                axis: self.axis,
                target,
                min: bounds.min,
                max: bounds.max,
            }
            .into()
        })
    }

    #[inline]
    fn step_pin_id(&self) -> u8 {
        self.step_pin_id
    }

    #[inline]
    fn pulse_width(&self) -> Microseconds {
        self.pulse_width
    }

    #[inline]
    fn home_direction(&self) -> Direction {
        self.home_direction
    }

    #[inline]
    fn home_delay(&self) -> Microseconds {
        self.home_delay
    }

    fn enable(&mut self) -> Result<()> {
        self.enable_pin.set_low().map_err(|_| self.pin_error())?;
        self.enabled = true;
        self.phase = self.idle_phase();
        debug!("axis {}: enabled", self.axis.as_str());
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.enable_pin.set_high().map_err(|_| self.pin_error())?;
        self.enabled = false;
        self.phase = AxisPhase::Disabled;
        debug!("axis {}: disabled", self.axis.as_str());
        Ok(())
    }

    fn step(&mut self, direction: Direction) -> Result<()> {
        self.ensure_ready()?;
        self.check_travel(direction, 1)?;
        self.set_direction(direction)?;
        self.pulse()?;
        self.position.move_steps(direction.sign());
        Ok(())
    }

    fn home(&mut self, direction: Direction, safe_delay: Microseconds) -> Result<u32> {
        if !self.enabled {
            return Err(AxisError::Disabled(self.axis).into());
        }
        info!(
            "axis {}: homing toward {}",
            self.axis.as_str(),
            if direction == Direction::Positive { "positive" } else { "negative" }
        );

        self.phase = AxisPhase::Homing;
        self.homed = false;
        let result = self.seek_home(direction, safe_delay);
        match result {
            Ok(steps) => {
                self.position.reset();
                self.homed = true;
                self.phase = AxisPhase::Idle;
                info!("axis {}: homed after {} steps", self.axis.as_str(), steps);
            }
            Err(_) => {
                self.phase = AxisPhase::Unhomed;
                warn!("axis {}: homing failed", self.axis.as_str());
            }
        }
        result
    }

    fn emergency_stop(&mut self) -> Result<()> {
        let lowered = self.lower_step();
        self.disable()?;
        lowered
    }

    fn check_travel(&self, direction: Direction, count: u32) -> Result<()> {
        let target = self.position.after(direction, count);
        match self.position.bounds().violated_by(target) {
            Some(limit) => Err(AxisError::LimitExceeded {
                axis: self.axis,
                position: target,
                limit,
            }
            .into()),
            None => Ok(()),
        }
    }

    fn prepare(&mut self, direction: Direction) -> Result<()> {
        self.ensure_ready()?;
        self.set_direction(direction)?;
        self.phase = AxisPhase::Moving;
        Ok(())
    }

    fn raise_step(&mut self) -> Result<()> {
        self.step_pin.set_high().map_err(|_| self.pin_error().into())
    }

    fn lower_step(&mut self) -> Result<()> {
        self.step_pin.set_low().map_err(|_| self.pin_error().into())
    }

    fn commit(&mut self, direction: Direction, count: u32) -> Result<()> {
        self.check_travel(direction, count)?;
        self.position.move_steps(direction.sign() * i64::from(count));
        Ok(())
    }

    fn finish(&mut self) {
        if self.phase == AxisPhase::Moving {
            self.phase = self.idle_phase();
        }
    }
}

impl<STEP, DIR, EN, HOME, DELAY> AxisActuator<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    fn seek_home(&mut self, direction: Direction, safe_delay: Microseconds) -> Result<u32> {
        self.set_direction(direction)?;
        let gap = safe_delay - self.pulse_width;

        let mut steps = 0;
        while steps < self.homing_limit {
            if self.home_triggered()? {
                return Ok(steps);
            }
            self.pulse()?;
            self.delay.delay_us(gap.value());
            steps += 1;
        }

        if self.home_triggered()? {
            return Ok(steps);
        }
        Err(AxisError::HomingTimeout {
            axis: self.axis,
            steps,
        }
        .into())
    }
}
