//! Builder pattern for AxisActuator.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::units::Microseconds;
use crate::config::{AxisConfig, Bounds};
use crate::error::{ConfigError, Error, Result};
use crate::motion::Direction;

use super::actuator::{ActuatorSettings, AxisActuator, Unconnected};
use super::state::Axis;

/// Builder for creating AxisActuator instances.
///
/// The enable line defaults to [`Unconnected`]; calling
/// [`enable_pin`](Self::enable_pin) swaps in a real pin type.
pub struct AxisActuatorBuilder<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    axis: Axis,
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    enable_pin: EN,
    home_pin: Option<HOME>,
    delay: Option<DELAY>,
    bounds: Option<Bounds>,
    invert_direction: bool,
    home_active_low: bool,
    step_pin_id: u8,
    pulse_width: Microseconds,
    home_direction: Direction,
    home_delay: Microseconds,
    homing_limit: Option<u32>,
}

impl<STEP, DIR, HOME, DELAY> AxisActuatorBuilder<STEP, DIR, Unconnected, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    /// Create a new builder for `axis`.
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            step_pin: None,
            dir_pin: None,
            enable_pin: Unconnected,
            home_pin: None,
            delay: None,
            bounds: None,
            invert_direction: false,
            home_active_low: true,
            step_pin_id: 0,
            pulse_width: Microseconds(5),
            home_direction: Direction::Negative,
            home_delay: Microseconds(5000),
            homing_limit: None,
        }
    }
}

impl<STEP, DIR, EN, HOME, DELAY> AxisActuatorBuilder<STEP, DIR, EN, HOME, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    HOME: InputPin,
    DELAY: DelayNs,
{
    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set the active-low enable pin.
    pub fn enable_pin<P: OutputPin>(self, pin: P) -> AxisActuatorBuilder<STEP, DIR, P, HOME, DELAY> {
        AxisActuatorBuilder {
            axis: self.axis,
            step_pin: self.step_pin,
            dir_pin: self.dir_pin,
            enable_pin: pin,
            home_pin: self.home_pin,
            delay: self.delay,
            bounds: self.bounds,
            invert_direction: self.invert_direction,
            home_active_low: self.home_active_low,
            step_pin_id: self.step_pin_id,
            pulse_width: self.pulse_width,
            home_direction: self.home_direction,
            home_delay: self.home_delay,
            homing_limit: self.homing_limit,
        }
    }

    /// Set the home switch input.
    pub fn home_pin(mut self, pin: HOME) -> Self {
        self.home_pin = Some(pin);
        self
    }

    /// Set the delay provider.
    pub fn delay(mut self, delay: DELAY) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the travel bounds.
    pub fn bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Set direction inversion.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set whether the home switch reads LOW when triggered.
    pub fn home_active_low(mut self, active_low: bool) -> Self {
        self.home_active_low = active_low;
        self
    }

    /// Set the numeric step line identifier used by wave programs.
    pub fn step_pin_id(mut self, id: u8) -> Self {
        self.step_pin_id = id;
        self
    }

    /// Set the step pulse width.
    pub fn pulse_width(mut self, width: Microseconds) -> Self {
        self.pulse_width = width;
        self
    }

    /// Set the default homing direction.
    pub fn home_direction(mut self, direction: Direction) -> Self {
        self.home_direction = direction;
        self
    }

    /// Set the default homing step delay.
    pub fn home_delay(mut self, delay: Microseconds) -> Self {
        self.home_delay = delay;
        self
    }

    /// Set the homing step ceiling.
    pub fn homing_limit(mut self, steps: u32) -> Self {
        self.homing_limit = Some(steps);
        self
    }

    /// Configure from an AxisConfig.
    pub fn from_axis_config(mut self, config: &AxisConfig) -> Self {
        self.bounds = Some(config.bounds());
        self.invert_direction = config.invert_direction;
        self.home_active_low = config.home_active_low;
        self.step_pin_id = config.step_pin;
        self.pulse_width = config.pulse_width;
        self.home_direction = config.home_direction;
        self.home_delay = config.home_delay;
        self.homing_limit = Some(config.homing_limit());
        self
    }

    /// Build the AxisActuator.
    ///
    /// The step line is driven low and the driver enabled; the axis starts
    /// unhomed.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or a line cannot be
    /// driven.
    pub fn build(self) -> Result<AxisActuator<STEP, DIR, EN, HOME, DELAY>> {
        let step_pin = self.step_pin.ok_or_else(|| missing("step_pin"))?;
        let dir_pin = self.dir_pin.ok_or_else(|| missing("dir_pin"))?;
        let home_pin = self.home_pin.ok_or_else(|| missing("home_pin"))?;
        let delay = self.delay.ok_or_else(|| missing("delay"))?;
        let bounds = self.bounds.ok_or_else(|| missing("bounds"))?;

        if !bounds.is_valid() {
            return Err(ConfigError::InvalidBounds {
                axis: self.axis,
                min: bounds.min,
                max: bounds.max,
            }
            .into());
        }

        let homing_limit = self
            .homing_limit
            .unwrap_or_else(|| u32::try_from(bounds.span()).unwrap_or(u32::MAX));

        AxisActuator::new(
            step_pin,
            dir_pin,
            self.enable_pin,
            home_pin,
            delay,
            ActuatorSettings {
                axis: self.axis,
                bounds,
                invert_direction: self.invert_direction,
                home_active_low: self.home_active_low,
                step_pin_id: self.step_pin_id,
                pulse_width: self.pulse_width,
                home_direction: self.home_direction,
                home_delay: self.home_delay,
                homing_limit,
            },
        )
    }
}

fn missing(field: &'static str) -> Error {
    Error::Config(ConfigError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::StepAxis;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn test_missing_pin_reported() {
        let builder: AxisActuatorBuilder<PinMock, PinMock, Unconnected, PinMock, NoopDelay> =
            AxisActuatorBuilder::new(Axis::X).bounds(Bounds::new(0, 10));

        assert!(matches!(
            builder.build(),
            Err(Error::Config(ConfigError::MissingField("step_pin")))
        ));
    }

    #[test]
    fn test_from_axis_config() {
        let config = AxisConfig {
            step_pin: 27,
            dir_pin: 22,
            enable_pin: None,
            home_pin: 24,
            invert_direction: true,
            min_position: -50,
            max_position: 4000,
            home_direction: Direction::Positive,
            home_delay: Microseconds(3000),
            pulse_width: Microseconds(8),
            homing_max_steps: None,
            home_active_low: true,
        };
        let mut step = PinMock::new(&[Transaction::set(State::Low)]);
        let mut dir = PinMock::new(&[]);
        let mut home = PinMock::new(&[]);

        let axis = AxisActuatorBuilder::new(Axis::Y)
            .from_axis_config(&config)
            .step_pin(step.clone())
            .dir_pin(dir.clone())
            .home_pin(home.clone())
            .delay(NoopDelay::new())
            .build()
            .unwrap();

        let state = axis.state();
        assert_eq!((state.min_position, state.max_position), (-50, 4000));
        assert!(state.inverted);
        assert!(state.enabled);
        assert!(!state.homed);
        assert_eq!(axis.step_pin_id(), 27);
        assert_eq!(axis.pulse_width(), Microseconds(8));
        assert_eq!(axis.home_direction(), Direction::Positive);
        assert_eq!(axis.homing_limit(), 4050);

        step.done();
        dir.done();
        home.done();
    }
}
