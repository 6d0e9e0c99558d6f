//! Axis configuration from TOML.

use serde::Deserialize;

use super::limits::Bounds;
use super::units::Microseconds;
use crate::motion::Direction;

/// Pin wiring, travel and homing settings for one axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// GPIO pin for the step signal.
    pub step_pin: u8,

    /// GPIO pin for the direction signal.
    pub dir_pin: u8,

    /// GPIO pin for the driver enable line (active low).
    #[serde(default)]
    pub enable_pin: Option<u8>,

    /// GPIO pin for the home/limit switch.
    pub home_pin: u8,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Lowest reachable position in steps.
    #[serde(default)]
    pub min_position: i64,

    /// Highest reachable position in steps.
    pub max_position: i64,

    /// Direction to travel while seeking the home switch.
    #[serde(default = "default_home_direction")]
    pub home_direction: Direction,

    /// Step delay used while homing.
    #[serde(default = "default_home_delay", rename = "home_delay_us")]
    pub home_delay: Microseconds,

    /// Width of the step pulse.
    #[serde(default = "default_pulse_width", rename = "pulse_width_us")]
    pub pulse_width: Microseconds,

    /// Homing step ceiling; defaults to the axis span.
    #[serde(default)]
    pub homing_max_steps: Option<u32>,

    /// Home switch reads LOW when triggered (pull-up wiring).
    #[serde(default = "default_home_active_low")]
    pub home_active_low: bool,
}

fn default_home_direction() -> Direction {
    Direction::Negative
}

fn default_home_delay() -> Microseconds {
    Microseconds(5000)
}

fn default_pulse_width() -> Microseconds {
    Microseconds(5)
}

fn default_home_active_low() -> bool {
    true
}

impl AxisConfig {
    /// Travel bounds in steps.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min_position, self.max_position)
    }

    /// Effective homing step ceiling.
    pub fn homing_limit(&self) -> u32 {
        self.homing_max_steps
            .unwrap_or_else(|| u32::try_from(self.bounds().span()).unwrap_or(u32::MAX))
    }

    /// All pins used by this axis.
    pub fn pins(&self) -> impl Iterator<Item = u8> + '_ {
        [Some(self.step_pin), Some(self.dir_pin), self.enable_pin, Some(self.home_pin)]
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis() -> AxisConfig {
        AxisConfig {
            step_pin: 17,
            dir_pin: 15,
            enable_pin: Some(5),
            home_pin: 23,
            invert_direction: false,
            min_position: 0,
            max_position: 5000,
            home_direction: Direction::Negative,
            home_delay: Microseconds(5000),
            pulse_width: Microseconds(5),
            homing_max_steps: None,
            home_active_low: true,
        }
    }

    #[test]
    fn test_homing_limit_defaults_to_span() {
        let mut config = axis();
        config.min_position = -200;
        assert_eq!(config.homing_limit(), 5200);

        config.homing_max_steps = Some(300);
        assert_eq!(config.homing_limit(), 300);
    }

    #[test]
    fn test_pins_skip_missing_enable() {
        let mut config = axis();
        assert_eq!(config.pins().count(), 4);

        config.enable_pin = None;
        let pins: heapless::Vec<u8, 4> = config.pins().collect();
        assert_eq!(pins.as_slice(), &[17, 15, 23]);
    }
}
