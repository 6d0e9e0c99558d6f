//! Configuration validation.

use crate::error::{ConfigError, Error, Result};
use crate::motion::VelocityProfile;

use super::{AxisConfig, SystemConfig};

/// Highest pin id that fits a 32-bit GPIO mask.
const MAX_PIN: u8 = 31;

/// Validate a system configuration.
///
/// Checks:
/// - Axis bounds are non-empty and contain the home position
/// - Delays are positive and ordered, boost is in `(0, 1]`
/// - Step pulses fit inside the cruise delay
/// - Pin ids fit a GPIO mask and are not shared
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    validate_profile(&config.profile)?;

    for (axis, axis_config) in config.axes() {
        let bounds = axis_config.bounds();
        if !bounds.is_valid() {
            return Err(Error::Config(ConfigError::InvalidBounds {
                axis,
                min: bounds.min,
                max: bounds.max,
            }));
        }
        validate_pulse(axis_config, &config.profile)?;
    }

    validate_pins(config)
}

/// Validate a velocity profile on its own.
pub fn validate_profile(profile: &VelocityProfile) -> Result<()> {
    if profile.min_delay.0 == 0 || profile.min_delay > profile.max_delay {
        return Err(Error::Config(ConfigError::InvalidDelays {
            min_us: profile.min_delay.0,
            max_us: profile.max_delay.0,
        }));
    }

    if !(profile.diagonal_boost > 0.0 && profile.diagonal_boost <= 1.0) {
        return Err(Error::Config(ConfigError::InvalidDiagonalBoost(
            profile.diagonal_boost,
        )));
    }

    Ok(())
}

fn validate_pulse(axis: &AxisConfig, profile: &VelocityProfile) -> Result<()> {
    if axis.pulse_width.0 == 0 || axis.pulse_width >= profile.min_delay {
        return Err(Error::Config(ConfigError::InvalidPulseWidth {
            pulse_us: axis.pulse_width.0,
            min_delay_us: profile.min_delay.0,
        }));
    }

    if axis.pulse_width >= axis.home_delay {
        return Err(Error::Config(ConfigError::InvalidPulseWidth {
            pulse_us: axis.pulse_width.0,
            min_delay_us: axis.home_delay.0,
        }));
    }

    Ok(())
}

fn validate_pins(config: &SystemConfig) -> Result<()> {
    let mut seen: u32 = 0;

    for (_, axis) in config.axes() {
        for pin in axis.pins() {
            if pin > MAX_PIN {
                return Err(Error::Config(ConfigError::InvalidPin(pin)));
            }
            let bit = 1u32 << pin;
            if seen & bit != 0 {
                return Err(Error::Config(ConfigError::DuplicatePin(pin)));
            }
            seen |= bit;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::Microseconds;

    #[test]
    fn test_default_profile_is_valid() {
        assert!(validate_profile(&VelocityProfile::default()).is_ok());
    }

    #[test]
    fn test_inverted_delays_rejected() {
        let profile = VelocityProfile {
            min_delay: Microseconds(3000),
            max_delay: Microseconds(2000),
            ..VelocityProfile::default()
        };

        assert!(matches!(
            validate_profile(&profile),
            Err(Error::Config(ConfigError::InvalidDelays { .. }))
        ));
    }

    #[test]
    fn test_boost_out_of_range() {
        for boost in [0.0, -0.5, 1.5, f32::NAN] {
            let profile = VelocityProfile {
                diagonal_boost: boost,
                ..VelocityProfile::default()
            };
            assert!(validate_profile(&profile).is_err(), "boost {} accepted", boost);
        }
    }
}
