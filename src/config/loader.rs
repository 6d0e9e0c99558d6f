//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::SystemConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
///
/// ```rust,ignore
/// use stepper_xy::load_config;
///
/// let config = load_config("gantry.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SystemConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = truncated(&e.to_string());
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<SystemConfig> {
    let config: SystemConfig = toml::from_str(content)
        .map_err(|e| Error::Config(ConfigError::ParseError(truncated(e.message()))))?;

    super::validation::validate_config(&config)?;

    Ok(config)
}

/// Copy as much of `msg` as fits, cutting on a char boundary.
fn truncated(msg: &str) -> heapless::String<128> {
    let mut out = heapless::String::new();
    for c in msg.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendPreference;
    use crate::motion::Direction;

    const MINIMAL: &str = r#"
[x]
step_pin = 17
dir_pin = 15
home_pin = 23
max_position = 5000

[y]
step_pin = 27
dir_pin = 22
home_pin = 24
max_position = 4000
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(MINIMAL).unwrap();

        assert_eq!(config.x.step_pin, 17);
        assert_eq!(config.y.max_position, 4000);
        assert_eq!(config.x.home_direction, Direction::Negative);
        assert_eq!(config.x.pulse_width.0, 5);
        assert_eq!(config.profile.ramp_steps, 200);
        assert_eq!(config.engine.backend, BackendPreference::Hardware);
    }

    #[test]
    fn test_parse_full_profile() {
        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
[profile]
min_delay_us = 800
max_delay_us = 4000
ramp_steps = 50
diagonal_boost = 0.7
acceleration = false

[engine]
backend = "software"
"#
        );

        let config = parse_config(&toml).unwrap();
        assert_eq!(config.profile.min_delay.0, 800);
        assert_eq!(config.profile.max_delay.0, 4000);
        assert!(!config.profile.acceleration);
        assert_eq!(config.engine.backend, BackendPreference::Software);
    }

    #[test]
    fn test_shared_pin_rejected() {
        let toml = MINIMAL.replace("step_pin = 27", "step_pin = 17");
        assert!(matches!(
            parse_config(&toml),
            Err(Error::Config(ConfigError::DuplicatePin(17)))
        ));
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            parse_config("[x]\nstep_pin = \"seventeen\""),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/gantry.toml"),
            Err(Error::Config(ConfigError::IoError(_)))
        ));
    }
}
