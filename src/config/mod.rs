//! Configuration module for stepper-xy.
//!
//! Provides types for loading and validating axis wiring, travel bounds, the
//! velocity profile and the backend preference from TOML files (with `std`
//! feature) or pre-built values.

mod axis;
mod limits;
#[cfg(feature = "std")]
mod loader;
mod system;
pub mod units;
mod validation;

pub use axis::AxisConfig;
pub use limits::Bounds;
pub use system::{BackendPreference, EngineConfig, SystemConfig};
pub use validation::{validate_config, validate_profile};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

pub use units::Microseconds;
