//! # stepper-xy
//!
//! Coordinated dual-axis stepper motion engine with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Straight-line interpolation**: Bresenham tick sequencing with both axes
//!   finishing on the same tick
//! - **Per-axis ramps**: Each axis accelerates and decelerates over its own
//!   step count, with a diagonal speed boost
//! - **Two timing backends**: Hardware wave playback or a blocking software
//!   loop, chosen once with automatic fallback
//! - **Exact positions**: Positions are committed per completed pulse, so
//!   cancelled moves stay consistent
//! - **Configuration-driven**: Pins, bounds and profile from TOML files
//! - **no_std compatible**: Core library needs only `alloc`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_xy::{AxisActuatorBuilder, Axis, ExecutorSelector, MotionController};
//!
//! let config = stepper_xy::load_config("motion.toml")?;
//!
//! let x = AxisActuatorBuilder::new(Axis::X)
//!     .from_axis_config(&config.x)
//!     .step_pin(x_step)
//!     .dir_pin(x_dir)
//!     .enable_pin(x_enable)
//!     .home_pin(x_home)
//!     .delay(delay_x)
//!     .build()?;
//! // ... same for Y
//!
//! let executor = ExecutorSelector::new(config.engine.backend).select(connect_wave, delay);
//! let mut controller = MotionController::new(x, y, executor, config.profile);
//!
//! controller.home_all()?;
//! controller.move_to(2000, 1500)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `log` (default): Logs through the `log` crate
//! - `alloc`: Enables serde alloc support without std
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

extern crate alloc;

// Must come first so the logging macros are visible in every module.
#[macro_use]
mod fmt;

// Core modules
pub mod axis;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod motion;

// Re-exports for ergonomic API
pub use axis::{Axis, AxisActuator, AxisActuatorBuilder, AxisPhase, AxisState, StepAxis, Unconnected};
pub use config::{validate_config, AxisConfig, BackendPreference, SystemConfig};
pub use controller::MotionController;
pub use error::{Error, Result};
pub use executor::{
    CancelToken, ExecutionResult, ExecutorKind, ExecutorSelector, HardwareTimedExecutor, Outcome,
    Progress, PulseExecutor, SelectedExecutor, SoftwareTimedExecutor, WaveDevice, WavePulse,
};
pub use motion::{Direction, MotionCoordinator, Timeline, TimelineBuilder, VelocityProfile};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::Microseconds;
