//! Error types for stepper-xy.
//!
//! Provides unified error handling across configuration, axis control, motion
//! planning and pulse execution.

use core::fmt;

use crate::axis::Axis;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-xy operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Single-axis operation error
    Axis(AxisError),
    /// Coordinated move planning or execution error
    Motion(MotionError),
    /// Pulse executor error
    Executor(ExecutorError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Position bounds must satisfy `min <= 0 <= max` and `min < max`
    InvalidBounds {
        /// Axis the bounds belong to
        axis: Axis,
        /// Configured minimum position
        min: i64,
        /// Configured maximum position
        max: i64,
    },
    /// Delays must satisfy `0 < min_delay <= max_delay`
    InvalidDelays {
        /// Cruise delay in microseconds
        min_us: u32,
        /// Start/end delay in microseconds
        max_us: u32,
    },
    /// Diagonal boost must lie in `(0, 1]`
    InvalidDiagonalBoost(f32),
    /// Step pulse must be shorter than the cruise delay
    InvalidPulseWidth {
        /// Pulse width in microseconds
        pulse_us: u32,
        /// Cruise delay in microseconds
        min_delay_us: u32,
    },
    /// Pin identifier outside the 0-31 bitmask range
    InvalidPin(u8),
    /// Same pin assigned to more than one line
    DuplicatePin(u8),
    /// A required builder field was not provided
    MissingField(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Single-axis errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisError {
    /// Axis must be homed before it can be stepped
    NotHomed(Axis),
    /// Home sensor never triggered within the step ceiling
    HomingTimeout {
        /// Axis being homed
        axis: Axis,
        /// Steps issued before giving up
        steps: u32,
    },
    /// Step would leave the configured bounds
    LimitExceeded {
        /// Axis being stepped
        axis: Axis,
        /// Position the step would have produced
        position: i64,
        /// Bound that would have been crossed
        limit: i64,
    },
    /// Driver is disabled
    Disabled(Axis),
    /// GPIO operation failed
    PinError(Axis),
}

/// Coordinated move errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionError {
    /// Target of a planned move lies outside the axis bounds
    OutOfRange {
        /// Offending axis
        axis: Axis,
        /// Requested target position
        target: i64,
        /// Axis minimum position
        min: i64,
        /// Axis maximum position
        max: i64,
    },
    /// Another move is in flight
    Busy,
    /// Fault during playback; carries the last committed positions
    Io {
        /// Last committed X position
        x: i64,
        /// Last committed Y position
        y: i64,
    },
    /// Delta exceeds the tick counter range
    TooLong {
        /// Requested step count
        steps: u64,
    },
}

/// Failures reported by a hardware wave device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaveError {
    /// Backing service could not be reached
    Unreachable,
    /// Device refused to allocate a wave resource
    NoResource,
    /// Connection lost during playback
    Disconnected,
    /// Device-specific error code
    Fault(i32),
}

/// Pulse executor errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorError {
    /// A pulse program is already resident or playing
    ResourceBusy,
    /// Hardware backend could not be constructed
    HardwareUnavailable(WaveError),
    /// Device error outside of playback
    Device(WaveError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Axis(e) => write!(f, "Axis error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
            Error::Executor(e) => write!(f, "Executor error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidBounds { axis, min, max } => write!(
                f,
                "Invalid bounds for axis {}: [{}, {}] must be non-empty and contain 0",
                axis, min, max
            ),
            ConfigError::InvalidDelays { min_us, max_us } => write!(
                f,
                "Invalid delays: min {}us must be > 0 and <= max {}us",
                min_us, max_us
            ),
            ConfigError::InvalidDiagonalBoost(v) => {
                write!(f, "Invalid diagonal boost: {}. Must be in (0, 1]", v)
            }
            ConfigError::InvalidPulseWidth {
                pulse_us,
                min_delay_us,
            } => write!(
                f,
                "Pulse width {}us must be shorter than min delay {}us",
                pulse_us, min_delay_us
            ),
            ConfigError::InvalidPin(pin) => write!(f, "Invalid pin {}. Must be 0-31", pin),
            ConfigError::DuplicatePin(pin) => write!(f, "Pin {} assigned more than once", pin),
            ConfigError::MissingField(field) => write!(f, "{} is required", field),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for AxisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisError::NotHomed(axis) => write!(f, "Axis {} is not homed", axis),
            AxisError::HomingTimeout { axis, steps } => write!(
                f,
                "Homing axis {} failed: sensor not triggered after {} steps",
                axis, steps
            ),
            AxisError::LimitExceeded {
                axis,
                position,
                limit,
            } => write!(f, "Axis {} position {} exceeds limit {}", axis, position, limit),
            AxisError::Disabled(axis) => write!(f, "Axis {} is disabled", axis),
            AxisError::PinError(axis) => write!(f, "GPIO operation failed on axis {}", axis),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::OutOfRange {
                axis,
                target,
                min,
                max,
            } => write!(
                f,
                "Axis {} target {} out of range [{}, {}]",
                axis, target, min, max
            ),
            MotionError::Busy => write!(f, "A move is already in flight"),
            MotionError::Io { x, y } => {
                write!(f, "Hardware fault during move, stopped at ({}, {})", x, y)
            }
            MotionError::TooLong { steps } => write!(f, "Move of {} steps is too long", steps),
        }
    }
}

impl fmt::Display for WaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveError::Unreachable => write!(f, "wave service unreachable"),
            WaveError::NoResource => write!(f, "wave resource unavailable"),
            WaveError::Disconnected => write!(f, "wave device disconnected"),
            WaveError::Fault(code) => write!(f, "wave device error code {}", code),
        }
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorError::ResourceBusy => write!(f, "Pulse program already resident"),
            ExecutorError::HardwareUnavailable(e) => write!(f, "Hardware unavailable: {}", e),
            ExecutorError::Device(e) => write!(f, "Device error: {}", e),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<AxisError> for Error {
    fn from(e: AxisError) -> Self {
        Error::Axis(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<ExecutorError> for Error {
    fn from(e: ExecutorError) -> Self {
        Error::Executor(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for AxisError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

#[cfg(feature = "std")]
impl std::error::Error for WaveError {}

#[cfg(feature = "std")]
impl std::error::Error for ExecutorError {}
