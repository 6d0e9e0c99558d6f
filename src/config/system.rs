//! System configuration - root configuration structure.

use serde::Deserialize;

use super::axis::AxisConfig;
use crate::axis::Axis;
use crate::motion::VelocityProfile;

/// Which pulse executor the engine should try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPreference {
    /// Probe the hardware wave generator, fall back to software timing.
    #[default]
    Hardware,
    /// Never probe hardware.
    Software,
}

/// Engine-level settings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EngineConfig {
    /// Backend preference.
    #[serde(default)]
    pub backend: BackendPreference,
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// X axis wiring and travel.
    pub x: AxisConfig,

    /// Y axis wiring and travel.
    pub y: AxisConfig,

    /// Velocity profile shared by coordinated moves.
    #[serde(default)]
    pub profile: VelocityProfile,

    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SystemConfig {
    /// Get an axis configuration.
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Iterate over both axis configurations.
    pub fn axes(&self) -> impl Iterator<Item = (Axis, &AxisConfig)> {
        Axis::ALL.into_iter().map(move |axis| (axis, self.axis(axis)))
    }
}
