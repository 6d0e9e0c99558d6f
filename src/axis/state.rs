//! Axis identity, lifecycle phase and state snapshots.

use core::fmt;

use serde::Deserialize;

/// One of the two perpendicular motion channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Horizontal axis.
    X,
    /// Vertical axis.
    Y,
}

impl Axis {
    /// Both axes, in homing order.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Axis name for logging.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of an axis.
///
/// ```text
/// Unhomed -> Homing -> Idle <-> Moving
///     any -> Disabled -> (enable) -> previous homed/unhomed phase
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisPhase {
    /// Position is meaningless until homing completes.
    #[default]
    Unhomed,
    /// Homing sequence in progress.
    Homing,
    /// Homed and ready for commands.
    Idle,
    /// A coordinated move is stepping this axis.
    Moving,
    /// Driver disabled.
    Disabled,
}

impl AxisPhase {
    /// Get the phase name as a static string.
    pub fn name(self) -> &'static str {
        match self {
            AxisPhase::Unhomed => "Unhomed",
            AxisPhase::Homing => "Homing",
            AxisPhase::Idle => "Idle",
            AxisPhase::Moving => "Moving",
            AxisPhase::Disabled => "Disabled",
        }
    }
}

/// Point-in-time snapshot of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisState {
    /// Which axis this is.
    pub axis: Axis,
    /// Current position in steps from home.
    pub position: i64,
    /// Whether homing has completed.
    pub homed: bool,
    /// Lowest reachable position.
    pub min_position: i64,
    /// Highest reachable position.
    pub max_position: i64,
    /// Whether the direction line is inverted.
    pub inverted: bool,
    /// Whether the driver is enabled.
    pub enabled: bool,
    /// Lifecycle phase.
    pub phase: AxisPhase,
}

impl AxisState {
    /// Check whether `position` lies inside this axis's bounds.
    #[inline]
    pub fn contains(&self, position: i64) -> bool {
        position >= self.min_position && position <= self.max_position
    }
}
