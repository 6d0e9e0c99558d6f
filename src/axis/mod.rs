//! Axis module for stepper-xy.
//!
//! Provides the single-axis driver, its builder and position tracking.

mod actuator;
mod builder;
mod position;
mod state;

pub use actuator::{AxisActuator, StepAxis, Unconnected};
pub use builder::AxisActuatorBuilder;
pub use position::Position;
pub use state::{Axis, AxisPhase, AxisState};
