//! Motion module for stepper-xy.
//!
//! Provides per-axis ramp shaping, two-axis interpolation and materialization
//! of the planned ticks into pulse edges.

mod coordinator;
mod profile;
mod timeline;

pub use coordinator::{FireMask, MotionCoordinator, Tick, Timeline};
pub use profile::{Direction, MotionPhase, VelocityProfile};
pub use timeline::{Edge, ExecutorTimeline, PulseEvent, TimelineBuilder};
