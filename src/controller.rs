//! Two-axis motion controller facade.
//!
//! Ties both axes, the planner and a pulse executor together behind the
//! move/home/cancel API.

use crate::axis::{Axis, AxisState, StepAxis};
use crate::error::{MotionError, Result};
use crate::executor::{
    CancelToken, ExecutionResult, ExecutorKind, Outcome, Progress, PulseExecutor,
};
use crate::motion::{MotionCoordinator, Timeline, TimelineBuilder, VelocityProfile};

/// Coordinated controller for an X/Y pair.
///
/// `MotionController` provides a high-level API for:
/// - Homing axes one at a time
/// - Planning and playing straight-line moves on both axes
/// - Cancelling or emergency-stopping a move in flight
///
/// At most one move is in flight; a second request gets `Busy`.
///
/// # Example
///
/// ```rust,ignore
/// use stepper_xy::{ExecutorSelector, MotionController};
///
/// let config = stepper_xy::load_config("motion.toml")?;
/// let executor = ExecutorSelector::new(config.engine.backend)
///     .select(|| PigpioWave::connect("localhost:8888"), Delay);
///
/// let mut controller = MotionController::new(x_axis, y_axis, executor, config.profile);
/// controller.home_all()?;
///
/// let result = controller.move_relative(400, -150)?;
/// println!("now at ({}, {})", result.x.position, result.y.position);
/// ```
pub struct MotionController<X: StepAxis, Y: StepAxis, E: PulseExecutor> {
    x: X,
    y: Y,
    executor: E,
    coordinator: MotionCoordinator,
    builder: TimelineBuilder,
    cancel: CancelToken,
}

impl<X: StepAxis, Y: StepAxis, E: PulseExecutor> MotionController<X, Y, E> {
    /// Create a controller.
    ///
    /// Step pulses are held for the longer of the two axes' pulse widths.
    pub fn new(x: X, y: Y, executor: E, profile: VelocityProfile) -> Self {
        let pulse_width = x.pulse_width().max(y.pulse_width());
        info!(
            "controller ready ({} timing)",
            match executor.kind() {
                ExecutorKind::Hardware => "hardware",
                ExecutorKind::Software => "software",
            }
        );
        Self {
            x,
            y,
            executor,
            coordinator: MotionCoordinator::new(profile),
            builder: TimelineBuilder::new(pulse_width),
            cancel: CancelToken::new(),
        }
    }

    /// Get the velocity profile.
    #[inline]
    pub fn profile(&self) -> &VelocityProfile {
        self.coordinator.profile()
    }

    /// Timing backend in use.
    #[inline]
    pub fn backend(&self) -> ExecutorKind {
        self.executor.kind()
    }

    /// Check whether a move is in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.executor.is_active()
    }

    /// Snapshots of both axes.
    pub fn state(&self) -> (AxisState, AxisState) {
        (self.x.state(), self.y.state())
    }

    /// Snapshot of one axis.
    pub fn axis_state(&self, axis: Axis) -> AxisState {
        match axis {
            Axis::X => self.x.state(),
            Axis::Y => self.y.state(),
        }
    }

    /// Get a handle that cancels the in-flight move from anywhere.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cancellation of the in-flight move.
    ///
    /// Takes effect at the next tick boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Energize one axis.
    pub fn enable(&mut self, axis: Axis) -> Result<()> {
        self.ensure_idle()?;
        match axis {
            Axis::X => self.x.enable(),
            Axis::Y => self.y.enable(),
        }
    }

    /// De-energize one axis.
    pub fn disable(&mut self, axis: Axis) -> Result<()> {
        self.ensure_idle()?;
        match axis {
            Axis::X => self.x.disable(),
            Axis::Y => self.y.disable(),
        }
    }

    /// Home one axis toward `direction` at its configured homing delay.
    ///
    /// Returns the number of steps taken.
    pub fn home(&mut self, axis: Axis, direction: crate::motion::Direction) -> Result<u32> {
        self.ensure_idle()?;
        match axis {
            Axis::X => {
                let delay = self.x.home_delay();
                self.x.home(direction, delay)
            }
            Axis::Y => {
                let delay = self.y.home_delay();
                self.y.home(direction, delay)
            }
        }
    }

    /// Home X, then Y, each toward its configured direction.
    pub fn home_all(&mut self) -> Result<()> {
        for axis in Axis::ALL {
            let direction = match axis {
                Axis::X => self.x.home_direction(),
                Axis::Y => self.y.home_direction(),
            };
            self.home(axis, direction)?;
        }
        Ok(())
    }

    /// Plan a relative move without executing it.
    pub fn plan(&self, dx: i64, dy: i64) -> Result<Timeline> {
        self.coordinator
            .plan(dx, dy, &self.x.state(), &self.y.state())
    }

    /// Validate, plan and start a relative move.
    ///
    /// # Errors
    ///
    /// - `Busy` if a move is already in flight
    /// - planning errors (`NotHomed`, `Disabled`, `OutOfRange`, `TooLong`);
    ///   nothing is pulsed in that case
    pub fn start_move(&mut self, dx: i64, dy: i64) -> Result<()> {
        self.ensure_idle()?;
        let plan = self.plan(dx, dy)?;
        let timeline = self.builder.build(&plan);
        self.cancel.reset();
        self.executor.begin(timeline, &mut self.x, &mut self.y)
    }

    /// Advance the in-flight move.
    pub fn poll(&mut self) -> Result<Progress> {
        self.executor.poll(&mut self.x, &mut self.y, &self.cancel)
    }

    /// Block until the in-flight move ends.
    ///
    /// With nothing in flight this returns an empty completed result.
    pub fn wait(&mut self) -> Result<ExecutionResult> {
        loop {
            match self.poll()? {
                Progress::Running => {}
                Progress::Finished(result) => return Ok(result),
                Progress::Idle => {
                    return Ok(ExecutionResult {
                        outcome: Outcome::Completed,
                        committed_x: 0,
                        committed_y: 0,
                        x: self.x.state(),
                        y: self.y.state(),
                    })
                }
            }
        }
    }

    /// Move by `(dx, dy)` steps and wait for the result.
    pub fn move_relative(&mut self, dx: i64, dy: i64) -> Result<ExecutionResult> {
        self.start_move(dx, dy)?;
        self.wait()
    }

    /// Move to an absolute position and wait for the result.
    pub fn move_to(&mut self, x: i64, y: i64) -> Result<ExecutionResult> {
        let dx = self.x.steps_to(x)?;
        let dy = self.y.steps_to(y)?;
        self.move_relative(dx, dy)
    }

    /// Stop everything now.
    ///
    /// Raises the cancel flag, aborts playback (keeping pulses already
    /// issued), deasserts step lines and disables both drivers.
    pub fn emergency_stop(&mut self) -> Result<Option<ExecutionResult>> {
        self.cancel.cancel();
        warn!("emergency stop");

        let aborted = self.executor.abort(&mut self.x, &mut self.y);
        let x_stopped = self.x.emergency_stop();
        let y_stopped = self.y.emergency_stop();

        let result = aborted?;
        x_stopped?;
        y_stopped?;
        Ok(result.map(|r| ExecutionResult {
            x: self.x.state(),
            y: self.y.state(),
            ..r
        }))
    }

    /// Abort anything in flight and disable both drivers.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.is_busy() {
            self.cancel.cancel();
            self.executor.abort(&mut self.x, &mut self.y)?;
        }
        self.x.disable()?;
        self.y.disable()?;
        info!("controller shut down");
        Ok(())
    }

    /// Borrow the X axis.
    pub fn x(&self) -> &X {
        &self.x
    }

    /// Borrow the Y axis.
    pub fn y(&self) -> &Y {
        &self.y
    }

    /// Borrow the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Take the axes and executor back.
    pub fn into_parts(self) -> (X, Y, E) {
        (self.x, self.y, self.executor)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            return Err(MotionError::Busy.into());
        }
        Ok(())
    }
}
