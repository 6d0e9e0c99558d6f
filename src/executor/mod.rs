//! Pulse execution backends.
//!
//! Both backends play an [`ExecutorTimeline`] and commit axis positions one
//! completed pulse at a time, so a move stopped early still leaves positions
//! that match the pulses physically issued.

mod hardware;
mod selector;
mod software;

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::axis::{Axis, AxisState, StepAxis};
use crate::error::Result;
use crate::motion::ExecutorTimeline;

pub use hardware::{HardwareTimedExecutor, WaveDevice, WavePulse};
pub use selector::{ExecutorSelector, SelectedExecutor};
pub use software::SoftwareTimedExecutor;

/// Which timing backend is driving the step lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecutorKind {
    /// Edges clocked by a wave generator.
    Hardware,
    /// Edges issued from a blocking loop.
    Software,
}

/// Shared cancellation flag, checked by executors at tick boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the in-flight move.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// How a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Every planned pulse was issued.
    Completed,
    /// Stopped early on request; positions reflect the pulses issued.
    Cancelled,
}

/// Result of one coordinated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    /// How the move ended.
    pub outcome: Outcome,
    /// Signed X steps committed.
    pub committed_x: i64,
    /// Signed Y steps committed.
    pub committed_y: i64,
    /// X axis after the move.
    pub x: AxisState,
    /// Y axis after the move.
    pub y: AxisState,
}

impl ExecutionResult {
    /// Signed steps committed on `axis`.
    pub fn committed(&self, axis: Axis) -> i64 {
        match axis {
            Axis::X => self.committed_x,
            Axis::Y => self.committed_y,
        }
    }

    /// Check whether the move ran to completion.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

/// State of an executor after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Nothing is loaded.
    Idle,
    /// Pulses remain.
    Running,
    /// The move ended.
    Finished(ExecutionResult),
}

/// Common contract of the hardware and software backends.
pub trait PulseExecutor {
    /// Backend kind.
    fn kind(&self) -> ExecutorKind;

    /// Check whether a timeline is loaded.
    fn is_active(&self) -> bool;

    /// Load `timeline` and start playback.
    ///
    /// # Errors
    ///
    /// `ResourceBusy` if a timeline is already loaded.
    fn begin<X: StepAxis, Y: StepAxis>(
        &mut self,
        timeline: ExecutorTimeline,
        x: &mut X,
        y: &mut Y,
    ) -> Result<()>;

    /// Advance playback, committing completed pulses.
    fn poll<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
        cancel: &CancelToken,
    ) -> Result<Progress>;

    /// Stop immediately, deassert step lines and unload the timeline.
    ///
    /// Returns the partial result if a move was in flight.
    fn abort<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
    ) -> Result<Option<ExecutionResult>>;

    /// Play `timeline` to the end (blocking).
    fn execute<X: StepAxis, Y: StepAxis>(
        &mut self,
        timeline: ExecutorTimeline,
        x: &mut X,
        y: &mut Y,
        cancel: &CancelToken,
    ) -> Result<ExecutionResult> {
        self.begin(timeline, x, y)?;
        loop {
            match self.poll(x, y, cancel)? {
                Progress::Finished(result) => return Ok(result),
                Progress::Running => {}
                Progress::Idle => return Ok(snapshot(Outcome::Completed, [0, 0], x, y)),
            }
        }
    }
}

/// Per-move bookkeeping shared by both backends.
#[derive(Debug)]
pub(crate) struct ActiveMove {
    pub(crate) timeline: ExecutorTimeline,
    /// Events already accounted for.
    pub(crate) cursor: usize,
    /// Signed steps committed so far, X then Y.
    pub(crate) committed: [i64; 2],
}

impl ActiveMove {
    pub(crate) fn new(timeline: ExecutorTimeline) -> Self {
        Self {
            timeline,
            cursor: 0,
            committed: [0, 0],
        }
    }

    /// Commit every falling edge in `cursor..upto`.
    pub(crate) fn commit_through<X: StepAxis, Y: StepAxis>(
        &mut self,
        upto: usize,
        x: &mut X,
        y: &mut Y,
    ) -> Result<()> {
        let upto = upto.min(self.timeline.events().len());
        let mut pending = [0u32; 2];
        for event in &self.timeline.events()[self.cursor.min(upto)..upto] {
            if event.edge == crate::motion::Edge::Fall {
                if event.fires.fires(Axis::X) {
                    pending[0] += 1;
                }
                if event.fires.fires(Axis::Y) {
                    pending[1] += 1;
                }
            }
        }
        self.cursor = self.cursor.max(upto);
        self.apply(pending, x, y)
    }

    /// Commit one pulse on each axis flagged in `completed`, outside the
    /// event cursor. Used when a tick breaks off after some lines pulsed.
    pub(crate) fn commit_pulses<X: StepAxis, Y: StepAxis>(
        &mut self,
        completed: [bool; 2],
        x: &mut X,
        y: &mut Y,
    ) -> Result<()> {
        self.apply(completed.map(u32::from), x, y)
    }

    fn apply<X: StepAxis, Y: StepAxis>(
        &mut self,
        pending: [u32; 2],
        x: &mut X,
        y: &mut Y,
    ) -> Result<()> {
        let x_dir = self.timeline.direction(Axis::X);
        let y_dir = self.timeline.direction(Axis::Y);
        if pending[0] > 0 {
            x.commit(x_dir, pending[0])?;
            self.committed[0] += x_dir.sign() * i64::from(pending[0]);
        }
        if pending[1] > 0 {
            y.commit(y_dir, pending[1])?;
            self.committed[1] += y_dir.sign() * i64::from(pending[1]);
        }
        Ok(())
    }

    /// Check whether every event has been accounted for.
    pub(crate) fn is_done(&self) -> bool {
        self.cursor >= self.timeline.events().len()
    }
}

/// Put both axes into the moving state and set their direction lines.
pub(crate) fn prepare_axes<X: StepAxis, Y: StepAxis>(
    timeline: &ExecutorTimeline,
    x: &mut X,
    y: &mut Y,
) -> Result<()> {
    if timeline.pulses(Axis::X) > 0 {
        x.prepare(timeline.direction(Axis::X))?;
    }
    if timeline.pulses(Axis::Y) > 0 {
        if let Err(e) = y.prepare(timeline.direction(Axis::Y)) {
            x.finish();
            return Err(e);
        }
    }
    Ok(())
}

/// Return both axes to idle and build the result.
pub(crate) fn finish_move<X: StepAxis, Y: StepAxis>(
    outcome: Outcome,
    committed: [i64; 2],
    x: &mut X,
    y: &mut Y,
) -> ExecutionResult {
    x.finish();
    y.finish();
    snapshot(outcome, committed, x, y)
}

fn snapshot<X: StepAxis, Y: StepAxis>(
    outcome: Outcome,
    committed: [i64; 2],
    x: &X,
    y: &Y,
) -> ExecutionResult {
    ExecutionResult {
        outcome,
        committed_x: committed[0],
        committed_y: committed[1],
        x: x.state(),
        y: y.state(),
    }
}
