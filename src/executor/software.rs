//! Blocking software-timed pulse generation.

use embedded_hal::delay::DelayNs;

use crate::axis::{Axis, StepAxis};
use crate::error::{AxisError, Error, MotionError, Result};
use crate::motion::ExecutorTimeline;

use super::{
    finish_move, prepare_axes, ActiveMove, CancelToken, ExecutorKind, Outcome, Progress,
    PulseExecutor,
};

/// Drives step lines directly, sleeping between edges.
///
/// Each poll plays exactly one tick, so cancellation is observed at tick
/// boundaries and a step pulse is never cut short.
pub struct SoftwareTimedExecutor<D: DelayNs> {
    delay: D,
    active: Option<ActiveMove>,
}

impl<D: DelayNs> SoftwareTimedExecutor<D> {
    /// Create an executor timed by `delay`.
    pub fn new(delay: D) -> Self {
        Self {
            delay,
            active: None,
        }
    }
}

impl<D: DelayNs> PulseExecutor for SoftwareTimedExecutor<D> {
    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Software
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn begin<X: StepAxis, Y: StepAxis>(
        &mut self,
        timeline: ExecutorTimeline,
        x: &mut X,
        y: &mut Y,
    ) -> Result<()> {
        if self.active.is_some() {
            return Err(crate::error::ExecutorError::ResourceBusy.into());
        }
        prepare_axes(&timeline, x, y)?;
        debug!(
            "software executor: {} edges over {} us",
            timeline.events().len(),
            timeline.duration()
        );
        self.active = Some(ActiveMove::new(timeline));
        Ok(())
    }

    fn poll<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
        cancel: &CancelToken,
    ) -> Result<Progress> {
        let Self { delay, active } = self;
        let Some(current) = active.as_mut() else {
            return Ok(Progress::Idle);
        };

        if cancel.is_cancelled() {
            let committed = current.committed;
            *active = None;
            info!("software executor: move cancelled");
            return Ok(Progress::Finished(finish_move(
                Outcome::Cancelled,
                committed,
                x,
                y,
            )));
        }

        if !current.is_done() {
            if let Err(e) = play_tick(delay, current, x, y) {
                *active = None;
                finish_move(Outcome::Cancelled, [0, 0], x, y);
                return Err(fault(e, x, y));
            }
        }

        if current_done(active) {
            let committed = active.as_ref().map_or([0, 0], |m| m.committed);
            *active = None;
            return Ok(Progress::Finished(finish_move(
                Outcome::Completed,
                committed,
                x,
                y,
            )));
        }
        Ok(Progress::Running)
    }

    fn abort<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
    ) -> Result<Option<crate::executor::ExecutionResult>> {
        let lowered = x.lower_step().and(y.lower_step());
        let result = self
            .active
            .take()
            .map(|m| finish_move(Outcome::Cancelled, m.committed, x, y));
        lowered?;
        Ok(result)
    }
}

fn current_done(active: &Option<ActiveMove>) -> bool {
    active.as_ref().map_or(true, ActiveMove::is_done)
}

/// Play the tick starting at the cursor: rise, hold, fall, commit, gap.
///
/// Every line that rose is lowered again before returning, and each axis
/// whose pulse completed is committed even when the other axis failed.
fn play_tick<D: DelayNs, X: StepAxis, Y: StepAxis>(
    delay: &mut D,
    current: &mut ActiveMove,
    x: &mut X,
    y: &mut Y,
) -> Result<()> {
    let index = current.cursor;
    let events = current.timeline.events();
    let (rise, fall) = (events[index], events[index + 1]);
    let fires = [rise.fires.fires(Axis::X), rise.fires.fires(Axis::Y)];

    if fires[0] {
        x.check_travel(current.timeline.direction(Axis::X), 1)?;
    }
    if fires[1] {
        y.check_travel(current.timeline.direction(Axis::Y), 1)?;
    }

    let mut raised = [false; 2];
    let rose = raise_lines(fires, &mut raised, x, y);
    if raised.iter().any(|&r| r) {
        wait(delay, fall.at - rise.at);
    }
    let (completed, lowered) = lower_lines(raised, x, y);

    if rose.is_ok() && lowered.is_ok() {
        current.commit_through(index + 2, x, y)?;
        wait(delay, current.timeline.gap_after(index + 1));
        return Ok(());
    }

    current.commit_pulses(completed, x, y)?;
    rose.and(lowered)
}

fn raise_lines<X: StepAxis, Y: StepAxis>(
    fires: [bool; 2],
    raised: &mut [bool; 2],
    x: &mut X,
    y: &mut Y,
) -> Result<()> {
    if fires[0] {
        x.raise_step()?;
        raised[0] = true;
    }
    if fires[1] {
        y.raise_step()?;
        raised[1] = true;
    }
    Ok(())
}

/// Lower every raised line, reporting which pulses completed and the first
/// failure.
fn lower_lines<X: StepAxis, Y: StepAxis>(
    raised: [bool; 2],
    x: &mut X,
    y: &mut Y,
) -> ([bool; 2], Result<()>) {
    let x_low = if raised[0] { x.lower_step() } else { Ok(()) };
    let y_low = if raised[1] { y.lower_step() } else { Ok(()) };
    let completed = [raised[0] && x_low.is_ok(), raised[1] && y_low.is_ok()];
    (completed, x_low.and(y_low))
}

fn wait<D: DelayNs>(delay: &mut D, us: u64) {
    delay.delay_us(u32::try_from(us).unwrap_or(u32::MAX));
}

/// Pin failures mid-move surface as an I/O fault carrying the positions
/// committed so far.
fn fault<X: StepAxis, Y: StepAxis>(error: Error, x: &X, y: &Y) -> Error {
    match error {
        Error::Axis(AxisError::PinError(axis)) => {
            error!("software executor: pin fault on {}", axis.as_str());
            MotionError::Io {
                x: x.position(),
                y: y.position(),
            }
            .into()
        }
        other => other,
    }
}
