//! Hardware-timed pulse generation through a wave generator.
//!
//! The whole move is lowered into a [`WavePulse`] program, uploaded once and
//! clocked out by the device. Positions are committed as the device reports
//! played entries, so a stop mid-program still leaves exact positions.

use embedded_hal::delay::DelayNs;

use crate::axis::{Axis, StepAxis};
use crate::error::{ExecutorError, MotionError, Result, WaveError};
use crate::motion::ExecutorTimeline;

use super::{
    finish_move, prepare_axes, ActiveMove, CancelToken, ExecutionResult, ExecutorKind, Outcome,
    Progress, PulseExecutor,
};

/// Interval between completion checks while a program plays.
const POLL_INTERVAL_US: u32 = 500;

/// One entry of a wave program: GPIO lines to set, lines to clear, then the
/// time to hold before the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WavePulse {
    /// Bitmask of GPIO lines driven high.
    pub on: u32,
    /// Bitmask of GPIO lines driven low.
    pub off: u32,
    /// Hold time after applying the masks.
    pub delay_us: u32,
}

impl WavePulse {
    /// Create a program entry.
    #[inline]
    pub const fn new(on: u32, off: u32, delay_us: u32) -> Self {
        Self { on, off, delay_us }
    }
}

/// A DMA-clocked wave generator (pigpio daemon or equivalent).
pub trait WaveDevice {
    /// Connect and verify the device can host a program.
    fn open(&mut self) -> core::result::Result<(), WaveError>;

    /// Replace the resident program with `program`.
    fn upload(&mut self, program: &[WavePulse]) -> core::result::Result<(), WaveError>;

    /// Start playing the uploaded program once.
    fn start(&mut self) -> core::result::Result<(), WaveError>;

    /// Check whether the program is still playing.
    fn is_busy(&mut self) -> core::result::Result<bool, WaveError>;

    /// Number of program entries applied so far.
    fn played(&mut self) -> core::result::Result<usize, WaveError>;

    /// Halt playback and drive every line in `lines` low.
    fn stop(&mut self, lines: u32) -> core::result::Result<(), WaveError>;

    /// Free the uploaded program.
    fn release(&mut self) -> core::result::Result<(), WaveError>;
}

/// Plays moves on a [`WaveDevice`].
pub struct HardwareTimedExecutor<W: WaveDevice, D: DelayNs> {
    device: W,
    delay: D,
    active: Option<ActiveMove>,
    lines: u32,
}

impl<W: WaveDevice, D: DelayNs> HardwareTimedExecutor<W, D> {
    /// Open `device` and take it over.
    ///
    /// # Errors
    ///
    /// `HardwareUnavailable` if the device cannot be reached or cannot
    /// allocate a program.
    pub fn new(mut device: W, delay: D) -> Result<Self> {
        Self::open_device(&mut device).map_err(ExecutorError::HardwareUnavailable)?;
        Ok(Self::from_device(device, delay))
    }

    pub(crate) fn open_device(device: &mut W) -> core::result::Result<(), WaveError> {
        device.open()?;
        info!("hardware executor: wave device ready");
        Ok(())
    }

    pub(crate) fn from_device(device: W, delay: D) -> Self {
        Self {
            device,
            delay,
            active: None,
            lines: 0,
        }
    }

    /// Borrow the wave device.
    pub fn device(&self) -> &W {
        &self.device
    }

    fn unload(&mut self) {
        if self.active.take().is_some() {
            self.stop_and_release();
        }
    }

    /// Halt playback and free the program, logging what could not be done.
    fn stop_and_release(&mut self) {
        if let Err(e) = self.device.stop(self.lines) {
            warn!("hardware executor: stop failed, step lines may be asserted: {}", e);
        }
        self.release_program();
    }

    fn release_program(&mut self) {
        if let Err(e) = self.device.release() {
            warn!("hardware executor: release failed: {}", e);
        }
    }

    /// Commit every entry the device has applied.
    fn sync<X: StepAxis, Y: StepAxis>(&mut self, x: &mut X, y: &mut Y) -> Result<()> {
        let played = self.device.played().map_err(ExecutorError::Device)?;
        if let Some(current) = self.active.as_mut() {
            current.commit_through(played, x, y)?;
        }
        Ok(())
    }

    fn fault<X: StepAxis, Y: StepAxis>(
        &mut self,
        error: crate::error::Error,
        x: &mut X,
        y: &mut Y,
    ) -> crate::error::Error {
        error!("hardware executor: fault, stopping playback");
        self.stop_and_release();
        self.active = None;
        finish_move(Outcome::Cancelled, [0, 0], x, y);
        match error {
            crate::error::Error::Executor(ExecutorError::Device(_)) => MotionError::Io {
                x: x.position(),
                y: y.position(),
            }
            .into(),
            other => other,
        }
    }

    fn step_poll<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
        cancel: &CancelToken,
    ) -> Result<Progress> {
        if cancel.is_cancelled() {
            self.device
                .stop(self.lines)
                .map_err(ExecutorError::Device)?;
            self.sync(x, y)?;
            return Ok(Progress::Finished(self.finish(Outcome::Cancelled, x, y)));
        }

        let busy = self.device.is_busy().map_err(ExecutorError::Device)?;
        self.sync(x, y)?;
        if busy {
            self.delay.delay_us(POLL_INTERVAL_US);
            return Ok(Progress::Running);
        }

        let complete = self.active.as_ref().map_or(true, ActiveMove::is_done);
        if !complete {
            // Playback ended without reaching the last entry.
            return Err(ExecutorError::Device(WaveError::Disconnected).into());
        }
        Ok(Progress::Finished(self.finish(Outcome::Completed, x, y)))
    }

    fn finish<X: StepAxis, Y: StepAxis>(
        &mut self,
        outcome: Outcome,
        x: &mut X,
        y: &mut Y,
    ) -> ExecutionResult {
        let committed = self.active.take().map_or([0, 0], |m| m.committed);
        self.release_program();
        if outcome == Outcome::Cancelled {
            info!("hardware executor: move cancelled");
        }
        finish_move(outcome, committed, x, y)
    }
}

impl<W: WaveDevice, D: DelayNs> PulseExecutor for HardwareTimedExecutor<W, D> {
    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Hardware
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
            return Err(ExecutorError::ResourceBusy.into());
        }
        prepare_axes(&timeline, x, y)?;

        let (x_pin, y_pin) = (x.step_pin_id(), y.step_pin_id());
        self.lines = (1u32 << x_pin) | (1u32 << y_pin);

        if !timeline.is_empty() {
            let program = timeline.to_wave(x_pin, y_pin);
            let started = self
                .device
                .upload(&program)
                .and_then(|()| self.device.start());
            if let Err(e) = started {
                self.release_program();
                x.finish();
                y.finish();
                return Err(ExecutorError::Device(e).into());
            }
            debug!(
                "hardware executor: started {} entries, {} X / {} Y pulses",
                program.len(),
                timeline.pulses(Axis::X),
                timeline.pulses(Axis::Y)
            );
        }

        self.active = Some(ActiveMove::new(timeline));
        Ok(())
    }

    fn poll<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
        cancel: &CancelToken,
    ) -> Result<Progress> {
        let empty = match self.active.as_ref() {
            None => return Ok(Progress::Idle),
            Some(current) => current.timeline.is_empty(),
        };
        if empty {
            return Ok(Progress::Finished(self.finish(Outcome::Completed, x, y)));
        }

        match self.step_poll(x, y, cancel) {
            Ok(progress) => Ok(progress),
            Err(e) => Err(self.fault(e, x, y)),
        }
    }

    fn abort<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
    ) -> Result<Option<ExecutionResult>> {
        if self.active.is_none() {
            return Ok(None);
        }
        let stopped = self.device.stop(self.lines);
        if stopped.is_ok() {
            if self.sync(x, y).is_err() {
                warn!("hardware executor: played count lost on abort");
            }
        }
        let result = self.finish(Outcome::Cancelled, x, y);
        stopped.map_err(ExecutorError::Device)?;
        Ok(Some(result))
    }
}

impl<W: WaveDevice, D: DelayNs> Drop for HardwareTimedExecutor<W, D> {
    fn drop(&mut self) {
        self.unload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_pulse_fields() {
        let pulse = WavePulse::new(1 << 17, 0, 120);

        assert_eq!(pulse.on, 1 << 17);
        assert_eq!(pulse.off, 0);
        assert_eq!(pulse.delay_us, 120);
    }
}
