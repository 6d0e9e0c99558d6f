//! One-shot backend selection with software fallback.

use embedded_hal::delay::DelayNs;

use crate::axis::StepAxis;
use crate::config::BackendPreference;
use crate::error::{Result, WaveError};
use crate::motion::ExecutorTimeline;

use super::{
    CancelToken, ExecutionResult, ExecutorKind, HardwareTimedExecutor, Progress, PulseExecutor,
    SoftwareTimedExecutor, WaveDevice,
};

/// Resolves the timing backend once and remembers the answer.
///
/// Only the first selection probes the device. After a failed probe every
/// later selection goes straight to the software executor without touching
/// the device factory again; after a successful one, later selections take a
/// new handle from the factory without re-opening it.
#[derive(Debug, Clone)]
pub struct ExecutorSelector {
    preference: BackendPreference,
    resolved: Option<ExecutorKind>,
    probes: u32,
}

impl ExecutorSelector {
    /// Create a selector honoring `preference`.
    pub fn new(preference: BackendPreference) -> Self {
        Self {
            preference,
            resolved: None,
            probes: 0,
        }
    }

    /// Backend chosen so far, if any.
    #[inline]
    pub fn resolved(&self) -> Option<ExecutorKind> {
        self.resolved
    }

    /// How many times hardware construction was attempted.
    #[inline]
    pub fn probe_count(&self) -> u32 {
        self.probes
    }

    /// Pick an executor.
    ///
    /// `connect` is only invoked while hardware is still a candidate.
    pub fn select<W, D, F>(&mut self, connect: F, delay: D) -> SelectedExecutor<W, D>
    where
        W: WaveDevice,
        D: DelayNs,
        F: FnOnce() -> core::result::Result<W, WaveError>,
    {
        match self.resolved {
            Some(ExecutorKind::Software) => {
                return SelectedExecutor::Software(SoftwareTimedExecutor::new(delay));
            }
            Some(ExecutorKind::Hardware) => return self.reuse_hardware(connect, delay),
            None => {}
        }
        if self.preference == BackendPreference::Software {
            self.resolved = Some(ExecutorKind::Software);
            info!("executor: using software timing");
            return SelectedExecutor::Software(SoftwareTimedExecutor::new(delay));
        }

        self.probes += 1;
        let opened = connect().and_then(|mut device| {
            HardwareTimedExecutor::<W, D>::open_device(&mut device).map(|()| device)
        });
        match opened {
            Ok(device) => {
                self.resolved = Some(ExecutorKind::Hardware);
                info!("executor: using hardware timing");
                SelectedExecutor::Hardware(HardwareTimedExecutor::from_device(device, delay))
            }
            Err(e) => {
                self.resolved = Some(ExecutorKind::Software);
                warn!(
                    "executor: hardware unavailable ({}), falling back to software timing",
                    e
                );
                SelectedExecutor::Software(SoftwareTimedExecutor::new(delay))
            }
        }
    }

    /// Hand out another hardware executor once hardware has been chosen.
    ///
    /// The device was verified by the first probe, so the new handle is used
    /// without opening it again. A handle that cannot be obtained moves the
    /// selector to software for good.
    fn reuse_hardware<W, D, F>(&mut self, connect: F, delay: D) -> SelectedExecutor<W, D>
    where
        W: WaveDevice,
        D: DelayNs,
        F: FnOnce() -> core::result::Result<W, WaveError>,
    {
        match connect() {
            Ok(device) => {
                SelectedExecutor::Hardware(HardwareTimedExecutor::from_device(device, delay))
            }
            Err(e) => {
                self.resolved = Some(ExecutorKind::Software);
                warn!(
                    "executor: hardware handle lost ({}), falling back to software timing",
                    e
                );
                SelectedExecutor::Software(SoftwareTimedExecutor::new(delay))
            }
        }
    }
}

/// Executor picked by [`ExecutorSelector`].
pub enum SelectedExecutor<W: WaveDevice, D: DelayNs> {
    /// Wave-generator backend.
    Hardware(HardwareTimedExecutor<W, D>),
    /// Blocking-loop backend.
    Software(SoftwareTimedExecutor<D>),
}

impl<W: WaveDevice, D: DelayNs> PulseExecutor for SelectedExecutor<W, D> {
    fn kind(&self) -> ExecutorKind {
        match self {
            SelectedExecutor::Hardware(e) => e.kind(),
            SelectedExecutor::Software(e) => e.kind(),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            SelectedExecutor::Hardware(e) => e.is_active(),
            SelectedExecutor::Software(e) => e.is_active(),
        }
    }

    fn begin<X: StepAxis, Y: StepAxis>(
        &mut self,
        timeline: ExecutorTimeline,
        x: &mut X,
        y: &mut Y,
    ) -> Result<()> {
        match self {
            SelectedExecutor::Hardware(e) => e.begin(timeline, x, y),
            SelectedExecutor::Software(e) => e.begin(timeline, x, y),
        }
    }

    fn poll<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
        cancel: &CancelToken,
    ) -> Result<Progress> {
        match self {
            SelectedExecutor::Hardware(e) => e.poll(x, y, cancel),
            SelectedExecutor::Software(e) => e.poll(x, y, cancel),
        }
    }

    fn abort<X: StepAxis, Y: StepAxis>(
        &mut self,
        x: &mut X,
        y: &mut Y,
    ) -> Result<Option<ExecutionResult>> {
        match self {
            SelectedExecutor::Hardware(e) => e.abort(x, y),
            SelectedExecutor::Software(e) => e.abort(x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    struct NullDevice;

    impl WaveDevice for NullDevice {
        fn open(&mut self) -> core::result::Result<(), WaveError> {
            Ok(())
        }
        fn upload(&mut self, _: &[super::super::WavePulse]) -> core::result::Result<(), WaveError> {
            Ok(())
        }
        fn start(&mut self) -> core::result::Result<(), WaveError> {
            Ok(())
        }
        fn is_busy(&mut self) -> core::result::Result<bool, WaveError> {
            Ok(false)
        }
        fn played(&mut self) -> core::result::Result<usize, WaveError> {
            Ok(0)
        }
        fn stop(&mut self, _: u32) -> core::result::Result<(), WaveError> {
            Ok(())
        }
        fn release(&mut self) -> core::result::Result<(), WaveError> {
            Ok(())
        }
    }

    #[test]
    fn test_software_preference_skips_hardware() {
        let mut selector = ExecutorSelector::new(BackendPreference::Software);
        let executor = selector.select(|| Ok(NullDevice), NoopDelay::new());

        assert_eq!(executor.kind(), ExecutorKind::Software);
        assert_eq!(selector.probe_count(), 0);
    }

    #[test]
    fn test_failed_hardware_open_is_permanent() {
        let mut selector = ExecutorSelector::new(BackendPreference::Hardware);

        let first = selector.select(
            || -> core::result::Result<NullDevice, WaveError> { Err(WaveError::Unreachable) },
            NoopDelay::new(),
        );
        assert_eq!(first.kind(), ExecutorKind::Software);

        let second = selector.select(|| Ok(NullDevice), NoopDelay::new());
        assert_eq!(second.kind(), ExecutorKind::Software);
        assert_eq!(selector.probe_count(), 1);
        assert_eq!(selector.resolved(), Some(ExecutorKind::Software));
    }

    #[test]
    fn test_hardware_selected_when_available() {
        let mut selector = ExecutorSelector::new(BackendPreference::Hardware);
        let executor = selector.select(|| Ok(NullDevice), NoopDelay::new());

        assert_eq!(executor.kind(), ExecutorKind::Hardware);
        assert_eq!(selector.probe_count(), 1);
    }

    #[test]
    fn test_hardware_choice_is_not_reopened() {
        let mut selector = ExecutorSelector::new(BackendPreference::Hardware);
        let first = selector.select(|| Ok(NullDevice), NoopDelay::new());
        let second = selector.select(|| Ok(NullDevice), NoopDelay::new());

        assert_eq!(first.kind(), ExecutorKind::Hardware);
        assert_eq!(second.kind(), ExecutorKind::Hardware);
        assert_eq!(selector.probe_count(), 1);
    }
}
