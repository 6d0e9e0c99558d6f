//! Shared fakes for integration tests.
//!
//! Pins and the wave device keep their state behind `Rc<RefCell<_>>` so a
//! test can hold a clone and inspect what the engine did with its own copy.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use stepper_xy::config::AxisConfig;
use stepper_xy::error::WaveError;
use stepper_xy::{parse_config, Axis, AxisActuator, AxisActuatorBuilder, SystemConfig, WaveDevice, WavePulse};

pub const CONFIG: &str = r#"
[x]
step_pin = 17
dir_pin = 15
enable_pin = 5
home_pin = 23
max_position = 5000

[y]
step_pin = 27
dir_pin = 22
enable_pin = 6
home_pin = 24
max_position = 4000

[profile]
min_delay_us = 100
max_delay_us = 1000
ramp_steps = 50

[engine]
backend = "software"
"#;

pub fn config() -> SystemConfig {
    parse_config(CONFIG).unwrap()
}

// =============================================================================
// Pins
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
pub struct PinLog {
    pub high: bool,
    pub rises: u32,
    /// Fail the rise that would bring the count to this value.
    pub fail_on_rise: Option<u32>,
}

/// Output pin that counts rising edges.
#[derive(Debug, Clone, Default)]
pub struct RecordingPin(pub Rc<RefCell<PinLog>>);

impl RecordingPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.0.borrow().high
    }

    pub fn rises(&self) -> u32 {
        self.0.borrow().rises
    }

    pub fn fail_on_rise(&self, n: u32) {
        self.0.borrow_mut().fail_on_rise = Some(n);
    }
}

impl ErrorType for RecordingPin {
    type Error = PinFault;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.0.borrow_mut().high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        let mut log = self.0.borrow_mut();
        if !log.high {
            if log.fail_on_rise == Some(log.rises + 1) {
                return Err(PinFault);
            }
            log.rises += 1;
        }
        log.high = true;
        Ok(())
    }
}

/// Active-low home switch that closes once the linked step line has pulsed
/// `closes_after` times.
#[derive(Debug, Clone)]
pub struct LimitSwitch {
    step: RecordingPin,
    closes_after: Option<u32>,
}

impl LimitSwitch {
    pub fn after(step: &RecordingPin, steps: u32) -> Self {
        Self {
            step: step.clone(),
            closes_after: Some(steps),
        }
    }

    pub fn never(step: &RecordingPin) -> Self {
        Self {
            step: step.clone(),
            closes_after: None,
        }
    }

    fn closed(&self) -> bool {
        self.closes_after.is_some_and(|n| self.step.rises() >= n)
    }
}

impl ErrorType for LimitSwitch {
    type Error = PinFault;
}

impl InputPin for LimitSwitch {
    fn is_high(&mut self) -> Result<bool, PinFault> {
        Ok(!self.closed())
    }

    fn is_low(&mut self) -> Result<bool, PinFault> {
        Ok(self.closed())
    }
}

/// Delay that only adds up the time requested.
#[derive(Debug, Clone, Default)]
pub struct ClockDelay(pub Rc<RefCell<u64>>);

impl ClockDelay {
    pub fn elapsed_ns(&self) -> u64 {
        *self.0.borrow()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns() / 1000
    }
}

impl DelayNs for ClockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.0.borrow_mut() += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        *self.0.borrow_mut() += u64::from(us) * 1000;
    }
}

// =============================================================================
// Axes
// =============================================================================

pub type TestAxis = AxisActuator<RecordingPin, RecordingPin, RecordingPin, LimitSwitch, ClockDelay>;

/// Handles onto the lines of one test axis.
#[derive(Debug, Clone)]
pub struct AxisLines {
    pub step: RecordingPin,
    pub dir: RecordingPin,
    pub enable: RecordingPin,
}

pub fn build_axis(
    axis: Axis,
    config: &AxisConfig,
    home_after: Option<u32>,
    clock: &ClockDelay,
) -> (TestAxis, AxisLines) {
    let lines = AxisLines {
        step: RecordingPin::new(),
        dir: RecordingPin::new(),
        enable: RecordingPin::new(),
    };
    let switch = match home_after {
        Some(n) => LimitSwitch::after(&lines.step, n),
        None => LimitSwitch::never(&lines.step),
    };

    let actuator = AxisActuatorBuilder::new(axis)
        .from_axis_config(config)
        .step_pin(lines.step.clone())
        .dir_pin(lines.dir.clone())
        .enable_pin(lines.enable.clone())
        .home_pin(switch)
        .delay(clock.clone())
        .build()
        .unwrap();
    (actuator, lines)
}

/// Both axes from [`CONFIG`] with switches already closed.
pub fn build_axes(clock: &ClockDelay) -> (TestAxis, AxisLines, TestAxis, AxisLines) {
    let config = config();
    let (x, x_lines) = build_axis(Axis::X, &config.x, Some(0), clock);
    let (y, y_lines) = build_axis(Axis::Y, &config.y, Some(0), clock);
    (x, x_lines, y, y_lines)
}

// =============================================================================
// Wave device
// =============================================================================

#[derive(Debug, Default)]
pub struct WaveLog {
    pub open_error: Option<WaveError>,
    pub program: Vec<WavePulse>,
    pub played: usize,
    /// Entries applied per busy check.
    pub advance: usize,
    /// Busy check fails once this many entries have played.
    pub fail_at: Option<usize>,
    /// Error returned by every stop request.
    pub stop_error: Option<WaveError>,
    pub running: bool,
    pub opens: u32,
    pub uploads: u32,
    pub releases: u32,
    pub stopped_lines: Option<u32>,
}

/// Scripted wave generator.
#[derive(Debug, Clone)]
pub struct FakeWave(pub Rc<RefCell<WaveLog>>);

impl FakeWave {
    pub fn new(advance: usize) -> Self {
        Self(Rc::new(RefCell::new(WaveLog {
            advance,
            ..WaveLog::default()
        })))
    }

    pub fn unreachable() -> Self {
        let wave = Self::new(1);
        wave.0.borrow_mut().open_error = Some(WaveError::Unreachable);
        wave
    }

    pub fn fail_at(&self, entries: usize) {
        self.0.borrow_mut().fail_at = Some(entries);
    }

    pub fn fail_stop(&self, error: WaveError) {
        self.0.borrow_mut().stop_error = Some(error);
    }

    pub fn log(&self) -> std::cell::Ref<'_, WaveLog> {
        self.0.borrow()
    }
}

impl WaveDevice for FakeWave {
    fn open(&mut self) -> Result<(), WaveError> {
        let mut log = self.0.borrow_mut();
        log.opens += 1;
        match log.open_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn upload(&mut self, program: &[WavePulse]) -> Result<(), WaveError> {
        let mut log = self.0.borrow_mut();
        log.program = program.to_vec();
        log.played = 0;
        log.uploads += 1;
        Ok(())
    }

    fn start(&mut self) -> Result<(), WaveError> {
        self.0.borrow_mut().running = true;
        Ok(())
    }

    fn is_busy(&mut self) -> Result<bool, WaveError> {
        let mut log = self.0.borrow_mut();
        if !log.running {
            return Ok(false);
        }
        log.played = (log.played + log.advance).min(log.program.len());
        if let Some(limit) = log.fail_at {
            if log.played >= limit {
                log.played = limit;
                log.running = false;
                return Err(WaveError::Disconnected);
            }
        }
        log.running = log.played < log.program.len();
        Ok(log.running)
    }

    fn played(&mut self) -> Result<usize, WaveError> {
        Ok(self.0.borrow().played)
    }

    fn stop(&mut self, lines: u32) -> Result<(), WaveError> {
        let mut log = self.0.borrow_mut();
        if let Some(e) = log.stop_error {
            return Err(e);
        }
        log.running = false;
        log.stopped_lines = Some(lines);
        Ok(())
    }

    fn release(&mut self) -> Result<(), WaveError> {
        self.0.borrow_mut().releases += 1;
        Ok(())
    }
}
