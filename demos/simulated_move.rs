//! Simulated gantry example.
//!
//! Loads `gantry.toml`, builds both axes on simulated pins, lets the selector
//! probe a wave generator that is not there, then homes and runs a few moves
//! on the software executor.

use std::cell::Cell;
use std::rc::Rc;

use stepper_xy::error::WaveError;
use stepper_xy::{
    parse_config, Axis, AxisActuatorBuilder, ExecutorSelector, MotionController, Outcome,
    WaveDevice, WavePulse,
};

/// Delay provider backed by the OS scheduler.
struct StdDelay;

impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}

/// Output pin that counts pulses.
#[derive(Clone, Default)]
struct SimPin {
    high: Rc<Cell<bool>>,
    pulses: Rc<Cell<u32>>,
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for SimPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high.get() {
            self.pulses.set(self.pulses.get() + 1);
        }
        self.high.set(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }
}

/// Home switch that closes after a few steps.
struct SimSwitch {
    step: SimPin,
    closes_after: u32,
}

impl embedded_hal::digital::ErrorType for SimSwitch {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::InputPin for SimSwitch {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.step.pulses.get() < self.closes_after)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.step.pulses.get() >= self.closes_after)
    }
}

/// Wave generator whose daemon is not running.
struct NoDaemon;

impl WaveDevice for NoDaemon {
    fn open(&mut self) -> Result<(), WaveError> {
        Err(WaveError::Unreachable)
    }
    fn upload(&mut self, _: &[WavePulse]) -> Result<(), WaveError> {
        Err(WaveError::Unreachable)
    }
    fn start(&mut self) -> Result<(), WaveError> {
        Err(WaveError::Unreachable)
    }
    fn is_busy(&mut self) -> Result<bool, WaveError> {
        Err(WaveError::Unreachable)
    }
    fn played(&mut self) -> Result<usize, WaveError> {
        Err(WaveError::Unreachable)
    }
    fn stop(&mut self, _: u32) -> Result<(), WaveError> {
        Err(WaveError::Unreachable)
    }
    fn release(&mut self) -> Result<(), WaveError> {
        Err(WaveError::Unreachable)
    }
}

fn main() {
    println!("=== Simulated Gantry Example ===\n");

    let config = parse_config(include_str!("gantry.toml")).expect("Failed to parse config");

    let x_step = SimPin::default();
    let y_step = SimPin::default();

    let x = AxisActuatorBuilder::new(Axis::X)
        .from_axis_config(config.axis(Axis::X))
        .step_pin(x_step.clone())
        .dir_pin(SimPin::default())
        .enable_pin(SimPin::default())
        .home_pin(SimSwitch {
            step: x_step.clone(),
            closes_after: 40,
        })
        .delay(StdDelay)
        .build()
        .expect("Failed to build X axis");

    let y = AxisActuatorBuilder::new(Axis::Y)
        .from_axis_config(config.axis(Axis::Y))
        .step_pin(y_step.clone())
        .dir_pin(SimPin::default())
        .enable_pin(SimPin::default())
        .home_pin(SimSwitch {
            step: y_step.clone(),
            closes_after: 25,
        })
        .delay(StdDelay)
        .build()
        .expect("Failed to build Y axis");

    let mut selector = ExecutorSelector::new(config.engine.backend);
    let executor = selector.select(|| Ok(NoDaemon), StdDelay);
    let mut controller = MotionController::new(x, y, executor, config.profile);
    println!("Backend: {:?}", controller.backend());

    println!("\n=== Homing ===");
    controller.home_all().expect("Homing failed");
    let (xs, ys) = controller.state();
    println!("X homed: {} at {}, Y homed: {} at {}", xs.homed, xs.position, ys.homed, ys.position);

    println!("\n=== Moves ===");
    for (dx, dy) in [(400, 0), (0, 300), (250, 250), (-650, -550)] {
        let plan = controller.plan(dx, dy).expect("Move rejected");
        let started = std::time::Instant::now();
        let result = controller.move_relative(dx, dy).expect("Move failed");
        println!(
            "move ({:>4}, {:>4}): {:>4} ticks, planned {:>7} us, took {:>7} us -> ({}, {})",
            dx,
            dy,
            plan.len(),
            plan.duration(),
            started.elapsed().as_micros(),
            result.x.position,
            result.y.position
        );
        assert_eq!(result.outcome, Outcome::Completed);
    }

    println!("\n=== Out of range ===");
    match controller.move_to(6000, 0) {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!("rejected: {}", e),
    }

    controller.shutdown().expect("Shutdown failed");
    println!(
        "\nTotal pulses: X={} Y={}",
        x_step.pulses.get(),
        y_step.pulses.get()
    );
}
