//! Property tests for interpolation and cancellation.

mod common;

use common::{build_axes, config, ClockDelay};
use embedded_hal_mock::eh1::delay::NoopDelay;
use proptest::prelude::*;
use stepper_xy::executor::Progress;
use stepper_xy::motion::MotionPhase;
use stepper_xy::{
    Axis, Microseconds, MotionController, MotionCoordinator, Outcome, SoftwareTimedExecutor,
    TimelineBuilder, VelocityProfile,
};

fn profile(ramp_steps: u32) -> VelocityProfile {
    VelocityProfile::new(Microseconds(125), Microseconds(2000), ramp_steps, 0.7)
}

proptest! {
    #[test]
    fn pulse_counts_match_deltas(dx in -2000i64..2000, dy in -2000i64..2000, ramp in 1u32..300) {
        let timeline = MotionCoordinator::new(profile(ramp)).interpolate(dx, dy).unwrap();

        let fires = |axis| timeline.ticks().iter().filter(|t| t.fires.fires(axis)).count() as u64;
        prop_assert_eq!(fires(Axis::X), dx.unsigned_abs());
        prop_assert_eq!(fires(Axis::Y), dy.unsigned_abs());
        prop_assert_eq!(timeline.len() as u64, dx.unsigned_abs().max(dy.unsigned_abs()));
    }

    #[test]
    fn both_axes_finish_on_last_tick(dx in 1i64..2000, dy in 1i64..2000) {
        let timeline = MotionCoordinator::new(profile(200)).interpolate(dx, -dy).unwrap();

        let last = timeline.len() - 1;
        prop_assert_eq!(timeline.last_fire(Axis::X), Some(last));
        prop_assert_eq!(timeline.last_fire(Axis::Y), Some(last));
    }

    #[test]
    fn delays_stay_in_profile_range(dx in -1500i64..1500, dy in -1500i64..1500, ramp in 1u32..400) {
        let p = profile(ramp);
        let timeline = MotionCoordinator::new(p).interpolate(dx, dy).unwrap();

        for tick in timeline.ticks() {
            prop_assert!(tick.delay >= p.min_delay);
            prop_assert!(tick.delay <= p.max_delay);
        }
    }

    #[test]
    fn ramps_are_monotonic(steps in 2u32..1500, ramp in 1u32..400) {
        let p = profile(ramp);
        let delays: Vec<_> = (0..steps).map(|t| p.axis_delay(t, steps)).collect();

        for t in 1..steps as usize {
            match p.phase_at(t as u32, steps) {
                MotionPhase::Accelerating => prop_assert!(delays[t] <= delays[t - 1]),
                MotionPhase::Decelerating => prop_assert!(delays[t] >= delays[t - 1]),
                _ => {}
            }
        }
    }

    #[test]
    fn short_moves_have_no_cruise(steps in 2u32..200) {
        let p = profile(100);
        prop_assume!(steps < 2 * p.ramp_steps);

        prop_assert_eq!(p.effective_ramp(steps), steps / 2);
        let cruise = (0..steps)
            .filter(|&t| p.phase_at(t, steps) == MotionPhase::Cruising)
            .count();
        prop_assert_eq!(cruise as u32, steps % 2);
    }

    #[test]
    fn diagonal_ticks_are_boosted(dx in 1i64..800, dy in 1i64..800) {
        let p = profile(60);
        let timeline = MotionCoordinator::new(p).interpolate(dx, dy).unwrap();
        let (x_steps, y_steps) = (dx as u32, dy as u32);
        let (major, minor) = (x_steps.max(y_steps), x_steps.min(y_steps));

        let mut minor_index = 0;
        for (i, tick) in timeline.ticks().iter().enumerate() {
            if tick.fires.is_diagonal() {
                let slower = p.axis_delay(i as u32, major).max(p.axis_delay(minor_index, minor));
                prop_assert_eq!(tick.delay, p.boosted(slower));
                minor_index += 1;
            }
        }
    }

    #[test]
    fn timeline_duration_is_sum_of_ticks(dx in -600i64..600, dy in -600i64..600) {
        let timeline = MotionCoordinator::new(profile(50)).interpolate(dx, dy).unwrap();
        let built = TimelineBuilder::new(Microseconds(5)).build(&timeline);

        let sum: u64 = timeline.ticks().iter().map(|t| u64::from(t.delay.value())).sum();
        prop_assert_eq!(built.duration(), sum);
        prop_assert_eq!(built.pulses(Axis::X) as u64, dx.unsigned_abs());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn cancelled_positions_match_pulses(
        dx in -400i64..400,
        dy in -400i64..400,
        start_x in 0i64..1000,
        start_y in 0i64..1000,
        cancel_after in 0usize..500,
    ) {
        let clock = ClockDelay::default();
        let (x, x_lines, y, y_lines) = build_axes(&clock);
        let executor = SoftwareTimedExecutor::new(NoopDelay::new());
        let mut controller = MotionController::new(x, y, executor, config().profile);
        controller.home_all().unwrap();
        controller.move_to(start_x, start_y).unwrap();
        let (rises_x, rises_y) = (x_lines.step.rises(), y_lines.step.rises());

        let target_x = (start_x + dx).max(0);
        let target_y = (start_y + dy).max(0);
        controller.start_move(target_x - start_x, target_y - start_y).unwrap();

        let mut polls = 0;
        let result = loop {
            if polls == cancel_after {
                controller.cancel();
            }
            if let Progress::Finished(result) = controller.poll().unwrap() {
                break result;
            }
            polls += 1;
        };

        let issued_x = i64::from(x_lines.step.rises() - rises_x);
        let issued_y = i64::from(y_lines.step.rises() - rises_y);
        prop_assert_eq!(result.committed_x.abs(), issued_x);
        prop_assert_eq!(result.committed_y.abs(), issued_y);
        prop_assert_eq!(result.x.position, start_x + result.committed_x);
        prop_assert_eq!(result.y.position, start_y + result.committed_y);
        prop_assert!(result.x.min_position <= result.x.position && result.x.position <= result.x.max_position);
        prop_assert!(result.y.min_position <= result.y.position && result.y.position <= result.y.max_position);
        if result.outcome == Outcome::Completed {
            prop_assert_eq!((result.x.position, result.y.position), (target_x, target_y));
        }
    }
}
