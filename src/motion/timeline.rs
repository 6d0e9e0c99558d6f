//! Materialization of planned ticks into pulse edges.

use alloc::vec::Vec;

use crate::axis::Axis;
use crate::config::units::Microseconds;
use crate::executor::WavePulse;

use super::coordinator::{FireMask, Timeline};
use super::profile::Direction;

/// Step line transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Step lines asserted.
    Rise,
    /// Step lines deasserted; the pulse is complete.
    Fall,
}

/// One scheduled edge on the step lines of the fired axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseEvent {
    /// Offset from the start of the move, in microseconds.
    pub at: u64,
    /// Transition applied.
    pub edge: Edge,
    /// Axes whose step lines change.
    pub fires: FireMask,
}

/// Executor-agnostic event list for one move.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorTimeline {
    events: Vec<PulseEvent>,
    duration: u64,
    x_direction: Direction,
    y_direction: Direction,
    x_pulses: u32,
    y_pulses: u32,
}

impl ExecutorTimeline {
    /// Edges in playback order.
    #[inline]
    pub fn events(&self) -> &[PulseEvent] {
        &self.events
    }

    /// Check whether the timeline issues no pulses.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total scheduled time in microseconds.
    #[inline]
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Direction of travel for an axis.
    #[inline]
    pub fn direction(&self, axis: Axis) -> Direction {
        match axis {
            Axis::X => self.x_direction,
            Axis::Y => self.y_direction,
        }
    }

    /// Pulses scheduled for an axis.
    #[inline]
    pub fn pulses(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x_pulses,
            Axis::Y => self.y_pulses,
        }
    }

    /// Time from event `index` to the following event (or the end of the move).
    pub fn gap_after(&self, index: usize) -> u64 {
        let at = self.events[index].at;
        let next = self
            .events
            .get(index + 1)
            .map_or(self.duration, |event| event.at);
        next.saturating_sub(at)
    }

    /// Lower the event list into a GPIO-mask pulse program.
    ///
    /// Entry `i` of the program corresponds to event `i`, so a device's
    /// played-entry count maps straight back onto completed pulses.
    pub fn to_wave(&self, x_pin: u8, y_pin: u8) -> Vec<WavePulse> {
        self.events
            .iter()
            .enumerate()
            .map(|(i, event)| {
                let mask = pin_mask(event.fires, x_pin, y_pin);
                let delay_us = u32::try_from(self.gap_after(i)).unwrap_or(u32::MAX);
                match event.edge {
                    Edge::Rise => WavePulse::new(mask, 0, delay_us),
                    Edge::Fall => WavePulse::new(0, mask, delay_us),
                }
            })
            .collect()
    }
}

fn pin_mask(fires: FireMask, x_pin: u8, y_pin: u8) -> u32 {
    let mut mask = 0;
    if fires.fires(Axis::X) {
        mask |= 1u32 << x_pin;
    }
    if fires.fires(Axis::Y) {
        mask |= 1u32 << y_pin;
    }
    mask
}

/// Turns a tick sequence into rise/fall edges.
#[derive(Debug, Clone, Copy)]
pub struct TimelineBuilder {
    pulse_width: Microseconds,
}

impl TimelineBuilder {
    /// Create a builder holding each step pulse for `pulse_width`.
    pub fn new(pulse_width: Microseconds) -> Self {
        Self { pulse_width }
    }

    /// Get the pulse width.
    #[inline]
    pub fn pulse_width(&self) -> Microseconds {
        self.pulse_width
    }

    /// Materialize `timeline`.
    ///
    /// Each tick becomes a rising edge at the tick start and a falling edge one
    /// pulse width later; axes firing together share both edges.
    pub fn build(&self, timeline: &Timeline) -> ExecutorTimeline {
        let mut events = Vec::with_capacity(timeline.len() * 2);
        let mut at: u64 = 0;

        for tick in timeline.ticks() {
            // The fall stays inside the tick, never after the next rise.
            let hold = self.pulse_width.0.min(tick.delay.0.saturating_sub(1));
            events.push(PulseEvent {
                at,
                edge: Edge::Rise,
                fires: tick.fires,
            });
            events.push(PulseEvent {
                at: at + u64::from(hold),
                edge: Edge::Fall,
                fires: tick.fires,
            });
            at += u64::from(tick.delay.0);
        }

        ExecutorTimeline {
            events,
            duration: at,
            x_direction: timeline.direction(Axis::X),
            y_direction: timeline.direction(Axis::Y),
            x_pulses: timeline.steps(Axis::X),
            y_pulses: timeline.steps(Axis::Y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{MotionCoordinator, VelocityProfile};

    fn planned(dx: i64, dy: i64) -> Timeline {
        MotionCoordinator::new(VelocityProfile::new(
            Microseconds(800),
            Microseconds(4000),
            20,
            0.7,
        ))
        .interpolate(dx, dy)
        .unwrap()
    }

    #[test]
    fn test_duration_matches_tick_delays() {
        let timeline = planned(120, 45);
        let built = TimelineBuilder::new(Microseconds(5)).build(&timeline);

        assert_eq!(built.duration(), timeline.duration());
        assert_eq!(built.events().len(), timeline.len() * 2);
    }

    #[test]
    fn test_events_strictly_ordered() {
        let built = TimelineBuilder::new(Microseconds(5)).build(&planned(60, -60));

        assert!(built.events().windows(2).all(|w| w[0].at < w[1].at));
        assert!(built
            .events()
            .chunks(2)
            .all(|pair| pair[0].edge == Edge::Rise && pair[1].edge == Edge::Fall));
    }

    #[test]
    fn test_diagonal_fires_share_one_instant() {
        let built = TimelineBuilder::new(Microseconds(5)).build(&planned(10, 10));

        let rises = built
            .events()
            .iter()
            .filter(|e| e.edge == Edge::Rise)
            .count();
        assert_eq!(rises, 10);
        assert!(built.events().iter().all(|e| e.fires == FireMask::XY));
    }

    #[test]
    fn test_pulse_counts_per_axis() {
        let built = TimelineBuilder::new(Microseconds(5)).build(&planned(-37, 90));

        for axis in Axis::ALL {
            let falls = built
                .events()
                .iter()
                .filter(|e| e.edge == Edge::Fall && e.fires.fires(axis))
                .count() as u32;
            assert_eq!(falls, built.pulses(axis));
        }
        assert_eq!(built.pulses(Axis::X), 37);
        assert_eq!(built.direction(Axis::X), Direction::Negative);
    }

    #[test]
    fn test_wave_lowering() {
        let built = TimelineBuilder::new(Microseconds(5)).build(&planned(2, 1));
        let wave = built.to_wave(17, 27);

        assert_eq!(wave.len(), 4);
        assert_eq!(wave[0], WavePulse::new(1 << 17, 0, 5));
        assert_eq!(wave[1].off, 1 << 17);
        assert_eq!(wave[2].on, (1 << 17) | (1 << 27));
        assert_eq!(wave[3].off, (1 << 17) | (1 << 27));

        let total: u64 = wave.iter().map(|p| u64::from(p.delay_us)).sum();
        assert_eq!(total, built.duration());
    }

    #[test]
    fn test_zero_delay_ticks_keep_order() {
        let timeline = MotionCoordinator::new(VelocityProfile::new(
            Microseconds(0),
            Microseconds(0),
            4,
            0.7,
        ))
        .interpolate(6, 3)
        .unwrap();
        let built = TimelineBuilder::new(Microseconds(5)).build(&timeline);

        assert!(built.events().windows(2).all(|w| w[0].at <= w[1].at));
        assert_eq!(built.duration(), 0);
        assert!(built.to_wave(17, 27).iter().all(|p| p.delay_us == 0));
    }

    #[test]
    fn test_empty_timeline() {
        let built = TimelineBuilder::new(Microseconds(5)).build(&Timeline::empty());

        assert!(built.is_empty());
        assert_eq!(built.duration(), 0);
        assert!(built.to_wave(17, 27).is_empty());
    }
}
