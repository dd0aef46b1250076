//! Deterministic time system
//!
//! Fixed 60Hz tick rate. The ECS itself never waits or yields; the host
//! loop measures wall-clock time, converts it into whole simulation steps
//! with [`FixedTimestep`], and calls `run_systems(TICK_DT)` once per step.

use std::time::Duration;

/// Fixed simulation tick rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_DURATION: Duration = Duration::from_micros(16_666); // ~16.666ms
pub const TICK_DT: f32 = 1.0 / TICK_RATE_HZ as f32;

/// Simulation time tracker
pub struct SimulationClock {
    tick_count: u64,
    accumulated_time: Duration,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            accumulated_time: Duration::ZERO,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
        self.accumulated_time += TICK_DURATION;
    }

    pub fn total_time(&self) -> Duration {
        self.accumulated_time
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts elapsed wall-clock time into whole fixed steps.
///
/// Leftover time stays in the accumulator for the next frame. The
/// accumulator is capped so a long stall cannot trigger an unbounded
/// catch-up burst (the classic spiral of death).
pub struct FixedTimestep {
    step: Duration,
    accumulator: Duration,
    max_backlog: Duration,
}

impl FixedTimestep {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
            max_backlog: step * 8,
        }
    }

    /// Feed elapsed wall time; returns how many fixed steps to simulate.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator = (self.accumulator + elapsed).min(self.max_backlog);
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(TICK_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let mut clock = SimulationClock::new();
        clock.advance_tick();
        clock.advance_tick();
        assert_eq!(clock.tick_count(), 2);
        assert_eq!(clock.total_time(), TICK_DURATION * 2);
    }

    #[test]
    fn test_fixed_timestep_accumulates_partial_frames() {
        let step = Duration::from_millis(10);
        let mut ts = FixedTimestep::new(step);
        assert_eq!(ts.advance(Duration::from_millis(4)), 0);
        assert_eq!(ts.advance(Duration::from_millis(4)), 0);
        // 12ms accumulated: one step fires, 2ms carries over.
        assert_eq!(ts.advance(Duration::from_millis(4)), 1);
        assert_eq!(ts.advance(Duration::from_millis(8)), 1);
    }

    #[test]
    fn test_fixed_timestep_caps_backlog() {
        let step = Duration::from_millis(10);
        let mut ts = FixedTimestep::new(step);
        // A 10-second stall is clamped to the backlog cap, not replayed.
        let steps = ts.advance(Duration::from_secs(10));
        assert_eq!(steps, 8);
    }
}
