//! Tick timing with a rolling window and budget tracking

use std::time::{Duration, Instant};

/// Measures simulation tick durations over a rolling window and counts
/// ticks that blew their budget.
pub struct TickTimer {
    tick_start: Instant,
    budget: Duration,
    over_budget: u64,
    samples: Vec<Duration>,
    capacity: usize,
    cursor: usize,
}

impl TickTimer {
    pub fn new(window: usize, budget: Duration) -> Self {
        Self {
            tick_start: Instant::now(),
            budget,
            over_budget: 0,
            samples: Vec::with_capacity(window),
            capacity: window.max(1),
            cursor: 0,
        }
    }

    pub fn begin(&mut self) {
        self.tick_start = Instant::now();
    }

    pub fn end(&mut self) {
        let elapsed = self.tick_start.elapsed();
        if elapsed > self.budget {
            self.over_budget += 1;
        }
        if self.samples.len() < self.capacity {
            self.samples.push(elapsed);
        } else {
            self.samples[self.cursor] = elapsed;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    pub fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: Duration = self.samples.iter().sum();
        sum.as_secs_f64() * 1000.0 / self.samples.len() as f64
    }

    pub fn worst_ms(&self) -> f64 {
        self.samples
            .iter()
            .max()
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    pub fn ticks_per_second(&self) -> f64 {
        let avg_ms = self.average_ms();
        if avg_ms > 0.0 {
            1000.0 / avg_ms
        } else {
            0.0
        }
    }

    /// Ticks that ran longer than the configured budget.
    pub fn over_budget(&self) -> u64 {
        self.over_budget
    }
}
