//! Per-system timing keyed by system name

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulates wall time and call counts per named system.
pub struct SystemProfiler {
    timings: HashMap<String, (Duration, u64)>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
        }
    }

    pub fn time<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let entry = self
            .timings
            .entry(name.to_string())
            .or_insert((Duration::ZERO, 0));
        entry.0 += elapsed;
        entry.1 += 1;
        result
    }

    pub fn total(&self, name: &str) -> Duration {
        self.timings.get(name).map(|(d, _)| *d).unwrap_or(Duration::ZERO)
    }

    /// (name, total time, calls) sorted by total time, heaviest first.
    pub fn report(&self) -> Vec<(String, Duration, u64)> {
        let mut rows: Vec<(String, Duration, u64)> = self
            .timings
            .iter()
            .map(|(name, (total, calls))| (name.clone(), *total, *calls))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }
}

impl Default for SystemProfiler {
    fn default() -> Self {
        Self::new()
    }
}
