//! Keel Metrics - Tick instrumentation for the simulation loop
//!
//! Provides zero-cost abstractions for metrics collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use keel_metrics::{SystemProfiler, TickTimer};
//!
//! let mut timer = TickTimer::new(120, Duration::from_micros(16_666));
//! timer.begin();
//! world.run_systems(dt);
//! timer.end();
//! println!("avg {:.2}ms, worst {:.2}ms", timer.average_ms(), timer.worst_ms());
//! ```
//!
//! In production builds (without `metrics` feature), all instrumentation
//! is compiled out to zero overhead.

#[cfg(feature = "metrics")]
mod system_profiler;
#[cfg(feature = "metrics")]
mod tick_timer;

#[cfg(feature = "metrics")]
pub use system_profiler::SystemProfiler;
#[cfg(feature = "metrics")]
pub use tick_timer::TickTimer;

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a scope against a profiler (zero-cost when metrics disabled)
#[macro_export]
macro_rules! time_scope {
    ($profiler:expr, $name:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        {
            $profiler.time($name, || $body)
        }
        #[cfg(not(feature = "metrics"))]
        {
            $body
        }
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct TickTimer;

#[cfg(not(feature = "metrics"))]
impl TickTimer {
    pub fn new(_window: usize, _budget: std::time::Duration) -> Self {
        Self
    }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn average_ms(&self) -> f64 {
        0.0
    }
    pub fn worst_ms(&self) -> f64 {
        0.0
    }
    pub fn ticks_per_second(&self) -> f64 {
        0.0
    }
    pub fn over_budget(&self) -> u64 {
        0
    }
}

#[cfg(not(feature = "metrics"))]
pub struct SystemProfiler;

#[cfg(not(feature = "metrics"))]
impl SystemProfiler {
    pub fn new() -> Self {
        Self
    }
    pub fn time<F, R>(&mut self, _name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }
    pub fn total(&self, _name: &str) -> std::time::Duration {
        std::time::Duration::ZERO
    }
    pub fn report(&self) -> Vec<(String, std::time::Duration, u64)> {
        Vec::new()
    }
}
