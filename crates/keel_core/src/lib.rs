//! Keel Engine Core
//!
//! Contains the fundamental simulation systems:
//! - Entity Component System (ECS) with runtime component descriptors
//! - Deterministic fixed-timestep helpers
//!
//! The ECS is built for per-frame simulation workloads: column-oriented
//! component storage sized once at world construction, archetype bitmask
//! matching, a persistent query cache keyed on a structural version
//! counter, and direct column access for tight inner loops.

pub mod ecs;
pub mod time;

// Re-export metrics from keel_metrics for convenience
#[cfg(feature = "metrics")]
pub use keel_metrics as metrics;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
