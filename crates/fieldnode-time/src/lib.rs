//! Field node time - clocks and due checks
//!
//! This crate provides:
//! - The `Clock` seam every scheduler decision reads time through
//! - `MonotonicClock`: OS monotonic time since node start
//! - `SimulatedClock`: manually advanced time for tests and simulation
//! - `is_due`: the pure fixed-threshold periodic check

pub mod clock;
pub mod due;

pub use clock::*;
pub use due::*;
