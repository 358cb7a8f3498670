//! Field node test harness - simulated collaborators and end-to-end checks
//!
//! This crate provides:
//! - Scripted transport: inject link events, capture sent frames
//! - Scripted sensor drivers: push readings, count ingest calls
//! - `NodeHarness`: a scheduler on a simulated clock, wired to both
//! - End-to-end protocol and scheduling tests

pub mod integration;
pub mod simulator;

pub use integration::*;
pub use simulator::*;
