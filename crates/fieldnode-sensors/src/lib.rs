//! Field node sensors - latest-value aggregation
//!
//! This crate implements the sensor side of the node:
//! - Source tags and their declared telemetry fields
//! - `SensorSample`: latest validated reading per source, with freshness
//! - `SensorDriver`: the pull-based, non-blocking driver seam
//! - `QueuedDriver`: a driver fed through a single serialized queue
//! - `SensorAggregator`: ingest / sample-if-updated over registered drivers

pub mod aggregator;
pub mod driver;
pub mod sample;

pub use aggregator::*;
pub use driver::*;
pub use sample::*;
