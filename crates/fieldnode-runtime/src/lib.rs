//! Field node runtime - Node orchestration and the cooperative scheduler
//!
//! Each scheduler tick runs a fixed sequence:
//! 1. Drain transport events (connect, disconnect, inbound bytes)
//! 2. Assemble and decode inbound frames
//! 3. Route envelopes to the connection state machine or command dispatcher
//! 4. Re-send a stuck verification (optional)
//! 5. Run due periodic tasks in order: ingest, sample, transmit
//!
//! Nothing in a tick blocks; every error is logged, counted, and the tick
//! continues.

pub mod config;
pub mod context;
pub mod dedup;
pub mod dispatch;
pub mod logging;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod task;
pub mod telemetry;

pub use config::*;
pub use context::*;
pub use dedup::*;
pub use dispatch::*;
pub use logging::init_tracing;
pub use scheduler::*;
pub use session::*;
pub use stats::*;
pub use task::*;
pub use telemetry::*;
