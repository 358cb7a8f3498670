//! Field node core - Fundamental types and primitives
//!
//! This crate defines the types shared by every part of the node runtime:
//! - Message envelopes and their enumerated type tag
//! - Payload value trees (string, integer, float, boolean, nested mapping)
//! - Message identifiers
//! - Monotonic time
//! - The error taxonomy

pub mod envelope;
pub mod error;
pub mod id;
pub mod message;
pub mod payload;
pub mod time;

pub use envelope::*;
pub use error::*;
pub use id::*;
pub use message::*;
pub use payload::*;
pub use time::*;
