//! Field node wire protocol - JSON envelope format
//!
//! This crate implements the coordinator wire format:
//! - One JSON object per logical message
//! - `msgID`, `msgType`, `msgSource`, `msgTarget`, `msgTimestamp`, `msgPayload`
//! - Frame assembly for transports that deliver several or partial frames

pub mod codec;
pub mod frame;

pub use codec::*;
pub use frame::*;
