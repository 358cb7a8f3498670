//! Field node transport - link to the coordinator
//!
//! This crate provides:
//! - `Transport`: the non-blocking seam the scheduler polls
//! - `TransportEvent`: connection lifecycle and inbound deliveries
//! - `ChannelTransport`: bridge to a background task over tokio channels
//! - `TcpLink`: reconnecting TCP client driving a `ChannelTransport`

pub mod channel;
pub mod link;
pub mod tcp;

pub use channel::*;
pub use link::*;
pub use tcp::*;
