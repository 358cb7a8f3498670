//! Reconnecting TCP link to the coordinator

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::{ChannelTransport, EventSender, FrameReceiver, TransportEvent};

/// Size of the socket read buffer
pub const READ_BUFFER_SIZE: usize = 2048;

/// Frame terminator written after each outbound frame
const FRAME_TERMINATOR: u8 = b'\n';

/// Background TCP client
///
/// The task connects, forwards inbound bytes as [`TransportEvent::Data`],
/// writes outbound frames newline-terminated, and on failure waits
/// `reconnect_interval` before the next attempt. Frames queued while the
/// link is down are discarded when the next connection comes up.
pub struct TcpLink;

impl TcpLink {
    /// Start the link task on the current tokio runtime
    pub fn spawn(
        addr: impl Into<String>,
        reconnect_interval: Duration,
    ) -> (ChannelTransport, JoinHandle<()>) {
        let (transport, events, frames) = ChannelTransport::pair();
        let addr = addr.into();
        let handle = tokio::spawn(run_link(addr, reconnect_interval, events, frames));
        (transport, handle)
    }
}

/// Link loop. Returns when the scheduler side is dropped.
async fn run_link(
    addr: String,
    reconnect_interval: Duration,
    events: EventSender,
    mut frames: FrameReceiver,
) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        if events.send(TransportEvent::Connecting).is_err() {
            return;
        }

        match TcpStream::connect(&addr).await {
            Ok(stream) => {
                tracing::info!(addr = %addr, "coordinator link up");

                // Anything queued while down is stale
                let mut dropped = 0usize;
                loop {
                    match frames.try_recv() {
                        Ok(_) => dropped += 1,
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => return,
                    }
                }
                if dropped > 0 {
                    tracing::debug!(dropped, "discarded frames queued while disconnected");
                }

                if events.send(TransportEvent::Connected).is_err() {
                    return;
                }

                let (mut reader, mut writer) = stream.into_split();
                loop {
                    tokio::select! {
                        read = reader.read(&mut buf) => match read {
                            Ok(0) => {
                                tracing::info!(addr = %addr, "coordinator closed the link");
                                break;
                            }
                            Ok(n) => {
                                if events.send(TransportEvent::Data(buf[..n].to_vec())).is_err() {
                                    return;
                                }
                            }
                            Err(e) => {
                                tracing::warn!(addr = %addr, error = %e, "link read failed");
                                break;
                            }
                        },
                        frame = frames.recv() => match frame {
                            Some(mut frame) => {
                                frame.push(FRAME_TERMINATOR);
                                if let Err(e) = writer.write_all(&frame).await {
                                    tracing::warn!(addr = %addr, error = %e, "link write failed");
                                    break;
                                }
                            }
                            None => return,
                        },
                    }
                }
            }
            Err(e) => {
                tracing::debug!(addr = %addr, error = %e, "connect failed");
            }
        }

        if events.send(TransportEvent::Disconnected).is_err() {
            return;
        }
        tokio::time::sleep(reconnect_interval).await;
    }
}
