//! Channel bridge between the scheduler and an async link task

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use fieldnode_core::{NodeError, NodeResult};

use crate::{Transport, TransportEvent};

/// Inbound event sender held by the link task
pub type EventSender = UnboundedSender<TransportEvent>;

/// Outbound frame receiver held by the link task
pub type FrameReceiver = UnboundedReceiver<Vec<u8>>;

/// Scheduler side of a channel pair
///
/// `poll_event` and `send_frame` only touch the channels, so the scheduler
/// never waits on the network.
#[derive(Debug)]
pub struct ChannelTransport {
    events: UnboundedReceiver<TransportEvent>,
    frames: UnboundedSender<Vec<u8>>,
    closed: bool,
}

impl ChannelTransport {
    /// Create a transport and the link-side channel ends
    pub fn pair() -> (Self, EventSender, FrameReceiver) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let transport = ChannelTransport {
            events: event_rx,
            frames: frame_tx,
            closed: false,
        };
        (transport, event_tx, frame_rx)
    }

    /// Has the link task gone away?
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for ChannelTransport {
    fn poll_event(&mut self) -> Option<TransportEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.closed {
                    self.closed = true;
                    tracing::warn!("link task stopped");
                    return Some(TransportEvent::Disconnected);
                }
                None
            }
        }
    }

    fn send_frame(&mut self, frame: &[u8]) -> NodeResult<()> {
        self.frames
            .send(frame.to_vec())
            .map_err(|_| NodeError::Transport("link task stopped".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_in_order() {
        let (mut transport, events, _frames) = ChannelTransport::pair();
        events.send(TransportEvent::Connected).unwrap();
        events.send(TransportEvent::Data(b"{}".to_vec())).unwrap();

        assert_eq!(transport.poll_event(), Some(TransportEvent::Connected));
        assert_eq!(transport.poll_event(), Some(TransportEvent::Data(b"{}".to_vec())));
        assert_eq!(transport.poll_event(), None);
    }

    #[test]
    fn test_frames_reach_link_side() {
        let (mut transport, _events, mut frames) = ChannelTransport::pair();
        transport.send_frame(b"{\"a\":1}").unwrap();
        assert_eq!(frames.try_recv().unwrap(), b"{\"a\":1}".to_vec());
    }

    #[test]
    fn test_dropped_link_reports_disconnect_once() {
        let (mut transport, events, frames) = ChannelTransport::pair();
        drop(events);
        drop(frames);

        assert_eq!(transport.poll_event(), Some(TransportEvent::Disconnected));
        assert_eq!(transport.poll_event(), None);
        assert!(transport.is_closed());

        let err = transport.send_frame(b"{}").unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
