//! Transport seam

use fieldnode_core::NodeResult;

/// Something that happened on the link since the last poll
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// A connection attempt has started
    Connecting,
    /// The link is up
    Connected,
    /// The link went down
    Disconnected,
    /// One discrete inbound message (may hold several frames)
    Message(Vec<u8>),
    /// A chunk of an inbound byte stream; frames may span chunks
    Data(Vec<u8>),
}

impl TransportEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Connecting => "connecting",
            TransportEvent::Connected => "connected",
            TransportEvent::Disconnected => "disconnected",
            TransportEvent::Message(_) => "message",
            TransportEvent::Data(_) => "data",
        }
    }
}

/// Non-blocking link to the coordinator
///
/// The scheduler polls events once per tick and sends encoded frames.
/// Neither call may wait on the network.
pub trait Transport {
    /// Next pending event, if any
    fn poll_event(&mut self) -> Option<TransportEvent>;

    /// Hand one encoded frame to the link
    fn send_frame(&mut self, frame: &[u8]) -> NodeResult<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn poll_event(&mut self) -> Option<TransportEvent> {
        (**self).poll_event()
    }

    fn send_frame(&mut self, frame: &[u8]) -> NodeResult<()> {
        (**self).send_frame(frame)
    }
}
