//! Scripted collaborators for deterministic node tests
//!
//! Each collaborator is split in two: the half the scheduler owns, and a
//! cloneable handle the test keeps to script input and inspect output.
//! Both halves share state through `Rc<RefCell<_>>`; everything runs on
//! the test's single thread.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use fieldnode_core::{Envelope, MessageType, NodeError, NodeResult};
use fieldnode_sensors::{Reading, SensorDriver, SourceTag};
use fieldnode_transport::{Transport, TransportEvent};
use fieldnode_wire::{decode, encode};

// ============================================================================
// TRANSPORT
// ============================================================================

#[derive(Default)]
struct LinkState {
    inbound: VecDeque<TransportEvent>,
    sent: Vec<Vec<u8>>,
    fail_sends: bool,
}

/// Scheduler side of a scripted link
pub struct ScriptedTransport {
    state: Rc<RefCell<LinkState>>,
}

/// Test side of a scripted link
#[derive(Clone)]
pub struct LinkHandle {
    state: Rc<RefCell<LinkState>>,
}

/// Create a connected pair of scripted transport and handle
pub fn scripted_link() -> (ScriptedTransport, LinkHandle) {
    let state = Rc::new(RefCell::new(LinkState::default()));
    (
        ScriptedTransport {
            state: Rc::clone(&state),
        },
        LinkHandle { state },
    )
}

impl Transport for ScriptedTransport {
    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.state.borrow_mut().inbound.pop_front()
    }

    fn send_frame(&mut self, frame: &[u8]) -> NodeResult<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_sends {
            return Err(NodeError::Transport("scripted send failure".into()));
        }
        state.sent.push(frame.to_vec());
        Ok(())
    }
}

impl LinkHandle {
    /// Queue any transport event
    pub fn push_event(&self, event: TransportEvent) {
        self.state.borrow_mut().inbound.push_back(event);
    }

    /// Queue a connection attempt that succeeds
    pub fn connect(&self) {
        self.push_event(TransportEvent::Connecting);
        self.push_event(TransportEvent::Connected);
    }

    pub fn disconnect(&self) {
        self.push_event(TransportEvent::Disconnected);
    }

    /// Queue one envelope as a discrete message
    pub fn deliver(&self, envelope: &Envelope) {
        self.push_event(TransportEvent::Message(encode(envelope)));
    }

    /// Queue raw bytes as a discrete message
    pub fn deliver_bytes(&self, bytes: impl Into<Vec<u8>>) {
        self.push_event(TransportEvent::Message(bytes.into()));
    }

    /// Queue raw bytes as a stream chunk
    pub fn stream_bytes(&self, bytes: impl Into<Vec<u8>>) {
        self.push_event(TransportEvent::Data(bytes.into()));
    }

    /// Events not yet polled
    pub fn pending(&self) -> usize {
        self.state.borrow().inbound.len()
    }

    /// Make every following send fail (or succeed again)
    pub fn set_fail_sends(&self, fail: bool) {
        self.state.borrow_mut().fail_sends = fail;
    }

    /// Raw frames sent so far
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.state.borrow().sent.clone()
    }

    /// Sent frames decoded back into envelopes. Undecodable frames are skipped.
    pub fn sent(&self) -> Vec<Envelope> {
        self.state
            .borrow()
            .sent
            .iter()
            .filter_map(|frame| decode(frame).ok())
            .collect()
    }

    /// Sent envelopes of one type
    pub fn sent_of_type(&self, message_type: &MessageType) -> Vec<Envelope> {
        self.sent()
            .into_iter()
            .filter(|e| &e.message_type == message_type)
            .collect()
    }

    /// Forget captured frames
    pub fn clear_sent(&self) {
        self.state.borrow_mut().sent.clear();
    }
}

// ============================================================================
// SENSOR DRIVER
// ============================================================================

#[derive(Default)]
struct DriverState {
    /// `None` marks a loss of validity
    pending: VecDeque<Option<Reading>>,
    latest: Reading,
    valid: bool,
    updated: bool,
    ingest_calls: u64,
}

/// Scheduler side of a scripted sensor driver
pub struct ScriptedDriver {
    source: SourceTag,
    state: Rc<RefCell<DriverState>>,
}

/// Test side of a scripted sensor driver
#[derive(Clone)]
pub struct DriverHandle {
    state: Rc<RefCell<DriverState>>,
}

/// Create a scripted driver for `source` and its handle
pub fn scripted_driver(source: SourceTag) -> (ScriptedDriver, DriverHandle) {
    let state = Rc::new(RefCell::new(DriverState::default()));
    (
        ScriptedDriver {
            source,
            state: Rc::clone(&state),
        },
        DriverHandle { state },
    )
}

impl SensorDriver for ScriptedDriver {
    fn source(&self) -> SourceTag {
        self.source
    }

    fn ingest(&mut self) -> usize {
        let mut state = self.state.borrow_mut();
        state.ingest_calls += 1;

        let mut consumed = 0;
        while let Some(next) = state.pending.pop_front() {
            match next {
                Some(reading) => {
                    state.latest = reading;
                    state.valid = true;
                    state.updated = true;
                }
                None => state.valid = false,
            }
            consumed += 1;
        }
        consumed
    }

    fn is_valid(&self) -> bool {
        self.state.borrow().valid
    }

    fn is_updated(&self) -> bool {
        self.state.borrow().updated
    }

    fn take_reading(&mut self) -> Reading {
        let mut state = self.state.borrow_mut();
        state.updated = false;
        state.latest.clone()
    }
}

impl DriverHandle {
    /// Make a reading available to the next ingest
    pub fn push(&self, reading: Reading) {
        self.state.borrow_mut().pending.push_back(Some(reading));
    }

    /// Make the next ingest drop validity
    pub fn invalidate(&self) {
        self.state.borrow_mut().pending.push_back(None);
    }

    pub fn ingest_calls(&self) -> u64 {
        self.state.borrow().ingest_calls
    }

    pub fn is_valid(&self) -> bool {
        self.state.borrow().valid
    }
}
