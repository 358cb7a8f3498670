//! Sensor driver seam
//!
//! Physical drivers (NMEA decoding, pressure transducer access) live
//! outside the runtime. They expose a pull-based interface: `ingest` pulls
//! whatever raw input is pending, and the "latest valid reading" is read
//! back together with its validity and updated-since-last-take flags.

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::{Reading, SourceTag};

/// Maximum queued reports drained by one `ingest` call
pub const MAX_INGEST_BATCH: usize = 64;

/// Pull-based sensor driver
///
/// Every method must return immediately; none may wait for hardware.
pub trait SensorDriver {
    /// Source this driver reports for
    fn source(&self) -> SourceTag;

    /// Pull pending raw input and update parser state.
    /// Returns the number of records consumed (0 when nothing is pending).
    fn ingest(&mut self) -> usize;

    /// Does the driver hold a valid reading?
    fn is_valid(&self) -> bool;

    /// Has the reading changed since the last `take_reading`?
    fn is_updated(&self) -> bool;

    /// Current reading; clears the updated flag
    fn take_reading(&mut self) -> Reading;
}

/// Report pushed by a producer into a [`QueuedDriver`]
#[derive(Clone, Debug, PartialEq)]
pub enum DriverReport {
    /// A new valid reading
    Valid(Reading),
    /// The source lost validity (e.g. GNSS fix lost)
    Invalid,
}

/// Producer handle of a [`QueuedDriver`]; cheap to clone and `Send`
#[derive(Clone, Debug)]
pub struct ReadingSender {
    tx: UnboundedSender<DriverReport>,
}

impl ReadingSender {
    /// Push a valid reading. Returns false if the driver is gone.
    pub fn report(&self, reading: Reading) -> bool {
        self.tx.send(DriverReport::Valid(reading)).is_ok()
    }

    /// Mark the source invalid. Returns false if the driver is gone.
    pub fn invalidate(&self) -> bool {
        self.tx.send(DriverReport::Invalid).is_ok()
    }
}

/// Driver fed through a single serialized queue
///
/// Interrupt handlers or bus threads push [`DriverReport`]s; the scheduler
/// drains them in `ingest` without blocking. Only the newest reading is kept.
pub struct QueuedDriver {
    source: SourceTag,
    rx: UnboundedReceiver<DriverReport>,
    latest: Reading,
    valid: bool,
    updated: bool,
}

impl QueuedDriver {
    /// Create a driver and its producer handle
    pub fn new(source: SourceTag) -> (Self, ReadingSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = QueuedDriver {
            source,
            rx,
            latest: Reading::default(),
            valid: false,
            updated: false,
        };
        (driver, ReadingSender { tx })
    }
}

impl SensorDriver for QueuedDriver {
    fn source(&self) -> SourceTag {
        self.source
    }

    fn ingest(&mut self) -> usize {
        let mut consumed = 0;
        while consumed < MAX_INGEST_BATCH {
            match self.rx.try_recv() {
                Ok(DriverReport::Valid(reading)) => {
                    self.latest = reading;
                    self.valid = true;
                    self.updated = true;
                }
                Ok(DriverReport::Invalid) => {
                    self.valid = false;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::trace!(source = self.source.name(), "driver producer gone");
                    break;
                }
            }
            consumed += 1;
        }
        consumed
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn is_updated(&self) -> bool {
        self.updated
    }

    fn take_reading(&mut self) -> Reading {
        self.updated = false;
        self.latest.clone()
    }
}
