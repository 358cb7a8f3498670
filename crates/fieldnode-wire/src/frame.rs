//! Frame assembly for the envelope wire format
//!
//! Transports hand the node raw deliveries. A delivery may hold zero, one
//! or several complete frames, and over a byte stream a frame may span
//! deliveries. The assembler buffers bytes and yields one complete
//! top-level JSON object at a time.

use bytes::{Buf, Bytes, BytesMut};

use fieldnode_core::DecodeError;

/// Default bound on a single frame (complete or partial)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4096;

/// Incremental splitter of concatenated JSON object frames
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
    max_frame_size: usize,
    /// Scanner state inside an oversized frame whose bytes are being dropped
    skipping: Option<ObjectScanner>,
}

impl FrameAssembler {
    pub fn new(max_frame_size: usize) -> Self {
        FrameAssembler {
            buf: BytesMut::with_capacity(max_frame_size.min(DEFAULT_MAX_FRAME_SIZE)),
            max_frame_size,
            skipping: None,
        }
    }

    /// Append a delivery to the buffer
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Take the next complete frame, if any
    ///
    /// `Some(Err(..))` reports bytes that were discarded: stray data before a
    /// frame, or a frame exceeding the size bound. Call again to continue.
    pub fn next_frame(&mut self) -> Option<Result<Bytes, DecodeError>> {
        if let Some(mut scanner) = self.skipping.take() {
            match scanner.feed_all(&self.buf) {
                Some(end) => self.buf.advance(end),
                None => {
                    self.buf.clear();
                    self.skipping = Some(scanner);
                    return None;
                }
            }
        }

        let lead = self
            .buf
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.buf.advance(lead);

        if self.buf.is_empty() {
            return None;
        }

        if self.buf[0] != b'{' {
            let skip = self
                .buf
                .iter()
                .position(|&b| b == b'{')
                .unwrap_or(self.buf.len());
            self.buf.advance(skip);
            return Some(Err(DecodeError::Malformed(format!(
                "{} stray bytes before frame",
                skip
            ))));
        }

        let mut scanner = ObjectScanner::default();
        match scanner.feed_all(&self.buf) {
            Some(end) if end > self.max_frame_size => {
                self.buf.advance(end);
                Some(Err(DecodeError::Malformed(format!(
                    "frame of {} bytes exceeds limit {}",
                    end, self.max_frame_size
                ))))
            }
            Some(end) => Some(Ok(self.buf.split_to(end).freeze())),
            None if self.buf.len() > self.max_frame_size => {
                // Drop the rest of this object as it arrives
                let len = self.buf.len();
                self.buf.clear();
                self.skipping = Some(scanner);
                Some(Err(DecodeError::Malformed(format!(
                    "partial frame of {} bytes exceeds limit {}",
                    len, self.max_frame_size
                ))))
            }
            None => None,
        }
    }

    /// Close a discrete message: an unterminated remainder is discarded
    pub fn end_of_message(&mut self) -> Option<DecodeError> {
        let pending = self
            .buf
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .count();
        self.buf.clear();
        self.skipping = None;
        (pending > 0).then(|| DecodeError::Malformed(format!("truncated frame ({} bytes)", pending)))
    }

    /// Drop any buffered bytes (connection boundary)
    pub fn clear(&mut self) {
        self.buf.clear();
        self.skipping = None;
    }

    /// True while the tail of an oversized frame is being dropped
    pub fn is_skipping(&self) -> bool {
        self.skipping.is_some()
    }

    /// Number of buffered bytes
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

/// Brace and string tracker for one top-level JSON object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ObjectScanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ObjectScanner {
    /// Feed bytes until the object closes. Returns the number of bytes
    /// consumed up to and including the closing brace, or `None` if every
    /// byte was consumed without closing it.
    fn feed_all(&mut self, buf: &[u8]) -> Option<usize> {
        buf.iter().position(|&b| self.feed(b)).map(|i| i + 1)
    }

    fn feed(&mut self, b: u8) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if b == b'\\' {
                self.escaped = true;
            } else if b == b'"' {
                self.in_string = false;
            }
            return false;
        }

        match b {
            b'"' => self.in_string = true,
            b'{' => self.depth += 1,
            b'}' => {
                self.depth = self.depth.saturating_sub(1);
                return self.depth == 0;
            }
            _ => {}
        }
        false
    }
}
