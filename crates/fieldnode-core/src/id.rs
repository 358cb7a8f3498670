//! Message identifiers
//!
//! Every outbound envelope carries a freshly generated `msgID`. Tokens are
//! random RFC 4122 version-4 UUID strings, the format the coordinator
//! itself uses for the ids it issues.

use std::fmt::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generator of unique message id tokens
pub struct MessageIdGenerator {
    rng: StdRng,
    issued: u64,
}

impl MessageIdGenerator {
    /// Create a generator seeded from OS entropy
    pub fn new() -> Self {
        MessageIdGenerator {
            rng: StdRng::from_entropy(),
            issued: 0,
        }
    }

    /// Create a deterministic generator (tests and simulation)
    pub fn with_seed(seed: u64) -> Self {
        MessageIdGenerator {
            rng: StdRng::seed_from_u64(seed),
            issued: 0,
        }
    }

    /// Produce the next id token
    pub fn next_id(&mut self) -> String {
        let mut bytes: [u8; 16] = self.rng.gen();
        // Version 4, RFC 4122 variant
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        self.issued += 1;
        format_uuid(&bytes)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn format_uuid(bytes: &[u8; 16]) -> String {
    let mut out = String::with_capacity(36);
    for (i, b) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        // Writing to a String cannot fail
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_format() {
        let mut ids = MessageIdGenerator::with_seed(7);
        let id = ids.next_id();

        assert_eq!(id.len(), 36);
        let groups: Vec<&str> = id.split('-').collect();
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
        assert!(groups[2].starts_with('4'));
        assert!(matches!(groups[3].as_bytes()[0], b'8' | b'9' | b'a' | b'b'));
    }

    #[test]
    fn test_ids_never_repeat() {
        let mut ids = MessageIdGenerator::new();
        let seen: HashSet<String> = (0..10_000).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 10_000);
        assert_eq!(ids.issued(), 10_000);
    }

    #[test]
    fn test_seeded_generators_are_deterministic() {
        let mut a = MessageIdGenerator::with_seed(42);
        let mut b = MessageIdGenerator::with_seed(42);
        assert_eq!(a.next_id(), b.next_id());
    }
}
