//! Recent command id window
//!
//! The coordinator gives no idempotence guarantee, so a duplicated
//! delivery would re-run a command. With a non-zero window, ids of the
//! last N accepted commands are remembered and repeats are dropped.

use std::collections::{HashSet, VecDeque};

/// Bounded set of recently accepted ids, evicted oldest first
#[derive(Clone, Debug, Default)]
pub struct RecentIds {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentIds {
    /// Create a window of `capacity` ids. A capacity of 0 accepts everything.
    pub fn new(capacity: usize) -> Self {
        RecentIds {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Is this id in the window?
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record an id. Returns true if accepted, false if it is a repeat.
    pub fn accept(&mut self, id: &str) -> bool {
        if self.capacity == 0 {
            return true;
        }
        if self.seen.contains(id) {
            return false;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.seen.insert(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_capacity_accepts_repeats() {
        let mut ids = RecentIds::new(0);
        assert!(ids.accept("a"));
        assert!(ids.accept("a"));
        assert!(ids.is_empty());
    }

    #[test]
    fn test_repeat_rejected() {
        let mut ids = RecentIds::new(4);
        assert!(ids.accept("a"));
        assert!(!ids.accept("a"));
        assert!(ids.contains("a"));
    }

    #[test]
    fn test_oldest_evicted() {
        let mut ids = RecentIds::new(2);
        ids.accept("a");
        ids.accept("b");
        ids.accept("c");

        assert!(!ids.contains("a"));
        assert!(ids.accept("a"));
        assert!(!ids.accept("c"));
        assert_eq!(ids.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_window_never_exceeds_capacity(
            cap in 0usize..8,
            seq in prop::collection::vec(0u8..16, 0..64),
        ) {
            let mut ids = RecentIds::new(cap);
            for id in seq {
                ids.accept(&id.to_string());
                prop_assert!(ids.len() <= cap);
                prop_assert_eq!(ids.len(), ids.seen.len());
            }
        }
    }
}
