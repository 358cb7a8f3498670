//! Clock implementations for the node runtime

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use fieldnode_core::MonotonicTime;

/// Source of monotonic time for the scheduler
pub trait Clock {
    /// Current time. Successive reads never go backwards.
    fn now(&self) -> MonotonicTime;
}

/// Monotonic clock backed by the OS monotonic timer
/// INVARIANT: reads are non-decreasing, starting at zero at construction
pub struct MonotonicClock {
    /// Reference instant (node start)
    reference: Instant,
}

impl MonotonicClock {
    /// Create a new clock starting at zero
    pub fn new() -> Self {
        MonotonicClock {
            reference: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> MonotonicTime {
        let elapsed = self.reference.elapsed();
        MonotonicTime::from_micros(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX))
    }
}

/// Manually advanced clock
///
/// Clones share the same time value, so a test can keep one handle while
/// the scheduler owns another. Single-threaded by construction.
#[derive(Clone, Default)]
pub struct SimulatedClock {
    value: Rc<Cell<MonotonicTime>>,
}

impl SimulatedClock {
    /// Create a simulated clock at t=0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simulated clock at a given time
    pub fn starting_at(t: MonotonicTime) -> Self {
        SimulatedClock {
            value: Rc::new(Cell::new(t)),
        }
    }

    /// Move time forward
    pub fn advance(&self, dt: Duration) -> MonotonicTime {
        let next = self.value.get().saturating_add(dt);
        self.value.set(next);
        next
    }

    /// Jump to an absolute time. Only forward moves take effect.
    pub fn set(&self, t: MonotonicTime) {
        if t > self.value.get() {
            self.value.set(t);
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> MonotonicTime {
        self.value.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> MonotonicTime {
        (**self).now()
    }
}
