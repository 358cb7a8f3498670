//! Time primitives for the node runtime
//!
//! All scheduling decisions use a monotonic time base measured from node
//! start. Wall-clock time is never used for ordering; it only appears as the
//! best-effort `msgTimestamp` string.

use std::ops::{Add, Sub};
use std::time::Duration;

/// Monotonic time - microseconds since node start
/// INVARIANT: never decreases across successive clock reads
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MonotonicTime(pub u64);

impl MonotonicTime {
    pub const ZERO: MonotonicTime = MonotonicTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        MonotonicTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        MonotonicTime(millis.saturating_mul(1000))
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        MonotonicTime(self.0.saturating_add(duration_micros(duration)))
    }

    /// Elapsed time since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn saturating_duration_since(self, earlier: MonotonicTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

#[inline]
fn duration_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl Add<Duration> for MonotonicTime {
    type Output = MonotonicTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<MonotonicTime> for MonotonicTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: MonotonicTime) -> Self::Output {
        self.saturating_duration_since(rhs)
    }
}

impl std::fmt::Debug for MonotonicTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t({:.3}ms)", self.0 as f64 / 1000.0)
    }
}
