//! Periodic due checks
//!
//! The check is a simple fixed threshold: a task is due once `interval` has
//! elapsed since it last ran. There is no catch-up: a late tick delays every
//! later tick by the same lag.

use std::time::Duration;

use fieldnode_core::MonotonicTime;

/// Is a periodic task due at `now`?
#[inline]
pub fn is_due(now: MonotonicTime, last_run_at: MonotonicTime, interval: Duration) -> bool {
    now.saturating_duration_since(last_run_at) >= interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_due_at_exact_interval() {
        let last = MonotonicTime::from_millis(1000);
        let interval = Duration::from_millis(250);

        assert!(!is_due(MonotonicTime::from_millis(1249), last, interval));
        assert!(is_due(MonotonicTime::from_millis(1250), last, interval));
        assert!(is_due(MonotonicTime::from_millis(1900), last, interval));
    }

    #[test]
    fn test_not_due_when_clock_behind_last_run() {
        let last = MonotonicTime::from_millis(1000);
        assert!(!is_due(MonotonicTime::from_millis(10), last, Duration::from_millis(1)));
    }

    #[test]
    fn test_late_tick_shifts_schedule() {
        let interval = Duration::from_millis(100);
        let mut last = MonotonicTime::ZERO;

        // Fires 30ms late at t=130; next due point is 230, not 200
        let now = MonotonicTime::from_millis(130);
        assert!(is_due(now, last, interval));
        last = now;

        assert!(!is_due(MonotonicTime::from_millis(200), last, interval));
        assert!(is_due(MonotonicTime::from_millis(230), last, interval));
    }

    proptest! {
        #[test]
        fn prop_due_matches_elapsed(last in 0u64..1_000_000, dt in 0u64..1_000_000, interval in 1u64..100_000) {
            let last_t = MonotonicTime::from_micros(last);
            let now = MonotonicTime::from_micros(last + dt);
            prop_assert_eq!(is_due(now, last_t, Duration::from_micros(interval)), dt >= interval);
        }
    }
}
