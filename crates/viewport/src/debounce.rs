//! Timer-coalescing for bursty values.
//!
//! Continuous gestures publish zoom and visibility dozens of times per
//! second; downstream rasterization only wants the settled value. A
//! [`Debounced`] collects submissions and flushes the most recent one after
//! a quiet period. Time is supplied by the caller, so event-loop hosts and
//! tests drive it the same way.

use std::time::{Duration, Instant};

struct Pending<T> {
    value: T,
    deadline: Instant,
}

pub struct Debounced<T> {
    settled: T,
    pending: Option<Pending<T>>,
    quiet: Duration,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, quiet: Duration) -> Self {
        Self {
            settled: initial,
            pending: None,
            quiet,
        }
    }

    /// Latest value that has survived a quiet period.
    pub fn value(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Submit a new value; each submission restarts the quiet window.
    pub fn submit(&mut self, value: T, now: Instant) {
        if self.pending.is_none() && value == self.settled {
            return;
        }

        self.pending = Some(Pending {
            value,
            deadline: now + self.quiet,
        });
    }

    /// Flush the pending value if its quiet window elapsed. Returns the
    /// newly-settled value, or `None` when nothing changed this poll.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        match self.pending.take() {
            Some(pending) if now >= pending.deadline => {
                if pending.value == self.settled {
                    return None;
                }
                self.settled = pending.value;
                Some(&self.settled)
            }
            other => {
                self.pending = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(100);

    #[test]
    fn value_settles_after_quiet_period() {
        let start = Instant::now();
        let mut zoom = Debounced::new(1.0f32, QUIET);

        zoom.submit(2.0, start);
        assert_eq!(zoom.poll(start + Duration::from_millis(50)), None);
        assert_eq!(*zoom.value(), 1.0);

        assert_eq!(zoom.poll(start + QUIET), Some(&2.0));
        assert_eq!(*zoom.value(), 2.0);
    }

    #[test]
    fn bursts_coalesce_to_the_last_value() {
        let start = Instant::now();
        let mut zoom = Debounced::new(1.0f32, QUIET);

        for (ms, value) in [(0, 1.2), (30, 1.5), (60, 1.9), (90, 2.3)] {
            zoom.submit(value, start + Duration::from_millis(ms));
        }

        // 90ms submission restarted the window; nothing settles at 150ms.
        assert_eq!(zoom.poll(start + Duration::from_millis(150)), None);

        assert_eq!(
            zoom.poll(start + Duration::from_millis(190)),
            Some(&2.3)
        );
    }

    #[test]
    fn resubmitting_the_settled_value_never_flushes() {
        let start = Instant::now();
        let mut visible = Debounced::new(false, QUIET);

        visible.submit(false, start);
        assert_eq!(visible.poll(start + QUIET), None);
        assert!(!visible.is_pending());
    }

    #[test]
    fn change_then_revert_within_window_is_silent() {
        let start = Instant::now();
        let mut visible = Debounced::new(false, QUIET);

        visible.submit(true, start);
        visible.submit(false, start + Duration::from_millis(20));

        assert_eq!(visible.poll(start + Duration::from_millis(200)), None);
        assert!(!*visible.value());
    }
}
