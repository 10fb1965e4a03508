//! Single-slot deferred task used to coalesce bursts of edits.

use std::time::Duration;

use tokio::time::Instant;

/// A debounce timer with one slot: arming while already armed replaces the
/// deadline instead of stacking a second one, so a burst of mutations
/// collapses into a single firing after the last edit.
#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the timer to fire `delay` after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if armed.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_arm_sets_deadline_after_delay() {
        let mut timer = DebounceTimer::new(Duration::from_secs(3));
        assert!(!timer.is_armed());

        let now = Instant::now();
        timer.arm(now);
        assert_eq!(timer.deadline(), Some(now + Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        let mut timer = DebounceTimer::new(Duration::from_secs(3));
        let now = Instant::now();
        timer.arm(now);

        let later = now + Duration::from_secs(2);
        timer.arm(later);
        assert_eq!(timer.deadline(), Some(later + Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_disarms() {
        let mut timer = DebounceTimer::new(Duration::from_secs(3));
        timer.arm(Instant::now());
        timer.cancel();
        assert!(!timer.is_armed());
        assert_eq!(timer.deadline(), None);
    }
}
