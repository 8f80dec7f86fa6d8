use std::time::{Duration, Instant};

/// Longest timeout a deadline will represent; larger values are clamped.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Absolute instant after which an operation is no longer retried.
///
/// Computed once per logical operation. Retries measure the time left
/// against the same instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Deadline {
    issued_at: Instant,
    expires_at: Instant,
}

impl Deadline {
    pub fn after(now: Instant, timeout: Duration) -> Self {
        let timeout = timeout.min(MAX_TIMEOUT);
        Self {
            issued_at: now,
            expires_at: now.checked_add(timeout).unwrap_or(now),
        }
    }

    /// The absolute expiry instant.
    pub fn instant(&self) -> Instant {
        self.expires_at
    }

    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }

    /// Total budget between issue and expiry.
    pub fn timeout(&self) -> Duration {
        self.expires_at.saturating_duration_since(self.issued_at)
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.issued_at)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{Deadline, MAX_TIMEOUT};

    #[test]
    fn remaining_counts_down_to_zero() {
        let now = Instant::now();
        let deadline = Deadline::after(now, Duration::from_secs(2));
        assert_eq!(deadline.timeout(), Duration::from_secs(2));
        assert_eq!(deadline.remaining_at(now), Duration::from_secs(2));
        assert_eq!(
            deadline.remaining_at(now + Duration::from_millis(500)),
            Duration::from_millis(1_500)
        );
        assert_eq!(deadline.remaining_at(now + Duration::from_secs(3)), Duration::ZERO);
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = Instant::now();
        let deadline = Deadline::after(now, Duration::from_secs(1));
        assert!(!deadline.is_expired_at(now));
        assert!(deadline.is_expired_at(now + Duration::from_secs(1)));
    }

    #[test]
    fn huge_timeouts_are_clamped() {
        let now = Instant::now();
        let deadline = Deadline::after(now, Duration::MAX);
        assert_eq!(deadline.timeout(), MAX_TIMEOUT);
    }
}
