use std::fmt;

/// Which requests may be retried for a given reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryEligibility {
    /// Only idempotent requests are retried.
    IdempotentOnly,
    /// Non-idempotent requests are retried too.
    NonIdempotent,
    /// Retried regardless of idempotency.
    Always,
}

/// Backoff strategy bound to a reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffKind {
    /// Fixed wait, independent of the attempt count.
    Controlled,
    /// Wait grows with the attempt count.
    Exponential,
}

/// Why an attempt failed, as far as retrying is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryReason {
    /// Failure that could not be classified.
    Unknown,
    /// The connection dropped while the request was in flight.
    SocketClosedWhileInFlight,
    /// The attempt timed out without an answer.
    AttemptTimedOut,
    /// No connection was available; the request never left the client.
    SocketNotAvailable,
    /// The target service rejected the request as unavailable.
    ServiceNotAvailable,
    /// The document is locked.
    KvLocked,
    /// The server asked the client to back off temporarily.
    KvTemporaryFailure,
    /// A durable write on the same document is in progress.
    KvSyncWriteInProgress,
    /// The collection manifest is outdated.
    KvCollectionOutdated,
    /// The cluster topology used for routing is outdated.
    TopologyOutdated,
}

impl RetryReason {
    pub fn eligibility(self) -> RetryEligibility {
        match self {
            Self::Unknown | Self::SocketClosedWhileInFlight | Self::AttemptTimedOut => {
                RetryEligibility::IdempotentOnly
            }
            Self::SocketNotAvailable
            | Self::ServiceNotAvailable
            | Self::KvLocked
            | Self::KvTemporaryFailure
            | Self::KvSyncWriteInProgress => RetryEligibility::NonIdempotent,
            Self::KvCollectionOutdated | Self::TopologyOutdated => RetryEligibility::Always,
        }
    }

    pub fn backoff(self) -> BackoffKind {
        match self.eligibility() {
            RetryEligibility::Always => BackoffKind::Controlled,
            RetryEligibility::IdempotentOnly | RetryEligibility::NonIdempotent => {
                BackoffKind::Exponential
            }
        }
    }

    pub fn allows_non_idempotent_retry(self) -> bool {
        !matches!(self.eligibility(), RetryEligibility::IdempotentOnly)
    }

    pub fn always_retry(self) -> bool {
        matches!(self.eligibility(), RetryEligibility::Always)
    }

    /// Whether a request with the given idempotency may be retried for this reason.
    pub fn permits(self, idempotent: bool) -> bool {
        idempotent || self.allows_non_idempotent_retry()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::SocketClosedWhileInFlight => "SOCKET_CLOSED_WHILE_IN_FLIGHT",
            Self::AttemptTimedOut => "ATTEMPT_TIMED_OUT",
            Self::SocketNotAvailable => "SOCKET_NOT_AVAILABLE",
            Self::ServiceNotAvailable => "SERVICE_NOT_AVAILABLE",
            Self::KvLocked => "KV_LOCKED",
            Self::KvTemporaryFailure => "KV_TEMPORARY_FAILURE",
            Self::KvSyncWriteInProgress => "KV_SYNC_WRITE_IN_PROGRESS",
            Self::KvCollectionOutdated => "KV_COLLECTION_OUTDATED",
            Self::TopologyOutdated => "TOPOLOGY_OUTDATED",
        }
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{BackoffKind, RetryReason};

    #[test]
    fn unknown_is_idempotent_only_with_exponential_backoff() {
        assert!(RetryReason::Unknown.permits(true));
        assert!(!RetryReason::Unknown.permits(false));
        assert_eq!(RetryReason::Unknown.backoff(), BackoffKind::Exponential);
    }

    #[test]
    fn locked_retries_non_idempotent_requests() {
        assert!(RetryReason::KvLocked.permits(false));
        assert!(!RetryReason::KvLocked.always_retry());
        assert_eq!(RetryReason::KvLocked.backoff(), BackoffKind::Exponential);
    }

    #[test]
    fn outdated_metadata_always_retries_with_controlled_backoff() {
        for reason in [RetryReason::KvCollectionOutdated, RetryReason::TopologyOutdated] {
            assert!(reason.always_retry());
            assert!(reason.permits(false));
            assert_eq!(reason.backoff(), BackoffKind::Controlled);
        }
    }

    #[test]
    fn display_uses_constant_names() {
        assert_eq!(RetryReason::KvLocked.to_string(), "KV_LOCKED");
    }
}
