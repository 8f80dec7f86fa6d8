use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    backoff::{BackoffStrategy, ControlledBackoff, ExponentialBackoff},
    BackoffKind, Clock, ClusterError, RequestEnvelope, RetryReason, SystemClock, TransportFailure,
};

/// Outcome of asking whether a failed attempt should be retried.
#[derive(Debug)]
pub enum RetryDecision {
    /// Wait for the duration, then run the next attempt.
    RetryAfter(Duration),
    /// Stop and surface the error.
    GiveUp(ClusterError),
}

impl RetryDecision {
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::RetryAfter(_))
    }

    pub fn wait_duration(&self) -> Option<Duration> {
        match self {
            Self::RetryAfter(wait) => Some(*wait),
            Self::GiveUp(_) => None,
        }
    }

    pub fn into_terminal_error(self) -> Option<ClusterError> {
        match self {
            Self::RetryAfter(_) => None,
            Self::GiveUp(err) => Some(err),
        }
    }
}

/// Decides whether and when a failed attempt is retried.
///
/// Holds no per-call state; everything lives in the [`RequestEnvelope`].
#[derive(Clone)]
pub struct RetryOrchestrator<C = SystemClock> {
    clock: C,
    exponential: Arc<dyn BackoffStrategy>,
    controlled: Arc<dyn BackoffStrategy>,
}

impl<C: fmt::Debug> fmt::Debug for RetryOrchestrator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOrchestrator")
            .field("clock", &self.clock)
            .field("exponential", &"<strategy>")
            .field("controlled", &"<strategy>")
            .finish()
    }
}

impl Default for RetryOrchestrator<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> RetryOrchestrator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            exponential: Arc::new(ExponentialBackoff::default()),
            controlled: Arc::new(ControlledBackoff::default()),
        }
    }

    /// Replaces the strategy used by exponential-backoff reasons.
    pub fn with_exponential_backoff(mut self, strategy: impl BackoffStrategy + 'static) -> Self {
        self.exponential = Arc::new(strategy);
        self
    }

    /// Replaces the strategy used by controlled-backoff reasons.
    pub fn with_controlled_backoff(mut self, strategy: impl BackoffStrategy + 'static) -> Self {
        self.controlled = Arc::new(strategy);
        self
    }

    /// Swaps the clock, keeping the configured strategies.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> RetryOrchestrator<C2> {
        RetryOrchestrator {
            clock,
            exponential: self.exponential,
            controlled: self.controlled,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn strategy(&self, kind: BackoffKind) -> &dyn BackoffStrategy {
        match kind {
            BackoffKind::Controlled => self.controlled.as_ref(),
            BackoffKind::Exponential => self.exponential.as_ref(),
        }
    }

    /// Decides what to do after an attempt failed with `cause`.
    ///
    /// On retry the envelope's attempt count and reason history are updated.
    /// Every terminal decision carries `cause`.
    pub fn decide(
        &self,
        envelope: &mut RequestEnvelope,
        reason: RetryReason,
        cause: TransportFailure,
    ) -> RetryDecision {
        match self.evaluate(envelope, reason) {
            Verdict::Retry(wait) => RetryDecision::RetryAfter(wait),
            Verdict::NotPermitted => {
                RetryDecision::GiveUp(ClusterError::NonRetryable { reason, cause })
            }
            Verdict::PastDeadline(now) => {
                RetryDecision::GiveUp(envelope.deadline_exceeded(now, Some(cause)))
            }
        }
    }

    /// Same checks and bookkeeping as [`decide`](Self::decide), leaving the
    /// failure with the caller.
    pub(crate) fn evaluate(&self, envelope: &mut RequestEnvelope, reason: RetryReason) -> Verdict {
        if !reason.permits(envelope.descriptor().is_idempotent()) {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                %reason,
                kind = %envelope.descriptor().kind(),
                "reason not retryable for non-idempotent request"
            );
            return Verdict::NotPermitted;
        }

        let wait = self
            .strategy(reason.backoff())
            .compute_wait(envelope.attempt_count());
        let now = self.clock.now();
        let deadline = envelope.deadline().instant();
        let fits = now.checked_add(wait).is_some_and(|resume| resume < deadline);
        if !fits {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                %reason,
                attempts = envelope.attempt_count(),
                wait_ms = wait.as_millis() as u64,
                "retry would pass the deadline"
            );
            return Verdict::PastDeadline(now);
        }

        envelope.record_attempt(reason);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            %reason,
            attempt = envelope.attempt_count(),
            wait_ms = wait.as_millis() as u64,
            "retrying request"
        );

        Verdict::Retry(wait)
    }
}

/// Cause-free form of [`RetryDecision`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Retry(Duration),
    NotPermitted,
    /// The wait would not finish before the deadline; holds the instant of
    /// the check.
    PastDeadline(Instant),
}

#[cfg(test)]
mod tests {
    use std::{io, time::Duration};

    use super::{RetryDecision, RetryOrchestrator};
    use crate::{
        Clock, ClusterError, Deadline, ManualClock, OperationDescriptor, OperationKind,
        RequestEnvelope, RetryReason, StatusCode, TransportFailure,
    };

    fn failure() -> TransportFailure {
        TransportFailure::status(StatusCode::Internal, "boom")
    }

    fn envelope(clock: &ManualClock, idempotent: bool, timeout: Duration) -> RequestEnvelope {
        RequestEnvelope::new(
            OperationDescriptor::new(OperationKind::KeyValue, idempotent),
            Deadline::after(clock.now(), timeout),
        )
    }

    fn wait_of(decision: RetryDecision) -> Duration {
        match decision {
            RetryDecision::RetryAfter(wait) => wait,
            RetryDecision::GiveUp(err) => panic!("expected retry, got {err}"),
        }
    }

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        assert!(diff < Duration::from_millis(1), "expected ~{expected:?}, got {actual:?}");
    }

    #[test]
    fn non_idempotent_request_gives_up_on_idempotent_only_reason() {
        let clock = ManualClock::new();
        let orchestrator = RetryOrchestrator::new(clock.clone());
        let mut env = envelope(&clock, false, Duration::from_secs(60));

        for reason in [
            RetryReason::Unknown,
            RetryReason::SocketClosedWhileInFlight,
            RetryReason::AttemptTimedOut,
        ] {
            let decision = orchestrator.decide(&mut env, reason, failure());
            assert!(!decision.should_retry());
            match decision.into_terminal_error() {
                Some(ClusterError::NonRetryable { reason: got, cause }) => {
                    assert_eq!(got, reason);
                    assert_eq!(cause.code(), Some(StatusCode::Internal));
                }
                other => panic!("expected non-retryable error, got {other:?}"),
            }
        }
        assert_eq!(env.attempt_count(), 0);
    }

    #[test]
    fn non_idempotent_request_retries_when_locked() {
        let clock = ManualClock::new();
        let orchestrator = RetryOrchestrator::new(clock.clone());
        let mut env = envelope(&clock, false, Duration::from_secs(60));

        let decision = orchestrator.decide(&mut env, RetryReason::KvLocked, failure());
        assert!(decision.should_retry());
        assert_eq!(env.attempt_count(), 1);
        assert_eq!(env.reasons(), [RetryReason::KvLocked]);
    }

    #[test]
    fn exponential_waits_follow_calibration() {
        let clock = ManualClock::new();
        let orchestrator = RetryOrchestrator::new(clock.clone());
        let mut env = envelope(&clock, true, Duration::from_secs(120));

        let first = wait_of(orchestrator.decide(&mut env, RetryReason::Unknown, failure()));
        assert_close(first, Duration::from_millis(1_500));

        let _ = wait_of(orchestrator.decide(&mut env, RetryReason::Unknown, failure()));
        assert_eq!(env.attempt_count(), 2);

        let third = wait_of(orchestrator.decide(&mut env, RetryReason::Unknown, failure()));
        assert_close(third, Duration::from_millis(7_500));
        assert_eq!(env.attempt_count(), 3);
    }

    #[test]
    fn controlled_wait_is_independent_of_attempts() {
        let clock = ManualClock::new();
        let orchestrator = RetryOrchestrator::new(clock.clone());
        let mut env = envelope(&clock, false, Duration::from_secs(120));

        for _ in 0..5 {
            let wait = wait_of(orchestrator.decide(
                &mut env,
                RetryReason::KvCollectionOutdated,
                failure(),
            ));
            assert_eq!(wait, Duration::from_secs(1));
        }
        assert_eq!(env.attempt_count(), 5);
    }

    #[test]
    fn never_retries_past_the_deadline() {
        let clock = ManualClock::new();
        let orchestrator = RetryOrchestrator::new(clock.clone());
        let mut env = envelope(&clock, true, Duration::from_secs(2));

        // 1.5 s wait fits into a 2 s budget.
        assert!(orchestrator
            .decide(&mut env, RetryReason::Unknown, failure())
            .should_retry());

        clock.advance(Duration::from_millis(1_600));
        let decision = orchestrator.decide(&mut env, RetryReason::TopologyOutdated, failure());
        match decision {
            RetryDecision::GiveUp(ClusterError::DeadlineExceeded {
                elapsed,
                attempts,
                reasons,
                cause,
            }) => {
                assert_eq!(elapsed, Duration::from_millis(1_600));
                assert_eq!(attempts, 1);
                assert_eq!(reasons, vec![RetryReason::Unknown]);
                assert!(cause.is_some());
            }
            other => panic!("expected deadline exceeded, got {other:?}"),
        }
        assert_eq!(env.attempt_count(), 1);
    }

    #[test]
    fn wait_landing_exactly_on_deadline_gives_up() {
        let clock = ManualClock::new();
        let orchestrator = RetryOrchestrator::new(clock.clone());
        let mut env = envelope(&clock, true, Duration::from_secs(1));

        let decision = orchestrator.decide(&mut env, RetryReason::TopologyOutdated, failure());
        assert!(decision
            .into_terminal_error()
            .is_some_and(|err| err.is_deadline_exceeded()));
    }

    #[test]
    fn expired_deadline_blocks_every_reason() {
        let clock = ManualClock::new();
        let orchestrator = RetryOrchestrator::new(clock.clone())
            .with_exponential_backoff(|_attempt: u32| Duration::ZERO)
            .with_controlled_backoff(|_attempt: u32| Duration::ZERO);
        let mut env = envelope(&clock, true, Duration::from_secs(1));
        clock.advance(Duration::from_secs(1));

        for reason in [RetryReason::Unknown, RetryReason::KvLocked, RetryReason::TopologyOutdated] {
            let cause = TransportFailure::from(io::Error::from(io::ErrorKind::ConnectionReset));
            assert!(!orchestrator.decide(&mut env, reason, cause).should_retry());
        }
    }

    #[test]
    fn swapped_strategy_is_used() {
        let clock = ManualClock::new();
        let orchestrator = RetryOrchestrator::new(clock.clone())
            .with_exponential_backoff(|attempt: u32| Duration::from_millis(100 * u64::from(attempt + 1)));
        let mut env = envelope(&clock, true, Duration::from_secs(10));

        assert_eq!(
            wait_of(orchestrator.decide(&mut env, RetryReason::Unknown, failure())),
            Duration::from_millis(100)
        );
        assert_eq!(
            wait_of(orchestrator.decide(&mut env, RetryReason::ServiceNotAvailable, failure())),
            Duration::from_millis(200)
        );
    }
}
