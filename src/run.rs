//! Retry loop: run attempts until success, a terminal decision, or the deadline.

use std::{future::Future, time::Duration};

use crate::{
    classify, orchestrator::Verdict, Clock, ClusterError, RequestEnvelope, Result,
    RetryOrchestrator, TransportFailure,
};

/// What a single attempt is told about the call it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptContext {
    /// Retries already performed; `0` for the first dispatch.
    pub retry_attempt: u32,
    /// Time left before the operation deadline.
    pub remaining: Duration,
}

/// Runs `attempt` until it succeeds or the orchestrator gives up.
///
/// Each attempt is bounded by the time left on the envelope's deadline, and
/// both that bound and the waits between attempts run on the orchestrator's
/// [`Clock`]. When the deadline passes, the returned
/// [`ClusterError::DeadlineExceeded`] carries the last retried failure.
/// Failures for which [`TransportFailure::is_definitive`] holds are returned
/// as [`ClusterError::Operation`] without being retried.
pub async fn run_with_retry<C, T, F, Fut>(
    orchestrator: &RetryOrchestrator<C>,
    envelope: &mut RequestEnvelope,
    mut attempt: F,
) -> Result<T>
where
    C: Clock,
    F: FnMut(AttemptContext) -> Fut,
    Fut: Future<Output = std::result::Result<T, TransportFailure>>,
{
    let clock = orchestrator.clock();
    let mut last_failure: Option<TransportFailure> = None;

    loop {
        let now = clock.now();
        let remaining = envelope.deadline().remaining_at(now);
        if remaining.is_zero() {
            return Err(envelope.deadline_exceeded(now, last_failure.take()));
        }

        let context = AttemptContext {
            retry_attempt: envelope.attempt_count(),
            remaining,
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(
            retry_attempt = context.retry_attempt,
            remaining_ms = remaining.as_millis() as u64,
            "dispatching attempt"
        );

        let outcome = tokio::select! {
            biased;
            outcome = attempt(context) => Some(outcome),
            () = clock.sleep(remaining) => None,
        };
        let failure = match outcome {
            Some(Ok(value)) => return Ok(value),
            Some(Err(failure)) => failure,
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    retry_attempt = context.retry_attempt,
                    "attempt still running at the deadline"
                );
                return Err(envelope.deadline_exceeded(clock.now(), last_failure.take()));
            }
        };

        if failure.is_definitive() {
            return Err(ClusterError::Operation(failure));
        }

        let reason = classify(&failure);
        match orchestrator.evaluate(envelope, reason) {
            Verdict::Retry(wait) => {
                last_failure = Some(failure);
                clock.sleep(wait).await;
            }
            Verdict::NotPermitted => {
                return Err(ClusterError::NonRetryable {
                    reason,
                    cause: failure,
                });
            }
            Verdict::PastDeadline(now) => {
                return Err(envelope.deadline_exceeded(now, Some(failure)));
            }
        }
    }
}
