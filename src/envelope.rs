use std::time::{Duration, Instant};

use crate::{Clock, ClusterError, Deadline, OperationDescriptor, RetryReason, TransportFailure};

/// Per-call retry state.
///
/// Owned by exactly one logical operation and dropped when it completes.
/// Only the orchestrator records attempts.
#[derive(Debug)]
pub struct RequestEnvelope {
    descriptor: OperationDescriptor,
    deadline: Deadline,
    attempts: u32,
    reasons: Vec<RetryReason>,
}

impl RequestEnvelope {
    pub fn new(descriptor: OperationDescriptor, deadline: Deadline) -> Self {
        Self {
            descriptor,
            deadline,
            attempts: 0,
            reasons: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Number of retries granted so far.
    pub fn attempt_count(&self) -> u32 {
        self.attempts
    }

    /// Reasons behind each granted retry, oldest first.
    pub fn reasons(&self) -> &[RetryReason] {
        &self.reasons
    }

    pub fn remaining<C: Clock + ?Sized>(&self, clock: &C) -> Duration {
        self.deadline.remaining_at(clock.now())
    }

    pub(crate) fn record_attempt(&mut self, reason: RetryReason) {
        self.attempts = self.attempts.saturating_add(1);
        self.reasons.push(reason);
    }

    pub(crate) fn deadline_exceeded(
        &self,
        now: Instant,
        cause: Option<TransportFailure>,
    ) -> ClusterError {
        ClusterError::DeadlineExceeded {
            elapsed: self.deadline.elapsed_at(now),
            attempts: self.attempts,
            reasons: self.reasons.clone(),
            cause,
        }
    }
}
