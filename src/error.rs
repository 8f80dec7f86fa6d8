use std::time::Duration;

use crate::{RetryReason, TransportFailure};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// The failure reason does not allow retrying this kind of request.
    #[error("request cannot be retried for reason {reason}: {cause}")]
    NonRetryable {
        reason: RetryReason,
        #[source]
        cause: TransportFailure,
    },
    /// The operation deadline passed before it could complete.
    #[error("deadline exceeded after {elapsed:?} ({attempts} retries)")]
    DeadlineExceeded {
        /// Time spent since the deadline was issued.
        elapsed: Duration,
        /// Number of retries performed.
        attempts: u32,
        /// Reasons seen so far, oldest first.
        reasons: Vec<RetryReason>,
        /// Last underlying failure, if an attempt completed with one.
        #[source]
        cause: Option<TransportFailure>,
    },
    /// The attempt produced a definitive application-level failure.
    #[error("operation failed: {0}")]
    Operation(#[source] TransportFailure),
    /// Connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),
    /// A per-call option had an unusable value.
    #[error("invalid option '{name}': {message}")]
    InvalidOption { name: String, message: String },
}

impl ClusterError {
    pub(crate) fn invalid_option(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }

    /// The transport failure behind this error, if any.
    pub fn cause(&self) -> Option<&TransportFailure> {
        match self {
            Self::NonRetryable { cause, .. } | Self::Operation(cause) => Some(cause),
            Self::DeadlineExceeded { cause, .. } => cause.as_ref(),
            Self::InvalidConnectionString(_) | Self::InvalidOption { .. } => None,
        }
    }
}
