//! `cluster-retry` resolves request deadlines and orchestrates retries for a
//! clustered data service client.
//!
//! The crate sits between an option-builder layer and the transport:
//! - [`TimeoutResolver`] turns an [`OperationDescriptor`] into a [`Deadline`]
//! - [`classify`] maps a [`TransportFailure`] onto a [`RetryReason`]
//! - [`RetryOrchestrator::decide`] answers retry-or-give-up for a [`RequestEnvelope`]
//! - [`ClusterClient::execute`] drives a caller-supplied attempt through all of the above

pub mod backoff;
mod classify;
mod client;
mod clock;
mod connection_string;
mod deadline;
mod envelope;
mod error;
mod failure;
mod options;
mod orchestrator;
mod reason;
mod request;
mod run;
pub mod timeout;
mod types;

pub use backoff::{BackoffStrategy, ControlledBackoff, ExponentialBackoff, Jitter, StepBackoff};
pub use classify::{classify, classify_io_error, classify_status};
pub use client::{ClusterClient, CONNECTION_STRING_ENV};
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use connection_string::ConnectionString;
pub use deadline::Deadline;
pub use envelope::RequestEnvelope;
pub use error::ClusterError;
pub use failure::{ErrorDetail, StatusCode, TransportFailure};
pub use options::ClientOptions;
pub use orchestrator::{RetryDecision, RetryOrchestrator};
pub use reason::{BackoffKind, RetryEligibility, RetryReason};
pub use request::{OperationDescriptor, RequestOptions};
pub use run::{run_with_retry, AttemptContext};
pub use timeout::TimeoutResolver;
pub use types::{DurabilityLevel, OperationKind};

pub type Result<T> = std::result::Result<T, ClusterError>;
