//! Classify transport failures into retry reasons.
//!
//! Classification is total: anything not recognised becomes
//! [`RetryReason::Unknown`].

use std::io;

use crate::{ErrorDetail, RetryReason, StatusCode, TransportFailure};

/// Classify a connection-level I/O error.
pub fn classify_io_error(err: &io::Error) -> RetryReason {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => RetryReason::SocketClosedWhileInFlight,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::NotConnected
        | io::ErrorKind::AddrNotAvailable => RetryReason::SocketNotAvailable,
        io::ErrorKind::TimedOut => RetryReason::AttemptTimedOut,
        _ => RetryReason::Unknown,
    }
}

/// Classify an RPC status, preferring structured detail over the bare code.
pub fn classify_status(code: StatusCode, detail: Option<&ErrorDetail>) -> RetryReason {
    if let Some(detail) = detail {
        return match detail {
            ErrorDetail::Locked => RetryReason::KvLocked,
            ErrorDetail::CollectionManifestOutdated => RetryReason::KvCollectionOutdated,
            ErrorDetail::TopologyOutdated => RetryReason::TopologyOutdated,
            ErrorDetail::TemporaryFailure => RetryReason::KvTemporaryFailure,
            ErrorDetail::SyncWriteInProgress => RetryReason::KvSyncWriteInProgress,
        };
    }
    match code {
        StatusCode::Unavailable => RetryReason::ServiceNotAvailable,
        StatusCode::DeadlineExceeded => RetryReason::AttemptTimedOut,
        StatusCode::ResourceExhausted => RetryReason::KvTemporaryFailure,
        _ => RetryReason::Unknown,
    }
}

/// Classify a transport failure into a retry reason.
pub fn classify(failure: &TransportFailure) -> RetryReason {
    match failure {
        TransportFailure::Connection(err) => classify_io_error(err),
        TransportFailure::Status { code, detail, .. } => classify_status(*code, detail.as_ref()),
    }
}
