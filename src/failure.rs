use std::{fmt, io};

/// RPC status code reported by the remote service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl StatusCode {
    /// Maps a numeric wire code; values outside the known range become `Unknown`.
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Cancelled,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Structured detail attached to a status by the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorDetail {
    /// The document is locked by another actor.
    Locked,
    /// The client's collection manifest is older than the server's.
    CollectionManifestOutdated,
    /// The request was routed with a stale cluster map.
    TopologyOutdated,
    /// The server could not process the request right now.
    TemporaryFailure,
    /// A durable write on the same document is still in progress.
    SyncWriteInProgress,
}

/// Failure of a single transport attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportFailure {
    /// Connection-level error raised before or while the request was in flight.
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),
    /// The remote service answered with a non-OK status.
    #[error("rpc status {code}: {message}")]
    Status {
        code: StatusCode,
        message: String,
        detail: Option<ErrorDetail>,
    },
}

impl TransportFailure {
    /// Builds a status failure without structured detail.
    pub fn status(code: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// Builds a status failure carrying structured detail.
    pub fn with_detail(code: StatusCode, message: impl Into<String>, detail: ErrorDetail) -> Self {
        Self::Status {
            code,
            message: message.into(),
            detail: Some(detail),
        }
    }

    pub fn code(&self) -> Option<StatusCode> {
        match self {
            Self::Connection(_) => None,
            Self::Status { code, .. } => Some(*code),
        }
    }

    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Connection(_) => None,
            Self::Status { detail, .. } => detail.as_ref(),
        }
    }

    /// Whether the failure is an application outcome rather than a retry candidate.
    pub fn is_definitive(&self) -> bool {
        matches!(
            self.code(),
            Some(
                StatusCode::NotFound
                    | StatusCode::AlreadyExists
                    | StatusCode::InvalidArgument
                    | StatusCode::PermissionDenied
                    | StatusCode::Unauthenticated
                    | StatusCode::Unimplemented
                    | StatusCode::OutOfRange
            )
        ) && self.detail().is_none()
    }
}

impl From<io::Error> for TransportFailure {
    fn from(err: io::Error) -> Self {
        Self::Connection(err)
    }
}
