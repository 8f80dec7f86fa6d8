//! Effective timeout and deadline computation.
//!
//! Precedence, highest first:
//! 1. explicit per-call timeout
//! 2. for durable writes, `max(configured, DURABLE_TIMEOUT_FLOOR)`
//! 3. configured timeout for the kind
//!
//! The configured timeout itself comes from [`ClientOptions`], then the
//! connection string, then the built-in per-kind default.

use std::time::Duration;

use crate::{
    ClientOptions, Clock, ConnectionString, Deadline, OperationDescriptor, OperationKind,
    RequestOptions,
};

pub const DEFAULT_KV_TIMEOUT: Duration = Duration::from_millis(2_500);
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(75);
pub const DEFAULT_ANALYTICS_TIMEOUT: Duration = Duration::from_secs(75);
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(75);
pub const DEFAULT_VIEW_TIMEOUT: Duration = Duration::from_secs(75);
pub const DEFAULT_MANAGEMENT_TIMEOUT: Duration = Duration::from_secs(75);

/// Minimum timeout for a write that waits on replication or persistence.
pub const DURABLE_TIMEOUT_FLOOR: Duration = Duration::from_secs(10);

/// Built-in timeout for `kind` when nothing is configured.
pub fn default_timeout(kind: OperationKind) -> Duration {
    match kind {
        OperationKind::KeyValue => DEFAULT_KV_TIMEOUT,
        OperationKind::Query => DEFAULT_QUERY_TIMEOUT,
        OperationKind::Analytics => DEFAULT_ANALYTICS_TIMEOUT,
        OperationKind::Search => DEFAULT_SEARCH_TIMEOUT,
        OperationKind::Views => DEFAULT_VIEW_TIMEOUT,
        OperationKind::Management => DEFAULT_MANAGEMENT_TIMEOUT,
    }
}

/// Resolves effective timeouts from layered configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimeoutResolver {
    options: ClientOptions,
    connection_string: Option<ConnectionString>,
}

impl TimeoutResolver {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            connection_string: None,
        }
    }

    pub fn with_connection_string(mut self, connection_string: ConnectionString) -> Self {
        self.connection_string = Some(connection_string);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub(crate) fn set_options(&mut self, options: ClientOptions) {
        self.options = options;
    }

    pub fn connection_string(&self) -> Option<&ConnectionString> {
        self.connection_string.as_ref()
    }

    /// Configured timeout for `kind`, ignoring per-call overrides.
    pub fn configured_timeout(&self, kind: OperationKind) -> Duration {
        self.options
            .timeout_for(kind)
            .or_else(|| {
                self.connection_string
                    .as_ref()
                    .and_then(|conn| conn.timeout_for(kind))
            })
            .unwrap_or_else(|| default_timeout(kind))
    }

    /// Effective timeout for one call of `kind` with the given overrides.
    pub fn effective_timeout(&self, kind: OperationKind, request: &RequestOptions) -> Duration {
        if let Some(timeout) = request.timeout {
            return timeout;
        }
        let configured = self.configured_timeout(kind);
        match request.durability {
            Some(level) if level.is_durable() => configured.max(DURABLE_TIMEOUT_FLOOR),
            _ => configured,
        }
    }

    /// Computes the absolute deadline for an operation starting now.
    pub fn resolve<C: Clock + ?Sized>(&self, descriptor: &OperationDescriptor, clock: &C) -> Deadline {
        let timeout = self.effective_timeout(descriptor.kind(), descriptor.options());

        #[cfg(feature = "tracing")]
        tracing::trace!(
            kind = %descriptor.kind(),
            timeout_ms = timeout.as_millis() as u64,
            "resolved operation timeout"
        );

        Deadline::after(clock.now(), timeout)
    }
}
