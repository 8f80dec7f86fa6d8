use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::OperationKind;

/// Client-level timeout settings, one optional value per operation kind.
///
/// Unset kinds fall back to the connection string and then to the
/// built-in defaults.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Key-value timeout in milliseconds.
    pub kv_timeout_ms: Option<u64>,
    /// Query timeout in milliseconds.
    pub query_timeout_ms: Option<u64>,
    /// Analytics timeout in milliseconds.
    pub analytics_timeout_ms: Option<u64>,
    /// Search timeout in milliseconds.
    pub search_timeout_ms: Option<u64>,
    /// Views timeout in milliseconds.
    pub view_timeout_ms: Option<u64>,
    /// Management timeout in milliseconds.
    pub management_timeout_ms: Option<u64>,
}

impl ClientOptions {
    fn slot(&self, kind: OperationKind) -> Option<u64> {
        match kind {
            OperationKind::KeyValue => self.kv_timeout_ms,
            OperationKind::Query => self.query_timeout_ms,
            OperationKind::Analytics => self.analytics_timeout_ms,
            OperationKind::Search => self.search_timeout_ms,
            OperationKind::Views => self.view_timeout_ms,
            OperationKind::Management => self.management_timeout_ms,
        }
    }

    fn slot_mut(&mut self, kind: OperationKind) -> &mut Option<u64> {
        match kind {
            OperationKind::KeyValue => &mut self.kv_timeout_ms,
            OperationKind::Query => &mut self.query_timeout_ms,
            OperationKind::Analytics => &mut self.analytics_timeout_ms,
            OperationKind::Search => &mut self.search_timeout_ms,
            OperationKind::Views => &mut self.view_timeout_ms,
            OperationKind::Management => &mut self.management_timeout_ms,
        }
    }

    /// Explicitly configured timeout for `kind`, if any.
    pub fn timeout_for(&self, kind: OperationKind) -> Option<Duration> {
        self.slot(kind).map(Duration::from_millis)
    }

    /// Sets the timeout for `kind`. Sub-millisecond precision is dropped.
    pub fn with_timeout(mut self, kind: OperationKind, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        *self.slot_mut(kind) = Some(millis);
        self
    }
}
