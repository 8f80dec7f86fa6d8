use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{ClusterError, DurabilityLevel, OperationKind, Result};

/// Exported-option key carrying a per-call timeout in milliseconds.
pub const TIMEOUT_KEY: &str = "timeout";
/// Exported-option key carrying a durability level.
pub const DURABILITY_KEY: &str = "durability_level";

/// Typed per-call overrides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Explicit timeout; wins over every other source.
    pub timeout: Option<Duration>,
    /// Requested durability for a key-value mutation.
    pub durability: Option<DurabilityLevel>,
}

impl RequestOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn durability(mut self, level: DurabilityLevel) -> Self {
        self.durability = Some(level);
        self
    }

    /// Converts the option map exported by an option builder.
    ///
    /// Recognises [`TIMEOUT_KEY`] and [`DURABILITY_KEY`]; other keys belong
    /// to the request encoder and are ignored here.
    pub fn from_exported(kind: OperationKind, exported: &Map<String, Value>) -> Result<Self> {
        let mut options = Self::default();

        if let Some(value) = exported.get(TIMEOUT_KEY) {
            let millis = value.as_u64().ok_or_else(|| {
                ClusterError::invalid_option(
                    TIMEOUT_KEY,
                    format!("expected non-negative integer milliseconds, got {value}"),
                )
            })?;
            options.timeout = Some(Duration::from_millis(millis));
        }

        if let Some(value) = exported.get(DURABILITY_KEY) {
            let level = DurabilityLevel::deserialize(value).map_err(|err| {
                ClusterError::invalid_option(DURABILITY_KEY, err.to_string())
            })?;
            if level.is_durable() && kind != OperationKind::KeyValue {
                return Err(ClusterError::invalid_option(
                    DURABILITY_KEY,
                    format!("durability is only supported for kv operations, not {kind}"),
                ));
            }
            options.durability = Some(level);
        }

        Ok(options)
    }
}

/// Immutable description of an outgoing operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationDescriptor {
    kind: OperationKind,
    idempotent: bool,
    options: RequestOptions,
}

impl OperationDescriptor {
    pub fn new(kind: OperationKind, idempotent: bool) -> Self {
        Self {
            kind,
            idempotent,
            options: RequestOptions::default(),
        }
    }

    /// A pure read or naturally idempotent write.
    pub fn idempotent(kind: OperationKind) -> Self {
        Self::new(kind, true)
    }

    /// A write that may not be safely replayed (counters, appends, inserts).
    pub fn non_idempotent(kind: OperationKind) -> Self {
        Self::new(kind, false)
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Declares a non-idempotent operation safe to replay.
    pub fn mark_retry_safe(mut self) -> Self {
        self.idempotent = true;
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Map, Value};

    use crate::{ClusterError, DurabilityLevel, OperationDescriptor, OperationKind, RequestOptions};

    fn exported(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn reads_timeout_and_durability() {
        let map = exported(json!({
            "timeout": 3000,
            "durability_level": "majority",
            "expiry": 60
        }));
        let options =
            RequestOptions::from_exported(OperationKind::KeyValue, &map).expect("must convert");
        assert_eq!(options.timeout, Some(Duration::from_millis(3_000)));
        assert_eq!(options.durability, Some(DurabilityLevel::Majority));
    }

    #[test]
    fn empty_map_sets_nothing() {
        let options = RequestOptions::from_exported(OperationKind::Query, &Map::new())
            .expect("must convert");
        assert_eq!(options, RequestOptions::default());
    }

    #[test]
    fn rejects_bad_timeout_type() {
        let map = exported(json!({ "timeout": "3s" }));
        let err = RequestOptions::from_exported(OperationKind::KeyValue, &map)
            .expect_err("must reject string timeout");
        assert!(matches!(err, ClusterError::InvalidOption { ref name, .. } if name == "timeout"));

        let map = exported(json!({ "timeout": -5 }));
        assert!(RequestOptions::from_exported(OperationKind::KeyValue, &map).is_err());
    }

    #[test]
    fn rejects_unknown_durability() {
        let map = exported(json!({ "durability_level": "everywhere" }));
        assert!(RequestOptions::from_exported(OperationKind::KeyValue, &map).is_err());
    }

    #[test]
    fn durability_is_kv_only() {
        let map = exported(json!({ "durability_level": "persistToMajority" }));
        assert!(RequestOptions::from_exported(OperationKind::Query, &map).is_err());

        let map = exported(json!({ "durability_level": "none" }));
        let options =
            RequestOptions::from_exported(OperationKind::Query, &map).expect("none is allowed");
        assert_eq!(options.durability, Some(DurabilityLevel::None));
    }

    #[test]
    fn retry_safe_marks_idempotent() {
        let descriptor = OperationDescriptor::non_idempotent(OperationKind::KeyValue);
        assert!(!descriptor.is_idempotent());
        assert!(descriptor.mark_retry_safe().is_idempotent());
    }
}
