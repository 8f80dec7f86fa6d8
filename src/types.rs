use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of an outgoing operation.
///
/// The kind selects the built-in default timeout, the client-level
/// override and the connection-string parameter that apply to a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    KeyValue,
    Query,
    Analytics,
    Search,
    Views,
    Management,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::KeyValue,
        OperationKind::Query,
        OperationKind::Analytics,
        OperationKind::Search,
        OperationKind::Views,
        OperationKind::Management,
    ];

    /// Short service name used in connection-string keys (`<name>_timeout`).
    pub fn service_name(self) -> &'static str {
        match self {
            Self::KeyValue => "kv",
            Self::Query => "query",
            Self::Analytics => "analytics",
            Self::Search => "search",
            Self::Views => "view",
            Self::Management => "management",
        }
    }

    /// Looks up a kind by its service name.
    pub fn from_service_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.service_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

/// Replication/persistence acknowledgement requested for a mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurabilityLevel {
    #[default]
    None,
    Majority,
    #[serde(alias = "majorityAndPersistToActive")]
    MajorityAndPersistToActive,
    #[serde(alias = "persistToMajority")]
    PersistToMajority,
}

impl DurabilityLevel {
    /// Whether the level waits for acknowledgement beyond the active node.
    pub fn is_durable(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for DurabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Majority => "majority",
            Self::MajorityAndPersistToActive => "majority_and_persist_to_active",
            Self::PersistToMajority => "persist_to_majority",
        };
        f.write_str(name)
    }
}
