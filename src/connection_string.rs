use std::{collections::BTreeMap, str::FromStr, time::Duration};

use crate::{ClusterError, OperationKind, Result};

const DEFAULT_SCHEME: &str = "couchbase";
const TIMEOUT_SUFFIX: &str = "_timeout";

/// Parsed `scheme://host1,host2?key=value&...` connection string.
///
/// The query is form-urlencoded: keys and values are percent-decoded and a
/// key without `=` gets an empty value. Only `<kind>_timeout=<milliseconds>`
/// parameters are interpreted; everything else is kept in
/// [`ConnectionString::params`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionString {
    scheme: String,
    hosts: Vec<String>,
    timeouts: BTreeMap<OperationKind, Duration>,
    params: BTreeMap<String, String>,
}

impl ConnectionString {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let (scheme, rest) = match input.split_once("://") {
            Some((scheme, rest)) => (scheme, rest),
            None => (DEFAULT_SCHEME, input),
        };
        if scheme.is_empty() {
            return Err(ClusterError::InvalidConnectionString(format!(
                "missing scheme in '{input}'"
            )));
        }

        let (host_part, query) = match rest.split_once('?') {
            Some((hosts, query)) => (hosts, Some(query)),
            None => (rest, None),
        };
        let hosts: Vec<String> = host_part
            .trim_end_matches('/')
            .split([',', ';'])
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_owned)
            .collect();
        if hosts.is_empty() {
            return Err(ClusterError::InvalidConnectionString(format!(
                "no hosts in '{input}'"
            )));
        }

        let mut timeouts = BTreeMap::new();
        let mut params = BTreeMap::new();
        let pairs = query.map(|query| url::form_urlencoded::parse(query.as_bytes()));
        for (key, value) in pairs.into_iter().flatten() {
            match timeout_kind(&key) {
                Some(kind) => {
                    let millis: u64 = value.trim().parse().map_err(|_| {
                        ClusterError::InvalidConnectionString(format!(
                            "'{key}' must be a number of milliseconds, got '{value}'"
                        ))
                    })?;
                    timeouts.insert(kind, Duration::from_millis(millis));
                }
                None => {
                    params.insert(key.into_owned(), value.into_owned());
                }
            }
        }

        Ok(Self {
            scheme: scheme.to_owned(),
            hosts,
            timeouts,
            params,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Timeout supplied for `kind` through a `<kind>_timeout` parameter.
    pub fn timeout_for(&self, kind: OperationKind) -> Option<Duration> {
        self.timeouts.get(&kind).copied()
    }

    /// Parameters that were not interpreted as timeouts.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

impl FromStr for ConnectionString {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn timeout_kind(key: &str) -> Option<OperationKind> {
    key.strip_suffix(TIMEOUT_SUFFIX)
        .and_then(OperationKind::from_service_name)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{ClusterError, ConnectionString, OperationKind};

    #[test]
    fn parses_hosts_and_timeouts() {
        let conn = ConnectionString::parse(
            "couchbases://node1,node2?kv_timeout=6000&query_timeout=20000&network=external",
        )
        .expect("connection string must parse");

        assert_eq!(conn.scheme(), "couchbases");
        assert_eq!(conn.hosts(), ["node1".to_owned(), "node2".to_owned()]);
        assert_eq!(
            conn.timeout_for(OperationKind::KeyValue),
            Some(Duration::from_millis(6_000))
        );
        assert_eq!(
            conn.timeout_for(OperationKind::Query),
            Some(Duration::from_secs(20))
        );
        assert_eq!(conn.timeout_for(OperationKind::Search), None);
        assert_eq!(conn.params().get("network").map(String::as_str), Some("external"));
    }

    #[test]
    fn scheme_defaults_when_missing() {
        let conn: ConnectionString = "localhost".parse().expect("bare host must parse");
        assert_eq!(conn.scheme(), "couchbase");
        assert_eq!(conn.hosts(), ["localhost".to_owned()]);
    }

    #[test]
    fn view_and_management_keys() {
        let conn = ConnectionString::parse("couchbase://h?view_timeout=1&management_timeout=2")
            .expect("must parse");
        assert_eq!(
            conn.timeout_for(OperationKind::Views),
            Some(Duration::from_millis(1))
        );
        assert_eq!(
            conn.timeout_for(OperationKind::Management),
            Some(Duration::from_millis(2))
        );
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = ConnectionString::parse("couchbase://h?kv_timeout=fast").expect_err("must fail");
        assert!(matches!(err, ClusterError::InvalidConnectionString(_)));
    }

    #[test]
    fn rejects_missing_hosts() {
        let err = ConnectionString::parse("couchbase://?kv_timeout=1").expect_err("must fail");
        assert!(matches!(err, ClusterError::InvalidConnectionString(_)));
    }

    #[test]
    fn unknown_timeout_keys_are_plain_params() {
        let conn = ConnectionString::parse("couchbase://h?eventing_timeout=5").expect("must parse");
        assert_eq!(conn.params().get("eventing_timeout").map(String::as_str), Some("5"));
    }

    #[test]
    fn flag_without_value_is_kept_empty() {
        let conn = ConnectionString::parse("couchbase://h?enable_tracing&kv_timeout=3000")
            .expect("bare flag must parse");
        assert_eq!(conn.params().get("enable_tracing").map(String::as_str), Some(""));
        assert_eq!(
            conn.timeout_for(OperationKind::KeyValue),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn keys_and_values_are_percent_decoded() {
        let conn = ConnectionString::parse(
            "couchbase://h?kv_timeout=%36000&sasl_mech_force=SCRAM%2DSHA512&network%5Fmode=alt",
        )
        .expect("encoded parameters must parse");
        assert_eq!(
            conn.timeout_for(OperationKind::KeyValue),
            Some(Duration::from_secs(6))
        );
        assert_eq!(
            conn.params().get("sasl_mech_force").map(String::as_str),
            Some("SCRAM-SHA512")
        );
        assert_eq!(conn.params().get("network_mode").map(String::as_str), Some("alt"));
    }
}
