use std::future::Future;

use crate::{
    backoff::BackoffStrategy, run::run_with_retry, AttemptContext, ClientOptions, Clock,
    ClusterError, ConnectionString, OperationDescriptor, RequestEnvelope, Result,
    RetryOrchestrator, SystemClock, TimeoutResolver, TransportFailure,
};

/// Environment variable read by [`ClusterClient::from_env`].
pub const CONNECTION_STRING_ENV: &str = "CLUSTER_CONNECTION_STRING";

/// Entry point that resolves deadlines and drives retries for operations.
///
/// The client never talks to the network itself: each operation supplies
/// the function performing one transport attempt.
#[derive(Clone, Debug)]
pub struct ClusterClient<C = SystemClock> {
    resolver: TimeoutResolver,
    orchestrator: RetryOrchestrator<C>,
}

impl ClusterClient<SystemClock> {
    /// Creates a client with explicit client-level timeouts.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            resolver: TimeoutResolver::new(options),
            orchestrator: RetryOrchestrator::default(),
        }
    }

    /// Creates a client whose timeouts come from `<kind>_timeout` parameters.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use cluster_retry::{ClusterClient, OperationKind};
    ///
    /// let client = ClusterClient::from_connection_string("couchbase://db1?kv_timeout=6000")
    ///     .expect("valid connection string");
    /// assert_eq!(
    ///     client.resolver().configured_timeout(OperationKind::KeyValue),
    ///     Duration::from_secs(6)
    /// );
    /// ```
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        let parsed = ConnectionString::parse(connection_string)?;
        Ok(Self {
            resolver: TimeoutResolver::default().with_connection_string(parsed),
            orchestrator: RetryOrchestrator::default(),
        })
    }

    /// Creates a client from the `CLUSTER_CONNECTION_STRING` environment variable.
    ///
    /// Returns an error if the variable is missing, empty or malformed.
    pub fn from_env() -> Result<Self> {
        let value = std::env::var(CONNECTION_STRING_ENV).map_err(|_| {
            ClusterError::InvalidConnectionString(format!(
                "missing {CONNECTION_STRING_ENV} environment variable"
            ))
        })?;
        if value.trim().is_empty() {
            return Err(ClusterError::InvalidConnectionString(format!(
                "{CONNECTION_STRING_ENV} is set but empty"
            )));
        }
        Self::from_connection_string(&value)
    }
}

impl<C: Clock> ClusterClient<C> {
    /// Applies client-level timeouts; connection-string values stay as fallback.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.resolver.set_options(options);
        self
    }

    /// Replaces the clock used for deadlines and retry decisions.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ClusterClient<C2> {
        ClusterClient {
            resolver: self.resolver,
            orchestrator: self.orchestrator.with_clock(clock),
        }
    }

    pub fn with_exponential_backoff(mut self, strategy: impl BackoffStrategy + 'static) -> Self {
        self.orchestrator = self.orchestrator.with_exponential_backoff(strategy);
        self
    }

    pub fn with_controlled_backoff(mut self, strategy: impl BackoffStrategy + 'static) -> Self {
        self.orchestrator = self.orchestrator.with_controlled_backoff(strategy);
        self
    }

    pub fn resolver(&self) -> &TimeoutResolver {
        &self.resolver
    }

    pub fn orchestrator(&self) -> &RetryOrchestrator<C> {
        &self.orchestrator
    }

    /// Resolves the deadline for `descriptor` and wraps both in an envelope.
    pub fn prepare(&self, descriptor: OperationDescriptor) -> RequestEnvelope {
        let deadline = self.resolver.resolve(&descriptor, self.orchestrator.clock());
        RequestEnvelope::new(descriptor, deadline)
    }

    /// Runs one logical operation, retrying `attempt` as the policy allows.
    pub async fn execute<T, F, Fut>(&self, descriptor: OperationDescriptor, attempt: F) -> Result<T>
    where
        F: FnMut(AttemptContext) -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportFailure>>,
    {
        let mut envelope = self.prepare(descriptor);
        run_with_retry(&self.orchestrator, &mut envelope, attempt).await
    }
}
