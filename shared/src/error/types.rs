use thiserror::Error;

/// Top-level error type for the Scope engine.
///
/// Each variant corresponds to a subsystem boundary. Underlying causes are
/// attached as `#[source]` where possible so that `anyhow` chains preserve
/// the full cause.
#[derive(Debug, Error)]
pub enum ScopeError {
    // ── Transport ──────────────────────────────────────────────
    #[error("transport: request to deployment failed")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("transport: deployment returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("transport: deployment gateway timed out (504)")]
    GatewayTimeout,

    // ── Auth ───────────────────────────────────────────────────
    #[error("auth: no deployment credentials configured")]
    MissingCredentials,

    #[error("auth: deployment rejected credentials (HTTP {0})")]
    CredentialsRejected(u16),

    // ── Contract ───────────────────────────────────────────────
    #[error("contract: deployment returned an invalid page payload: {0}")]
    InvalidPage(String),

    #[error("contract: log stream payload could not be decoded")]
    InvalidLogPayload(#[source] Box<dyn std::error::Error + Send + Sync>),

    // ── Filters ────────────────────────────────────────────────
    #[error("filter: expression could not be encoded for transport")]
    FilterEncode(#[source] serde_json::Error),

    #[error("filter: encoded expression could not be decoded: {0}")]
    FilterDecode(String),

    #[error("filter: unknown operator token '{0}'")]
    UnknownOperator(String),

    // ── Mutation ───────────────────────────────────────────────
    #[error("mutation: {op} on table '{table}' failed")]
    MutationFailed {
        table: String,
        op: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Storage ────────────────────────────────────────────────
    #[error("storage: backend operation failed")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    // ── Config ─────────────────────────────────────────────────
    #[error("config: failed to load configuration")]
    ConfigLoadFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("config: invalid value for '{key}': {reason}")]
    ConfigInvalid { key: String, reason: String },

    // ── Generic ────────────────────────────────────────────────
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ScopeError {
    /// Returns `true` for the timeout class of transport failure, which is
    /// retried against the same cursor rather than counted as a connection
    /// error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScopeError::GatewayTimeout)
    }

    /// Returns `true` for failures that no amount of retrying will fix:
    /// missing or rejected credentials.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ScopeError::MissingCredentials | ScopeError::CredentialsRejected(_)
        )
    }
}
