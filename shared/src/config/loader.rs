use serde::Deserialize;

/// Root configuration for the Scope engine.
///
/// Loaded from TOML files via the `config` crate with environment-variable
/// overrides (prefix: `SCOPE_`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeConfig {
    /// Deployment connection settings.
    #[serde(default)]
    pub deployment: DeploymentConfig,
    /// Log tailer tuning.
    #[serde(default)]
    pub tail: TailConfig,
    /// Table pagination tuning.
    #[serde(default)]
    pub page: PageConfig,
    /// Local persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Deployment connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    /// Base URL of the deployment (e.g. `http://127.0.0.1:3210`).
    #[serde(default = "default_deployment_url")]
    pub url: String,
    /// Admin key sent on every request. The deployment validates it; the
    /// engine only carries it.
    #[serde(default)]
    pub admin_key: Option<String>,
    /// Component to scope document queries to, if any.
    #[serde(default)]
    pub component_id: Option<String>,
}

/// Log tailer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TailConfig {
    /// Fixed delay between retries of a timed-out request, in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Maximum retries of a single timed-out request (excluding the first
    /// attempt).
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    /// Consecutive failures before polling is disabled until an explicit
    /// reset.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Minimum interval between poll attempts, in milliseconds. Polls
    /// arriving earlier are dropped, not queued.
    #[serde(default = "default_min_fetch_interval")]
    pub min_fetch_interval_ms: u64,
    /// Cap on the number of retained log entries; oldest entries are
    /// evicted beyond this.
    #[serde(default = "default_max_stored_logs")]
    pub max_stored_logs: usize,
}

/// Table pagination configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    /// Number of documents fetched per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Window during which an identical fetch is suppressed, in
    /// milliseconds.
    #[serde(default = "default_dedup_ttl")]
    pub dedup_ttl_ms: u64,
    /// Debounce window coalescing rapid filter/sort edits, in milliseconds.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

/// Local persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory the key-value files live in.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Scope prefix isolating this deployment's keys from others sharing
    /// the same store.
    #[serde(default = "default_scope")]
    pub scope: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter (e.g. `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            url: default_deployment_url(),
            admin_key: None,
            component_id: None,
        }
    }
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay(),
            max_retry_attempts: default_max_retry_attempts(),
            max_consecutive_errors: default_max_consecutive_errors(),
            min_fetch_interval_ms: default_min_fetch_interval(),
            max_stored_logs: default_max_stored_logs(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            dedup_ttl_ms: default_dedup_ttl(),
            debounce_ms: default_debounce(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scope: default_scope(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ── Default value functions ─────────────────────────────────────────

fn default_deployment_url() -> String {
    "http://127.0.0.1:3210".to_string()
}
fn default_retry_delay() -> u64 {
    2_000
}
fn default_max_retry_attempts() -> u32 {
    3
}
fn default_max_consecutive_errors() -> u32 {
    5
}
fn default_min_fetch_interval() -> u64 {
    1_000
}
fn default_max_stored_logs() -> usize {
    1_000
}
fn default_page_size() -> usize {
    25
}
fn default_dedup_ttl() -> u64 {
    2_000
}
fn default_debounce() -> u64 {
    150
}
fn default_data_dir() -> String {
    ".scope".to_string()
}
fn default_scope() -> String {
    "default".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
