use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// A function execution that failed outright, as opposed to a log line
    /// emitted at error level.
    Failure,
}

impl LogLevel {
    /// Returns the uppercase tag used on the wire and in display filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Failure => "FAILURE",
        }
    }

    /// Parse from a wire tag. Unknown tags map to `None`.
    pub fn from_str_tag(s: &str) -> Option<Self> {
        match s {
            "DEBUG" | "debug" => Some(LogLevel::Debug),
            "INFO" | "info" | "LOG" | "log" => Some(LogLevel::Info),
            "WARN" | "warn" => Some(LogLevel::Warn),
            "ERROR" | "error" => Some(LogLevel::Error),
            "FAILURE" | "failure" => Some(LogLevel::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of deployment function that produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Query,
    Mutation,
    Action,
    HttpAction,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Query => "query",
            FunctionKind::Mutation => "mutation",
            FunctionKind::Action => "action",
            FunctionKind::HttpAction => "httpaction",
        }
    }

    pub fn from_str_tag(s: &str) -> Option<Self> {
        match s {
            "query" | "Query" => Some(FunctionKind::Query),
            "mutation" | "Mutation" => Some(FunctionKind::Mutation),
            "action" | "Action" => Some(FunctionKind::Action),
            "httpaction" | "HttpAction" | "http_action" => Some(FunctionKind::HttpAction),
            _ => None,
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The function execution a log entry belongs to, when it belongs to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// What kind of function ran.
    pub kind: FunctionKind,
    /// Module path of the function (e.g. `messages:send`).
    pub path: String,
    /// Whether the result was served from the deployment's cache.
    pub cached: bool,
    /// Request id correlating all entries of one execution.
    pub request_id: String,
}

/// A single decoded log entry.
///
/// This is the canonical shape held in the tail buffer and handed to
/// embedders. Identity for dedup purposes is the derived [`LogKey`], not a
/// server-assigned id — the stream is append-only and may redeliver
/// overlapping windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time of the entry, milliseconds since the Unix epoch.
    pub timestamp: f64,
    /// Stream the entry came from (e.g. `console`).
    pub topic: String,
    /// The owning function execution, when known.
    pub function: Option<FunctionInfo>,
    /// Severity.
    pub log_level: LogLevel,
    /// Rendered message text.
    pub message: String,
    /// Execution time in milliseconds, for completed executions.
    pub execution_time_ms: Option<f64>,
    /// `success` / `failure` outcome, for completed executions.
    pub status: Option<String>,
    /// Error detail when the execution failed.
    pub error_message: Option<String>,
    /// The undecoded wire entry, kept for raw display.
    pub raw: serde_json::Value,
}

impl LogEntry {
    /// Derived composite identity used to deduplicate redelivered entries.
    pub fn key(&self) -> LogKey {
        LogKey {
            timestamp_bits: self.timestamp.to_bits(),
            request_id: self.function.as_ref().map(|f| f.request_id.clone()),
            message: self.message.clone(),
        }
    }

    /// The entry's timestamp as a typed value.
    pub fn time(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp as i64)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
    }
}

/// Composite identity of a log entry: timestamp + request id + message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogKey {
    pub timestamp_bits: u64,
    pub request_id: Option<String>,
    pub message: String,
}

/// A log entry as delivered by the deployment's stream endpoint.
///
/// Mapped 1:1 onto [`LogEntry`]; the only unit conversion is
/// `execution_time` (seconds) → `execution_time_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogEntry {
    pub timestamp: f64,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub udf_type: Option<String>,
    /// Module path of the executing function.
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub cached_result: Option<bool>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Execution time in seconds.
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RawLogEntry {
    /// Decode into the canonical [`LogEntry`] shape.
    pub fn into_entry(self) -> LogEntry {
        let raw = serde_json::to_value(&self).unwrap_or(serde_json::Value::Null);

        let function = match (&self.identifier, &self.request_id) {
            (Some(path), Some(request_id)) => Some(FunctionInfo {
                kind: self
                    .udf_type
                    .as_deref()
                    .and_then(FunctionKind::from_str_tag)
                    .unwrap_or(FunctionKind::Query),
                path: path.clone(),
                cached: self.cached_result.unwrap_or(false),
                request_id: request_id.clone(),
            }),
            _ => None,
        };

        let log_level = match (self.level.as_deref(), self.success) {
            (Some(tag), _) => LogLevel::from_str_tag(tag).unwrap_or(LogLevel::Info),
            (None, Some(false)) => LogLevel::Failure,
            _ => LogLevel::Info,
        };

        LogEntry {
            timestamp: self.timestamp,
            topic: self.topic.unwrap_or_else(|| "console".to_string()),
            function,
            log_level,
            message: self.message.unwrap_or_default(),
            execution_time_ms: self.execution_time.map(|secs| secs * 1_000.0),
            status: self.success.map(|ok| {
                if ok {
                    "success".to_string()
                } else {
                    "failure".to_string()
                }
            }),
            error_message: self.error,
            raw,
        }
    }
}
