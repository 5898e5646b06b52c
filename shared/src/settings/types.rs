use serde::{Deserialize, Serialize};
use std::fmt;

/// User-tunable settings persisted across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Interval between automatic log polls, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Cap on retained log entries.
    #[serde(default = "default_max_stored_logs")]
    pub max_stored_logs: usize,
    /// Documents fetched per table page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Whether the log view renders timestamps.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            max_stored_logs: default_max_stored_logs(),
            page_size: default_page_size(),
            show_timestamps: default_true(),
        }
    }
}

/// Persisted position and size of the panel container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The panel tab the user last had active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Logs,
    Data,
    Network,
    Settings,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Logs => "logs",
            Tab::Data => "data",
            Tab::Network => "network",
            Tab::Settings => "settings",
        }
    }

    pub fn from_str_tag(s: &str) -> Option<Self> {
        match s {
            "logs" => Some(Tab::Logs),
            "data" => Some(Tab::Data),
            "network" => Some(Tab::Network),
            "settings" => Some(Tab::Settings),
            _ => None,
        }
    }
}

impl Default for Tab {
    fn default() -> Self {
        Tab::Logs
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Default value functions ─────────────────────────────────────────

fn default_poll_interval() -> u64 {
    1_000
}
fn default_max_stored_logs() -> usize {
    1_000
}
fn default_page_size() -> usize {
    25
}
fn default_true() -> bool {
    true
}
