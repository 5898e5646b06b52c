use std::collections::HashSet;

use shared::log::{LogEntry, LogKey, LogLevel};

/// Capped, newest-first log store with identity dedup.
///
/// The stream is append-only and may redeliver overlapping windows, so
/// incoming entries are deduplicated against a rolling set of composite
/// keys before merging. Once the cap is exceeded the oldest entries are
/// evicted and their keys leave the set with them.
pub struct LogBuffer {
  entries: Vec<LogEntry>,
  seen: HashSet<LogKey>,
  max: usize,
}

impl LogBuffer {
  pub fn new(max: usize) -> Self {
    Self {
      entries: Vec::new(),
      seen: HashSet::new(),
      max: max.max(1),
    }
  }

  /// Merge a window of entries. Returns how many were new.
  pub fn merge(&mut self, incoming: Vec<LogEntry>) -> usize {
    let mut added = 0;
    for entry in incoming {
      if self.seen.insert(entry.key()) {
        self.entries.push(entry);
        added += 1;
      }
    }
    if added > 0 {
      // Newest first; the sort is stable so same-timestamp entries keep
      // their delivery order.
      self.entries.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
      while self.entries.len() > self.max {
        if let Some(evicted) = self.entries.pop() {
          self.seen.remove(&evicted.key());
        }
      }
    }
    added
  }

  /// All retained entries, newest first.
  pub fn entries(&self) -> &[LogEntry] {
    &self.entries
  }

  /// Entries matching a display filter, newest first.
  pub fn filtered<'a>(&'a self, filter: &'a LogFilter) -> impl Iterator<Item = &'a LogEntry> {
    self.entries.iter().filter(move |e| filter.matches(e))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.max
  }

  pub fn clear(&mut self) {
    self.entries.clear();
    self.seen.clear();
  }
}

/// Client-side display filter over the buffer. Applied to the view, never
/// to ingestion.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
  /// Case-insensitive substring match against the message and function
  /// path.
  pub text: Option<String>,
  /// Drop entries below this level.
  pub min_level: Option<LogLevel>,
}

impl LogFilter {
  pub fn matches(&self, entry: &LogEntry) -> bool {
    if let Some(min) = self.min_level {
      if entry.log_level < min {
        return false;
      }
    }
    if let Some(text) = &self.text {
      let needle = text.to_lowercase();
      let in_message = entry.message.to_lowercase().contains(&needle);
      let in_path = entry
        .function
        .as_ref()
        .map(|f| f.path.to_lowercase().contains(&needle))
        .unwrap_or(false);
      if !in_message && !in_path {
        return false;
      }
    }
    true
  }
}
