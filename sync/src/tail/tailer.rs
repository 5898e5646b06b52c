use std::sync::Arc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use shared::config::TailConfig;
use shared::log::LogEntry;

use crate::client::DataSource;
use crate::clock::{Clock, SystemClock};

use super::buffer::{LogBuffer, LogFilter};
use super::state::{FailureDecision, PollDecision, TailParams, TailState, TailStatus};

/// What a poll request amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
  /// A fetch went out and its entries were merged.
  Polled { added: usize },
  /// Dropped by the minimum-interval throttle.
  Throttled,
  /// Polling is disabled until [`LogTailer::reset_connection`].
  Disabled,
  /// The response belonged to a request that was superseded or cancelled.
  Superseded,
  /// The fetch failed; see [`LogTailer::status`] for the surfaced state.
  Failed,
}

/// Async driver of the live log poll.
///
/// Owns the buffer and the poll state machine, and enforces
/// last-request-wins: issuing a new poll aborts any still-pending fetch,
/// and responses are checked against the issuing generation before they
/// are applied. Dropping the tailer aborts outstanding work.
pub struct LogTailer {
  source: Arc<dyn DataSource>,
  state: TailState,
  buffer: LogBuffer,
  clock: Arc<dyn Clock>,
  inflight: Option<AbortHandle>,
}

impl LogTailer {
  pub fn new(source: Arc<dyn DataSource>, cfg: &TailConfig) -> Self {
    Self::with_clock(source, cfg, Arc::new(SystemClock))
  }

  pub fn with_clock(source: Arc<dyn DataSource>, cfg: &TailConfig, clock: Arc<dyn Clock>) -> Self {
    Self {
      source,
      state: TailState::new(TailParams::from(cfg)),
      buffer: LogBuffer::new(cfg.max_stored_logs),
      clock,
      inflight: None,
    }
  }

  /// Request one poll of the log stream.
  ///
  /// Timeout-class failures are retried in place against the same cursor,
  /// with the fixed delay between attempts; every other failure is
  /// recorded and surfaced through [`Self::status`]. Errors never
  /// propagate out of the poll boundary.
  pub async fn poll(&mut self) -> PollOutcome {
    // A still-registered fetch means an earlier poll was cancelled at an
    // await point; the new request wins.
    if let Some(handle) = self.inflight.take() {
      handle.abort();
      self.state.supersede();
      debug!("superseded an in-flight log fetch");
    }

    let (generation, cursor) = match self.state.on_poll(self.clock.now()) {
      PollDecision::Fetch { generation, cursor } => (generation, cursor),
      PollDecision::Throttled => return PollOutcome::Throttled,
      PollDecision::Disabled => return PollOutcome::Disabled,
    };

    loop {
      let task = tokio::spawn({
        let source = self.source.clone();
        let cursor = cursor.clone();
        async move { source.stream_logs(cursor).await }
      });
      self.inflight = Some(task.abort_handle());
      let joined = task.await;
      self.inflight = None;

      let result = match joined {
        Ok(result) => result,
        // Aborted from outside; the response is gone by design.
        Err(_) => return PollOutcome::Superseded,
      };

      match result {
        Ok(chunk) => {
          if !self.state.on_success(generation, chunk.new_cursor.clone()) {
            return PollOutcome::Superseded;
          }
          let added = self.buffer.merge(chunk.entries);
          debug!(added, cursor = %chunk.new_cursor, "log poll merged");
          return PollOutcome::Polled { added };
        }
        Err(err) => match self.state.on_failure(generation, &err) {
          FailureDecision::RetryAfter { delay, attempt } => {
            warn!(
              attempt,
              delay_ms = delay.as_millis() as u64,
              "log stream timed out; retrying the same cursor"
            );
            tokio::time::sleep(delay).await;
            self.state.mark_retry_attempt(self.clock.now());
            continue;
          }
          FailureDecision::Halted | FailureDecision::Disabled => {
            warn!(error = %err, status = %self.state.status(), "log poll failed");
            return PollOutcome::Failed;
          }
          FailureDecision::Stale => return PollOutcome::Superseded,
        },
      }
    }
  }

  /// Explicit "retry connection" action: clears the failure counters and
  /// re-enables automatic polling.
  pub fn reset_connection(&mut self) {
    self.state.reset();
    info!("log stream re-enabled by user");
  }

  /// Retained entries, newest first.
  pub fn entries(&self) -> &[LogEntry] {
    self.buffer.entries()
  }

  /// Entries matching a display filter, newest first.
  pub fn filtered_entries<'a>(&'a self, filter: &'a LogFilter) -> Vec<&'a LogEntry> {
    self.buffer.filtered(filter).collect()
  }

  pub fn buffer(&self) -> &LogBuffer {
    &self.buffer
  }

  pub fn status(&self) -> &TailStatus {
    self.state.status()
  }

  pub fn is_disabled(&self) -> bool {
    self.state.is_disabled()
  }

  pub fn cursor(&self) -> Option<&str> {
    self.state.cursor()
  }
}

impl Drop for LogTailer {
  fn drop(&mut self) {
    if let Some(handle) = self.inflight.take() {
      handle.abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::client::MockSource;
  use crate::clock::ManualClock;
  use shared::error::ScopeError;
  use shared::log::LogLevel;
  use std::time::Duration;

  fn entry(ts: f64, message: &str) -> LogEntry {
    LogEntry {
      timestamp: ts,
      topic: "console".to_string(),
      function: None,
      log_level: LogLevel::Info,
      message: message.to_string(),
      execution_time_ms: None,
      status: None,
      error_message: None,
      raw: serde_json::Value::Null,
    }
  }

  fn tailer(source: Arc<MockSource>, clock: Arc<ManualClock>) -> LogTailer {
    LogTailer::with_clock(source, &TailConfig::default(), clock)
  }

  #[tokio::test]
  async fn polls_merge_and_advance_the_cursor() {
    let source = Arc::new(MockSource::new());
    let clock = Arc::new(ManualClock::new());
    source.push_log_chunk(vec![entry(1.0, "a")], "c1");
    source.push_log_chunk(vec![entry(1.0, "a"), entry(2.0, "b")], "c2");

    let mut tail = tailer(source.clone(), clock.clone());
    assert_eq!(tail.poll().await, PollOutcome::Polled { added: 1 });
    assert_eq!(tail.status(), &TailStatus::Watching);
    assert_eq!(tail.cursor(), Some("c1"));

    clock.advance(Duration::from_millis(1_100));
    assert_eq!(tail.poll().await, PollOutcome::Polled { added: 1 });
    assert_eq!(tail.entries().len(), 2);
    assert_eq!(tail.cursor(), Some("c2"));
    assert_eq!(source.stream_calls(), 2);
  }

  #[tokio::test]
  async fn early_polls_are_throttled_without_network() {
    let source = Arc::new(MockSource::new());
    let clock = Arc::new(ManualClock::new());
    let mut tail = tailer(source.clone(), clock);

    tail.poll().await;
    assert_eq!(tail.poll().await, PollOutcome::Throttled);
    assert_eq!(source.stream_calls(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn timeouts_retry_the_same_cursor_then_recover() {
    let source = Arc::new(MockSource::new());
    let clock = Arc::new(ManualClock::new());
    source.fail_next_stream(ScopeError::GatewayTimeout);
    source.push_log_chunk(vec![entry(1.0, "late")], "c1");

    let mut tail = tailer(source.clone(), clock);
    assert_eq!(tail.poll().await, PollOutcome::Polled { added: 1 });
    assert_eq!(source.stream_calls(), 2);
    assert_eq!(tail.status(), &TailStatus::Watching);
  }

  #[tokio::test(start_paused = true)]
  async fn repeated_failures_trip_the_breaker_until_reset() {
    let source = Arc::new(MockSource::new());
    let clock = Arc::new(ManualClock::new());
    let mut tail = tailer(source.clone(), clock.clone());

    for _ in 0..5 {
      source.fail_next_stream(ScopeError::HttpStatus {
        status: 500,
        message: "boom".to_string(),
      });
      tail.poll().await;
      clock.advance(Duration::from_millis(1_100));
    }
    assert!(tail.is_disabled());
    assert_eq!(tail.status(), &TailStatus::Disabled);

    // Disabled: no network traffic on further polls.
    let before = source.stream_calls();
    assert_eq!(tail.poll().await, PollOutcome::Disabled);
    assert_eq!(source.stream_calls(), before);

    source.push_log_chunk(vec![entry(1.0, "back")], "c1");
    tail.reset_connection();
    assert_eq!(tail.poll().await, PollOutcome::Polled { added: 1 });
  }

  #[tokio::test]
  async fn permanent_failure_disables_without_retry() {
    let source = Arc::new(MockSource::new());
    let clock = Arc::new(ManualClock::new());
    source.fail_next_stream(ScopeError::MissingCredentials);

    let mut tail = tailer(source.clone(), clock);
    assert_eq!(tail.poll().await, PollOutcome::Failed);
    assert!(tail.is_disabled());
    assert_eq!(source.stream_calls(), 1);
  }
}
