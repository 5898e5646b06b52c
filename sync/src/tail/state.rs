use std::time::{Duration, Instant};
use tracing::{info, warn};

use shared::config::TailConfig;
use shared::error::ScopeError;

/// Maximum delayed retries of a single timed-out request.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;
/// Fixed delay between timeout retries. Not exponential.
pub const RETRY_DELAY: Duration = Duration::from_millis(2_000);
/// Consecutive failures before polling is disabled until an explicit reset.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 5;
/// Client-side poll throttle, independent of the retry logic.
pub const MIN_FETCH_INTERVAL: Duration = Duration::from_millis(1_000);

/// Tuning knobs of the tail state machine.
#[derive(Debug, Clone)]
pub struct TailParams {
  pub retry_delay: Duration,
  pub max_retry_attempts: u32,
  pub max_consecutive_errors: u32,
  pub min_fetch_interval: Duration,
}

impl Default for TailParams {
  fn default() -> Self {
    Self {
      retry_delay: RETRY_DELAY,
      max_retry_attempts: MAX_RETRY_ATTEMPTS,
      max_consecutive_errors: MAX_CONSECUTIVE_ERRORS,
      min_fetch_interval: MIN_FETCH_INTERVAL,
    }
  }
}

impl From<&TailConfig> for TailParams {
  fn from(cfg: &TailConfig) -> Self {
    Self {
      retry_delay: Duration::from_millis(cfg.retry_delay_ms),
      max_retry_attempts: cfg.max_retry_attempts,
      max_consecutive_errors: cfg.max_consecutive_errors,
      min_fetch_interval: Duration::from_millis(cfg.min_fetch_interval_ms),
    }
  }
}

/// User-visible connection state, rendered as the status line. `Waiting`
/// (no data yet) and `Error` (broken connection) are deliberately
/// distinct.
#[derive(Debug, Clone, PartialEq)]
pub enum TailStatus {
  Waiting,
  Watching,
  Retrying { attempt: u32, delay: Duration },
  Error(String),
  Disabled,
}

impl std::fmt::Display for TailStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TailStatus::Waiting => write!(f, "waiting for logs..."),
      TailStatus::Watching => write!(f, "watching logs"),
      TailStatus::Retrying { attempt, delay } => {
        write!(f, "retrying in {}s (attempt {})", delay.as_secs(), attempt)
      }
      TailStatus::Error(msg) => write!(f, "error: {msg}"),
      TailStatus::Disabled => write!(f, "paused after repeated failures — retry connection to resume"),
    }
  }
}

/// Failure bookkeeping. Resets to zero on any success; increments on
/// failure; once `consecutive_errors` crosses the threshold the stream is
/// permanently disabled until an explicit reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
  pub consecutive_errors: u32,
  pub attempt: u32,
  pub permanently_disabled: bool,
}

/// What the driver should do with a poll request.
#[derive(Debug, Clone, PartialEq)]
pub enum PollDecision {
  Fetch {
    generation: u64,
    cursor: Option<String>,
  },
  /// Arrived before the minimum fetch interval elapsed; dropped, not
  /// queued.
  Throttled,
  Disabled,
}

/// What the driver should do after a failed fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureDecision {
  /// Timeout-class failure with retry budget left: re-issue the same
  /// cursor after `delay`.
  RetryAfter { delay: Duration, attempt: u32 },
  /// Recorded; wait for the next scheduled poll.
  Halted,
  /// The circuit tripped (or the failure is permanent); no automatic
  /// polls until reset.
  Disabled,
  /// The response belongs to a superseded request; ignore it.
  Stale,
}

/// Poll state machine for the live log stream.
///
/// Pure transitions over injected `now` values — the async driver owns
/// the actual fetches, sleeps, and cancellation. Every in-flight request
/// carries the generation it was issued under; responses from older
/// generations are discarded (last request wins).
#[derive(Debug)]
pub struct TailState {
  params: TailParams,
  cursor: Option<String>,
  retry: RetryState,
  status: TailStatus,
  last_attempt: Option<Instant>,
  generation: u64,
}

impl TailState {
  pub fn new(params: TailParams) -> Self {
    Self {
      params,
      cursor: None,
      retry: RetryState::default(),
      status: TailStatus::Waiting,
      last_attempt: None,
      generation: 0,
    }
  }

  /// A poll was requested.
  pub fn on_poll(&mut self, now: Instant) -> PollDecision {
    if self.retry.permanently_disabled {
      return PollDecision::Disabled;
    }
    if let Some(last) = self.last_attempt {
      if now.duration_since(last) < self.params.min_fetch_interval {
        return PollDecision::Throttled;
      }
    }
    self.last_attempt = Some(now);
    self.generation += 1;
    PollDecision::Fetch {
      generation: self.generation,
      cursor: self.cursor.clone(),
    }
  }

  /// A fetch issued under `generation` succeeded. Returns `false` when
  /// the response is stale and must not be applied.
  pub fn on_success(&mut self, generation: u64, new_cursor: String) -> bool {
    if generation != self.generation {
      return false;
    }
    self.cursor = Some(new_cursor);
    self.retry = RetryState::default();
    self.status = TailStatus::Watching;
    true
  }

  /// A fetch issued under `generation` failed.
  pub fn on_failure(&mut self, generation: u64, err: &ScopeError) -> FailureDecision {
    if generation != self.generation {
      return FailureDecision::Stale;
    }

    if err.is_permanent() {
      self.retry.permanently_disabled = true;
      self.status = TailStatus::Error(err.to_string());
      warn!(error = %err, "log stream hit a permanent failure; polling disabled");
      return FailureDecision::Disabled;
    }

    if err.is_timeout() && self.retry.attempt < self.params.max_retry_attempts {
      self.retry.attempt += 1;
      let delay = self.params.retry_delay;
      self.status = TailStatus::Retrying {
        attempt: self.retry.attempt,
        delay,
      };
      return FailureDecision::RetryAfter {
        delay,
        attempt: self.retry.attempt,
      };
    }

    // Timeout budget exhausted or an ordinary failure: count it.
    self.retry.attempt = 0;
    self.retry.consecutive_errors += 1;
    if self.retry.consecutive_errors >= self.params.max_consecutive_errors {
      self.retry.permanently_disabled = true;
      self.status = TailStatus::Disabled;
      warn!(
        failures = self.retry.consecutive_errors,
        "log stream disabled after repeated failures"
      );
      FailureDecision::Disabled
    } else {
      self.status = TailStatus::Error(err.to_string());
      FailureDecision::Halted
    }
  }

  /// A delayed retry attempt is going out now; feeds the throttle window.
  pub fn mark_retry_attempt(&mut self, now: Instant) {
    self.last_attempt = Some(now);
  }

  /// Explicit user-initiated reset: clears the failure counters and
  /// re-enables polling immediately.
  pub fn reset(&mut self) {
    self.retry = RetryState::default();
    self.status = TailStatus::Waiting;
    self.last_attempt = None;
    info!("log stream connection reset");
  }

  /// Invalidate any in-flight request (its response becomes stale).
  pub fn supersede(&mut self) {
    self.generation += 1;
  }

  pub fn is_current(&self, generation: u64) -> bool {
    generation == self.generation
  }

  pub fn is_disabled(&self) -> bool {
    self.retry.permanently_disabled
  }

  pub fn status(&self) -> &TailStatus {
    &self.status
  }

  pub fn cursor(&self) -> Option<&str> {
    self.cursor.as_deref()
  }

  pub fn retry_state(&self) -> &RetryState {
    &self.retry
  }
}
