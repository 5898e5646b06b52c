//! Injectable time source.
//!
//! The dedup cache and the tailer both make TTL/throttle decisions; routing
//! those through a `Clock` keeps expiry testable without sleeping.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock: Send + Sync {
  fn now(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// A clock that only moves when told to. Test use only.
pub struct ManualClock {
  now: Mutex<Instant>,
}

impl ManualClock {
  pub fn new() -> Self {
    Self {
      now: Mutex::new(Instant::now()),
    }
  }

  /// Advance the clock by `delta`.
  pub fn advance(&self, delta: Duration) {
    let mut now = self.now.lock().unwrap();
    *now += delta;
  }
}

impl Default for ManualClock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Instant {
    *self.now.lock().unwrap()
  }
}
