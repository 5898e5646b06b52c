use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Coalesces a burst of rapid edits into the last one.
///
/// Each call takes a ticket and waits out the window; only the call whose
/// ticket is still newest when the window closes yields its value. Earlier
/// callers get `None` and do nothing. Cloning shares the ticket counter,
/// so concurrent tasks coalesce against each other.
#[derive(Clone)]
pub struct Debouncer {
  seq: Arc<AtomicU64>,
  delay: Duration,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self {
      seq: Arc::new(AtomicU64::new(0)),
      delay,
    }
  }

  /// Wait out the debounce window; returns the value only if no newer
  /// call arrived meanwhile.
  pub async fn settle<T>(&self, value: T) -> Option<T> {
    let ticket = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }
    if self.seq.load(Ordering::SeqCst) == ticket {
      Some(value)
    } else {
      None
    }
  }

  /// Invalidate any call currently waiting out its window.
  pub fn cancel_pending(&self) {
    self.seq.fetch_add(1, Ordering::SeqCst);
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn only_the_newest_call_settles() {
    let debounce = Debouncer::new(Duration::from_millis(150));
    let older = debounce.clone();
    let first = tokio::spawn(async move { older.settle("first").await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = debounce.settle("second").await;

    assert_eq!(second, Some("second"));
    assert_eq!(first.await.unwrap(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn lone_call_settles_after_the_window() {
    let debounce = Debouncer::new(Duration::from_millis(150));
    assert_eq!(debounce.settle(42).await, Some(42));
  }

  #[tokio::test(start_paused = true)]
  async fn cancel_pending_discards_the_waiter() {
    let debounce = Debouncer::new(Duration::from_millis(150));
    let waiter = debounce.clone();
    let pending = tokio::spawn(async move { waiter.settle("stale").await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    debounce.cancel_pending();
    assert_eq!(pending.await.unwrap(), None);
  }
}
