use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::clock::Clock;

/// Composite identity of a fetch: resource + cursor + serialized filters +
/// serialized sort.
///
/// Filters and sort participate in the key, so a first-page request after a
/// filter or sort change is a different key and always eligible; an
/// identical continuation (non-null cursor) within the TTL is suppressed,
/// which is what defends against double page-loads from overlapping
/// scroll-trigger events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
  pub resource: String,
  pub cursor: Option<String>,
  pub filters: Option<String>,
  pub sort: Option<String>,
}

impl FetchKey {
  pub fn first_page(resource: impl Into<String>) -> Self {
    Self {
      resource: resource.into(),
      cursor: None,
      filters: None,
      sort: None,
    }
  }
}

/// Short-lived memo of recent fetches.
///
/// A guard the caller consults — it never performs network calls itself.
/// TTL and clock are injected so expiry is testable; there is no
/// module-level state and no background task: expired entries are purged
/// opportunistically before each check.
pub struct FetchGuard {
  seen: HashMap<FetchKey, Instant>,
  ttl: Duration,
  clock: Arc<dyn Clock>,
}

impl FetchGuard {
  pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
    Self {
      seen: HashMap::new(),
      ttl,
      clock,
    }
  }

  /// Whether a fetch for `key` should go out. Returns `false` when an
  /// identical key was recorded within the TTL window.
  pub fn should_fetch(&mut self, key: &FetchKey) -> bool {
    self.expire_old();
    let dup = self.seen.contains_key(key);
    if dup {
      trace!(resource = %key.resource, cursor = ?key.cursor, "duplicate fetch suppressed");
    }
    !dup
  }

  /// Timestamp `key` as fetched now.
  pub fn record_fetch(&mut self, key: FetchKey) {
    let now = self.clock.now();
    self.seen.insert(key, now);
  }

  /// Purge entries older than the TTL.
  pub fn expire_old(&mut self) {
    let now = self.clock.now();
    let ttl = self.ttl;
    self
      .seen
      .retain(|_, recorded| now.duration_since(*recorded) < ttl);
  }

  /// Forget every key for `resource`, making it immediately fetchable.
  /// Used when a mutation forces an authoritative re-sync.
  pub fn invalidate_resource(&mut self, resource: &str) {
    self.seen.retain(|key, _| key.resource != resource);
  }

  pub fn len(&self) -> usize {
    self.seen.len()
  }

  pub fn is_empty(&self) -> bool {
    self.seen.is_empty()
  }
}
