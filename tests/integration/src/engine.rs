#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map};

use kiln_sync::{
  FilterClause, FilterExpression, FilterOp, LoadOutcome, LogTailer, ManualClock, MockSource,
  MutationOutcome, PaginatedCollection, PollOutcome, StorageBridge, TailStatus,
};
use kiln_sync::{MemoryBackend, SortSpec};
use shared::config::{PageConfig, TailConfig};
use shared::error::ScopeError;
use shared::log::{LogEntry, LogLevel};
use shared::table::Document;

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

fn doc(id: &str, name: &str, logins: i64) -> Document {
  let mut d = Document::new(id, logins as f64);
  d.fields.insert("name".to_string(), json!(name));
  d.fields.insert("logins".to_string(), json!(logins));
  d
}

fn page_cfg() -> PageConfig {
  PageConfig {
    page_size: 2,
    dedup_ttl_ms: 2_000,
    debounce_ms: 0,
  }
}

#[tokio::test]
async fn tailer_survives_failures_and_keeps_a_deduped_window() {
  let source = Arc::new(MockSource::new());
  let clock = Arc::new(ManualClock::new());
  let mut tail = LogTailer::with_clock(source.clone(), &TailConfig::default(), clock.clone());

  source.push_log_chunk(vec![entry(1.0, "boot"), entry(2.0, "ready")], "c1");
  assert_eq!(tail.poll().await, PollOutcome::Polled { added: 2 });
  assert_eq!(tail.status(), &TailStatus::Watching);

  // One transient failure, then a redelivered window overlapping the
  // first: the overlap merges without duplicates.
  source.fail_next_stream(ScopeError::HttpStatus {
    status: 502,
    message: "bad gateway".to_string(),
  });
  clock.advance(Duration::from_millis(1_100));
  assert_eq!(tail.poll().await, PollOutcome::Failed);
  assert!(matches!(tail.status(), TailStatus::Error(_)));

  source.push_log_chunk(vec![entry(2.0, "ready"), entry(3.0, "request in")], "c2");
  clock.advance(Duration::from_millis(1_100));
  assert_eq!(tail.poll().await, PollOutcome::Polled { added: 1 });

  let messages: Vec<_> = tail.entries().iter().map(|e| e.message.as_str()).collect();
  assert_eq!(messages, vec!["request in", "ready", "boot"]);
  assert_eq!(tail.cursor(), Some("c2"));
}

#[tokio::test]
async fn browsing_session_round_trips_filters_through_storage() {
  let source = Arc::new(MockSource::new());
  source.insert_table(
    "users",
    vec![doc("u1", "Ada", 3), doc("u2", "Grace", 1), doc("u3", "Edsger", 2)],
  );
  let storage = Arc::new(StorageBridge::new(Arc::new(MemoryBackend::new()), "it"));
  let clock = Arc::new(ManualClock::new());

  // First visit: browse everything, then filter.
  {
    let mut col = PaginatedCollection::with_clock(
      source.clone(),
      storage.clone(),
      &page_cfg(),
      None,
      clock.clone(),
    );
    assert_eq!(col.select_table("users").await, LoadOutcome::Loaded { count: 2 });
    clock.advance(Duration::from_secs(3));
    col.load_more().await;
    assert_eq!(col.documents().len(), 3);

    clock.advance(Duration::from_secs(3));
    let expr = FilterExpression::new(vec![FilterClause::new("name", FilterOp::Eq, json!("Ada"))]);
    assert!(matches!(col.set_filters(expr).await, LoadOutcome::Loaded { .. }));
  }

  // A fresh controller over the same storage: selecting the table
  // restores the persisted filter expression.
  {
    let mut col = PaginatedCollection::with_clock(
      source.clone(),
      storage.clone(),
      &page_cfg(),
      None,
      Arc::new(ManualClock::new()),
    );
    col.select_table("users").await;
    assert_eq!(col.filters().clauses.len(), 1);
    assert_eq!(col.filters().clauses[0].field, "name");
  }
}

#[tokio::test]
async fn optimistic_patch_confirmed_delete_and_sorting() {
  let source = Arc::new(MockSource::new());
  source.insert_table(
    "users",
    vec![doc("u1", "Ada", 3), doc("u2", "Grace", 1), doc("u3", "Edsger", 2)],
  );
  let storage = Arc::new(StorageBridge::new(Arc::new(MemoryBackend::new()), "it"));
  let clock = Arc::new(ManualClock::new());
  let cfg = PageConfig {
    page_size: 10,
    ..page_cfg()
  };
  let mut col =
    PaginatedCollection::with_clock(source.clone(), storage, &cfg, None, clock.clone());
  col.select_table("users").await;

  // Sort ascending by logins: u2(1), u3(2), u1(3).
  clock.advance(Duration::from_secs(3));
  col.cycle_sort("logins").await;
  assert_eq!(col.sort(), Some(&SortSpec::asc("logins")));
  let ids: Vec<_> = col.documents().iter().map(|d| d.id.as_str()).collect();
  assert_eq!(ids, vec!["u2", "u3", "u1"]);

  // Free-text edit coerced against the existing number field, applied
  // optimistically, confirmed by the mock deployment.
  let coerced = col.coerce_text("u2", "logins", "10");
  assert_eq!(coerced, json!(10.0));
  let mut fields = Map::new();
  fields.insert("logins".to_string(), coerced);
  assert_eq!(
    col.patch(&["u2".to_string()], fields).await,
    MutationOutcome::Applied
  );
  assert_eq!(
    source.table_documents("users")[1].get("logins"),
    Some(json!(10.0))
  );

  // Delete is never optimistic; on success the document leaves the list.
  assert_eq!(
    col.delete(&["u3".to_string()]).await,
    MutationOutcome::Applied
  );
  assert!(col.documents().iter().all(|d| d.id != "u3"));
  assert_eq!(source.table_documents("users").len(), 2);
}
