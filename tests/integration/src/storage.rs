#![cfg(test)]
use std::sync::Arc;

use serde_json::json;

use kiln_sync::store::{KEY_ACTIVE_TAB, KEY_PANEL_RECT, KEY_SETTINGS};
use kiln_sync::{FileBackend, FilterClause, FilterExpression, FilterOp, StorageBridge};
use shared::settings::{PanelRect, Tab, UserSettings};

#[tokio::test]
async fn settings_and_layout_survive_a_restart() {
  let dir = tempfile::tempdir().unwrap();

  {
    let bridge = StorageBridge::new(Arc::new(FileBackend::new(dir.path())), "dev");
    let mut settings = UserSettings::default();
    settings.poll_interval_ms = 250;
    bridge.set(KEY_SETTINGS, &settings).await.unwrap();
    bridge.set(KEY_ACTIVE_TAB, &Tab::Data).await.unwrap();
    bridge
      .set(
        KEY_PANEL_RECT,
        &PanelRect {
          x: 10.0,
          y: 20.0,
          width: 800.0,
          height: 600.0,
        },
      )
      .await
      .unwrap();
  }

  // A fresh bridge over the same directory reads everything back.
  let bridge = StorageBridge::new(Arc::new(FileBackend::new(dir.path())), "dev");
  let settings: UserSettings = bridge.get(KEY_SETTINGS, UserSettings::default()).await;
  assert_eq!(settings.poll_interval_ms, 250);
  assert_eq!(bridge.get(KEY_ACTIVE_TAB, Tab::default()).await, Tab::Data);
  let rect: PanelRect = bridge.get(KEY_PANEL_RECT, PanelRect::default()).await;
  assert_eq!(rect.width, 800.0);
}

#[tokio::test]
async fn scopes_do_not_leak_into_each_other() {
  let dir = tempfile::tempdir().unwrap();
  let backend = Arc::new(FileBackend::new(dir.path()));

  let dev = StorageBridge::new(backend.clone(), "dev");
  let prod = StorageBridge::new(backend, "prod");

  dev.set(KEY_ACTIVE_TAB, &Tab::Logs).await.unwrap();
  assert_eq!(prod.get(KEY_ACTIVE_TAB, Tab::Settings).await, Tab::Settings);
}

#[tokio::test]
async fn per_table_filters_round_trip_and_compact_away() {
  let dir = tempfile::tempdir().unwrap();
  let bridge = StorageBridge::new(Arc::new(FileBackend::new(dir.path())), "dev");

  let users = FilterExpression::new(vec![FilterClause::new("name", FilterOp::Eq, json!("Ada"))]);
  let msgs = FilterExpression::new(vec![FilterClause::new("read", FilterOp::Eq, json!(false))]);
  bridge.save_table_filters("users", &users).await.unwrap();
  bridge.save_table_filters("messages", &msgs).await.unwrap();

  assert_eq!(bridge.table_filters("users").await, users);
  assert_eq!(bridge.table_filters("messages").await, msgs);

  // Clearing one table's filters deletes only its entry...
  bridge
    .save_table_filters("users", &FilterExpression::default())
    .await
    .unwrap();
  assert!(bridge.table_filters("users").await.is_empty());
  assert_eq!(bridge.table_filters("messages").await, msgs);

  // ...and clearing the last one removes the stored map entirely.
  bridge
    .save_table_filters("messages", &FilterExpression::default())
    .await
    .unwrap();
  assert!(bridge.table_filters("messages").await.is_empty());
}

#[tokio::test]
async fn corrupt_files_fall_back_to_defaults() {
  let dir = tempfile::tempdir().unwrap();
  tokio::fs::write(dir.path().join("dev_settings.json"), b"{{{ not json")
    .await
    .unwrap();

  let bridge = StorageBridge::new(Arc::new(FileBackend::new(dir.path())), "dev");
  let settings: UserSettings = bridge.get(KEY_SETTINGS, UserSettings::default()).await;
  assert_eq!(settings, UserSettings::default());
}
