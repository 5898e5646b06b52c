use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

use shared::error::Result;

use crate::filter::FilterExpression;

use super::backend::StorageBackend;

/// Key under which the user last-selected table is stored.
pub const KEY_ACTIVE_TABLE: &str = "active_table";
/// Key under which the per-table filter expressions are stored, as a
/// nested `table → expression` map.
pub const KEY_FILTERS: &str = "filters";
/// Key under which the active panel tab is stored.
pub const KEY_ACTIVE_TAB: &str = "active_tab";
/// Key under which the user settings object is stored.
pub const KEY_SETTINGS: &str = "settings";
/// Key under which the panel container position/size is stored.
pub const KEY_PANEL_RECT: &str = "panel_rect";

/// Scoped persistence with an in-process read-through cache.
///
/// Every key is prefixed with the configured scope, isolating one
/// deployment's state from others sharing the backend. Reads hit the
/// cache first so repeated lookups don't re-deserialize; corrupt or
/// unreadable entries fall back to the caller's default instead of
/// failing the caller.
pub struct StorageBridge {
  backend: Arc<dyn StorageBackend>,
  scope: String,
  cache: DashMap<String, Value>,
}

impl StorageBridge {
  pub fn new(backend: Arc<dyn StorageBackend>, scope: impl Into<String>) -> Self {
    Self {
      backend,
      scope: scope.into(),
      cache: DashMap::new(),
    }
  }

  fn scoped(&self, key: &str) -> String {
    format!("{}:{}", self.scope, key)
  }

  /// Read a value, falling back to `default` when the key is missing,
  /// unreadable, or does not deserialize. Never fails the caller.
  pub async fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
    let value = match self.cache.get(key) {
      Some(cached) => cached.clone(),
      None => {
        let raw = match self.backend.read(&self.scoped(key)).await {
          Ok(Some(raw)) => raw,
          Ok(None) => return default,
          Err(err) => {
            warn!(key, error = %err, "storage read failed; using default");
            return default;
          }
        };
        match serde_json::from_str::<Value>(&raw) {
          Ok(value) => {
            self.cache.insert(key.to_string(), value.clone());
            value
          }
          Err(err) => {
            warn!(key, error = %err, "corrupt storage entry; using default");
            return default;
          }
        }
      }
    };

    match serde_json::from_value(value) {
      Ok(parsed) => parsed,
      Err(err) => {
        warn!(key, error = %err, "storage entry has unexpected shape; using default");
        default
      }
    }
  }

  /// Write a value through the cache to the backend.
  pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).map_err(|e| {
      shared::error::ScopeError::Storage(Box::new(e))
    })?;
    let raw = value.to_string();
    self.cache.insert(key.to_string(), value);
    self.backend.write(&self.scoped(key), &raw).await
  }

  /// Remove a key from the cache and the backend.
  pub async fn remove(&self, key: &str) -> Result<()> {
    self.cache.remove(key);
    self.backend.remove(&self.scoped(key)).await
  }

  /// The stored filter expression for a table; empty when none was saved.
  pub async fn table_filters(&self, table: &str) -> FilterExpression {
    let all: Map<String, Value> = self.get(KEY_FILTERS, Map::new()).await;
    match all.get(table) {
      Some(raw) => match serde_json::from_value(raw.clone()) {
        Ok(expr) => expr,
        Err(err) => {
          warn!(table, error = %err, "stored filters are corrupt; treating as empty");
          FilterExpression::default()
        }
      },
      None => FilterExpression::default(),
    }
  }

  /// Persist a table's filter expression. Saving an empty expression
  /// deletes the table's entry entirely — and the whole key once the last
  /// entry goes — so storage stays compact and a cleared filter leaves no
  /// stale "filtered" marker behind.
  pub async fn save_table_filters(&self, table: &str, expr: &FilterExpression) -> Result<()> {
    let mut all: Map<String, Value> = self.get(KEY_FILTERS, Map::new()).await;

    if expr.is_empty() {
      all.remove(table);
    } else {
      all.insert(
        table.to_string(),
        serde_json::to_value(expr).map_err(|e| shared::error::ScopeError::Storage(Box::new(e)))?,
      );
    }

    if all.is_empty() {
      self.remove(KEY_FILTERS).await
    } else {
      self.set(KEY_FILTERS, &all).await
    }
  }
}
