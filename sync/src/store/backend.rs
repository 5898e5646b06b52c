use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use shared::error::{Result, ScopeError};

/// Trait for the durable side of the key-value store.
///
/// Values are opaque serialized strings at this level; the bridge owns
/// (de)serialization and caching. Implement this to back persistence with
/// whatever the host embeds — the engine ships a file store and an
/// in-memory store.
#[async_trait]
pub trait StorageBackend: Send + Sync {
  /// Read a key. Returns `None` when the key has never been written.
  async fn read(&self, key: &str) -> Result<Option<String>>;

  /// Upsert a key.
  async fn write(&self, key: &str, value: &str) -> Result<()>;

  /// Remove a key. Removing an absent key is not an error.
  async fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as a small JSON file in a directory.
///
/// Simple and dependency-free — suitable for development and
/// single-instance embedding.
pub struct FileBackend {
  dir: PathBuf,
}

impl FileBackend {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn path_for(&self, key: &str) -> PathBuf {
    // Keys carry a scope prefix with separator characters; flatten them
    // into safe file names.
    let safe: String = key
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
      .collect();
    self.dir.join(format!("{safe}.json"))
  }
}

#[async_trait]
impl StorageBackend for FileBackend {
  async fn read(&self, key: &str) -> Result<Option<String>> {
    let path = self.path_for(key);
    match tokio::fs::read_to_string(&path).await {
      Ok(raw) => Ok(Some(raw)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(ScopeError::Storage(Box::new(e))),
    }
  }

  async fn write(&self, key: &str, value: &str) -> Result<()> {
    let path = self.path_for(key);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| ScopeError::Storage(Box::new(e)))?;
    }
    tokio::fs::write(&path, value)
      .await
      .map_err(|e| ScopeError::Storage(Box::new(e)))?;
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    let path = self.path_for(key);
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(ScopeError::Storage(Box::new(e))),
    }
  }
}

/// Volatile backend for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryBackend {
  map: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
  async fn read(&self, key: &str) -> Result<Option<String>> {
    Ok(self.map.lock().unwrap().get(key).cloned())
  }

  async fn write(&self, key: &str, value: &str) -> Result<()> {
    self
      .map
      .lock()
      .unwrap()
      .insert(key.to_string(), value.to_string());
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<()> {
    self.map.lock().unwrap().remove(key);
    Ok(())
  }
}
