//! Scoped key-value persistence with a read-through cache.

pub mod backend;
pub mod bridge;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use bridge::{
  StorageBridge, KEY_ACTIVE_TAB, KEY_ACTIVE_TABLE, KEY_FILTERS, KEY_PANEL_RECT, KEY_SETTINGS,
};
