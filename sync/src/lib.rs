//! # Kiln Sync
//!
//! The incremental data-synchronization engine behind the Scope inspector
//! panel: a retrying log tailer, a cursor-paginated table browser with
//! optimistic mutations, request deduplication, a filter-expression model
//! compiled to the deployment's wire query, and scoped persistence.
//!
//! ## Quick Start
//!
//! ```ignore
//! use kiln_sync::{HttpSource, LogTailer, StorageBridge};
//!
//! let source = Arc::new(HttpSource::new(&cfg.deployment)?);
//! let mut tail = LogTailer::new(source.clone(), &cfg.tail);
//! loop {
//!   tail.poll().await;
//!   for entry in tail.entries() {
//!     println!("[{}] {}", entry.log_level, entry.message);
//!   }
//! }
//! ```

// ─── Leaf utilities ──────────────────────────────────────────────────────────
pub mod clock;
pub mod dedup;
pub mod filter;

// ─── Data sources ────────────────────────────────────────────────────────────
pub mod client;

// ─── Controllers ─────────────────────────────────────────────────────────────
pub mod mutate;
pub mod page;
pub mod store;
pub mod tail;

// ─── Re-exports ──────────────────────────────────────────────────────────────

pub use clock::{Clock, ManualClock, SystemClock};
pub use client::{DataSource, DeleteTarget, DocumentPage, HttpSource, LogChunk, MockSource, PageRequest};
pub use dedup::{FetchGuard, FetchKey};
pub use filter::{compile, parse, FilterClause, FilterExpression, FilterOp};
pub use mutate::{FieldKind, OptimisticMutator};
pub use page::{
  Debouncer, LoadOutcome, MutationOutcome, PaginatedCollection, SortDirection, SortSpec,
};
pub use store::{FileBackend, MemoryBackend, StorageBackend, StorageBridge};
pub use tail::{LogBuffer, LogFilter, LogTailer, PollOutcome, TailState, TailStatus};
