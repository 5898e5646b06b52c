use async_trait::async_trait;
use serde_json::{Map, Value};

use shared::error::Result;
use shared::table::ShapeMap;

use super::types::{DeleteTarget, DocumentPage, LogChunk, PageRequest};

/// The deployment endpoints the engine consumes, behind one interface.
///
/// The real transport is [`super::HttpSource`]; [`super::MockSource`] is an
/// in-memory implementation for tests and demos. Swapping the
/// implementation is how mock data stays out of the sync logic itself.
#[async_trait]
pub trait DataSource: Send + Sync {
  /// Poll the log stream. `None` starts from the beginning; the returned
  /// cursor feeds the next poll.
  async fn stream_logs(&self, cursor: Option<String>) -> Result<LogChunk>;

  /// Fetch the table-name → shape map. Callers exclude `Never` tables.
  async fn table_shapes(&self) -> Result<ShapeMap>;

  /// Fetch one page of documents.
  async fn document_page(&self, req: PageRequest) -> Result<DocumentPage>;

  /// Patch `fields` into the given documents. All-or-nothing per call.
  async fn patch_documents(
    &self,
    table: &str,
    ids: &[String],
    fields: &Map<String, Value>,
  ) -> Result<()>;

  /// Delete the given documents. All-or-nothing per call.
  async fn delete_documents(&self, targets: &[DeleteTarget]) -> Result<()>;
}
