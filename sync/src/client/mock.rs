use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use shared::error::{Result, ScopeError};
use shared::log::LogEntry;
use shared::table::{Document, Shape, ShapeMap};

use super::source::DataSource;
use super::types::{DeleteTarget, DocumentPage, LogChunk, PageRequest};

/// In-memory data source for tests and demos.
///
/// Holds scripted log chunks, per-table document sets paged with numeric
/// cursors, and queues of injectable failures. Call counters expose how
/// many requests actually went out, which is what the dedup tests assert
/// on.
pub struct MockSource {
  inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
  log_chunks: VecDeque<LogChunk>,
  log_failures: VecDeque<ScopeError>,
  shapes: ShapeMap,
  tables: HashMap<String, Vec<Document>>,
  page_failures: VecDeque<ScopeError>,
  patch_failures: VecDeque<ScopeError>,
  delete_failures: VecDeque<ScopeError>,
  stream_calls: usize,
  page_calls: usize,
  patch_calls: usize,
  delete_calls: usize,
}

impl MockSource {
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(Inner::default()),
    }
  }

  /// Queue a log chunk to be returned by the next stream poll.
  pub fn push_log_chunk(&self, entries: Vec<LogEntry>, new_cursor: &str) {
    let mut inner = self.inner.lock().unwrap();
    inner.log_chunks.push_back(LogChunk {
      entries,
      new_cursor: new_cursor.to_string(),
    });
  }

  /// Queue a failure for the next stream poll; failures are consumed
  /// before scripted chunks.
  pub fn fail_next_stream(&self, err: ScopeError) {
    self.inner.lock().unwrap().log_failures.push_back(err);
  }

  pub fn fail_next_page(&self, err: ScopeError) {
    self.inner.lock().unwrap().page_failures.push_back(err);
  }

  pub fn fail_next_patch(&self, err: ScopeError) {
    self.inner.lock().unwrap().patch_failures.push_back(err);
  }

  pub fn fail_next_delete(&self, err: ScopeError) {
    self.inner.lock().unwrap().delete_failures.push_back(err);
  }

  /// Install a table with its documents; its shape is derived as a plain
  /// object (or `Never` when empty, matching how the deployment reports
  /// tables that never held a document).
  pub fn insert_table(&self, name: &str, docs: Vec<Document>) {
    let mut inner = self.inner.lock().unwrap();
    let shape = if docs.is_empty() {
      Shape::Never
    } else {
      Shape::Object { fields: vec![] }
    };
    inner.shapes.insert(name.to_string(), shape);
    inner.tables.insert(name.to_string(), docs);
  }

  /// A snapshot of a table's documents as the "server" currently holds
  /// them.
  pub fn table_documents(&self, name: &str) -> Vec<Document> {
    self
      .inner
      .lock()
      .unwrap()
      .tables
      .get(name)
      .cloned()
      .unwrap_or_default()
  }

  pub fn stream_calls(&self) -> usize {
    self.inner.lock().unwrap().stream_calls
  }

  pub fn page_calls(&self) -> usize {
    self.inner.lock().unwrap().page_calls
  }

  pub fn patch_calls(&self) -> usize {
    self.inner.lock().unwrap().patch_calls
  }

  pub fn delete_calls(&self) -> usize {
    self.inner.lock().unwrap().delete_calls
  }
}

impl Default for MockSource {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl DataSource for MockSource {
  async fn stream_logs(&self, cursor: Option<String>) -> Result<LogChunk> {
    let mut inner = self.inner.lock().unwrap();
    inner.stream_calls += 1;
    if let Some(err) = inner.log_failures.pop_front() {
      return Err(err);
    }
    match inner.log_chunks.pop_front() {
      Some(chunk) => Ok(chunk),
      None => Ok(LogChunk {
        entries: Vec::new(),
        new_cursor: cursor.unwrap_or_else(|| "0".to_string()),
      }),
    }
  }

  async fn table_shapes(&self) -> Result<ShapeMap> {
    Ok(self.inner.lock().unwrap().shapes.clone())
  }

  async fn document_page(&self, req: PageRequest) -> Result<DocumentPage> {
    let mut inner = self.inner.lock().unwrap();
    inner.page_calls += 1;
    if let Some(err) = inner.page_failures.pop_front() {
      return Err(err);
    }

    let docs = inner.tables.get(&req.table).cloned().unwrap_or_default();
    let offset = match &req.cursor {
      None => 0,
      Some(c) => c
        .parse::<usize>()
        .map_err(|_| ScopeError::InvalidPage(format!("bad cursor '{c}'")))?,
    };
    let end = (offset + req.num_items).min(docs.len());
    let page = docs[offset.min(docs.len())..end].to_vec();

    Ok(DocumentPage {
      page,
      continue_cursor: end.to_string(),
      is_done: end >= docs.len(),
    })
  }

  async fn patch_documents(
    &self,
    table: &str,
    ids: &[String],
    fields: &Map<String, Value>,
  ) -> Result<()> {
    let mut inner = self.inner.lock().unwrap();
    inner.patch_calls += 1;
    if let Some(err) = inner.patch_failures.pop_front() {
      return Err(err);
    }
    if let Some(docs) = inner.tables.get_mut(table) {
      for doc in docs.iter_mut() {
        if ids.contains(&doc.id) {
          doc.merge_fields(fields);
        }
      }
    }
    Ok(())
  }

  async fn delete_documents(&self, targets: &[DeleteTarget]) -> Result<()> {
    let mut inner = self.inner.lock().unwrap();
    inner.delete_calls += 1;
    if let Some(err) = inner.delete_failures.pop_front() {
      return Err(err);
    }
    for target in targets {
      if let Some(docs) = inner.tables.get_mut(&target.table_name) {
        docs.retain(|d| d.id != target.id);
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(id: &str) -> Document {
    Document::new(id, 1.0)
  }

  #[tokio::test]
  async fn pages_with_numeric_cursors() {
    let source = MockSource::new();
    source.insert_table("users", (0..5).map(|i| doc(&format!("d{i}"))).collect());

    let req = PageRequest {
      table: "users".to_string(),
      cursor: None,
      num_items: 2,
      query_id: 0,
      filters: None,
      component_id: None,
    };
    let first = source.document_page(req.clone()).await.unwrap();
    assert_eq!(first.page.len(), 2);
    assert!(!first.is_done);

    let mut next = req;
    next.cursor = Some(first.continue_cursor);
    let second = source.document_page(next).await.unwrap();
    assert_eq!(second.page[0].id, "d2");
  }

  #[tokio::test]
  async fn scripted_failures_are_consumed_first() {
    let source = MockSource::new();
    source.push_log_chunk(Vec::new(), "1");
    source.fail_next_stream(ScopeError::GatewayTimeout);

    assert!(source.stream_logs(None).await.is_err());
    assert!(source.stream_logs(None).await.is_ok());
    assert_eq!(source.stream_calls(), 2);
  }
}
