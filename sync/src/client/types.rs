use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shared::log::{LogEntry, RawLogEntry};
use shared::table::Document;

/// One window of decoded log entries plus the cursor for the next poll.
#[derive(Debug, Clone)]
pub struct LogChunk {
  pub entries: Vec<LogEntry>,
  pub new_cursor: String,
}

/// Parameters of one document-page fetch.
#[derive(Debug, Clone)]
pub struct PageRequest {
  pub table: String,
  /// `None` starts from the beginning; otherwise the cursor returned with
  /// the previous page.
  pub cursor: Option<String>,
  pub num_items: usize,
  /// Identifies the logical query this page belongs to; bumped whenever
  /// filters/sort/table reset the cursor.
  pub query_id: u64,
  /// Compiled filter blob, absent when unfiltered.
  pub filters: Option<String>,
  pub component_id: Option<String>,
}

/// One page of documents from the paginated endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
  pub page: Vec<Document>,
  pub continue_cursor: String,
  pub is_done: bool,
}

/// One document targeted for deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTarget {
  pub table_name: String,
  pub id: String,
}

// ── Wire bodies ────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawLogPage {
  pub entries: Vec<RawLogEntry>,
  pub new_cursor: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StreamLogsBody {
  pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaginationOpts {
  pub cursor: Option<String>,
  pub num_items: usize,
  pub id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentPageBody {
  pub pagination_opts: PaginationOpts,
  pub table: String,
  pub filters: Option<String>,
  pub component_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatchBody {
  pub table: String,
  pub ids: Vec<String>,
  pub fields: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteBody {
  pub to_delete: Vec<DeleteTarget>,
}
