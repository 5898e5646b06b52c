use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use shared::config::PageConfig;
use shared::table::Document;

use crate::client::{DataSource, PageRequest};
use crate::clock::{Clock, SystemClock};
use crate::dedup::{FetchGuard, FetchKey};
use crate::filter::{compile, FilterExpression};
use crate::mutate::OptimisticMutator;
use crate::store::{StorageBridge, KEY_ACTIVE_TABLE};

use super::debounce::Debouncer;
use super::sort::{cycle, sort_documents, SortSpec};

/// What a load request amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
  Loaded { count: usize },
  /// Guarded off: no table selected, a fetch already in flight, a
  /// duplicate suppressed, or a debounced edit superseded.
  Skipped,
  /// The fetch failed; see [`PaginatedCollection::last_error`].
  Failed,
}

/// What a mutation amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
  Applied,
  /// The remote mutation failed after the optimistic edit; the resource
  /// was re-fetched so the visible state matches the deployment again.
  Resynced,
  /// The remote call failed and nothing was changed locally (deletes).
  Rejected,
}

/// Cursor-driven incremental loader for one table at a time.
///
/// The single logical controller for its resource: the document list,
/// cursor, filters and sort all live here, and every mutation routes
/// through it. Network calls are the only suspension points; the loading
/// flags double as the re-entrancy guard for continuation fetches.
pub struct PaginatedCollection {
  source: Arc<dyn DataSource>,
  storage: Arc<StorageBridge>,
  mutator: OptimisticMutator,
  guard: FetchGuard,
  debounce: Debouncer,
  page_size: usize,
  component_id: Option<String>,

  table: Option<String>,
  documents: Vec<Document>,
  cursor: Option<String>,
  has_more: bool,
  is_loading: bool,
  is_loading_more: bool,
  filters: FilterExpression,
  sort: Option<SortSpec>,
  /// Tables whose filters were already pulled from storage this session,
  /// with the expression last applied to each.
  session_filters: HashMap<String, FilterExpression>,
  query_id: u64,
  last_error: Option<String>,
}

impl PaginatedCollection {
  pub fn new(
    source: Arc<dyn DataSource>,
    storage: Arc<StorageBridge>,
    cfg: &PageConfig,
    component_id: Option<String>,
  ) -> Self {
    Self::with_clock(source, storage, cfg, component_id, Arc::new(SystemClock))
  }

  pub fn with_clock(
    source: Arc<dyn DataSource>,
    storage: Arc<StorageBridge>,
    cfg: &PageConfig,
    component_id: Option<String>,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self {
      mutator: OptimisticMutator::new(source.clone()),
      source,
      storage,
      guard: FetchGuard::new(Duration::from_millis(cfg.dedup_ttl_ms), clock),
      debounce: Debouncer::new(Duration::from_millis(cfg.debounce_ms)),
      page_size: cfg.page_size,
      component_id,
      table: None,
      documents: Vec::new(),
      cursor: None,
      has_more: false,
      is_loading: false,
      is_loading_more: false,
      filters: FilterExpression::default(),
      sort: None,
      session_filters: HashMap::new(),
      query_id: 0,
      last_error: None,
    }
  }

  /// Switch the browsed table: reset the cursor, clear the list, restore
  /// the table's persisted filters (first visit this session reads them
  /// through storage), and load the first page.
  pub async fn select_table(&mut self, name: &str) -> LoadOutcome {
    if self.table.as_deref() == Some(name) {
      return LoadOutcome::Skipped;
    }
    info!(table = name, "switching table");
    self.table = Some(name.to_string());
    self.documents.clear();
    self.cursor = None;
    self.has_more = false;
    self.sort = None;
    self.query_id += 1;

    self.filters = match self.session_filters.get(name) {
      Some(expr) => expr.clone(),
      None => {
        let expr = self.storage.table_filters(name).await;
        self.session_filters.insert(name.to_string(), expr.clone());
        expr
      }
    };

    if let Err(err) = self.storage.set(KEY_ACTIVE_TABLE, &name).await {
      warn!(error = %err, "failed to persist active table");
    }

    self.load_first_page().await
  }

  /// Fetch the first page, replacing the local document list wholesale.
  pub async fn load_first_page(&mut self) -> LoadOutcome {
    let Some(table) = self.table.clone() else {
      return LoadOutcome::Skipped;
    };
    if self.is_loading {
      return LoadOutcome::Skipped;
    }

    let filters = match self.compiled_filters() {
      Ok(filters) => filters,
      Err(outcome) => return outcome,
    };
    let key = FetchKey {
      resource: table.clone(),
      cursor: None,
      filters: filters.clone(),
      sort: self.sort_key(),
    };
    if !self.guard.should_fetch(&key) {
      return LoadOutcome::Skipped;
    }
    self.guard.record_fetch(key);

    self.is_loading = true;
    self.last_error = None;
    let result = self
      .source
      .document_page(PageRequest {
        table,
        cursor: None,
        num_items: self.page_size,
        query_id: self.query_id,
        filters,
        component_id: self.component_id.clone(),
      })
      .await;
    self.is_loading = false;

    match result {
      Ok(page) => {
        self.documents = page.page;
        self.cursor = Some(page.continue_cursor);
        self.has_more = !page.is_done;
        if let Some(spec) = &self.sort {
          sort_documents(&mut self.documents, spec);
        }
        debug!(count = self.documents.len(), has_more = self.has_more, "first page loaded");
        LoadOutcome::Loaded {
          count: self.documents.len(),
        }
      }
      Err(err) => {
        warn!(error = %err, "first page load failed");
        self.last_error = Some(err.to_string());
        LoadOutcome::Failed
      }
    }
  }

  /// Fetch the next page and append it. Wired to the scroll sentinel.
  ///
  /// The guard condition is the sole defense against duplicate
  /// continuations, so claiming it — flipping `is_loading_more` — happens
  /// synchronously before the first await point; a re-entrant trigger
  /// observes the flag and backs off.
  pub async fn load_more(&mut self) -> LoadOutcome {
    if !(self.has_more && !self.is_loading && !self.is_loading_more) {
      return LoadOutcome::Skipped;
    }
    self.is_loading_more = true;

    let outcome = self.load_more_inner().await;
    self.is_loading_more = false;
    outcome
  }

  async fn load_more_inner(&mut self) -> LoadOutcome {
    let Some(table) = self.table.clone() else {
      return LoadOutcome::Skipped;
    };
    let filters = match self.compiled_filters() {
      Ok(filters) => filters,
      Err(outcome) => return outcome,
    };
    let key = FetchKey {
      resource: table.clone(),
      cursor: self.cursor.clone(),
      filters: filters.clone(),
      sort: self.sort_key(),
    };
    if !self.guard.should_fetch(&key) {
      return LoadOutcome::Skipped;
    }
    self.guard.record_fetch(key);

    let result = self
      .source
      .document_page(PageRequest {
        table,
        cursor: self.cursor.clone(),
        num_items: self.page_size,
        query_id: self.query_id,
        filters,
        component_id: self.component_id.clone(),
      })
      .await;

    match result {
      Ok(page) => {
        let added = page.page.len();
        self.documents.extend(page.page);
        self.cursor = Some(page.continue_cursor);
        self.has_more = !page.is_done;
        if let Some(spec) = &self.sort {
          sort_documents(&mut self.documents, spec);
        }
        debug!(added, has_more = self.has_more, "continuation page appended");
        LoadOutcome::Loaded { count: added }
      }
      Err(err) => {
        warn!(error = %err, "continuation load failed");
        self.last_error = Some(err.to_string());
        LoadOutcome::Failed
      }
    }
  }

  /// Apply a new filter expression and reload from the start.
  ///
  /// A burst of rapid edits is coalesced by the debounce window — only
  /// the newest lands. An expression equal in value to the current one is
  /// ignored outright, so echoes of the last-applied filters cannot
  /// trigger a reload loop.
  pub async fn set_filters(&mut self, expr: FilterExpression) -> LoadOutcome {
    if expr == self.filters {
      return LoadOutcome::Skipped;
    }
    let Some(expr) = self.debounce.settle(expr).await else {
      return LoadOutcome::Skipped;
    };

    self.filters = expr.clone();
    self.cursor = None;
    self.has_more = false;
    self.query_id += 1;

    if let Some(table) = self.table.clone() {
      self.session_filters.insert(table.clone(), expr.clone());
      if let Err(err) = self.storage.save_table_filters(&table, &expr).await {
        warn!(table = %table, error = %err, "failed to persist filters");
      }
    }

    self.load_first_page().await
  }

  /// One header click: advance the sort cycle for `field`, apply a
  /// provisional in-memory sort immediately, and schedule the confirming
  /// reload. The provisional order is replaced wholesale when the fresh
  /// page arrives.
  pub async fn cycle_sort(&mut self, field: &str) -> LoadOutcome {
    self.sort = cycle(self.sort.take(), field);
    if let Some(spec) = &self.sort {
      sort_documents(&mut self.documents, spec);
    }
    self.cursor = None;
    self.has_more = false;
    self.query_id += 1;

    if self.debounce.settle(()).await.is_none() {
      return LoadOutcome::Skipped;
    }
    self.load_first_page().await
  }

  /// Optimistically patch `fields` into the given documents. On remote
  /// failure the authoritative page is re-fetched — the displayed state
  /// always converges back to the deployment's.
  pub async fn patch(&mut self, ids: &[String], fields: Map<String, Value>) -> MutationOutcome {
    let Some(table) = self.table.clone() else {
      return MutationOutcome::Rejected;
    };

    match self
      .mutator
      .patch(&mut self.documents, &table, ids, &fields)
      .await
    {
      Ok(()) => MutationOutcome::Applied,
      Err(err) => {
        warn!(table = %table, error = %err, "patch failed; re-syncing from deployment");
        self.last_error = Some(err.to_string());
        self.resync().await;
        MutationOutcome::Resynced
      }
    }
  }

  /// Delete documents. Local removal happens only after the deployment
  /// confirms; a failed delete changes nothing locally.
  pub async fn delete(&mut self, ids: &[String]) -> MutationOutcome {
    let Some(table) = self.table.clone() else {
      return MutationOutcome::Rejected;
    };

    match self.mutator.delete(&mut self.documents, &table, ids).await {
      Ok(removed) => {
        debug!(table = %table, removed, "documents deleted");
        MutationOutcome::Applied
      }
      Err(err) => {
        self.last_error = Some(err.to_string());
        MutationOutcome::Rejected
      }
    }
  }

  /// Force an authoritative first-page re-fetch, bypassing dedup.
  pub async fn resync(&mut self) {
    if let Some(table) = self.table.clone() {
      self.guard.invalidate_resource(&table);
    }
    self.cursor = None;
    self.has_more = false;
    self.query_id += 1;
    self.load_first_page().await;
  }

  /// Coerce free-text edit input against the runtime kind of the field it
  /// replaces on the given document.
  pub fn coerce_text(&self, id: &str, field: &str, input: &str) -> Value {
    match self.documents.iter().find(|d| d.id == id) {
      Some(doc) => OptimisticMutator::coerce_text(doc, field, input),
      None => Value::String(input.to_string()),
    }
  }

  fn compiled_filters(&mut self) -> std::result::Result<Option<String>, LoadOutcome> {
    match compile(&self.filters) {
      Ok(filters) => Ok(filters),
      Err(err) => {
        warn!(error = %err, "filter expression failed to compile");
        self.last_error = Some(err.to_string());
        Err(LoadOutcome::Failed)
      }
    }
  }

  fn sort_key(&self) -> Option<String> {
    self
      .sort
      .as_ref()
      .map(|s| format!("{}:{}", s.field, s.direction.as_str()))
  }

  // ── Accessors ──────────────────────────────────────────────────

  pub fn documents(&self) -> &[Document] {
    &self.documents
  }

  pub fn table(&self) -> Option<&str> {
    self.table.as_deref()
  }

  pub fn cursor(&self) -> Option<&str> {
    self.cursor.as_deref()
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  pub fn is_loading(&self) -> bool {
    self.is_loading
  }

  pub fn is_loading_more(&self) -> bool {
    self.is_loading_more
  }

  pub fn filters(&self) -> &FilterExpression {
    &self.filters
  }

  pub fn sort(&self) -> Option<&SortSpec> {
    self.sort.as_ref()
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }
}
