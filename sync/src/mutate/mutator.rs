use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use shared::error::Result;
use shared::table::Document;

use crate::client::{DataSource, DeleteTarget};

use super::coerce::FieldKind;

/// Applies field patches to the local document set ahead of server
/// confirmation.
///
/// Patches merge immediately and the remote call follows; when it fails
/// the caller re-fetches the authoritative page — there is no field-level
/// rollback. Deletes are the opposite: never optimistic, local removal
/// only after the remote call confirms, because delete is irreversible.
pub struct OptimisticMutator {
  source: Arc<dyn DataSource>,
}

impl OptimisticMutator {
  pub fn new(source: Arc<dyn DataSource>) -> Self {
    Self { source }
  }

  /// Shallow-merge `fields` into every matching document, then issue the
  /// remote mutation. On `Err` the optimistic edit is already applied and
  /// the caller must re-sync the resource.
  pub async fn patch(
    &self,
    docs: &mut [Document],
    table: &str,
    ids: &[String],
    fields: &Map<String, Value>,
  ) -> Result<()> {
    let mut touched = 0;
    for doc in docs.iter_mut() {
      if ids.contains(&doc.id) {
        doc.merge_fields(fields);
        touched += 1;
      }
    }
    debug!(table, touched, "optimistic patch applied locally");

    self.source.patch_documents(table, ids, fields).await
  }

  /// Delete the documents remotely, then remove them from the local list.
  /// Returns how many documents were removed. On `Err` the local list is
  /// untouched.
  pub async fn delete(
    &self,
    docs: &mut Vec<Document>,
    table: &str,
    ids: &[String],
  ) -> Result<usize> {
    let targets: Vec<DeleteTarget> = ids
      .iter()
      .map(|id| DeleteTarget {
        table_name: table.to_string(),
        id: id.clone(),
      })
      .collect();

    if let Err(err) = self.source.delete_documents(&targets).await {
      warn!(table, error = %err, "delete rejected; local documents kept");
      return Err(err);
    }

    let before = docs.len();
    docs.retain(|d| !ids.contains(&d.id));
    Ok(before - docs.len())
  }

  /// Coerce free-text input against the runtime kind of the field it
  /// replaces. Documents without the field (or with a null value) take
  /// the input as a string.
  pub fn coerce_text(doc: &Document, field: &str, input: &str) -> Value {
    let kind = doc
      .get(field)
      .as_ref()
      .map(FieldKind::of)
      .unwrap_or(FieldKind::String);
    kind.coerce(input)
  }
}
