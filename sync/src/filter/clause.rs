use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Comparison operator of a filter clause.
///
/// These are the operator names as the panel UI knows them. The type-test
/// operators are renamed at the wire boundary (see [`super::encode`]); the
/// rest pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
  Eq,
  Neq,
  Gt,
  Gte,
  Lt,
  Lte,
  IsType,
  IsNotType,
}

impl FilterOp {
  /// Token sent to the deployment. Only the type-test operators differ
  /// from their UI names.
  pub fn wire_token(&self) -> &'static str {
    match self {
      FilterOp::Eq => "eq",
      FilterOp::Neq => "neq",
      FilterOp::Gt => "gt",
      FilterOp::Gte => "gte",
      FilterOp::Lt => "lt",
      FilterOp::Lte => "lte",
      FilterOp::IsType => "type",
      FilterOp::IsNotType => "notype",
    }
  }

  /// Parse a wire token back into the UI-facing operator.
  pub fn from_wire_token(s: &str) -> Option<Self> {
    match s {
      "eq" => Some(FilterOp::Eq),
      "neq" => Some(FilterOp::Neq),
      "gt" => Some(FilterOp::Gt),
      "gte" => Some(FilterOp::Gte),
      "lt" => Some(FilterOp::Lt),
      "lte" => Some(FilterOp::Lte),
      "type" => Some(FilterOp::IsType),
      "notype" => Some(FilterOp::IsNotType),
      _ => None,
    }
  }
}

impl fmt::Display for FilterOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.wire_token())
  }
}

/// A single field/operator/value condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
  pub field: String,
  pub op: FilterOp,
  pub value: Value,
  /// Disabled clauses are kept in the expression (and round-trip through
  /// the encoding) but the deployment ignores them.
  pub enabled: bool,
}

impl FilterClause {
  pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
    Self {
      field: field.into(),
      op,
      value,
      enabled: true,
    }
  }
}

/// An ordered conjunction of filter clauses.
///
/// The empty expression means "no filtering". Order is preserved for
/// stable rendering; the deployment AND-combines clauses regardless of
/// order. Duplicate-field clauses are legal — the model does not enforce
/// uniqueness, and all clauses are sent to the deployment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterExpression {
  pub clauses: Vec<FilterClause>,
}

impl FilterExpression {
  pub fn new(clauses: Vec<FilterClause>) -> Self {
    Self { clauses }
  }

  pub fn is_empty(&self) -> bool {
    self.clauses.is_empty()
  }

  /// Replace the first clause for this field in place; append when the
  /// field has no clause yet. The edit surface treats clauses as a set
  /// keyed by field even though storage is list-like.
  pub fn set_clause(&mut self, clause: FilterClause) {
    match self.clauses.iter_mut().find(|c| c.field == clause.field) {
      Some(existing) => *existing = clause,
      None => self.clauses.push(clause),
    }
  }

  /// Drop every clause whose field equals `field`.
  pub fn remove_field(&mut self, field: &str) {
    self.clauses.retain(|c| c.field != field);
  }

  /// Toggle the enabled flag of the first clause for `field`.
  pub fn toggle_field(&mut self, field: &str) {
    if let Some(clause) = self.clauses.iter_mut().find(|c| c.field == field) {
      clause.enabled = !clause.enabled;
    }
  }
}
