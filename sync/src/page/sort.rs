use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use shared::table::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  Desc,
}

impl SortDirection {
  pub fn as_str(&self) -> &'static str {
    match self {
      SortDirection::Asc => "asc",
      SortDirection::Desc => "desc",
    }
  }
}

/// An active sort directive over one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
  pub field: String,
  pub direction: SortDirection,
}

impl SortSpec {
  pub fn asc(field: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      direction: SortDirection::Asc,
    }
  }

  pub fn desc(field: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      direction: SortDirection::Desc,
    }
  }
}

/// One click on a column header: unsorted → ascending → descending →
/// unsorted. Clicking a different column starts its cycle fresh.
pub fn cycle(current: Option<SortSpec>, field: &str) -> Option<SortSpec> {
  match current {
    Some(spec) if spec.field == field => match spec.direction {
      SortDirection::Asc => Some(SortSpec::desc(field)),
      SortDirection::Desc => None,
    },
    _ => Some(SortSpec::asc(field)),
  }
}

/// Stable in-memory sort of the visible documents.
///
/// Strings compare lexicographically, numbers numerically; null and
/// missing values sort last irrespective of direction. Mixed-type columns
/// fall back to a fixed type rank so the order stays total and stable.
pub fn sort_documents(docs: &mut [Document], spec: &SortSpec) {
  docs.sort_by(|a, b| compare_documents(a, b, spec));
}

fn compare_documents(a: &Document, b: &Document, spec: &SortSpec) -> Ordering {
  let va = a.get(&spec.field);
  let vb = b.get(&spec.field);
  match (nullish(&va), nullish(&vb)) {
    (true, true) => Ordering::Equal,
    (true, false) => Ordering::Greater,
    (false, true) => Ordering::Less,
    (false, false) => {
      let ord = compare_values(va.as_ref().unwrap(), vb.as_ref().unwrap());
      match spec.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
      }
    }
  }
}

fn nullish(v: &Option<Value>) -> bool {
  matches!(v, None | Some(Value::Null))
}

fn type_rank(v: &Value) -> u8 {
  match v {
    Value::Bool(_) => 0,
    Value::Number(_) => 1,
    Value::String(_) => 2,
    Value::Array(_) => 3,
    _ => 4,
  }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
  let (ra, rb) = (type_rank(a), type_rank(b));
  if ra != rb {
    return ra.cmp(&rb);
  }
  match (a, b) {
    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
    (Value::Number(x), Value::Number(y)) => {
      let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
      x.total_cmp(&y)
    }
    (Value::String(x), Value::String(y)) => x.cmp(y),
    // Containers have no natural order; compare their rendering so the
    // result is at least deterministic.
    _ => a.to_string().cmp(&b.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn doc(id: &str, n: Value) -> Document {
    let mut d = Document::new(id, 0.0);
    if !n.is_null() {
      d.fields.insert("n".to_string(), n);
    }
    d
  }

  fn order(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|d| d.id.as_str()).collect()
  }

  #[test]
  fn nulls_sort_last_in_both_directions() {
    let mut docs = vec![
      doc("three", json!(3)),
      doc("one", json!(1)),
      doc("null", Value::Null),
    ];
    sort_documents(&mut docs, &SortSpec::asc("n"));
    assert_eq!(order(&docs), vec!["one", "three", "null"]);

    sort_documents(&mut docs, &SortSpec::desc("n"));
    assert_eq!(order(&docs), vec!["three", "one", "null"]);
  }

  #[test]
  fn strings_compare_lexicographically() {
    let mut docs = vec![
      doc("b", json!("banana")),
      doc("a", json!("apple")),
      doc("c", json!("cherry")),
    ];
    sort_documents(&mut docs, &SortSpec::asc("n"));
    assert_eq!(order(&docs), vec!["a", "b", "c"]);
  }

  #[test]
  fn system_fields_are_sortable() {
    let mut docs = vec![Document::new("z", 2.0), Document::new("a", 1.0)];
    sort_documents(&mut docs, &SortSpec::asc("_creationTime"));
    assert_eq!(order(&docs), vec!["a", "z"]);
    sort_documents(&mut docs, &SortSpec::asc("_id"));
    assert_eq!(order(&docs), vec!["a", "z"]);
  }

  #[test]
  fn header_clicks_cycle_through_directions() {
    let first = cycle(None, "n");
    assert_eq!(first, Some(SortSpec::asc("n")));
    let second = cycle(first, "n");
    assert_eq!(second, Some(SortSpec::desc("n")));
    assert_eq!(cycle(second, "n"), None);
    // A different column restarts ascending.
    assert_eq!(cycle(Some(SortSpec::desc("n")), "m"), Some(SortSpec::asc("m")));
  }
}
