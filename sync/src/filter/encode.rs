//! Wire encoding of filter expressions.
//!
//! The deployment accepts a filter blob as an opaque query parameter: the
//! clause list serialized to JSON, then base64. Operator names are
//! translated at this boundary only — `isType`/`isNotType` become the
//! server tokens `type`/`notype`; all other operators pass through.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared::error::{Result, ScopeError};

use super::clause::{FilterClause, FilterExpression, FilterOp};

/// A clause as it appears inside the encoded blob.
#[derive(Debug, Serialize, Deserialize)]
struct WireClause {
  field: String,
  op: String,
  value: Value,
  enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireExpression {
  clauses: Vec<WireClause>,
}

/// Serialize an expression to its transport form.
///
/// The empty expression compiles to `None`, meaning "no filter parameter
/// sent". Clause values are not validated against field types here; a
/// mismatch is a deployment-side error condition.
pub fn compile(expr: &FilterExpression) -> Result<Option<String>> {
  if expr.is_empty() {
    return Ok(None);
  }

  let wire = WireExpression {
    clauses: expr
      .clauses
      .iter()
      .map(|c| WireClause {
        field: c.field.clone(),
        op: c.op.wire_token().to_string(),
        value: c.value.clone(),
        enabled: c.enabled,
      })
      .collect(),
  };

  let json = serde_json::to_string(&wire).map_err(ScopeError::FilterEncode)?;
  Ok(Some(BASE64.encode(json)))
}

/// Inverse of [`compile`], used when rehydrating persisted or in-flight
/// query state. `None` parses to the empty expression.
pub fn parse(raw: Option<&str>) -> Result<FilterExpression> {
  let raw = match raw {
    None => return Ok(FilterExpression::default()),
    Some(r) if r.is_empty() => return Ok(FilterExpression::default()),
    Some(r) => r,
  };

  let bytes = BASE64
    .decode(raw)
    .map_err(|e| ScopeError::FilterDecode(e.to_string()))?;
  let wire: WireExpression =
    serde_json::from_slice(&bytes).map_err(|e| ScopeError::FilterDecode(e.to_string()))?;

  let mut clauses = Vec::with_capacity(wire.clauses.len());
  for c in wire.clauses {
    let op = FilterOp::from_wire_token(&c.op).ok_or(ScopeError::UnknownOperator(c.op))?;
    clauses.push(FilterClause {
      field: c.field,
      op,
      value: c.value,
      enabled: c.enabled,
    });
  }
  Ok(FilterExpression::new(clauses))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn sample() -> FilterExpression {
    FilterExpression::new(vec![
      FilterClause::new("name", FilterOp::Eq, json!("Alice")),
      FilterClause {
        field: "age".to_string(),
        op: FilterOp::Gte,
        value: json!(30),
        enabled: false,
      },
      FilterClause::new("tags", FilterOp::IsType, json!("array")),
    ])
  }

  #[test]
  fn round_trips_including_disabled_clauses() {
    let expr = sample();
    let encoded = compile(&expr).unwrap();
    let decoded = parse(encoded.as_deref()).unwrap();
    assert_eq!(decoded, expr);
  }

  #[test]
  fn empty_expression_compiles_to_none() {
    assert_eq!(compile(&FilterExpression::default()).unwrap(), None);
    assert_eq!(parse(None).unwrap(), FilterExpression::default());
  }

  #[test]
  fn only_type_tests_are_remapped() {
    let expr = FilterExpression::new(vec![
      FilterClause::new("name", FilterOp::Eq, json!("Alice")),
      FilterClause::new("tags", FilterOp::IsNotType, json!("string")),
    ]);
    let encoded = compile(&expr).unwrap().unwrap();
    let json = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();

    assert!(json.contains("\"op\":\"eq\""));
    assert!(json.contains("\"op\":\"notype\""));
    assert!(!json.contains("isNotType"));
  }

  #[test]
  fn unknown_operator_token_is_rejected() {
    let blob = BASE64.encode(r#"{"clauses":[{"field":"x","op":"like","value":1,"enabled":true}]}"#);
    let err = parse(Some(&blob)).unwrap_err();
    assert!(matches!(err, ScopeError::UnknownOperator(op) if op == "like"));
  }

  #[test]
  fn garbage_input_is_a_decode_error() {
    assert!(matches!(
      parse(Some("not-base64!")),
      Err(ScopeError::FilterDecode(_))
    ));
  }
}
