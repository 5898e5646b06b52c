use serde_json::Value;

/// Runtime kind of an existing field value, resolved once per edit.
///
/// Free-text input from the edit surface is coerced to match the kind of
/// the value it replaces; parse failures fall back gracefully to the
/// original string rather than rejecting the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Number,
  Boolean,
  Array,
  Object,
  String,
}

impl FieldKind {
  /// Classify an existing value. Null classifies as `String`, the
  /// passthrough kind.
  pub fn of(value: &Value) -> Self {
    match value {
      Value::Number(_) => FieldKind::Number,
      Value::Bool(_) => FieldKind::Boolean,
      Value::Array(_) => FieldKind::Array,
      Value::Object(_) => FieldKind::Object,
      _ => FieldKind::String,
    }
  }

  /// Coerce free-text input to this kind.
  pub fn coerce(&self, input: &str) -> Value {
    match self {
      FieldKind::Number => match input.trim().parse::<f64>() {
        Ok(n) => serde_json::Number::from_f64(n)
          .map(Value::Number)
          .unwrap_or_else(|| Value::String(input.to_string())),
        Err(_) => Value::String(input.to_string()),
      },
      FieldKind::Boolean => Value::Bool(input.trim() == "true"),
      FieldKind::Array => match serde_json::from_str::<Value>(input) {
        Ok(v @ Value::Array(_)) => v,
        _ => Value::String(input.to_string()),
      },
      FieldKind::Object => match serde_json::from_str::<Value>(input) {
        Ok(v @ Value::Object(_)) => v,
        _ => Value::String(input.to_string()),
      },
      FieldKind::String => Value::String(input.to_string()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn numbers_parse_or_fall_back() {
    let kind = FieldKind::of(&json!(41));
    assert_eq!(kind, FieldKind::Number);
    assert_eq!(kind.coerce("42.5"), json!(42.5));
    assert_eq!(kind.coerce("not a number"), json!("not a number"));
  }

  #[test]
  fn booleans_compare_against_the_true_literal() {
    let kind = FieldKind::of(&json!(false));
    assert_eq!(kind.coerce("true"), json!(true));
    assert_eq!(kind.coerce("True"), json!(false));
    assert_eq!(kind.coerce("yes"), json!(false));
  }

  #[test]
  fn containers_parse_as_json_with_fallback() {
    let arr = FieldKind::of(&json!([1, 2]));
    assert_eq!(arr.coerce("[3,4]"), json!([3, 4]));
    assert_eq!(arr.coerce("{\"a\":1}"), json!("{\"a\":1}"));
    assert_eq!(arr.coerce("[broken"), json!("[broken"));

    let obj = FieldKind::of(&json!({"a": 1}));
    assert_eq!(obj.coerce("{\"b\":2}"), json!({"b": 2}));
    assert_eq!(obj.coerce("plain"), json!("plain"));
  }

  #[test]
  fn strings_and_nulls_pass_through() {
    assert_eq!(FieldKind::of(&json!("hi")), FieldKind::String);
    assert_eq!(FieldKind::of(&Value::Null), FieldKind::String);
    assert_eq!(FieldKind::String.coerce("42"), json!("42"));
  }
}
