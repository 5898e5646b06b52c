use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A document held by the table browser.
///
/// Identity is `_id`; everything beyond the two system fields is dynamic
/// and carried as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_creationTime")]
    pub creation_time: f64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, creation_time: f64) -> Self {
        Self {
            id: id.into(),
            creation_time,
            fields: Map::new(),
        }
    }

    /// Look up a field value by name. The system fields `_id` and
    /// `_creationTime` are resolvable like any other field so that sorting
    /// can target them.
    pub fn get(&self, field: &str) -> Option<Value> {
        match field {
            "_id" => Some(Value::String(self.id.clone())),
            "_creationTime" => serde_json::Number::from_f64(self.creation_time).map(Value::Number),
            _ => self.fields.get(field).cloned(),
        }
    }

    /// Shallow-merge a field patch into this document. The system fields
    /// are not patchable and are skipped if present in the patch.
    pub fn merge_fields(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key == "_id" || key == "_creationTime" {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }
}

/// Shape descriptor of a table or field, as reported by the deployment's
/// shape endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Shape {
    /// The table has never held a document; excluded from the usable set.
    Never,
    Any,
    Boolean,
    Number,
    String,
    /// A reference to a document in another table.
    Id { table: String },
    Array { element: Box<Shape> },
    Object { fields: Vec<FieldSchema> },
}

impl Shape {
    /// Field schemas of an object shape; empty for every other shape.
    pub fn fields(&self) -> &[FieldSchema] {
        match self {
            Shape::Object { fields } => fields,
            _ => &[],
        }
    }
}

/// One named field within an object shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub field_name: String,
    pub optional: bool,
    pub shape: Shape,
}

/// Table name → top-level shape, as returned by the shape endpoint.
pub type ShapeMap = BTreeMap<String, Shape>;

/// Tables that can actually be browsed: everything whose top-level shape
/// is not `Never`.
pub fn usable_tables(shapes: &ShapeMap) -> Vec<&str> {
    shapes
        .iter()
        .filter(|(_, shape)| !matches!(shape, Shape::Never))
        .map(|(name, _)| name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn never_tables_are_excluded() {
        let mut shapes = ShapeMap::new();
        shapes.insert("users".to_string(), Shape::Object { fields: vec![] });
        shapes.insert("ghosts".to_string(), Shape::Never);
        assert_eq!(usable_tables(&shapes), vec!["users"]);
    }

    #[test]
    fn system_fields_resolve_like_fields() {
        let mut doc = Document::new("doc1", 1_234.5);
        doc.fields.insert("name".to_string(), json!("Alice"));
        assert_eq!(doc.get("_id"), Some(json!("doc1")));
        assert_eq!(doc.get("_creationTime"), Some(json!(1_234.5)));
        assert_eq!(doc.get("name"), Some(json!("Alice")));
        assert_eq!(doc.get("missing"), None);
    }

    #[test]
    fn merge_skips_system_fields() {
        let mut doc = Document::new("doc1", 1.0);
        let mut patch = Map::new();
        patch.insert("_id".to_string(), json!("evil"));
        patch.insert("count".to_string(), json!(7));
        doc.merge_fields(&patch);
        assert_eq!(doc.id, "doc1");
        assert_eq!(doc.get("count"), Some(json!(7)));
    }

    #[test]
    fn shape_round_trips_through_tagged_json() {
        let shape = Shape::Object {
            fields: vec![FieldSchema {
                field_name: "friends".to_string(),
                optional: true,
                shape: Shape::Array {
                    element: Box::new(Shape::Id {
                        table: "users".to_string(),
                    }),
                },
            }],
        };
        let raw = serde_json::to_string(&shape).unwrap();
        assert_eq!(serde_json::from_str::<Shape>(&raw).unwrap(), shape);
    }
}
