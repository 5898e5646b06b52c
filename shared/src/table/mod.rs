pub mod types;

pub use types::{usable_tables, Document, FieldSchema, Shape, ShapeMap};
