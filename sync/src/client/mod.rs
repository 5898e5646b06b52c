//! Data sources: the deployment endpoints behind one swappable interface.

pub mod http;
pub mod mock;
pub mod source;
pub mod types;

pub use http::HttpSource;
pub use mock::MockSource;
pub use source::DataSource;
pub use types::{DeleteTarget, DocumentPage, LogChunk, PageRequest};
