//! Cursor-driven incremental loading for the table browser.

pub mod collection;
pub mod debounce;
pub mod sort;

pub use collection::{LoadOutcome, MutationOutcome, PaginatedCollection};
pub use debounce::Debouncer;
pub use sort::{cycle, sort_documents, SortDirection, SortSpec};
