//! Request deduplication.

pub mod cache;

pub use cache::{FetchGuard, FetchKey};
