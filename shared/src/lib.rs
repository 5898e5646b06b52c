//! Shared building blocks for the Scope inspector engine: configuration,
//! the error taxonomy, and the log/table data model exchanged between the
//! sync engine and its embedders.

pub mod config;
pub mod error;
pub mod log;
pub mod settings;
pub mod table;
