pub mod types;

pub use types::{FunctionInfo, FunctionKind, LogEntry, LogKey, LogLevel, RawLogEntry};
