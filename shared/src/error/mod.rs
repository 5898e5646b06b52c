pub mod types;

pub use types::ScopeError;

/// Shorthand Result type used throughout Scope.
pub type Result<T> = std::result::Result<T, ScopeError>;
