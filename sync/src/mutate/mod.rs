//! Optimistic local mutation with server reconciliation.

pub mod coerce;
pub mod mutator;

pub use coerce::FieldKind;
pub use mutator::OptimisticMutator;
