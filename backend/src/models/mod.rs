//! Domain models for the cashflow simulator

pub mod frequency;
pub mod presence;
pub mod transaction;

// Re-exports
pub use frequency::{classify, ClassificationError, FrequencySpec, TransactionType};
pub use presence::{Cell, PresenceSet};
pub use transaction::{Transaction, TransactionError};
