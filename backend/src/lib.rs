//! Cashflow Simulator Core - Rust Engine
//!
//! Schedules recurring and probabilistic cashflow events on an N × M grid
//! (N timesteps × M parallel simulation paths).
//!
//! # Architecture
//!
//! - **core**: Shape broadcasting, timestamp normalization, name derivation
//! - **models**: Domain types (FrequencySpec, Transaction, PresenceSet)
//! - **arrivals**: Presence index generation, one strategy per transaction type
//! - **config**: Serde scenario and transaction configuration
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Every frequency classifies to exactly one transaction type
//! 2. All randomness is deterministic given a seed, and owned per transaction
//! 3. Presence is computed once, at construction, and never mutated
//!
//! # Example
//!
//! ```
//! use cashflow_simulator_core_rs::{FrequencySpec, Transaction, TransactionType};
//!
//! let tx = Transaction::new(10, 4, 2, FrequencySpec::Probability(0.5), Some(7)).unwrap();
//! assert_eq!(tx.transaction_type(), TransactionType::ProbabilisticInstantaneous);
//! assert!(tx.presence().iter().all(|cell| cell.timestep == 2));
//! ```

// Module declarations
pub mod arrivals;
pub mod config;
pub mod core;
pub mod models;
pub mod rng;

// Re-exports for convenience
pub use arrivals::{InputConfigurationError, PresenceGenerator};
pub use config::{ConfigError, ScenarioConfig, TransactionConfig};
pub use crate::core::broadcast::{broadcasts_to, is_broadcastable};
pub use crate::core::naming::derive_name;
pub use crate::core::time::{normalize, RawTime, TimeStamp, TimestampError};
pub use models::{
    frequency::{classify, ClassificationError, FrequencySpec, TransactionType},
    presence::{Cell, PresenceSet},
    transaction::{Transaction, TransactionError},
};
pub use rng::{DrawSource, RngManager};
