//! Transaction model
//!
//! A transaction is a recurring or probabilistic event placed on an
//! N × M simulation grid (N timesteps, M parallel paths). Each transaction
//! has:
//! - Grid dimensions and a start offset
//! - A frequency spec and the transaction type it classifies to
//! - Its own draw source (optionally seeded)
//! - The presence set: every cell at which it fires
//!
//! CRITICAL: presence is computed once, during construction, and never
//! changes afterwards. A failed construction yields no transaction at all.

use thiserror::Error;
use tracing::debug;

use crate::arrivals::{InputConfigurationError, PresenceGenerator};
use crate::config::TransactionConfig;
use crate::core::naming::derive_name;
use crate::core::time::{normalize, TimeStamp, TimestampError};
use crate::models::frequency::{classify, ClassificationError, FrequencySpec, TransactionType};
use crate::models::presence::PresenceSet;
use crate::rng::DrawSource;

/// Errors that can occur while building a transaction
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransactionError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    InputConfiguration(#[from] InputConfigurationError),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// A scheduled cashflow event and the cells at which it fires
///
/// # Example
/// ```
/// use cashflow_simulator_core_rs::{FrequencySpec, Transaction};
///
/// let tx = Transaction::new(5, 3, 0, FrequencySpec::IntegerPeriod(2), Some(42)).unwrap();
/// assert_eq!(tx.transaction_type().code(), "d_p");
/// assert_eq!(tx.presence().timesteps(), vec![0, 2, 4]);
/// assert!(tx.fires_at(2, 1));
/// ```
#[derive(Debug)]
pub struct Transaction {
    /// Unique transaction identifier (UUID)
    id: String,

    /// Configured name, or one derived from the draw source
    name: String,

    /// Number of timesteps (N)
    simulation_length: usize,

    /// Number of parallel paths (M)
    simulation_width: usize,

    /// Start offset (t0)
    start: usize,

    frequency: FrequencySpec,

    /// Seed as configured; `None` means an entropy seed was picked
    seed: Option<u64>,

    transaction_type: TransactionType,

    /// Calendar anchor of the start offset, if one was given
    start_time: Option<TimeStamp>,

    /// Owned exclusively; never exposed
    draws: DrawSource,

    presence: PresenceSet,
}

impl Transaction {
    /// Create a transaction and compute its presence set
    ///
    /// # Arguments
    /// * `simulation_length` - Number of timesteps N (> 0)
    /// * `simulation_width` - Number of parallel paths M (> 0)
    /// * `start` - Start offset t0 in `[0, N)`
    /// * `frequency` - How often the transaction fires
    /// * `seed` - Seed for the draw source; `None` picks one at random
    ///
    /// # Errors
    /// Any [`InputConfigurationError`] raised by validation or presence
    /// generation, wrapped in [`TransactionError`].
    pub fn new(
        simulation_length: usize,
        simulation_width: usize,
        start: usize,
        frequency: FrequencySpec,
        seed: Option<u64>,
    ) -> Result<Self, TransactionError> {
        Self::build(
            simulation_length,
            simulation_width,
            start,
            frequency,
            seed,
            None,
            None,
        )
    }

    /// Create a transaction from its configuration on an N × M grid.
    ///
    /// Also normalizes the configured start time and applies the name.
    pub fn from_config(
        simulation_length: usize,
        simulation_width: usize,
        config: &TransactionConfig,
    ) -> Result<Self, TransactionError> {
        let start_time = config.start_time.as_ref().map(normalize).transpose()?;
        Self::build(
            simulation_length,
            simulation_width,
            config.start,
            config.frequency.clone(),
            config.seed,
            config.name.clone(),
            start_time,
        )
    }

    fn build(
        simulation_length: usize,
        simulation_width: usize,
        start: usize,
        frequency: FrequencySpec,
        seed: Option<u64>,
        name: Option<String>,
        start_time: Option<TimeStamp>,
    ) -> Result<Self, TransactionError> {
        let generator = PresenceGenerator::new(simulation_length, simulation_width, start)?;
        let transaction_type = classify(&frequency);

        let mut draws = DrawSource::new(seed);
        let presence = generator.generate(transaction_type, &frequency, Some(&mut draws))?;

        // Drawn after presence so naming can never shift the presence stream
        let name = name.unwrap_or_else(|| derive_name(draws.next_u64()));

        debug!(
            name = %name,
            transaction_type = %transaction_type,
            seed = draws.seed(),
            cells = presence.len(),
            "built transaction"
        );

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            simulation_length,
            simulation_width,
            start,
            frequency,
            seed,
            transaction_type,
            start_time,
            draws,
            presence,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn simulation_length(&self) -> usize {
        self.simulation_length
    }

    pub fn simulation_width(&self) -> usize {
        self.simulation_width
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn frequency(&self) -> &FrequencySpec {
        &self.frequency
    }

    /// Seed as configured
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Seed the draw source actually used
    ///
    /// Equals [`Transaction::seed`] when one was configured. Rebuilding with
    /// this seed reproduces the presence set of an unseeded transaction.
    pub fn effective_seed(&self) -> u64 {
        self.draws.seed()
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn start_time(&self) -> Option<&TimeStamp> {
        self.start_time.as_ref()
    }

    /// Cells at which this transaction fires, in accumulation order
    pub fn presence(&self) -> &PresenceSet {
        &self.presence
    }

    /// Whether the transaction fires at `(timestep, path)`
    pub fn fires_at(&self, timestep: usize, path: usize) -> bool {
        self.presence.contains(timestep, path)
    }

    /// Total number of firing cells
    pub fn firing_count(&self) -> usize {
        self.presence.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_transaction_is_send_sync() {
        assert_send_sync::<Transaction>();
    }

    #[test]
    fn test_naming_draw_follows_presence() {
        let tx = Transaction::new(6, 4, 1, FrequencySpec::Probability(0.5), Some(77)).unwrap();

        let mut replay = DrawSource::new(Some(77));
        replay.draw(6, 4);
        assert_eq!(tx.name(), derive_name(replay.next_u64()));
    }

    #[test]
    fn test_explicit_name_skips_draw() {
        let config = TransactionConfig {
            name: Some("rent".to_string()),
            ..TransactionConfig::default()
        };
        let tx = Transaction::from_config(3, 2, &config).unwrap();
        assert_eq!(tx.name(), "rent");
    }
}
