//! Scenario and transaction configuration
//!
//! Configs are plain serde structs so they can be read from JSON. A
//! scenario fixes the grid (N timesteps × M paths) shared by all of its
//! transactions.
//!
//! # Example
//!
//! ```
//! use cashflow_simulator_core_rs::config::ScenarioConfig;
//!
//! let scenario = ScenarioConfig::from_json_str(r#"{
//!     "simulation_length": 12,
//!     "simulation_width": 4,
//!     "seed": 7,
//!     "transactions": [
//!         {"name": "rent", "frequency": 3},
//!         {"name": "bonus", "start": 11},
//!         {"name": "repairs", "frequency": [[2, 0.5], [8, 0.25]]}
//!     ]
//! }"#).unwrap();
//!
//! let transactions = scenario.build().unwrap();
//! assert_eq!(transactions.len(), 3);
//! assert_eq!(transactions[0].presence().timesteps(), vec![0, 3, 6, 9]);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::core::time::RawTime;
use crate::models::frequency::FrequencySpec;
use crate::models::transaction::{Transaction, TransactionError};
use crate::rng::derive_seed;

/// Errors raised while loading or building a scenario
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Transaction {index} ({name}): {source}")]
    Transaction {
        index: usize,
        name: String,
        #[source]
        source: TransactionError,
    },
}

/// Configuration for a single transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionConfig {
    /// Explicit name (None = derived from the draw source)
    #[serde(default)]
    pub name: Option<String>,

    /// Start offset t0
    #[serde(default)]
    pub start: usize,

    /// Frequency, inferred from the JSON value's shape
    #[serde(default)]
    pub frequency: FrequencySpec,

    /// Draw source seed (None = derived from the scenario seed, if any)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Calendar anchor for the start offset
    #[serde(default)]
    pub start_time: Option<RawTime>,
}

impl TransactionConfig {
    /// Name used in error reports
    fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }
}

/// A grid and the transactions placed on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Number of timesteps (N)
    pub simulation_length: usize,

    /// Number of parallel paths (M)
    pub simulation_width: usize,

    /// Master seed for transactions without their own
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub transactions: Vec<TransactionConfig>,
}

impl ScenarioConfig {
    /// Parse a scenario from JSON text.
    ///
    /// Frequencies are inferred after the rest of the document has parsed,
    /// so an unrecognised shape is reported against its entry as a
    /// [`TransactionError::Classification`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut raw: Value = serde_json::from_str(json)?;
        let frequencies = take_frequencies(&mut raw);
        let mut scenario: ScenarioConfig = serde_json::from_value(raw)?;

        for (index, (entry, frequency)) in scenario
            .transactions
            .iter_mut()
            .zip(frequencies)
            .enumerate()
        {
            if let Some(value) = frequency {
                let spec = FrequencySpec::try_from(value).map_err(|e| ConfigError::Transaction {
                    index,
                    name: entry.label(),
                    source: e.into(),
                })?;
                entry.frequency = spec;
            }
        }
        Ok(scenario)
    }

    /// Seed used for the transaction at `index`.
    ///
    /// An explicit seed wins; otherwise one is derived from the master seed
    /// and the index, so appending transactions never changes the draws of
    /// earlier ones.
    pub fn seed_for(&self, index: usize) -> Option<u64> {
        let explicit = self.transactions.get(index).and_then(|tx| tx.seed);
        explicit.or_else(|| self.seed.map(|master| derive_seed(master, index as u64)))
    }

    /// Build every transaction, stopping at the first failure.
    pub fn build(&self) -> Result<Vec<Transaction>, ConfigError> {
        let transactions = self
            .transactions
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let config = TransactionConfig {
                    seed: self.seed_for(index),
                    ..entry.clone()
                };
                Transaction::from_config(self.simulation_length, self.simulation_width, &config)
                    .map_err(|source| ConfigError::Transaction {
                        index,
                        name: entry.label(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            transactions = transactions.len(),
            length = self.simulation_length,
            width = self.simulation_width,
            "built scenario"
        );
        Ok(transactions)
    }
}

/// Detach each entry's raw `frequency` value, in entry order.
fn take_frequencies(raw: &mut Value) -> Vec<Option<Value>> {
    raw.get_mut("transactions")
        .and_then(Value::as_array_mut)
        .map(|entries| {
            entries
                .iter_mut()
                .map(|entry| entry.as_object_mut().and_then(|obj| obj.remove("frequency")))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(seed: Option<u64>, entries: usize) -> ScenarioConfig {
        ScenarioConfig {
            simulation_length: 10,
            simulation_width: 3,
            seed,
            transactions: vec![TransactionConfig::default(); entries],
        }
    }

    #[test]
    fn test_explicit_seed_wins() {
        let mut config = scenario(Some(1), 2);
        config.transactions[1].seed = Some(99);
        assert_eq!(config.seed_for(1), Some(99));
        assert_eq!(config.seed_for(0), Some(derive_seed(1, 0)));
    }

    #[test]
    fn test_no_master_seed() {
        assert_eq!(scenario(None, 1).seed_for(0), None);
    }

    #[test]
    fn test_appending_keeps_earlier_seeds() {
        let short = scenario(Some(5), 2);
        let long = scenario(Some(5), 4);
        assert_eq!(short.seed_for(0), long.seed_for(0));
        assert_eq!(short.seed_for(1), long.seed_for(1));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ScenarioConfig::from_json_str(
            r#"{"simulation_length": 3, "simulation_width": 2, "paths": 4}"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
