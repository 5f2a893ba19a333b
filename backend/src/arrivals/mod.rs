//! Presence index generation
//!
//! Turns a classified frequency into the concrete cells of the N × M grid
//! (N timesteps, M parallel paths) at which a transaction fires.
//!
//! # Key Principles
//!
//! 1. **Determinism**: same seed + same frequency → same presence
//! 2. **Validate first**: every check runs before the first draw, so a
//!    rejected frequency leaves the draw source untouched
//! 3. **Whole draws**: once a draw starts it covers its full grid or row
//!
//! # Comparison boundary
//!
//! Instantaneous probabilistic transactions fire when `sample < p`.
//! Periodic and aperiodic probabilistic transactions fire when
//! `sample <= p`. The two operators are deliberate and must not be unified.
//!
//! # Example
//!
//! ```
//! use cashflow_simulator_core_rs::arrivals::PresenceGenerator;
//! use cashflow_simulator_core_rs::{classify, FrequencySpec};
//!
//! let generator = PresenceGenerator::new(5, 3, 0).unwrap();
//! let spec = FrequencySpec::IntegerPeriod(2);
//! let presence = generator.generate(classify(&spec), &spec, None).unwrap();
//! assert_eq!(presence.timesteps(), vec![0, 2, 4]);
//! assert_eq!(presence.len(), 9);
//! ```

use ndarray::{ArrayD, ArrayView1, ArrayView2, Zip};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::broadcast::broadcasts_to;
use crate::models::frequency::{classify, FrequencySpec, TransactionType};
use crate::models::presence::{Cell, PresenceSet};
use crate::rng::DrawSource;

/// Errors raised when a transaction's inputs cannot produce a presence set
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputConfigurationError {
    #[error("Probabilistic frequency requires a draw source")]
    MissingDrawSource,

    #[error("Probability shape {shape:?} is not broadcastable to {target:?}")]
    NotBroadcastable {
        shape: Vec<usize>,
        target: Vec<usize>,
    },

    #[error("Period must be positive, got {0}")]
    NonPositivePeriod(i64),

    #[error("Explicit timestep list is empty")]
    EmptyTimestepList,

    #[error("Timestep {timestep} outside simulation length {length}")]
    TimestepOutOfRange { timestep: i64, length: usize },

    #[error("Probability {0} outside [0, 1]")]
    InvalidProbability(f64),

    #[error("Grid shape {shape:?} does not fit {values} values")]
    GridShapeMismatch { shape: Vec<usize>, values: usize },

    #[error("Simulation dimensions must be positive, got {length}x{width}")]
    InvalidDimensions { length: usize, width: usize },

    #[error("Start offset {start} outside simulation length {length}")]
    StartOutOfRange { start: usize, length: usize },

    #[error("Transaction type {found} does not match a {expected} frequency")]
    SpecTypeMismatch {
        expected: TransactionType,
        found: TransactionType,
    },
}

/// Presence generator for one grid and start offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceGenerator {
    /// Number of timesteps (N)
    length: usize,

    /// Number of parallel paths (M)
    width: usize,

    /// Start offset (t0), in `[0, N)`
    start: usize,
}

impl PresenceGenerator {
    /// Create a generator for an `length × width` grid starting at `start`.
    ///
    /// # Errors
    /// `InvalidDimensions` when either dimension is zero, `StartOutOfRange`
    /// when `start >= length`.
    pub fn new(length: usize, width: usize, start: usize) -> Result<Self, InputConfigurationError> {
        if length == 0 || width == 0 {
            return Err(InputConfigurationError::InvalidDimensions { length, width });
        }
        if start >= length {
            return Err(InputConfigurationError::StartOutOfRange { start, length });
        }
        Ok(Self {
            length,
            width,
            start,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Compute the presence set for a classified frequency.
    ///
    /// `draws` is only consulted by probabilistic types; passing `None` for
    /// one of those is an error.
    pub fn generate(
        &self,
        tx_type: TransactionType,
        spec: &FrequencySpec,
        draws: Option<&mut DrawSource>,
    ) -> Result<PresenceSet, InputConfigurationError> {
        let result = self.dispatch(tx_type, spec, draws);
        match &result {
            Ok(presence) => debug!(
                transaction_type = %tx_type,
                cells = presence.len(),
                "generated presence"
            ),
            Err(e) => warn!(transaction_type = %tx_type, error = %e, "rejected frequency"),
        }
        result
    }

    fn dispatch(
        &self,
        tx_type: TransactionType,
        spec: &FrequencySpec,
        draws: Option<&mut DrawSource>,
    ) -> Result<PresenceSet, InputConfigurationError> {
        match (tx_type, spec) {
            (TransactionType::DiscreteInstantaneous, FrequencySpec::Unset) => {
                Ok(self.discrete_instantaneous())
            }
            (TransactionType::DiscretePeriodic, FrequencySpec::IntegerPeriod(period)) => {
                self.discrete_periodic(*period)
            }
            (TransactionType::DiscreteAperiodic, FrequencySpec::ExplicitTimes(times)) => {
                self.discrete_aperiodic(times)
            }
            (TransactionType::ProbabilisticInstantaneous, FrequencySpec::Probability(p)) => {
                self.probabilistic_instantaneous(*p, draws)
            }
            (TransactionType::ProbabilisticPeriodic, FrequencySpec::ProbabilityGrid(grid)) => {
                self.probabilistic_periodic(grid, draws)
            }
            (
                TransactionType::ProbabilisticAperiodic,
                FrequencySpec::ExplicitProbabilities(entries),
            ) => self.probabilistic_aperiodic(entries, draws),
            (found, spec) => Err(InputConfigurationError::SpecTypeMismatch {
                expected: classify(spec),
                found,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Discrete strategies
    // ------------------------------------------------------------------

    fn discrete_instantaneous(&self) -> PresenceSet {
        PresenceSet::full_rows([self.start], self.width)
    }

    fn discrete_periodic(&self, period: i64) -> Result<PresenceSet, InputConfigurationError> {
        if period <= 0 {
            return Err(InputConfigurationError::NonPositivePeriod(period));
        }
        let step = usize::try_from(period).unwrap_or(usize::MAX);
        Ok(PresenceSet::full_rows(
            (self.start..self.length).step_by(step),
            self.width,
        ))
    }

    fn discrete_aperiodic(&self, times: &[i64]) -> Result<PresenceSet, InputConfigurationError> {
        if times.is_empty() {
            return Err(InputConfigurationError::EmptyTimestepList);
        }
        let rows = times
            .iter()
            .map(|&t| self.check_timestep(t))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PresenceSet::full_rows(rows, self.width))
    }

    // ------------------------------------------------------------------
    // Probabilistic strategies
    // ------------------------------------------------------------------

    fn probabilistic_instantaneous(
        &self,
        probability: f64,
        draws: Option<&mut DrawSource>,
    ) -> Result<PresenceSet, InputConfigurationError> {
        check_probability(probability)?;
        let draws = draws.ok_or(InputConfigurationError::MissingDrawSource)?;

        // The full grid is drawn so the seed maps to the same samples
        // whatever the start offset.
        let samples = draws.draw(self.length, self.width);
        let cells = fire_below(samples.row(self.start), probability)
            .map(|j| Cell::new(self.start, j))
            .collect();
        Ok(PresenceSet::from_sorted(cells))
    }

    fn probabilistic_periodic(
        &self,
        grid: &ArrayD<f64>,
        draws: Option<&mut DrawSource>,
    ) -> Result<PresenceSet, InputConfigurationError> {
        let target = [self.length, self.width];
        let not_broadcastable = || InputConfigurationError::NotBroadcastable {
            shape: grid.shape().to_vec(),
            target: target.to_vec(),
        };

        if !broadcasts_to(grid.shape(), &target) {
            return Err(not_broadcastable());
        }
        grid.iter().try_for_each(|&p| check_probability(p))?;
        let draws = draws.ok_or(InputConfigurationError::MissingDrawSource)?;

        let effective = grid
            .broadcast((self.length, self.width))
            .ok_or_else(not_broadcastable)?;

        let samples = draws.draw(self.length, self.width);
        Ok(PresenceSet::from_sorted(fire_at_most(
            samples.view(),
            effective,
        )))
    }

    fn probabilistic_aperiodic(
        &self,
        entries: &[(i64, f64)],
        draws: Option<&mut DrawSource>,
    ) -> Result<PresenceSet, InputConfigurationError> {
        if entries.is_empty() {
            return Err(InputConfigurationError::EmptyTimestepList);
        }
        let checked = entries
            .iter()
            .map(|&(t, p)| {
                let timestep = self.check_timestep(t)?;
                check_probability(p)?;
                Ok((timestep, p))
            })
            .collect::<Result<Vec<_>, InputConfigurationError>>()?;
        let draws = draws.ok_or(InputConfigurationError::MissingDrawSource)?;

        let mut cells = Vec::new();
        for (timestep, probability) in checked {
            let samples = draws.draw_row(self.width);
            cells.extend(
                samples
                    .iter()
                    .enumerate()
                    .filter(|(_, &sample)| sample <= probability)
                    .map(|(j, _)| Cell::new(timestep, j)),
            );
        }
        Ok(PresenceSet::from_unordered(cells))
    }

    fn check_timestep(&self, timestep: i64) -> Result<usize, InputConfigurationError> {
        usize::try_from(timestep)
            .ok()
            .filter(|&t| t < self.length)
            .ok_or(InputConfigurationError::TimestepOutOfRange {
                timestep,
                length: self.length,
            })
    }
}

fn check_probability(p: f64) -> Result<(), InputConfigurationError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(InputConfigurationError::InvalidProbability(p))
    }
}

/// Paths whose sample is strictly below `probability`.
fn fire_below(samples: ArrayView1<'_, f64>, probability: f64) -> impl Iterator<Item = usize> + '_ {
    samples
        .into_iter()
        .enumerate()
        .filter(move |(_, &sample)| sample < probability)
        .map(|(j, _)| j)
}

/// Cells whose sample is at most the matching probability, row-major.
fn fire_at_most(samples: ArrayView2<'_, f64>, probabilities: ArrayView2<'_, f64>) -> Vec<Cell> {
    let mut cells = Vec::new();
    Zip::indexed(samples)
        .and(probabilities)
        .for_each(|(t, j), &sample, &p| {
            if sample <= p {
                cells.push(Cell::new(t, j));
            }
        });
    cells
}
