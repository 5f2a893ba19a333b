//! Frequency specifications and transaction types
//!
//! A [`FrequencySpec`] says *how often* a transaction fires. Every spec
//! belongs to exactly one [`TransactionType`], which picks the strategy the
//! presence generator uses:
//!
//! | spec                    | type  |
//! |-------------------------|-------|
//! | `Unset`                 | `d_i` |
//! | `IntegerPeriod`         | `d_p` |
//! | `ExplicitTimes`         | `d_a` |
//! | `Probability`           | `p_i` |
//! | `ProbabilityGrid`       | `p_p` |
//! | `ExplicitProbabilities` | `p_a` |
//!
//! Specs written in JSON are inferred from the value's shape (see
//! [`FrequencySpec::try_from`]); anything outside the recognised shapes is a
//! [`ClassificationError`].

use ndarray::{Array, ArrayD, Dimension, IxDyn};
use serde::{ser, Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::arrivals::InputConfigurationError;

/// Errors raised when a frequency cannot be classified
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("Frequency {0} does not match any recognised shape")]
    UnsupportedValue(String),

    #[error("Frequency sequence is empty")]
    EmptySequence,

    #[error("Frequency sequence mixes element kinds: {0}")]
    MixedSequence(String),

    #[error("Probability grid is not rectangular")]
    RaggedGrid,

    #[error("Invalid probability grid: {0}")]
    InvalidGrid(String),

    #[error("Unknown transaction type code '{0}'")]
    UnknownTransactionType(String),

    #[error("Probability {0} has no JSON representation")]
    NonFiniteProbability(f64),
}

/// How often a transaction fires
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Value")]
pub enum FrequencySpec {
    /// Fires once, at the start offset
    #[default]
    Unset,

    /// Fires every `p` timesteps from the start offset
    IntegerPeriod(i64),

    /// Fires with this chance on each path, at the start offset
    Probability(f64),

    /// Fires with a per-cell chance broadcast over the whole grid
    ProbabilityGrid(ArrayD<f64>),

    /// Fires at each listed timestep
    ExplicitTimes(Vec<i64>),

    /// Fires at each listed timestep with its own chance
    ExplicitProbabilities(Vec<(i64, f64)>),
}

impl FrequencySpec {
    /// Build a probability grid from a shape and row-major values.
    ///
    /// # Errors
    /// [`InputConfigurationError::GridShapeMismatch`] when the value count
    /// does not match the shape.
    ///
    /// # Example
    /// ```
    /// use cashflow_simulator_core_rs::FrequencySpec;
    ///
    /// // one probability per path, shared by every timestep
    /// let spec = FrequencySpec::grid(&[1, 3], vec![1.0, 0.5, 0.0]).unwrap();
    /// assert!(FrequencySpec::grid(&[2, 3], vec![0.5]).is_err());
    /// # let _ = spec;
    /// ```
    pub fn grid(shape: &[usize], values: Vec<f64>) -> Result<Self, InputConfigurationError> {
        let len = values.len();
        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map(FrequencySpec::ProbabilityGrid)
            .map_err(|_| InputConfigurationError::GridShapeMismatch {
                shape: shape.to_vec(),
                values: len,
            })
    }

    /// Wrap an ndarray of any dimensionality as a probability grid.
    pub fn from_array<D: Dimension>(array: Array<f64, D>) -> Self {
        FrequencySpec::ProbabilityGrid(array.into_dyn())
    }

    /// Short human-readable description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            FrequencySpec::Unset => "unset".to_string(),
            FrequencySpec::IntegerPeriod(p) => format!("period {}", p),
            FrequencySpec::Probability(p) => format!("probability {}", p),
            FrequencySpec::ProbabilityGrid(grid) => format!("probability grid {:?}", grid.shape()),
            FrequencySpec::ExplicitTimes(times) => format!("{} explicit times", times.len()),
            FrequencySpec::ExplicitProbabilities(entries) => {
                format!("{} explicit probabilities", entries.len())
            }
        }
    }
}

/// Behavioural category of a transaction
///
/// Discrete or probabilistic, crossed with instantaneous, periodic or
/// aperiodic. Serialized as its short code, e.g. `"d_p"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "d_i")]
    DiscreteInstantaneous,
    #[serde(rename = "d_p")]
    DiscretePeriodic,
    #[serde(rename = "d_a")]
    DiscreteAperiodic,
    #[serde(rename = "p_i")]
    ProbabilisticInstantaneous,
    #[serde(rename = "p_p")]
    ProbabilisticPeriodic,
    #[serde(rename = "p_a")]
    ProbabilisticAperiodic,
}

impl TransactionType {
    pub const ALL: [TransactionType; 6] = [
        TransactionType::DiscreteInstantaneous,
        TransactionType::DiscretePeriodic,
        TransactionType::DiscreteAperiodic,
        TransactionType::ProbabilisticInstantaneous,
        TransactionType::ProbabilisticPeriodic,
        TransactionType::ProbabilisticAperiodic,
    ];

    /// Short code (`"d_i"`, `"p_p"`, ...)
    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::DiscreteInstantaneous => "d_i",
            TransactionType::DiscretePeriodic => "d_p",
            TransactionType::DiscreteAperiodic => "d_a",
            TransactionType::ProbabilisticInstantaneous => "p_i",
            TransactionType::ProbabilisticPeriodic => "p_p",
            TransactionType::ProbabilisticAperiodic => "p_a",
        }
    }

    /// Whether presence depends on random draws
    pub fn is_probabilistic(&self) -> bool {
        matches!(
            self,
            TransactionType::ProbabilisticInstantaneous
                | TransactionType::ProbabilisticPeriodic
                | TransactionType::ProbabilisticAperiodic
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TransactionType {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.code() == s)
            .ok_or_else(|| ClassificationError::UnknownTransactionType(s.to_string()))
    }
}

/// Assign a frequency spec its transaction type.
///
/// # Example
/// ```
/// use cashflow_simulator_core_rs::{classify, FrequencySpec, TransactionType};
///
/// assert_eq!(classify(&FrequencySpec::Unset), TransactionType::DiscreteInstantaneous);
/// assert_eq!(classify(&FrequencySpec::IntegerPeriod(2)), TransactionType::DiscretePeriodic);
/// assert_eq!(classify(&FrequencySpec::Probability(0.3)), TransactionType::ProbabilisticInstantaneous);
/// ```
pub fn classify(spec: &FrequencySpec) -> TransactionType {
    let tx_type = match spec {
        FrequencySpec::Unset => TransactionType::DiscreteInstantaneous,
        FrequencySpec::IntegerPeriod(_) => TransactionType::DiscretePeriodic,
        FrequencySpec::ExplicitTimes(_) => TransactionType::DiscreteAperiodic,
        FrequencySpec::Probability(_) => TransactionType::ProbabilisticInstantaneous,
        FrequencySpec::ProbabilityGrid(_) => TransactionType::ProbabilisticPeriodic,
        FrequencySpec::ExplicitProbabilities(_) => TransactionType::ProbabilisticAperiodic,
    };
    debug!(frequency = %spec.describe(), transaction_type = %tx_type, "classified frequency");
    tx_type
}

// ============================================================================
// JSON inference
// ============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GridRepr {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl TryFrom<Value> for FrequencySpec {
    type Error = ClassificationError;

    /// Infer a spec from a loose JSON value.
    ///
    /// `null` is unset, an integer is a period and a float is a probability.
    /// A flat array of integers lists firing times; a flat numeric array with
    /// at least one float lists one probability per timestep starting at 0;
    /// an array of `[timestep, probability]` pairs lists explicit
    /// probabilities, even when it would also read as a two-column grid; a nested
    /// rectangular numeric array (or `{"shape": .., "values": ..}`) is a
    /// probability grid.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match &value {
            Value::Null => Ok(FrequencySpec::Unset),
            Value::Number(n) => {
                if let Some(period) = n.as_i64() {
                    Ok(FrequencySpec::IntegerPeriod(period))
                } else if n.is_f64() {
                    // as_f64 is infallible for f64-backed numbers
                    Ok(FrequencySpec::Probability(n.as_f64().unwrap_or(f64::NAN)))
                } else {
                    Err(ClassificationError::UnsupportedValue(value.to_string()))
                }
            }
            Value::Array(items) => from_sequence(items),
            Value::Object(_) => {
                let repr: GridRepr = serde_json::from_value(value.clone())
                    .map_err(|_| ClassificationError::UnsupportedValue(value.to_string()))?;
                FrequencySpec::grid(&repr.shape, repr.values)
                    .map_err(|e| ClassificationError::InvalidGrid(e.to_string()))
            }
            Value::Bool(_) | Value::String(_) => {
                Err(ClassificationError::UnsupportedValue(value.to_string()))
            }
        }
    }
}

fn from_sequence(items: &[Value]) -> Result<FrequencySpec, ClassificationError> {
    if items.is_empty() {
        return Err(ClassificationError::EmptySequence);
    }

    if items.iter().all(is_integer) {
        let times = items.iter().filter_map(Value::as_i64).collect();
        return Ok(FrequencySpec::ExplicitTimes(times));
    }

    // 0 and 1 are valid probabilities, so integers may sit among the floats
    if items.iter().all(Value::is_number) && items.iter().any(Value::is_f64) {
        let entries = items
            .iter()
            .filter_map(Value::as_f64)
            .enumerate()
            .map(|(t, p)| (t as i64, p))
            .collect();
        return Ok(FrequencySpec::ExplicitProbabilities(entries));
    }

    if items.iter().all(Value::is_array) {
        if let Some(entries) = timed_pairs(items) {
            return Ok(FrequencySpec::ExplicitProbabilities(entries));
        }
        return nested_grid(items).map(FrequencySpec::ProbabilityGrid);
    }

    Err(ClassificationError::MixedSequence(
        Value::Array(items.to_vec()).to_string(),
    ))
}

fn is_integer(value: &Value) -> bool {
    value.is_i64()
}

/// `[[t, p], ...]` with an integer timestep `t` and any numeric `p`
fn timed_pairs(items: &[Value]) -> Option<Vec<(i64, f64)>> {
    items
        .iter()
        .map(|item| match item.as_array().map(Vec::as_slice) {
            Some([t, p]) if is_integer(t) && p.is_number() => Some((t.as_i64()?, p.as_f64()?)),
            _ => None,
        })
        .collect()
}

fn nested_grid(items: &[Value]) -> Result<ArrayD<f64>, ClassificationError> {
    let mut shape = vec![items.len()];
    let mut cursor = &items[0];
    while let Value::Array(inner) = cursor {
        match inner.first() {
            Some(first) => {
                shape.push(inner.len());
                cursor = first;
            }
            None => return Err(ClassificationError::EmptySequence),
        }
    }

    let mut values = Vec::with_capacity(shape.iter().product());
    for item in items {
        collect_leaves(item, &shape[1..], &mut values)?;
    }

    ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|_| ClassificationError::RaggedGrid)
}

fn collect_leaves(
    value: &Value,
    shape: &[usize],
    out: &mut Vec<f64>,
) -> Result<(), ClassificationError> {
    match (shape.split_first(), value) {
        (None, Value::Number(n)) => {
            let leaf = n
                .as_f64()
                .ok_or_else(|| ClassificationError::UnsupportedValue(n.to_string()))?;
            out.push(leaf);
            Ok(())
        }
        (Some((&len, rest)), Value::Array(items)) if items.len() == len => {
            for item in items {
                collect_leaves(item, rest, out)?;
            }
            Ok(())
        }
        (None, Value::Array(_)) | (Some(_), _) => Err(ClassificationError::RaggedGrid),
        (None, other) => Err(ClassificationError::UnsupportedValue(other.to_string())),
    }
}

impl TryFrom<&FrequencySpec> for Value {
    type Error = ClassificationError;

    /// Write a spec back in the shape [`FrequencySpec::try_from`] reads.
    ///
    /// Non-finite probabilities have no JSON form and are refused rather
    /// than written as `null`, which would read back as `Unset`.
    fn try_from(spec: &FrequencySpec) -> Result<Self, Self::Error> {
        let finite = |p: f64| {
            if p.is_finite() {
                Ok(p)
            } else {
                Err(ClassificationError::NonFiniteProbability(p))
            }
        };

        Ok(match spec {
            FrequencySpec::Unset => Value::Null,
            FrequencySpec::IntegerPeriod(p) => json!(p),
            FrequencySpec::Probability(p) => json!(finite(*p)?),
            FrequencySpec::ProbabilityGrid(grid) => {
                let values: Vec<f64> = grid.iter().map(|&p| finite(p)).collect::<Result<_, _>>()?;
                json!({ "shape": grid.shape(), "values": values })
            }
            FrequencySpec::ExplicitTimes(times) => json!(times),
            FrequencySpec::ExplicitProbabilities(entries) => Value::Array(
                entries
                    .iter()
                    .map(|&(t, p)| finite(p).map(|p| json!([t, p])))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl Serialize for FrequencySpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Value::try_from(self)
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}
