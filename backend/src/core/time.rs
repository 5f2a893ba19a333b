//! Timestamp normalization
//!
//! Transactions may carry a calendar anchor for their start offset. Inputs
//! arrive in several shapes (full datetimes, bare dates, loose field maps)
//! and are normalized into a single [`TimeStamp`] record. Fields the input
//! does not carry are filled with [`TimeStamp::UNSET`] rather than rejected.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Canonical calendar record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeStamp {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl TimeStamp {
    /// Sentinel for a field the input did not specify
    pub const UNSET: i32 = -1;

    /// Stamp with every field unset
    pub const fn unset() -> Self {
        Self {
            year: Self::UNSET,
            month: Self::UNSET,
            day: Self::UNSET,
            hour: Self::UNSET,
            minute: Self::UNSET,
            second: Self::UNSET,
        }
    }
}

/// Raw time inputs accepted by [`normalize`]
///
/// Deserializes from `"YYYY-MM-DDTHH:MM:SS"`, `"YYYY-MM-DD"`, or an object
/// of calendar fields such as `{"year": 2020, "day": 18}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Fields(BTreeMap<String, i64>),
    Stamp(TimeStamp),
}

/// Errors raised while normalizing a raw time
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimestampError {
    #[error("Unknown timestamp field '{0}'")]
    UnknownField(String),

    #[error("Timestamp field '{field}' value {value} is out of range")]
    FieldOutOfRange { field: String, value: i64 },
}

const FIELD_NAMES: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];

/// Normalize a raw time into a [`TimeStamp`]
///
/// # Example
/// ```
/// use cashflow_simulator_core_rs::core::time::{normalize, RawTime, TimeStamp};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2020, 11, 23).unwrap();
/// let stamp = normalize(&RawTime::Date(date)).unwrap();
/// assert_eq!(stamp.day, 23);
/// assert_eq!(stamp.hour, TimeStamp::UNSET);
/// ```
pub fn normalize(raw: &RawTime) -> Result<TimeStamp, TimestampError> {
    match raw {
        RawTime::DateTime(dt) => Ok(TimeStamp {
            year: dt.year(),
            month: dt.month() as i32,
            day: dt.day() as i32,
            hour: dt.hour() as i32,
            minute: dt.minute() as i32,
            second: dt.second() as i32,
        }),
        RawTime::Date(date) => Ok(TimeStamp {
            year: date.year(),
            month: date.month() as i32,
            day: date.day() as i32,
            ..TimeStamp::unset()
        }),
        RawTime::Fields(fields) => from_fields(fields),
        RawTime::Stamp(stamp) => Ok(*stamp),
    }
}

fn from_fields(fields: &BTreeMap<String, i64>) -> Result<TimeStamp, TimestampError> {
    if let Some(unknown) = fields.keys().find(|k| !FIELD_NAMES.contains(&k.as_str())) {
        return Err(TimestampError::UnknownField(unknown.clone()));
    }

    let get = |name: &str| -> Result<i32, TimestampError> {
        match fields.get(name) {
            None => Ok(TimeStamp::UNSET),
            Some(&value) => {
                i32::try_from(value).map_err(|_| TimestampError::FieldOutOfRange {
                    field: name.to_string(),
                    value,
                })
            }
        }
    };

    Ok(TimeStamp {
        year: get("year")?,
        month: get("month")?,
        day: get("day")?,
        hour: get("hour")?,
        minute: get("minute")?,
        second: get("second")?,
    })
}
