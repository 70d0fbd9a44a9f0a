//! Inclusive datetime-range filtering of enqueue timestamps.

use crate::error::RangeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Check whether `timestamp` lies within `[from, to]`.
///
/// Both bounds are inclusive and an absent bound imposes no constraint. No
/// ordering is required between the bounds: `from > to` simply matches
/// nothing.
pub fn in_range(
    timestamp: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    if let Some(from) = from {
        if timestamp < from {
            return false;
        }
    }
    if let Some(to) = to {
        if timestamp > to {
            return false;
        }
    }
    true
}

/// Pair of optional bounds applied to enqueue times
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// Range with no bounds; matches every timestamp
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Parse RFC3339 bounds. Missing or empty strings leave the bound open.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, RangeError> {
        Ok(Self {
            from: parse_bound("from", from)?,
            to: parse_bound("to", to)?,
        })
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        in_range(timestamp, self.from, self.to)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

fn parse_bound(bound: &'static str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, RangeError> {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| Some(parsed.with_timezone(&Utc)))
        .map_err(|source| RangeError::InvalidBound {
            bound,
            value: raw.to_string(),
            source,
        })
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
