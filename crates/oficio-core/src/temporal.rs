//! # UTC Timestamps
//!
//! `Timestamp` is a UTC instant truncated to whole seconds. Deadlines,
//! escalation times and audit records all use it, so every persisted instant
//! renders the same way: `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! Non-UTC inputs are rejected by [`Timestamp::parse()`]; there is no silent
//! offset conversion on the audit path.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// The instant at `time` UTC on `date`.
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self::from_utc(date.and_time(time).and_utc())
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp {
                input: s.to_string(),
                reason: "timestamp must use Z suffix (UTC only)".into(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The UTC calendar date of this instant.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Whole seconds from `self` until `later`. Negative when `later` is in
    /// the past relative to `self`.
    pub fn seconds_until(&self, later: &Timestamp) -> i64 {
        (later.0 - self.0).num_seconds()
    }

    /// Shift by a signed number of seconds. Saturates at the chrono range.
    pub fn plus_seconds(&self, secs: i64) -> Self {
        self.0
            .checked_add_signed(Duration::seconds(secs))
            .map(Self)
            .unwrap_or(*self)
    }

    /// Render as ISO 8601 with Z suffix (e.g. `2025-01-15T23:59:59Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
