use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Minutes in a calendar day; the largest valid `TimeOfDay`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A calendar day with no time component.
pub type DayId = chrono::NaiveDate;

/// Minute-resolution offset from midnight.
///
/// Rendered and parsed as `HH:MM`. `24:00` is accepted so that a day range
/// can end at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    /// Build from an hour and minute pair.
    pub fn hm(hour: u16, minute: u16) -> Result<Self, ValidationError> {
        if minute >= 60 {
            return Err(ValidationError::InvalidTime(format!(
                "{:02}:{:02}",
                hour, minute
            )));
        }
        Self::from_minutes(hour.saturating_mul(60).saturating_add(minute))
    }

    /// Build from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Result<Self, ValidationError> {
        if minutes > MINUTES_PER_DAY {
            return Err(ValidationError::InvalidTime(format!("{} minutes", minutes)));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Add minutes, saturating at the end of the day.
    pub fn saturating_add(self, minutes: u16) -> Self {
        Self(self.0.saturating_add(minutes).min(MINUTES_PER_DAY))
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = h.parse().map_err(|_| invalid())?;
        let minute: u16 = m.parse().map_err(|_| invalid())?;
        Self::hm(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Half-open interval `[start, end)` within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    /// Construct a range without checking that `start < end`.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Construct a range, rejecting zero-length and inverted intervals.
    pub fn checked(start: TimeOfDay, end: TimeOfDay) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Length in minutes; zero for empty or inverted ranges.
    pub fn duration_minutes(&self) -> u32 {
        diff_minutes(self.start, self.end).max(0) as u32
    }

    /// Whether `t` lies in `[start, end)`.
    pub fn contains(&self, t: TimeOfDay) -> bool {
        self.start <= t && t < self.end
    }

    /// Whether `other` lies entirely inside this range.
    pub fn covers(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Signed minute difference `to - from`.
pub fn diff_minutes(from: TimeOfDay, to: TimeOfDay) -> i32 {
    i32::from(to.minutes()) - i32::from(from.minutes())
}
