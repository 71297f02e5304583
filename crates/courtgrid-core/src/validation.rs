use crate::config::EngineConfig;
use crate::court::{CourtCatalog, CourtRef};
use crate::error::ValidationError;
use crate::time::TimeRange;

/// Validator for block placements.
pub struct Validator;

impl Validator {
    /// Reject zero-length and inverted intervals.
    pub fn validate_interval(range: &TimeRange) -> Result<(), ValidationError> {
        if range.is_empty() {
            return Err(ValidationError::InvalidInterval {
                start: range.start,
                end: range.end,
            });
        }
        Ok(())
    }

    /// Interval must lie inside the configured day bounds.
    pub fn validate_within_day(range: &TimeRange, day: &TimeRange) -> Result<(), ValidationError> {
        if !day.covers(range) {
            return Err(ValidationError::OutOfDayBounds {
                range: *range,
                day: *day,
            });
        }
        Ok(())
    }

    /// Court must be part of the catalog.
    pub fn validate_court(court: &CourtRef, catalog: &CourtCatalog) -> Result<(), ValidationError> {
        if !catalog.contains(court) {
            return Err(ValidationError::UnknownCourt(court.clone()));
        }
        Ok(())
    }

    /// Validate a complete placement of a block.
    pub fn validate_placement(
        court: &CourtRef,
        range: &TimeRange,
        config: &EngineConfig,
        catalog: &CourtCatalog,
    ) -> Result<(), ValidationError> {
        Self::validate_interval(range)?;
        Self::validate_within_day(range, &config.day_range())?;
        Self::validate_court(court, catalog)?;
        Ok(())
    }
}
