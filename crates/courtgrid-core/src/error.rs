use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::{BlockId, BlockType};
use crate::court::CourtRef;
use crate::time::{TimeOfDay, TimeRange};

/// Errors that make an engine configuration unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid slot_minutes {0}: must be between 1 and 1440")]
    InvalidSlotMinutes(u16),

    #[error("Invalid day bounds: start {start} must be before end {end}")]
    InvalidDayBounds { start: TimeOfDay, end: TimeOfDay },

    #[error("Status precedence lists {0:?} more than once")]
    DuplicatePrecedence(BlockType),

    #[error("Status precedence is missing {0:?}")]
    MissingPrecedence(BlockType),

    #[error("Court {0} appears more than once in the catalog")]
    DuplicateCourt(CourtRef),
}

/// Rejections of malformed mutation input.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid interval {start}-{end}: start must be before end")]
    InvalidInterval { start: TimeOfDay, end: TimeOfDay },

    #[error("Interval {range} falls outside day bounds {day}")]
    OutOfDayBounds { range: TimeRange, day: TimeRange },

    #[error("Unknown court: {0}")]
    UnknownCourt(CourtRef),

    #[error("Template expands to no blocks")]
    EmptyTemplate,

    #[error("Resize changes neither start nor end")]
    EmptyResize,
}

/// Errors reported inside a mutation result.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MutationError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),
}

impl MutationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MutationError::BlockNotFound(_))
    }
}
