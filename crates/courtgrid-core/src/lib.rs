//! Courtgrid Core - Domain types, validation, and change events.
//!
//! This crate contains the shared value types of the court availability
//! engine. It has no dependencies on other Courtgrid crates.

pub mod block;
pub mod config;
pub mod court;
pub mod error;
pub mod event;
pub mod segment;
pub mod time;
pub mod validation;

// Re-exports for convenience
pub use block::{Block, BlockId, BlockType, CapacityClass};
pub use config::{EngineConfig, StatusPrecedence};
pub use court::{court_day_key, CourtCatalog, CourtDayKey, CourtRef};
pub use error::{ConfigError, MutationError, ValidationError};
pub use event::{ChangeEvent, ChangeKind, Placement};
pub use segment::{CapacityCurve, CapacityMode, CapacityPoint, RailSegment};
pub use time::{diff_minutes, DayId, TimeOfDay, TimeRange, MINUTES_PER_DAY};
pub use validation::Validator;
