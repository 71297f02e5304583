//! Courtgrid Engine - The temporal grid engine.
//!
//! Owns the canonical block collection of a venue, validates and commits
//! mutations, caches derived rails per court-day, previews mutations without
//! committing them, and notifies subscribers after each commit.

pub mod cache;
pub mod engine;
pub mod mutation;
mod planner;
pub mod store;
pub mod subscribers;

pub use cache::RailCache;
pub use engine::{CapacityOptions, Engine};
pub use mutation::{
    ApplyBlockOptions, ConflictReport, DayPattern, MoveBlockOptions, Mutation, MutationResult,
    ResizeBlockOptions, SimulationResult, TemplateOptions,
};
pub use store::BlockStore;
pub use subscribers::{SubscriptionId, Subscribers};

pub use courtgrid_core::{
    Block, BlockId, BlockType, CapacityCurve, CapacityMode, CapacityPoint, ChangeEvent,
    ChangeKind, ConfigError, CourtCatalog, CourtDayKey, CourtRef, DayId, EngineConfig,
    MutationError, RailSegment, StatusPrecedence, TimeOfDay, TimeRange, ValidationError,
};
pub use courtgrid_rails::{CapacityStats, FacilityDayTimeline};
