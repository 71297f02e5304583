//! Courtgrid Rails - Rail derivation and capacity aggregation.
//!
//! Pure functions that turn canonical blocks into derived views: the
//! non-overlapping rail of one court-day, and venue-wide capacity curves
//! built from many rails.

pub mod capacity;
pub mod invariant;
pub mod rail;
pub mod range;
pub mod timeline;

pub use capacity::{
    calculate_capacity_stats, compare_capacity_curves, filter_capacity_curve,
    generate_capacity_curve, sample_capacity_curve, status_at, CapacityComparison,
    CapacityDelta, CapacityFilter, CapacityStats,
};
pub use invariant::{validate_segments, SegmentInvariantError};
pub use rail::{derive_rail_segments, merge_adjacent_segments, outranks, precedence_key};
pub use range::{clamp_to_day, day_range, overlap_range, ranges_overlap};
pub use timeline::FacilityDayTimeline;
