//! Interval primitives shared by rail derivation and capacity aggregation.
//!
//! All ranges are half-open, so two ranges that merely touch do not overlap.

use courtgrid_core::{TimeOfDay, TimeRange};

pub use courtgrid_core::{court_day_key, diff_minutes};

/// Build the day range, returning `None` when `start >= end`.
pub fn day_range(start: TimeOfDay, end: TimeOfDay) -> Option<TimeRange> {
    TimeRange::checked(start, end).ok()
}

/// Truncate `range` to `day`; `None` if nothing is left.
pub fn clamp_to_day(range: &TimeRange, day: &TimeRange) -> Option<TimeRange> {
    overlap_range(range, day)
}

pub fn ranges_overlap(a: &TimeRange, b: &TimeRange) -> bool {
    a.start < b.end && b.start < a.end
}

/// The shared part of two ranges, if any.
pub fn overlap_range(a: &TimeRange, b: &TimeRange) -> Option<TimeRange> {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    if start < end {
        Some(TimeRange::new(start, end))
    } else {
        None
    }
}
