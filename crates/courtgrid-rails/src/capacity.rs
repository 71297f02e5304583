//! Venue-wide capacity curves built from per-court rails.
//!
//! A curve is a step function: each point holds until the next one. Every
//! operation here evaluates that step function, so sampled and exact curves
//! can be mixed freely. Statistics integrate over the steps in whole
//! court-minutes rather than averaging samples.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use courtgrid_core::{
    BlockType, CapacityCurve, CapacityMode, CapacityPoint, CourtRef, DayId, RailSegment,
    TimeOfDay, TimeRange,
};

use crate::range::overlap_range;

/// Status of a rail at `t`. Instants not covered by the rail count as available.
pub fn status_at(rail: &[RailSegment], t: TimeOfDay) -> BlockType {
    let idx = rail.partition_point(|s| s.end <= t);
    match rail.get(idx) {
        Some(segment) if segment.start <= t => segment.status,
        _ => BlockType::Available,
    }
}

/// Build a capacity curve for one day from each court's rail.
///
/// The total court count is the number of rails supplied.
pub fn generate_capacity_curve(
    day: DayId,
    rails: &BTreeMap<CourtRef, Vec<RailSegment>>,
    range: &TimeRange,
    mode: CapacityMode,
    slot_minutes: u16,
) -> CapacityCurve {
    let instants: Vec<TimeOfDay> = match mode {
        CapacityMode::Exact => {
            let mut set: BTreeSet<TimeOfDay> = rails
                .values()
                .flatten()
                .map(|s| s.start)
                .filter(|t| range.contains(*t))
                .collect();
            set.insert(range.start);
            set.into_iter().collect()
        }
        CapacityMode::Sampled => sample_grid(range, slot_minutes),
    };

    let points = instants
        .into_iter()
        .map(|t| {
            let mut counts: BTreeMap<BlockType, u32> = BTreeMap::new();
            for rail in rails.values() {
                *counts.entry(status_at(rail, t)).or_default() += 1;
            }
            CapacityPoint::from_status_counts(t, counts)
        })
        .collect();

    CapacityCurve {
        day,
        range: *range,
        mode,
        total_courts: rails.len() as u32,
        points,
    }
}

fn sample_grid(range: &TimeRange, slot_minutes: u16) -> Vec<TimeOfDay> {
    let step = slot_minutes.max(1);
    let mut instants = Vec::new();
    let mut t = range.start;
    while t < range.end {
        instants.push(t);
        t = t.saturating_add(step);
    }
    instants
}

/// Resample a curve onto a fixed grid, e.g. an exact curve for display.
pub fn sample_capacity_curve(curve: &CapacityCurve, slot_minutes: u16) -> CapacityCurve {
    let points = sample_grid(&curve.range, slot_minutes)
        .into_iter()
        .filter_map(|t| curve.point_at(t).map(|p| p.at(t)))
        .collect();

    CapacityCurve {
        mode: CapacityMode::Sampled,
        points,
        ..curve.clone()
    }
}

/// Summary of a day's capacity.
///
/// Court-minute totals are exact integers; ratios are derived from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CapacityStats {
    pub total_courts: u32,
    pub covered_minutes: u32,
    pub peak_hard_blocked: u32,
    pub peak_hard_blocked_at: Option<TimeOfDay>,
    pub peak_available: u32,
    pub peak_available_at: Option<TimeOfDay>,
    pub min_available: u32,
    pub min_available_at: Option<TimeOfDay>,
    pub available_court_minutes: u64,
    pub soft_blocked_court_minutes: u64,
    pub hard_blocked_court_minutes: u64,
}

impl CapacityStats {
    pub fn total_court_minutes(&self) -> u64 {
        self.available_court_minutes + self.blocked_court_minutes()
    }

    pub fn blocked_court_minutes(&self) -> u64 {
        self.soft_blocked_court_minutes + self.hard_blocked_court_minutes
    }

    /// Mean number of available courts over the covered minutes.
    pub fn average_available(&self) -> f64 {
        if self.covered_minutes == 0 {
            return 0.0;
        }
        self.available_court_minutes as f64 / f64::from(self.covered_minutes)
    }

    /// Share of court time that is blocked, in `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        let total = self.total_court_minutes();
        if total == 0 {
            return 0.0;
        }
        self.blocked_court_minutes() as f64 / total as f64
    }
}

/// Integrate a curve into summary statistics.
///
/// Peaks and minimums report the earliest instant they occur at.
pub fn calculate_capacity_stats(curve: &CapacityCurve) -> CapacityStats {
    let mut stats = CapacityStats {
        total_courts: curve.total_courts,
        ..CapacityStats::default()
    };

    for (i, point) in curve.points.iter().enumerate() {
        let duration = TimeRange::new(point.time, curve.point_end(i)).duration_minutes();
        let minutes = u64::from(duration);

        stats.covered_minutes += duration;
        stats.available_court_minutes += u64::from(point.available) * minutes;
        stats.soft_blocked_court_minutes += u64::from(point.soft_blocked) * minutes;
        stats.hard_blocked_court_minutes += u64::from(point.hard_blocked) * minutes;

        if stats.peak_hard_blocked_at.is_none() || point.hard_blocked > stats.peak_hard_blocked {
            stats.peak_hard_blocked = point.hard_blocked;
            stats.peak_hard_blocked_at = Some(point.time);
        }
        if stats.peak_available_at.is_none() || point.available > stats.peak_available {
            stats.peak_available = point.available;
            stats.peak_available_at = Some(point.time);
        }
        if stats.min_available_at.is_none() || point.available < stats.min_available {
            stats.min_available = point.available;
            stats.min_available_at = Some(point.time);
        }
    }

    stats
}

/// Change in counts at one instant between two curves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityDelta {
    pub time: TimeOfDay,
    pub available: i64,
    pub soft_blocked: i64,
    pub hard_blocked: i64,
}

impl CapacityDelta {
    pub fn is_zero(&self) -> bool {
        self.available == 0 && self.soft_blocked == 0 && self.hard_blocked == 0
    }
}

/// Instant-by-instant difference `after - before`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapacityComparison {
    pub deltas: Vec<CapacityDelta>,
}

impl CapacityComparison {
    pub fn has_changes(&self) -> bool {
        self.deltas.iter().any(|d| !d.is_zero())
    }

    /// Only the instants where something changed.
    pub fn changes(&self) -> impl Iterator<Item = &CapacityDelta> {
        self.deltas.iter().filter(|d| !d.is_zero())
    }
}

/// Compare two curves at every instant either of them has a point.
///
/// An instant outside one curve's range counts as zero courts there.
pub fn compare_capacity_curves(before: &CapacityCurve, after: &CapacityCurve) -> CapacityComparison {
    let instants: BTreeSet<TimeOfDay> = before
        .points
        .iter()
        .chain(after.points.iter())
        .map(|p| p.time)
        .collect();

    let counts = |curve: &CapacityCurve, t: TimeOfDay| -> (i64, i64, i64) {
        curve
            .point_at(t)
            .map(|p| {
                (
                    i64::from(p.available),
                    i64::from(p.soft_blocked),
                    i64::from(p.hard_blocked),
                )
            })
            .unwrap_or((0, 0, 0))
    };

    let deltas = instants
        .into_iter()
        .map(|t| {
            let (a0, s0, h0) = counts(before, t);
            let (a1, s1, h1) = counts(after, t);
            CapacityDelta {
                time: t,
                available: a1 - a0,
                soft_blocked: s1 - s0,
                hard_blocked: h1 - h0,
            }
        })
        .collect();

    CapacityComparison { deltas }
}

/// Restriction applied by [`filter_capacity_curve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityFilter {
    /// Clip the curve to this window.
    pub window: Option<TimeRange>,
    /// Count only courts in one of these statuses.
    pub statuses: Option<Vec<BlockType>>,
}

/// Restrict a curve to a time window and/or a status subset.
///
/// Clipping inserts the step value in effect at the window start, so the
/// clipped curve still describes the whole window. A status subset keeps
/// every instant and zeroes the counts of the other statuses, so the result
/// is still a step function over the same range.
pub fn filter_capacity_curve(curve: &CapacityCurve, filter: &CapacityFilter) -> CapacityCurve {
    let mut filtered = curve.clone();

    if let Some(window) = &filter.window {
        match overlap_range(&curve.range, window) {
            Some(range) => {
                let mut points: Vec<CapacityPoint> = Vec::new();
                if let Some(first) = curve.point_at(range.start) {
                    points.push(first.at(range.start));
                }
                points.extend(
                    curve
                        .points
                        .iter()
                        .filter(|p| range.start < p.time && p.time < range.end)
                        .cloned(),
                );
                filtered.range = range;
                filtered.points = points;
            }
            None => {
                filtered.range = TimeRange::new(window.start, window.start);
                filtered.points.clear();
            }
        }
    }

    if let Some(statuses) = &filter.statuses {
        let mut points: Vec<CapacityPoint> = Vec::with_capacity(filtered.points.len());
        for point in &filtered.points {
            let counts = point
                .by_status
                .iter()
                .filter(|(status, _)| statuses.contains(status))
                .map(|(status, count)| (*status, *count))
                .collect();
            let kept = CapacityPoint::from_status_counts(point.time, counts);
            // Equal neighbours collapse into one step.
            if points.last().map(|p| p.by_status == kept.by_status) != Some(true) {
                points.push(kept);
            }
        }
        filtered.points = points;
    }

    filtered
}
