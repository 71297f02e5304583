use std::cmp::Reverse;
use std::collections::BTreeSet;

use courtgrid_core::{Block, BlockId, BlockType, RailSegment, StatusPrecedence, TimeRange};

use crate::invariant::validate_segments;
use crate::range::clamp_to_day;

/// Ordering key for picking a winner among overlapping blocks.
///
/// Smaller keys win: higher priority first, then higher type rank, then the
/// lower block id. The order is total, so the winner never depends on the
/// order blocks were supplied in.
pub type PrecedenceKey = (Reverse<u32>, Reverse<u32>, BlockId);

pub fn precedence_key(block: &Block, precedence: &StatusPrecedence) -> PrecedenceKey {
    (
        Reverse(block.priority),
        Reverse(precedence.rank(block.block_type)),
        block.id,
    )
}

/// Whether `a` beats `b` when both cover the same instant.
pub fn outranks(a: &Block, b: &Block, precedence: &StatusPrecedence) -> bool {
    precedence_key(a, precedence) < precedence_key(b, precedence)
}

/// Derive the rail for one court-day.
///
/// `blocks` must all belong to the same court-day. Portions outside `day`
/// are discarded. The result is sorted, contiguous, covers exactly `day`,
/// and never has two neighbours with the same status.
///
/// # Panics
///
/// Panics if the derived rail violates those invariants, or if `day` is
/// empty. Either case is a defect, not bad input.
pub fn derive_rail_segments<'a>(
    blocks: impl IntoIterator<Item = &'a Block>,
    day: &TimeRange,
    precedence: &StatusPrecedence,
) -> Vec<RailSegment> {
    assert!(!day.is_empty(), "cannot derive a rail for empty day {}", day);

    let clamped: Vec<(TimeRange, &Block)> = blocks
        .into_iter()
        .filter_map(|b| clamp_to_day(&b.range, day).map(|r| (r, b)))
        .collect();

    let mut breakpoints: Vec<_> = clamped
        .iter()
        .flat_map(|(r, _)| [r.start, r.end])
        .chain([day.start, day.end])
        .collect();
    breakpoints.sort_unstable();
    breakpoints.dedup();

    // Boundary events keyed by breakpoint index. All events at an instant
    // are applied before the active set is read.
    let mut starts: Vec<(usize, usize)> = Vec::with_capacity(clamped.len());
    let mut ends: Vec<(usize, usize)> = Vec::with_capacity(clamped.len());
    for (i, (r, _)) in clamped.iter().enumerate() {
        starts.push((breakpoints.partition_point(|t| *t < r.start), i));
        ends.push((breakpoints.partition_point(|t| *t < r.end), i));
    }
    starts.sort_unstable();
    ends.sort_unstable();

    let mut active: BTreeSet<(PrecedenceKey, usize)> = BTreeSet::new();
    let mut emitted = Vec::with_capacity(breakpoints.len().saturating_sub(1));
    let (mut si, mut ei) = (0, 0);

    for (bp, pair) in breakpoints.windows(2).enumerate() {
        while ei < ends.len() && ends[ei].0 == bp {
            let i = ends[ei].1;
            active.remove(&(precedence_key(clamped[i].1, precedence), i));
            ei += 1;
        }
        while si < starts.len() && starts[si].0 == bp {
            let i = starts[si].1;
            active.insert((precedence_key(clamped[i].1, precedence), i));
            si += 1;
        }

        let status = active
            .first()
            .map(|(_, i)| clamped[*i].1.block_type)
            .unwrap_or(BlockType::Available);
        let mut ids: Vec<BlockId> = active.iter().map(|(_, i)| clamped[*i].1.id).collect();
        ids.sort_unstable();
        ids.dedup();

        emitted.push(RailSegment {
            start: pair[0],
            end: pair[1],
            status,
            contributing_block_ids: ids,
        });
    }

    let rail = merge_adjacent_segments(emitted);
    if let Err(e) = validate_segments(&rail, day) {
        panic!("rail derivation produced an invalid rail for {}: {}", day, e);
    }
    tracing::trace!(
        "Derived {} segments from {} blocks over {}",
        rail.len(),
        clamped.len(),
        day
    );
    rail
}

/// Coalesce touching neighbours that share a status.
///
/// Contributing block ids of merged segments are unioned.
pub fn merge_adjacent_segments(segments: Vec<RailSegment>) -> Vec<RailSegment> {
    let mut merged: Vec<RailSegment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(prev) if prev.status == segment.status && prev.end == segment.start => {
                prev.end = segment.end;
                prev.contributing_block_ids
                    .extend(segment.contributing_block_ids);
                prev.contributing_block_ids.sort_unstable();
                prev.contributing_block_ids.dedup();
            }
            _ => merged.push(segment),
        }
    }
    merged
}
