use thiserror::Error;

use courtgrid_core::{BlockType, RailSegment, TimeOfDay, TimeRange};

/// A rail that breaks the segment invariants.
///
/// Rail derivation never returns this to callers; it panics instead because
/// an invalid rail means the sweep itself is wrong.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentInvariantError {
    #[error("Rail is empty; expected coverage of {0}")]
    Empty(TimeRange),

    #[error("Rail starts at {found}, expected day start {expected}")]
    WrongStart { expected: TimeOfDay, found: TimeOfDay },

    #[error("Rail ends at {found}, expected day end {expected}")]
    WrongEnd { expected: TimeOfDay, found: TimeOfDay },

    #[error("Segment {index} is empty or inverted: {start}-{end}")]
    EmptySegment {
        index: usize,
        start: TimeOfDay,
        end: TimeOfDay,
    },

    #[error("Gap or overlap between segment {index} ending {end} and next starting {next_start}")]
    NotContiguous {
        index: usize,
        end: TimeOfDay,
        next_start: TimeOfDay,
    },

    #[error("Segment {index} and its successor share status {status:?} and should be merged")]
    UnmergedNeighbours { index: usize, status: BlockType },

    #[error("Segment {index} lists contributing blocks out of order or twice")]
    UnsortedContributors { index: usize },
}

/// Check that `segments` is a sorted, contiguous, fully-merged cover of `day`.
pub fn validate_segments(
    segments: &[RailSegment],
    day: &TimeRange,
) -> Result<(), SegmentInvariantError> {
    let (first, last) = match (segments.first(), segments.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SegmentInvariantError::Empty(*day)),
    };

    if first.start != day.start {
        return Err(SegmentInvariantError::WrongStart {
            expected: day.start,
            found: first.start,
        });
    }
    if last.end != day.end {
        return Err(SegmentInvariantError::WrongEnd {
            expected: day.end,
            found: last.end,
        });
    }

    for (index, segment) in segments.iter().enumerate() {
        if segment.start >= segment.end {
            return Err(SegmentInvariantError::EmptySegment {
                index,
                start: segment.start,
                end: segment.end,
            });
        }
        if segment
            .contributing_block_ids
            .windows(2)
            .any(|w| w[0] >= w[1])
        {
            return Err(SegmentInvariantError::UnsortedContributors { index });
        }
    }

    for (index, pair) in segments.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        if a.end != b.start {
            return Err(SegmentInvariantError::NotContiguous {
                index,
                end: a.end,
                next_start: b.start,
            });
        }
        if a.status == b.status {
            return Err(SegmentInvariantError::UnmergedNeighbours {
                index,
                status: a.status,
            });
        }
    }

    Ok(())
}
