use crate::model::*;

use super::error::*;
use super::EngineError;

/// Outcome of a successful allocation: the slots to retire and the range to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Ids of same-owner slots absorbed into `range`, in store order.
    pub retired: Vec<u64>,
    pub range: TimeRange,
}

impl Allocation {
    pub fn is_merge(&self) -> bool {
        !self.retired.is_empty()
    }
}

/// Validate raw endpoints into a [`TimeRange`].
///
/// Checks run in a fixed order: presence of start, presence of end, format, ordering.
pub(crate) fn validate_range(
    start_raw: Option<&str>,
    end_raw: Option<&str>,
) -> Result<TimeRange, EngineError> {
    let start_raw = match start_raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Err(EngineError::InvalidRange(START_REQUIRED)),
    };
    let end_raw = match end_raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Err(EngineError::InvalidRange(END_REQUIRED)),
    };
    let (Some(start), Some(end)) = (parse_timestamp(start_raw), parse_timestamp(end_raw)) else {
        return Err(EngineError::InvalidRange(INVALID_FORMAT));
    };
    if end <= start {
        return Err(EngineError::InvalidRange(END_NOT_AFTER_START));
    }
    Ok(TimeRange::new(start, end))
}

/// Decide what inserting `candidate` for `owner` does to `existing`.
///
/// Any overlap with another owner's slot rejects the whole request. Every overlapping
/// same-owner slot is retired and folded into the result range, so a candidate that bridges
/// two disjoint slots absorbs both. Nothing is mutated here.
pub fn allocate(owner: &str, candidate: TimeRange, existing: &[Slot]) -> Result<Allocation, EngineError> {
    let mut retired = Vec::new();
    let mut range = candidate;

    for slot in existing {
        if !slot.range.overlaps(&candidate) {
            continue;
        }
        if slot.owner != owner {
            return Err(EngineError::Conflict(slot.id));
        }
        retired.push(slot.id);
        range = range.union(&slot.range);
    }

    Ok(Allocation { retired, range })
}
