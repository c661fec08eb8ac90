// ABOUTME: Time slot interval rules shared by slot creation and booking
// ABOUTME: Half-open intervals, minimum lead time and maximum slot length
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, Utc};

use crate::constants::booking::MAX_SLOT_HOURS;
use crate::errors::{AppError, AppResult};

/// Validate a new slot interval
///
/// # Errors
///
/// Returns `InvalidInput` when the interval is empty or reversed,
/// `ValueOutOfRange` when it is longer than the maximum slot length or starts
/// earlier than `now + min_lead`
pub fn validate_interval(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    now: DateTime<Utc>,
    min_lead: Duration,
) -> AppResult<()> {
    if ends_at <= starts_at {
        return Err(AppError::invalid_input("Time slot must end after it starts"));
    }
    if ends_at - starts_at > Duration::hours(MAX_SLOT_HOURS) {
        return Err(AppError::out_of_range(format!(
            "Time slot cannot be longer than {MAX_SLOT_HOURS} hours"
        )));
    }
    if starts_at < now + min_lead {
        return Err(AppError::out_of_range("Time slot must start in the future"));
    }
    Ok(())
}

/// Whether two half-open intervals `[a_start, a_end)` and `[b_start, b_end)` intersect
#[must_use]
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Whether any two intervals in `intervals` intersect
#[must_use]
pub fn has_internal_overlap(intervals: &[(DateTime<Utc>, DateTime<Utc>)]) -> bool {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|(start, _)| *start);
    sorted
        .windows(2)
        .any(|pair| overlaps(pair[0].0, pair[0].1, pair[1].0, pair[1].1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000) + Duration::hours(hour)
    }

    #[test]
    fn test_adjacent_slots_do_not_overlap() {
        assert!(!overlaps(at(9), at(10), at(10), at(11)));
        assert!(overlaps(at(9), at(11), at(10), at(12)));
        assert!(overlaps(at(9), at(12), at(10), at(11)));
    }

    #[test]
    fn test_interval_validation() {
        let now = at(0);
        assert!(validate_interval(at(9), at(10), now, Duration::zero()).is_ok());
        assert!(validate_interval(at(10), at(10), now, Duration::zero()).is_err());
        assert!(validate_interval(at(1), at(20), now, Duration::zero()).is_err());
        assert!(validate_interval(at(1), at(2), now, Duration::hours(2)).is_err());
        assert!(validate_interval(at(-1), at(1), now, Duration::zero()).is_err());
    }

    #[test]
    fn test_bulk_overlap_detection() {
        assert!(!has_internal_overlap(&[(at(11), at(12)), (at(9), at(10))]));
        assert!(has_internal_overlap(&[(at(11), at(13)), (at(9), at(10)), (at(12), at(14))]));
    }
}
