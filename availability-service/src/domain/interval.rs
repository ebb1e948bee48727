//! Inclusive-day interval math.
//!
//! All availability ranges are closed intervals of whole days; two ranges
//! that touch on the same day overlap. Comparisons happen at day resolution
//! only (`NaiveDate`), which sidesteps timezone and sub-day off-by-one bugs.

use chrono::NaiveDate;

/// Closed-interval overlap test. Symmetric in its two ranges.
pub fn overlaps(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Whether `day` falls inside the closed range `[start, end]`.
pub fn contains_day(start: NaiveDate, end: NaiveDate, day: NaiveDate) -> bool {
    start <= day && day <= end
}

/// Iterator over every day in `[start, end]`, inclusive and ascending.
///
/// Yields nothing when `start > end`. `Clone` makes it restartable.
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.last {
            current.succ_opt()
        } else {
            None
        };
        Some(current)
    }
}

/// Lazy sequence of every day in `[start, end]`. Finite: bounded by the
/// caller-supplied window, never by wall-clock state.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Days {
    Days {
        next: (start <= end).then_some(start),
        last: end,
    }
}
