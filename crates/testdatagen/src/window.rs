use chrono::{Datelike, NaiveDate};
use core::fmt;

/// Oldest calendar-year age that the short format can express: the `+`
/// delimiter covers 100 through 199.
pub const MAX_AGE: i32 = 199;

/// An open interval of birth years: `min_exclusive < year < max_exclusive`.
///
/// Both bounds are strict, matching how callers phrase requests ("born after
/// 1950 and before 2005").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BirthYearWindow {
    pub min_exclusive: i32,
    pub max_exclusive: i32,
}

impl BirthYearWindow {
    pub const fn new(min_exclusive: i32, max_exclusive: i32) -> Self {
        Self {
            min_exclusive,
            max_exclusive,
        }
    }

    /// Window for holders whose calendar-year age on `today` lies in
    /// `min_age..=max_age`.
    ///
    /// `from_ages(18, 69, 2026-..-..)` is `(1956, 2009)`. Equal ages leave
    /// exactly one birth year. Out-of-range ages saturate instead of
    /// overflowing.
    pub fn from_ages(min_age: i32, max_age: i32, today: NaiveDate) -> Self {
        let year = today.year();
        Self::new(
            year.saturating_sub(max_age).saturating_sub(1),
            year.saturating_sub(min_age).saturating_add(1),
        )
    }

    pub const fn contains(&self, year: i32) -> bool {
        self.min_exclusive < year && year < self.max_exclusive
    }

    /// Smallest year inside the window, if any.
    pub const fn first(&self) -> Option<i32> {
        if self.is_empty() {
            None
        } else {
            Some(self.min_exclusive + 1)
        }
    }

    /// Largest year inside the window, if any.
    pub const fn last(&self) -> Option<i32> {
        if self.is_empty() {
            None
        } else {
            Some(self.max_exclusive - 1)
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.max_exclusive.saturating_sub(self.min_exclusive) < 2
    }

    /// Number of birth years inside the window.
    pub const fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_exclusive as i64 - self.min_exclusive as i64 - 1) as usize
        }
    }

    /// The inclusive birth-year range that is both inside the window and
    /// representable on `today`: not in the future and no older than
    /// [`MAX_AGE`]. `None` when nothing remains.
    pub fn representable_years(&self, today: NaiveDate) -> Option<(i32, i32)> {
        let first = self.first()?.max(today.year() - MAX_AGE);
        let last = self.last()?.min(today.year());
        (first <= last).then_some((first, last))
    }
}

impl fmt::Display for BirthYearWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.min_exclusive, self.max_exclusive)
    }
}
