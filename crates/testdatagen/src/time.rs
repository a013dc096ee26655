use chrono::{Datelike, Local, NaiveDate};

/// A source of "today" used for century and age resolution.
///
/// This abstraction lets you plug in the real calendar or a pinned date in
/// tests, so that delimiter selection and century inference are
/// deterministic.
///
/// # Example
///
/// ```
/// use testdatagen::{DateSource, NaiveDate};
///
/// struct NewYear;
/// impl DateSource for NewYear {
///     fn today(&self) -> NaiveDate {
///         NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
///     }
/// }
///
/// assert_eq!(NewYear.today().to_string(), "2026-01-01");
/// ```
pub trait DateSource {
    /// Returns the current calendar date.
    fn today(&self) -> NaiveDate;
}

impl<D: DateSource + ?Sized> DateSource for &D {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Reads the local wall-clock date on every call.
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemDate;

impl DateSource for SystemDate {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedDate(pub NaiveDate);

impl FixedDate {
    /// Pins `year-month-day`, or `None` if that is not a calendar date.
    pub fn ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }
}

impl DateSource for FixedDate {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Number of days in `month` of `year`, leap-year aware. Returns 0 for a month
/// outside `1..=12`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map_or(31, |next| next.signed_duration_since(first).num_days() as u32)
}

/// Whole calendar years between `birth_year` and `today`, ignoring month and
/// day.
pub fn calendar_age(birth_year: i32, today: NaiveDate) -> i32 {
    today.year() - birth_year
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_is_leap_aware() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 13), 0);
        assert_eq!(days_in_month(2025, 0), 0);
    }

    #[test]
    fn fixed_date_is_stable() {
        let date = FixedDate::ymd(2026, 10, 18).unwrap();
        assert_eq!(date.today(), date.today());
        assert!(FixedDate::ymd(2026, 2, 30).is_none());
    }

    #[test]
    fn calendar_age_ignores_day_of_year() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(calendar_age(1926, today), 100);
        assert_eq!(calendar_age(1927, today), 99);
        assert_eq!(calendar_age(2026, today), 0);
    }
}
