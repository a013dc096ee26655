use crate::{
    checksum::{PAYLOAD_LEN, checksum, payload},
    time::calendar_age,
};
use chrono::{Datelike, NaiveDate};
use core::fmt;

/// Largest serial number; serials are always rendered with three digits.
pub const MAX_SERIAL: u16 = 999;

/// Age at which the short format switches from `-` to `+`.
pub const CENTENARIAN_AGE: i32 = 100;

/// The separator between birth date and serial in the short format.
///
/// It is not part of an [`IdentityNumber`]: it is a function of the holder's
/// age *at the time of formatting*, so it must be derived from "today" each
/// time a number is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `-`, the holder is younger than 100.
    Under100,
    /// `+`, the holder turns 100 or more this calendar year.
    AtOrOver100,
}

impl Delimiter {
    /// Picks the delimiter for a calendar-year age.
    pub const fn for_age(age: i32) -> Self {
        if age >= CENTENARIAN_AGE {
            Self::AtOrOver100
        } else {
            Self::Under100
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Self::Under100 => '-',
            Self::AtOrOver100 => '+',
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Under100),
            '+' => Some(Self::AtOrOver100),
            _ => None,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A synthetic Swedish personal identity number.
///
/// Holds a calendar-valid birth date with a full four-digit year, a serial in
/// `000..=999` and the check digit derived from both. The check digit cannot
/// be set independently: every constructor computes it, so
/// `check_digit() == checksum(payload())` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityNumber {
    birth_date: NaiveDate,
    serial: u16,
    check_digit: u8,
}

impl IdentityNumber {
    /// Creates an identity number for `birth_date` and `serial`.
    ///
    /// Returns `None` if the serial exceeds [`MAX_SERIAL`] or the year does
    /// not have exactly four digits.
    pub fn new(birth_date: NaiveDate, serial: u16) -> Option<Self> {
        if serial > MAX_SERIAL || !(1000..=9999).contains(&birth_date.year()) {
            return None;
        }
        let check_digit = checksum(&payload(
            birth_date.year(),
            birth_date.month(),
            birth_date.day(),
            serial,
        ));
        Some(Self {
            birth_date,
            serial,
            check_digit,
        })
    }

    /// Like [`Self::new`], also rejecting dates that do not exist
    /// (`1999-02-29`, month 13, ...).
    pub fn from_ymd(year: i32, month: u32, day: u32, serial: u16) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(|date| Self::new(date, serial))
    }

    pub const fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn birth_year(&self) -> i32 {
        self.birth_date.year()
    }

    pub fn birth_month(&self) -> u32 {
        self.birth_date.month()
    }

    pub fn birth_day(&self) -> u32 {
        self.birth_date.day()
    }

    pub const fn serial(&self) -> u16 {
        self.serial
    }

    pub const fn check_digit(&self) -> u8 {
        self.check_digit
    }

    /// The nine digits `YYMMDDSSS` the check digit is computed from.
    pub fn payload(&self) -> [u8; PAYLOAD_LEN] {
        payload(
            self.birth_year(),
            self.birth_month(),
            self.birth_day(),
            self.serial,
        )
    }

    /// Calendar-year age on `today`.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        calendar_age(self.birth_year(), today)
    }

    /// The short-format delimiter as of `today`.
    pub fn delimiter_on(&self, today: NaiveDate) -> Delimiter {
        Delimiter::for_age(self.age_on(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::verify;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn check_digit_is_derived() {
        let id = IdentityNumber::from_ymd(1950, 1, 1, 0).unwrap();
        assert_eq!(id.check_digit(), 7);
        assert!(verify(&id.payload(), id.check_digit()));
    }

    #[test]
    fn rejects_invalid_fields() {
        assert!(IdentityNumber::from_ymd(1999, 2, 29, 1).is_none());
        assert!(IdentityNumber::from_ymd(2000, 2, 29, 1).is_some());
        assert!(IdentityNumber::from_ymd(1990, 1, 1, 1000).is_none());
        assert!(IdentityNumber::from_ymd(999, 1, 1, 1).is_none());
    }

    #[test]
    fn delimiter_flips_at_one_hundred() {
        let today = date(2026, 10, 18);
        let hundred = IdentityNumber::from_ymd(1926, 12, 31, 1).unwrap();
        let ninety_nine = IdentityNumber::from_ymd(1927, 1, 1, 1).unwrap();
        assert_eq!(hundred.delimiter_on(today), Delimiter::AtOrOver100);
        assert_eq!(ninety_nine.delimiter_on(today), Delimiter::Under100);
    }

    #[test]
    fn delimiter_moves_with_today() {
        let id = IdentityNumber::from_ymd(1926, 6, 1, 1).unwrap();
        assert_eq!(id.delimiter_on(date(2025, 12, 31)), Delimiter::Under100);
        assert_eq!(id.delimiter_on(date(2026, 1, 1)), Delimiter::AtOrOver100);
    }

    #[test]
    fn delimiter_chars_round_trip() {
        for d in [Delimiter::Under100, Delimiter::AtOrOver100] {
            assert_eq!(Delimiter::from_char(d.as_char()), Some(d));
        }
        assert_eq!(Delimiter::from_char('x'), None);
    }
}
