//! Short and long textual formats of an [`IdentityNumber`].
//!
//! | Format | Layout           | Example        |
//! |--------|------------------|----------------|
//! | short  | `YYMMDD±SSSC`    | `500101-0007`  |
//! | long   | `YYYYMMDDSSSC`   | `195001010007` |
//!
//! Encoding needs "today" to choose the delimiter. Decoding a short number
//! needs it to guess the century, see [`infer_century`].

use crate::{
    checksum::{PAYLOAD_LEN, verify},
    error::{Error, Result},
    id::{Delimiter, IdentityNumber},
};
use chrono::{Datelike, NaiveDate};

/// Digits in the short format, delimiter excluded.
pub const SHORT_DIGITS: usize = 10;

/// Digits in the long format.
pub const LONG_DIGITS: usize = 12;

/// Both renderings of one identity number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FormattedNumber {
    /// `YYMMDD±SSSC`
    pub short: String,
    /// `YYYYMMDDSSSC`
    pub long: String,
}

/// Renders `id` in both formats as of `today`.
pub fn encode(id: &IdentityNumber, today: NaiveDate) -> FormattedNumber {
    FormattedNumber {
        short: short_format(id, today),
        long: long_format(id),
    }
}

/// `YYMMDD±SSSC`, with the delimiter resolved from the holder's age on
/// `today`.
pub fn short_format(id: &IdentityNumber, today: NaiveDate) -> String {
    format!(
        "{:02}{:02}{:02}{}{:03}{}",
        id.birth_year().rem_euclid(100),
        id.birth_month(),
        id.birth_day(),
        id.delimiter_on(today).as_char(),
        id.serial(),
        id.check_digit()
    )
}

/// `YYYYMMDDSSSC`. Never contains a delimiter.
pub fn long_format(id: &IdentityNumber) -> String {
    format!(
        "{:04}{:02}{:02}{:03}{}",
        id.birth_year(),
        id.birth_month(),
        id.birth_day(),
        id.serial(),
        id.check_digit()
    )
}

/// Resolves a two-digit year to a full year relative to `today`.
///
/// A `yy` up to the current two-digit year is placed in the current century,
/// anything above it in the previous one. The rule cannot tell a newborn from
/// a centenarian sharing the same `yy`; it is kept as is.
pub fn infer_century(yy: u32, today: NaiveDate) -> i32 {
    let current_yy = today.year().rem_euclid(100) as u32;
    let current_century = today.year().div_euclid(100);
    let century = if yy <= current_yy {
        current_century
    } else {
        current_century - 1
    };
    century * 100 + yy as i32
}

/// Parses a raw identity number in short or long form.
///
/// Accepts 10 or 12 digits with at most one `-`/`+` delimiter in front of the
/// last four digits. The delimiter, whether embedded or given as
/// `delimiter_hint`, is validated but takes no part in century resolution;
/// short input always goes through [`infer_century`]. An embedded delimiter
/// that contradicts the hint is rejected.
///
/// # Errors
///
/// [`Error::Format`] on a bad length, a foreign character, a date that does
/// not exist or a check digit that does not match.
pub fn decode(
    raw: &str,
    delimiter_hint: Option<Delimiter>,
    today: NaiveDate,
) -> Result<IdentityNumber> {
    let trimmed = raw.trim();
    let (digits, embedded) = split_delimiter(trimmed)?;

    if let (Some(embedded), Some(hint)) = (embedded, delimiter_hint) {
        if embedded != hint {
            return Err(Error::format(
                raw,
                format!("delimiter {embedded} contradicts expected {hint}"),
            ));
        }
    }

    let (year, rest) = match digits.len() {
        SHORT_DIGITS => (infer_century(number(&digits[..2]), today), &digits[2..]),
        LONG_DIGITS => (number(&digits[..4]) as i32, &digits[4..]),
        len => {
            return Err(Error::format(
                raw,
                format!("expected {SHORT_DIGITS} or {LONG_DIGITS} digits, found {len}"),
            ));
        }
    };

    let month = number(&rest[..2]);
    let day = number(&rest[2..4]);
    let serial = number(&rest[4..7]) as u16;
    let check = rest[7];

    let id = IdentityNumber::from_ymd(year, month, day, serial)
        .ok_or_else(|| Error::format(raw, format!("{year:04}-{month:02}-{day:02} is not a date")))?;

    let payload: [u8; PAYLOAD_LEN] = id.payload();
    if !verify(&payload, check) {
        return Err(Error::format(
            raw,
            format!("check digit {check} does not match {}", id.check_digit()),
        ));
    }
    Ok(id)
}

/// Normalizes an externally sourced number into both formats.
///
/// # Errors
///
/// See [`decode`].
pub fn format_single(raw: &str, today: NaiveDate) -> Result<FormattedNumber> {
    decode(raw, None, today).map(|id| encode(&id, today))
}

/// Splits `raw` into its decimal digits and the optional delimiter.
fn split_delimiter(raw: &str) -> Result<(Vec<u8>, Option<Delimiter>)> {
    let mut digits = Vec::with_capacity(LONG_DIGITS);
    let mut delimiter = None;
    for (pos, c) in raw.chars().enumerate() {
        if let Some(d) = c.to_digit(10) {
            digits.push(d as u8);
            continue;
        }
        match Delimiter::from_char(c) {
            Some(found) if delimiter.is_none() && raw.len() >= 5 && pos == raw.len() - 5 => {
                delimiter = Some(found);
            }
            Some(_) => return Err(Error::format(raw, format!("misplaced delimiter at {pos}"))),
            None => return Err(Error::format(raw, format!("unexpected character {c:?}"))),
        }
    }
    Ok((digits, delimiter))
}

fn number(digits: &[u8]) -> u32 {
    digits.iter().fold(0, |acc, d| acc * 10 + u32::from(*d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn encodes_both_formats() {
        let id = IdentityNumber::from_ymd(1950, 1, 1, 0).unwrap();
        let formatted = encode(&id, today());
        assert_eq!(formatted.short, "500101-0007");
        assert_eq!(formatted.long, "195001010007");
    }

    #[test]
    fn short_format_uses_plus_from_one_hundred() {
        let hundred = IdentityNumber::from_ymd(1926, 3, 4, 123).unwrap();
        let ninety_nine = IdentityNumber::from_ymd(1927, 3, 4, 123).unwrap();
        assert_eq!(&short_format(&hundred, today())[6..7], "+");
        assert_eq!(&short_format(&ninety_nine, today())[6..7], "-");
        assert!(!long_format(&hundred).contains(['+', '-']));
    }

    #[test]
    fn century_inference() {
        assert_eq!(infer_century(26, today()), 2026);
        assert_eq!(infer_century(0, today()), 2000);
        assert_eq!(infer_century(27, today()), 1927);
        assert_eq!(infer_century(99, today()), 1999);
    }

    #[test]
    fn century_boundary_is_ambiguous() {
        // Born 1926 is 100 years old, but `26` resolves to this century.
        let centenarian = IdentityNumber::from_ymd(1926, 1, 2, 5).unwrap();
        let short = short_format(&centenarian, today());
        let decoded = decode(&short, None, today()).unwrap();
        assert_eq!(decoded.birth_year(), 2026);
    }

    #[test]
    fn decodes_short_and_long() {
        let short = decode("811218-9876", None, today()).unwrap();
        assert_eq!(short.birth_year(), 1981);
        assert_eq!(short.birth_month(), 12);
        assert_eq!(short.birth_day(), 18);
        assert_eq!(short.serial(), 987);
        assert_eq!(short.check_digit(), 6);

        let long = decode("198112189876", None, today()).unwrap();
        assert_eq!(long, short);
        let bare = decode("8112189876", None, today()).unwrap();
        assert_eq!(bare, short);
    }

    #[test]
    fn long_input_keeps_its_century() {
        let id = decode("192601020056", None, today()).unwrap();
        assert_eq!(id.birth_year(), 1926);
    }

    #[test]
    fn rejects_bad_lengths() {
        for raw in ["", "81121", "811218-98", "81121898765", "1981121898765"] {
            assert!(
                matches!(decode(raw, None, today()), Err(Error::Format { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_foreign_characters_and_misplaced_delimiters() {
        for raw in ["8112a8-9876", "81121-89876", "811218--9876", "811218 9876"] {
            assert!(matches!(
                decode(raw, None, today()),
                Err(Error::Format { .. })
            ));
        }
    }

    #[test]
    fn rejects_bad_check_digit_and_date() {
        assert!(matches!(
            decode("811218-9875", None, today()),
            Err(Error::Format { .. })
        ));
        assert!(matches!(
            decode("810230-9876", None, today()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn rejects_contradicting_hint() {
        assert!(decode("811218-9876", Some(Delimiter::Under100), today()).is_ok());
        assert!(matches!(
            decode("811218-9876", Some(Delimiter::AtOrOver100), today()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn format_single_normalizes() {
        let formatted = format_single("8112189876", today()).unwrap();
        assert_eq!(formatted.short, "811218-9876");
        assert_eq!(formatted.long, "198112189876");
    }
}
