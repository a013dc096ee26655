//! Age-constrained rejection sampling of identity numbers.
//!
//! A [`Sampler`] draws one [`IdentityNumber`] whose birth year lies strictly
//! inside a [`BirthYearWindow`]. Candidates come from a
//! [`PersonAttributeProvider`] when it has one to offer, otherwise they are
//! synthesized directly from the window. Candidates outside the window are
//! discarded and redrawn, up to a per-call attempt budget.

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    codec::decode,
    error::{Error, Result},
    id::{IdentityNumber, MAX_SERIAL},
    provider::{PersonAttributeProvider, Synthetic},
    time::days_in_month,
    window::{BirthYearWindow, MAX_AGE},
};
use chrono::{Datelike, NaiveDate};
use rand::Rng;

/// Lower bound on the per-call draw budget, however wide the window.
pub const MIN_SAMPLE_ATTEMPTS: usize = 16;

/// The outcome of a single draw.
///
/// Mirrors a non-blocking generation step: either a candidate was accepted,
/// or it fell outside the window and the caller may draw again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    /// The candidate satisfies the window.
    Accepted {
        /// The accepted identity number.
        id: IdentityNumber,
    },
    /// The candidate was discarded.
    Rejected,
}

/// Draws identity numbers born inside a window.
///
/// Each sampler owns its provider; share nothing between threads and give
/// every worker its own sampler and random stream.
pub struct Sampler<P = Synthetic> {
    window: BirthYearWindow,
    today: NaiveDate,
    first_year: i32,
    last_year: i32,
    provider: P,
    max_attempts: usize,
}

impl Sampler<Synthetic> {
    /// A pure-synthesis sampler.
    ///
    /// # Errors
    ///
    /// See [`Sampler::with_provider`].
    pub fn new(window: BirthYearWindow, today: NaiveDate) -> Result<Self> {
        Self::with_provider(window, today, Synthetic)
    }
}

impl<P: PersonAttributeProvider> Sampler<P> {
    /// Creates a sampler that asks `provider` for candidates first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RangeExhausted`] (with zero attempts) when no birth
    /// year in `window` is representable on `today`: the window is empty,
    /// lies in the future, or is older than [`MAX_AGE`].
    pub fn with_provider(window: BirthYearWindow, today: NaiveDate, provider: P) -> Result<Self> {
        let (first_year, last_year) = window
            .representable_years(today)
            .ok_or(Error::RangeExhausted {
                window,
                attempts: 0,
            })?;
        let years = (last_year - first_year + 1) as usize;
        Ok(Self {
            window,
            today,
            first_year,
            last_year,
            provider,
            max_attempts: default_attempts(years),
        })
    }

    /// Overrides the per-call draw budget used by [`Self::sample`].
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub const fn window(&self) -> BirthYearWindow {
        self.window
    }

    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Draws until a candidate is accepted or the budget runs out.
    ///
    /// # Errors
    ///
    /// - [`Error::Format`] if the provider hands over a malformed candidate.
    /// - [`Error::RangeExhausted`] if every draw within the budget was
    ///   rejected.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, rng), fields(window = %self.window)))]
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<IdentityNumber> {
        for _ in 0..self.max_attempts {
            if let SampleStatus::Accepted { id } = self.try_draw(rng)? {
                return Ok(id);
            }
        }
        Err(Error::RangeExhausted {
            window: self.window,
            attempts: self.max_attempts,
        })
    }

    /// Performs exactly one draw.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] if the provider hands over a malformed candidate.
    pub fn try_draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SampleStatus> {
        let candidate = match self.provider.raw_identity_number() {
            Some(raw) => decode(&raw, None, self.today)?,
            None => match self.synthesize(rng) {
                Some(id) => id,
                None => return Ok(SampleStatus::Rejected),
            },
        };
        Ok(self.screen(candidate))
    }

    /// Synthesizes a candidate born in a representable year of the window.
    ///
    /// Picks an age uniformly, then a month, then a day valid for that
    /// month, then a serial. Dates after `today` are never produced.
    pub fn synthesize<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<IdentityNumber> {
        let current_year = self.today.year();
        let age = rng.random_range(current_year - self.last_year..=current_year - self.first_year);
        let year = current_year - age;

        let max_month = if year == current_year {
            self.today.month()
        } else {
            12
        };
        let month = rng.random_range(1..=max_month);

        let max_day = if year == current_year && month == self.today.month() {
            self.today.day()
        } else {
            days_in_month(year, month)
        };
        let day = rng.random_range(1..=max_day);
        let serial = rng.random_range(0..=MAX_SERIAL);

        IdentityNumber::from_ymd(year, month, day, serial)
    }

    fn screen(&self, candidate: IdentityNumber) -> SampleStatus {
        if self.window.contains(candidate.birth_year()) && candidate.birth_date() <= self.today {
            SampleStatus::Accepted { id: candidate }
        } else {
            SampleStatus::Rejected
        }
    }
}

/// Per-call draw budget for a window spanning `years` representable years.
///
/// Scales inversely with the window so that a provider spread over the whole
/// representable range still hits a one-year window with high probability.
pub const fn default_attempts(years: usize) -> usize {
    let span = MAX_AGE as usize + 1;
    let years = if years == 0 { 1 } else { years };
    let attempts = 10 * span.div_ceil(years);
    if attempts < MIN_SAMPLE_ATTEMPTS {
        MIN_SAMPLE_ATTEMPTS
    } else {
        attempts
    }
}
