//! Error types for identity-number synthesis.
//!
//! Every failure the engine can produce is reported through [`Error`]. None
//! of them are retried by the caller: retrying is internal to the sampler
//! and the batch generator, which already spend their attempt budgets before
//! surfacing an error.
//!
//! ## Error Cases
//! - `Format`: raw input handed to the codec was malformed.
//! - `RangeExhausted`: a birth-year window produced no valid candidate within
//!   the attempt budget (typically an empty or future window).
//! - `BatchIncomplete`: a batch could not reach the requested number of
//!   unique identity numbers within the global attempt budget.
//! - `InvalidRequest`: the request parameters were rejected up front.
//! - `Cancelled`: the caller abandoned the request while it was running.

use crate::window::BirthYearWindow;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the synthesis engine.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Raw identity-number input violated the length or character rules.
    #[error("malformed identity number {input:?}: {reason}")]
    Format { input: String, reason: String },

    /// No candidate satisfied the birth-year window within the budget.
    #[error("no identity number born within {window} after {attempts} attempts")]
    RangeExhausted {
        window: BirthYearWindow,
        attempts: usize,
    },

    /// The batch fell short of the requested unique count.
    ///
    /// `failures` counts worker-level hard failures (for example malformed
    /// provider candidates) observed along the way.
    #[error(
        "batch incomplete: produced {produced} of {requested} unique identity numbers after {attempts} attempts ({failures} failures)"
    )]
    BatchIncomplete {
        requested: usize,
        produced: usize,
        attempts: usize,
        failures: usize,
    },

    /// The request was malformed before any generation started.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Generation was cancelled by the caller.
    #[error("generation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn format(input: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}
