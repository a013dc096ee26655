//! Concurrent, uniqueness-preserving batch generation.
//!
//! [`BatchGenerator::generate`] splits a request for `count` identity numbers
//! into sub-batches, runs one [`Sampler`] per sub-batch on its own scoped
//! thread with its own random stream, and merges the results once every
//! worker has returned. No lock is held while sampling: the uniqueness set is
//! only touched by the merging thread after the join barrier.
//!
//! Because workers sample independently, two of them can produce the same
//! number. The merge drops those duplicates and tops up the shortfall with
//! sequential draws until `count` unique numbers exist or the global attempt
//! budget is spent.

mod worker;

#[cfg(test)]
mod tests;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    codec::{FormattedNumber, encode},
    error::{Error, Result},
    id::IdentityNumber,
    provider::{PersonAttributeProvider, Synthetic},
    sampler::Sampler,
    time::{DateSource, SystemDate},
    window::BirthYearWindow,
};
use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{collections::HashSet, num::NonZeroUsize, thread};
use tokio_util::sync::CancellationToken;
use worker::{WorkerReport, worker_loop};

/// Target sub-batch size used to decide how many workers to start.
pub const DEFAULT_BATCH_SIZE_HINT: usize = 100;

/// Sampler calls allowed per requested number, per worker and globally.
pub const DEFAULT_ATTEMPTS_PER_ITEM: usize = 10;

/// Tuning knobs for [`BatchGenerator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Roughly how many numbers each worker should produce.
    pub batch_size_hint: usize,
    /// Upper bound on workers. `0` means the machine's available
    /// parallelism.
    pub max_workers: usize,
    /// Sampler calls budgeted per requested number.
    pub attempts_per_item: usize,
    /// Base seed for the worker streams. `None` seeds from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size_hint: DEFAULT_BATCH_SIZE_HINT,
            max_workers: 0,
            attempts_per_item: DEFAULT_ATTEMPTS_PER_ITEM,
            seed: None,
        }
    }
}

impl BatchConfig {
    /// Resolves `max_workers`, substituting available parallelism for `0`.
    pub fn parallelism(&self) -> usize {
        if self.max_workers > 0 {
            return self.max_workers;
        }
        thread::available_parallelism().map_or(1, NonZeroUsize::get)
    }
}

/// One generated number and its renderings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BatchEntry {
    pub id: IdentityNumber,
    pub formatted: FormattedNumber,
}

/// The unique identity numbers produced for one request.
///
/// Order carries no meaning. Ownership passes to the caller.
#[derive(Clone, Debug)]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
    today: NaiveDate,
    attempts: usize,
    workers: usize,
}

impl BatchResult {
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<BatchEntry> {
        self.entries
    }

    /// The date the delimiters were resolved against.
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    /// Sampler calls spent, top-up included.
    pub const fn attempts(&self) -> usize {
        self.attempts
    }

    pub const fn workers(&self) -> usize {
        self.workers
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for BatchResult {
    type Item = BatchEntry;
    type IntoIter = std::vec::IntoIter<BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Number of workers for `count` items: one per `batch_size_hint` items,
/// at least one, at most `parallelism`.
pub fn worker_count(count: usize, batch_size_hint: usize, parallelism: usize) -> usize {
    let wanted = (count / batch_size_hint.max(1)).max(1);
    wanted.min(parallelism.max(1))
}

/// Splits `count` into `workers` near-equal parts. The remainder goes to the
/// earliest parts, so the parts always sum to `count`.
pub fn partition(count: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let base = count / workers;
    let remainder = count % workers;
    (0..workers)
        .map(|i| base + usize::from(i < remainder))
        .collect()
}

/// Generates batches of unique identity numbers.
///
/// `D` supplies "today" (fixed for the whole batch) and `P` supplies
/// candidates; every worker gets its own clone of `P`.
pub struct BatchGenerator<D = SystemDate, P = Synthetic> {
    config: BatchConfig,
    dates: D,
    provider: P,
}

impl BatchGenerator<SystemDate, Synthetic> {
    /// A pure-synthesis generator reading the system date.
    pub fn new(config: BatchConfig) -> Self {
        Self::with_sources(config, SystemDate, Synthetic)
    }
}

impl<D, P> BatchGenerator<D, P>
where
    D: DateSource,
    P: PersonAttributeProvider + Clone,
{
    pub const fn with_sources(config: BatchConfig, dates: D, provider: P) -> Self {
        Self {
            config,
            dates,
            provider,
        }
    }

    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Produces exactly `count` unique identity numbers born inside `window`.
    ///
    /// # Errors
    ///
    /// See [`Self::generate_with_cancel`].
    pub fn generate(&self, count: usize, window: BirthYearWindow) -> Result<BatchResult> {
        self.generate_with_cancel(count, window, &CancellationToken::new())
    }

    /// Like [`Self::generate`], stopping early once `cancel` fires.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if `count` is zero.
    /// - [`Error::RangeExhausted`] if the window holds no representable birth
    ///   year, or if not a single candidate could be drawn from it.
    /// - [`Error::BatchIncomplete`] if fewer than `count` unique numbers exist
    ///   when the global budget runs out.
    /// - [`Error::Cancelled`] if `cancel` fired before completion.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, cancel), fields(window = %window)))]
    pub fn generate_with_cancel(
        &self,
        count: usize,
        window: BirthYearWindow,
        cancel: &CancellationToken,
    ) -> Result<BatchResult> {
        if count == 0 {
            return Err(Error::InvalidRequest {
                reason: "count must be greater than 0".to_owned(),
            });
        }

        let today = self.dates.today();
        // Fails fast on empty or unrepresentable windows.
        let probe = Sampler::with_provider(window, today, self.provider.clone())?;
        let per_call = probe.max_attempts();

        let attempts_per_item = self.config.attempts_per_item.max(1);
        let global_budget = count.saturating_mul(attempts_per_item);
        let workers = worker_count(count, self.config.batch_size_hint, self.config.parallelism());
        let quotas = partition(count, workers);
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());

        #[cfg(feature = "tracing")]
        tracing::debug!("Generating {count} across {workers} workers: {quotas:?}");

        let reports = thread::scope(|scope| {
            let handles: Vec<_> = quotas
                .iter()
                .enumerate()
                .map(|(worker_id, &quota)| {
                    let sampler = Sampler::with_provider(window, today, self.provider.clone())
                        .map(|s| s.with_max_attempts(per_call));
                    let rng = worker_rng(seed, worker_id);
                    let budget = quota.saturating_mul(attempts_per_item);
                    scope.spawn(move || match sampler {
                        Ok(sampler) => worker_loop(worker_id, quota, budget, sampler, rng, cancel),
                        Err(e) => WorkerReport {
                            entries: Vec::new(),
                            attempts: 0,
                            failure: Some(e),
                        },
                    })
                })
                .collect();

            // Join barrier: nothing is merged until every worker is back.
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        });

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut merged = Merge::new(count);
        for report in reports {
            match report {
                Ok(report) => merged.absorb(report),
                Err(_panic) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Batch worker panicked");
                    merged.failures += 1;
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Merged {} unique of {count} after {} attempts ({} failures)",
            merged.entries.len(),
            merged.attempts,
            merged.failures
        );

        if merged.entries.len() < count {
            let mut sampler = probe.with_max_attempts(per_call);
            let mut rng = worker_rng(seed, workers);
            while merged.entries.len() < count && merged.attempts < global_budget {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                merged.attempts += 1;
                match sampler.sample(&mut rng) {
                    Ok(id) => merged.insert(BatchEntry {
                        formatted: encode(&id, today),
                        id,
                    }),
                    Err(e) => merged.record(e),
                }
            }
        }

        if merged.entries.len() < count {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Batch incomplete: {} of {count} after {} attempts",
                merged.entries.len(),
                merged.attempts
            );
            if merged.entries.is_empty() && merged.only_exhaustion() {
                return Err(Error::RangeExhausted {
                    window,
                    attempts: merged.attempts,
                });
            }
            return Err(Error::BatchIncomplete {
                requested: count,
                produced: merged.entries.len(),
                attempts: merged.attempts,
                failures: merged.failures,
            });
        }

        Ok(BatchResult {
            entries: merged.entries,
            today,
            attempts: merged.attempts,
            workers,
        })
    }

    /// Both renderings of `count` unique identity numbers.
    ///
    /// # Errors
    ///
    /// See [`Self::generate_with_cancel`].
    pub fn generate_formatted(
        &self,
        count: usize,
        window: BirthYearWindow,
    ) -> Result<Vec<FormattedNumber>> {
        self.generate(count, window)
            .map(|batch| batch.into_iter().map(|entry| entry.formatted).collect())
    }
}

/// Generates `count` unique numbers born strictly between `min_birth_year`
/// and `max_birth_year`, using the default configuration and today's date.
///
/// # Errors
///
/// See [`BatchGenerator::generate_with_cancel`].
pub fn generate_batch(
    count: usize,
    min_birth_year: i32,
    max_birth_year: i32,
) -> Result<Vec<FormattedNumber>> {
    BatchGenerator::new(BatchConfig::default())
        .generate_formatted(count, BirthYearWindow::new(min_birth_year, max_birth_year))
}

/// Independent stream `stream` derived from one base seed.
fn worker_rng(seed: u64, stream: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream as u64);
    rng
}

/// Single-writer aggregation state, used only after the join barrier.
struct Merge {
    target: usize,
    entries: Vec<BatchEntry>,
    seen: HashSet<String>,
    attempts: usize,
    failures: usize,
    exhausted: usize,
}

impl Merge {
    fn new(count: usize) -> Self {
        Self {
            target: count,
            entries: Vec::with_capacity(count),
            seen: HashSet::with_capacity(count),
            attempts: 0,
            failures: 0,
            exhausted: 0,
        }
    }

    fn absorb(&mut self, report: WorkerReport) {
        self.attempts += report.attempts;
        if let Some(e) = report.failure {
            self.record(e);
        }
        for entry in report.entries {
            self.insert(entry);
        }
    }

    fn insert(&mut self, entry: BatchEntry) {
        if self.entries.len() < self.target && self.seen.insert(entry.formatted.short.clone())
        {
            self.entries.push(entry);
        }
    }

    fn record(&mut self, error: Error) {
        match error {
            Error::RangeExhausted { .. } => self.exhausted += 1,
            _ => self.failures += 1,
        }
    }

    fn only_exhaustion(&self) -> bool {
        self.failures == 0 && self.exhausted > 0
    }
}
