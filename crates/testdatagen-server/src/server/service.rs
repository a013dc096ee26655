//! Request execution for the person endpoints.
//!
//! [`PersonService`] owns the shared state behind the router: configuration,
//! the semaphore that bounds concurrent batches, and the shutdown token.
//!
//! ## Responsibilities
//!
//! - Resolve the birth-year window of a request.
//! - Run the CPU-bound batch on the blocking pool, one permit per batch.
//! - Cancel a batch when its request is dropped or the service shuts down.
//! - Fill every generated number with person attributes.

use crate::server::{
    config::ServerConfig,
    error::ApiError,
    person::{FakerProvider, Person},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use testdatagen::{
    BatchGenerator, BirthYearWindow, DateSource, FixedDate, FormattedNumber, MAX_AGE, NaiveDate,
    SystemDate, format_single,
};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How a request narrows the birth years it wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowRequest {
    /// Neither ages nor years given: the configured default ages.
    #[default]
    Default,
    /// Inclusive calendar-year ages; a missing side takes the default.
    Ages { min: Option<i32>, max: Option<i32> },
    /// Exclusive birth-year bounds; a missing side is left open.
    BirthYears { min: Option<i32>, max: Option<i32> },
}

#[derive(Clone)]
pub struct PersonService {
    config: Arc<ServerConfig>,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl PersonService {
    pub fn new(config: ServerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_batches));
        Self {
            config: Arc::new(config),
            permits,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Resolves `request` against `today`.
    pub fn window(&self, request: WindowRequest, today: NaiveDate) -> BirthYearWindow {
        use chrono::Datelike;

        match request {
            WindowRequest::Default => BirthYearWindow::from_ages(
                self.config.default_min_age,
                self.config.default_max_age,
                today,
            ),
            WindowRequest::Ages { min, max } => BirthYearWindow::from_ages(
                min.unwrap_or(self.config.default_min_age),
                max.unwrap_or(self.config.default_max_age),
                today,
            ),
            WindowRequest::BirthYears { min, max } => BirthYearWindow::new(
                min.unwrap_or(today.year() - MAX_AGE - 1),
                max.unwrap_or(today.year() + 1),
            ),
        }
    }

    /// Generates `count` persons with unique identity numbers.
    ///
    /// # Errors
    ///
    /// - [`ApiError::ServiceShutdown`] if the service stopped accepting work.
    /// - [`ApiError::Engine`] for anything the batch generator reports.
    /// - [`ApiError::Internal`] if the blocking task died.
    #[tracing::instrument(skip(self), fields(window = tracing::field::Empty))]
    pub async fn persons(
        &self,
        count: usize,
        request: WindowRequest,
    ) -> Result<Vec<Person>, ApiError> {
        if self.shutdown.is_cancelled() {
            return Err(ApiError::ServiceShutdown);
        }

        let today = SystemDate.today();
        let window = self.window(request, today);
        tracing::Span::current().record("window", tracing::field::display(window));

        let _permit = tokio::select! {
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|_| ApiError::ServiceShutdown)?
            }
            () = self.shutdown.cancelled() => return Err(ApiError::ServiceShutdown),
        };

        // Dropping this request cancels the batch through the guard.
        let cancel = self.shutdown.child_token();
        let guard = cancel.clone().drop_guard();

        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let generator = BatchGenerator::with_sources(
            self.config.batch.clone(),
            FixedDate(today),
            FakerProvider::new(today, seed),
        );

        let task = tokio::task::spawn_blocking(move || {
            let batch = generator.generate_with_cancel(count, window, &cancel)?;
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(u64::MAX);
            Ok::<_, testdatagen::Error>(
                batch
                    .iter()
                    .map(|entry| Person::fake(entry, &mut rng))
                    .collect::<Vec<_>>(),
            )
        });

        let result = task.await;
        guard.disarm();

        match result {
            Ok(persons) => Ok(persons?),
            Err(e) => Err(ApiError::Internal {
                context: e.to_string(),
            }),
        }
    }

    /// Normalizes a raw identity number into both formats.
    ///
    /// # Errors
    ///
    /// [`ApiError::Engine`] with a format error for malformed input.
    pub fn format(&self, raw: &str) -> Result<FormattedNumber, ApiError> {
        Ok(format_single(raw, SystemDate.today())?)
    }

    /// `count` random version 4 UUIDs.
    pub fn uuids(&self, count: usize) -> Vec<Uuid> {
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        (0..count)
            .map(|_| uuid::Builder::from_random_bytes(rng.random()).into_uuid())
            .collect()
    }

    /// Stops accepting batches and cancels the ones in flight.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
