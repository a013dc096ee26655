use crate::{
    batch::BatchEntry,
    codec::encode,
    error::Error,
    provider::PersonAttributeProvider,
    sampler::Sampler,
};
use rand::Rng;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// What a worker hands back at the join barrier.
#[derive(Debug)]
pub(crate) struct WorkerReport {
    pub(crate) entries: Vec<BatchEntry>,
    pub(crate) attempts: usize,
    /// Set when the worker stopped before filling its quota for a reason
    /// other than running out of budget.
    pub(crate) failure: Option<Error>,
}

/// Fills one sub-batch.
///
/// The worker owns its sampler and random stream and touches no shared
/// state besides polling `cancel`. It stops when `quota` distinct numbers are
/// collected, when `budget` sampler calls are spent, on the first sampler
/// error, or on cancellation. Duplicates within the sub-batch are dropped
/// here; duplicates across workers are resolved at merge time.
pub(crate) fn worker_loop<P, R>(
    _worker_id: usize,
    quota: usize,
    budget: usize,
    mut sampler: Sampler<P>,
    mut rng: R,
    cancel: &CancellationToken,
) -> WorkerReport
where
    P: PersonAttributeProvider,
    R: Rng,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started (quota {quota}, budget {budget})");

    let today = sampler.today();
    let mut entries = Vec::with_capacity(quota);
    let mut seen = HashSet::with_capacity(quota);
    let mut attempts = 0;
    let mut failure = None;

    while entries.len() < quota && attempts < budget {
        if cancel.is_cancelled() {
            failure = Some(Error::Cancelled);
            break;
        }
        attempts += 1;
        match sampler.sample(&mut rng) {
            Ok(id) => {
                let formatted = encode(&id, today);
                if seen.insert(formatted.short.clone()) {
                    entries.push(BatchEntry { id, formatted });
                }
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} stopped after {attempts} attempts: {e}");
                failure = Some(e);
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(
        "Worker {_worker_id} finished with {} of {quota} after {attempts} attempts",
        entries.len()
    );

    WorkerReport {
        entries,
        attempts,
        failure,
    }
}
