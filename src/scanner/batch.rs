//! Bounded-concurrency batch execution.
//!
//! One generic executor drives every probe kind. All targets are submitted
//! up front; a counting semaphore keeps at most `concurrency` probes in
//! flight, and a single consumer collects outcomes as they complete.

use crate::error::ProbeError;
use crate::scanner::traits::{Probe, ProbeOutcome};
use crate::types::Target;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use indicatif::ProgressBar;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Default concurrency ceiling.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Configuration for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of probes in flight at once.
    pub concurrency: NonZeroUsize,
    /// Progress bar advanced once per finished probe.
    pub progress: Option<ProgressBar>,
}

impl BatchConfig {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self {
            concurrency,
            progress: None,
        }
    }

    /// Attach a progress bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Every outcome of one batch, in completion order.
#[derive(Debug)]
pub struct BatchResult<O> {
    pub outcomes: Vec<O>,
    pub duration: Duration,
}

impl<O: ProbeOutcome> BatchResult<O> {
    /// Number of outcomes, equal to the number of submitted targets.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Successful pings, open TCP ports, or strictly open UDP ports.
    pub fn positives(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_positive()).count()
    }

    /// Index outcomes by (host, port).
    pub fn by_target(&self) -> HashMap<(String, Option<u16>), &O> {
        self.outcomes
            .iter()
            .map(|o| (o.target().key(), o))
            .collect()
    }

    /// Outcomes sorted by host then port, for display.
    pub fn sorted(&self) -> Vec<&O> {
        let mut sorted: Vec<&O> = self.outcomes.iter().collect();
        sorted.sort_by(|a, b| {
            let (a, b) = (a.target(), b.target());
            a.host.cmp(&b.host).then(a.port.cmp(&b.port))
        });
        sorted
    }
}

/// Run `probe_fn` once per target with at most `config.concurrency` in flight.
///
/// Returns only when every target has produced exactly one outcome. A probe
/// that panics is turned into a failure outcome for its own target.
pub async fn run_batch<F, Fut, O>(targets: Vec<Target>, config: &BatchConfig, probe_fn: F) -> BatchResult<O>
where
    F: Fn(Target) -> Fut,
    Fut: Future<Output = O>,
    O: ProbeOutcome,
{
    let started = Instant::now();
    let total = targets.len();
    let permits = config.concurrency.get().min(Semaphore::MAX_PERMITS);
    let semaphore = Arc::new(Semaphore::new(permits));
    let probe_fn = &probe_fn;

    let mut pending: FuturesUnordered<_> = targets
        .into_iter()
        .map(|target| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = semaphore.acquire().await.ok();
                let probe_started = Instant::now();
                let work = AssertUnwindSafe(async { probe_fn(target.clone()).await });
                let result = work.catch_unwind().await;
                match result {
                    Ok(outcome) => outcome,
                    Err(panic) => {
                        let reason = panic_message(panic.as_ref());
                        tracing::error!(probe_target = %target, reason = %reason, "probe panicked");
                        O::faulted(target, probe_started.elapsed(), ProbeError::Faulted(reason))
                    }
                }
            }
        })
        .collect();

    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = pending.next().await {
        if let Some(progress) = &config.progress {
            progress.inc(1);
            if outcome.is_positive() {
                progress.set_message(format!("{} {}", outcome.target(), outcome.status_label()));
            }
        }
        outcomes.push(outcome);
    }

    BatchResult {
        outcomes,
        duration: started.elapsed(),
    }
}

/// Run a [`Probe`] implementation over every target.
pub async fn run_probe<P: Probe>(probe: Arc<P>, targets: Vec<Target>, config: &BatchConfig) -> BatchResult<P::Outcome> {
    run_batch(targets, config, move |target| {
        let probe = Arc::clone(&probe);
        async move { probe.probe(target).await }
    })
    .await
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
