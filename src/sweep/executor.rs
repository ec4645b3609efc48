//! Parallel trial execution on a fixed-size worker pool
//!
//! Each batch gets its own rayon pool of `workers` threads. Results come back
//! through an indexed parallel collect, so `results[i]` always belongs to
//! `params[i]` whatever order the workers finish in. `install` only returns
//! once every worker is idle, so no trial outlives its batch.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::configuration::config::FailurePolicy;
use crate::error::{EngineError, Result, SweepError, TrialError};
use crate::sweep::params::{TrialParams, TrialResult};

#[derive(Debug, Clone, Copy)]
pub struct Executor {
    pub workers: usize,
    pub failure_policy: FailurePolicy,
}

/// A trial that failed under [`FailurePolicy::Sentinel`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrialFailure {
    pub index: usize,
    pub error: TrialError,
}

/// Ordered results of one batch
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: Vec<TrialResult>,
    pub failures: Vec<TrialFailure>,
}

impl Executor {
    pub fn new(workers: usize, failure_policy: FailurePolicy) -> Self {
        Self { workers, failure_policy }
    }

    /// Run `trial` over every parameter tuple.
    ///
    /// `trial` receives a batch token that it must hand to whatever it runs
    /// so that cancellation (from `cancel` or from an aborting failure)
    /// reaches trials already in flight.
    pub fn run<F>(&self, params: &[TrialParams], cancel: &CancelToken, trial: F) -> Result<BatchOutcome>
    where
        F: Fn(&TrialParams, &CancelToken) -> std::result::Result<TrialResult, TrialError> + Sync,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("sweep-worker-{i}"))
            .build()?;

        let batch = cancel.child();
        let abort = self.failure_policy == FailurePolicy::Abort;

        debug!(trials = params.len(), workers = self.workers, "dispatching batch");
        let outcomes: Vec<std::result::Result<TrialResult, TrialError>> = pool.install(|| {
            params
                .par_iter()
                .map(|p| {
                    if batch.is_cancelled() {
                        return Err(TrialError::Engine(EngineError::Interrupted));
                    }
                    let outcome = trial(p, &batch);
                    if abort && outcome.as_ref().is_err_and(|e| !e.is_interrupt()) {
                        batch.cancel();
                    }
                    outcome
                })
                .collect()
        });

        if cancel.is_cancelled() {
            return Err(SweepError::Cancelled);
        }

        if abort {
            // Lowest-index real failure; trials it interrupted don't count
            let first = outcomes.iter().enumerate().find_map(|(i, o)| match o {
                Err(e) if !e.is_interrupt() => Some((i, e.clone())),
                _ => None,
            });
            if let Some((index, source)) = first {
                return Err(SweepError::Trial { index, source });
            }
        }

        let mut batch_outcome = BatchOutcome {
            results: Vec::with_capacity(outcomes.len()),
            failures: Vec::new(),
        };
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(r) => batch_outcome.results.push(r),
                Err(error) => {
                    warn!(index, %error, "trial failed, recording sentinel");
                    batch_outcome.failures.push(TrialFailure { index, error });
                    batch_outcome.results.push(TrialResult::sentinel());
                }
            }
        }
        Ok(batch_outcome)
    }
}
