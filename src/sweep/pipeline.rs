//! One full sweep: every configured integrator, one batch each, in order.
//!
//! All state of a run lives in the returned [`SweepReport`].

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::configuration::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::simulation::integrator::IntegratorKind;
use crate::sweep::executor::{Executor, TrialFailure};
use crate::sweep::grid::{generate, SweepAxes};
use crate::sweep::reduce::{reduce, speed_ratio, MetricGrids};
use crate::sweep::trial::{run_trial, TrialSettings};

/// Grids of one integrator plus the trials that failed on the way
#[derive(Debug, Clone)]
pub struct IntegratorGrids {
    pub integrator: IntegratorKind,
    pub grids: MetricGrids,
    pub failures: Vec<TrialFailure>,
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub axes: SweepAxes,
    pub integrators: Vec<IntegratorGrids>,
}

/// Mean-timing ratio of two integrators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speedup {
    pub numerator: IntegratorKind,
    pub denominator: IntegratorKind,
    pub ratio: f64,
}

impl Speedup {
    /// Console line for this ratio
    pub fn summary(&self) -> String {
        format!(
            "Average speedup ({}/{}): {:.4}",
            self.numerator.label(),
            self.denominator.label(),
            self.ratio
        )
    }
}

impl SweepReport {
    /// First integrator against each of the others
    pub fn speedups(&self) -> Vec<Speedup> {
        let Some((first, rest)) = self.integrators.split_first() else {
            return Vec::new();
        };
        rest.iter()
            .map(|other| Speedup {
                numerator: first.integrator,
                denominator: other.integrator,
                ratio: speed_ratio(&first.grids, &other.grids),
            })
            .collect()
    }
}

impl TrialSettings {
    pub fn from_config(cfg: &SweepConfig) -> Result<Self> {
        let timeout = cfg
            .trial_timeout
            .map(|t| {
                Duration::try_from_secs_f64(t)
                    .map_err(|e| SweepError::Config(format!("trial_timeout {t}: {e}")))
            })
            .transpose()?;
        Ok(Self {
            end_periods: cfg.end_periods,
            energy_floor: cfg.energy_floor,
            clock: cfg.clock(),
            timeout,
            cancel: None,
        })
    }
}

/// Run the sweep described by `cfg`
pub fn run_sweep(cfg: &SweepConfig, cancel: &CancelToken) -> Result<SweepReport> {
    cfg.validate()?;

    let axes = SweepAxes::new(cfg.resolution, cfg.log_dt, cfg.log_one_minus_e);
    let executor = Executor::new(cfg.workers, cfg.failure_policy);
    let settings = TrialSettings::from_config(cfg)?;

    let mut integrators = Vec::with_capacity(cfg.integrators.len());
    for &integrator in &cfg.integrators {
        if cancel.is_cancelled() {
            return Err(SweepError::Cancelled);
        }

        info!("Running {integrator}");
        let started = Instant::now();

        let params = generate(&axes, cfg.anomaly, integrator);
        let batch = executor.run(&params, cancel, |p, token| {
            let mut s = settings.clone();
            s.cancel = Some(token.clone());
            run_trial(p, &s)
        })?;
        let grids = reduce(axes.n, &batch.results)?;

        if !batch.failures.is_empty() {
            warn!(%integrator, failed = batch.failures.len(), "some trials failed and were zeroed");
        }
        info!(
            %integrator,
            trials = params.len(),
            elapsed = ?started.elapsed(),
            mean_timing = grids.mean_timing(),
            "batch finished"
        );

        integrators.push(IntegratorGrids {
            integrator,
            grids,
            failures: batch.failures,
        });
    }

    Ok(SweepReport { axes, integrators })
}
