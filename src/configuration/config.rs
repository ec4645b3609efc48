//! Configuration types for loading a sweep from YAML.
//!
//! Every field has a default, so an empty document (or no file at all)
//! reproduces the reference sweep: a 200×200 grid over
//! `log10(dt/t_orb) ∈ [-3, -0.1]` and `log10(1-e) ∈ [0, -10]` for the `wh`
//! and `mikkola` integrators on 12 workers.
//!
//! # YAML format
//!
//! ```yaml
//! resolution: 200              # grid points per axis
//! log_dt: [-3.0, -0.1]         # log10 of the timestep in orbital periods
//! log_one_minus_e: [0.0, -10.0]
//! anomaly: 1.732               # carried through every trial unchanged
//! integrators: ["wh", "mikkola"]
//! workers: 12
//! end_periods: 1000.34476128   # integration length in orbital periods
//! energy_floor: 1.0e-16        # added to |dE/E| so log plots never see 0
//! failure_policy: sentinel     # or "abort"
//! trial_timeout: 30.0          # seconds, omit for none
//! clock_per_step: 1.0e-7       # omit to time with the wall clock
//! output: 2body.png
//! open_output: false
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SweepError};
use crate::simulation::engine::Clock;
use crate::simulation::integrator::IntegratorKind;

/// Smallest timestep exponent accepted. Below it a trial needs more steps
/// than it can finish, and `t + dt` stops advancing long before `t_end`.
pub const MIN_LOG_DT: f64 = -12.0;

/// What the executor does when a single trial fails
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// First failing trial fails the whole batch
    Abort,
    /// Failing trials become all-NaN records (zero after sanitizing) and are reported
    #[default]
    Sentinel,
}

/// Closed range of one swept exponent, `[start, end]` inclusive
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AxisRange(pub f64, pub f64);

impl AxisRange {
    pub fn start(&self) -> f64 {
        self.0
    }

    pub fn end(&self) -> f64 {
        self.1
    }

    pub fn min(&self) -> f64 {
        self.0.min(self.1)
    }

    pub fn max(&self) -> f64 {
        self.0.max(self.1)
    }
}

/// Top-level sweep configuration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub resolution: usize, // N, grid points per axis
    pub log_dt: AxisRange, // timestep exponent range
    pub log_one_minus_e: AxisRange, // eccentricity-complement exponent range
    pub anomaly: f64, // constant anomaly carried through every trial
    pub integrators: Vec<IntegratorKind>, // run in this order, one batch each
    pub workers: usize, // worker pool size
    pub end_periods: f64, // integration length in orbital periods
    pub energy_floor: f64, // floor added to |dE/E|
    pub failure_policy: FailurePolicy,
    pub trial_timeout: Option<f64>, // seconds per trial
    pub clock_per_step: Option<f64>, // deterministic timing instead of wall clock
    pub output: PathBuf, // figure path
    pub open_output: bool, // open the figure when done
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            resolution: 200,
            log_dt: AxisRange(-3.0, -0.1),
            log_one_minus_e: AxisRange(0.0, -10.0),
            anomaly: 1.732,
            integrators: vec![IntegratorKind::Wh, IntegratorKind::Mikkola],
            workers: 12,
            end_periods: 1000.34476128,
            energy_floor: 1e-16,
            failure_policy: FailurePolicy::Sentinel,
            trial_timeout: None,
            clock_per_step: None,
            output: PathBuf::from("2body.png"),
            open_output: false,
        }
    }
}

impl SweepConfig {
    /// Load and validate a config file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let cfg: SweepConfig = serde_yaml::from_reader(reader)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: SweepConfig = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(SweepError::Config(msg));
        if self.resolution == 0 {
            return fail("resolution must be at least 1".into());
        }
        if self.workers == 0 {
            return fail("workers must be at least 1".into());
        }
        if self.integrators.is_empty() {
            return fail("at least one integrator is required".into());
        }
        if !(self.end_periods.is_finite() && self.end_periods > 0.0) {
            return fail(format!("end_periods must be positive, got {}", self.end_periods));
        }
        for (name, r) in [("log_dt", self.log_dt), ("log_one_minus_e", self.log_one_minus_e)] {
            if !(r.0.is_finite() && r.1.is_finite()) {
                return fail(format!("{name} range must be finite"));
            }
        }
        if self.log_dt.min() < MIN_LOG_DT {
            return fail(format!(
                "log_dt must stay at or above {MIN_LOG_DT}, got {}",
                self.log_dt.min()
            ));
        }
        if let Some(t) = self.trial_timeout {
            if !(t.is_finite() && t > 0.0) {
                return fail(format!("trial_timeout must be positive and finite, got {t}"));
            }
        }
        if let Some(s) = self.clock_per_step {
            if !(s.is_finite() && s >= 0.0) {
                return fail(format!("clock_per_step must be non-negative, got {s}"));
            }
        }
        Ok(())
    }

    pub fn clock(&self) -> Clock {
        match self.clock_per_step {
            Some(s) => Clock::PerStep(s),
            None => Clock::Wall,
        }
    }
}
