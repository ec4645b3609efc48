//! Per-trial input and output records

use crate::simulation::integrator::IntegratorKind;

/// One point of the sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialParams {
    pub anomaly: f64, // constant, carried through unchanged
    pub log_dt: f64, // log10(dt / t_orb)
    pub log_one_minus_e: f64, // log10(1 - e)
    pub integrator: IntegratorKind,
}

/// Fixed-size result of one trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    pub steps_ratio: f64, // iterations / t * dt
    pub energy_error: f64, // |dE/E| + floor
    pub timing: f64, // wall time per step [us], normalized
    pub energy_error_signed: f64, // dE/E
}

impl TrialResult {
    pub const FIELDS: usize = 4;

    pub fn new(steps_ratio: f64, energy_error: f64, timing: f64, energy_error_signed: f64) -> Self {
        Self {
            steps_ratio,
            energy_error,
            timing,
            energy_error_signed,
        }
    }

    /// Placeholder for a failed trial; every field sanitizes to 0
    pub fn sentinel() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    }

    pub fn to_array(&self) -> [f64; Self::FIELDS] {
        [self.steps_ratio, self.energy_error, self.timing, self.energy_error_signed]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl From<[f64; TrialResult::FIELDS]> for TrialResult {
    fn from(a: [f64; TrialResult::FIELDS]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }
}
