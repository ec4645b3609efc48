//! Reduce a batch of trial results into per-metric grids

use nalgebra::DMatrix;

use crate::error::{Result, SweepError};
use crate::sweep::params::TrialResult;

/// N×N grid indexed `(eccentricity index, timestep index)`
pub type Grid = DMatrix<f64>;

/// The four metric grids of one integrator
#[derive(Debug, Clone, PartialEq)]
pub struct MetricGrids {
    pub steps_ratio: Grid,
    pub energy_error: Grid,
    pub timing: Grid,
    pub energy_error_signed: Grid,
}

impl MetricGrids {
    pub fn mean_timing(&self) -> f64 {
        self.timing.mean()
    }
}

/// Non-finite values become 0
pub fn sanitize(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Sanitize, split and reshape `n²` row-major results into `n×n` grids
pub fn reduce(n: usize, results: &[TrialResult]) -> Result<MetricGrids> {
    let expected = n * n;
    if results.len() != expected {
        return Err(SweepError::ShapeMismatch {
            expected,
            got: results.len(),
        });
    }

    let column = |metric: fn(&TrialResult) -> f64| -> Grid {
        let data: Vec<f64> = results.iter().map(|r| sanitize(metric(r))).collect();
        DMatrix::from_row_slice(n, n, &data)
    };

    Ok(MetricGrids {
        steps_ratio: column(|r| r.steps_ratio),
        energy_error: column(|r| r.energy_error),
        timing: column(|r| r.timing),
        energy_error_signed: column(|r| r.energy_error_signed),
    })
}

/// `mean(a.timing) / mean(b.timing)`
pub fn speed_ratio(a: &MetricGrids, b: &MetricGrids) -> f64 {
    a.mean_timing() / b.mean_timing()
}
