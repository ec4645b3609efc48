//! Parameter grid generation
//!
//! The flat list is ordered row-major, outer loop over the eccentricity
//! axis and inner loop over the timestep axis, so `params[j * n + i]`
//! is grid cell `(j, i)` and the reducer can reshape without permuting.

use crate::configuration::config::AxisRange;
use crate::simulation::integrator::IntegratorKind;
use crate::sweep::params::TrialParams;

/// The two swept exponent axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepAxes {
    pub n: usize,
    pub log_dt: AxisRange,
    pub log_one_minus_e: AxisRange,
}

impl SweepAxes {
    pub fn new(n: usize, log_dt: AxisRange, log_one_minus_e: AxisRange) -> Self {
        Self { n, log_dt, log_one_minus_e }
    }

    /// Timestep exponents, one per grid column
    pub fn log_dts(&self) -> Vec<f64> {
        linspace(self.log_dt.start(), self.log_dt.end(), self.n)
    }

    /// Eccentricity-complement exponents, one per grid row
    pub fn log_one_minus_es(&self) -> Vec<f64> {
        linspace(self.log_one_minus_e.start(), self.log_one_minus_e.end(), self.n)
    }

    /// Row-major index of cell `(row, col)`
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.n + col
    }

    /// `(row, col)` of flat index `k`
    pub fn cell(&self, k: usize) -> (usize, usize) {
        (k / self.n, k % self.n)
    }
}

/// `n` evenly spaced values from `start` to `end`, both included.
/// A single point is `start`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|k| if k == n - 1 { end } else { start + step * k as f64 })
                .collect()
        }
    }
}

/// All `n²` trials of one integrator in row-major order
pub fn generate(axes: &SweepAxes, anomaly: f64, integrator: IntegratorKind) -> Vec<TrialParams> {
    let dts = axes.log_dts();
    let es = axes.log_one_minus_es();

    let mut params = Vec::with_capacity(axes.n * axes.n);
    for &log_one_minus_e in &es {
        for &log_dt in &dts {
            params.push(TrialParams {
                anomaly,
                log_dt,
                log_one_minus_e,
                integrator,
            });
        }
    }
    params
}
