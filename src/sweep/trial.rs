//! Single-trial runner
//!
//! Builds a fresh engine, places a massless body on a Kepler orbit of
//! semi-major axis 1 about a unit mass, integrates for a non-integer number
//! of periods and reports step-count, energy and timing metrics.

use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::error::TrialError;
use crate::simulation::engine::{Clock, Simulation};
use crate::simulation::states::NVec3;
use crate::sweep::params::{TrialParams, TrialResult};

/// Orbital period of the reference orbit in normalized units
pub const T_ORB: f64 = TAU;

/// Timing is reported in microseconds and halved
const TIMING_SCALE: f64 = 1e6 / 2.0;

/// Everything a trial needs besides its parameters
#[derive(Debug, Clone)]
pub struct TrialSettings {
    pub end_periods: f64, // integration length in orbital periods
    pub energy_floor: f64, // added to |dE/E|
    pub clock: Clock,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self {
            end_periods: 1000.34476128,
            energy_floor: 1e-16,
            clock: Clock::Wall,
            timeout: None,
            cancel: None,
        }
    }
}

impl TrialParams {
    /// Physical timestep: `10^log_dt * t_orb`
    pub fn dt(&self) -> f64 {
        10f64.powf(self.log_dt) * T_ORB
    }

    /// Eccentricity: `1 - 10^log_one_minus_e`
    pub fn eccentricity(&self) -> f64 {
        1.0 - 10f64.powf(self.log_one_minus_e)
    }
}

/// Run one trial on its own engine instance.
///
/// Non-finite metrics from diverging runs are returned as they are; the
/// reducer turns them into zeros.
pub fn run_trial(p: &TrialParams, settings: &TrialSettings) -> Result<TrialResult, TrialError> {
    let dt = p.dt();
    let e = p.eccentricity();
    if !(dt.is_finite() && dt > 0.0) {
        return Err(TrialError::InvalidParams(format!("timestep {dt} from log_dt {}", p.log_dt)));
    }
    if !(e > -1.0 && e < 1.0) {
        return Err(TrialError::InvalidParams(format!(
            "eccentricity {e} from log_one_minus_e {} is not elliptic",
            p.log_one_minus_e
        )));
    }

    let mut sim = Simulation::new();
    sim.set_integrator(p.integrator);
    sim.set_force_is_velocity_dependent(false);
    sim.set_dt(dt);
    sim.set_clock(settings.clock);
    if let Some(cancel) = &settings.cancel {
        sim.set_cancel_token(cancel.clone());
    }
    if let Some(timeout) = settings.timeout {
        sim.set_deadline(Instant::now() + timeout);
    }

    // Central unit mass at rest, test particle at pericentre
    sim.add_body(1.0, NVec3::zeros(), NVec3::zeros());
    sim.add_body(
        0.0,
        NVec3::new(1.0 - e, 0.0, 0.0),
        NVec3::new(0.0, ((1.0 + e) / (1.0 - e)).sqrt(), 0.0),
    );

    let e_initial = sim.bodies()[1].specific_energy();

    // Stop at the first step past t_end, but sample energy on synchronized state
    sim.integrate(settings.end_periods * T_ORB, false, true)?;

    let e_final = sim.bodies()[1].specific_energy();
    let rel = (e_final - e_initial) / e_initial;
    let t = sim.t();

    Ok(TrialResult {
        steps_ratio: sim.iterations() as f64 / t * dt,
        energy_error: rel.abs() + settings.energy_floor,
        timing: sim.timing() / t * dt * TIMING_SCALE,
        energy_error_signed: rel,
    })
}
