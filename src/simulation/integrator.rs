//! Time integrators for the engine
//!
//! Provides a drift-kick-drift leapfrog, a kick-drift-kick velocity Verlet,
//! classical RK4, and two Wisdom-Holman variants that replace the linear
//! drift by an exact Kepler drift about body 0. All of them are driven by an
//! `AccelSet` and `Parameters`, and advance `sys.t` by `params.h0` per step.
//!
//! The split integrators (leapfrog, wh, mikkola) can leave the system
//! unsynchronized: the trailing half drift of a step is parked in
//! `SplitState::pending` and merged into the leading half drift of the next
//! step. [`synchronize`] pays the debt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::forces::AccelSet;
use super::kepler::{drift_eccentric, drift_universal};
use super::params::Parameters;
use super::states::{NVec3, System};
use crate::error::EngineError;

/// Which integrator method the engine uses
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorKind {
    /// Drift-kick-drift leapfrog. Symplectic, one force evaluation per step
    Leapfrog,
    /// Kick-drift-kick velocity Verlet. Symplectic, reuses the end-of-step
    /// acceleration when forces don't depend on velocity
    Verlet,
    /// Classical 4th-order Runge-Kutta, higher local accuracy but not symplectic
    Rk4,
    /// Wisdom-Holman with the Kepler drift solved in eccentric anomaly
    Wh,
    /// Wisdom-Holman with the Kepler drift solved in universal variables
    Mikkola,
}

impl IntegratorKind {
    pub const ALL: [IntegratorKind; 5] = [
        IntegratorKind::Leapfrog,
        IntegratorKind::Verlet,
        IntegratorKind::Rk4,
        IntegratorKind::Wh,
        IntegratorKind::Mikkola,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IntegratorKind::Leapfrog => "leapfrog",
            IntegratorKind::Verlet => "verlet",
            IntegratorKind::Rk4 => "rk4",
            IntegratorKind::Wh => "wh",
            IntegratorKind::Mikkola => "mikkola",
        }
    }

    /// Display label for reports, e.g. `WH/Mikkola`
    pub fn label(&self) -> &'static str {
        match self {
            IntegratorKind::Leapfrog => "Leapfrog",
            IntegratorKind::Verlet => "Verlet",
            IntegratorKind::Rk4 => "RK4",
            IntegratorKind::Wh => "WH",
            IntegratorKind::Mikkola => "Mikkola",
        }
    }

    /// Integrators built from separate drift and kick operators
    pub fn is_split(&self) -> bool {
        matches!(
            self,
            IntegratorKind::Leapfrog | IntegratorKind::Wh | IntegratorKind::Mikkola
        )
    }

    /// Integrators whose drift is a Kepler orbit about body 0
    pub fn is_kepler_split(&self) -> bool {
        matches!(self, IntegratorKind::Wh | IntegratorKind::Mikkola)
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntegratorKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntegratorKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::UnknownIntegrator(s.to_string()))
    }
}

/// Per-run integrator bookkeeping owned by the engine
#[derive(Debug, Clone, Default)]
pub struct SplitState {
    /// Drift still owed by a split integrator (0 when synchronized)
    pub pending: f64,
    /// End-of-step accelerations kept by Verlet for the next kick
    pub cached_accel: Option<Vec<NVec3>>,
}

impl SplitState {
    pub fn is_synchronized(&self) -> bool {
        self.pending == 0.0
    }
}

/// Advance the system by one step with the chosen integrator
pub fn step(
    kind: IntegratorKind,
    sys: &mut System,
    forces: &AccelSet,
    params: &Parameters,
    state: &mut SplitState,
) {
    if sys.bodies.is_empty() { // no bodies, return
        return;
    }
    match kind {
        IntegratorKind::Leapfrog | IntegratorKind::Wh | IntegratorKind::Mikkola => {
            split_step(kind, sys, forces, params, state)
        }
        IntegratorKind::Verlet => verlet_step(sys, forces, params, state),
        IntegratorKind::Rk4 => rk4_step(sys, forces, params),
    }
}

/// Finish any half drift still owed by a split integrator
pub fn synchronize(kind: IntegratorKind, sys: &mut System, params: &Parameters, state: &mut SplitState) {
    if !state.is_synchronized() {
        drift(kind, sys, params, state.pending);
        state.pending = 0.0;
    }
}

/// Drift-kick-drift with the leading half drift merged into the pending one.
fn split_step(
    kind: IntegratorKind,
    sys: &mut System,
    forces: &AccelSet,
    params: &Parameters,
    state: &mut SplitState,
) {
    let dt = params.h0;
    let half_dt = 0.5 * dt;

    // Drift: previous step's trailing half plus this step's leading half
    drift(kind, sys, params, state.pending + half_dt);

    // Kick: v += dt * a(t + dt/2)
    let t_mid = sys.t + half_dt;
    kick(kind, sys, forces, t_mid, dt);

    // Trailing half drift is deferred
    state.pending = half_dt;
    sys.t += dt;
}

fn drift(kind: IntegratorKind, sys: &mut System, params: &Parameters, h: f64) {
    match kind {
        IntegratorKind::Wh | IntegratorKind::Mikkola => {
            // Heliocentric drift: each body follows a Kepler orbit about body 0,
            // which itself moves uniformly
            let (central, rest) = sys.bodies.split_at_mut(1);
            let c = &mut central[0];
            for b in rest.iter_mut() {
                let mu = params.G * (c.m + b.m);
                let mut x = b.x - c.x;
                let mut v = b.v - c.v;
                if kind == IntegratorKind::Wh {
                    drift_eccentric(mu, &mut x, &mut v, h);
                } else {
                    drift_universal(mu, &mut x, &mut v, h);
                }
                b.x = c.x + h * c.v + x;
                b.v = c.v + v;
            }
            c.x += h * c.v;
        }
        _ => {
            // x += h * v
            for b in sys.bodies.iter_mut() {
                b.x += h * b.v;
            }
        }
    }
}

fn kick(kind: IntegratorKind, sys: &mut System, forces: &AccelSet, t: f64, h: f64) {
    let n = sys.bodies.len();
    let mut a = vec![NVec3::zeros(); n];
    if kind.is_kepler_split() {
        // Interaction part only: the central pull lives in the drift
        forces.accumulate_from(t, &*sys, 1, &mut a);
        for (b, a) in sys.bodies.iter_mut().zip(a.iter()).skip(1) {
            b.v += h * *a;
        }
    } else {
        forces.accumulate_accels(t, &*sys, &mut a);
        for (b, a) in sys.bodies.iter_mut().zip(a.iter()) {
            b.v += h * *a;
        }
    }
}

/// Advance the system by one step using kick-drift-kick velocity Verlet.
/// Accelerations at the end of a step are reused for the next one when the
/// forces are velocity-independent.
fn verlet_step(sys: &mut System, forces: &AccelSet, params: &Parameters, state: &mut SplitState) {
    let n = sys.bodies.len();
    let dt = params.h0;
    let half_dt = 0.5 * dt;

    // a_n from x_n at time t_n, cached when allowed
    let a_old = match state.cached_accel.take() {
        Some(a) if !params.velocity_dependent && a.len() == n => a,
        _ => {
            let mut a = vec![NVec3::zeros(); n];
            forces.accumulate_accels(sys.t, &*sys, &mut a);
            a
        }
    };

    // Kick: v_n+1/2 = v_n + (dt/2) * a_n
    for (b, a) in sys.bodies.iter_mut().zip(a_old.iter()) {
        b.v += half_dt * *a;
    }

    // Drift: x_n+1 = x_n + dt * v_n+1/2
    for b in sys.bodies.iter_mut() {
        b.x += dt * b.v;
    }

    sys.t += dt;

    // a_n+1 from x_n+1 at time t_n+1. Velocity-dependent forces see v_n+1/2 here
    let mut a_new = a_old;
    forces.accumulate_accels(sys.t, &*sys, &mut a_new);

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) * a_n+1
    for (b, a) in sys.bodies.iter_mut().zip(a_new.iter()) {
        b.v += half_dt * *a;
    }

    if !params.velocity_dependent {
        state.cached_accel = Some(a_new);
    }
}

/// Advance the system by one step using classical RK4 on (x, v)
fn rk4_step(sys: &mut System, forces: &AccelSet, params: &Parameters) {
    let n = sys.bodies.len();
    let dt = params.h0;
    let t0 = sys.t;
    let x0: Vec<NVec3> = sys.bodies.iter().map(|b| b.x).collect();
    let v0: Vec<NVec3> = sys.bodies.iter().map(|b| b.v).collect();

    // Scratch system the stages are evaluated on
    let mut stage = sys.clone();
    let mut a = vec![NVec3::zeros(); n];

    // Returns (dx, dv) = (v, a) at the state x0 + c*kx, v0 + c*kv
    let mut derivative = |c: f64, t: f64, kx: &[NVec3], kv: &[NVec3]| {
        for (i, b) in stage.bodies.iter_mut().enumerate() {
            b.x = x0[i] + c * kx[i];
            b.v = v0[i] + c * kv[i];
        }
        stage.t = t;
        forces.accumulate_accels(t, &stage, &mut a);
        let dx: Vec<NVec3> = stage.bodies.iter().map(|b| b.v).collect();
        (dx, a.clone())
    };

    let zero = vec![NVec3::zeros(); n];
    let (k1x, k1v) = derivative(0.0, t0, &zero, &zero);
    let (k2x, k2v) = derivative(0.5 * dt, t0 + 0.5 * dt, &k1x, &k1v);
    let (k3x, k3v) = derivative(0.5 * dt, t0 + 0.5 * dt, &k2x, &k2v);
    let (k4x, k4v) = derivative(dt, t0 + dt, &k3x, &k3v);

    for (i, b) in sys.bodies.iter_mut().enumerate() {
        b.x = x0[i] + dt / 6.0 * (k1x[i] + 2.0 * k2x[i] + 2.0 * k3x[i] + k4x[i]);
        b.v = v0[i] + dt / 6.0 * (k1v[i] + 2.0 * k2v[i] + 2.0 * k3v[i] + k4v[i]);
    }
    sys.t = t0 + dt;
}
