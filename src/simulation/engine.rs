//! The simulation engine the sweep drives
//!
//! `Simulation` bundles a `System`, the integrator selection, runtime
//! `Parameters` and a force set, plus the counters the sweep reads back:
//! iterations, simulated time and cumulative wall time. Every trial builds
//! its own instance, so nothing is shared between concurrent runs.

use std::time::Instant;

use tracing::trace;

use super::forces::{AccelSet, NewtonianGravity};
use super::integrator::{self, IntegratorKind, SplitState};
use super::params::Parameters;
use super::states::{Body, NVec3, System};
use crate::cancel::CancelToken;
use crate::error::EngineError;

/// Steps between cancellation / deadline checks
const POLL_INTERVAL: u64 = 1024;

/// How `timing()` accumulates wall time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    /// Measured with `Instant` around each `integrate` call
    Wall,
    /// Fixed number of seconds charged per step, reproducible across runs
    PerStep(f64),
}

pub struct Simulation {
    pub integrator: IntegratorKind,
    pub parameters: Parameters,
    system: System,
    forces: AccelSet,
    state: SplitState,
    iterations: u64,
    timing: f64,
    clock: Clock,
    cancel: Option<CancelToken>,
    deadline: Option<Instant>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Fresh engine: no bodies, t = 0, leapfrog, Newtonian gravity with G = 1
    pub fn new() -> Self {
        let parameters = Parameters::default();
        let forces = AccelSet::new().with(NewtonianGravity {
            G: parameters.G,
            eps2: parameters.eps2,
        });
        Self {
            integrator: IntegratorKind::Leapfrog,
            parameters,
            system: System::default(),
            forces,
            state: SplitState::default(),
            iterations: 0,
            timing: 0.0,
            clock: Clock::Wall,
            cancel: None,
            deadline: None,
        }
    }

    /// Drop all bodies, counters and settings
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn set_integrator(&mut self, kind: IntegratorKind) {
        self.integrator = kind;
        self.state = SplitState::default();
    }

    pub fn set_integrator_by_name(&mut self, name: &str) -> Result<(), EngineError> {
        self.set_integrator(name.parse()?);
        Ok(())
    }

    pub fn set_force_is_velocity_dependent(&mut self, dependent: bool) {
        self.parameters.velocity_dependent = dependent;
        self.state.cached_accel = None;
    }

    pub fn set_dt(&mut self, dt: f64) {
        self.parameters.h0 = dt;
    }

    /// Replace the force set, e.g. to add non-gravitational terms
    pub fn set_forces(&mut self, forces: AccelSet) {
        self.forces = forces;
        self.state.cached_accel = None;
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    /// Token polled while integrating; cancelling it stops `integrate`
    pub fn set_cancel_token(&mut self, token: CancelToken) {
        self.cancel = Some(token);
    }

    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn add_body(&mut self, m: f64, x: NVec3, v: NVec3) {
        self.system.bodies.push(Body::new(m, x, v));
        self.state.cached_accel = None;
    }

    pub fn bodies(&self) -> &[Body] {
        &self.system.bodies
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Elapsed simulated time
    pub fn t(&self) -> f64 {
        self.system.t
    }

    /// Cumulative wall time spent integrating, in seconds
    pub fn timing(&self) -> f64 {
        self.timing
    }

    pub fn is_synchronized(&self) -> bool {
        self.state.is_synchronized()
    }

    /// Advance one step, leaving split integrators unsynchronized
    pub fn step(&mut self) {
        integrator::step(
            self.integrator,
            &mut self.system,
            &self.forces,
            &self.parameters,
            &mut self.state,
        );
        self.iterations += 1;
    }

    pub fn synchronize(&mut self) {
        integrator::synchronize(self.integrator, &mut self.system, &self.parameters, &mut self.state);
    }

    /// Integrate up to `t_end`.
    ///
    /// - `exact_finish`: shorten the last step to land on `t_end`; otherwise
    ///   keep stepping with the nominal timestep while `t < t_end`
    /// - `keep_synchronized`: synchronize after every step instead of only
    ///   once at the end
    ///
    /// Bodies are always synchronized when this returns, including on error.
    pub fn integrate(&mut self, t_end: f64, exact_finish: bool, keep_synchronized: bool) -> Result<(), EngineError> {
        self.validate()?;

        let started = Instant::now();
        let steps_before = self.iterations;
        let dt = self.parameters.h0;

        let mut outcome = Ok(());
        while self.system.t < t_end {
            if exact_finish && self.system.t + dt > t_end {
                // Last step: shrink it, then restore the nominal timestep
                self.synchronize();
                self.parameters.h0 = t_end - self.system.t;
                self.state.cached_accel = None;
                self.step();
                self.synchronize();
                self.parameters.h0 = dt;
                self.state.cached_accel = None;
                break;
            }

            let t_before = self.system.t;
            self.step();
            if keep_synchronized {
                self.synchronize();
            }

            // dt below the resolution of t: the loop would never reach t_end
            if self.system.t <= t_before {
                outcome = Err(EngineError::InvalidTimestep(dt));
                break;
            }

            if self.iterations % POLL_INTERVAL == 0 {
                if let Err(e) = self.poll() {
                    outcome = Err(e);
                    break;
                }
            }
        }
        self.synchronize();

        let steps = self.iterations - steps_before;
        self.timing += match self.clock {
            Clock::Wall => started.elapsed().as_secs_f64(),
            Clock::PerStep(s) => s * steps as f64,
        };
        trace!(integrator = %self.integrator, steps, t = self.system.t, "integrate finished");

        outcome
    }

    fn validate(&self) -> Result<(), EngineError> {
        let dt = self.parameters.h0;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(EngineError::InvalidTimestep(dt));
        }
        if self.system.bodies.is_empty() {
            return Err(EngineError::NoBodies);
        }
        if self.integrator.is_kepler_split() && !(self.system.bodies[0].m > 0.0) {
            return Err(EngineError::MasslessCentralBody);
        }
        Ok(())
    }

    fn poll(&self) -> Result<(), EngineError> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(EngineError::Interrupted);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(EngineError::DeadlineExceeded);
        }
        Ok(())
    }
}
