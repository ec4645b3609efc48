//! Force / acceleration contributors for the engine
//!
//! Defines the acceleration trait and direct Newtonian gravity. The
//! Wisdom-Holman integrators reuse the same terms for their interaction
//! kick by asking for the sum over every body except the central one.

use crate::simulation::states::{System, NVec3};

/// Collection of acceleration terms (gravity, drag, etc)
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Constructor
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
        }
    }

    /// Add an acceleration term
    pub fn with(mut self, term: impl Acceleration + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Compute total accelerations at time `t` for all bodies in `sys`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, sys: &System, out: &mut [NVec3]) {
        self.accumulate_from(t, sys, 0, out);
    }

    /// Same as [`AccelSet::accumulate_accels`] but only bodies with index
    /// `>= first` act as sources. `first = 1` drops the central body, which
    /// is what the Kepler-split integrators need for their kick.
    pub fn accumulate_from(&self, t: f64, sys: &System, first: usize, out: &mut [NVec3]) {
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }
        // Iterate over all acceleration contributors
        for term in &self.terms {
            term.acceleration(t, sys, first, out);
        }
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for acceleration sources operating on [`System`]
/// Implementations add their contribution into `out[i]` for each body,
/// counting only bodies with index `>= first` as sources
pub trait Acceleration {
    fn acceleration(&self, t: f64, sys: &System, first: usize, out: &mut [NVec3]);
}

/// Newtonian gravity with softening (direct n^2 sum)
#[allow(non_snake_case)]
pub struct NewtonianGravity {
    pub G: f64,
    pub eps2: f64,
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, _t: f64, sys: &System, first: usize, out: &mut [NVec3]) {
        let n = sys.bodies.len();
        if n == 0 { // No bodies, return
            return;
        }

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            let bi = &sys.bodies[i];
            for j in (i + 1)..n {
                let bj = &sys.bodies[j];

                // r points from i to j: i is pulled along +r, j along -r
                let r = bj.x - bi.x;

                // Softened squared distance |r|^2 + eps^2 (eps2 = 0 for the sweep)
                let d2 = r.dot(&r) + self.eps2;

                // 1 / |r_soft|
                let inv_r = d2.sqrt().recip();

                // coef = G / |r_soft|^3
                let coef = self.G * inv_r * inv_r * inv_r;

                // a_i +=  G m_j r / |r|^3, only if j counts as a source
                if j >= first {
                    out[i] += coef * bj.m * r;
                }
                // a_j += -G m_i r / |r|^3, only if i counts as a source
                if i >= first {
                    out[j] -= coef * bi.m * r;
                }
            }
        }
    }
}
