//! Numerical and physical parameters for the engine
//!
//! `Parameters` holds runtime settings:
//! - integration step size (`h0`),
//! - whether forces depend on velocity,
//! - softening and gravitational constant (`eps2`, `G`)

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Parameters {
    pub h0: f64, // step size
    pub velocity_dependent: bool, // forces read body velocities
    pub eps2: f64, // softening
    pub G: f64, // gravitational constant
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            h0: 0.01,
            velocity_dependent: true,
            eps2: 0.0,
            G: 1.0,
        }
    }
}
