//! Core state types for the two-body engine.
//!
//! `Body` / `System` using `NVec3`. The system holds the list of bodies
//! and the current simulation time `t`.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub m: f64, // mass
}

impl Body {
    pub fn new(m: f64, x: NVec3, v: NVec3) -> Self {
        Self { x, v, m }
    }

    /// Specific orbital energy about a unit mass at the origin: `-1/r + v^2/2`
    pub fn specific_energy(&self) -> f64 {
        -1.0 / self.x.norm() + 0.5 * self.v.norm_squared()
    }
}

#[derive(Debug, Clone, Default)]
pub struct System {
    pub bodies: Vec<Body>, // collection of bodies
    pub t: f64, // time
}
