pub mod states;
pub mod params;
pub mod engine;
pub mod forces;
pub mod kepler;
pub mod integrator;
