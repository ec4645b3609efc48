pub mod simulation;
pub mod configuration;
pub mod sweep;
pub mod visualization;
pub mod benchmark;
pub mod cancel;
pub mod error;

pub use simulation::states::{Body, System, NVec3};
pub use simulation::forces::{Acceleration, AccelSet, NewtonianGravity};
pub use simulation::engine::{Clock, Simulation};
pub use simulation::integrator::IntegratorKind;

pub use configuration::config::{AxisRange, FailurePolicy, SweepConfig};

pub use sweep::params::{TrialParams, TrialResult};
pub use sweep::grid::{generate, linspace, SweepAxes};
pub use sweep::trial::{run_trial, TrialSettings};
pub use sweep::executor::{BatchOutcome, Executor, TrialFailure};
pub use sweep::reduce::{reduce, speed_ratio, Grid, MetricGrids};
pub use sweep::pipeline::{run_sweep, IntegratorGrids, Speedup, SweepReport};

pub use visualization::heatmap::{open_in_viewer, render_heatmaps};

pub use benchmark::benchmark::bench_integrators;

pub use cancel::CancelToken;
pub use error::{EngineError, SweepError, TrialError};
