//! Error types.

use std::io;

pub type Result<T> = core::result::Result<T, SweepError>;

/// Failures raised by the simulation engine itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid timestep: {0}")]
    InvalidTimestep(f64),
    #[error("integrate called on an empty system")]
    NoBodies,
    #[error("kepler-split integrators need a massive central body at index 0")]
    MasslessCentralBody,
    #[error("unknown integrator: {0}")]
    UnknownIntegrator(String),
    #[error("integration interrupted")]
    Interrupted,
    #[error("integration exceeded its deadline")]
    DeadlineExceeded,
}

/// Failure of a single trial.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TrialError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("invalid trial parameters: {0}")]
    InvalidParams(String),
}

impl TrialError {
    /// True when the trial stopped because the batch was cancelled, as
    /// opposed to failing on its own.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, TrialError::Engine(EngineError::Interrupted))
    }
}

/// Crate-wide error type for the sweep pipeline.
#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    #[error("sweep cancelled")]
    Cancelled,
    #[error("trial {index} failed: {source}")]
    Trial { index: usize, source: TrialError },
    #[error("expected {expected} trial results, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("failed building worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("yaml deserialization error: {0}")]
    YamlDeserError(#[from] serde_yaml::Error),
    #[error("rendering failed: {0}")]
    Render(String),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}
