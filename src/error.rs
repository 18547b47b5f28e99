//! Error type shared by the sampler, the proposal and target constructors and the I/O helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MhError {
    #[error("Proposal covariance is invalid: {0}")]
    InvalidProposalCovariance(String),

    #[error("Invalid target parameter: {0}")]
    InvalidTargetParameter(String),

    #[error("Number of steps must be at least 1, got {0}")]
    InvalidStepCount(usize),

    #[error("Initial state must not be empty")]
    EmptyInitialState,

    #[error("Dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Not enough samples: {available} available, at least {required} required")]
    InsufficientSamples { available: usize, required: usize },

    #[error("I/O error while writing samples")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "csv")]
    #[error("CSV error while writing samples")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, MhError>;
