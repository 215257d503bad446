//! Error types for optimizer operations.

use thiserror::Error;

/// Errors that can occur during optimizer selection or stepping.
#[derive(Error, Debug)]
pub enum OptimError {
    /// The requested optimizer name is not recognized.
    #[error("Unsupported optimizer: {0}")]
    UnsupportedOptimizer(String),

    /// Error with invalid hyperparameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error in optimizer operation.
    #[error("Optimizer error: {0}")]
    OptimizerError(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

/// Result type for optimizer operations.
pub type OptimResult<T> = Result<T, OptimError>;
