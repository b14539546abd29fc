//! Error types for SVM training

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SVMError {
    #[error("Invalid label at sample {index}: expected -1 or +1, got {label}")]
    InvalidLabel { index: usize, label: f64 },

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    #[error("Kernel evaluation failed: {0}")]
    KernelEvaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Error type returned by the training entry points
pub type TrainError = SVMError;

pub type Result<T> = std::result::Result<T, SVMError>;
