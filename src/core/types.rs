//! Core type definitions

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Build a prediction from a decision value; zero maps to +1
    pub fn from_decision_value(decision_value: f64) -> Self {
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    ///
    /// # Panics
    /// Panics if `indices` and `values` differ in length. Use
    /// [`SparseVector::try_new`] for untrusted input.
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Fallible constructor reporting a length mismatch as an error
    pub fn try_new(indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(SVMError::DimensionMismatch {
                expected: indices.len(),
                actual: values.len(),
            });
        }
        Ok(Self::new(indices, values))
    }

    /// Build from a dense slice, dropping exact zeros
    pub fn from_dense(values: &[f64]) -> Self {
        let (indices, values) = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Training sample with features and label
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label (+1 or -1)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: f64) -> Self {
        Self { features, label }
    }

    /// Create a sample from dense features
    pub fn dense(features: &[f64], label: f64) -> Self {
        Self::new(SparseVector::from_dense(features), label)
    }
}

/// Why the SMO loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// A full sweep found no KKT violation that could be fixed
    Converged,
    /// The sweep budget ran out before convergence
    MaxIterations,
    /// The stop flag was raised between sweeps
    Cancelled,
}

/// Result of the optimization process
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Lagrange multipliers, one per training sample
    pub alpha: Vec<f64>,
    /// Bias term (b)
    pub b: f64,
    /// Indices of support vectors (alpha above the numerical-zero threshold)
    pub support_vectors: Vec<usize>,
    /// Number of sweeps performed
    pub iterations: u64,
    /// Number of accepted pair updates
    pub updates: u64,
    /// Final dual objective value
    pub objective_value: f64,
    pub termination: Termination,
}

/// Configuration for the SMO trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Tolerance for KKT conditions
    pub tol: f64,
    /// Maximum number of sweeps; `None` runs until convergence
    pub max_iter: Option<u64>,
    /// Seed for the randomized fallback scans
    pub rng_seed: u64,
    /// Kernel cache size in bytes
    pub cache_size: usize,
    /// Relative threshold under which an alpha step is ignored
    pub step_eps: f64,
    /// Distance from 0 or C at which an alpha counts as bound
    pub bound_eps: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tol: 1e-3,
            max_iter: Some(10_000),
            rng_seed: 0,
            cache_size: 100_000_000, // 100MB
            step_eps: 1e-5,
            bound_eps: 1e-8,
        }
    }
}

impl TrainerConfig {
    /// Check hyperparameters before training starts
    pub fn validate(&self) -> Result<()> {
        if !self.c.is_finite() || self.c <= 0.0 {
            return Err(SVMError::InvalidHyperparameter(format!(
                "C must be positive and finite, got {}",
                self.c
            )));
        }
        if !self.tol.is_finite() || self.tol <= 0.0 {
            return Err(SVMError::InvalidHyperparameter(format!(
                "tol must be positive and finite, got {}",
                self.tol
            )));
        }
        if !self.step_eps.is_finite() || self.step_eps <= 0.0 {
            return Err(SVMError::InvalidHyperparameter(format!(
                "step_eps must be positive and finite, got {}",
                self.step_eps
            )));
        }
        if !self.bound_eps.is_finite() || self.bound_eps < 0.0 || self.bound_eps >= self.c {
            return Err(SVMError::InvalidHyperparameter(format!(
                "bound_eps must lie in [0, C), got {}",
                self.bound_eps
            )));
        }
        Ok(())
    }
}
