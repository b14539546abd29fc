//! Kernel trait definitions

use crate::core::{Result, SparseVector};

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
/// Implementations must be deterministic and symmetric.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;
}

/// Kernel access by training-sample index
///
/// This is the only view of the training data the solver has. `evaluate`
/// must be deterministic and symmetric, with `evaluate(i, i) >= 0`. Errors
/// are propagated out of training unchanged.
pub trait KernelEvaluator: Send + Sync {
    /// Number of training samples addressable by index
    fn len(&self) -> usize;

    /// K(x_i, x_j)
    fn evaluate(&self, i: usize, j: usize) -> Result<f64>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
