//! Kernelized binary Support Vector Machine training with Sequential
//! Minimal Optimization
//!
//! Based on "Sequential Minimal Optimization: A Fast Algorithm for Training
//! Support Vector Machines" by John C. Platt

pub mod api;
pub mod cache;
pub mod core;
pub mod kernel;
pub mod model;
pub mod persistence;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{predict, train, EvaluationMetrics, SVM};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError, TrainError};
pub use crate::kernel::{
    Kernel, KernelEvaluator, LinearKernel, PolynomialKernel, PrecomputedKernel, RBFKernel,
    SampleKernel,
};
pub use crate::model::Model;
pub use crate::solver::SMOSolver;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
