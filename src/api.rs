//! High-level training and prediction interface
//!
//! # Quick Start
//!
//! ```rust
//! use rsmo::api::{predict, SVM};
//! use rsmo::Sample;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let samples = vec![
//!     Sample::dense(&[2.0, 2.0], 1.0),
//!     Sample::dense(&[2.0, 3.0], 1.0),
//!     Sample::dense(&[-2.0, -2.0], -1.0),
//!     Sample::dense(&[-2.0, -3.0], -1.0),
//! ];
//!
//! let model = SVM::new().with_c(1.0).with_tol(1e-3).train(&samples)?;
//! assert!(predict(&model, &Sample::dense(&[5.0, 5.0], 1.0).features) > 0.0);
//! # Ok(())
//! # }
//! ```

use crate::core::{Result, SVMError, Sample, SparseVector, TrainerConfig};
use crate::kernel::{Kernel, LinearKernel, SampleKernel};
use crate::model::Model;
use crate::solver::SMOSolver;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Train a binary SVM with SMO
///
/// `max_iter` bounds the number of sweeps; `None` runs until convergence.
/// Running out of sweeps still returns a model.
pub fn train<K: Kernel>(
    samples: &[Sample],
    c: f64,
    tol: f64,
    max_iter: Option<u64>,
    kernel: K,
    rng_seed: u64,
) -> Result<Model<K>> {
    SVM::with_kernel(kernel)
        .with_c(c)
        .with_tol(tol)
        .with_max_iter(max_iter)
        .with_seed(rng_seed)
        .train(samples)
}

/// Signed decision value of `model` at `x`; the sign is the predicted class
pub fn predict<K: Kernel>(model: &Model<K>, x: &SparseVector) -> f64 {
    model.decision_value(x)
}

/// SVM trainer with builder-style configuration
pub struct SVM<K: Kernel = LinearKernel> {
    kernel: K,
    config: TrainerConfig,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl SVM<LinearKernel> {
    /// Linear kernel, default parameters
    pub fn new() -> Self {
        Self::with_kernel(LinearKernel::new())
    }
}

impl Default for SVM<LinearKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kernel> SVM<K> {
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel,
            config: TrainerConfig::default(),
            stop_flag: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: TrainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set KKT tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.config.tol = tol;
        self
    }

    /// Set the sweep budget; `None` is unbounded
    pub fn with_max_iter(mut self, max_iter: Option<u64>) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    /// Seed for the randomized partner scans
    pub fn with_seed(mut self, rng_seed: u64) -> Self {
        self.config.rng_seed = rng_seed;
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    /// Stop between sweeps once `flag` is set
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on samples
    pub fn train(self, samples: &[Sample]) -> Result<Model<K>> {
        for sample in samples {
            let features = &sample.features;
            if features.indices.len() != features.values.len() {
                return Err(SVMError::DimensionMismatch {
                    expected: features.indices.len(),
                    actual: features.values.len(),
                });
            }
        }

        let labels: Vec<f64> = samples.iter().map(|s| s.label).collect();
        let evaluator = SampleKernel::new(&self.kernel, samples, self.config.cache_size);

        let mut solver = SMOSolver::new(self.config);
        if let Some(flag) = self.stop_flag {
            solver = solver.with_stop_flag(flag);
        }
        let result = solver.solve(&labels, &evaluator)?;

        let stats = evaluator.cache_stats();
        log::debug!(
            "kernel cache: {} hits, {} misses ({} entries)",
            stats.hits,
            stats.misses,
            stats.size
        );

        Ok(Model::new(self.kernel, samples, result))
    }
}

/// Confusion-matrix counts for binary predictions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    pub(crate) fn record(&mut self, predicted_positive: bool, actual_positive: bool) {
        match (predicted_positive, actual_positive) {
            (true, true) => self.true_positives += 1,
            (false, false) => self.true_negatives += 1,
            (true, false) => self.false_positives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// (TP + TN) / total
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
