//! Trained model
//!
//! A [`Model`] is built once from an [`OptimizationResult`] and never
//! changes afterwards. It keeps the support vectors themselves so it can
//! score unseen feature vectors.

use crate::api::EvaluationMetrics;
use crate::core::{OptimizationResult, SVMModel, Sample, SparseVector, Termination};
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of a finished training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model<K> {
    kernel: K,
    alphas: Vec<f64>,
    bias: f64,
    support_vector_indices: Vec<usize>,
    support_vectors: Vec<Sample>,
    iterations: u64,
    termination: Termination,
}

impl<K: Kernel> Model<K> {
    pub(crate) fn new(kernel: K, training_samples: &[Sample], result: OptimizationResult) -> Self {
        let support_vectors = result
            .support_vectors
            .iter()
            .map(|&i| training_samples[i].clone())
            .collect();

        Self {
            kernel,
            alphas: result.alpha,
            bias: result.b,
            support_vector_indices: result.support_vectors,
            support_vectors,
            iterations: result.iterations,
            termination: result.termination,
        }
    }

    /// Σ alpha_i * y_i * K(x_i, x) + b over the support vectors
    pub fn decision_value(&self, x: &SparseVector) -> f64 {
        let sum: f64 = self
            .support_vector_indices
            .iter()
            .zip(&self.support_vectors)
            .map(|(&i, sv)| self.alphas[i] * sv.label * self.kernel.compute(&sv.features, x))
            .sum();
        sum + self.bias
    }

    /// One alpha per training sample
    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_vector_indices
    }

    pub fn support_vectors(&self) -> &[Sample] {
        &self.support_vectors
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Sweeps the solver ran
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Fraction of `samples` whose label matches the predicted sign
    pub fn evaluate(&self, samples: &[Sample]) -> f64 {
        self.evaluate_detailed(samples).accuracy()
    }

    /// Confusion counts over `samples`
    pub fn evaluate_detailed(&self, samples: &[Sample]) -> EvaluationMetrics {
        let mut metrics = EvaluationMetrics::default();
        for sample in samples {
            let predicted = self.predict(&sample.features).label > 0.0;
            metrics.record(predicted, sample.label > 0.0);
        }
        metrics
    }

    /// Check the internal shape, used after deserialization
    pub(crate) fn is_consistent(&self) -> bool {
        self.support_vector_indices.len() == self.support_vectors.len()
            && self
                .support_vector_indices
                .iter()
                .all(|&i| i < self.alphas.len())
    }
}

impl<K: Kernel> SVMModel for Model<K> {
    fn decision_function(&self, x: &SparseVector) -> f64 {
        self.decision_value(x)
    }

    fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::LinearKernel;

    fn model() -> Model<LinearKernel> {
        let samples = vec![
            Sample::dense(&[1.0], 1.0),
            Sample::dense(&[-1.0], -1.0),
            Sample::dense(&[3.0], 1.0),
        ];
        let result = OptimizationResult {
            alpha: vec![0.5, 0.5, 0.0],
            b: 0.0,
            support_vectors: vec![0, 1],
            iterations: 3,
            updates: 1,
            objective_value: 0.5,
            termination: Termination::Converged,
        };
        Model::new(LinearKernel::new(), &samples, result)
    }

    #[test]
    fn test_model_keeps_support_vectors_only() {
        let model = model();
        assert_eq!(model.alphas(), &[0.5, 0.5, 0.0]);
        assert_eq!(model.support_vector_indices(), &[0, 1]);
        assert_eq!(model.n_support_vectors(), 2);
        assert_eq!(model.support_vectors()[1].label, -1.0);
        assert!(model.is_consistent());
    }

    #[test]
    fn test_decision_value() {
        let model = model();
        // w = 0.5 * 1 + 0.5 * 1 = 1
        assert_eq!(model.decision_value(&SparseVector::from_dense(&[2.0])), 2.0);
        assert_eq!(model.predict(&SparseVector::from_dense(&[-0.5])).label, -1.0);
    }

    #[test]
    fn test_evaluate() {
        let model = model();
        let samples = vec![
            Sample::dense(&[2.0], 1.0),
            Sample::dense(&[-2.0], -1.0),
            Sample::dense(&[-1.0], 1.0),
            Sample::dense(&[4.0], 1.0),
        ];
        assert_eq!(model.evaluate(&samples), 0.75);

        let metrics = model.evaluate_detailed(&samples);
        assert_eq!(metrics.true_positives, 2);
        assert_eq!(metrics.true_negatives, 1);
        assert_eq!(metrics.false_negatives, 1);
        assert_eq!(metrics.false_positives, 0);
    }
}
