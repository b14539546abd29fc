//! Core traits

use crate::core::{Prediction, SparseVector};

/// Trained SVM model
pub trait SVMModel {
    /// Signed decision value for a feature vector
    fn decision_function(&self, x: &SparseVector) -> f64;

    /// Predict a single feature vector
    fn predict(&self, x: &SparseVector) -> Prediction {
        Prediction::from_decision_value(self.decision_function(x))
    }

    /// Predict multiple feature vectors
    fn predict_batch(&self, xs: &[SparseVector]) -> Vec<Prediction> {
        xs.iter().map(|x| self.predict(x)).collect()
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}
