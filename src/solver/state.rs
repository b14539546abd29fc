//! Mutable training state shared by the solver components for one run

use crate::core::Result;
use crate::kernel::KernelEvaluator;
use crate::solver::{AlphaStore, ErrorCache, PairDelta};
use log::debug;

/// Alphas, bias and error cache for one training run, plus read-only inputs
pub struct SolverState<'a> {
    pub(crate) labels: &'a [f64],
    pub(crate) kernel: &'a dyn KernelEvaluator,
    pub(crate) alphas: AlphaStore,
    pub(crate) errors: ErrorCache,
    pub(crate) bias: f64,
}

impl<'a> SolverState<'a> {
    /// Start at alpha = 0, b = 0
    pub fn new(labels: &'a [f64], kernel: &'a dyn KernelEvaluator, c: f64, bound_eps: f64) -> Self {
        Self {
            labels,
            kernel,
            alphas: AlphaStore::new(labels.len(), c, bound_eps),
            errors: ErrorCache::new(labels),
            bias: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, i: usize) -> f64 {
        self.labels[i]
    }

    pub fn alphas(&self) -> &AlphaStore {
        &self.alphas
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn error(&self, i: usize) -> Result<f64> {
        self.errors
            .error(i, &self.alphas, self.labels, self.kernel, self.bias)
    }

    pub fn decision_value(&self, i: usize) -> Result<f64> {
        self.errors
            .decision_value(i, &self.alphas, self.labels, self.kernel, self.bias)
    }

    /// Write an accepted pair update and bring the error cache up to date
    pub(crate) fn commit(
        &mut self,
        i: usize,
        alpha_i: f64,
        j: usize,
        alpha_j: f64,
        bias: f64,
    ) -> Result<()> {
        let delta = PairDelta {
            i,
            j,
            y_delta_i: self.labels[i] * (alpha_i - self.alphas.get(i)),
            y_delta_j: self.labels[j] * (alpha_j - self.alphas.get(j)),
            delta_bias: bias - self.bias,
        };
        self.alphas.set(i, alpha_i);
        self.alphas.set(j, alpha_j);
        self.bias = bias;
        self.errors
            .refresh_after_update(&delta, &self.alphas, self.labels, self.kernel, self.bias)?;

        debug_assert!(
            self.alphas.weighted_sum(self.labels).abs() < 1e-6,
            "equality constraint drifted to {}",
            self.alphas.weighted_sum(self.labels)
        );
        Ok(())
    }

    /// Recompute all non-bound cached errors
    pub(crate) fn resync_errors(&mut self) -> Result<()> {
        self.errors
            .resync(&self.alphas, self.labels, self.kernel, self.bias)
    }

    /// Re-place b when every alpha sits at 0 or C
    ///
    /// No pair step pins b in that case, so it is moved to the middle of
    /// the interval the bound samples allow: y_k - (f(x_k) - b) is a lower
    /// bound on b for (alpha = 0, y = +1) and (alpha = C, y = -1), an upper
    /// bound otherwise. With one side empty the other bound is used.
    pub(crate) fn reestimate_bias_from_bounds(&mut self) -> Result<()> {
        if self.alphas.non_bound_indices().next().is_some() {
            return Ok(());
        }

        let mut lower = f64::NEG_INFINITY;
        let mut upper = f64::INFINITY;
        for k in 0..self.len() {
            let threshold = self.labels[k] - (self.decision_value(k)? - self.bias);
            if (self.labels[k] > 0.0) != self.alphas.is_at_upper(k) {
                lower = lower.max(threshold);
            } else {
                upper = upper.min(threshold);
            }
        }

        let bias = match (lower.is_finite(), upper.is_finite()) {
            (true, true) => (lower + upper) / 2.0,
            (true, false) => lower,
            (false, true) => upper,
            (false, false) => return Ok(()),
        };
        if bias != self.bias {
            debug!(
                "no non-bound alphas; bias {:.6} -> {bias:.6} from [{lower:.6}, {upper:.6}]",
                self.bias
            );
            self.bias = bias;
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (AlphaStore, f64) {
        (self.alphas, self.bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PrecomputedKernel;
    use approx::assert_relative_eq;

    fn line_kernel(points: &[f64]) -> PrecomputedKernel {
        let rows = points
            .iter()
            .map(|&a| points.iter().map(|&b| a * b).collect())
            .collect();
        PrecomputedKernel::from_rows(rows).unwrap()
    }

    #[test]
    fn test_bias_moves_to_middle_of_bound_interval() {
        let labels = [1.0, -1.0, 1.0, -1.0];
        let kernel = line_kernel(&[1.0, -2.0, 5.0, -4.0]);
        let mut state = SolverState::new(&labels, &kernel, 0.1, 1e-8);
        state.alphas.set(0, 0.1);
        state.alphas.set(1, 0.1);

        // w = 0.3, so b must lie in [-0.4, 0.2]
        state.reestimate_bias_from_bounds().unwrap();
        assert_relative_eq!(state.bias(), -0.1, epsilon = 1e-12);
        for k in 0..4 {
            let margin = labels[k] * state.decision_value(k).unwrap();
            if state.alphas().get(k) == 0.0 {
                assert!(margin >= 1.0);
            } else {
                assert!(margin <= 1.0);
            }
        }
    }

    #[test]
    fn test_bias_kept_while_some_alpha_is_free() {
        let labels = [1.0, -1.0, 1.0, -1.0];
        let kernel = line_kernel(&[1.0, -2.0, 5.0, -4.0]);
        let mut state = SolverState::new(&labels, &kernel, 1.0, 1e-8);
        state.alphas.set(0, 0.1);
        state.alphas.set(1, 0.1);
        state.bias = 0.25;

        state.reestimate_bias_from_bounds().unwrap();
        assert_eq!(state.bias(), 0.25);
    }

    #[test]
    fn test_commit_keeps_every_free_error_current() {
        let labels = [1.0, -1.0, 1.0, -1.0];
        let kernel = line_kernel(&[1.0, -2.0, 5.0, -4.0]);
        let mut state = SolverState::new(&labels, &kernel, 1.0, 1e-8);
        state.commit(0, 0.2, 1, 0.2, 0.1).unwrap();
        state.commit(2, 0.3, 3, 0.3, -0.2).unwrap();
        // Pair (0, 1) is untouched by the second commit but its errors follow it
        state.commit(2, 0.4, 3, 0.4, -0.3).unwrap();

        for k in 0..4 {
            let fresh = state.decision_value(k).unwrap() - labels[k];
            assert_relative_eq!(state.errors.cached(k), fresh, epsilon = 1e-12);
        }
    }
}
