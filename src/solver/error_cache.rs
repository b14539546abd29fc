//! Prediction error cache
//!
//! Holds E_i = f(x_i) - y_i for non-bound samples. After every accepted pair
//! update the two touched entries are recomputed and every other non-bound
//! entry is shifted by the change in f, so the cache tracks the current
//! alphas and bias. [`ErrorCache::resync`] clears accumulated rounding.
//! Bound samples are always evaluated fresh.

use crate::core::Result;
use crate::kernel::KernelEvaluator;
use crate::solver::AlphaStore;

#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 512;

/// Change made by one accepted pair step
///
/// `y_delta_i` is y_i * (alpha_i_new - alpha_i_old), likewise for j.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairDelta {
    pub i: usize,
    pub j: usize,
    pub y_delta_i: f64,
    pub y_delta_j: f64,
    pub delta_bias: f64,
}

/// Cached errors, one slot per training sample
#[derive(Debug, Clone)]
pub struct ErrorCache {
    errors: Vec<f64>,
}

impl ErrorCache {
    /// With all alphas and the bias at zero, f(x_i) = 0 and E_i = -y_i
    pub fn new(labels: &[f64]) -> Self {
        Self {
            errors: labels.iter().map(|&y| -y).collect(),
        }
    }

    /// f(x_i) = Σ_k alpha_k * y_k * K(x_k, x_i) + b over samples with alpha_k > 0
    pub fn decision_value(
        &self,
        i: usize,
        alphas: &AlphaStore,
        labels: &[f64],
        kernel: &dyn KernelEvaluator,
        bias: f64,
    ) -> Result<f64> {
        Ok(weighted_kernel_sum(i, alphas, labels, kernel)? + bias)
    }

    /// E_i, served from the cache when alpha_i is non-bound
    pub fn error(
        &self,
        i: usize,
        alphas: &AlphaStore,
        labels: &[f64],
        kernel: &dyn KernelEvaluator,
        bias: f64,
    ) -> Result<f64> {
        if alphas.is_bound(i) {
            Ok(self.decision_value(i, alphas, labels, kernel, bias)? - labels[i])
        } else {
            Ok(self.errors[i])
        }
    }

    /// Cached entry for `i`, regardless of bound status
    pub fn cached(&self, i: usize) -> f64 {
        self.errors[i]
    }

    /// Bring the cache in line with a committed pair update
    ///
    /// E_i and E_j are recomputed. Every other non-bound E_k moves by
    /// y_i Δalpha_i K_ik + y_j Δalpha_j K_jk + Δb.
    pub fn refresh_after_update(
        &mut self,
        delta: &PairDelta,
        alphas: &AlphaStore,
        labels: &[f64],
        kernel: &dyn KernelEvaluator,
        bias: f64,
    ) -> Result<()> {
        let (i, j) = (delta.i, delta.j);
        for k in alphas.non_bound_indices() {
            if k == i || k == j {
                continue;
            }
            self.errors[k] += delta.y_delta_i * kernel.evaluate(i, k)?
                + delta.y_delta_j * kernel.evaluate(j, k)?
                + delta.delta_bias;
        }
        for k in [i, j] {
            self.errors[k] = self.decision_value(k, alphas, labels, kernel, bias)? - labels[k];
        }
        Ok(())
    }

    /// Recompute every non-bound entry from scratch
    pub fn resync(
        &mut self,
        alphas: &AlphaStore,
        labels: &[f64],
        kernel: &dyn KernelEvaluator,
        bias: f64,
    ) -> Result<()> {
        for k in alphas.non_bound_indices() {
            self.errors[k] = self.decision_value(k, alphas, labels, kernel, bias)? - labels[k];
        }
        Ok(())
    }
}

#[cfg(not(feature = "parallel"))]
fn weighted_kernel_sum(
    i: usize,
    alphas: &AlphaStore,
    labels: &[f64],
    kernel: &dyn KernelEvaluator,
) -> Result<f64> {
    alphas
        .active_indices()
        .map(|k| -> Result<f64> { Ok(alphas.get(k) * labels[k] * kernel.evaluate(k, i)?) })
        .sum()
}

#[cfg(feature = "parallel")]
fn weighted_kernel_sum(
    i: usize,
    alphas: &AlphaStore,
    labels: &[f64],
    kernel: &dyn KernelEvaluator,
) -> Result<f64> {
    use rayon::prelude::*;

    let active: Vec<usize> = alphas.active_indices().collect();
    let term = |&k: &usize| -> Result<f64> { Ok(alphas.get(k) * labels[k] * kernel.evaluate(k, i)?) };
    if active.len() >= PARALLEL_THRESHOLD {
        active.par_iter().map(term).sum()
    } else {
        active.iter().map(term).sum()
    }
}
