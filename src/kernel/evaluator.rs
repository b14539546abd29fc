//! Index-based kernel evaluators used by the solver

use crate::cache::{CacheStats, KernelCache};
use crate::core::{Result, SVMError, Sample};
use crate::kernel::{Kernel, KernelEvaluator};
use std::sync::{Mutex, PoisonError};

/// Evaluates a [`Kernel`] over training samples, memoizing values in an LRU cache
pub struct SampleKernel<'a, K: Kernel> {
    kernel: &'a K,
    samples: &'a [Sample],
    cache: Mutex<KernelCache>,
}

impl<'a, K: Kernel> SampleKernel<'a, K> {
    pub fn new(kernel: &'a K, samples: &'a [Sample], cache_size: usize) -> Self {
        Self {
            kernel,
            samples,
            cache: Mutex::new(KernelCache::with_memory_limit(cache_size)),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
    }
}

impl<K: Kernel> KernelEvaluator for SampleKernel<'_, K> {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn evaluate(&self, i: usize, j: usize) -> Result<f64> {
        let (x, y) = match (self.samples.get(i), self.samples.get(j)) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                return Err(SVMError::KernelEvaluation(format!(
                    "index pair ({i}, {j}) out of range for {} samples",
                    self.samples.len()
                )))
            }
        };

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get_or_try_insert(i, j, || {
            let value = self.kernel.compute(&x.features, &y.features);
            if value.is_finite() {
                Ok(value)
            } else {
                Err(SVMError::KernelEvaluation(format!(
                    "non-finite kernel value {value} for samples ({i}, {j})"
                )))
            }
        })
    }
}

/// Kernel evaluator backed by a precomputed Gram matrix (row-major)
#[derive(Debug, Clone, PartialEq)]
pub struct PrecomputedKernel {
    n: usize,
    values: Vec<f64>,
}

impl PrecomputedKernel {
    /// Build from a square matrix given as rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut values = Vec::with_capacity(n * n);
        for row in rows {
            if row.len() != n {
                return Err(SVMError::DimensionMismatch {
                    expected: n,
                    actual: row.len(),
                });
            }
            values.extend(row);
        }
        Ok(Self { n, values })
    }

    /// Compute the full Gram matrix of `kernel` over `samples`
    pub fn from_samples<K: Kernel>(kernel: &K, samples: &[Sample]) -> Self {
        let n = samples.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                let value = kernel.compute(&samples[i].features, &samples[j].features);
                values[i * n + j] = value;
                values[j * n + i] = value;
            }
        }
        Self { n, values }
    }
}

impl KernelEvaluator for PrecomputedKernel {
    fn len(&self) -> usize {
        self.n
    }

    fn evaluate(&self, i: usize, j: usize) -> Result<f64> {
        if i >= self.n || j >= self.n {
            return Err(SVMError::KernelEvaluation(format!(
                "index pair ({i}, {j}) out of range for {}x{} Gram matrix",
                self.n, self.n
            )));
        }
        let value = self.values[i * self.n + j];
        if !value.is_finite() {
            return Err(SVMError::KernelEvaluation(format!(
                "non-finite Gram entry {value} at ({i}, {j})"
            )));
        }
        Ok(value)
    }
}
