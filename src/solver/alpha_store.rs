//! Dual coefficient storage
//!
//! Owns the alpha vector and the box bound C. Every alpha stays in [0, C];
//! callers clip before calling [`AlphaStore::set`].

/// Alpha values for every training sample plus the box bound
#[derive(Debug, Clone)]
pub struct AlphaStore {
    alphas: Vec<f64>,
    c: f64,
    bound_eps: f64,
}

impl AlphaStore {
    /// All alphas start at zero
    pub fn new(n: usize, c: f64, bound_eps: f64) -> Self {
        Self {
            alphas: vec![0.0; n],
            c,
            bound_eps,
        }
    }

    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn get(&self, i: usize) -> f64 {
        self.alphas[i]
    }

    /// # Panics
    /// Panics if `value` lies outside [0, C]
    pub fn set(&mut self, i: usize, value: f64) {
        assert!(
            (0.0..=self.c).contains(&value),
            "alpha[{i}] = {value} outside [0, {}]",
            self.c
        );
        self.alphas[i] = value;
    }

    /// Whether a value sits at 0 or C, within the bound tolerance
    pub fn is_bound_value(&self, value: f64) -> bool {
        value <= self.bound_eps || value >= self.c - self.bound_eps
    }

    pub fn is_bound(&self, i: usize) -> bool {
        self.is_bound_value(self.alphas[i])
    }

    /// Whether alpha_i sits at C, within the bound tolerance
    pub fn is_at_upper(&self, i: usize) -> bool {
        self.alphas[i] >= self.c - self.bound_eps
    }

    /// Indices with 0 < alpha < C, read from the current values
    pub fn non_bound_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.alphas
            .iter()
            .enumerate()
            .filter(|&(_, &a)| !self.is_bound_value(a))
            .map(|(i, _)| i)
    }

    /// Indices with non-zero alpha
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.alphas
            .iter()
            .enumerate()
            .filter(|&(_, &a)| a > 0.0)
            .map(|(i, _)| i)
    }

    /// Σ alpha_i * y_i, zero for a feasible point
    pub fn weighted_sum(&self, labels: &[f64]) -> f64 {
        self.alphas.iter().zip(labels).map(|(a, y)| a * y).sum()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.alphas
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.alphas
    }
}
