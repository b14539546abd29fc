//! Outer-loop scan and second-index heuristics

use crate::core::Result;
use crate::solver::{AlphaPairUpdater, SolverState};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Which samples a sweep visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Every sample, in index order
    Full,
    /// Only samples with 0 < alpha < C at the time they are reached
    NonBound,
}

/// Picks KKT violators and partners for them
///
/// Fallback scans use a permutation drawn from a seeded generator, so the
/// same seed always reproduces the same sequence of pair attempts.
pub struct PairSelector {
    updater: AlphaPairUpdater,
    tol: f64,
    rng: StdRng,
}

impl PairSelector {
    pub fn new(updater: AlphaPairUpdater, tol: f64, rng_seed: u64) -> Self {
        Self {
            updater,
            tol,
            rng: StdRng::seed_from_u64(rng_seed),
        }
    }

    /// Run one sweep and return the number of accepted pair updates
    pub fn sweep(&mut self, mode: SweepMode, state: &mut SolverState<'_>) -> Result<u64> {
        let mut changed = 0;
        for i in 0..state.len() {
            if mode == SweepMode::NonBound && state.alphas().is_bound(i) {
                continue;
            }
            if self.examine(i, state)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// KKT check for sample `i` given its error
    pub fn violates_kkt(&self, state: &SolverState<'_>, i: usize, e_i: f64) -> bool {
        let r_i = state.label(i) * e_i;
        let alpha_i = state.alphas().get(i);
        (r_i < -self.tol && alpha_i < state.alphas().c()) || (r_i > self.tol && alpha_i > 0.0)
    }

    /// Try to make progress on sample `i`; true if some pair was updated
    pub fn examine(&mut self, i: usize, state: &mut SolverState<'_>) -> Result<bool> {
        let e_i = state.error(i)?;
        if !self.violates_kkt(state, i, e_i) {
            return Ok(false);
        }

        if let Some(j) = max_step_partner(state, i, e_i) {
            if self.updater.take_step(state, i, j)?.is_updated() {
                return Ok(true);
            }
        }

        let mut non_bound: Vec<usize> = state.alphas().non_bound_indices().collect();
        non_bound.shuffle(&mut self.rng);
        for j in non_bound {
            if self.updater.take_step(state, i, j)?.is_updated() {
                return Ok(true);
            }
        }

        let mut all: Vec<usize> = (0..state.len()).collect();
        all.shuffle(&mut self.rng);
        for j in all {
            if self.updater.take_step(state, i, j)?.is_updated() {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Non-bound k != i maximizing |E_i - E_k|; first index wins ties
fn max_step_partner(state: &SolverState<'_>, i: usize, e_i: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for k in state.alphas().non_bound_indices().filter(|&k| k != i) {
        let step = (e_i - state.errors.cached(k)).abs();
        if best.map_or(true, |(_, best_step)| step > best_step) {
            best = Some((k, step));
        }
    }
    best.map(|(k, _)| k)
}
