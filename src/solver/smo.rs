//! Sequential Minimal Optimization (SMO) driver
//!
//! Platt's outer loop: alternate full sweeps and non-bound sweeps until a
//! full sweep changes nothing, or the sweep budget runs out.

use crate::core::{OptimizationResult, Result, SVMError, Termination, TrainerConfig};
use crate::kernel::KernelEvaluator;
use crate::solver::{AlphaPairUpdater, AlphaStore, PairSelector, SolverState, SweepMode};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outer-loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    FullSweep,
    NonBoundSweep,
    Done,
}

impl SweepState {
    /// Transition after a sweep that made `changed` updates
    pub fn next(self, changed: u64) -> Self {
        match (self, changed) {
            (SweepState::FullSweep, 0) => SweepState::Done,
            (SweepState::FullSweep, _) => SweepState::NonBoundSweep,
            (SweepState::NonBoundSweep, 0) => SweepState::FullSweep,
            (SweepState::NonBoundSweep, _) => SweepState::NonBoundSweep,
            (SweepState::Done, _) => SweepState::Done,
        }
    }

    fn mode(self) -> Option<SweepMode> {
        match self {
            SweepState::FullSweep => Some(SweepMode::Full),
            SweepState::NonBoundSweep => Some(SweepMode::NonBound),
            SweepState::Done => None,
        }
    }
}

/// SMO solver for the binary L1 soft-margin SVM dual
pub struct SMOSolver {
    config: TrainerConfig,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl SMOSolver {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            stop_flag: None,
        }
    }

    /// Check `flag` between sweeps and stop early once it is set
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Solve the dual problem for `labels` under `kernel`
    ///
    /// Inputs are validated before any optimization happens. Kernel errors
    /// abort training and are returned unchanged.
    pub fn solve(
        &self,
        labels: &[f64],
        kernel: &dyn KernelEvaluator,
    ) -> Result<OptimizationResult> {
        self.config.validate()?;
        validate_labels(labels)?;
        if kernel.len() != labels.len() {
            return Err(SVMError::DimensionMismatch {
                expected: labels.len(),
                actual: kernel.len(),
            });
        }

        let n = labels.len();
        info!(
            "Training SMO on {n} samples (C = {}, tol = {}, max_iter = {:?})",
            self.config.c, self.config.tol, self.config.max_iter
        );
        if labels.iter().all(|&y| y == labels[0]) {
            warn!("All {n} samples share label {}; no pair can move", labels[0]);
        }

        let mut state = SolverState::new(labels, kernel, self.config.c, self.config.bound_eps);
        let updater = AlphaPairUpdater::new(self.config.step_eps, self.config.bound_eps);
        let mut selector = PairSelector::new(updater, self.config.tol, self.config.rng_seed);

        let mut sweep_state = SweepState::FullSweep;
        let mut iterations: u64 = 0;
        let mut updates: u64 = 0;

        let termination = loop {
            let Some(mode) = sweep_state.mode() else {
                break Termination::Converged;
            };
            if self.config.max_iter.is_some_and(|max| iterations >= max) {
                warn!("Stopped after {iterations} sweeps without convergence");
                break Termination::MaxIterations;
            }
            if self.is_cancelled() {
                warn!("Training cancelled after {iterations} sweeps");
                break Termination::Cancelled;
            }

            if mode == SweepMode::Full {
                state.reestimate_bias_from_bounds()?;
                state.resync_errors()?;
            }
            let changed = selector.sweep(mode, &mut state)?;
            iterations += 1;
            updates += changed;
            debug!("sweep {iterations} ({mode:?}): {changed} pairs changed");

            sweep_state = sweep_state.next(changed);
        };

        let (alphas, bias) = state.into_parts();
        let support_vectors: Vec<usize> = alphas
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > self.config.bound_eps)
            .map(|(i, _)| i)
            .collect();
        let objective_value = dual_objective(&alphas, labels, kernel)?;

        info!(
            "SMO finished ({termination:?}): {iterations} sweeps, {updates} updates, {} support vectors, b = {bias:.6}",
            support_vectors.len()
        );

        Ok(OptimizationResult {
            alpha: alphas.into_vec(),
            b: bias,
            support_vectors,
            iterations,
            updates,
            objective_value,
            termination,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Labels must be exactly +1 or -1, and there must be at least one
pub(crate) fn validate_labels(labels: &[f64]) -> Result<()> {
    if labels.is_empty() {
        return Err(SVMError::EmptyDataset);
    }
    for (index, &label) in labels.iter().enumerate() {
        if label != 1.0 && label != -1.0 {
            return Err(SVMError::InvalidLabel { index, label });
        }
    }
    Ok(())
}

/// W(alpha) = Σ alpha_i - ½ Σ_i Σ_j alpha_i alpha_j y_i y_j K_ij
fn dual_objective(alphas: &AlphaStore, labels: &[f64], kernel: &dyn KernelEvaluator) -> Result<f64> {
    let active: Vec<usize> = alphas.active_indices().collect();
    let mut linear = 0.0;
    let mut quadratic = 0.0;
    for &i in &active {
        let a_i = alphas.get(i);
        linear += a_i;
        for &j in &active {
            quadratic += a_i * alphas.get(j) * labels[i] * labels[j] * kernel.evaluate(i, j)?;
        }
    }
    Ok(linear - 0.5 * quadratic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Sample, SparseVector};
    use crate::kernel::{LinearKernel, PrecomputedKernel, SampleKernel};
    use approx::assert_relative_eq;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn line_samples() -> Vec<Sample> {
        vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![0.5]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-0.5]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![1.5]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.5]), -1.0),
        ]
    }

    fn labels(samples: &[Sample]) -> Vec<f64> {
        samples.iter().map(|s| s.label).collect()
    }

    /// Simple kernel evaluator that fails on one index
    struct FailingKernel {
        inner: PrecomputedKernel,
        poisoned: usize,
    }

    impl KernelEvaluator for FailingKernel {
        fn len(&self) -> usize {
            self.inner.len()
        }

        fn evaluate(&self, i: usize, j: usize) -> Result<f64> {
            if i == self.poisoned || j == self.poisoned {
                Err(SVMError::KernelEvaluation("sensor offline".to_string()))
            } else {
                self.inner.evaluate(i, j)
            }
        }
    }

    #[test]
    fn test_sweep_state_transitions() {
        assert_eq!(SweepState::FullSweep.next(0), SweepState::Done);
        assert_eq!(SweepState::FullSweep.next(3), SweepState::NonBoundSweep);
        assert_eq!(SweepState::NonBoundSweep.next(0), SweepState::FullSweep);
        assert_eq!(SweepState::NonBoundSweep.next(1), SweepState::NonBoundSweep);
        assert_eq!(SweepState::Done.next(5), SweepState::Done);
    }

    #[test]
    fn test_solver_empty_dataset() {
        let kernel = PrecomputedKernel::from_rows(vec![]).unwrap();
        let solver = SMOSolver::new(TrainerConfig::default());
        assert!(matches!(
            solver.solve(&[], &kernel),
            Err(SVMError::EmptyDataset)
        ));
    }

    #[test]
    fn test_solver_invalid_label() {
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![2.0]), 0.0),
        ];
        let kernel = LinearKernel::new();
        let evaluator = SampleKernel::new(&kernel, &samples, 1024);
        let solver = SMOSolver::new(TrainerConfig::default());

        let err = solver.solve(&labels(&samples), &evaluator).unwrap_err();
        assert!(matches!(err, SVMError::InvalidLabel { index: 1, label } if label == 0.0));
    }

    #[test]
    fn test_solver_kernel_size_mismatch() {
        let kernel = PrecomputedKernel::from_rows(vec![vec![1.0]]).unwrap();
        let solver = SMOSolver::new(TrainerConfig::default());
        assert!(matches!(
            solver.solve(&[1.0, -1.0], &kernel),
            Err(SVMError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_solver_invalid_c() {
        let kernel = PrecomputedKernel::from_rows(vec![vec![1.0]]).unwrap();
        let config = TrainerConfig {
            c: 0.0,
            ..TrainerConfig::default()
        };
        let solver = SMOSolver::new(config);
        assert!(matches!(
            solver.solve(&[1.0], &kernel),
            Err(SVMError::InvalidHyperparameter(_))
        ));
    }

    #[test]
    fn test_solver_converges_on_line() {
        init_logger();
        let samples = line_samples();
        let kernel = LinearKernel::new();
        let evaluator = SampleKernel::new(&kernel, &samples, 1 << 20);
        let solver = SMOSolver::new(TrainerConfig::default());

        let result = solver.solve(&labels(&samples), &evaluator).unwrap();
        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.alpha.len(), 6);
        assert!(!result.support_vectors.is_empty());
        assert!(result.updates > 0);
        assert!(result.objective_value > 0.0);

        let y = labels(&samples);
        let balance: f64 = result.alpha.iter().zip(&y).map(|(a, y)| a * y).sum();
        assert!(balance.abs() < 1e-6);
        assert!(result.alpha.iter().all(|&a| (0.0..=1.0).contains(&a)));
    }

    #[test]
    fn test_solver_hard_margin_solution() {
        // x = +1 / -1 on a line: w = 1, b = 0, alphas = 0.5 each
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.0]), -1.0),
        ];
        let kernel = LinearKernel::new();
        let evaluator = SampleKernel::new(&kernel, &samples, 1024);
        let config = TrainerConfig {
            c: 10.0,
            ..TrainerConfig::default()
        };

        let result = SMOSolver::new(config)
            .solve(&labels(&samples), &evaluator)
            .unwrap();
        assert_relative_eq!(result.alpha[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(result.alpha[1], 0.5, epsilon = 1e-9);
        assert_relative_eq!(result.b, 0.0, epsilon = 1e-9);
        assert_relative_eq!(result.objective_value, 0.5, epsilon = 1e-9);
        assert_eq!(result.support_vectors, vec![0, 1]);
    }

    #[test]
    fn test_solver_max_iterations() {
        let samples = line_samples();
        let kernel = LinearKernel::new();
        let evaluator = SampleKernel::new(&kernel, &samples, 1 << 20);
        let config = TrainerConfig {
            max_iter: Some(1),
            ..TrainerConfig::default()
        };

        let result = SMOSolver::new(config)
            .solve(&labels(&samples), &evaluator)
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.termination, Termination::MaxIterations);
    }

    #[test]
    fn test_solver_zero_budget_returns_initial_point() {
        let kernel = PrecomputedKernel::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let config = TrainerConfig {
            max_iter: Some(0),
            ..TrainerConfig::default()
        };
        let result = SMOSolver::new(config).solve(&[1.0, -1.0], &kernel).unwrap();
        assert_eq!(result.alpha, vec![0.0, 0.0]);
        assert_eq!(result.b, 0.0);
        assert!(result.support_vectors.is_empty());
        assert_eq!(result.termination, Termination::MaxIterations);
    }

    #[test]
    fn test_solver_cancelled_before_first_sweep() {
        let kernel = PrecomputedKernel::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let solver = SMOSolver::new(TrainerConfig::default()).with_stop_flag(flag);

        let result = solver.solve(&[1.0, -1.0], &kernel).unwrap();
        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_solver_single_class_converges_to_zero() {
        let kernel = PrecomputedKernel::from_rows(vec![vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        let result = SMOSolver::new(TrainerConfig::default())
            .solve(&[1.0, 1.0], &kernel)
            .unwrap();
        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.alpha, vec![0.0, 0.0]);
    }

    #[test]
    fn test_solver_single_class_places_bias_on_label_side() {
        let kernel = PrecomputedKernel::from_rows(vec![vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        let result = SMOSolver::new(TrainerConfig::default())
            .solve(&[1.0, 1.0], &kernel)
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.b, 1.0);
    }

    #[test]
    fn test_solver_single_sample() {
        let kernel = PrecomputedKernel::from_rows(vec![vec![4.0]]).unwrap();
        let result = SMOSolver::new(TrainerConfig::default())
            .solve(&[-1.0], &kernel)
            .unwrap();
        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.alpha, vec![0.0]);
        assert_eq!(result.b, -1.0);
    }

    #[test]
    fn test_kernel_error_aborts_training() {
        let inner = PrecomputedKernel::from_rows(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        let kernel = FailingKernel { inner, poisoned: 2 };
        let solver = SMOSolver::new(TrainerConfig::default());

        let err = solver.solve(&[1.0, -1.0, 1.0], &kernel).unwrap_err();
        assert!(matches!(err, SVMError::KernelEvaluation(msg) if msg == "sensor offline"));
    }

    #[test]
    fn test_same_seed_same_result() {
        let samples = line_samples();
        let kernel = LinearKernel::new();
        let y = labels(&samples);
        let config = TrainerConfig {
            rng_seed: 42,
            ..TrainerConfig::default()
        };

        let first = SMOSolver::new(config.clone())
            .solve(&y, &SampleKernel::new(&kernel, &samples, 1 << 20))
            .unwrap();
        let second = SMOSolver::new(config)
            .solve(&y, &SampleKernel::new(&kernel, &samples, 1 << 20))
            .unwrap();
        assert_eq!(first, second);
    }
}
