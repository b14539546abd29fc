//! Joint update of one alpha pair
//!
//! Solves the two-variable subproblem analytically, clips to the box, and
//! moves the bias so that the updated sample's error vanishes.

use crate::core::Result;
use crate::solver::SolverState;
use log::trace;

/// Why a pair was not updated. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// i == j
    SameIndex,
    /// The feasible segment for alpha_j is a single point (L == H)
    EmptyBox,
    /// eta = 2K_ij - K_ii - K_jj is not negative
    NonNegativeEta,
    /// The clipped step is below the numerical threshold
    NegligibleStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Updated,
    Rejected(Rejection),
}

impl PairOutcome {
    pub fn is_updated(self) -> bool {
        self == PairOutcome::Updated
    }
}

/// Everything the analytic step reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairInputs {
    pub y_i: f64,
    pub y_j: f64,
    pub alpha_i: f64,
    pub alpha_j: f64,
    pub e_i: f64,
    pub e_j: f64,
    pub k_ii: f64,
    pub k_jj: f64,
    pub k_ij: f64,
    pub bias: f64,
    pub c: f64,
}

/// New values for an accepted step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairStep {
    pub alpha_i: f64,
    pub alpha_j: f64,
    pub bias: f64,
}

/// Box bounds [L, H] for the new alpha_j
pub fn alpha_j_bounds(input: &PairInputs) -> (f64, f64) {
    let c = input.c;
    if input.y_i != input.y_j {
        let diff = input.alpha_j - input.alpha_i;
        (0.0_f64.max(diff), c.min(c + diff))
    } else {
        let sum = input.alpha_i + input.alpha_j;
        (0.0_f64.max(sum - c), c.min(sum))
    }
}

/// Analytic two-variable step; pure, no state is touched
pub fn compute_step(
    input: &PairInputs,
    step_eps: f64,
    bound_eps: f64,
) -> std::result::Result<PairStep, Rejection> {
    let c = input.c;
    let s = input.y_i * input.y_j;

    let (low, high) = alpha_j_bounds(input);
    if low >= high {
        return Err(Rejection::EmptyBox);
    }

    let eta = 2.0 * input.k_ij - input.k_ii - input.k_jj;
    if eta >= 0.0 {
        return Err(Rejection::NonNegativeEta);
    }

    let unclipped = input.alpha_j - input.y_j * (input.e_i - input.e_j) / eta;
    let mut alpha_j = unclipped.clamp(low, high);
    let mut alpha_i = input.alpha_i + s * (input.alpha_j - alpha_j);
    snap_to_edge(&mut alpha_j, &mut alpha_i, s, c, bound_eps);
    snap_to_edge(&mut alpha_i, &mut alpha_j, s, c, bound_eps);
    // Rounding can still leave either value a hair outside the box
    let alpha_i = alpha_i.clamp(0.0, c);
    let alpha_j = alpha_j.clamp(0.0, c);

    if (alpha_j - input.alpha_j).abs() < step_eps * (alpha_j + input.alpha_j + step_eps) {
        return Err(Rejection::NegligibleStep);
    }

    let delta_i = input.y_i * (alpha_i - input.alpha_i);
    let delta_j = input.y_j * (alpha_j - input.alpha_j);
    let b1 = input.bias - input.e_i - delta_i * input.k_ii - delta_j * input.k_ij;
    let b2 = input.bias - input.e_j - delta_i * input.k_ij - delta_j * input.k_jj;

    let interior = |a: f64| a > bound_eps && a < c - bound_eps;
    let bias = if interior(alpha_i) {
        b1
    } else if interior(alpha_j) {
        b2
    } else {
        (b1 + b2) / 2.0
    };

    Ok(PairStep {
        alpha_i,
        alpha_j,
        bias,
    })
}

/// Move `value` onto 0 or C when it is within `bound_eps` of it
///
/// `partner` absorbs the difference so alpha_i + s * alpha_j is unchanged.
/// Nothing moves if that would push `partner` out of [0, C].
fn snap_to_edge(value: &mut f64, partner: &mut f64, s: f64, c: f64, bound_eps: f64) {
    for edge in [0.0, c] {
        if (*value - edge).abs() < bound_eps {
            let shifted = *partner + s * (*value - edge);
            if (0.0..=c).contains(&shifted) {
                *value = edge;
                *partner = shifted;
            }
            return;
        }
    }
}

/// Applies analytic pair steps to the training state
#[derive(Debug, Clone, Copy)]
pub struct AlphaPairUpdater {
    step_eps: f64,
    bound_eps: f64,
}

impl AlphaPairUpdater {
    pub fn new(step_eps: f64, bound_eps: f64) -> Self {
        Self {
            step_eps,
            bound_eps,
        }
    }

    /// Try to jointly optimize alpha_i and alpha_j
    ///
    /// Only kernel failures are errors; numerical dead ends are reported as
    /// [`PairOutcome::Rejected`].
    pub fn take_step(&self, state: &mut SolverState<'_>, i: usize, j: usize) -> Result<PairOutcome> {
        if i == j {
            return Ok(PairOutcome::Rejected(Rejection::SameIndex));
        }

        let input = PairInputs {
            y_i: state.label(i),
            y_j: state.label(j),
            alpha_i: state.alphas.get(i),
            alpha_j: state.alphas.get(j),
            e_i: state.error(i)?,
            e_j: state.error(j)?,
            k_ii: state.kernel.evaluate(i, i)?,
            k_jj: state.kernel.evaluate(j, j)?,
            k_ij: state.kernel.evaluate(i, j)?,
            bias: state.bias,
            c: state.alphas.c(),
        };

        match compute_step(&input, self.step_eps, self.bound_eps) {
            Ok(step) => {
                trace!(
                    "pair ({i}, {j}): alpha_i {:.6} -> {:.6}, alpha_j {:.6} -> {:.6}, b = {:.6}",
                    input.alpha_i,
                    step.alpha_i,
                    input.alpha_j,
                    step.alpha_j,
                    step.bias
                );
                state.commit(i, step.alpha_i, j, step.alpha_j, step.bias)?;
                Ok(PairOutcome::Updated)
            }
            Err(reason) => Ok(PairOutcome::Rejected(reason)),
        }
    }
}
