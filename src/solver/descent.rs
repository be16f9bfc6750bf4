//! Steepest descent on the merit `½‖R‖²`, used where Newton stalls.

use log::{debug, trace};
use nalgebra::DVector;

use crate::{
    elements::EvalMode,
    error::StaticsResult,
    solver::{
        newton::{line_search, LocalOutcome, Stall},
        problem::{Candidate, Problem},
    },
};

/// Cauchy steps along `-JᵀR`, each scaled by `‖g‖² / ‖Jg‖²` before backtracking.
pub fn run(
    problem: &mut Problem<'_>,
    start: Candidate,
    mode: EvalMode,
    tolerance: f64,
    max_steps: usize,
) -> StaticsResult<LocalOutcome> {
    let mut current = start;
    let mut steps = 0;
    let mut stall = None;

    while current.norm >= tolerance && steps < max_steps {
        let Some(jacobian) = problem.try_jacobian(&current.x, mode)? else {
            stall = Some(Stall::Degenerate);
            break;
        };
        let residual = DVector::from_column_slice(&current.residual);
        let gradient = jacobian.transpose() * &residual;
        let curvature = (&jacobian * &gradient).norm_squared();
        let slope = gradient.norm_squared();
        if slope == 0.0 || curvature == 0.0 || !curvature.is_finite() {
            debug!("descent: stationary at residual {:.3e}", current.norm);
            stall = Some(Stall::Stationary);
            break;
        }
        let step = gradient * -(slope / curvature);
        steps += 1;

        match line_search(problem, &current, &step, mode)? {
            Some(next) => {
                trace!("descent {steps}: residual {:.3e}", next.norm);
                current = next;
            }
            None => {
                stall = Some(Stall::LineSearch);
                break;
            }
        }
    }

    LocalOutcome::finish(problem, current, steps, tolerance, stall)
}
