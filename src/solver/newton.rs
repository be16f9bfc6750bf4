//! Damped Newton iteration on the residual.

use log::{debug, trace, warn};
use nalgebra::DVector;

use crate::{
    config::MIN_LINE_SEARCH_FRACTION,
    elements::EvalMode,
    error::StaticsResult,
    solver::problem::{Candidate, Problem},
    utils::math::merit,
};

/// Why a local phase stopped before reaching tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// The Jacobian could not be factorised.
    Singular,
    /// The difference stencil around the current state hit degenerate geometry.
    Degenerate,
    /// No fraction of the step reduced the merit.
    LineSearch,
    /// The merit gradient vanished.
    Stationary,
    /// Iteration budget used up.
    Budget,
}

/// Result of one local phase. The scene is left at `best.x`.
#[derive(Debug, Clone)]
pub struct LocalOutcome {
    pub best: Candidate,
    pub iterations: usize,
    pub converged: bool,
    pub stall: Option<Stall>,
}

impl LocalOutcome {
    pub(crate) fn finish(
        problem: &mut Problem<'_>,
        best: Candidate,
        iterations: usize,
        tolerance: f64,
        stall: Option<Stall>,
    ) -> StaticsResult<Self> {
        problem.apply(&best.x)?;
        let converged = best.norm < tolerance;
        Ok(Self {
            best,
            iterations,
            converged,
            stall: if converged { None } else { stall.or(Some(Stall::Budget)) },
        })
    }
}

/// Backtracks along `step` (fractions 1, 1/2, … down to the minimum) until the merit drops.
pub fn line_search(
    problem: &mut Problem<'_>,
    current: &Candidate,
    step: &DVector<f64>,
    mode: EvalMode,
) -> StaticsResult<Option<Candidate>> {
    let base = merit(&current.residual);
    let mut alpha = 1.0;
    while alpha >= MIN_LINE_SEARCH_FRACTION {
        let trial: Vec<f64> = current
            .x
            .iter()
            .zip(step.iter())
            .map(|(x, d)| x + alpha * d)
            .collect();
        if let Some(candidate) = problem.try_candidate_at(trial, mode)? {
            if merit(&candidate.residual) < base {
                trace!("line search accepted fraction {alpha}");
                return Ok(Some(candidate));
            }
        }
        alpha *= 0.5;
    }
    Ok(None)
}

pub fn run(
    problem: &mut Problem<'_>,
    start: Candidate,
    mode: EvalMode,
    tolerance: f64,
    max_iterations: usize,
) -> StaticsResult<LocalOutcome> {
    let mut current = start;
    let mut iterations = 0;
    let mut stall = None;

    while current.norm >= tolerance && iterations < max_iterations {
        let Some(jacobian) = problem.try_jacobian(&current.x, mode)? else {
            debug!("newton: degenerate geometry next to residual {:.3e}", current.norm);
            stall = Some(Stall::Degenerate);
            break;
        };
        let rhs = -DVector::from_column_slice(&current.residual);
        let step = match jacobian.lu().solve(&rhs) {
            Some(step) if step.iter().all(|v| v.is_finite()) => step,
            _ => {
                warn!("newton: singular jacobian at residual {:.3e}", current.norm);
                stall = Some(Stall::Singular);
                break;
            }
        };
        iterations += 1;

        match line_search(problem, &current, &step, mode)? {
            Some(next) => {
                trace!("newton {iterations}: residual {:.3e}", next.norm);
                current = next;
            }
            None => {
                debug!("newton: line search failed at residual {:.3e}", current.norm);
                stall = Some(Stall::LineSearch);
                break;
            }
        }
    }

    LocalOutcome::finish(problem, current, iterations, tolerance, stall)
}
