//! Static equilibrium solver.
//!
//! `solve_statics` drives the free DOFs of a scene towards `R(x) = 0` in
//! phases: an optional linearised warm start, damped Newton alternating with
//! steepest descent, and an optional multi-start global search. Whatever
//! happens, the lowest-residual state seen is written back into the scene.

pub mod descent;
pub mod global;
pub mod jacobian;
pub mod newton;
pub mod problem;
pub mod settings;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    dofs::DofMap,
    elements::EvalMode,
    error::{StaticsError, StaticsResult},
    scene::Scene,
    utils::logging::{warn_unconstrained, PhaseTimer},
};

pub use jacobian::unconstrained_dofs;
pub use problem::{Candidate, Problem};
pub use settings::SolverSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Converged,
    /// Every enabled phase ran out of budget; the best state was applied anyway.
    Failed,
    /// Free directions without restoring stiffness; no solve was attempted.
    Unconstrained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    LinearWarmStart,
    Newton,
    LocalDescent,
    GlobalSearch,
}

/// Residual reached at the end of one phase run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub iterations: usize,
    pub residual_norm: f64,
}

/// Outcome of [`solve_statics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceResult {
    pub success: bool,
    pub status: SolveStatus,
    /// ∞-norm of the residual at the state left in the scene.
    pub residual_norm: f64,
    /// Indices into the DOF vector.
    pub unconstrained_dofs: Vec<usize>,
    /// `node.axis` labels of `unconstrained_dofs`.
    pub unconstrained_labels: Vec<String>,
    pub iterations_used: usize,
    pub phases: Vec<PhaseReport>,
}

impl ConvergenceResult {
    fn finished(best: &Candidate, tolerance: f64, iterations_used: usize, phases: Vec<PhaseReport>) -> Self {
        let success = best.norm < tolerance;
        Self {
            success,
            status: if success {
                SolveStatus::Converged
            } else {
                SolveStatus::Failed
            },
            residual_norm: best.norm,
            unconstrained_dofs: Vec::new(),
            unconstrained_labels: Vec::new(),
            iterations_used,
            phases,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    /// Turns a failed or unconstrained outcome into the matching error.
    pub fn into_result(self) -> StaticsResult<Self> {
        match self.status {
            SolveStatus::Converged => Ok(self),
            SolveStatus::Failed => Err(StaticsError::ConvergenceFailure {
                iterations: self.iterations_used,
                residual: self.residual_norm,
            }),
            SolveStatus::Unconstrained => Err(StaticsError::Unconstrained {
                dofs: self.unconstrained_labels,
            }),
        }
    }
}

/// Flags DOFs with a zero row and column in the linearised Jacobian at `x`.
///
/// A DOF that only lacks first-order stiffness (a yaw restrained by
/// unstretched slings, say) is cleared by a finite probe of one global-search
/// step in each direction.
fn detect_unconstrained(
    problem: &mut Problem<'_>,
    x: &[f64],
    settings: &SolverSettings,
) -> StaticsResult<Vec<usize>> {
    // degenerate geometry next to `x` means something there does react
    let Some(jacobian) = problem.try_jacobian(x, EvalMode::Linearized)? else {
        return Ok(Vec::new());
    };
    let suspects = unconstrained_dofs(&jacobian, settings.zero_stiffness_tolerance);
    if suspects.is_empty() {
        return Ok(suspects);
    }

    let Some(base) = problem.try_candidate_at(x.to_vec(), EvalMode::Linearized)? else {
        problem.apply(x)?;
        return Ok(Vec::new());
    };
    let base = base.residual;
    let scale = base.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let mut confirmed = Vec::new();
    for i in suspects {
        let amplitude = if problem.map.slots()[i].axis.is_rotation() {
            settings.global_rotation_scale.to_radians()
        } else {
            settings.global_translation_scale
        };
        let mut restored = false;
        for sign in [1.0, -1.0] {
            let mut probe = x.to_vec();
            probe[i] += sign * amplitude;
            match problem.residual_at(&probe, EvalMode::Linearized) {
                Ok(r) => {
                    let change = r.iter().zip(&base).fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));
                    if change > settings.zero_stiffness_tolerance * scale {
                        restored = true;
                    }
                }
                Err(err) if err.is_geometry() => restored = true,
                Err(err) => return Err(err),
            }
        }
        if !restored {
            confirmed.push(i);
        }
    }
    problem.apply(x)?;
    Ok(confirmed)
}

/// Moves the free DOFs of `scene` to static equilibrium.
///
/// Configuration and geometry problems are returned as errors. Running out of
/// budget is not: the result then has status [`SolveStatus::Failed`] and the
/// scene holds the best state found. Use [`ConvergenceResult::into_result`]
/// to treat that as an error.
pub fn solve_statics(scene: &mut Scene, settings: &SolverSettings) -> StaticsResult<ConvergenceResult> {
    settings.validate()?;
    let total = PhaseTimer::start("solve_statics");
    scene.refresh()?;

    let map = DofMap::build(scene);
    let mut problem = Problem::new(scene, map, settings.fd_step);
    let x0 = problem.map.get_dofs(problem.scene)?;
    let mut best = problem.candidate_at(x0, EvalMode::Full)?;
    let tolerance = settings.tolerance;

    if problem.dim() == 0 {
        debug!("solve_statics: no free dofs");
        return Ok(ConvergenceResult::finished(&best, tolerance, 0, Vec::new()));
    }

    let free = detect_unconstrained(&mut problem, &best.x, settings)?;
    if !free.is_empty() {
        let labels: Vec<String> = free
            .iter()
            .map(|&i| problem.map.label(i).unwrap_or("?").to_string())
            .collect();
        warn_unconstrained(&labels);
        return Ok(ConvergenceResult {
            success: false,
            status: SolveStatus::Unconstrained,
            residual_norm: best.norm,
            unconstrained_dofs: free,
            unconstrained_labels: labels,
            iterations_used: 0,
            phases: Vec::new(),
        });
    }

    let mut iterations = 0;
    let mut phases = Vec::new();

    if settings.do_linear_first && best.norm >= tolerance {
        let timer = PhaseTimer::start("linear warm start");
        match problem.try_candidate_at(best.x.clone(), EvalMode::Linearized)? {
            Some(start) => {
                let outcome = newton::run(
                    &mut problem,
                    start,
                    EvalMode::Linearized,
                    settings.tolerance_during_linear_phase,
                    settings.max_linear_iterations,
                )?;
                iterations += outcome.iterations;
                // adopt the warm start only when it helps the full problem
                if let Some(full) = problem.try_candidate_at(outcome.best.x, EvalMode::Full)? {
                    if outcome.converged || full.norm < best.norm {
                        best = full;
                    }
                }
                phases.push(PhaseReport {
                    phase: Phase::LinearWarmStart,
                    iterations: outcome.iterations,
                    residual_norm: best.norm,
                });
            }
            None => debug!("linear warm start skipped: degenerate linearised start"),
        }
        timer.finish(&mut problem.profile.linear_time);
    }

    let budget = settings.max_newton_iterations;
    let mut local_used = 0;
    while (settings.do_newton || settings.do_local_descent)
        && best.norm >= tolerance
        && local_used < budget
    {
        let round_start = best.norm;

        if settings.do_newton {
            let timer = PhaseTimer::start("newton");
            let outcome = newton::run(&mut problem, best, EvalMode::Full, tolerance, budget - local_used)?;
            local_used += outcome.iterations;
            best = outcome.best;
            phases.push(PhaseReport {
                phase: Phase::Newton,
                iterations: outcome.iterations,
                residual_norm: best.norm,
            });
            timer.finish(&mut problem.profile.newton_time);
            if outcome.converged {
                break;
            }
            debug!("newton stopped ({:?}) at residual {:.3e}", outcome.stall, best.norm);
        }

        if !settings.do_local_descent || local_used >= budget {
            break;
        }
        let timer = PhaseTimer::start("local descent");
        let steps = settings.deterministic_local_steps.min(budget - local_used);
        let outcome = descent::run(&mut problem, best, EvalMode::Full, tolerance, steps)?;
        local_used += outcome.iterations;
        best = outcome.best;
        phases.push(PhaseReport {
            phase: Phase::LocalDescent,
            iterations: outcome.iterations,
            residual_norm: best.norm,
        });
        timer.finish(&mut problem.profile.descent_time);

        if best.norm >= round_start {
            break;
        }
    }
    iterations += local_used;

    if settings.do_global_descent && best.norm >= tolerance {
        let timer = PhaseTimer::start("global search");
        let outcome = global::run(&mut problem, best, settings)?;
        iterations += outcome.iterations;
        best = outcome.best;
        phases.push(PhaseReport {
            phase: Phase::GlobalSearch,
            iterations: outcome.iterations,
            residual_norm: best.norm,
        });
        debug!("global search: {} trials", outcome.trials);
        timer.finish(&mut problem.profile.global_time);
    }

    problem.apply(&best.x)?;
    let result = ConvergenceResult::finished(&best, tolerance, iterations, phases);
    if result.success {
        info!(
            "statics converged: {} dofs, residual {:.3e} after {} iterations",
            problem.dim(),
            result.residual_norm,
            result.iterations_used
        );
    } else {
        warn!(
            "statics failed to converge: residual {:.3e} after {} iterations",
            result.residual_norm, result.iterations_used
        );
    }

    total.finish(&mut problem.profile.total_time);
    problem.profile.report();
    Ok(result)
}
