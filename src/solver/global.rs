//! Multi-start search around the best state found so far.
//!
//! Trial states are generated either by a fixed coverage pattern (every DOF
//! pushed in both directions on growing rings) or by a seeded ChaCha stream,
//! so a given scene and settings always visit the same trials.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    elements::EvalMode,
    error::StaticsResult,
    solver::{
        descent,
        newton,
        problem::{Candidate, Problem},
        settings::SolverSettings,
    },
};

enum Pattern {
    Coverage,
    Random(ChaCha8Rng),
}

impl Pattern {
    fn new(settings: &SolverSettings) -> Self {
        if settings.do_deterministic {
            Self::Coverage
        } else {
            Self::Random(ChaCha8Rng::seed_from_u64(settings.seed))
        }
    }

    /// Offset of trial `k` from the anchor state.
    fn offset(&mut self, k: usize, scales: &[f64]) -> Vec<f64> {
        let n = scales.len();
        let ring = (k / (2 * n) + 1) as f64;
        match self {
            Self::Coverage => {
                let mut delta = vec![0.0; n];
                let i = (k / 2) % n;
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                delta[i] = sign * ring * scales[i];
                delta
            }
            Self::Random(rng) => scales
                .iter()
                .map(|scale| rng.gen_range(-1.0..=1.0) * ring * scale)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobalOutcome {
    pub best: Candidate,
    pub iterations: usize,
    pub trials: usize,
    pub converged: bool,
}

pub fn run(
    problem: &mut Problem<'_>,
    start: Candidate,
    settings: &SolverSettings,
) -> StaticsResult<GlobalOutcome> {
    let scales: Vec<f64> = problem
        .map
        .slots()
        .iter()
        .map(|slot| {
            if slot.axis.is_rotation() {
                settings.global_rotation_scale.to_radians()
            } else {
                settings.global_translation_scale
            }
        })
        .collect();

    let mut pattern = Pattern::new(settings);
    let mut best = start;
    let mut iterations = 0;
    let mut trials = 0;

    for k in 0..settings.deterministic_global_steps {
        if best.norm < settings.tolerance || scales.is_empty() {
            break;
        }
        trials += 1;
        let delta = pattern.offset(k, &scales);
        let x: Vec<f64> = best.x.iter().zip(&delta).map(|(x, d)| x + d).collect();
        let Some(mut trial) = problem.try_candidate_at(x, EvalMode::Full)? else {
            continue;
        };

        if settings.do_newton {
            let outcome = newton::run(
                problem,
                trial,
                EvalMode::Full,
                settings.tolerance,
                settings.deterministic_local_steps,
            )?;
            iterations += outcome.iterations;
            trial = outcome.best;
        }
        if trial.norm >= settings.tolerance && settings.do_local_descent {
            let outcome = descent::run(
                problem,
                trial,
                EvalMode::Full,
                settings.tolerance,
                settings.deterministic_local_steps,
            )?;
            iterations += outcome.iterations;
            trial = outcome.best;
        }

        if trial.norm < best.norm {
            debug!("global trial {k}: residual {:.3e} -> {:.3e}", best.norm, trial.norm);
            best = trial;
        }
    }

    problem.apply(&best.x)?;
    Ok(GlobalOutcome {
        converged: best.norm < settings.tolerance,
        best,
        iterations,
        trials,
    })
}
