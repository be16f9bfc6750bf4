//! Residual evaluation over a scene through a fixed DOF map.

use log::trace;

use crate::{
    assembly,
    dofs::DofMap,
    elements::EvalMode,
    error::StaticsResult,
    scene::Scene,
    utils::{math::inf_norm, profiling::SolveProfile},
};

/// A state together with its residual.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub x: Vec<f64>,
    pub residual: Vec<f64>,
    /// ∞-norm of `residual`.
    pub norm: f64,
}

impl Candidate {
    pub fn new(x: Vec<f64>, residual: Vec<f64>) -> Self {
        let norm = inf_norm(&residual);
        Self { x, residual, norm }
    }
}

/// The scene being solved, seen as a function `R(x)`.
pub struct Problem<'a> {
    pub scene: &'a mut Scene,
    pub map: DofMap,
    pub fd_step: f64,
    pub profile: SolveProfile,
}

impl<'a> Problem<'a> {
    pub fn new(scene: &'a mut Scene, map: DofMap, fd_step: f64) -> Self {
        let profile = SolveProfile {
            dof_count: map.len(),
            ..SolveProfile::default()
        };
        Self {
            scene,
            map,
            fd_step,
            profile,
        }
    }

    pub fn dim(&self) -> usize {
        self.map.len()
    }

    /// Moves the scene to `x`.
    pub fn apply(&mut self, x: &[f64]) -> StaticsResult<()> {
        self.map.set_dofs(self.scene, x)
    }

    /// Moves the scene to `x` and evaluates the residual there.
    pub fn residual_at(&mut self, x: &[f64], mode: EvalMode) -> StaticsResult<Vec<f64>> {
        self.apply(x)?;
        self.profile.residual_evaluations += 1;
        assembly::residual(self.scene, &self.map, mode)
    }

    pub fn candidate_at(&mut self, x: Vec<f64>, mode: EvalMode) -> StaticsResult<Candidate> {
        let residual = self.residual_at(&x, mode)?;
        Ok(Candidate::new(x, residual))
    }

    /// Like [`Problem::candidate_at`], but degenerate geometry rejects the trial instead of failing.
    pub fn try_candidate_at(&mut self, x: Vec<f64>, mode: EvalMode) -> StaticsResult<Option<Candidate>> {
        match self.residual_at(&x, mode) {
            Ok(residual) => Ok(Some(Candidate::new(x, residual))),
            Err(err) if err.is_geometry() => {
                trace!("trial state rejected: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
