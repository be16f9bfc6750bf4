use serde::{Deserialize, Serialize};

use crate::{
    config::{
        DEFAULT_FD_STEP, DEFAULT_GLOBAL_ROTATION_SCALE, DEFAULT_GLOBAL_STEPS,
        DEFAULT_GLOBAL_TRANSLATION_SCALE, DEFAULT_LINEAR_TOLERANCE, DEFAULT_LOCAL_STEPS,
        DEFAULT_MAX_LINEAR_ITERATIONS, DEFAULT_MAX_NEWTON_ITERATIONS, DEFAULT_TOLERANCE,
        DEFAULT_ZERO_STIFFNESS_TOLERANCE,
    },
    error::{StaticsError, StaticsResult},
};

/// Options that select and bound the phases of `solve_statics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Converged once the largest residual entry is below this value.
    pub tolerance: f64,
    pub max_newton_iterations: usize,
    /// Run a linearised warm start before Newton.
    pub do_linear_first: bool,
    pub tolerance_during_linear_phase: f64,
    pub do_local_descent: bool,
    pub do_newton: bool,
    pub do_global_descent: bool,
    /// Structured coverage pattern instead of seeded random perturbations.
    pub do_deterministic: bool,
    pub deterministic_global_steps: usize,
    pub deterministic_local_steps: usize,

    pub max_linear_iterations: usize,
    /// Central-difference perturbation for the Jacobian.
    pub fd_step: f64,
    /// Seed of the randomised global search.
    pub seed: u64,
    pub global_translation_scale: f64,
    /// Degrees.
    pub global_rotation_scale: f64,
    pub zero_stiffness_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_newton_iterations: DEFAULT_MAX_NEWTON_ITERATIONS,
            do_linear_first: true,
            tolerance_during_linear_phase: DEFAULT_LINEAR_TOLERANCE,
            do_local_descent: true,
            do_newton: true,
            do_global_descent: false,
            do_deterministic: true,
            deterministic_global_steps: DEFAULT_GLOBAL_STEPS,
            deterministic_local_steps: DEFAULT_LOCAL_STEPS,
            max_linear_iterations: DEFAULT_MAX_LINEAR_ITERATIONS,
            fd_step: DEFAULT_FD_STEP,
            seed: 0,
            global_translation_scale: DEFAULT_GLOBAL_TRANSLATION_SCALE,
            global_rotation_scale: DEFAULT_GLOBAL_ROTATION_SCALE,
            zero_stiffness_tolerance: DEFAULT_ZERO_STIFFNESS_TOLERANCE,
        }
    }
}

impl SolverSettings {
    /// Newton only, for scenes that are known to be well behaved.
    pub fn fast() -> Self {
        Self {
            do_linear_first: false,
            do_local_descent: false,
            max_newton_iterations: 30,
            ..Self::default()
        }
    }

    /// All phases enabled with a larger search budget.
    pub fn robust() -> Self {
        Self {
            do_global_descent: true,
            deterministic_global_steps: 4 * DEFAULT_GLOBAL_STEPS,
            deterministic_local_steps: 2 * DEFAULT_LOCAL_STEPS,
            max_newton_iterations: 2 * DEFAULT_MAX_NEWTON_ITERATIONS,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> StaticsResult<()> {
        if !(self.tolerance > 0.0) {
            return Err(StaticsError::config(format!(
                "solver tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.fd_step > 0.0) {
            return Err(StaticsError::config(format!(
                "finite-difference step must be positive, got {}",
                self.fd_step
            )));
        }
        if self.do_linear_first && !(self.tolerance_during_linear_phase > 0.0) {
            return Err(StaticsError::config(
                "linear phase tolerance must be positive",
            ));
        }
        if !(self.do_newton || self.do_local_descent || self.do_global_descent || self.do_linear_first) {
            return Err(StaticsError::config("every solver phase is disabled"));
        }
        Ok(())
    }
}
