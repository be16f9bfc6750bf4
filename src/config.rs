//! Global configuration constants for the Capstan statics core.

/// Default gravitational acceleration, acting along -Z.
pub const DEFAULT_GRAVITY: f64 = 9.81;

/// Default density of the surrounding water (mt/m³, sea water).
pub const DEFAULT_WATER_DENSITY: f64 = 1.025;

/// Default global z coordinate of the free water surface.
pub const DEFAULT_WATER_LEVEL: f64 = 0.0;

/// Residual norm (∞-norm) below which a state counts as equilibrium.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Residual norm accepted at the end of the linear warm start.
pub const DEFAULT_LINEAR_TOLERANCE: f64 = 1e-1;

/// Iteration budget of a single Newton phase.
pub const DEFAULT_MAX_NEWTON_ITERATIONS: usize = 100;

/// Iteration budget of the linear warm start.
pub const DEFAULT_MAX_LINEAR_ITERATIONS: usize = 20;

/// Number of perturbation trials performed by the global search.
pub const DEFAULT_GLOBAL_STEPS: usize = 40;

/// Number of refinement / descent steps performed by local phases.
pub const DEFAULT_LOCAL_STEPS: usize = 50;

/// Central-difference perturbation used for the numerical Jacobian.
pub const DEFAULT_FD_STEP: f64 = 1e-7;

/// Base perturbation magnitude of the global search for translations (m).
pub const DEFAULT_GLOBAL_TRANSLATION_SCALE: f64 = 0.5;

/// Base perturbation magnitude of the global search for rotations (deg).
pub const DEFAULT_GLOBAL_ROTATION_SCALE: f64 = 5.0;

/// Relative threshold under which a Jacobian row/column counts as zero.
///
/// Finite-difference noise sits around 1e-9 of the largest stiffness.
pub const DEFAULT_ZERO_STIFFNESS_TOLERANCE: f64 = 1e-6;

/// Smallest line-search fraction tried before a step is rejected.
pub const MIN_LINE_SEARCH_FRACTION: f64 = 1.0 / 64.0;

/// Sweep limit for circle-to-circle tangent resolution along a cable path.
pub const MAX_TANGENT_SWEEPS: usize = 50;

/// Convergence threshold of the tangent-point fixed point.
pub const TANGENT_SWEEP_TOLERANCE: f64 = 1e-12;

/// Lengths below this value are treated as zero.
pub const LENGTH_EPSILON: f64 = 1e-12;
