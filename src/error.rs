//! Error types shared across the crate.

use thiserror::Error;

/// Errors raised while building or solving a scene.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StaticsError {
    /// Malformed or inconsistent model setup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A name or id that does not resolve to a live node.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Degenerate mechanical geometry.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Solver budget exhausted without reaching tolerance.
    #[error("statics did not converge after {iterations} iterations (residual {residual:.3e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },

    /// Free directions without any restoring stiffness.
    #[error("unconstrained degrees of freedom: {}", dofs.join(", "))]
    Unconstrained { dofs: Vec<String> },
}

/// Convenience alias used throughout the crate.
pub type StaticsResult<T> = Result<T, StaticsError>;

impl StaticsError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, Self::Geometry(_))
    }
}
