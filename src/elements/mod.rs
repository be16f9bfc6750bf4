//! Element force evaluators.
//!
//! Every force-producing node implements [`Element`]. Evaluators read the
//! global transform cache only, so the loads they return are a pure function
//! of the current DOF values.

pub mod cable;
pub mod connector;
pub mod hydrostatics;
pub mod weight;

use glam::DVec3;

use crate::{
    core::types::{WaterProperties, Wrench},
    error::StaticsResult,
    scene::cache::TransformCache,
    utils::allocator::NodeId,
};

pub use cable::CableState;
pub use hydrostatics::{BuoyancyModel, SphereFloat};

/// How element nonlinearities are treated during an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    /// Tension-only cables, friction included.
    #[default]
    Full,
    /// Cables act as two-way springs and friction is ignored.
    Linearized,
}

/// Everything an element may read while computing its loads.
#[derive(Debug, Clone, Copy)]
pub struct EvalState<'a> {
    pub poses: &'a TransformCache,
    pub gravity: f64,
    pub water: WaterProperties,
    pub mode: EvalMode,
}

/// Load on a single node: global axes, moment about the node's global origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub node: NodeId,
    pub force: DVec3,
    pub moment: DVec3,
}

impl Contribution {
    pub fn new(node: NodeId, force: DVec3, moment: DVec3) -> Self {
        Self {
            node,
            force,
            moment,
        }
    }

    /// Force applied at global point `at` on a node whose origin is `origin`.
    pub fn at_point(node: NodeId, force: DVec3, at: DVec3, origin: DVec3) -> Self {
        Self {
            node,
            force,
            moment: (at - origin).cross(force),
        }
    }

    pub fn wrench(&self) -> Wrench {
        Wrench::new(self.force, self.moment)
    }
}

/// Anything that applies loads to the nodes of a scene.
pub trait Element: Send + Sync {
    /// Loads this element applies at the current state. `id` is the element's own node.
    fn contribute_forces(&self, id: NodeId, state: &EvalState<'_>) -> StaticsResult<Vec<Contribution>>;
}
