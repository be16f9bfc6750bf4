//! Capstan – static equilibrium solver for rigging assemblies.
//!
//! A [`Scene`] holds frames, rigid bodies, attachment points, sheaves and
//! the elements that load them (cables with friction, 6-DOF connectors,
//! hydrostatic springs and buoyancy models). [`Scene::solve_statics`] moves
//! every free degree of freedom to the position where the net force and
//! moment on it vanish.

pub mod assembly;
pub mod config;
pub mod core;
pub mod dofs;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod scene;
pub mod solver;
pub mod utils;

pub use glam::{DQuat, DVec3};

pub use core::{
    cable::{Cable, CableConnection, FrictionModel},
    node::{
        Buoyancy, Circle, ExternalForce, Frame, HydSpring, LinearConnector6d, Node, NodeKind,
        Point, RigidBody,
    },
    types::{DofAxis, FixedMask, Pose, WaterProperties, Wrench},
};
pub use dofs::DofMap;
pub use elements::{BuoyancyModel, CableState, EvalMode, SphereFloat};
pub use error::{StaticsError, StaticsResult};
pub use scene::Scene;
pub use solver::{solve_statics, ConvergenceResult, Phase, PhaseReport, SolveStatus, SolverSettings};
pub use utils::allocator::NodeId;
