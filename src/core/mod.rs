//! Core data model: frames, bodies, attachment points, cables and restoring elements.

pub mod cable;
pub mod node;
pub mod types;

pub use cable::{Cable, CableConnection, FrictionModel};
pub use node::{
    Buoyancy, Circle, ExternalForce, Frame, HydSpring, LinearConnector6d, Node, NodeEntry,
    NodeKind, Point, RigidBody,
};
pub use types::{DofAxis, FixedMask, Pose, WaterProperties, Wrench};
