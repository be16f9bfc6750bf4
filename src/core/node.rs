use std::fmt;
use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        cable::Cable,
        types::{FixedMask, Pose},
    },
    elements::{hydrostatics::BuoyancyModel, Element},
    utils::{allocator::NodeId, math::quat_from_rotation_deg},
};

/// Coordinate system that may carry degrees of freedom.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    /// Parent frame, `None` for the world.
    pub parent: Option<NodeId>,
    /// Position in the parent's axes.
    pub position: DVec3,
    /// Axis-angle rotation relative to the parent, in degrees.
    pub rotation: DVec3,
    pub fixed: FixedMask,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            parent: None,
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            fixed: FixedMask::ALL_FIXED,
        }
    }
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn local_pose(&self) -> Pose {
        Pose::new(self.position, quat_from_rotation_deg(self.rotation))
    }
}

/// Frame carrying a mass; its weight acts at the centre of gravity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBody {
    pub frame: Frame,
    pub mass: f64,
    /// Centre of gravity in local coordinates.
    pub cog: DVec3,
}

impl RigidBody {
    pub fn new(mass: f64) -> Self {
        Self {
            mass,
            ..Self::default()
        }
    }
}

/// Massless attachment location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Point {
    pub parent: Option<NodeId>,
    pub position: DVec3,
}

impl Point {
    pub fn new(parent: Option<NodeId>, position: DVec3) -> Self {
        Self { parent, position }
    }
}

/// Circular contact surface (sheave, pin, trunnion) centred on a point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    /// The point that locates the centre.
    pub parent: NodeId,
    /// Axis direction in the axes of the point's parent frame.
    pub axis: DVec3,
    pub radius: f64,
}

impl Circle {
    pub fn new(parent: NodeId, axis: DVec3, radius: f64) -> Self {
        Self {
            parent,
            axis,
            radius,
        }
    }
}

/// Six-component linear spring between two frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearConnector6d {
    pub main: NodeId,
    pub secondary: NodeId,
    /// kx, ky, kz, krx, kry, krz about the main frame's axes.
    pub stiffness: [f64; 6],
}

/// Linearised hydrostatic restoring element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydSpring {
    pub parent: NodeId,
    /// Centre of buoyancy, local coordinates.
    pub cob: DVec3,
    pub displacement_kn: f64,
    pub bm_t: f64,
    pub bm_l: f64,
    pub cof_x: f64,
    pub cof_y: f64,
    pub k_heave: f64,
    /// Local z of the waterplane.
    pub waterline: f64,
}

impl HydSpring {
    pub fn new(parent: NodeId) -> Self {
        Self {
            parent,
            cob: DVec3::ZERO,
            displacement_kn: 0.0,
            bm_t: 0.0,
            bm_l: 0.0,
            cof_x: 0.0,
            cof_y: 0.0,
            k_heave: 0.0,
            waterline: 0.0,
        }
    }
}

/// Buoyancy element whose restoring loads come from an external model.
#[derive(Clone)]
pub struct Buoyancy {
    pub parent: NodeId,
    pub model: Arc<dyn BuoyancyModel>,
}

impl fmt::Debug for Buoyancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buoyancy")
            .field("parent", &self.parent)
            .field("model", &self.model.name())
            .finish()
    }
}

/// Constant external force and moment (global axes) applied at a point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalForce {
    pub parent: NodeId,
    pub force: DVec3,
    pub moment: DVec3,
}

/// Discriminant of [`Node`], handy for error messages and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Frame,
    RigidBody,
    Point,
    Circle,
    Cable,
    Connector,
    HydSpring,
    Buoyancy,
    Force,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Every object a scene can hold.
#[derive(Debug, Clone)]
pub enum Node {
    Frame(Frame),
    RigidBody(RigidBody),
    Point(Point),
    Circle(Circle),
    Cable(Cable),
    Connector(LinearConnector6d),
    HydSpring(HydSpring),
    Buoyancy(Buoyancy),
    Force(ExternalForce),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Frame(_) => NodeKind::Frame,
            Node::RigidBody(_) => NodeKind::RigidBody,
            Node::Point(_) => NodeKind::Point,
            Node::Circle(_) => NodeKind::Circle,
            Node::Cable(_) => NodeKind::Cable,
            Node::Connector(_) => NodeKind::Connector,
            Node::HydSpring(_) => NodeKind::HydSpring,
            Node::Buoyancy(_) => NodeKind::Buoyancy,
            Node::Force(_) => NodeKind::Force,
        }
    }

    /// Frame data of frames and rigid bodies.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Node::Frame(frame) => Some(frame),
            Node::RigidBody(body) => Some(&body.frame),
            _ => None,
        }
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        match self {
            Node::Frame(frame) => Some(frame),
            Node::RigidBody(body) => Some(&mut body.frame),
            _ => None,
        }
    }

    pub fn is_frame(&self) -> bool {
        self.frame().is_some()
    }

    /// Node that positions this one, if any.
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Frame(frame) => frame.parent,
            Node::RigidBody(body) => body.frame.parent,
            Node::Point(point) => point.parent,
            Node::Circle(circle) => Some(circle.parent),
            Node::HydSpring(spring) => Some(spring.parent),
            Node::Buoyancy(buoyancy) => Some(buoyancy.parent),
            Node::Force(force) => Some(force.parent),
            Node::Cable(_) | Node::Connector(_) => None,
        }
    }

    /// All nodes this one depends on; they cannot be deleted while it exists.
    pub fn references(&self) -> Vec<NodeId> {
        match self {
            Node::Cable(cable) => cable.connections.iter().map(|c| c.node).collect(),
            Node::Connector(connector) => vec![connector.main, connector.secondary],
            _ => self.parent().into_iter().collect(),
        }
    }

    /// Force-producing behaviour of this node, if it has any.
    pub fn as_element(&self) -> Option<&dyn Element> {
        match self {
            Node::RigidBody(body) => Some(body),
            Node::Cable(cable) => Some(cable),
            Node::Connector(connector) => Some(connector),
            Node::HydSpring(spring) => Some(spring),
            Node::Buoyancy(buoyancy) => Some(buoyancy),
            Node::Force(force) => Some(force),
            Node::Frame(_) | Node::Point(_) | Node::Circle(_) => None,
        }
    }
}

/// A node together with its unique name.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub name: String,
    pub node: Node,
}
