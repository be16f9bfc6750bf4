use std::collections::HashMap;

use glam::{DQuat, DVec3};
use log::debug;

use crate::{
    assembly::{self, LoadTable},
    config::DEFAULT_GRAVITY,
    core::{
        cable::Cable,
        node::{
            Buoyancy, Circle, ExternalForce, Frame, HydSpring, LinearConnector6d, Node, NodeEntry,
            NodeKind, Point, RigidBody,
        },
        types::{FixedMask, Pose, WaterProperties, Wrench},
    },
    dofs::DofMap,
    elements::{cable::CableState, Contribution, EvalMode, EvalState},
    error::{StaticsError, StaticsResult},
    solver::{self, ConvergenceResult, SolverSettings},
    utils::{
        allocator::{Arena, NodeId},
        math::rotation_vector,
    },
};

pub mod cache;
mod topology;

use cache::TransformCache;

/// Container owning every node of a rigging model.
///
/// Nodes are kept in creation order, which is also the order of the DOF
/// vector. Global transforms are cached and refreshed after every mutation
/// made through the scene.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Arena<NodeEntry>,
    order: Vec<NodeId>,
    names: HashMap<String, NodeId>,
    cache: TransformCache,
    pub gravity: f64,
    pub water: WaterProperties,
    pub solver_settings: SolverSettings,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            order: Vec::new(),
            names: HashMap::new(),
            cache: TransformCache::default(),
            gravity: DEFAULT_GRAVITY,
            water: WaterProperties::default(),
            solver_settings: SolverSettings::default(),
        }
    }

    // ---- construction -------------------------------------------------

    fn insert(&mut self, name: &str, node: Node) -> StaticsResult<NodeId> {
        if name.is_empty() {
            return Err(StaticsError::config("node names must not be empty"));
        }
        if self.names.contains_key(name) {
            return Err(StaticsError::config(format!(
                "a node named '{name}' already exists"
            )));
        }
        self.validate_node(name, &node)?;
        let kind = node.kind();
        let id = self.nodes.insert(NodeEntry {
            name: name.to_string(),
            node,
        });
        self.order.push(id);
        self.names.insert(name.to_string(), id);
        if let Err(err) = self.refresh() {
            self.discard(id);
            return Err(err);
        }
        debug!("added {kind} '{name}' as {id}");
        Ok(id)
    }

    pub fn add_frame(&mut self, name: &str, frame: Frame) -> StaticsResult<NodeId> {
        self.insert(name, Node::Frame(frame))
    }

    pub fn add_rigidbody(&mut self, name: &str, body: RigidBody) -> StaticsResult<NodeId> {
        self.insert(name, Node::RigidBody(body))
    }

    pub fn add_point(&mut self, name: &str, point: Point) -> StaticsResult<NodeId> {
        self.insert(name, Node::Point(point))
    }

    pub fn add_circle(&mut self, name: &str, mut circle: Circle) -> StaticsResult<NodeId> {
        circle.axis = circle.axis.normalize_or_zero();
        self.insert(name, Node::Circle(circle))
    }

    pub fn add_cable(&mut self, name: &str, cable: Cable) -> StaticsResult<NodeId> {
        self.insert(name, Node::Cable(cable))
    }

    pub fn add_connector(&mut self, name: &str, connector: LinearConnector6d) -> StaticsResult<NodeId> {
        self.insert(name, Node::Connector(connector))
    }

    pub fn add_hydspring(&mut self, name: &str, spring: HydSpring) -> StaticsResult<NodeId> {
        self.insert(name, Node::HydSpring(spring))
    }

    pub fn add_buoyancy(&mut self, name: &str, buoyancy: Buoyancy) -> StaticsResult<NodeId> {
        self.insert(name, Node::Buoyancy(buoyancy))
    }

    pub fn add_force(&mut self, name: &str, force: ExternalForce) -> StaticsResult<NodeId> {
        self.insert(name, Node::Force(force))
    }

    /// Shorthand for a point on `parent` (or in the world) at `position`.
    pub fn new_point(&mut self, name: &str, parent: Option<NodeId>, position: DVec3) -> StaticsResult<NodeId> {
        self.add_point(name, Point::new(parent, position))
    }

    /// Shorthand for a circle centred on point `parent`.
    pub fn new_circle(&mut self, name: &str, parent: NodeId, axis: DVec3, radius: f64) -> StaticsResult<NodeId> {
        self.add_circle(name, Circle::new(parent, axis, radius))
    }

    // ---- lookup -------------------------------------------------------

    pub fn id(&self, name: &str) -> StaticsResult<NodeId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| StaticsError::UnknownNode(name.to_string()))
    }

    pub fn name(&self, id: NodeId) -> StaticsResult<&str> {
        Ok(&self.entry(id)?.name)
    }

    pub fn node(&self, id: NodeId) -> StaticsResult<&Node> {
        Ok(&self.entry(id)?.node)
    }

    fn entry(&self, id: NodeId) -> StaticsResult<&NodeEntry> {
        self.nodes
            .get(id)
            .ok_or_else(|| StaticsError::UnknownNode(id.to_string()))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn kind(&self, id: NodeId) -> StaticsResult<NodeKind> {
        Ok(self.node(id)?.kind())
    }

    pub fn frame(&self, id: NodeId) -> StaticsResult<&Frame> {
        let entry = self.entry(id)?;
        entry
            .node
            .frame()
            .ok_or_else(|| StaticsError::config(format!("'{}' is not a frame", entry.name)))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids in creation order.
    pub fn ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeEntry)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.nodes.get(*id).map(|entry| (*id, entry)))
    }

    // ---- mutation -----------------------------------------------------

    /// Applies `edit` to a node and refreshes the transform cache.
    ///
    /// The edit is rolled back if it leaves the scene inconsistent.
    pub fn update_node<R>(&mut self, id: NodeId, edit: impl FnOnce(&mut Node) -> R) -> StaticsResult<R> {
        let entry = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StaticsError::UnknownNode(id.to_string()))?;
        let backup = entry.node.clone();
        let name = entry.name.clone();
        let out = edit(&mut entry.node);
        let checked = self
            .node(id)
            .cloned()
            .and_then(|node| self.validate_node(&name, &node))
            .and_then(|_| self.check_acyclic(id))
            .and_then(|_| self.refresh());
        if let Err(err) = checked {
            if let Some(entry) = self.nodes.get_mut(id) {
                entry.node = backup;
            }
            self.refresh()?;
            return Err(err);
        }
        Ok(out)
    }

    fn update_frame(&mut self, id: NodeId, edit: impl FnOnce(&mut Frame)) -> StaticsResult<()> {
        self.frame(id)?;
        self.update_node(id, |node| {
            if let Some(frame) = node.frame_mut() {
                edit(frame);
            }
        })
    }

    pub fn set_position(&mut self, id: NodeId, position: DVec3) -> StaticsResult<()> {
        if let Node::Point(_) = self.node(id)? {
            return self.update_node(id, |node| {
                if let Node::Point(point) = node {
                    point.position = position;
                }
            });
        }
        self.update_frame(id, |frame| frame.position = position)
    }

    /// Sets a frame's local rotation (axis-angle, degrees).
    pub fn set_rotation(&mut self, id: NodeId, rotation_deg: DVec3) -> StaticsResult<()> {
        self.update_frame(id, |frame| frame.rotation = rotation_deg)
    }

    pub fn set_fixed(&mut self, id: NodeId, fixed: FixedMask) -> StaticsResult<()> {
        self.update_frame(id, |frame| frame.fixed = fixed)
    }

    // ---- state --------------------------------------------------------

    /// Rebuilds the global transform cache from the local placements.
    pub(crate) fn refresh(&mut self) -> StaticsResult<()> {
        self.cache = TransformCache::rebuild(&self.nodes, &self.order)?;
        Ok(())
    }

    pub(crate) fn frame_mut_unchecked(&mut self, id: NodeId) -> StaticsResult<&mut Frame> {
        let entry = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StaticsError::UnknownNode(id.to_string()))?;
        let name = entry.name.clone();
        entry
            .node
            .frame_mut()
            .ok_or_else(|| StaticsError::config(format!("'{name}' is not a frame")))
    }

    pub fn transforms(&self) -> &TransformCache {
        &self.cache
    }

    pub fn eval_state(&self, mode: EvalMode) -> EvalState<'_> {
        EvalState {
            poses: &self.cache,
            gravity: self.gravity,
            water: self.water,
            mode,
        }
    }

    pub fn global_pose(&self, id: NodeId) -> StaticsResult<Pose> {
        Ok(self.cache.get(id)?.pose)
    }

    pub fn global_position(&self, id: NodeId) -> StaticsResult<DVec3> {
        Ok(self.cache.get(id)?.position())
    }

    /// Global orientation as an axis-angle vector in degrees.
    pub fn global_rotation_deg(&self, id: NodeId) -> StaticsResult<DVec3> {
        let rotation: DQuat = self.cache.get(id)?.pose.rotation;
        Ok(rotation_vector(rotation) * (180.0 / std::f64::consts::PI))
    }

    // ---- dofs ---------------------------------------------------------

    pub fn dof_map(&self) -> DofMap {
        DofMap::build(self)
    }

    pub fn get_dofs(&self) -> StaticsResult<Vec<f64>> {
        let map = self.dof_map();
        map.get_dofs(self)
    }

    pub fn set_dofs(&mut self, x: &[f64]) -> StaticsResult<()> {
        let map = self.dof_map();
        map.set_dofs(self, x)
    }

    pub fn change_dofs(&mut self, delta: &[f64]) -> StaticsResult<()> {
        let map = self.dof_map();
        map.change_dofs(self, delta)
    }

    // ---- evaluation ---------------------------------------------------

    /// Loads of every element at the current state, in node order.
    pub fn contributions(&self) -> StaticsResult<Vec<Contribution>> {
        assembly::contributions(self, EvalMode::Full)
    }

    pub fn loads(&self) -> StaticsResult<LoadTable> {
        assembly::assemble(self, EvalMode::Full)
    }

    /// Out-of-balance generalized force per free DOF.
    pub fn residual(&self) -> StaticsResult<Vec<f64>> {
        assembly::residual(self, &self.dof_map(), EvalMode::Full)
    }

    /// Sum of the loads acting on a node; for frames including everything on their children.
    pub fn applied_force(&self, id: NodeId) -> StaticsResult<Wrench> {
        self.loads()?.applied(id)
    }

    pub fn cable_state(&self, id: NodeId) -> StaticsResult<CableState> {
        match self.node(id)? {
            Node::Cable(cable) => cable.state(&self.eval_state(EvalMode::Full)),
            other => Err(StaticsError::config(format!(
                "'{}' is a {}, not a cable",
                self.name(id)?,
                other.kind()
            ))),
        }
    }

    // ---- solving ------------------------------------------------------

    /// Finds static equilibrium using `self.solver_settings`.
    pub fn solve_statics(&mut self) -> StaticsResult<ConvergenceResult> {
        let settings = self.solver_settings.clone();
        solver::solve_statics(self, &settings)
    }
}
