//! Reference checks, reparenting and deletion.

use std::f64::consts::PI;

use crate::{
    core::node::{Node, NodeKind},
    error::{StaticsError, StaticsResult},
    scene::Scene,
    utils::{allocator::NodeId, math::rotation_vector},
};

const FRAME_KINDS: &[NodeKind] = &[NodeKind::Frame, NodeKind::RigidBody];

impl Scene {
    fn expect_kind(&self, owner: &str, role: &str, id: NodeId, kinds: &[NodeKind]) -> StaticsResult<()> {
        let entry = self.node(id).map_err(|_| {
            StaticsError::UnknownNode(format!("{role} {id} referenced by '{owner}'"))
        })?;
        if kinds.contains(&entry.kind()) {
            Ok(())
        } else {
            Err(StaticsError::config(format!(
                "{role} of '{owner}' must be one of {kinds:?}, got {} '{}'",
                entry.kind(),
                self.name(id)?
            )))
        }
    }

    /// Checks that every reference of `node` resolves to a node of the right kind.
    pub(super) fn validate_node(&self, name: &str, node: &Node) -> StaticsResult<()> {
        match node {
            Node::Frame(_) | Node::RigidBody(_) => {
                if let Some(parent) = node.parent() {
                    self.expect_kind(name, "parent", parent, FRAME_KINDS)?;
                }
                if let Node::RigidBody(body) = node {
                    if !(body.mass >= 0.0) {
                        return Err(StaticsError::config(format!(
                            "mass of '{name}' must be non-negative, got {}",
                            body.mass
                        )));
                    }
                }
            }
            Node::Point(point) => {
                if let Some(parent) = point.parent {
                    self.expect_kind(name, "parent", parent, FRAME_KINDS)?;
                }
            }
            Node::Circle(circle) => {
                self.expect_kind(name, "parent", circle.parent, &[NodeKind::Point])?;
                if !(circle.radius > 0.0) {
                    return Err(StaticsError::config(format!(
                        "radius of circle '{name}' must be positive, got {}",
                        circle.radius
                    )));
                }
                if circle.axis.length_squared() == 0.0 {
                    return Err(StaticsError::config(format!(
                        "circle '{name}' needs a non-zero axis"
                    )));
                }
            }
            Node::Cable(cable) => {
                cable.validate()?;
                for connection in &cable.connections {
                    self.expect_kind(
                        name,
                        "connection",
                        connection.node,
                        &[NodeKind::Point, NodeKind::Circle],
                    )?;
                }
                let path = cable.path_connections();
                if cable.is_grommet() {
                    self.expect_kind(name, "grommet start", path[0].node, &[NodeKind::Circle])?;
                } else {
                    for end in [path[0].node, path[path.len() - 1].node] {
                        self.expect_kind(name, "end connection", end, &[NodeKind::Point])?;
                    }
                }
            }
            Node::Connector(connector) => {
                self.expect_kind(name, "main", connector.main, FRAME_KINDS)?;
                self.expect_kind(name, "secondary", connector.secondary, FRAME_KINDS)?;
                if connector.main == connector.secondary {
                    return Err(StaticsError::config(format!(
                        "connector '{name}' connects a frame to itself"
                    )));
                }
                if connector.stiffness.iter().any(|k| !(*k >= 0.0)) {
                    return Err(StaticsError::config(format!(
                        "stiffness of connector '{name}' must be non-negative"
                    )));
                }
            }
            Node::HydSpring(spring) => {
                self.expect_kind(name, "parent", spring.parent, FRAME_KINDS)?;
            }
            Node::Buoyancy(buoyancy) => {
                self.expect_kind(name, "parent", buoyancy.parent, FRAME_KINDS)?;
            }
            Node::Force(force) => {
                self.expect_kind(name, "parent", force.parent, &[NodeKind::Point])?;
            }
        }
        Ok(())
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> StaticsResult<Vec<NodeId>> {
        let mut chain = Vec::new();
        let mut current = self.node(id)?.parent();
        while let Some(parent) = current {
            if parent == id || chain.contains(&parent) || chain.len() > self.len() {
                return Err(StaticsError::config(format!(
                    "parent chain of '{}' forms a cycle",
                    self.name(id)?
                )));
            }
            chain.push(parent);
            current = self.node(parent)?.parent();
        }
        Ok(chain)
    }

    pub(super) fn check_acyclic(&self, id: NodeId) -> StaticsResult<()> {
        self.ancestors(id).map(|_| ())
    }

    /// Nodes that reference `id` and would dangle if it were deleted.
    pub fn dependants(&self, id: NodeId) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, entry)| entry.node.references().contains(&id))
            .map(|(other, _)| other)
            .collect()
    }

    pub(super) fn discard(&mut self, id: NodeId) {
        if let Some(entry) = self.nodes.remove(id) {
            self.names.remove(&entry.name);
        }
        self.order.retain(|other| *other != id);
    }

    /// Removes a node that nothing else depends on.
    pub fn delete(&mut self, id: NodeId) -> StaticsResult<()> {
        let name = self.name(id)?.to_string();
        let dependants = self.dependants(id);
        if !dependants.is_empty() {
            let names: Vec<&str> = dependants
                .iter()
                .filter_map(|d| self.name(*d).ok())
                .collect();
            return Err(StaticsError::config(format!(
                "cannot delete '{name}': still used by {}",
                names.join(", ")
            )));
        }
        self.discard(id);
        self.refresh()?;
        log::debug!("deleted '{name}'");
        Ok(())
    }

    /// Moves a frame or point under a new parent frame, keeping its global placement.
    pub fn change_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> StaticsResult<()> {
        if let Some(parent) = new_parent {
            let name = self.name(id)?.to_string();
            self.expect_kind(&name, "parent", parent, FRAME_KINDS)?;
            if parent == id || self.ancestors(parent)?.contains(&id) {
                return Err(StaticsError::config(format!(
                    "cannot place '{name}' under '{}': that would create a cycle",
                    self.name(parent)?
                )));
            }
        }
        let global = self.global_pose(id)?;
        let parent_pose = match new_parent {
            Some(parent) => self.global_pose(parent)?,
            None => Default::default(),
        };
        let local = parent_pose.relative(&global);

        match self.node(id)?.kind() {
            NodeKind::Frame | NodeKind::RigidBody => self.update_node(id, |node| {
                if let Some(frame) = node.frame_mut() {
                    frame.parent = new_parent;
                    frame.position = local.position;
                    frame.rotation = rotation_vector(local.rotation) * (180.0 / PI);
                }
            }),
            NodeKind::Point => self.update_node(id, |node| {
                if let Node::Point(point) = node {
                    point.parent = new_parent;
                    point.position = local.position;
                }
            }),
            other => Err(StaticsError::config(format!(
                "a {other} cannot be re-parented"
            ))),
        }
    }
}
