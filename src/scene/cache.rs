//! Global transforms of every positioned node, refreshed whenever DOFs change.

use glam::DVec3;

use crate::{
    core::{
        node::{Node, NodeEntry},
        types::Pose,
    },
    error::{StaticsError, StaticsResult},
    utils::allocator::{Arena, NodeId},
};

/// Global placement of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePose {
    pub id: NodeId,
    /// Frames: own pose. Points and circles: location plus the owning frame's rotation.
    pub pose: Pose,
    /// Frame that carries loads applied to this node; `None` for the world.
    pub owner: Option<NodeId>,
    /// Global unit axis and radius, for circles only.
    pub circle: Option<(DVec3, f64)>,
}

impl NodePose {
    pub fn position(&self) -> DVec3 {
        self.pose.position
    }
}

/// Snapshot of all global poses, indexed by node slot.
#[derive(Debug, Clone, Default)]
pub struct TransformCache {
    slots: Vec<Option<NodePose>>,
}

impl TransformCache {
    /// Recomputes every pose from the local placements stored in `nodes`.
    pub fn rebuild(nodes: &Arena<NodeEntry>, order: &[NodeId]) -> StaticsResult<Self> {
        let mut cache = Self {
            slots: vec![None; nodes.capacity()],
        };
        for &id in order {
            cache.resolve(nodes, id, 0)?;
        }
        Ok(cache)
    }

    fn resolve(&mut self, nodes: &Arena<NodeEntry>, id: NodeId, depth: usize) -> StaticsResult<NodePose> {
        if let Some(pose) = self.slots.get(id.index()).copied().flatten() {
            if pose.id == id {
                return Ok(pose);
            }
        }
        if depth > nodes.capacity() {
            return Err(StaticsError::config(format!(
                "parent chain of node {id} does not terminate"
            )));
        }
        let entry = nodes
            .get(id)
            .ok_or_else(|| StaticsError::UnknownNode(id.to_string()))?;

        let resolved = match &entry.node {
            Node::Frame(_) | Node::RigidBody(_) => {
                let frame = entry.node.frame().ok_or_else(|| {
                    StaticsError::config(format!("{} is not a frame", entry.name))
                })?;
                let parent = match frame.parent {
                    Some(parent) => self.resolve(nodes, parent, depth + 1)?.pose,
                    None => Pose::default(),
                };
                NodePose {
                    id,
                    pose: parent.combine(&frame.local_pose()),
                    owner: Some(id),
                    circle: None,
                }
            }
            Node::Point(point) => {
                let (parent, owner) = match point.parent {
                    Some(parent) => {
                        let p = self.resolve(nodes, parent, depth + 1)?;
                        (p.pose, p.owner)
                    }
                    None => (Pose::default(), None),
                };
                NodePose {
                    id,
                    pose: Pose::new(parent.to_global(point.position), parent.rotation),
                    owner,
                    circle: None,
                }
            }
            Node::Circle(circle) => {
                let parent = self.resolve(nodes, circle.parent, depth + 1)?;
                let axis = (parent.pose.rotation * circle.axis).normalize_or_zero();
                NodePose {
                    circle: Some((axis, circle.radius)),
                    id,
                    ..parent
                }
            }
            // Elements without a placement of their own sit on their parent.
            other => match other.parent() {
                Some(parent) => {
                    let p = self.resolve(nodes, parent, depth + 1)?;
                    NodePose {
                        id,
                        circle: None,
                        ..p
                    }
                }
                None => NodePose {
                    id,
                    pose: Pose::default(),
                    owner: None,
                    circle: None,
                },
            },
        };
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = Some(resolved);
        }
        Ok(resolved)
    }

    pub fn get(&self, id: NodeId) -> StaticsResult<&NodePose> {
        self.slots
            .get(id.index())
            .and_then(|slot| slot.as_ref())
            .filter(|pose| pose.id == id)
            .ok_or_else(|| StaticsError::UnknownNode(id.to_string()))
    }
}
