//! System force assembler: turns element loads into the residual vector.

use std::collections::HashMap;

use glam::{DQuat, DVec3};

use crate::{
    core::types::Wrench,
    dofs::DofMap,
    elements::{Contribution, EvalMode},
    error::{StaticsError, StaticsResult},
    scene::Scene,
    utils::allocator::NodeId,
};

/// Loads of one evaluation, per node and accumulated per frame.
#[derive(Debug, Clone, Default)]
pub struct LoadTable {
    /// Loads acting directly on a node, moment about the node's origin.
    direct: HashMap<NodeId, Wrench>,
    /// Loads on a frame and all of its descendants, moment about the frame's origin.
    frames: HashMap<NodeId, Wrench>,
    /// Loads on world-owned nodes (reactions), moment about the global origin.
    pub world: Wrench,
}

impl LoadTable {
    /// Total load on a node; for frames this includes their descendants.
    pub fn applied(&self, id: NodeId) -> StaticsResult<Wrench> {
        Ok(self
            .frames
            .get(&id)
            .or_else(|| self.direct.get(&id))
            .copied()
            .unwrap_or(Wrench::ZERO))
    }

    pub fn frame_total(&self, id: NodeId) -> Wrench {
        self.frames.get(&id).copied().unwrap_or(Wrench::ZERO)
    }
}

/// Collects the loads of every element, in node order.
pub fn contributions(scene: &Scene, mode: EvalMode) -> StaticsResult<Vec<Contribution>> {
    let state = scene.eval_state(mode);
    let mut out = Vec::new();
    for (id, entry) in scene.iter() {
        if let Some(element) = entry.node.as_element() {
            out.extend(element.contribute_forces(id, &state)?);
        }
    }
    Ok(out)
}

/// Sums all element loads onto their owning frames and up the frame tree.
pub fn assemble(scene: &Scene, mode: EvalMode) -> StaticsResult<LoadTable> {
    let poses = scene.transforms();
    let mut table = LoadTable::default();

    for contribution in contributions(scene, mode)? {
        let pose = poses.get(contribution.node)?;
        let wrench = contribution.wrench();
        *table.direct.entry(contribution.node).or_default() += wrench;
        match pose.owner {
            Some(frame) => {
                let origin = poses.get(frame)?.position();
                *table.frames.entry(frame).or_default() +=
                    wrench.transport(pose.position(), origin);
            }
            None => table.world += wrench.transport(pose.position(), DVec3::ZERO),
        }
    }

    // Deepest frames first so every child is complete before it is added to its parent.
    let mut frames: Vec<(usize, NodeId)> = scene
        .iter()
        .filter(|(_, entry)| entry.node.is_frame())
        .map(|(id, _)| Ok((scene.ancestors(id)?.len(), id)))
        .collect::<StaticsResult<_>>()?;
    frames.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, id) in frames {
        let total = table.frame_total(id);
        if total == Wrench::ZERO {
            continue;
        }
        if let Some(parent) = scene.frame(id)?.parent {
            let origin = poses.get(id)?.position();
            let parent_origin = poses.get(parent)?.position();
            *table.frames.entry(parent).or_default() += total.transport(origin, parent_origin);
        }
    }
    Ok(table)
}

/// Out-of-balance load per DOF slot of `map`.
///
/// Translational entries are force components and rotational entries moment
/// components about the frame origin, both in the axes of the frame's parent.
pub fn residual(scene: &Scene, map: &DofMap, mode: EvalMode) -> StaticsResult<Vec<f64>> {
    if map.is_empty() {
        return Ok(Vec::new());
    }
    if !map.is_current(scene) {
        return Err(StaticsError::config(
            "stale dof map: frames or fixed masks changed since it was built",
        ));
    }
    let table = assemble(scene, mode)?;
    let poses = scene.transforms();

    let mut local: HashMap<NodeId, Wrench> = HashMap::new();
    let mut out = Vec::with_capacity(map.len());
    for slot in map.slots() {
        let wrench = match local.get(&slot.node) {
            Some(w) => *w,
            None => {
                let parent_rotation = match scene.frame(slot.node)?.parent {
                    Some(parent) => poses.get(parent)?.pose.rotation,
                    None => DQuat::IDENTITY,
                };
                let inv = parent_rotation.inverse();
                let total = table.frame_total(slot.node);
                let w = Wrench::new(inv * total.force, inv * total.moment);
                local.insert(slot.node, w);
                w
            }
        };
        let c = slot.axis.component();
        out.push(if slot.axis.is_rotation() {
            wrench.moment[c]
        } else {
            wrench.force[c]
        });
    }
    Ok(out)
}
