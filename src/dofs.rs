//! Flat state vector over the free degrees of freedom of a scene.
//!
//! Slots are ordered by node creation, then by axis (x, y, z, rx, ry, rz).
//! Translations are stored in length units, rotations as components of the
//! local rotation vector in radians.

use std::f64::consts::PI;

use crate::{
    core::types::{DofAxis, FixedMask},
    error::{StaticsError, StaticsResult},
    scene::Scene,
    utils::allocator::NodeId,
};

/// One free coordinate of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DofSlot {
    pub node: NodeId,
    pub axis: DofAxis,
}

/// Index map between a scene's free coordinates and a flat vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DofMap {
    slots: Vec<DofSlot>,
    labels: Vec<String>,
    /// Frames and their fixed masks at build time.
    fingerprint: Vec<(NodeId, FixedMask)>,
}

fn frame_fingerprint(scene: &Scene) -> Vec<(NodeId, FixedMask)> {
    scene
        .iter()
        .filter_map(|(id, entry)| entry.node.frame().map(|frame| (id, frame.fixed)))
        .collect()
}

impl DofMap {
    pub fn build(scene: &Scene) -> Self {
        let fingerprint = frame_fingerprint(scene);
        let mut slots = Vec::new();
        let mut labels = Vec::new();
        for (id, fixed) in &fingerprint {
            let name = scene.name(*id).unwrap_or("?");
            for axis in fixed.free_axes() {
                slots.push(DofSlot { node: *id, axis });
                labels.push(format!("{name}.{axis}"));
            }
        }
        Self {
            slots,
            labels,
            fingerprint,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[DofSlot] {
        &self.slots
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// True while the scene's frames and fixed masks match the ones this map was built from.
    pub fn is_current(&self, scene: &Scene) -> bool {
        frame_fingerprint(scene) == self.fingerprint
    }

    fn ensure_current(&self, scene: &Scene) -> StaticsResult<()> {
        if self.is_current(scene) {
            Ok(())
        } else {
            Err(StaticsError::config(
                "stale dof map: frames or fixed masks changed since it was built",
            ))
        }
    }

    fn ensure_len(&self, values: &[f64]) -> StaticsResult<()> {
        if values.len() == self.len() {
            Ok(())
        } else {
            Err(StaticsError::config(format!(
                "dof vector has {} entries, the scene has {} free dofs",
                values.len(),
                self.len()
            )))
        }
    }

    pub fn get_dofs(&self, scene: &Scene) -> StaticsResult<Vec<f64>> {
        self.ensure_current(scene)?;
        self.slots
            .iter()
            .map(|slot| {
                let frame = scene.frame(slot.node)?;
                let c = slot.axis.component();
                Ok(if slot.axis.is_rotation() {
                    frame.rotation[c] * PI / 180.0
                } else {
                    frame.position[c]
                })
            })
            .collect()
    }

    /// Writes `x` into the scene and refreshes its transform cache.
    pub fn set_dofs(&self, scene: &mut Scene, x: &[f64]) -> StaticsResult<()> {
        self.ensure_current(scene)?;
        self.ensure_len(x)?;
        for (slot, value) in self.slots.iter().zip(x) {
            let frame = scene.frame_mut_unchecked(slot.node)?;
            let c = slot.axis.component();
            if slot.axis.is_rotation() {
                frame.rotation[c] = value * 180.0 / PI;
            } else {
                frame.position[c] = *value;
            }
        }
        scene.refresh()
    }

    /// Adds `delta` to the current values.
    pub fn change_dofs(&self, scene: &mut Scene, delta: &[f64]) -> StaticsResult<()> {
        self.ensure_len(delta)?;
        let mut x = self.get_dofs(scene)?;
        for (value, d) in x.iter_mut().zip(delta) {
            *value += d;
        }
        self.set_dofs(scene, &x)
    }
}
