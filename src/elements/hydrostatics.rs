//! Hydrostatic restoring elements.

use std::f64::consts::PI;

use glam::{DQuat, DVec3};

use crate::{
    core::node::{Buoyancy, HydSpring},
    elements::{Contribution, Element, EvalState},
    error::StaticsResult,
    utils::allocator::NodeId,
};

/// External collaborator that integrates buoyancy over a submerged shape.
///
/// `density` is the weight density of the fluid (mass density times
/// gravity), so the returned force is in the scene's force unit. The force
/// and moment are in global axes; the moment is about `position`.
pub trait BuoyancyModel: Send + Sync {
    fn name(&self) -> &str {
        "buoyancy"
    }

    fn compute_restoring(
        &self,
        position: DVec3,
        rotation: DQuat,
        density: f64,
        waterlevel: f64,
    ) -> (DVec3, DVec3);
}

/// Sphere whose buoyancy follows from the exact spherical-cap volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereFloat {
    /// Sphere centre in the parent frame.
    pub center: DVec3,
    pub radius: f64,
}

impl SphereFloat {
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Submerged volume and the distance of its centroid below the sphere centre.
    pub fn submerged(&self, depth: f64) -> (f64, f64) {
        let r = self.radius;
        let h = depth.clamp(0.0, 2.0 * r);
        if h == 0.0 {
            return (0.0, 0.0);
        }
        let volume = PI * h * h * (3.0 * r - h) / 3.0;
        let centroid = 3.0 * (2.0 * r - h).powi(2) / (4.0 * (3.0 * r - h));
        (volume, centroid)
    }
}

impl BuoyancyModel for SphereFloat {
    fn name(&self) -> &str {
        "sphere"
    }

    fn compute_restoring(
        &self,
        position: DVec3,
        rotation: DQuat,
        density: f64,
        waterlevel: f64,
    ) -> (DVec3, DVec3) {
        let center = position + rotation * self.center;
        let depth = waterlevel - (center.z - self.radius);
        let (volume, below) = self.submerged(depth);
        let force = DVec3::new(0.0, 0.0, density * volume);
        let centroid = center - DVec3::new(0.0, 0.0, below);
        (force, (centroid - position).cross(force))
    }
}

impl HydSpring {
    /// Heel and trim angles (radians) of the parent frame's z axis.
    fn heel_and_trim(rotation: DQuat) -> (f64, f64) {
        let z = rotation * DVec3::Z;
        ((-z.y).atan2(z.z), z.x.atan2(z.z))
    }
}

impl Element for HydSpring {
    fn contribute_forces(&self, _id: NodeId, state: &EvalState<'_>) -> StaticsResult<Vec<Contribution>> {
        let frame = state.poses.get(self.parent)?.pose;
        let cof = frame.to_global(DVec3::new(self.cof_x, self.cof_y, self.waterline));
        let immersion = cof.z - state.water.level;
        let vertical = self.displacement_kn - self.k_heave * immersion;
        let force = DVec3::new(0.0, 0.0, vertical);
        let cob = frame.to_global(self.cob);

        let (heel, trim) = Self::heel_and_trim(frame.rotation);
        let restoring = DVec3::new(
            -self.displacement_kn * self.bm_t * heel.sin(),
            -self.displacement_kn * self.bm_l * trim.sin(),
            0.0,
        );
        Ok(vec![Contribution::new(
            self.parent,
            force,
            (cob - frame.position).cross(force) + restoring,
        )])
    }
}

impl Element for Buoyancy {
    fn contribute_forces(&self, _id: NodeId, state: &EvalState<'_>) -> StaticsResult<Vec<Contribution>> {
        let frame = state.poses.get(self.parent)?.pose;
        let (force, moment) = self.model.compute_restoring(
            frame.position,
            frame.rotation,
            state.water.density * state.gravity,
            state.water.level,
        );
        Ok(vec![Contribution::new(self.parent, force, moment)])
    }
}
