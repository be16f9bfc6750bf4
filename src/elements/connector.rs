use glam::DVec3;

use crate::{
    core::node::LinearConnector6d,
    elements::{Contribution, Element, EvalState},
    error::StaticsResult,
    utils::{allocator::NodeId, math::rotation_vector},
};

impl LinearConnector6d {
    /// Translation and rotation vector of the secondary relative to the main, in main axes.
    pub fn relative_displacement(&self, state: &EvalState<'_>) -> StaticsResult<(DVec3, DVec3)> {
        let main = state.poses.get(self.main)?.pose;
        let secondary = state.poses.get(self.secondary)?.pose;
        let relative = main.relative(&secondary);
        Ok((relative.position, rotation_vector(relative.rotation)))
    }
}

impl Element for LinearConnector6d {
    fn contribute_forces(&self, _id: NodeId, state: &EvalState<'_>) -> StaticsResult<Vec<Contribution>> {
        let main = state.poses.get(self.main)?.pose;
        let secondary = state.poses.get(self.secondary)?.pose;
        let (d, r) = self.relative_displacement(state)?;
        let k = &self.stiffness;

        let force_local = -DVec3::new(k[0] * d.x, k[1] * d.y, k[2] * d.z);
        let moment_local = -DVec3::new(k[3] * r.x, k[4] * r.y, k[5] * r.z);
        let force = main.rotation * force_local;
        let moment = main.rotation * moment_local;

        // The reaction on the main acts at the secondary's origin.
        Ok(vec![
            Contribution::new(self.secondary, force, moment),
            Contribution::new(
                self.main,
                -force,
                -moment + (secondary.position - main.position).cross(-force),
            ),
        ])
    }
}
