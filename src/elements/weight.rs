use glam::DVec3;

use crate::{
    core::node::{ExternalForce, RigidBody},
    elements::{Contribution, Element, EvalState},
    error::StaticsResult,
    utils::allocator::NodeId,
};

impl Element for RigidBody {
    fn contribute_forces(&self, id: NodeId, state: &EvalState<'_>) -> StaticsResult<Vec<Contribution>> {
        if self.mass == 0.0 {
            return Ok(Vec::new());
        }
        let pose = state.poses.get(id)?;
        let cog = pose.pose.to_global(self.cog);
        let weight = DVec3::new(0.0, 0.0, -self.mass * state.gravity);
        Ok(vec![Contribution::at_point(id, weight, cog, pose.position())])
    }
}

impl Element for ExternalForce {
    fn contribute_forces(&self, _id: NodeId, _state: &EvalState<'_>) -> StaticsResult<Vec<Contribution>> {
        Ok(vec![Contribution::new(self.parent, self.force, self.moment)])
    }
}
