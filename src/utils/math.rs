//! Additional math helpers layered on top of `glam`.

use glam::{DQuat, DVec3};

/// Builds a rotation from an axis-angle vector expressed in degrees.
pub fn quat_from_rotation_deg(rotation_deg: DVec3) -> DQuat {
    quat_from_rotation_vector(rotation_deg * std::f64::consts::PI / 180.0)
}

/// Builds a rotation from an axis-angle vector expressed in radians.
pub fn quat_from_rotation_vector(rotation: DVec3) -> DQuat {
    if rotation.length_squared() == 0.0 {
        return DQuat::IDENTITY;
    }
    DQuat::from_scaled_axis(rotation)
}

/// Axis-angle vector (radians) of a rotation, using the short way round.
pub fn rotation_vector(rotation: DQuat) -> DVec3 {
    let q = if rotation.w < 0.0 { -rotation } else { rotation };
    let v = q.xyz();
    let sin_half = v.length();
    if sin_half < 1e-15 {
        // first order: angle ≈ 2·sin(angle/2)
        return v * 2.0;
    }
    let angle = 2.0 * sin_half.atan2(q.w);
    v * (angle / sin_half)
}

/// Infinity norm of a residual-like slice.
pub fn inf_norm(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Half the squared Euclidean norm, the merit used by line searches.
pub fn merit(values: &[f64]) -> f64 {
    0.5 * values.iter().map(|v| v * v).sum::<f64>()
}

/// Component of `v` perpendicular to the unit vector `normal`.
pub fn project_onto_plane(v: DVec3, normal: DVec3) -> DVec3 {
    v - normal * v.dot(normal)
}
