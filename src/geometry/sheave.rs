//! Tangent points, wrap angles and friction factors of a cable passing a circle.
//!
//! The cable is taken to circulate in the positive sense about the circle's
//! (effective) axis when travelling along its connection order. Reversing a
//! connection flips the axis and therefore the side of the circle the cable
//! runs over.

use std::f64::consts::TAU;

use glam::DVec3;

use crate::{
    error::{StaticsError, StaticsResult},
    utils::math::project_onto_plane,
};

/// Global description of a circular contact surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleGeometry {
    pub center: DVec3,
    /// Unit axis, already flipped for reversed connections.
    pub axis: DVec3,
    /// Effective radius (circle radius plus half the cable diameter).
    pub radius: f64,
}

/// Where and how far a cable wraps a circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheaveContact {
    /// Tangent point where the cable arrives from the previous anchor.
    pub entry: DVec3,
    /// Tangent point where the cable leaves towards the next anchor.
    pub exit: DVec3,
    /// Angle swept from entry to exit, in `[0, 2π)`.
    pub wrap_angle: f64,
    /// Unit direction from the entry point towards the previous anchor.
    pub dir_prev: DVec3,
    /// Unit direction from the exit point towards the next anchor.
    pub dir_next: DVec3,
}

impl SheaveContact {
    pub fn arc_length(&self, radius: f64) -> f64 {
        self.wrap_angle * radius
    }
}

/// In-plane offset of `anchor` from the circle centre, with its length.
fn in_plane_offset(anchor: DVec3, circle: &CircleGeometry) -> StaticsResult<(DVec3, f64)> {
    let offset = project_onto_plane(anchor - circle.center, circle.axis);
    let distance = offset.length();
    if distance <= circle.radius {
        return Err(StaticsError::geometry(format!(
            "cable anchor at {anchor} lies inside a circle of radius {} (in-plane distance {distance:.6})",
            circle.radius
        )));
    }
    Ok((offset / distance, distance))
}

/// Tangent point reached by a cable arriving from `anchor`.
pub fn entry_tangent(anchor: DVec3, circle: &CircleGeometry) -> StaticsResult<DVec3> {
    let (u, d) = in_plane_offset(anchor, circle)?;
    let v = circle.axis.cross(u);
    let cos_a = circle.radius / d;
    let sin_a = (1.0 - cos_a * cos_a).max(0.0).sqrt();
    Ok(circle.center + circle.radius * (cos_a * u + sin_a * v))
}

/// Tangent point from which a cable leaves towards `anchor`.
pub fn exit_tangent(anchor: DVec3, circle: &CircleGeometry) -> StaticsResult<DVec3> {
    let (u, d) = in_plane_offset(anchor, circle)?;
    let v = circle.axis.cross(u);
    let cos_a = circle.radius / d;
    let sin_a = (1.0 - cos_a * cos_a).max(0.0).sqrt();
    Ok(circle.center + circle.radius * (cos_a * u - sin_a * v))
}

/// Angle swept about `axis` when moving from `entry` to `exit` around `center`.
pub fn wrap_angle(entry: DVec3, exit: DVec3, center: DVec3, axis: DVec3) -> f64 {
    let r1 = entry - center;
    let r2 = exit - center;
    let angle = axis.dot(r1.cross(r2)).atan2(r1.dot(r2));
    let angle = angle.rem_euclid(TAU);
    if angle >= TAU {
        0.0
    } else {
        angle
    }
}

/// Solves the wrap of a cable running `prev → circle → next`.
pub fn wrap(prev: DVec3, circle: &CircleGeometry, next: DVec3) -> StaticsResult<SheaveContact> {
    let entry = entry_tangent(prev, circle)?;
    let exit = exit_tangent(next, circle)?;
    Ok(SheaveContact {
        entry,
        exit,
        wrap_angle: wrap_angle(entry, exit, circle.center, circle.axis),
        dir_prev: (prev - entry).normalize_or_zero(),
        dir_next: (next - exit).normalize_or_zero(),
    })
}

/// Capstan ratio `T_after / T_before` for a rope sliding over a fixed surface.
pub fn capstan_factor(mu: f64, wrap_angle: f64) -> f64 {
    (mu * wrap_angle).exp()
}

/// Ratio `T_after / T_before` for a sheave with pin friction.
///
/// Solves `ρ − 1 = μ·|u_prev + ρ·u_next|`, where both unit vectors point
/// away from the sheave along the cable. The two roots of the squared
/// equation are reciprocal; the sign of `μ` selects the one above or below 1.
pub fn sheave_factor(mu: f64, dir_prev: DVec3, dir_next: DVec3) -> f64 {
    if mu == 0.0 {
        return 1.0;
    }
    let c = dir_prev.dot(dir_next).clamp(-1.0, 1.0);
    let mu2 = mu * mu;
    let a = 1.0 + mu2 * c;
    let b = 1.0 - mu2;
    let disc = (a * a - b * b).max(0.0);
    let rho = (a + disc.sqrt()) / b;
    if mu > 0.0 {
        rho
    } else {
        1.0 / rho
    }
}
