use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg};

use crate::config::{DEFAULT_WATER_DENSITY, DEFAULT_WATER_LEVEL};

/// One of the six generalized coordinates of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DofAxis {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
}

impl DofAxis {
    pub const ALL: [DofAxis; 6] = [
        DofAxis::X,
        DofAxis::Y,
        DofAxis::Z,
        DofAxis::Rx,
        DofAxis::Ry,
        DofAxis::Rz,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_rotation(self) -> bool {
        self.index() >= 3
    }

    /// Component index within the translation or rotation 3-vector.
    pub fn component(self) -> usize {
        self.index() % 3
    }
}

impl fmt::Display for DofAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DofAxis::X => "x",
            DofAxis::Y => "y",
            DofAxis::Z => "z",
            DofAxis::Rx => "rx",
            DofAxis::Ry => "ry",
            DofAxis::Rz => "rz",
        };
        f.write_str(s)
    }
}

/// Which of the six coordinates of a frame are prescribed (`true`) rather than free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedMask(pub [bool; 6]);

impl Default for FixedMask {
    fn default() -> Self {
        Self::ALL_FIXED
    }
}

impl FixedMask {
    pub const ALL_FIXED: FixedMask = FixedMask([true; 6]);
    pub const ALL_FREE: FixedMask = FixedMask([false; 6]);

    /// Only vertical translation is free.
    pub const HEAVE_ONLY: FixedMask = FixedMask([true, true, false, true, true, true]);

    /// All translations free, all rotations fixed.
    pub const TRANSLATION_ONLY: FixedMask = FixedMask([false, false, false, true, true, true]);

    pub fn is_fixed(&self, axis: DofAxis) -> bool {
        self.0[axis.index()]
    }

    pub fn set(&mut self, axis: DofAxis, fixed: bool) {
        self.0[axis.index()] = fixed;
    }

    pub fn free_axes(&self) -> impl Iterator<Item = DofAxis> + '_ {
        DofAxis::ALL.into_iter().filter(|axis| !self.is_fixed(*axis))
    }

    pub fn free_count(&self) -> usize {
        self.0.iter().filter(|fixed| !**fixed).count()
    }
}

/// Global placement of a node: position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec3,
    pub rotation: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }

    /// Applies a local placement on top of this one, returning the composition.
    pub fn combine(&self, local: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    /// Maps a point given in local coordinates to global coordinates.
    pub fn to_global(&self, local: DVec3) -> DVec3 {
        self.position + self.rotation * local
    }

    /// Maps a global point into local coordinates.
    pub fn to_local(&self, global: DVec3) -> DVec3 {
        self.rotation.inverse() * (global - self.position)
    }

    /// Local placement that yields `global` when combined with `self`.
    pub fn relative(&self, global: &Pose) -> Pose {
        let inv = self.rotation.inverse();
        Pose {
            position: inv * (global.position - self.position),
            rotation: (inv * global.rotation).normalize(),
        }
    }
}

/// A force together with a moment, both in global axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wrench {
    pub force: DVec3,
    pub moment: DVec3,
}

impl Wrench {
    pub const ZERO: Wrench = Wrench {
        force: DVec3::ZERO,
        moment: DVec3::ZERO,
    };

    pub fn new(force: DVec3, moment: DVec3) -> Self {
        Self { force, moment }
    }

    /// Re-expresses the moment about `to`, given that it is currently taken about `from`.
    pub fn transport(&self, from: DVec3, to: DVec3) -> Wrench {
        Wrench {
            force: self.force,
            moment: self.moment + (from - to).cross(self.force),
        }
    }
}

impl Add for Wrench {
    type Output = Wrench;

    fn add(self, rhs: Wrench) -> Wrench {
        Wrench {
            force: self.force + rhs.force,
            moment: self.moment + rhs.moment,
        }
    }
}

impl AddAssign for Wrench {
    fn add_assign(&mut self, rhs: Wrench) {
        self.force += rhs.force;
        self.moment += rhs.moment;
    }
}

impl Neg for Wrench {
    type Output = Wrench;

    fn neg(self) -> Wrench {
        Wrench {
            force: -self.force,
            moment: -self.moment,
        }
    }
}

/// Fluid properties used by hydrostatic elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterProperties {
    pub density: f64,
    pub level: f64,
}

impl Default for WaterProperties {
    fn default() -> Self {
        Self {
            density: DEFAULT_WATER_DENSITY,
            level: DEFAULT_WATER_LEVEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::quat_from_rotation_deg;

    #[test]
    fn transport_adds_lever_arm_moment() {
        let w = Wrench::new(DVec3::new(0.0, 0.0, -10.0), DVec3::ZERO);
        let moved = w.transport(DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO);
        assert!((moved.moment - DVec3::new(0.0, 10.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn relative_inverts_combine() {
        let parent = Pose::new(
            DVec3::new(1.0, 2.0, 3.0),
            quat_from_rotation_deg(DVec3::new(0.0, 0.0, 90.0)),
        );
        let local = Pose::new(
            DVec3::new(0.5, 0.0, -1.0),
            quat_from_rotation_deg(DVec3::new(10.0, 0.0, 0.0)),
        );
        let global = parent.combine(&local);
        let back = parent.relative(&global);
        assert!((back.position - local.position).length() < 1e-12);
        assert!(back.rotation.angle_between(local.rotation) < 1e-9);
    }

    #[test]
    fn fixed_mask_counts_free_axes() {
        let mask = FixedMask::HEAVE_ONLY;
        assert_eq!(mask.free_count(), 1);
        assert_eq!(mask.free_axes().collect::<Vec<_>>(), vec![DofAxis::Z]);
    }
}
