//! Cable evaluator: tension-only axial stiffness, sheave friction and grommet loops.
//!
//! All segments of a cable share one unstretched length. With friction the
//! tension of segment `j` is `f_j · T0`, where `f_j` is the product of the
//! friction ratios met along the path since the reference segment. The level
//! `T0` follows from length consistency:
//!
//! ```text
//! Σ_j  L_j / (1 + f_j·T0 / EA)  =  L0
//! ```
//!
//! with `L_j` the straight length of segment `j` plus half of the wraps at its
//! ends. For a grommet the reference segment is the one leaving the connection
//! whose friction is left unspecified; the friction force at that connection
//! is whatever closes the loop.

use glam::DVec3;
use serde::Serialize;

use crate::{
    config::LENGTH_EPSILON,
    core::{
        cable::{Cable, FrictionModel},
        types::Wrench,
    },
    elements::{Contribution, Element, EvalMode, EvalState},
    error::{StaticsError, StaticsResult},
    geometry::{
        path::{self, Anchor, CablePath},
        sheave::{capstan_factor, sheave_factor, CircleGeometry},
    },
    utils::allocator::NodeId,
};

const MAX_TENSION_ITERATIONS: usize = 100;

/// Solved state of a cable, for inspection and reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CableState {
    /// Tension per straight segment, in path order.
    pub segment_tensions: Vec<f64>,
    /// `T_after − T_before` at every path connection (zero at open ends).
    pub friction_forces: Vec<f64>,
    /// Wrap angle per path connection, radians.
    pub wrap_angles: Vec<f64>,
    /// Geometric length, straight parts plus wraps.
    pub stretched_length: f64,
    /// Length of the cable without load.
    pub unstretched_length: f64,
}

impl CableState {
    /// Largest segment tension.
    pub fn max_tension(&self) -> f64 {
        self.segment_tensions.iter().copied().fold(0.0, f64::max)
    }

    pub fn is_slack(&self) -> bool {
        self.segment_tensions.iter().all(|t| *t == 0.0)
    }
}

/// Geometry and tensions of a cable at one state.
#[derive(Debug, Clone)]
pub struct CableSolution {
    pub path: CablePath,
    pub tensions: Vec<f64>,
    nodes: Vec<NodeId>,
    centers: Vec<DVec3>,
}

impl Cable {
    fn anchors(&self, state: &EvalState<'_>) -> StaticsResult<(Vec<Anchor>, Vec<NodeId>)> {
        let connections = self.path_connections();
        let mut anchors = Vec::with_capacity(connections.len());
        let mut nodes = Vec::with_capacity(connections.len());
        for connection in connections {
            let pose = state.poses.get(connection.node)?;
            let anchor = match pose.circle {
                Some((axis, radius)) => {
                    let sense = if connection.reversed { -1.0 } else { 1.0 };
                    Anchor::Circle(CircleGeometry {
                        center: pose.position(),
                        axis: axis * sense,
                        radius: radius + 0.5 * self.diameter,
                    })
                }
                None => Anchor::Point(pose.position()),
            };
            anchors.push(anchor);
            nodes.push(connection.node);
        }
        Ok((anchors, nodes))
    }

    /// Tension ratio `T_after / T_before` imposed at path connection `k`.
    fn friction_ratio(&self, k: usize, path: &CablePath) -> f64 {
        let connection = &self.path_connections()[k];
        let Some(mu) = connection.friction else {
            return 1.0;
        };
        let contact = &path.contacts[k];
        if mu == 0.0 || contact.wrap_angle == 0.0 {
            return 1.0;
        }
        match self.friction_model {
            FrictionModel::Capstan => capstan_factor(mu, contact.wrap_angle),
            FrictionModel::Sheave => {
                let (Some(before), Some(after)) = (path.segment_before(k), path.segment_after(k))
                else {
                    return 1.0;
                };
                sheave_factor(
                    mu,
                    -path.segments[before].direction,
                    path.segments[after].direction,
                )
            }
        }
    }

    /// Relative tension of every segment, reference segment at 1.
    fn tension_factors(&self, path: &CablePath, mode: EvalMode) -> Vec<f64> {
        let n = path.segments.len();
        let mut factors = vec![1.0; n];
        if mode == EvalMode::Linearized || !self.has_friction() {
            return factors;
        }
        let start = if path.closed {
            self.derived_connection()
        } else {
            0
        };
        for step in 1..n {
            let j = (start + step) % n;
            let prev = (j + n - 1) % n;
            factors[j] = factors[prev] * self.friction_ratio(j, path);
        }
        factors
    }

    /// Reference tension `T0` satisfying the length consistency.
    fn reference_tension(&self, shares: &[f64], factors: &[f64], mode: EvalMode) -> f64 {
        let total: f64 = shares.iter().sum();
        let uniform = factors.iter().all(|f| *f == 1.0);
        if uniform {
            let tension = self.ea * (total - self.length) / self.length;
            return match mode {
                EvalMode::Linearized => tension,
                EvalMode::Full => tension.max(0.0),
            };
        }
        if total <= self.length {
            return 0.0;
        }
        // g(T) is convex and decreasing, so Newton from T = 0 approaches the root from below.
        let mut tension = 0.0_f64;
        for _ in 0..MAX_TENSION_ITERATIONS {
            let mut g = -self.length;
            let mut dg = 0.0;
            for (l, f) in shares.iter().zip(factors) {
                let s = 1.0 + f * tension / self.ea;
                g += l / s;
                dg -= l * f / (self.ea * s * s);
            }
            if dg == 0.0 {
                break;
            }
            let step = g / dg;
            tension -= step;
            if step.abs() <= 1e-15 * tension.abs().max(1.0) {
                break;
            }
        }
        tension.max(0.0)
    }

    /// Resolves path geometry and segment tensions at the current state.
    pub fn solve(&self, state: &EvalState<'_>) -> StaticsResult<CableSolution> {
        let (anchors, nodes) = self.anchors(state)?;
        let path = path::resolve(&anchors, self.is_grommet())?;
        let factors = self.tension_factors(&path, state.mode);
        let shares: Vec<f64> = (0..path.segments.len())
            .map(|j| path.segment_share(j))
            .collect();
        let reference = self.reference_tension(&shares, &factors, state.mode);
        let tensions = factors.iter().map(|f| f * reference).collect();
        Ok(CableSolution {
            centers: anchors.iter().map(Anchor::center).collect(),
            path,
            tensions,
            nodes,
        })
    }

    /// Reporting view of [`Cable::solve`].
    pub fn state(&self, state: &EvalState<'_>) -> StaticsResult<CableState> {
        let solution = self.solve(state)?;
        let path = &solution.path;
        let friction_forces = (0..path.contacts.len())
            .map(|k| match (path.segment_before(k), path.segment_after(k)) {
                (Some(before), Some(after)) => solution.tensions[after] - solution.tensions[before],
                _ => 0.0,
            })
            .collect();
        Ok(CableState {
            segment_tensions: solution.tensions.clone(),
            friction_forces,
            wrap_angles: path.contacts.iter().map(|c| c.wrap_angle).collect(),
            stretched_length: path.total_length(),
            unstretched_length: self.length,
        })
    }
}

impl Element for Cable {
    fn contribute_forces(&self, _id: NodeId, state: &EvalState<'_>) -> StaticsResult<Vec<Contribution>> {
        let solution = self.solve(state)?;
        let path = &solution.path;
        let n = path.contacts.len();
        let mut loads = vec![Wrench::ZERO; n];

        for (j, segment) in path.segments.iter().enumerate() {
            let tension = solution.tensions[j];
            let a = j;
            let b = (j + 1) % n;
            let pull = if segment.length > LENGTH_EPSILON {
                segment.direction * tension
            } else if tension == 0.0 || state.mode == EvalMode::Linearized {
                // a collapsed two-way spring has no line of action
                DVec3::ZERO
            } else {
                return Err(StaticsError::geometry(format!(
                    "cable segment {j} has zero length but carries tension {tension:.6e}"
                )));
            };
            loads[a] += Wrench::new(pull, (segment.start - solution.centers[a]).cross(pull));
            loads[b] += Wrench::new(-pull, (segment.end - solution.centers[b]).cross(-pull));

            if self.mass_per_length > 0.0 {
                let half = DVec3::new(
                    0.0,
                    0.0,
                    -0.5 * self.mass_per_length * state.gravity * path.segment_share(j),
                );
                loads[a].force += half;
                loads[b].force += half;
            }
        }

        Ok(solution
            .nodes
            .iter()
            .zip(loads)
            .map(|(node, w)| Contribution::new(*node, w.force, w.moment))
            .collect())
    }
}
