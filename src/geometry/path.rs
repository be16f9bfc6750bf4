//! Resolves the full geometric path of a cable over points and circles.

use glam::DVec3;

use crate::{
    config::{LENGTH_EPSILON, MAX_TANGENT_SWEEPS, TANGENT_SWEEP_TOLERANCE},
    error::StaticsResult,
    geometry::sheave::{self, CircleGeometry},
};

/// A connection of a cable with its global geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Point(DVec3),
    Circle(CircleGeometry),
}

impl Anchor {
    /// Reference location used for moments and initial tangent guesses.
    pub fn center(&self) -> DVec3 {
        match self {
            Anchor::Point(p) => *p,
            Anchor::Circle(c) => c.center,
        }
    }
}

/// Resolved contact at one connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    /// Where the cable arrives at the connection.
    pub arrive: DVec3,
    /// Where the cable leaves the connection.
    pub leave: DVec3,
    pub wrap_angle: f64,
    pub arc_length: f64,
}

/// Straight part of a cable between two consecutive connections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentGeometry {
    pub start: DVec3,
    pub end: DVec3,
    pub length: f64,
    /// Unit vector from start to end, zero for a degenerate segment.
    pub direction: DVec3,
}

/// Geometry of a complete cable path.
#[derive(Debug, Clone, PartialEq)]
pub struct CablePath {
    pub contacts: Vec<ContactGeometry>,
    /// Segment `j` runs from connection `j` to connection `j + 1` (cyclic when closed).
    pub segments: Vec<SegmentGeometry>,
    pub closed: bool,
}

impl CablePath {
    /// Segment arriving at connection `k`, if any.
    pub fn segment_before(&self, k: usize) -> Option<usize> {
        if k > 0 {
            Some(k - 1)
        } else if self.closed {
            Some(self.segments.len() - 1)
        } else {
            None
        }
    }

    /// Segment leaving connection `k`, if any.
    pub fn segment_after(&self, k: usize) -> Option<usize> {
        (k < self.segments.len()).then_some(k)
    }

    /// Straight length of segment `j` plus half of the wraps at both of its ends.
    pub fn segment_share(&self, j: usize) -> f64 {
        let n = self.contacts.len();
        let start = j;
        let end = (j + 1) % n;
        self.segments[j].length
            + 0.5 * (self.contacts[start].arc_length + self.contacts[end].arc_length)
    }

    /// Total geometric length, straight parts plus wraps.
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum::<f64>()
            + self.contacts.iter().map(|c| c.arc_length).sum::<f64>()
    }
}

fn neighbour(index: isize, len: usize, closed: bool) -> Option<usize> {
    if closed {
        Some(index.rem_euclid(len as isize) as usize)
    } else if index < 0 || index as usize >= len {
        None
    } else {
        Some(index as usize)
    }
}

/// Resolves tangent points for every circle along the path.
///
/// Circle-to-circle tangents follow from a Gauss-Seidel sweep: each circle
/// uses the current leave/arrive points of its neighbours as anchors until no
/// tangent point moves by more than the sweep tolerance.
pub fn resolve(anchors: &[Anchor], closed: bool) -> StaticsResult<CablePath> {
    let n = anchors.len();
    let mut arrive: Vec<DVec3> = anchors.iter().map(Anchor::center).collect();
    let mut leave = arrive.clone();
    let mut wraps = vec![0.0_f64; n];

    let has_circles = anchors.iter().any(|a| matches!(a, Anchor::Circle(_)));
    let sweeps = if has_circles { MAX_TANGENT_SWEEPS } else { 0 };
    for _ in 0..sweeps {
        let mut moved = 0.0_f64;
        for k in 0..n {
            let Anchor::Circle(circle) = &anchors[k] else {
                continue;
            };
            let prev = neighbour(k as isize - 1, n, closed).map(|i| leave[i]);
            let next = neighbour(k as isize + 1, n, closed).map(|i| arrive[i]);
            let (Some(prev), Some(next)) = (prev, next) else {
                continue;
            };
            let contact = sheave::wrap(prev, circle, next)?;
            moved = moved
                .max(contact.entry.distance(arrive[k]))
                .max(contact.exit.distance(leave[k]));
            arrive[k] = contact.entry;
            leave[k] = contact.exit;
            wraps[k] = contact.wrap_angle;
        }
        if moved < TANGENT_SWEEP_TOLERANCE {
            break;
        }
    }

    let contacts = anchors
        .iter()
        .enumerate()
        .map(|(k, anchor)| {
            let radius = match anchor {
                Anchor::Circle(c) => c.radius,
                Anchor::Point(_) => 0.0,
            };
            ContactGeometry {
                arrive: arrive[k],
                leave: leave[k],
                wrap_angle: wraps[k],
                arc_length: wraps[k] * radius,
            }
        })
        .collect();

    let segment_count = if closed { n } else { n - 1 };
    let segments = (0..segment_count)
        .map(|j| {
            let start = leave[j];
            let end = arrive[(j + 1) % n];
            let delta = end - start;
            let length = delta.length();
            let direction = if length > LENGTH_EPSILON {
                delta / length
            } else {
                DVec3::ZERO
            };
            SegmentGeometry {
                start,
                end,
                length,
                direction,
            }
        })
        .collect();

    Ok(CablePath {
        contacts,
        segments,
        closed,
    })
}
