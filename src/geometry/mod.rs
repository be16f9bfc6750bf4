//! Cable path geometry: sheave tangents, wrap angles and friction factors.

pub mod path;
pub mod sheave;

pub use path::{Anchor, CablePath, ContactGeometry, SegmentGeometry};
pub use sheave::{capstan_factor, sheave_factor, wrap, CircleGeometry, SheaveContact};
