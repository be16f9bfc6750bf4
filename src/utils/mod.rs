//! Utility helpers: math extensions, the node arena, logging and profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, NodeId};
pub use math::*;
