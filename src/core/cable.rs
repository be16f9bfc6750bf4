use serde::{Deserialize, Serialize};

use crate::{
    error::{StaticsError, StaticsResult},
    utils::allocator::NodeId,
};

/// How friction at a circle relates the tensions on either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrictionModel {
    /// Rope sliding over a fixed surface: `T_after / T_before = exp(μθ)`.
    #[default]
    Capstan,
    /// Sheave turning on a pin: `T_after − T_before = μ·|resultant|`.
    Sheave,
}

/// One entry in a cable's path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CableConnection {
    /// A point or a circle.
    pub node: NodeId,
    /// Friction coefficient at a circle; positive means tension grows along the path.
    pub friction: Option<f64>,
    /// Wrap the circle about the opposite direction of its axis.
    pub reversed: bool,
}

impl CableConnection {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            friction: None,
            reversed: false,
        }
    }

    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = Some(friction);
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

/// Tension-only cable running over points and circles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cable {
    pub connections: Vec<CableConnection>,
    /// Unstretched length.
    pub length: f64,
    /// Axial stiffness.
    pub ea: f64,
    pub diameter: f64,
    pub mass_per_length: f64,
    pub friction_model: FrictionModel,
}

impl Cable {
    pub fn new(connections: &[NodeId], length: f64, ea: f64) -> Self {
        Self {
            connections: connections.iter().copied().map(CableConnection::new).collect(),
            length,
            ea,
            diameter: 0.0,
            mass_per_length: 0.0,
            friction_model: FrictionModel::default(),
        }
    }

    /// Assigns one friction entry per connection.
    pub fn with_friction(mut self, friction: &[Option<f64>]) -> Self {
        for (connection, mu) in self.connections.iter_mut().zip(friction) {
            connection.friction = *mu;
        }
        self
    }

    pub fn with_friction_model(mut self, model: FrictionModel) -> Self {
        self.friction_model = model;
        self
    }

    pub fn with_diameter(mut self, diameter: f64) -> Self {
        self.diameter = diameter;
        self
    }

    pub fn with_mass_per_length(mut self, mass_per_length: f64) -> Self {
        self.mass_per_length = mass_per_length;
        self
    }

    /// A closed loop starts and ends at the same connection.
    pub fn is_grommet(&self) -> bool {
        self.connections.len() > 2
            && self.connections.first().map(|c| c.node) == self.connections.last().map(|c| c.node)
    }

    /// Connections that make up the path; the closing entry of a grommet is dropped.
    pub fn path_connections(&self) -> &[CableConnection] {
        if self.is_grommet() {
            &self.connections[..self.connections.len() - 1]
        } else {
            &self.connections
        }
    }

    pub fn has_friction(&self) -> bool {
        self.path_connections()
            .iter()
            .any(|c| c.friction.is_some_and(|mu| mu != 0.0))
    }

    /// Checks the parameters that do not depend on the rest of the scene.
    pub fn validate(&self) -> StaticsResult<()> {
        if self.connections.len() < 2 {
            return Err(StaticsError::config(
                "a cable needs at least two connections",
            ));
        }
        if !(self.length > 0.0) {
            return Err(StaticsError::config(format!(
                "cable length must be positive, got {}",
                self.length
            )));
        }
        if !(self.ea > 0.0) {
            return Err(StaticsError::config(format!(
                "cable EA must be positive, got {}",
                self.ea
            )));
        }
        if self.diameter < 0.0 || self.mass_per_length < 0.0 {
            return Err(StaticsError::config(
                "cable diameter and mass per length must not be negative",
            ));
        }
        for pair in self.connections.windows(2) {
            if pair[0].node == pair[1].node {
                return Err(StaticsError::config(format!(
                    "cable connects node {} to itself",
                    pair[0].node
                )));
            }
        }
        if self.is_grommet() && self.path_connections().len() < 2 {
            return Err(StaticsError::config(
                "a grommet needs at least two distinct circles",
            ));
        }
        if self.has_friction() {
            let unspecified = self
                .path_connections()
                .iter()
                .filter(|c| c.friction.is_none())
                .count();
            if self.is_grommet() && unspecified > 1 {
                return Err(StaticsError::config(
                    "at most one grommet connection may leave its friction unspecified",
                ));
            }
            if self.friction_model == FrictionModel::Sheave
                && self
                    .path_connections()
                    .iter()
                    .filter_map(|c| c.friction)
                    .any(|mu| mu.abs() >= 1.0)
            {
                return Err(StaticsError::config(
                    "sheave friction coefficients must be smaller than 1",
                ));
            }
        }
        Ok(())
    }

    /// Index (in `path_connections`) of the grommet connection whose friction is derived.
    pub fn derived_connection(&self) -> usize {
        self.path_connections()
            .iter()
            .position(|c| c.friction.is_none())
            .unwrap_or(0)
    }
}
