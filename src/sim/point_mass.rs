//! Point masses - the nodes of the warping grid

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{BASE_DAMPING, VELOCITY_EPSILON};

/// A movable (or, with zero inverse mass, anchored) point on the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMass {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Lower values mean heavier points; 0 pins the point in place
    pub inverse_mass: f32,
    /// Accumulated this step, cleared by `integrate`
    acceleration: Vec2,
    /// Per-step velocity multiplier, reset to `BASE_DAMPING` after integration
    damping: f32,
}

impl PointMass {
    pub fn new(position: Vec2, inverse_mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            inverse_mass,
            acceleration: Vec2::ZERO,
            damping: BASE_DAMPING,
        }
    }

    /// An immovable point
    pub fn anchor(position: Vec2) -> Self {
        Self::new(position, 0.0)
    }

    #[inline]
    pub fn is_anchor(&self) -> bool {
        self.inverse_mass == 0.0
    }

    #[inline]
    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    #[inline]
    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force * self.inverse_mass;
    }

    /// Scale damping for the current step only
    pub fn increase_damping(&mut self, factor: f32) {
        self.damping *= factor;
    }

    /// Advance one step: velocity, position, snap, damp
    pub fn integrate(&mut self) {
        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
        if self.velocity.length_squared() < VELOCITY_EPSILON * VELOCITY_EPSILON {
            self.velocity = Vec2::ZERO;
        }

        self.velocity *= self.damping;
        self.damping = BASE_DAMPING;
    }
}
