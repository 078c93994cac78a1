//! Effector steering for projectiles
//!
//! Unlike particles, a projectile snapshots the effectors that steer it when
//! it is enabled and keeps that list for its lifetime, pruning ids whose
//! effector has since been removed.

use glam::Vec2;

use super::effector::{EffectorId, EffectorRegistry};
use super::grid::WarpingGrid;

/// Per-frame force scale before the projectile multiplier
const STEERING_RATE: f32 = 30.0;
/// Wake pushed into the grid, as a fraction of projectile velocity
const WAKE_SCALE: f32 = 0.002;
const WAKE_RADIUS: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct ProjectileSteering {
    effectors: Vec<EffectorId>,
    /// Scales the summed effector force
    pub effector_multiplier: f32,
}

impl Default for ProjectileSteering {
    fn default() -> Self {
        Self {
            effectors: Vec::new(),
            effector_multiplier: 200.0,
        }
    }
}

impl ProjectileSteering {
    pub fn new(effector_multiplier: f32) -> Self {
        Self {
            effector_multiplier,
            ..Default::default()
        }
    }

    /// Take a fresh snapshot of projectile-affecting effectors
    pub fn on_enable(&mut self, registry: &EffectorRegistry) {
        self.effectors = registry.projectile_snapshot();
    }

    /// Ids still tracked from the last snapshot
    pub fn tracked(&self) -> &[EffectorId] {
        &self.effectors
    }

    /// Force to add to a projectile at `position` this frame
    pub fn steering_force(&mut self, registry: &EffectorRegistry, position: Vec2, dt: f32) -> Vec2 {
        if self.effectors.is_empty() {
            return Vec2::ZERO;
        }

        self.effectors.retain(|&id| registry.contains(id));

        let force: Vec2 = self
            .effectors
            .iter()
            .filter_map(|&id| registry.get(id))
            .filter(|e| e.is_active() && e.affects_projectiles)
            .map(|e| e.projectile_force(position))
            .sum();

        force * STEERING_RATE * dt * self.effector_multiplier
    }
}

/// Ripple the grid behind a moving projectile
pub fn projectile_wake(grid: &mut WarpingGrid, position: Vec2, velocity: Vec2) {
    grid.apply_directed_force(velocity * WAKE_SCALE, position, WAKE_RADIUS);
}
