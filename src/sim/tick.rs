//! Fixed timestep simulation tick
//!
//! Particles step first (effectors, integration, lifecycle), then the grid
//! relaxes and redraws.

use glam::Vec2;

use super::particle::{ParticleEnv, ParticleEvent};
use super::state::WarpWorld;
use crate::Bounds;
use crate::consts::*;

/// Per-step input from the host
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Position that picks up collectible particles (the player)
    pub collector: Option<Vec2>,
    /// Visible world area for particle screen exit
    pub viewport: Option<Bounds>,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut WarpWorld, input: &TickInput, dt: f32) {
    if world.pause.is_paused() {
        return;
    }
    world.time_ticks += 1;

    let env = ParticleEnv {
        effectors: &world.effectors,
        collector: input.collector,
        viewport: input.viewport,
    };
    world.particles.step(&env, dt);
    world.grid.update();
}

/// Accumulates frame time and runs whole `SIM_DT` ticks
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many ticks as `frame_dt` covers, capped at `MAX_SUBSTEPS`.
    /// Returns the number of ticks run and the particle events they raised.
    pub fn advance(
        &mut self,
        world: &mut WarpWorld,
        input: &TickInput,
        frame_dt: f32,
    ) -> (u32, Vec<ParticleEvent>) {
        // Clamp long frames (tab switches, breakpoints)
        self.accumulator += frame_dt.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(world, input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        (substeps, world.particles.drain_events())
    }

    /// Leftover time not yet simulated
    pub fn remainder(&self) -> f32 {
        self.accumulator
    }
}
