//! World context owning every simulated subsystem
//!
//! Replaces scene-wide singletons: gameplay code holds a `WarpWorld` and
//! passes it to `tick`. All subsystems share one pause flag.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effector::{Effector, EffectorId, EffectorRegistry};
use super::grid::{GridConfig, WarpingGrid};
use super::particle::ParticleBuilder;
use super::particle_field::{ParticleField, ParticleId};
use super::pause::PauseFlag;
use crate::error::ConfigError;
use crate::settings::Settings;

/// Everything needed to build a world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub grid: GridConfig,
    pub max_particles: usize,
    /// Build the grid immediately
    pub grid_enabled: bool,
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            max_particles: 500,
            grid_enabled: true,
            seed: 0,
        }
    }
}

/// Grid, effectors and particles stepped together
#[derive(Debug)]
pub struct WarpWorld {
    pub grid: WarpingGrid,
    pub effectors: EffectorRegistry,
    pub particles: ParticleField,
    pub pause: PauseFlag,
    /// Seeded RNG for spawn patterns
    pub rng: Pcg32,
    /// Steps taken while unpaused
    pub time_ticks: u64,
}

impl WarpWorld {
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        let pause = PauseFlag::new();
        let mut grid = WarpingGrid::new(config.grid, pause.clone())?;
        let particles = ParticleField::with_capacity(config.max_particles, pause.clone())?;
        if config.grid_enabled {
            grid.create_grid();
        }

        log::info!(
            "World ready: {} particle slots, grid {}",
            config.max_particles,
            if config.grid_enabled { "on" } else { "off" }
        );

        Ok(Self {
            grid,
            effectors: EffectorRegistry::new(),
            particles,
            pause,
            rng: Pcg32::seed_from_u64(config.seed),
            time_ticks: 0,
        })
    }

    /// Build from persisted settings; the grid toggle is applied separately
    pub fn from_settings(settings: &Settings, seed: u64) -> Result<Self, ConfigError> {
        Self::new(WorldConfig {
            grid: settings.grid_config(),
            max_particles: settings.max_particles(),
            grid_enabled: false,
            seed,
        })
    }

    /// Register an effector and refresh the cached list
    pub fn add_effector(&mut self, effector: Effector) -> EffectorId {
        let id = self.effectors.insert(effector);
        self.effectors.refresh_effector_list();
        id
    }

    /// Remove an effector. Particles skip its stale id until the next refresh.
    pub fn remove_effector(&mut self, id: EffectorId) -> Option<Effector> {
        self.effectors.remove(id)
    }

    pub fn create_particle(
        &mut self,
        position: Vec2,
        color: [f32; 4],
        duration_ms: f32,
        initial_scale: Vec2,
        builder: &ParticleBuilder,
    ) -> Option<ParticleId> {
        self.particles
            .create_particle(position, color, duration_ms, initial_scale, builder)
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn set_paused(&self, paused: bool) {
        self.pause.set(paused);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;

    fn small_world() -> WarpWorld {
        WarpWorld::new(WorldConfig {
            grid: GridConfig {
                bounds: Bounds::new(Vec2::splat(-4.0), Vec2::splat(4.0)),
                creation_pulse: None,
                ..Default::default()
            },
            max_particles: 16,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_world_shares_pause_flag() {
        let world = small_world();
        assert!(world.grid.is_running());
        world.set_paused(true);
        assert!(world.is_paused());
        assert!(!world.grid.is_running());
        assert!(world.grid.pause_flag().is_paused());
    }

    #[test]
    fn test_zero_particles_rejected() {
        let err = WarpWorld::new(WorldConfig {
            max_particles: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::EmptyParticlePool);
    }

    #[test]
    fn test_add_refreshes_remove_does_not() {
        let mut world = small_world();
        let id = world.add_effector(Effector::repel(Vec2::ZERO, 1.0, 5.0));
        assert!(!world.effectors.is_stale());
        assert_eq!(world.effectors.cached().count(), 1);

        assert!(world.remove_effector(id).is_some());
        assert!(world.effectors.is_stale());
        assert_eq!(world.effectors.cached().count(), 0);
    }

    #[test]
    fn test_preset_sizes_world() {
        use crate::sim::DrawMethod;
        use crate::{QualityPreset, Settings};

        let mut settings = Settings::default();
        settings.apply_preset(QualityPreset::parse("low").unwrap());
        let world = WarpWorld::from_settings(&settings, 1).unwrap();
        assert_eq!(world.particles.capacity(), 100);
        assert_eq!(world.grid.draw_method(), DrawMethod::Quick);
        assert!(!world.grid.is_initialised());

        settings.apply_preset(QualityPreset::High);
        let world = WarpWorld::from_settings(&settings, 1).unwrap();
        assert_eq!(world.particles.capacity(), 2000);
        assert_eq!(world.grid.draw_method(), DrawMethod::Smooth);
    }

    #[test]
    fn test_same_seed_same_rng() {
        use rand::Rng;
        let mut a = small_world();
        let mut b = small_world();
        let x: u32 = a.rng.random();
        let y: u32 = b.rng.random();
        assert_eq!(x, y);
    }
}
