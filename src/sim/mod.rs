//! Step-driven simulation module
//!
//! Everything here is engine-independent and single-threaded:
//! - One fixed step per rendered frame
//! - Seeded RNG only
//! - One shared pause flag, read at the top of every stepped operation
//! - No rendering beyond filling instance data

pub mod draw;
pub mod effector;
pub mod emitters;
pub mod grid;
pub mod particle;
pub mod particle_field;
pub mod pause;
pub mod point_mass;
pub mod projectile;
pub mod spring;
pub mod state;
pub mod tick;

pub use draw::{DrawMethod, Projection, catmull_rom};
pub use effector::{Effector, EffectorId, EffectorKind, EffectorRegistry};
pub use emitters::{
    BlackHoleEmitter, HomingProjectile, MovementForceEmitter, random_vector, spawn_burst,
};
pub use grid::{GridConfig, GridPhase, Pulse, WarpingGrid};
pub use particle::{Particle, ParticleBuilder, ParticleEnv, ParticleEvent, WrapAroundMode};
pub use particle_field::{ParticleField, ParticleId};
pub use pause::PauseFlag;
pub use point_mass::PointMass;
pub use projectile::{ProjectileSteering, projectile_wake};
pub use spring::{PointRef, PointSet, Spring};
pub use state::{WarpWorld, WorldConfig};
pub use tick::{FixedStep, TickInput, tick};
