//! Render-ready instance data
//!
//! The simulation fills plain `Pod` instance arrays; the host uploads them
//! into instance buffers described by each type's `desc()`.

pub mod line;
pub mod sprite;

pub use line::{LinePool, LineSegment};
pub use sprite::{ParticleSprite, colors, particle_sprites};
