//! Warpfield - warping background grid and particle field
//!
//! Core modules:
//! - `sim`: Step-driven simulation (mass-spring grid, effectors, particles)
//! - `renderer`: Render-ready instance data for grid lines and particles
//! - `settings`: Persisted preferences (grid toggle, quality preset)
//! - `error`: Construction and persistence errors

pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, SettingsError};
pub use settings::{GridStatus, QualityPreset, Settings};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep (one step per rendered frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Point mass damping restored after every integration
    pub const BASE_DAMPING: f32 = 0.98;
    /// Velocities shorter than this snap to zero
    pub const VELOCITY_EPSILON: f32 = 0.001;
    /// Upper bound on lattice points a grid may allocate
    pub const MAX_GRID_POINTS: usize = 1 << 20;
    /// Springs rest at this fraction of their initial length (pre-tensioned)
    pub const SPRING_REST_FACTOR: f32 = 0.95;
    /// Damping multiplier applied by implosive/explosive impulses
    pub const IMPULSE_DAMPING: f32 = 0.6;

    /// Border anchor springs
    pub const ANCHOR_STIFFNESS: f32 = 0.1;
    pub const ANCHOR_DAMPING: f32 = 0.1;
    /// Loose anchors on every third interior row/column
    pub const LOOSE_ANCHOR_STIFFNESS: f32 = 0.002;
    pub const LOOSE_ANCHOR_DAMPING: f32 = 0.02;
    pub const LOOSE_ANCHOR_STRIDE: usize = 3;
    /// Lattice springs between neighbours
    pub const STRUCTURAL_STIFFNESS: f32 = 0.28;
    pub const STRUCTURAL_DAMPING: f32 = 0.06;

    /// Width of the line sprite in world units (10 px at 5 px/unit)
    pub const LINE_SPRITE_WIDTH: f32 = 2.0;
    /// Depth used by the pseudo-perspective projection
    pub const PERSPECTIVE_DEPTH: f32 = 2000.0;

    /// Softening constant in the effector force law
    pub const EFFECTOR_SOFTENING: f32 = 10000.0;
    /// Tangential strength of black hole swirl
    pub const EFFECTOR_SWIRL: f32 = 45.0;
    pub const EFFECTOR_SWIRL_OFFSET: f32 = 100.0;

    /// Particle velocities are in legacy units; positions advance by v * dt * this
    pub const PARTICLE_DISTANCE_SCALE: f32 = 50.0;
    /// Normalisation constant for particle alpha and length
    pub const NORMAL_SCALE: f32 = 2.0;
    pub const DEFAULT_VELOCITY_DAMP: f32 = 0.94;
    pub const DEFAULT_VELOCITY_THRESHOLD: f32 = 0.000_000_001;
    pub const DEFAULT_ALPHA_THRESHOLD: f32 = 0.000_005;
    /// Seconds after spawn before effectors bend a particle
    pub const EFFECTOR_GRACE_SECS: f32 = 0.25;
    /// Seconds after spawn before a particle can be collected
    pub const COLLECT_GRACE_SECS: f32 = 0.1;
    pub const COLLECT_RADIUS: f32 = 0.5;
    /// Shortest particle lifetime in milliseconds; shorter requests are raised to it
    pub const MIN_PARTICLE_DURATION_MS: f32 = 1.0;
}

/// Axis-aligned rectangle in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle of the given size centred on `center`
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Heading angle of a vector in radians (0 for the zero vector)
#[inline]
pub fn heading_angle(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
