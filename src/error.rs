//! Error types for warpfield
//!
//! The simulation step itself never fails; these cover construction from
//! configuration and preference persistence.

use thiserror::Error;

/// Rejected grid or field configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Grid spacing must be positive and finite, got ({x}, {y})")]
    InvalidSpacing { x: f32, y: f32 },

    #[error("Grid bounds must be finite with non-negative size, got {width} x {height}")]
    InvalidBounds { width: f32, height: f32 },

    #[error("Grid of {columns} x {rows} points exceeds the lattice limit of {limit}")]
    LatticeTooLarge {
        columns: usize,
        rows: usize,
        limit: usize,
    },

    #[error("Line pool must hold at least one segment")]
    EmptyLinePool,

    #[error("Particle field capacity must be non-zero")]
    EmptyParticlePool,

    #[error("Line widths out of order: minor {min} exceeds major {max}")]
    InvalidLineWidth { min: f32, max: f32 },
}

/// Failure reading or writing persisted preferences
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
