//! Warping background grid
//!
//! A lattice of point masses tied together by one-sided springs, pinned at the
//! border and loosely at every third interior point. Gameplay pushes impulses
//! into it; `update` relaxes the mesh and redraws it into a bounded
//! [`LinePool`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::draw::{self, DrawMethod, Lattice, LineStyle, Projection};
use super::pause::PauseFlag;
use super::point_mass::PointMass;
use super::spring::{PointRef, PointSet, Spring};
use crate::Bounds;
use crate::consts::*;
use crate::error::ConfigError;
use crate::renderer::LinePool;

/// An implosive impulse, used to settle a freshly built mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub force: f32,
    pub position: Vec2,
    pub radius: f32,
}

impl Default for Pulse {
    fn default() -> Self {
        Self {
            force: 0.2,
            position: Vec2::ZERO,
            radius: 5.0,
        }
    }
}

/// Grid construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Area covered by the lattice; keep it as small as the screen allows
    pub bounds: Bounds,
    pub spacing: Vec2,
    /// Thickness of inner lines and cross braces
    pub min_line_width: f32,
    /// Thickness of every third row and column
    pub max_line_width: f32,
    /// Line pool size. Too small and the grid is drawn incomplete.
    pub max_lines: usize,
    pub color: [f32; 4],
    pub draw_method: DrawMethod,
    /// Squared spline deviation above which smooth drawing splits a segment
    pub smooth_threshold: f32,
    /// Centre of the pseudo-perspective projection is half of this
    pub screen_size: Vec2,
    pub creation_pulse: Option<Pulse>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::from_center_size(Vec2::ZERO, Vec2::new(24.0, 14.0)),
            spacing: Vec2::ONE,
            min_line_width: 0.01,
            max_line_width: 0.03,
            max_lines: 1520,
            color: crate::renderer::colors::GRID,
            draw_method: DrawMethod::Quick,
            smooth_threshold: 1.0,
            screen_size: Vec2::ZERO,
            creation_pulse: Some(Pulse::default()),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.spacing.x > 0.0 && self.spacing.y > 0.0) || !self.spacing.is_finite() {
            return Err(ConfigError::InvalidSpacing {
                x: self.spacing.x,
                y: self.spacing.y,
            });
        }
        let (width, height) = (self.bounds.width(), self.bounds.height());
        let finite = self.bounds.min.is_finite() && self.bounds.max.is_finite();
        if !(finite && width >= 0.0 && height >= 0.0) {
            return Err(ConfigError::InvalidBounds { width, height });
        }
        let (columns, rows) = self.dimensions();
        if columns.checked_mul(rows).is_none_or(|n| n > MAX_GRID_POINTS) {
            return Err(ConfigError::LatticeTooLarge {
                columns,
                rows,
                limit: MAX_GRID_POINTS,
            });
        }
        if self.max_lines == 0 {
            return Err(ConfigError::EmptyLinePool);
        }
        if self.min_line_width > self.max_line_width {
            return Err(ConfigError::InvalidLineWidth {
                min: self.min_line_width,
                max: self.max_line_width,
            });
        }
        Ok(())
    }

    /// Columns and rows the lattice will have. Saturates for extents that
    /// `validate` rejects.
    pub fn dimensions(&self) -> (usize, usize) {
        // Absorb float error so 10 / 0.1 still counts 100 steps
        let steps = |extent: f32, spacing: f32| (extent / spacing + 1e-4).floor() as usize;
        let columns = steps(self.bounds.width(), self.spacing.x).saturating_add(1);
        let rows = steps(self.bounds.height(), self.spacing.y).saturating_add(1);
        (columns, rows)
    }

    fn line_style(&self) -> LineStyle {
        LineStyle {
            minor_width: self.min_line_width,
            major_width: self.max_line_width,
            color: self.color,
            smooth_threshold: self.smooth_threshold,
            projection: Projection {
                screen_size: self.screen_size,
                depth: PERSPECTIVE_DEPTH,
            },
        }
    }
}

/// Grid lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridPhase {
    #[default]
    Uninitialized,
    Active,
}

/// The warping grid
#[derive(Debug)]
pub struct WarpingGrid {
    config: GridConfig,
    phase: GridPhase,
    pause: PauseFlag,
    points: PointSet,
    springs: Vec<Spring>,
    lines: LinePool,
    columns: usize,
    rows: usize,
}

impl WarpingGrid {
    /// Validate the configuration. The lattice is not built until
    /// [`create_grid`](Self::create_grid).
    pub fn new(config: GridConfig, pause: PauseFlag) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: GridPhase::Uninitialized,
            pause,
            points: PointSet::default(),
            springs: Vec::new(),
            lines: LinePool::default(),
            columns: 0,
            rows: 0,
        })
    }

    /// Build the lattice, its springs and the line pool. Replaces any
    /// existing grid.
    pub fn create_grid(&mut self) {
        let (columns, rows) = self.config.dimensions();
        let origin = self.config.bounds.min;
        let spacing = self.config.spacing;

        self.points.clear();
        self.points.masses.reserve(columns * rows);
        self.points.anchors.reserve(columns * rows);
        for row in 0..rows {
            for column in 0..columns {
                let position = origin + Vec2::new(column as f32, row as f32) * spacing;
                self.points.masses.push(PointMass::new(position, 1.0));
                self.points.anchors.push(PointMass::anchor(position));
            }
        }

        let mut springs = Vec::with_capacity(columns * rows * 3);
        for row in 0..rows {
            for column in 0..columns {
                let index = row * columns + column;
                let here = PointRef::Mass(index);
                let border = column == 0 || row == 0 || column == columns - 1 || row == rows - 1;

                if border {
                    springs.push(Spring::new(
                        &self.points,
                        PointRef::Anchor(index),
                        here,
                        ANCHOR_STIFFNESS,
                        ANCHOR_DAMPING,
                    ));
                } else if column % LOOSE_ANCHOR_STRIDE == 0 && row % LOOSE_ANCHOR_STRIDE == 0 {
                    springs.push(Spring::new(
                        &self.points,
                        PointRef::Anchor(index),
                        here,
                        LOOSE_ANCHOR_STIFFNESS,
                        LOOSE_ANCHOR_DAMPING,
                    ));
                }

                if column > 0 {
                    springs.push(Spring::new(
                        &self.points,
                        PointRef::Mass(index - 1),
                        here,
                        STRUCTURAL_STIFFNESS,
                        STRUCTURAL_DAMPING,
                    ));
                }
                if row > 0 {
                    springs.push(Spring::new(
                        &self.points,
                        PointRef::Mass(index - columns),
                        here,
                        STRUCTURAL_STIFFNESS,
                        STRUCTURAL_DAMPING,
                    ));
                }
            }
        }

        self.springs = springs;
        self.columns = columns;
        self.rows = rows;
        self.lines = LinePool::with_capacity(self.config.max_lines);
        self.phase = GridPhase::Active;

        log::info!(
            "Grid created: {}x{} points, {} springs, {} line slots",
            columns,
            rows,
            self.springs.len(),
            self.config.max_lines
        );
        let required = self.required_lines();
        if required > self.config.max_lines {
            log::warn!(
                "Line pool holds {} of {} segments; grid will be drawn incomplete",
                self.config.max_lines,
                required
            );
        }

        if let Some(pulse) = self.config.creation_pulse {
            self.apply_implosive_force(pulse.force, pulse.position, pulse.radius);
        }
    }

    /// Release the lattice and line pool
    pub fn disable_grid(&mut self) {
        if self.phase == GridPhase::Active {
            log::info!("Grid disabled");
        }
        self.lines.release();
        self.points.clear();
        self.springs.clear();
        self.columns = 0;
        self.rows = 0;
        self.phase = GridPhase::Uninitialized;
    }

    /// Active and not paused
    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == GridPhase::Active && !self.pause.is_paused()
    }

    #[inline]
    pub fn is_initialised(&self) -> bool {
        self.phase == GridPhase::Active
    }

    pub fn phase(&self) -> GridPhase {
        self.phase
    }

    /// Push points near `position` along `force`, falling off with distance
    pub fn apply_directed_force(&mut self, force: Vec2, position: Vec2, radius: f32) {
        if !self.is_running() {
            return;
        }
        for mass in &mut self.points.masses {
            let distance = position.distance(mass.position);
            if distance < radius {
                mass.apply_force(10.0 * force / (10.0 + distance));
            }
        }
    }

    /// Pull points near `position` towards it
    pub fn apply_implosive_force(&mut self, force: f32, position: Vec2, radius: f32) {
        if !self.is_running() {
            return;
        }
        for mass in &mut self.points.masses {
            let distance_sq = position.distance_squared(mass.position);
            if distance_sq < radius * radius {
                mass.apply_force(10.0 * force * (position - mass.position) / (100.0 + distance_sq));
                mass.increase_damping(IMPULSE_DAMPING);
            }
        }
    }

    /// Push points near `position` away from it
    pub fn apply_explosive_force(&mut self, force: f32, position: Vec2, radius: f32) {
        if !self.is_running() {
            return;
        }
        for mass in &mut self.points.masses {
            let distance_sq = position.distance_squared(mass.position);
            if distance_sq < radius * radius {
                let push = (mass.position - position) / (10000.0 + distance_sq);
                mass.apply_force(100.0 * force * push);
                mass.increase_damping(IMPULSE_DAMPING);
            }
        }
    }

    /// One simulation step: springs, then points, then redraw
    pub fn update(&mut self) {
        if !self.is_running() {
            return;
        }

        for spring in &self.springs {
            spring.update(&mut self.points);
        }
        for mass in &mut self.points.masses {
            mass.integrate();
        }

        self.redraw();
    }

    fn redraw(&mut self) {
        let style = self.config.line_style();
        let lattice = Lattice {
            points: &self.points.masses,
            columns: self.columns,
            rows: self.rows,
            projection: style.projection,
        };

        self.lines.begin_frame();
        match self.config.draw_method {
            DrawMethod::Quick => draw::quick_draw(&lattice, &style, &mut self.lines),
            DrawMethod::Smooth => draw::smooth_draw(&lattice, &style, &mut self.lines),
        }
    }

    /// Switch drawing strategy; takes effect on the next update
    pub fn set_draw_method(&mut self, method: DrawMethod) {
        self.config.draw_method = method;
    }

    pub fn draw_method(&self) -> DrawMethod {
        self.config.draw_method
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn pause_flag(&self) -> &PauseFlag {
        &self.pause
    }

    /// (columns, rows), zero while uninitialised
    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Movable point at a lattice coordinate
    pub fn point(&self, column: usize, row: usize) -> Option<&PointMass> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.points.masses.get(row * self.columns + column)
    }

    /// Movable points in row-major order
    pub fn points(&self) -> &[PointMass] {
        &self.points.masses
    }

    pub fn anchors(&self) -> &[PointMass] {
        &self.points.anchors
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    /// Line pool as of the last redraw
    pub fn lines(&self) -> &LinePool {
        &self.lines
    }

    /// Segments a quick draw of the current lattice needs. Smooth drawing
    /// may need up to twice as many straight segments.
    pub fn required_lines(&self) -> usize {
        draw::quick_line_count(self.columns, self.rows)
    }
}
