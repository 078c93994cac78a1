//! Grid drawing strategies
//!
//! Both strategies walk the lattice from (1, 1), skipping the outermost
//! anchored row and column, and push line segments into a [`LinePool`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::point_mass::PointMass;
use crate::consts::PERSPECTIVE_DEPTH;
use crate::renderer::{LinePool, LineSegment};

/// How the lattice is turned into line segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawMethod {
    /// Straight segments between neighbours plus cross braces. Cheap.
    #[default]
    Quick,
    /// Catmull-Rom midpoints where the mesh bends noticeably
    Smooth,
}

/// Pseudo-perspective transform around the screen centre.
///
/// Grid points carry an implicit z of 0, for which this is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub screen_size: Vec2,
    pub depth: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            screen_size: Vec2::ZERO,
            depth: PERSPECTIVE_DEPTH,
        }
    }
}

impl Projection {
    pub fn project(&self, position: Vec2, z: f32) -> Vec2 {
        let factor = (z + self.depth) / self.depth;
        let half = self.screen_size / 2.0;
        (position - half) * factor + half
    }
}

/// Line styling shared by both strategies
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineStyle {
    pub minor_width: f32,
    pub major_width: f32,
    pub color: [f32; 4],
    pub smooth_threshold: f32,
    pub projection: Projection,
}

/// Catmull-Rom spline through p1..p2 evaluated at `t`
pub fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

/// Read-only view of the lattice in row-major order
pub(crate) struct Lattice<'a> {
    pub points: &'a [PointMass],
    pub columns: usize,
    pub rows: usize,
    pub projection: Projection,
}

impl Lattice<'_> {
    #[inline]
    fn at(&self, column: usize, row: usize) -> Vec2 {
        self.projection.project(self.points[row * self.columns + column].position, 0.0)
    }
}

/// Thickness for the every-third major lines
#[inline]
fn thickness(index: usize, style: &LineStyle) -> f32 {
    if index % 3 == 1 { style.major_width } else { style.minor_width }
}

/// Straight lines plus two half-cell braces per interior cell
pub(crate) fn quick_draw(lattice: &Lattice<'_>, style: &LineStyle, pool: &mut LinePool) {
    for y in 1..lattice.rows {
        for x in 1..lattice.columns {
            let p = lattice.at(x, y);
            let mut left = Vec2::ZERO;
            let mut up = Vec2::ZERO;

            if x > 1 {
                left = lattice.at(x - 1, y);
                pool.push(LineSegment::between(left, p, thickness(y, style), style.color));
            }
            if y > 1 {
                up = lattice.at(x, y - 1);
                pool.push(LineSegment::between(up, p, thickness(x, style), style.color));
            }
            if x > 1 && y > 1 {
                push_braces(lattice, x, y, left, up, p, style, pool);
            }
        }
    }
}

/// Like `quick_draw`, but bends segments through a spline midpoint
pub(crate) fn smooth_draw(lattice: &Lattice<'_>, style: &LineStyle, pool: &mut LinePool) {
    for y in 1..lattice.rows {
        for x in 1..lattice.columns {
            let p = lattice.at(x, y);
            let mut left = Vec2::ZERO;
            let mut up = Vec2::ZERO;

            if x > 1 {
                left = lattice.at(x - 1, y);
                let far = lattice.at(x - 2, y);
                let next = lattice.at((x + 1).min(lattice.columns - 1), y);
                push_curve(far, left, p, next, thickness(y, style), style, pool);
            }
            if y > 1 {
                up = lattice.at(x, y - 1);
                let far = lattice.at(x, y - 2);
                let next = lattice.at(x, (y + 1).min(lattice.rows - 1));
                push_curve(far, up, p, next, thickness(x, style), style, pool);
            }
            if x > 1 && y > 1 {
                push_braces(lattice, x, y, left, up, p, style, pool);
            }
        }
    }
}

fn push_curve(
    p0: Vec2,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
    width: f32,
    style: &LineStyle,
    pool: &mut LinePool,
) {
    let mid = catmull_rom(p0, p1, p2, p3, 0.5);
    if mid.distance_squared((p1 + p2) / 2.0) > style.smooth_threshold {
        pool.push(LineSegment::between(p1, mid, width, style.color));
        pool.push(LineSegment::between(mid, p2, width, style.color));
    } else {
        pool.push(LineSegment::between(p1, p2, width, style.color));
    }
}

#[allow(clippy::too_many_arguments)]
fn push_braces(
    lattice: &Lattice<'_>,
    x: usize,
    y: usize,
    left: Vec2,
    up: Vec2,
    p: Vec2,
    style: &LineStyle,
    pool: &mut LinePool,
) {
    let up_left = lattice.at(x - 1, y - 1);
    let (width, color) = (style.minor_width, style.color);
    // vertical
    pool.push(LineSegment::between(0.5 * (up_left + up), 0.5 * (left + p), width, color));
    // horizontal
    pool.push(LineSegment::between(0.5 * (up_left + left), 0.5 * (up + p), width, color));
}

/// Segments `quick_draw` emits for a lattice of this size
pub fn quick_line_count(columns: usize, rows: usize) -> usize {
    if columns < 2 || rows < 2 {
        return 0;
    }
    let horizontal = columns.saturating_sub(2) * (rows - 1);
    let vertical = rows.saturating_sub(2) * (columns - 1);
    let braces = 2 * columns.saturating_sub(2) * rows.saturating_sub(2);
    horizontal + vertical + braces
}
