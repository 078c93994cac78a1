//! Springs connecting grid points
//!
//! Springs refer to their endpoints by index into a [`PointSet`], which owns
//! both the movable lattice and the immovable anchors.

use glam::Vec2;

use super::point_mass::PointMass;
use crate::consts::SPRING_REST_FACTOR;

/// Index of a spring endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointRef {
    /// Movable lattice point
    Mass(usize),
    /// Immovable anchor twin
    Anchor(usize),
}

/// Storage for everything a spring can attach to
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    pub masses: Vec<PointMass>,
    pub anchors: Vec<PointMass>,
}

impl PointSet {
    #[inline]
    pub fn get(&self, r: PointRef) -> &PointMass {
        match r {
            PointRef::Mass(i) => &self.masses[i],
            PointRef::Anchor(i) => &self.anchors[i],
        }
    }

    #[inline]
    pub fn get_mut(&mut self, r: PointRef) -> &mut PointMass {
        match r {
            PointRef::Mass(i) => &mut self.masses[i],
            PointRef::Anchor(i) => &mut self.anchors[i],
        }
    }

    pub fn clear(&mut self) {
        self.masses.clear();
        self.anchors.clear();
    }
}

/// One-sided spring: pulls its ends together, never pushes them apart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub end1: PointRef,
    pub end2: PointRef,
    /// Rest length, fixed at construction
    pub target_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl Spring {
    /// Rest length is taken from the current endpoint distance, pre-tensioned
    pub fn new(
        points: &PointSet,
        end1: PointRef,
        end2: PointRef,
        stiffness: f32,
        damping: f32,
    ) -> Self {
        let rest = points.get(end1).position.distance(points.get(end2).position);
        let target_length = rest * SPRING_REST_FACTOR;
        Self {
            end1,
            end2,
            target_length,
            stiffness,
            damping,
        }
    }

    /// Current distance between the endpoints
    pub fn length(&self, points: &PointSet) -> f32 {
        points.get(self.end1).position.distance(points.get(self.end2).position)
    }

    /// Accumulate the corrective force on both endpoints
    pub fn update(&self, points: &mut PointSet) {
        let (p1, v1) = {
            let p = points.get(self.end1);
            (p.position, p.velocity)
        };
        let (p2, v2) = {
            let p = points.get(self.end2);
            (p.position, p.velocity)
        };

        // Settled springs do nothing
        if v1 == Vec2::ZERO && v2 == Vec2::ZERO {
            return;
        }

        let x = p1 - p2;
        let length = x.length();
        if length <= self.target_length {
            return;
        }

        let x = (x / length) * (length - self.target_length);
        let dv = v2 - v1;
        let force = self.stiffness * x - dv * self.damping;

        points.get_mut(self.end1).apply_force(-force);
        points.get_mut(self.end2).apply_force(force);
    }
}
