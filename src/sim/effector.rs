//! Effectors - typed force sources that bend particles and projectiles
//!
//! Effectors live in an [`EffectorRegistry`] addressed by generational
//! [`EffectorId`]s. Particles read a cached id list that is only rebuilt by
//! [`EffectorRegistry::refresh_effector_list`], so removals between refreshes
//! leave stale ids that every consumer skips.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{EFFECTOR_SOFTENING, EFFECTOR_SWIRL, EFFECTOR_SWIRL_OFFSET};

/// Projectile force multipliers per effector kind
const PROJECTILE_REPEL_SCALE: f32 = 8.0;
const PROJECTILE_BLACK_HOLE_SCALE: f32 = 2.0;

/// Which force law an effector applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectorKind {
    /// Pulls towards the effector
    Attraction,
    /// Pushes away from the effector
    Repel,
    /// Pulls in and, close up, swirls clockwise
    BlackHole,
}

/// A force source in the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effector {
    pub kind: EffectorKind,
    pub position: Vec2,
    pub force: f32,
    /// Range of influence
    pub distance: f32,
    /// Black holes add swirl inside this radius
    pub rotate_distance: f32,
    /// Whether projectiles are steered too, not just decorative particles
    pub affects_projectiles: bool,
    pub enabled: bool,
}

impl Effector {
    pub fn new(kind: EffectorKind, position: Vec2, force: f32, distance: f32) -> Self {
        Self {
            kind,
            position,
            force,
            distance,
            rotate_distance: 0.0,
            affects_projectiles: false,
            enabled: true,
        }
    }

    pub fn attraction(position: Vec2, force: f32, distance: f32) -> Self {
        Self::new(EffectorKind::Attraction, position, force, distance)
    }

    pub fn repel(position: Vec2, force: f32, distance: f32) -> Self {
        Self::new(EffectorKind::Repel, position, force, distance)
    }

    pub fn black_hole(position: Vec2, force: f32, distance: f32, rotate_distance: f32) -> Self {
        Self {
            rotate_distance,
            ..Self::new(EffectorKind::BlackHole, position, force, distance)
        }
    }

    /// Builder-style toggle for projectile steering
    pub fn with_projectiles(mut self, affects: bool) -> Self {
        self.affects_projectiles = affects;
        self
    }

    /// Enabled with a non-zero force
    #[inline]
    pub fn is_active(&self) -> bool {
        self.enabled && self.force != 0.0
    }

    #[inline]
    pub fn in_range(&self, at: Vec2) -> bool {
        (self.position - at).length_squared() <= self.distance * self.distance
    }

    /// Returns true for kinds that override attraction scene-wide
    #[inline]
    pub fn dominates_attraction(&self) -> bool {
        matches!(self.kind, EffectorKind::Repel | EffectorKind::BlackHole)
    }

    /// Velocity change this effector imparts on a particle at `at`
    pub fn particle_velocity_delta(&self, at: Vec2) -> Vec2 {
        self.field(at, 1.0, 1.0, 1.0)
    }

    /// Unscaled steering force on a projectile at `at`
    pub fn projectile_force(&self, at: Vec2) -> Vec2 {
        self.field(at, 1.0, PROJECTILE_REPEL_SCALE, PROJECTILE_BLACK_HOLE_SCALE)
    }

    fn field(&self, at: Vec2, attract_scale: f32, repel_scale: f32, hole_scale: f32) -> Vec2 {
        let heading = self.position - at;
        if heading.length_squared() > self.distance * self.distance {
            return Vec2::ZERO;
        }

        let distance = heading.length();
        let n = heading.normalize_or_zero();
        let radial = EFFECTOR_SOFTENING * n / (distance * distance + EFFECTOR_SOFTENING);

        match self.kind {
            EffectorKind::Attraction => radial * self.force * attract_scale,
            EffectorKind::Repel => -radial * self.force * repel_scale,
            EffectorKind::BlackHole => {
                let mut delta = radial * self.force * hole_scale;
                if distance < self.rotate_distance {
                    let tangent = Vec2::new(n.y, -n.x);
                    let falloff = distance + EFFECTOR_SWIRL_OFFSET;
                    delta += EFFECTOR_SWIRL * tangent / falloff * self.force;
                }
                delta
            }
        }
    }
}

/// Generational handle into an [`EffectorRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectorId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    effector: Option<Effector>,
}

/// Every effector in the scene plus the cached list particles iterate
#[derive(Debug, Clone, Default)]
pub struct EffectorRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    cached: Vec<EffectorId>,
    stale: bool,
}

impl EffectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effector. Particles will not see it until the next refresh.
    pub fn insert(&mut self, effector: Effector) -> EffectorId {
        self.stale = true;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.effector = Some(effector);
                EffectorId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    effector: Some(effector),
                });
                EffectorId { index, generation: 0 }
            }
        }
    }

    /// Remove an effector, invalidating its id. The cached list keeps the
    /// stale id until the next refresh.
    pub fn remove(&mut self, id: EffectorId) -> Option<Effector> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let effector = slot.effector.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.stale = true;
        Some(effector)
    }

    pub fn get(&self, id: EffectorId) -> Option<&Effector> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.effector.as_ref()
    }

    pub fn get_mut(&mut self, id: EffectorId) -> Option<&mut Effector> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.effector.as_mut()
    }

    pub fn contains(&self, id: EffectorId) -> bool {
        self.get(id).is_some()
    }

    /// Suspend or restore an effector without removing it. Returns false for
    /// a stale id.
    pub fn set_enabled(&mut self, id: EffectorId, enabled: bool) -> bool {
        match self.get_mut(id) {
            Some(effector) => {
                effector.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Number of live effectors
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.effector.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live effectors in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EffectorId, &Effector)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.effector.as_ref().map(|e| {
                (
                    EffectorId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    e,
                )
            })
        })
    }

    /// Rebuild the cached list particles read each step
    pub fn refresh_effector_list(&mut self) {
        self.cached = self.iter().map(|(id, _)| id).collect();
        self.stale = false;
        log::debug!("Effector list refreshed: {} effectors", self.cached.len());
    }

    /// True when effectors were added or removed since the last refresh
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Active effectors from the cached list; removed or inactive ones are skipped
    pub fn cached(&self) -> impl Iterator<Item = &Effector> {
        self.cached
            .iter()
            .filter_map(|&id| self.get(id))
            .filter(|e| e.is_active())
    }

    /// Any active repel or black hole anywhere in the cached list disables
    /// every attraction effector
    pub fn attraction_suppressed(&self) -> bool {
        self.cached().any(Effector::dominates_attraction)
    }

    /// Summed velocity change for a decorative particle at `at`
    pub fn particle_velocity_delta(&self, at: Vec2) -> Vec2 {
        let ignore_attraction = self.attraction_suppressed();
        self.cached()
            .filter(|e| !(ignore_attraction && e.kind == EffectorKind::Attraction))
            .map(|e| e.particle_velocity_delta(at))
            .sum()
    }

    /// Fresh scan of live effectors that steer projectiles
    pub fn projectile_snapshot(&self) -> Vec<EffectorId> {
        self.iter()
            .filter(|(_, e)| e.affects_projectiles)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn refreshed(effectors: &[Effector]) -> (EffectorRegistry, Vec<EffectorId>) {
        let mut registry = EffectorRegistry::new();
        let ids = effectors.iter().map(|e| registry.insert(*e)).collect();
        registry.refresh_effector_list();
        (registry, ids)
    }

    #[test]
    fn test_attraction_law() {
        let e = Effector::attraction(Vec2::new(100.0, 0.0), 2.0, 500.0);
        let delta = e.particle_velocity_delta(Vec2::ZERO);
        // K / (d^2 + K) = 10000 / 20000
        assert!((delta.x - 1.0).abs() < 1e-6);
        assert_eq!(delta.y, 0.0);

        let r = Effector::repel(Vec2::new(100.0, 0.0), 2.0, 500.0);
        assert_eq!(r.particle_velocity_delta(Vec2::ZERO), -delta);
    }

    #[test]
    fn test_out_of_range_is_zero() {
        let e = Effector::attraction(Vec2::new(10.0, 0.0), 5.0, 9.0);
        assert_eq!(e.particle_velocity_delta(Vec2::ZERO), Vec2::ZERO);
        assert!(!e.in_range(Vec2::ZERO));
        assert!(e.in_range(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_coincident_effector_is_finite() {
        let e = Effector::black_hole(Vec2::ZERO, 3.0, 10.0, 5.0);
        let delta = e.particle_velocity_delta(Vec2::ZERO);
        assert_eq!(delta, Vec2::ZERO);
    }

    #[test]
    fn test_black_hole_swirl_only_inside_rotate_distance() {
        let hole = Effector::black_hole(Vec2::ZERO, 1.0, 50.0, 5.0);

        // Outside the swirl radius the pull is purely radial
        let far = hole.particle_velocity_delta(Vec2::new(10.0, 0.0));
        assert!(far.x < 0.0);
        assert!(far.y.abs() < 1e-6);

        // Inside, n = (-1, 0) so swirl = 45 * (0, 1) / 102
        let near = hole.particle_velocity_delta(Vec2::new(2.0, 0.0));
        assert!((near.y - 45.0 / 102.0).abs() < 1e-5);
        assert!(near.x < 0.0);
    }

    #[test]
    fn test_repel_dominates_attraction() {
        let at = Vec2::ZERO;
        let attract = Effector::attraction(Vec2::new(3.0, 0.0), 5.0, 10.0);
        let repel = Effector::repel(Vec2::new(0.0, 4.0), 3.0, 10.0);
        let (registry, _) = refreshed(&[attract, repel]);

        assert!(registry.attraction_suppressed());
        assert_eq!(registry.particle_velocity_delta(at), repel.particle_velocity_delta(at));
    }

    #[test]
    fn test_dominance_is_scene_wide() {
        // The black hole is far out of range but still suppresses attraction
        let attract = Effector::attraction(Vec2::new(3.0, 0.0), 5.0, 10.0);
        let hole = Effector::black_hole(Vec2::new(1000.0, 1000.0), 1.0, 5.0, 2.0);
        let (registry, _) = refreshed(&[attract, hole]);
        assert_eq!(registry.particle_velocity_delta(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_inactive_effectors_do_not_dominate() {
        let attract = Effector::attraction(Vec2::new(3.0, 0.0), 5.0, 10.0);
        let silent = Effector::repel(Vec2::new(0.0, 4.0), 0.0, 10.0);
        let (mut registry, ids) = refreshed(&[attract, silent]);
        assert!(!registry.attraction_suppressed());
        assert_eq!(
            registry.particle_velocity_delta(Vec2::ZERO),
            attract.particle_velocity_delta(Vec2::ZERO)
        );

        // Suspending the attraction leaves nothing
        assert!(registry.set_enabled(ids[0], false));
        assert_eq!(registry.particle_velocity_delta(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_cache_needs_refresh() {
        let mut registry = EffectorRegistry::new();
        let id = registry.insert(Effector::attraction(Vec2::X, 1.0, 10.0));
        assert!(registry.is_stale());
        assert_eq!(registry.cached().count(), 0);

        registry.refresh_effector_list();
        assert!(!registry.is_stale());
        assert_eq!(registry.cached().count(), 1);

        // Removal leaves a stale id in the cache that is skipped
        registry.remove(id);
        assert!(registry.is_stale());
        assert_eq!(registry.cached().count(), 0);
        assert_eq!(registry.particle_velocity_delta(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_stale_id_does_not_alias_reused_slot() {
        let mut registry = EffectorRegistry::new();
        let old = registry.insert(Effector::attraction(Vec2::X, 1.0, 10.0));
        registry.remove(old);
        let new = registry.insert(Effector::repel(Vec2::Y, 2.0, 10.0));

        assert_ne!(old, new);
        assert!(registry.get(old).is_none());
        assert!(registry.remove(old).is_none());
        assert_eq!(registry.get(new).map(|e| e.kind), Some(EffectorKind::Repel));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_projectile_snapshot_and_multipliers() {
        let repel = Effector::repel(Vec2::new(100.0, 0.0), 1.0, 500.0).with_projectiles(true);
        let attract = Effector::attraction(Vec2::new(0.0, 100.0), 1.0, 500.0);
        let (registry, ids) = refreshed(&[repel, attract]);
        assert_eq!(registry.projectile_snapshot(), vec![ids[0]]);

        let particle = repel.particle_velocity_delta(Vec2::ZERO);
        let projectile = repel.projectile_force(Vec2::ZERO);
        assert!((projectile.x - particle.x * 8.0).abs() < 1e-5);
    }

    fn any_effector() -> impl Strategy<Value = Effector> {
        let kind = prop_oneof![
            Just(EffectorKind::Attraction),
            Just(EffectorKind::Repel),
            Just(EffectorKind::BlackHole),
        ];
        let force = prop_oneof![Just(0.0f32), -5.0f32..5.0];
        (kind, -20.0f32..20.0, -20.0f32..20.0, force, 1.0f32..40.0, any::<bool>()).prop_map(
            |(kind, x, y, force, distance, enabled)| Effector {
                rotate_distance: distance * 0.5,
                enabled,
                ..Effector::new(kind, Vec2::new(x, y), force, distance)
            },
        )
    }

    proptest! {
        #[test]
        fn active_repel_or_hole_silences_every_attraction(
            effectors in prop::collection::vec(any_effector(), 0..8),
            x in -20.0f32..20.0,
            y in -20.0f32..20.0,
        ) {
            let at = Vec2::new(x, y);
            let (registry, _) = refreshed(&effectors);
            let dominated = effectors.iter().any(|e| e.is_active() && e.dominates_attraction());
            prop_assert_eq!(registry.attraction_suppressed(), dominated);

            if dominated {
                let others: Vec<Effector> = effectors
                    .iter()
                    .copied()
                    .filter(|e| e.kind != EffectorKind::Attraction)
                    .collect();
                let (without_attraction, _) = refreshed(&others);
                prop_assert_eq!(
                    registry.particle_velocity_delta(at),
                    without_attraction.particle_velocity_delta(at)
                );
            }
        }
    }
}
