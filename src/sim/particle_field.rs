//! Fixed-capacity particle pool
//!
//! Slots are acquired by a linear scan for the first free one, the way the
//! game's object pools did it. When every slot is busy the spawn is dropped.

use glam::Vec2;

use super::particle::{Particle, ParticleBuilder, ParticleEnv, ParticleEvent};
use super::pause::PauseFlag;
use crate::error::ConfigError;

/// Generational handle to a pooled particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    particle: Option<Particle>,
}

/// Pool of decorative particles
#[derive(Debug)]
pub struct ParticleField {
    slots: Vec<Slot>,
    pause: PauseFlag,
    events: Vec<ParticleEvent>,
}

impl ParticleField {
    pub fn with_capacity(capacity: usize, pause: PauseFlag) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::EmptyParticlePool);
        }
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                particle: None,
            })
            .collect();
        Ok(Self {
            slots,
            pause,
            events: Vec::new(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Spawn into the first free slot. `None` when the pool is exhausted.
    pub fn create_particle(
        &mut self,
        position: Vec2,
        color: [f32; 4],
        duration_ms: f32,
        initial_scale: Vec2,
        builder: &ParticleBuilder,
    ) -> Option<ParticleId> {
        let Some(index) = self.slots.iter().position(|s| s.particle.is_none()) else {
            log::debug!("Particle pool exhausted ({} slots)", self.slots.len());
            return None;
        };

        let slot = &mut self.slots[index];
        slot.particle = Some(Particle::spawn(position, color, duration_ms, initial_scale, builder));
        Some(ParticleId {
            index: index as u32,
            generation: slot.generation,
        })
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.particle.as_ref()
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.particle.as_mut()
    }

    /// Number of live particles
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.particle.is_some()).count()
    }

    /// True while any particle is still alive
    pub fn particles_remaining(&self) -> bool {
        self.slots.iter().any(|s| s.particle.is_some())
    }

    pub fn live_particles(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter_map(|s| s.particle.as_ref())
    }

    pub fn live_particles_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.slots.iter_mut().filter_map(|s| s.particle.as_mut())
    }

    /// Freeze every live particle in place
    pub fn pause_all(&mut self) {
        self.live_particles_mut().for_each(Particle::pause);
    }

    pub fn resume_all(&mut self) {
        self.live_particles_mut().for_each(Particle::resume);
    }

    pub fn set_collectable_all(&mut self, collectable: bool) {
        for particle in self.live_particles_mut() {
            particle.set_can_be_collected(collectable);
        }
    }

    pub fn set_ignore_effectors_all(&mut self, ignore: bool) {
        for particle in self.live_particles_mut() {
            particle.set_ignore_effectors(ignore);
        }
    }

    /// Update every particle, then age them and release the dead.
    /// Skipped entirely while paused.
    pub fn step(&mut self, env: &ParticleEnv<'_>, dt: f32) {
        if self.pause.is_paused() {
            return;
        }

        for slot in &mut self.slots {
            let Some(particle) = slot.particle.as_mut() else {
                continue;
            };
            if let Some(event) = particle.update(env, dt) {
                self.events.push(event);
            }
            particle.age(dt);
            if !particle.is_alive() {
                slot.particle = None;
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
    }

    /// Take the events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<ParticleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Release every particle
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.particle.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.events.clear();
    }
}
