//! Decorative particles
//!
//! A particle is spawned from a [`ParticleBuilder`] and then moves on its
//! own: effectors bend its velocity, damping slows it, and its alpha and
//! length follow from its speed and remaining life.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effector::EffectorRegistry;
use crate::consts::*;
use crate::{Bounds, heading_angle};

/// What happens when a particle leaves the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapAroundMode {
    /// Die offscreen
    #[default]
    None,
    /// Bounce back in
    Constrain,
    /// Reappear at the opposite edge
    WrapAround,
}

/// Spawn parameters shared by every particle of an effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleBuilder {
    pub velocity: Vec2,
    pub wrap_around: WrapAroundMode,
    pub length_multiplier: f32,
    /// Per-step velocity multiplier while moving
    pub velocity_damp_modifier: f32,
    pub remove_when_alpha_reaches_threshold: bool,
    pub remove_when_velocity_reaches_threshold: bool,
    pub can_be_collected_by_player: bool,
    pub ignore_effectors: bool,
    /// Apply effectors from the first step instead of after the grace period
    pub skip_effector_grace: bool,
    pub custom_alpha_threshold: Option<f32>,
    pub custom_velocity_threshold: Option<f32>,
    pub min_length_clamp: Option<f32>,
    pub max_length_clamp: Option<f32>,
    /// Derive alpha from speed and life each step
    pub update_alpha: bool,
    /// Derive length from speed each step
    pub update_scale: bool,
}

impl Default for ParticleBuilder {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            wrap_around: WrapAroundMode::None,
            length_multiplier: 1.0,
            velocity_damp_modifier: DEFAULT_VELOCITY_DAMP,
            remove_when_alpha_reaches_threshold: false,
            remove_when_velocity_reaches_threshold: false,
            can_be_collected_by_player: false,
            ignore_effectors: false,
            skip_effector_grace: false,
            custom_alpha_threshold: None,
            custom_velocity_threshold: None,
            min_length_clamp: None,
            max_length_clamp: None,
            update_alpha: true,
            update_scale: true,
        }
    }
}

/// What a particle sees of the world during its step
#[derive(Debug, Clone, Copy)]
pub struct ParticleEnv<'a> {
    pub effectors: &'a EffectorRegistry,
    /// Collectible particles near this point are picked up
    pub collector: Option<Vec2>,
    /// Visible area for wrap-around handling; `None` skips it
    pub viewport: Option<Bounds>,
}

/// Something a particle reports back to gameplay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleEvent {
    Collected { position: Vec2 },
}

/// A live particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    /// Heading of the velocity, radians
    pub rotation: f32,
    pub velocity: Vec2,
    pub color: [f32; 4],
    /// x is the derived length, y the spawn thickness
    pub scale: Vec2,
    pub alpha: f32,
    /// Lifetime in milliseconds
    pub duration: f32,
    /// 1 at spawn, 0 when it is due for removal
    pub percent_life: f32,
    builder: ParticleBuilder,
    alpha_threshold: f32,
    velocity_threshold: f32,
    moving: bool,
    effector_time: f32,
    collect_time: f32,
}

impl Particle {
    /// Lifetimes under `MIN_PARTICLE_DURATION_MS` (including non-finite
    /// ones) are raised to it so every particle eventually expires.
    pub fn spawn(
        position: Vec2,
        color: [f32; 4],
        duration: f32,
        initial_scale: Vec2,
        builder: &ParticleBuilder,
    ) -> Self {
        let duration = if duration.is_finite() {
            duration.max(MIN_PARTICLE_DURATION_MS)
        } else {
            MIN_PARTICLE_DURATION_MS
        };
        Self {
            position,
            rotation: heading_angle(builder.velocity),
            velocity: builder.velocity,
            color,
            scale: initial_scale,
            alpha: color[3],
            duration,
            percent_life: 1.0,
            builder: builder.clone(),
            alpha_threshold: builder.custom_alpha_threshold.unwrap_or(DEFAULT_ALPHA_THRESHOLD),
            velocity_threshold: builder
                .custom_velocity_threshold
                .unwrap_or(DEFAULT_VELOCITY_THRESHOLD),
            moving: true,
            effector_time: 0.0,
            collect_time: 0.0,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.percent_life > 0.0
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn builder(&self) -> &ParticleBuilder {
        &self.builder
    }

    pub fn pause(&mut self) {
        self.moving = false;
    }

    pub fn resume(&mut self) {
        self.moving = true;
    }

    pub fn set_ignore_effectors(&mut self, ignore: bool) {
        self.builder.ignore_effectors = ignore;
    }

    pub fn set_can_be_collected(&mut self, collectable: bool) {
        self.builder.can_be_collected_by_player = collectable;
    }

    /// End the particle's life; it is released on the next aging pass
    pub fn kill(&mut self) {
        self.percent_life = 0.0;
    }

    /// Advance one step. Stopped particles are left untouched.
    pub fn update(&mut self, env: &ParticleEnv<'_>, dt: f32) -> Option<ParticleEvent> {
        if !self.moving {
            return None;
        }

        let mut event = None;
        if self.builder.can_be_collected_by_player {
            self.collect_time += dt;
            if let Some(collector) = env.collector {
                if self.collect_time > COLLECT_GRACE_SECS
                    && self.position.distance(collector) < COLLECT_RADIUS
                {
                    self.kill();
                    event = Some(ParticleEvent::Collected {
                        position: self.position,
                    });
                }
            }
        }

        self.position += self.velocity * dt * PARTICLE_DISTANCE_SCALE;
        self.rotation = heading_angle(self.velocity);

        let speed = self.velocity.length();
        let alpha = self.refresh_appearance(speed);

        if !self.builder.ignore_effectors {
            self.effector_time += dt;
            if self.builder.skip_effector_grace || self.effector_time > EFFECTOR_GRACE_SECS {
                self.velocity += env.effectors.particle_velocity_delta(self.position);
            }
        }

        if speed < self.velocity_threshold {
            self.velocity = Vec2::ZERO;
            self.moving = false;
            if self.builder.remove_when_velocity_reaches_threshold {
                self.kill();
            }
        } else if alpha.is_some_and(|a| a < self.alpha_threshold) {
            self.moving = false;
            if self.builder.remove_when_alpha_reaches_threshold {
                self.kill();
            }
        } else {
            self.velocity *= self.builder.velocity_damp_modifier;
        }

        if let Some(viewport) = env.viewport {
            self.handle_screen_exit(viewport);
        }

        event
    }

    /// Count down remaining life by `dt` seconds of a `duration` ms lifetime
    pub fn age(&mut self, dt: f32) {
        let spent = dt * 1000.0 / self.duration;
        self.percent_life = (self.percent_life - spent).max(0.0);
    }

    fn calculate_alpha(&self, speed: f32) -> f32 {
        let alpha = (self.percent_life * 2.0 * NORMAL_SCALE).min(speed * NORMAL_SCALE).min(1.0);
        alpha * alpha
    }

    /// Returns the alpha used for the fade check, if either attribute is derived
    fn refresh_appearance(&mut self, speed: f32) -> Option<f32> {
        let mut alpha = None;
        if self.builder.update_alpha {
            let a = self.calculate_alpha(speed);
            self.alpha = a;
            alpha = Some(a);
        }

        if self.builder.update_scale {
            let a = alpha.unwrap_or_else(|| self.calculate_alpha(speed));
            let stretch = (0.2 * speed + 0.1 * NORMAL_SCALE).min(1.0).min(a);
            let length = self.builder.length_multiplier * stretch;
            let (min, max) = (self.builder.min_length_clamp, self.builder.max_length_clamp);
            self.scale.x = clamp_length(length, min, max);
            alpha = Some(a);
        }

        alpha
    }

    fn handle_screen_exit(&mut self, viewport: Bounds) {
        if viewport.contains(self.position) {
            return;
        }
        if self.builder.wrap_around == WrapAroundMode::None || !self.moving {
            self.kill();
            return;
        }

        let p = self.position;
        match self.builder.wrap_around {
            WrapAroundMode::Constrain => {
                // Only the first offending edge is reflected
                if p.x > viewport.max.x {
                    self.velocity.x = -self.velocity.x.abs();
                } else if p.x < viewport.min.x {
                    self.velocity.x = self.velocity.x.abs();
                } else if p.y < viewport.min.y {
                    self.velocity.y = self.velocity.y.abs();
                } else if p.y > viewport.max.y {
                    self.velocity.y = -self.velocity.y.abs();
                }
            }
            WrapAroundMode::WrapAround => {
                if p.x > viewport.max.x {
                    self.position.x = viewport.min.x;
                }
                if p.x < viewport.min.x {
                    self.position.x = viewport.max.x;
                }
                if p.y > viewport.max.y {
                    self.position.y = viewport.min.y;
                }
                if p.y < viewport.min.y {
                    self.position.y = viewport.max.y;
                }
            }
            WrapAroundMode::None => {}
        }
    }
}

/// Clamp with either bound optional; the lower bound wins if they cross
fn clamp_length(length: f32, min: Option<f32>, max: Option<f32>) -> f32 {
    let min = min.unwrap_or(length);
    let max = max.unwrap_or(length);
    if length < min {
        min
    } else if length > max {
        max
    } else {
        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effector::Effector;

    const DT: f32 = 1.0 / 60.0;

    fn env(effectors: &EffectorRegistry) -> ParticleEnv<'_> {
        ParticleEnv {
            effectors,
            collector: None,
            viewport: None,
        }
    }

    fn moving(velocity: Vec2, builder: ParticleBuilder) -> Particle {
        let builder = ParticleBuilder { velocity, ..builder };
        Particle::spawn(Vec2::ZERO, [1.0; 4], 1000.0, Vec2::ONE, &builder)
    }

    #[test]
    fn test_step_moves_and_damps() {
        let registry = EffectorRegistry::new();
        let mut p = moving(Vec2::new(0.1, 0.0), ParticleBuilder::default());
        p.update(&env(&registry), DT);

        assert!((p.position.x - 0.1 * DT * 50.0).abs() < 1e-6);
        assert!((p.velocity.x - 0.1 * 0.94).abs() < 1e-6);
        assert_eq!(p.rotation, 0.0);
    }

    #[test]
    fn test_alpha_and_length_follow_speed() {
        let registry = EffectorRegistry::new();
        let builder = ParticleBuilder {
            length_multiplier: 10.0,
            ..Default::default()
        };
        let mut p = moving(Vec2::new(0.25, 0.0), builder);
        p.update(&env(&registry), DT);

        // min(1, min(4, 0.5))^2
        assert!((p.alpha - 0.25).abs() < 1e-6);
        // 10 * min(min(1, 0.05 + 0.2), 0.25)
        assert!((p.scale.x - 2.5).abs() < 1e-5);
        assert_eq!(p.scale.y, 1.0);
    }

    #[test]
    fn test_length_clamps() {
        assert_eq!(clamp_length(3.0, None, Some(1.5)), 1.5);
        assert_eq!(clamp_length(0.1, Some(0.5), None), 0.5);
        assert_eq!(clamp_length(0.7, None, None), 0.7);
        assert_eq!(clamp_length(0.7, Some(1.0), Some(0.5)), 1.0);
    }

    #[test]
    fn test_remove_on_stop_kills_on_that_step() {
        let registry = EffectorRegistry::new();
        let builder = ParticleBuilder {
            remove_when_velocity_reaches_threshold: true,
            custom_velocity_threshold: Some(0.05),
            update_alpha: false,
            update_scale: false,
            ..Default::default()
        };
        let mut p = moving(Vec2::new(0.1, 0.0), builder);

        let mut steps = 0;
        while p.is_alive() {
            let speed_before = p.velocity.length();
            p.update(&env(&registry), DT);
            steps += 1;
            if speed_before < 0.05 {
                assert!(!p.is_alive());
            } else {
                assert!(p.is_alive());
            }
            assert!(steps < 100);
        }
        assert_eq!(p.velocity, Vec2::ZERO);
        assert!(!p.is_moving());

        // No resurrection
        for _ in 0..5 {
            p.update(&env(&registry), DT);
            p.age(DT);
            assert_eq!(p.percent_life, 0.0);
        }
    }

    #[test]
    fn test_fade_stops_particle() {
        let registry = EffectorRegistry::new();
        let builder = ParticleBuilder {
            remove_when_alpha_reaches_threshold: true,
            custom_alpha_threshold: Some(0.5),
            ..Default::default()
        };
        let mut p = moving(Vec2::new(0.1, 0.0), builder);
        p.update(&env(&registry), DT);
        // alpha = (0.2)^2 < 0.5
        assert!(!p.is_moving());
        assert!(!p.is_alive());
        // Velocity is kept, only damping stops
        assert!((p.velocity.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_effector_grace_period() {
        let mut registry = EffectorRegistry::new();
        registry.insert(Effector::attraction(Vec2::new(0.0, 50.0), 1.0, 500.0));
        registry.refresh_effector_list();

        let mut p = moving(Vec2::new(0.5, 0.0), ParticleBuilder::default());
        p.update(&env(&registry), 0.1);
        assert_eq!(p.velocity.y, 0.0, "inside grace");
        p.update(&env(&registry), 0.2);
        assert!(p.velocity.y > 0.0, "bent after grace");

        let eager = ParticleBuilder {
            skip_effector_grace: true,
            ..Default::default()
        };
        let mut q = moving(Vec2::new(0.5, 0.0), eager);
        q.update(&env(&registry), 0.01);
        assert!(q.velocity.y > 0.0);

        let mut r = moving(Vec2::new(0.5, 0.0), ParticleBuilder::default());
        r.set_ignore_effectors(true);
        r.update(&env(&registry), 1.0);
        assert_eq!(r.velocity.y, 0.0);
    }

    #[test]
    fn test_collection_after_grace() {
        let registry = EffectorRegistry::new();
        let builder = ParticleBuilder {
            can_be_collected_by_player: true,
            ..Default::default()
        };
        let mut p = moving(Vec2::new(0.01, 0.0), builder);
        let near = ParticleEnv {
            collector: Some(Vec2::new(0.2, 0.0)),
            ..env(&registry)
        };

        assert_eq!(p.update(&near, 0.05), None);
        assert!(p.is_alive());
        let event = p.update(&near, 0.1);
        assert!(matches!(event, Some(ParticleEvent::Collected { .. })));
        assert!(!p.is_alive());
    }

    #[test]
    fn test_wrap_around_keeps_row() {
        let registry = EffectorRegistry::new();
        let viewport = Bounds::new(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 5.0));
        let builder = ParticleBuilder {
            wrap_around: WrapAroundMode::WrapAround,
            velocity: Vec2::new(0.5, 0.0),
            ..Default::default()
        };
        let mut p = Particle::spawn(Vec2::new(9.9, 2.5), [1.0; 4], 1000.0, Vec2::ONE, &builder);
        let e = ParticleEnv {
            viewport: Some(viewport),
            ..env(&registry)
        };
        p.update(&e, DT);

        assert_eq!(p.position, Vec2::new(-10.0, 2.5));
        assert!(p.is_alive());
    }

    #[test]
    fn test_constrain_reflects_inward() {
        let registry = EffectorRegistry::new();
        let viewport = Bounds::new(Vec2::splat(-1.0), Vec2::splat(1.0));
        let builder = ParticleBuilder {
            wrap_around: WrapAroundMode::Constrain,
            velocity: Vec2::new(0.0, -0.5),
            ..Default::default()
        };
        let mut p = Particle::spawn(Vec2::new(0.0, -0.9), [1.0; 4], 1000.0, Vec2::ONE, &builder);
        let e = ParticleEnv {
            viewport: Some(viewport),
            ..env(&registry)
        };
        p.update(&e, DT);
        assert!(p.velocity.y > 0.0);
        assert!(p.is_alive());
    }

    #[test]
    fn test_offscreen_without_wrap_dies() {
        let registry = EffectorRegistry::new();
        let e = ParticleEnv {
            viewport: Some(Bounds::new(Vec2::splat(-1.0), Vec2::splat(1.0))),
            ..env(&registry)
        };
        let mut p = moving(Vec2::new(2.0, 0.0), ParticleBuilder::default());
        p.update(&e, DT);
        assert!(!p.is_alive());
    }

    #[test]
    fn test_age_uses_millisecond_duration() {
        let mut p = moving(Vec2::ZERO, ParticleBuilder::default());
        p.duration = 500.0;
        p.age(0.25);
        assert!((p.percent_life - 0.5).abs() < 1e-6);
        p.age(1.0);
        assert_eq!(p.percent_life, 0.0);
    }

    #[test]
    fn test_non_positive_duration_still_expires() {
        for duration in [0.0, -250.0, f32::NAN, f32::INFINITY] {
            let builder = ParticleBuilder::default();
            let mut p = Particle::spawn(Vec2::ZERO, [1.0; 4], duration, Vec2::ONE, &builder);
            assert_eq!(p.duration, MIN_PARTICLE_DURATION_MS);

            p.age(DT);
            assert!(!p.is_alive());
        }
    }

    #[test]
    fn test_paused_particle_is_frozen() {
        let registry = EffectorRegistry::new();
        let mut p = moving(Vec2::new(0.3, 0.0), ParticleBuilder::default());
        p.pause();
        p.update(&env(&registry), DT);
        assert_eq!(p.position, Vec2::ZERO);
        p.resume();
        p.update(&env(&registry), DT);
        assert!(p.position.x > 0.0);
    }
}
