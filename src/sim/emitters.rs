//! Gameplay-side emitters that feed the grid and the particle field
//!
//! Each emitter keeps its own timers and is advanced by the fixed-step
//! driver; nothing here schedules itself.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::grid::WarpingGrid;
use super::particle::{ParticleBuilder, WrapAroundMode};
use super::particle_field::ParticleField;
use crate::{heading_angle, polar_to_cartesian};

/// Seconds between movement pushes
const MOVEMENT_INTERVAL: f32 = 0.33;
const MOVEMENT_VELOCITY_SCALE: f32 = 0.0015;

/// Seconds between black hole sprays
const SPRAY_INTERVAL: f32 = 0.25;
/// Spray angle advance per step
const SPRAY_ANGLE_STEP: f32 = TAU / 50.0;
/// Strength and reach of the breathing pulse
const PULSE_SCALE: f32 = 0.06;
const PULSE_RADIUS: f32 = 2.5;
const HIT_FORCE: f32 = 4.0;
const DEATH_FORCE: f32 = 8.0;
const BLAST_RADIUS: f32 = 3.0;

/// Blast left where a homing shot runs out of time
const EXPIRY_FORCE: f32 = 5.0;
const EXPIRY_RADIUS: f32 = 1.3;

/// Random vector with a length in `min..max` and a uniform heading
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> Vec2 {
    polar_to_cartesian(rng.random_range(min..max), rng.random_range(0.0..TAU))
}

/// HSV to RGBA with `hue` in sextants (0..6)
pub fn hsv_color(hue: f32, saturation: f32, value: f32) -> [f32; 4] {
    let hue = hue.rem_euclid(6.0);
    let chroma = value * saturation;
    let x = chroma * (1.0 - ((hue % 2.0) - 1.0).abs());
    let (r, g, b) = match hue as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = value - chroma;
    [r + m, g + m, b + m, 1.0]
}

/// Evenly spaced radial burst of particles with a random phase.
/// Returns how many were spawned.
pub fn spawn_burst<R: Rng + ?Sized>(
    field: &mut ParticleField,
    rng: &mut R,
    position: Vec2,
    count: usize,
    color: [f32; 4],
    builder: &ParticleBuilder,
) -> usize {
    if count == 0 {
        return 0;
    }
    let step = TAU / count as f32;
    let offset = rng.random_range(0.0..step);

    let mut spawned = 0;
    for i in 0..count {
        let heading = step * i as f32 + offset;
        let velocity = polar_to_cartesian(rng.random_range(8.0..16.0), heading) * 0.008;
        let builder = ParticleBuilder {
            velocity,
            ..builder.clone()
        };
        let duration = rng.random_range(280.0..480.0);
        if field
            .create_particle(position + 0.2 * velocity, color, duration, Vec2::ONE, &builder)
            .is_some()
        {
            spawned += 1;
        }
    }
    spawned
}

/// Pushes the grid along its owner's motion every third of a second
#[derive(Debug, Clone)]
pub struct MovementForceEmitter {
    pub radius: f32,
    pub force_multiplier: f32,
    last_position: Vec2,
    timer: f32,
}

impl MovementForceEmitter {
    pub fn new(position: Vec2, radius: f32, force_multiplier: f32) -> Self {
        Self {
            radius,
            force_multiplier,
            last_position: position,
            timer: 0.0,
        }
    }

    /// Returns the force applied, if this step fired
    pub fn update(&mut self, grid: &mut WarpingGrid, position: Vec2, dt: f32) -> Option<Vec2> {
        if dt <= 0.0 {
            return None;
        }
        self.timer += dt;
        if self.timer < MOVEMENT_INTERVAL {
            return None;
        }
        self.timer = 0.0;

        // Displacement since the last push over this frame's dt
        let velocity = (position - self.last_position) / dt;
        self.last_position = position;
        let force = velocity * MOVEMENT_VELOCITY_SCALE * self.force_multiplier;
        grid.apply_directed_force(force, position, self.radius);
        Some(force)
    }
}

/// Spray, pulse and blast behaviour of a black hole enemy
#[derive(Debug, Clone)]
pub struct BlackHoleEmitter {
    pub position: Vec2,
    pub spray_color: [f32; 4],
    /// Spray particles while alive
    pub spew_particles: bool,
    pub hit_points: i32,
    pub particles_on_hit: usize,
    pub particles_on_death: usize,
    spray_builder: ParticleBuilder,
    spray_timer: f32,
    spray_angle: f32,
    elapsed: f32,
}

impl BlackHoleEmitter {
    pub fn new(position: Vec2, spray_color: [f32; 4]) -> Self {
        Self {
            position,
            spray_color,
            spew_particles: true,
            hit_points: 1,
            particles_on_hit: 20,
            particles_on_death: 30,
            spray_builder: ParticleBuilder {
                wrap_around: WrapAroundMode::None,
                length_multiplier: 50.0,
                remove_when_alpha_reaches_threshold: true,
                can_be_collected_by_player: true,
                skip_effector_grace: true,
                max_length_clamp: Some(1.5),
                ..Default::default()
            },
            spray_timer: 0.0,
            spray_angle: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn with_hit_points(mut self, hit_points: i32) -> Self {
        self.hit_points = hit_points;
        self
    }

    pub fn spray_angle(&self) -> f32 {
        self.spray_angle
    }

    /// Advance timers, spray if due, and pulse the grid
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        grid: &mut WarpingGrid,
        field: &mut ParticleField,
        rng: &mut R,
        dt: f32,
    ) {
        self.elapsed += dt;
        self.spray_timer += dt;

        if self.spew_particles && self.spray_timer >= SPRAY_INTERVAL {
            self.spray_timer = 0.0;
            let velocity = polar_to_cartesian(rng.random_range(0.6..1.2), self.spray_angle) * 0.11;
            let side = 0.05 * Vec2::new(velocity.y, -velocity.x);
            let position = self.position + side + random_vector(rng, 0.05, 0.2);
            let builder = ParticleBuilder {
                velocity,
                ..self.spray_builder.clone()
            };
            let duration = rng.random_range(280.0..480.0);
            field.create_particle(position, self.spray_color, duration, Vec2::ONE, &builder);
        }

        self.spray_angle -= SPRAY_ANGLE_STEP;
        let pulse = (self.spray_angle / 2.0).sin() * PULSE_SCALE;
        grid.apply_implosive_force(pulse, self.position, PULSE_RADIUS);
    }

    /// Apply damage. Returns true when this hit destroyed the black hole.
    pub fn on_hit<R: Rng + ?Sized>(
        &mut self,
        damage: i32,
        grid: &mut WarpingGrid,
        field: &mut ParticleField,
        rng: &mut R,
    ) -> bool {
        self.hit_points -= damage;
        let killed = self.hit_points <= 0;
        let (force, count) = if killed {
            (DEATH_FORCE, self.particles_on_death)
        } else {
            (HIT_FORCE, self.particles_on_hit)
        };

        grid.apply_explosive_force(force, self.position, BLAST_RADIUS);
        let color = hsv_color(3.0 * self.elapsed, 0.25, 1.0);
        spawn_burst(field, rng, self.position, count, color, &self.spray_builder);
        if killed {
            log::debug!(
                "Black hole destroyed at ({:.2}, {:.2})",
                self.position.x,
                self.position.y
            );
        }
        killed
    }
}

/// Enemy shot that turns toward a target after a delay and bursts when its
/// time runs out. The host moves it along `direction()`.
#[derive(Debug, Clone)]
pub struct HomingProjectile {
    pub position: Vec2,
    /// Heading in radians
    pub heading: f32,
    /// Fraction of the remaining turn taken per second
    pub turn_speed: f32,
    /// Seconds flown straight before homing starts
    pub delay_to_turn: f32,
    /// Lifetime in seconds
    pub time_alive: f32,
    pub particles_on_expiry: usize,
    elapsed: f32,
}

impl HomingProjectile {
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading,
            turn_speed: 20.0,
            delay_to_turn: 0.8,
            time_alive: 2.0,
            particles_on_expiry: 10,
            elapsed: 0.0,
        }
    }

    pub fn direction(&self) -> Vec2 {
        polar_to_cartesian(1.0, self.heading)
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.time_alive
    }

    /// Advance the clock and steer toward `target`. Returns true once the
    /// lifetime is spent.
    pub fn update(&mut self, target: Vec2, dt: f32) -> bool {
        self.elapsed += dt;
        let to_target = target - self.position;
        if self.elapsed >= self.delay_to_turn && to_target != Vec2::ZERO {
            // Shortest signed arc to the target heading
            let delta = (heading_angle(to_target) - self.heading + PI).rem_euclid(TAU) - PI;
            self.heading += delta * (dt * self.turn_speed).min(1.0);
        }
        self.is_expired()
    }

    /// Blast the grid and scatter a two-tone burst at the current position.
    /// Returns how many particles were spawned.
    pub fn expire<R: Rng + ?Sized>(
        &self,
        grid: &mut WarpingGrid,
        field: &mut ParticleField,
        rng: &mut R,
    ) -> usize {
        grid.apply_explosive_force(EXPIRY_FORCE, self.position, EXPIRY_RADIUS);

        let hue = rng.random_range(0.0..6.0);
        let from = hsv_color(hue, 0.5, 1.0);
        let to = hsv_color(hue + rng.random_range(0.0..2.0), 0.5, 1.0);
        let shards = ParticleBuilder {
            wrap_around: WrapAroundMode::None,
            length_multiplier: 30.0,
            velocity_damp_modifier: 0.94,
            remove_when_alpha_reaches_threshold: true,
            can_be_collected_by_player: false,
            ignore_effectors: true,
            max_length_clamp: Some(1.5),
            ..Default::default()
        };

        let mut spawned = 0;
        for _ in 0..self.particles_on_expiry {
            let speed = 12.0 * (1.0 - 1.0 / rng.random_range(2.0..3.0)) * 0.005;
            let builder = ParticleBuilder {
                velocity: polar_to_cartesian(speed, rng.random_range(0.0..TAU)),
                ..shards.clone()
            };
            let t: f32 = rng.random_range(0.0..1.0);
            let color = std::array::from_fn(|i| from[i] + (to[i] - from[i]) * t);
            let duration = rng.random_range(280.0..480.0);
            if field
                .create_particle(self.position, color, duration, Vec2::ONE, &builder)
                .is_some()
            {
                spawned += 1;
            }
        }
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;
    use crate::sim::grid::GridConfig;
    use crate::sim::pause::PauseFlag;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grid() -> WarpingGrid {
        let config = GridConfig {
            bounds: Bounds::new(Vec2::splat(-5.0), Vec2::splat(5.0)),
            creation_pulse: None,
            ..Default::default()
        };
        let mut grid = WarpingGrid::new(config, PauseFlag::new()).unwrap();
        grid.create_grid();
        grid
    }

    #[test]
    fn test_random_vector_length() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_vector(&mut rng, 0.05, 0.2);
            assert!(v.length() >= 0.05 - 1e-6 && v.length() < 0.2 + 1e-6);
        }
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_color(0.0, 1.0, 1.0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(hsv_color(2.0, 1.0, 1.0), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(hsv_color(4.0, 1.0, 1.0), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(hsv_color(1.0, 0.0, 1.0), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_burst_is_even_and_bounded() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut field = ParticleField::with_capacity(8, PauseFlag::new()).unwrap();
        let builder = ParticleBuilder::default();
        let spawned = spawn_burst(&mut field, &mut rng, Vec2::ZERO, 12, [1.0; 4], &builder);
        assert_eq!(spawned, 8);

        for p in field.live_particles() {
            let speed = p.velocity.length();
            assert!((0.064..=0.128).contains(&speed));
            assert!(p.position.distance(0.2 * p.velocity) < 1e-6);
        }
    }

    #[test]
    fn test_movement_emitter_fires_on_interval() {
        let mut grid = grid();
        let mut emitter = MovementForceEmitter::new(Vec2::ZERO, 1.0, 1.0);
        let dt = 0.1;
        assert!(emitter.update(&mut grid, Vec2::new(0.1, 0.0), dt).is_none());
        assert!(emitter.update(&mut grid, Vec2::new(0.2, 0.0), dt).is_none());
        assert!(emitter.update(&mut grid, Vec2::new(0.3, 0.0), dt).is_none());
        let force = emitter.update(&mut grid, Vec2::new(0.4, 0.0), dt).unwrap();
        assert!((force.x - 0.4 / dt * 0.0015).abs() < 1e-6);
        assert!(grid.point(5, 5).unwrap().acceleration().x > 0.0);
    }

    #[test]
    fn test_black_hole_sprays_and_pulses() {
        let mut grid = grid();
        let mut field = ParticleField::with_capacity(16, PauseFlag::new()).unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut hole = BlackHoleEmitter::new(Vec2::ZERO, [1.0, 0.3, 0.5, 1.0]);

        hole.update(&mut grid, &mut field, &mut rng, 0.1);
        assert_eq!(field.live_count(), 0);
        assert!((hole.spray_angle() + TAU / 50.0).abs() < 1e-6);
        // sin of a negative half-angle pushes points out
        assert!(grid.point(6, 5).unwrap().acceleration().x > 0.0);

        hole.update(&mut grid, &mut field, &mut rng, 0.1);
        hole.update(&mut grid, &mut field, &mut rng, 0.1);
        assert_eq!(field.live_count(), 1);
        let spray = field.live_particles().next().unwrap();
        assert!(spray.builder().can_be_collected_by_player);
        assert_eq!(spray.builder().max_length_clamp, Some(1.5));
    }

    #[test]
    fn test_black_hole_hit_then_death() {
        let mut grid = grid();
        let mut field = ParticleField::with_capacity(64, PauseFlag::new()).unwrap();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut hole = BlackHoleEmitter::new(Vec2::ZERO, [1.0; 4]).with_hit_points(2);

        assert!(!hole.on_hit(1, &mut grid, &mut field, &mut rng));
        assert_eq!(field.live_count(), 20);
        let pushed = grid.point(6, 5).unwrap().acceleration().x;
        assert!(pushed > 0.0);

        assert!(hole.on_hit(1, &mut grid, &mut field, &mut rng));
        assert_eq!(field.live_count(), 50);
        let doubled = grid.point(6, 5).unwrap().acceleration().x;
        assert!((doubled - pushed * 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_homing_waits_then_turns() {
        let target = Vec2::new(0.0, 5.0);
        let mut shot = HomingProjectile::new(Vec2::ZERO, 0.0);

        assert!(!shot.update(target, 0.5));
        assert_eq!(shot.heading, 0.0);

        assert!(!shot.update(target, 0.5));
        assert!((shot.heading - PI / 2.0).abs() < 1e-5);
        assert!(shot.direction().distance(Vec2::Y) < 1e-5);
    }

    #[test]
    fn test_homing_turns_the_short_way() {
        let mut shot = HomingProjectile::new(Vec2::ZERO, 3.0);
        shot.delay_to_turn = 0.0;
        let target = polar_to_cartesian(1.0, -3.0);

        shot.update(target, 0.1);
        assert!(shot.heading > 3.0);
        assert!(shot.direction().distance(target) < 1e-4);
    }

    #[test]
    fn test_homing_expiry_blasts_and_bursts() {
        let mut grid = grid();
        let mut field = ParticleField::with_capacity(32, PauseFlag::new()).unwrap();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut shot = HomingProjectile::new(Vec2::new(0.5, 0.0), 0.0);

        assert!(!shot.update(Vec2::ZERO, 1.0));
        assert!(shot.update(Vec2::ZERO, 1.0));
        assert!(shot.is_expired());

        assert_eq!(shot.expire(&mut grid, &mut field, &mut rng), 10);
        assert!(grid.point(5, 5).unwrap().acceleration().x < 0.0);
        for p in field.live_particles() {
            let speed = p.velocity.length();
            assert!((0.03 - 1e-6..=0.04 + 1e-6).contains(&speed));
            assert!(p.builder().ignore_effectors);
            assert!(!p.builder().can_be_collected_by_player);
        }
    }
}
