//! Warpfield demo entry point
//!
//! Runs a short headless scripted scene: a black hole breathing on the grid,
//! a moving player trailing particles, and periodic explosions. Stats are
//! logged; set `RUST_LOG=info` (or `debug`) to see them. An optional first
//! argument picks the quality preset (`low`, `medium`, `high`).

use std::error::Error;

use glam::Vec2;

use warpfield::consts::SIM_DT;
use warpfield::renderer::{colors, particle_sprites};
use warpfield::settings::{GridStatus, MemoryStore, QualityPreset, Settings};
use warpfield::sim::{
    BlackHoleEmitter, Effector, FixedStep, HomingProjectile, MovementForceEmitter,
    ParticleBuilder, ProjectileSteering, TickInput, WarpWorld, WrapAroundMode, projectile_wake,
    random_vector, spawn_burst,
};
use warpfield::{Bounds, heading_angle, polar_to_cartesian};

const DEMO_SECONDS: f32 = 12.0;
const STATS_EVERY_TICKS: u64 = 120;
const HOMING_SPEED: f32 = 4.0;

fn main() -> Result<(), Box<dyn Error>> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Warpfield (native) starting...");

    let store = MemoryStore::new();
    let mut settings = Settings::load(&store);
    if let Some(arg) = std::env::args().nth(1) {
        match QualityPreset::parse(&arg) {
            Some(preset) => settings.apply_preset(preset),
            None => log::warn!(
                "Unknown quality preset '{}', keeping {}",
                arg,
                settings.quality.as_str()
            ),
        }
    }
    log::info!(
        "Quality {}: {} particles, {:?} grid drawing",
        settings.quality.as_str(),
        settings.max_particles(),
        settings.grid_config().draw_method
    );
    let grid_status = GridStatus::load(&store);

    let mut world = WarpWorld::from_settings(&settings, 0x5eed)?;
    grid_status.apply(&mut world.grid);

    let viewport = Bounds::from_center_size(Vec2::ZERO, settings.grid.bounds.size());
    let hole_position = Vec2::new(4.0, 2.0);
    let hole_pull = Effector::black_hole(hole_position, 0.02, 6.0, 3.0).with_projectiles(true);
    let hole_effector = world.add_effector(hole_pull);
    let player_pull = world.add_effector(Effector::attraction(Vec2::ZERO, 0.01, 4.0));

    let mut hole =
        BlackHoleEmitter::new(hole_position, colors::BLACK_HOLE_SPRAY).with_hit_points(3);
    let mut hole_alive = true;
    let mut player_wake = MovementForceEmitter::new(Vec2::ZERO, 1.0, 1.0);
    let mut bullet = ProjectileSteering::default();
    bullet.on_enable(&world.effectors);
    let mut bullet_position = Vec2::new(-8.0, -1.0);
    let bullet_velocity = Vec2::new(6.0, 0.5);
    let mut homing: Option<HomingProjectile> = None;

    let trail = ParticleBuilder {
        wrap_around: WrapAroundMode::WrapAround,
        length_multiplier: 20.0,
        remove_when_alpha_reaches_threshold: true,
        remove_when_velocity_reaches_threshold: true,
        ..Default::default()
    };

    let mut stepper = FixedStep::new();
    let mut collected = 0usize;
    let mut elapsed = 0.0f32;

    while elapsed < DEMO_SECONDS {
        elapsed += SIM_DT;

        // Player orbits the origin
        let player = polar_to_cartesian(3.0, elapsed * 0.8);
        if let Some(effector) = world.effectors.get_mut(player_pull) {
            effector.position = player;
        }
        player_wake.update(&mut world.grid, player, SIM_DT);

        let velocity = random_vector(&mut world.rng, 0.05, 0.12);
        let builder = ParticleBuilder {
            velocity,
            ..trail.clone()
        };
        world.create_particle(player, colors::PLAYER_TRAIL, 400.0, Vec2::ONE, &builder);

        if hole_alive {
            hole.update(&mut world.grid, &mut world.particles, &mut world.rng, SIM_DT);
        }

        // Bullet flies right, bent by the black hole
        if bullet_position.x < viewport.max.x {
            let steer = bullet.steering_force(&world.effectors, bullet_position, SIM_DT);
            bullet_position += (bullet_velocity + steer * 0.001) * SIM_DT;
            projectile_wake(&mut world.grid, bullet_position, bullet_velocity);
        }

        // The black hole fires a homing shot at the player now and then
        let tick_index = world.time_ticks + 1;
        if hole_alive && homing.is_none() && tick_index % 150 == 0 {
            let aim = heading_angle(player - hole_position);
            homing = Some(HomingProjectile::new(hole_position, aim + 1.0));
        }
        if let Some(shot) = homing.as_mut() {
            let velocity = shot.direction() * HOMING_SPEED;
            shot.position += velocity * SIM_DT;
            projectile_wake(&mut world.grid, shot.position, velocity);
            shot.update(player, SIM_DT);
        }
        if let Some(shot) = homing.take_if(|shot| shot.is_expired()) {
            let shards = shot.expire(&mut world.grid, &mut world.particles, &mut world.rng);
            log::debug!("Homing shot expired, {} shards", shards);
        }

        // Scripted hits on the black hole every three seconds
        if hole_alive && tick_index % 180 == 0 {
            hole_alive = !hole.on_hit(1, &mut world.grid, &mut world.particles, &mut world.rng);
            if !hole_alive {
                world.remove_effector(hole_effector);
                world.effectors.refresh_effector_list();
                log::info!("Black hole destroyed after {:.1}s", elapsed);
            }
        }
        if tick_index % 240 == 0 {
            let at = random_vector(&mut world.rng, 1.0, 5.0);
            world.grid.apply_explosive_force(6.0, at, 3.0);
            spawn_burst(
                &mut world.particles,
                &mut world.rng,
                at,
                24,
                colors::EXPLOSION,
                &ParticleBuilder {
                    remove_when_alpha_reaches_threshold: true,
                    length_multiplier: 30.0,
                    ..Default::default()
                },
            );
        }

        let input = TickInput {
            collector: Some(player),
            viewport: Some(viewport),
        };
        let (steps, events) = stepper.advance(&mut world, &input, SIM_DT);
        collected += events.len();

        if steps > 0 && world.time_ticks % STATS_EVERY_TICKS == 0 {
            let lines = world.grid.lines();
            let sprites = particle_sprites(world.particles.live_particles());
            log::info!(
                "t={:.1}s particles={} sprites={} lines={} dropped={} collected={}",
                elapsed,
                world.particles.live_count(),
                sprites.len(),
                lines.segments().len(),
                lines.dropped(),
                collected
            );
        }
    }

    log::info!(
        "Demo finished: {} ticks, {} particles collected, {} still alive",
        world.time_ticks,
        collected,
        world.particles.live_count()
    );
    Ok(())
}
