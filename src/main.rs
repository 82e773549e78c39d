//! rigid3d - headless rigid-body physics demo
//!
//! Builds a small scene, runs it for the configured number of frames at a
//! fixed frame rate and logs what happened.

use rigid3d::config::AppConfig;
use rigid3d::scene::{Scene, SceneBuilder};
use rigid3d::systems::SimulationSystem;
use rigid3d_math::Vec3;
use rigid3d_physics::{CollisionLayer, PhysicsEvent, PhysicsMaterial};

fn build_scene(config: &AppConfig) -> Scene {
    SceneBuilder::new()
        .with_config(config.physics.to_physics_config())
        .add_floor(0.0, PhysicsMaterial::CONCRETE)
        .add_wall(Vec3::X, -6.0, PhysicsMaterial::CONCRETE)
        .add_wall(-Vec3::X, -6.0, PhysicsMaterial::CONCRETE)
        .add_static_box(Vec3::new(3.0, 0.5, 0.0), Vec3::ONE, PhysicsMaterial::METAL, "pedestal")
        .add_box(Vec3::new(0.0, 0.5, 0.0), Vec3::ONE, 5.0, "crate_bottom")
        .add_box(Vec3::new(0.0, 1.6, 0.0), Vec3::ONE, 5.0, "crate_top")
        .add_sphere(Vec3::new(3.0, 4.0, 0.0), 0.4, 1.0, "ball")
        .add_sphere(Vec3::new(-3.0, 6.0, 0.0), 0.5, 2.0, "heavy_ball")
        .add_trigger(Vec3::new(-3.0, 2.0, 0.0), Vec3::splat(1.5), CollisionLayer::DEFAULT, "checkpoint")
        .build()
}

fn name_of(scene: &Scene, key: rigid3d_physics::BodyKey) -> &str {
    scene
        .names()
        .find(|(_, k)| *k == key)
        .map(|(name, _)| name)
        .unwrap_or("unnamed")
}

fn main() {
    let loaded = AppConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Initialize logging; RUST_LOG still wins over the config file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.debug.log_level))
        .init();
    log::info!("Starting rigid3d");

    if let Err(e) = &loaded {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }

    let mut scene = build_scene(&config);
    log::info!("Scene ready with {} bodies", scene.world.body_count());

    let frame_dt = 1.0 / config.simulation.frame_rate;
    let mut simulation = SimulationSystem::new(config.simulation.max_frame_dt);
    let mut collisions = 0usize;
    let mut sub_steps = 0u32;

    for frame in 0..config.simulation.frames {
        let result = simulation.update_with_dt(&mut scene.world, frame_dt);
        sub_steps += result.report.sub_steps;

        for event in &result.events {
            match event {
                PhysicsEvent::Collision(info) => {
                    collisions += 1;
                    if config.debug.log_collisions {
                        log::debug!(
                            "frame {}: {} hit {} (impulse {:.3})",
                            frame,
                            name_of(&scene, info.body_a),
                            name_of(&scene, info.body_b),
                            info.impulse
                        );
                    }
                }
                PhysicsEvent::Trigger(info) => {
                    log::info!(
                        "frame {}: {} is inside {}",
                        frame,
                        name_of(&scene, info.body_a),
                        name_of(&scene, info.body_b)
                    );
                }
                PhysicsEvent::BodyAdded(_) | PhysicsEvent::BodyRemoved(_) | PhysicsEvent::Interpolate(_) => {}
            }
        }
    }

    log::info!(
        "Ran {} frames, {} sub-steps, {} contacts resolved",
        config.simulation.frames,
        sub_steps,
        collisions
    );

    let mut names: Vec<_> = scene.names().collect();
    names.sort_by(|a, b| a.0.cmp(b.0));
    for (name, key) in names {
        if let Some(body) = scene.world.get_body(key) {
            let p = body.position;
            log::info!(
                "{:>12}: ({:6.3}, {:6.3}, {:6.3}) {}",
                name,
                p.x,
                p.y,
                p.z,
                if body.is_sleeping() { "asleep" } else { "awake" }
            );
        }
    }

    if let Some(hit) = scene.world.raycast(Vec3::new(0.0, 10.0, 0.0), -Vec3::Y, None) {
        log::info!(
            "Ray from above hit {} at height {:.3}",
            name_of(&scene, hit.body),
            hit.point.y
        );
    }
}
