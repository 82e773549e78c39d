//! Integration tests for whole-world behaviour
//!
//! These drive a `PhysicsWorld` through many steps and check properties that
//! must hold regardless of the exact numbers: energy and momentum, static
//! bodies, sleeping, raycasts, penetration recovery and the sub-step cap.

use rigid3d_math::{Quat, Vec3};
use rigid3d_physics::{
    AabbBroadphase, BodyDesc, BodyKey, Collider, CollisionFilter, CollisionLayer, PhysicsConfig,
    PhysicsEvent, PhysicsMaterial, PhysicsWorld, RigidBody, PENETRATION_SLOP,
};
use slotmap::SlotMap;

const DT: f32 = 1.0 / 60.0;

fn zero_gravity() -> PhysicsWorld {
    PhysicsWorld::with_config(PhysicsConfig::default().with_gravity(Vec3::ZERO))
}

fn ball(position: Vec3, radius: f32) -> BodyDesc {
    BodyDesc::dynamic(position).with_collider(Collider::sphere(radius))
}

fn floor() -> BodyDesc {
    BodyDesc::new_static(Vec3::ZERO).with_collider(Collider::plane(Vec3::Y, 0.0))
}

fn total_energy(world: &PhysicsWorld) -> f32 {
    world.bodies().map(|(_, b)| b.kinetic_energy()).sum()
}

fn total_momentum(world: &PhysicsWorld) -> Vec3 {
    world
        .bodies()
        .fold(Vec3::ZERO, |acc, (_, b)| acc + b.linear_velocity * b.mass())
}

// ==================== Conservation ====================

/// Two bouncing spheres never gain kinetic energy from the solver
#[test]
fn test_energy_never_increases_in_inelastic_collision() {
    let mut world = zero_gravity();
    let bouncy = Collider::sphere(0.5).with_restitution(0.6);
    world.add_body(
        BodyDesc::dynamic(Vec3::new(-2.0, 0.0, 0.0))
            .with_linear_velocity(Vec3::new(4.0, 0.0, 0.0))
            .with_collider(bouncy.clone()),
    );
    world.add_body(
        BodyDesc::dynamic(Vec3::new(2.0, 0.0, 0.0))
            .with_mass(2.0)
            .with_linear_velocity(Vec3::new(-3.0, 0.0, 0.0))
            .with_collider(bouncy),
    );

    let mut previous = total_energy(&world);
    for _ in 0..120 {
        world.step(DT);
        let energy = total_energy(&world);
        assert!(
            energy <= previous + 1e-4,
            "energy rose from {} to {}",
            previous,
            energy
        );
        previous = energy;
    }
}

/// Head-on collision of unequal masses keeps total linear momentum
#[test]
fn test_momentum_conserved_through_collision() {
    // The slower body would otherwise fall asleep and lose its momentum
    let mut world = PhysicsWorld::with_config(
        PhysicsConfig::default()
            .with_gravity(Vec3::ZERO)
            .with_sleeping(false),
    );
    let desc = |x: f32, vx: f32, mass: f32| {
        BodyDesc::dynamic(Vec3::new(x, 0.0, 0.0))
            .with_mass(mass)
            .with_damping(0.0, 0.0)
            .with_linear_velocity(Vec3::new(vx, 0.0, 0.0))
            .with_collider(Collider::sphere(0.5))
    };
    world.add_body(desc(-1.0, 3.0, 1.0));
    world.add_body(desc(1.0, -1.0, 4.0));

    let before = total_momentum(&world);
    let mut collided = false;
    for _ in 0..60 {
        world.step(DT);
        collided |= !world.collisions().is_empty();
    }
    let after = total_momentum(&world);

    assert!(collided, "bodies should have collided");
    assert!((before.x - after.x).abs() < 1e-3);
    assert!(after.y.abs() < 1e-4 && after.z.abs() < 1e-4);
}

// ==================== Static Bodies ====================

/// Nothing applied to a static body moves it
#[test]
fn test_static_bodies_never_move() {
    let mut world = PhysicsWorld::new();
    let rotation = Quat::from_axis_angle(Vec3::Y, 0.3);
    let wall = world.add_body(
        BodyDesc::new_static(Vec3::new(0.0, 1.0, 0.0))
            .with_rotation(rotation)
            .with_collider(Collider::cuboid(Vec3::new(4.0, 2.0, 0.5))),
    );
    let ground = world.add_body(floor());
    for i in 0..5 {
        world.add_body(
            ball(Vec3::new(i as f32 * 0.3 - 0.6, 3.0 + i as f32, 0.0), 0.4)
                .with_linear_velocity(Vec3::new(0.0, -5.0, 0.0)),
        );
    }

    for frame in 0..240 {
        if frame % 20 == 0 {
            let body = world.get_body_mut(wall).unwrap();
            body.apply_force(Vec3::new(1000.0, 0.0, 0.0), Some(Vec3::ONE));
            body.apply_impulse(Vec3::new(0.0, 50.0, 0.0), None);
            body.apply_torque(Vec3::Y);
        }
        world.step(DT);
    }

    let wall = world.get_body(wall).unwrap();
    assert_eq!(wall.position, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(wall.rotation, rotation.normalize());
    assert_eq!(wall.linear_velocity, Vec3::ZERO);
    assert_eq!(wall.angular_velocity, Vec3::ZERO);

    let ground = world.get_body(ground).unwrap();
    assert_eq!(ground.position, Vec3::ZERO);
}

// ==================== Sleeping ====================

/// A ball on the floor sleeps after the sleep delay and an impulse wakes it
#[test]
fn test_resting_ball_sleeps_and_impulse_wakes_it() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor());
    let key = world.add_body(ball(Vec3::new(0.0, 0.5, 0.0), 0.5));

    let mut slept_at = None;
    for frame in 0..120 {
        world.step(DT);
        if world.get_body(key).unwrap().is_sleeping() {
            slept_at = Some(frame);
            break;
        }
    }
    let slept_at = slept_at.expect("ball should fall asleep");
    assert!(slept_at >= 29 && slept_at <= 45, "slept after {} frames", slept_at);

    // Still asleep and resting on the floor a second later
    for _ in 0..60 {
        world.step(DT);
    }
    let body = world.get_body(key).unwrap();
    assert!(body.is_sleeping());
    assert!(body.position.y > 0.45 && body.position.y < 0.55);

    world
        .get_body_mut(key)
        .unwrap()
        .apply_impulse(Vec3::new(2.0, 0.0, 0.0), None);
    let body = world.get_body(key).unwrap();
    assert!(!body.is_sleeping());
    assert!(body.linear_velocity.x > 1.9);

    world.step(DT);
    let body = world.get_body(key).unwrap();
    assert!(!body.is_sleeping());
    assert!(body.position.x > 0.0);
}

/// A moving body that lands on a sleeping one wakes it
#[test]
fn test_falling_ball_wakes_sleeper() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor());
    let sleeper = world.add_body(ball(Vec3::new(0.0, 0.5, 0.0), 0.5));
    for _ in 0..60 {
        world.step(DT);
    }
    assert!(world.get_body(sleeper).unwrap().is_sleeping());

    world.add_body(
        ball(Vec3::new(0.0, 1.7, 0.0), 0.5).with_linear_velocity(Vec3::new(0.0, -4.0, 0.0)),
    );

    let mut woke = false;
    for _ in 0..30 {
        world.step(DT);
        if !world.get_body(sleeper).unwrap().is_sleeping() {
            woke = true;
            break;
        }
    }
    assert!(woke, "a hit from above should wake the resting ball");
}

/// A body with sleeping turned off stays awake next to one that sleeps
#[test]
fn test_per_body_sleep_opt_out() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor());
    let sleeper = world.add_body(ball(Vec3::new(-2.0, 0.5, 0.0), 0.5));
    let insomniac = world.add_body(ball(Vec3::new(2.0, 0.5, 0.0), 0.5).with_allow_sleep(false));
    for _ in 0..120 {
        world.step(DT);
    }
    assert!(world.get_body(sleeper).unwrap().is_sleeping());
    assert!(!world.get_body(insomniac).unwrap().is_sleeping());
    assert!((world.get_body(insomniac).unwrap().position.y - 0.5).abs() < 0.05);
}

#[test]
fn test_sleeping_disabled() {
    let mut world = PhysicsWorld::with_config(PhysicsConfig::default().with_sleeping(false));
    world.add_body(floor());
    let key = world.add_body(ball(Vec3::new(0.0, 0.5, 0.0), 0.5));
    for _ in 0..120 {
        world.step(DT);
    }
    assert!(!world.get_body(key).unwrap().is_sleeping());
}

// ==================== Raycasts ====================

/// Ray straight down from (0, 5, 0) hits the top of a unit sphere
#[test]
fn test_raycast_down_onto_unit_sphere() {
    let mut world = PhysicsWorld::new();
    let key = world.add_body(ball(Vec3::ZERO, 1.0));

    let hit = world
        .raycast(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), None)
        .expect("ray should hit the sphere");

    assert_eq!(hit.body, key);
    assert!((hit.distance - 4.0).abs() < 1e-4);
    assert!((hit.point - Vec3::Y).length() < 1e-4);
    assert!((hit.normal - Vec3::Y).length() < 1e-4);
}

#[test]
fn test_raycast_prefers_box_over_floor_behind_it() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor());
    let crate_key = world.add_body(
        BodyDesc::new_static(Vec3::new(0.0, 1.0, 0.0)).with_collider(Collider::cuboid(Vec3::splat(2.0))),
    );

    let hit = world.raycast(Vec3::new(0.0, 10.0, 0.0), -Vec3::Y, Some(100.0)).unwrap();
    assert_eq!(hit.body, crate_key);
    assert!((hit.distance - 8.0).abs() < 1e-4);
    assert_eq!(hit.normal, Vec3::Y);
}

/// Layer masks pick which bodies a ray can see; `raycast_all` keeps every hit
#[test]
fn test_raycast_layers_and_all_hits() {
    let mut world = PhysicsWorld::new();
    let ground = world.add_body(
        BodyDesc::new_static(Vec3::ZERO)
            .with_collider(Collider::plane(Vec3::Y, 0.0).with_filter(CollisionFilter::static_world())),
    );
    let prop = world.add_body(ball(Vec3::new(0.0, 2.0, 0.0), 0.5));
    let origin = Vec3::new(0.0, 10.0, 0.0);

    assert_eq!(world.raycast(origin, -Vec3::Y, None).unwrap().body, prop);
    let floor_only = world
        .raycast_filtered(origin, -Vec3::Y, None, CollisionLayer::STATIC)
        .unwrap();
    assert_eq!(floor_only.body, ground);
    assert!((floor_only.distance - 10.0).abs() < 1e-4);

    let hits = world.raycast_all(origin, -Vec3::Y, None, CollisionLayer::ALL);
    let keys: Vec<BodyKey> = hits.iter().map(|h| h.body).collect();
    assert_eq!(keys, vec![prop, ground]);
    assert!(world
        .raycast_all(origin, -Vec3::Y, None, CollisionLayer::DEBRIS)
        .is_empty());
}

/// A plane sits where its equation says, wherever its body is placed
#[test]
fn test_plane_ignores_body_position() {
    let mut world = zero_gravity();
    world.add_body(
        BodyDesc::new_static(Vec3::new(0.0, 2.0, 0.0)).with_collider(Collider::plane(Vec3::Y, 0.0)),
    );
    let key = world.add_body(ball(Vec3::new(0.0, 1.5, 0.0), 0.5));

    world.step(DT);

    assert!(world.collisions().is_empty());
    assert_eq!(world.get_body(key).unwrap().position, Vec3::new(0.0, 1.5, 0.0));
    let hit = world.raycast(Vec3::new(3.0, 5.0, 0.0), -Vec3::Y, None).unwrap();
    assert!((hit.point.y).abs() < 1e-4);
}

// ==================== Resting Contact ====================

/// A free-rotating box dropped onto a floor lands flat and does not spin
#[test]
fn test_box_rests_on_plane_without_spinning() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor());
    let key = world.add_body(
        BodyDesc::dynamic(Vec3::new(0.0, 2.0, 0.0))
            .with_mass(5.0)
            .with_collider(Collider::cuboid(Vec3::ONE).with_material(PhysicsMaterial::WOOD)),
    );

    let mut max_spin: f32 = 0.0;
    for _ in 0..180 {
        world.step(DT);
        max_spin = max_spin.max(world.get_body(key).unwrap().angular_velocity.length());
    }

    let body = world.get_body(key).unwrap();
    assert!(body.position.y > 0.4 && body.position.y < 0.6, "box at {}", body.position.y);
    assert!(max_spin < 1e-3, "box spun at {} rad/s", max_spin);
    assert!(body.rotation.dot(&Quat::IDENTITY).abs() > 0.9999);
}

/// Aligned boxes that may rotate freely settle into a stable stack
#[test]
fn test_free_box_stack_rests() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor());
    let wood = Collider::cuboid(Vec3::ONE).with_material(PhysicsMaterial::WOOD);
    let lower = world.add_body(BodyDesc::dynamic(Vec3::new(0.0, 0.5, 0.0)).with_collider(wood.clone()));
    let upper = world.add_body(BodyDesc::dynamic(Vec3::new(0.0, 1.6, 0.0)).with_collider(wood));

    let mut max_spin: f32 = 0.0;
    for _ in 0..240 {
        world.step(DT);
        for key in [lower, upper] {
            max_spin = max_spin.max(world.get_body(key).unwrap().angular_velocity.length());
        }
    }

    let lower_y = world.get_body(lower).unwrap().position.y;
    let upper_y = world.get_body(upper).unwrap().position.y;
    assert!(lower_y > 0.4 && lower_y < 0.6, "lower box at {}", lower_y);
    assert!(upper_y > 1.35 && upper_y < 1.65, "upper box at {}", upper_y);
    assert!(max_spin < 1e-3, "stack spun at {} rad/s", max_spin);
}

/// Two static or kinematic bodies touching still produce a collision event
#[test]
fn test_immovable_contact_is_reported() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor());
    world.add_body(
        BodyDesc::kinematic(Vec3::new(0.0, 0.45, 0.0)).with_collider(Collider::cuboid(Vec3::ONE)),
    );
    world.drain_events();

    world.step(DT);

    let impulses: Vec<f32> = world
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            PhysicsEvent::Collision(info) => Some(info.impulse),
            _ => None,
        })
        .collect();
    assert_eq!(impulses, vec![0.0]);
}

// ==================== Penetration Recovery ====================

/// Deeply overlapping spheres are pushed apart to within the slop
#[test]
fn test_overlapping_spheres_separate() {
    let mut world = zero_gravity();
    let a = world.add_body(ball(Vec3::ZERO, 1.0));
    let b = world.add_body(ball(Vec3::new(0.5, 0.2, 0.0), 1.0));

    for _ in 0..5 {
        world.step(DT);
    }

    let pa = world.get_body(a).unwrap().position;
    let pb = world.get_body(b).unwrap().position;
    assert!(pa.distance(pb) >= 2.0 - PENETRATION_SLOP - 1e-3);
}

#[test]
fn test_box_stack_settles_on_floor() {
    let mut world = PhysicsWorld::new();
    world.add_body(floor());
    let lower = world.add_body(
        BodyDesc::dynamic(Vec3::new(0.0, 0.5, 0.0))
            .with_fixed_rotation(true)
            .with_collider(Collider::cuboid(Vec3::ONE).with_material(PhysicsMaterial::WOOD)),
    );
    let upper = world.add_body(
        BodyDesc::dynamic(Vec3::new(0.0, 1.6, 0.0))
            .with_fixed_rotation(true)
            .with_collider(Collider::cuboid(Vec3::ONE).with_material(PhysicsMaterial::WOOD)),
    );

    for _ in 0..240 {
        world.step(DT);
    }

    let lower = world.get_body(lower).unwrap().position.y;
    let upper = world.get_body(upper).unwrap().position.y;
    assert!(lower > 0.4 && lower < 0.6, "lower box at {}", lower);
    assert!(upper > lower + 0.9, "upper box at {} over {}", upper, lower);
}

// ==================== Kinematic Bodies ====================

/// A moving kinematic box shoves a sphere and keeps its own velocity
#[test]
fn test_kinematic_body_pushes_without_being_pushed() {
    let mut world = zero_gravity();
    let paddle = world.add_body(
        BodyDesc::kinematic(Vec3::ZERO)
            .with_linear_velocity(Vec3::X)
            .with_collider(Collider::cuboid(Vec3::ONE)),
    );
    let target = world.add_body(ball(Vec3::new(1.2, 0.0, 0.0), 0.5));

    for _ in 0..60 {
        world.step(DT);
    }

    let paddle = world.get_body(paddle).unwrap();
    assert_eq!(paddle.linear_velocity, Vec3::X);
    assert!((paddle.position.x - 1.0).abs() < 1e-3);
    assert!(world.get_body(target).unwrap().linear_velocity.x > 0.5);
}

// ==================== Broadphase ====================

#[test]
fn test_broadphase_never_pairs_statics_or_sleepers() {
    let mut bodies: SlotMap<BodyKey, RigidBody> = SlotMap::with_key();
    let mut insert = |desc: BodyDesc| bodies.insert_with_key(|k| desc.build(k));

    let statics = [
        insert(floor()),
        insert(BodyDesc::new_static(Vec3::ZERO).with_collider(Collider::cuboid(Vec3::ONE))),
    ];
    let sleepers = [insert(ball(Vec3::ZERO, 1.0)), insert(ball(Vec3::ZERO, 1.0))];
    let awake = insert(ball(Vec3::ZERO, 1.0));

    for key in sleepers {
        bodies[key].sleep();
    }

    let mut broadphase = AabbBroadphase::new();
    let pairs = broadphase.update(&bodies).to_vec();

    for (a, b) in &pairs {
        assert!(!(statics.contains(a) && statics.contains(b)));
        assert!(!(sleepers.contains(a) && sleepers.contains(b)));
    }
    // Every other pair overlaps at the origin
    assert_eq!(pairs.len(), 10 - 1 - 1);
    assert!(pairs.iter().all(|(a, b)| a != b));
    assert!(pairs.iter().any(|(a, b)| *a == awake || *b == awake));
}

// ==================== Time Stepping ====================

/// No frame delta simulates more than max_sub_steps fixed steps
#[test]
fn test_sub_step_cap_bounds_simulated_time() {
    let mut world = PhysicsWorld::new();
    world.add_body(ball(Vec3::new(0.0, 100.0, 0.0), 0.5));
    let config = world.config().clone();
    let cap = config.fixed_time_step * config.max_sub_steps as f32;

    for &dt in &[0.0, 0.001, DT, 0.05, 0.1, 0.25, 1.0, 10.0] {
        let report = world.step(dt);
        assert!(report.sub_steps <= config.max_sub_steps);
        assert!(report.simulated_time <= cap + 1e-6);
        assert!(report.alpha >= 0.0 && report.alpha < 1.0);
    }
}

#[test]
fn test_frame_rate_independent_fall() {
    let step = 1.0 / 64.0;
    let fall = |frame_dt: f32, frames: usize| {
        let mut world = PhysicsWorld::with_config(PhysicsConfig::default().with_fixed_time_step(step));
        let key = world.add_body(BodyDesc::dynamic(Vec3::new(0.0, 100.0, 0.0)));
        for _ in 0..frames {
            world.step(frame_dt);
        }
        world.get_body(key).unwrap().position.y
    };

    // One second of simulation either way
    let fine = fall(step, 64);
    let coarse = fall(step * 2.0, 32);
    assert!((fine - coarse).abs() < 1e-4, "{} vs {}", fine, coarse);
    assert!(fine < 96.0);
}
