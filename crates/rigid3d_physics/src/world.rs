//! Physics world and simulation

use bytemuck::{Pod, Zeroable};
use log::{debug, trace, warn};
use rigid3d_math::{Quat, Vec3};
use slotmap::SlotMap;

use crate::body::{BodyDesc, BodyKey, RigidBody};
use crate::broadphase::AabbBroadphase;
use crate::collision::{detect, CollisionInfo, CollisionLayer};
use crate::contact::ContactConstraint;
use crate::events::{EventMask, EventQueue, PhysicsEvent};
use crate::raycast::{raycast_body, Ray, RaycastHit};

/// Ray length used when a query passes no maximum distance
pub const DEFAULT_RAY_DISTANCE: f32 = 1000.0;

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Gravity acceleration (world units per second squared)
    pub gravity: Vec3,
    /// Length of one simulation sub-step in seconds
    pub fixed_time_step: f32,
    /// Most sub-steps run by a single `step` call
    pub max_sub_steps: u32,
    /// Solver passes over all contacts per sub-step
    pub velocity_iterations: u32,
    /// Reserved; positional correction runs once per velocity pass
    pub position_iterations: u32,
    pub enable_sleeping: bool,
    /// Kinetic energy per unit mass below which a body may sleep
    pub sleep_threshold: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_time_step: 1.0 / 60.0,
            max_sub_steps: 8,
            velocity_iterations: 8,
            position_iterations: 3,
            enable_sleeping: true,
            sleep_threshold: 0.1,
        }
    }
}

impl PhysicsConfig {
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_fixed_time_step(mut self, fixed_time_step: f32) -> Self {
        self.fixed_time_step = fixed_time_step;
        self
    }

    pub fn with_max_sub_steps(mut self, max_sub_steps: u32) -> Self {
        self.max_sub_steps = max_sub_steps;
        self
    }

    pub fn with_velocity_iterations(mut self, iterations: u32) -> Self {
        self.velocity_iterations = iterations;
        self
    }

    pub fn with_sleeping(mut self, enabled: bool) -> Self {
        self.enable_sleeping = enabled;
        self
    }
}

/// What a call to [`PhysicsWorld::step`] did
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Fixed sub-steps executed
    pub sub_steps: u32,
    /// Seconds of simulation advanced
    pub simulated_time: f32,
    /// Seconds discarded because the sub-step cap was reached
    pub dropped_time: f32,
    /// Leftover fraction of a fixed step, for render interpolation
    pub alpha: f32,
}

/// Body pose laid out for direct upload to a GPU buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BodyTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl BodyTransform {
    fn of(body: &RigidBody) -> Self {
        Self {
            position: body.position,
            rotation: body.rotation,
        }
    }
}

/// The physics world containing all rigid bodies
pub struct PhysicsWorld {
    /// All rigid bodies in the world (using generational keys)
    bodies: SlotMap<BodyKey, RigidBody>,
    broadphase: AabbBroadphase,
    /// Contacts found during the last sub-step
    collisions: Vec<CollisionInfo>,
    events: EventQueue,
    /// Unsimulated time carried between `step` calls
    accumulator: f32,
    config: PhysicsConfig,
}

impl PhysicsWorld {
    /// Create a new physics world with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a new physics world with custom configuration
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            broadphase: AabbBroadphase::new(),
            collisions: Vec::new(),
            events: EventQueue::new(),
            accumulator: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Create a body from a descriptor and return its key
    pub fn add_body(&mut self, desc: BodyDesc) -> BodyKey {
        let key = self.bodies.insert_with_key(|key| desc.build(key));
        debug!("added {:?} body {:?}", self.bodies[key].body_type(), key);
        self.events.push(PhysicsEvent::BodyAdded(key));
        key
    }

    /// Remove a body from the world and return it
    ///
    /// Removing a missing key is a no-op.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<RigidBody> {
        let body = self.bodies.remove(key)?;
        self.collisions.retain(|c| !c.involves(key));
        debug!("removed body {:?}", key);
        self.events.push(PhysicsEvent::BodyRemoved(key));
        Some(body)
    }

    /// Get an immutable reference to a body by key
    pub fn get_body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.bodies.get(key)
    }

    /// Get a mutable reference to a body by key
    pub fn get_body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        self.bodies.get_mut(key)
    }

    /// Iterate over all bodies with their keys
    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &RigidBody)> + '_ {
        self.bodies.iter()
    }

    /// Iterate over all body keys
    pub fn body_keys(&self) -> impl Iterator<Item = BodyKey> + '_ {
        self.bodies.keys()
    }

    /// Get the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Remove every body and reset the step accumulator
    ///
    /// Pending events are discarded; no removal events are queued.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.collisions.clear();
        self.events.clear();
        self.accumulator = 0.0;
    }

    pub fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    /// Change gravity, waking dynamic bodies so they respond to it
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
        for body in self.bodies.values_mut().filter(|b| b.is_dynamic()) {
            body.wake();
        }
    }

    /// Contacts from the most recent sub-step
    pub fn collisions(&self) -> &[CollisionInfo] {
        &self.collisions
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        self.events.drain()
    }

    pub fn subscribe(&mut self, kinds: EventMask) {
        self.events.subscribe(kinds);
    }

    pub fn unsubscribe(&mut self, kinds: EventMask) {
        self.events.unsubscribe(kinds);
    }

    /// Advance the simulation by `dt` seconds of wall time
    ///
    /// Time is accumulated and consumed in fixed sub-steps, at most
    /// `max_sub_steps` per call. Whole steps still owed after that are
    /// dropped; only the fraction of a step is carried over.
    pub fn step(&mut self, dt: f32) -> StepReport {
        let h = self.config.fixed_time_step;
        if h <= 0.0 {
            warn!("fixed_time_step must be positive, got {h}");
            return StepReport::default();
        }

        self.accumulator += dt.max(0.0);

        let mut sub_steps = 0;
        while self.accumulator >= h && sub_steps < self.config.max_sub_steps {
            self.sub_step(h);
            self.accumulator -= h;
            sub_steps += 1;
        }

        let mut dropped_time = 0.0;
        if self.accumulator >= h {
            dropped_time = (self.accumulator / h).floor() * h;
            self.accumulator = (self.accumulator - dropped_time).max(0.0);
            warn!(
                "physics fell behind: ran {} sub-steps, dropped {:.4}s",
                sub_steps, dropped_time
            );
        }

        let alpha = self.accumulator / h;
        self.events.push(PhysicsEvent::Interpolate(alpha));

        StepReport {
            sub_steps,
            simulated_time: sub_steps as f32 * h,
            dropped_time,
            alpha,
        }
    }

    /// One fixed step of the full pipeline
    fn sub_step(&mut self, dt: f32) {
        self.collisions.clear();

        let gravity = self.config.gravity;
        for body in self.bodies.values_mut() {
            body.integrate_forces(dt, gravity);
        }

        let pairs = self.broadphase.update(&self.bodies).to_vec();
        let mut constraints = Vec::with_capacity(pairs.len());

        for (key_a, key_b) in pairs {
            let (a, b) = (&self.bodies[key_a], &self.bodies[key_b]);
            let (Some(collider_a), Some(collider_b)) = (a.collider(), b.collider()) else {
                continue;
            };
            let Some(info) = detect(a, b) else {
                continue;
            };

            if collider_a.is_trigger || collider_b.is_trigger {
                self.collisions.push(info);
                self.events.push(PhysicsEvent::Trigger(info));
            } else {
                constraints.push(ContactConstraint::new(info, collider_a, collider_b));
            }
        }

        trace!(
            "sub-step: {} bodies, {} candidate pairs, {} contacts",
            self.bodies.len(),
            self.broadphase.pairs().len(),
            constraints.len()
        );

        self.wake_touched(&constraints);

        for _ in 0..self.config.velocity_iterations {
            for constraint in &mut constraints {
                let info = constraint.info();
                if let Some([a, b]) = self.bodies.get_disjoint_mut([info.body_a, info.body_b]) {
                    constraint.resolve(a, b);
                }
            }
        }

        // Pairs of immovable bodies are reported too, with zero impulse
        for constraint in constraints {
            let info = constraint.into_info();
            self.collisions.push(info);
            self.events.push(PhysicsEvent::Collision(info));
        }

        for body in self.bodies.values_mut() {
            body.integrate_velocity(dt);
        }

        if self.config.enable_sleeping {
            let threshold = self.config.sleep_threshold;
            for body in self.bodies.values_mut() {
                body.update_sleep(dt, threshold);
            }
        }
    }

    /// Wake sleeping bodies that are hit by something moving
    fn wake_touched(&mut self, constraints: &[ContactConstraint]) {
        let threshold = self.config.sleep_threshold;
        let is_active = |body: &RigidBody| {
            if body.is_sleeping() || body.is_static() {
                return false;
            }
            if body.is_kinematic() {
                return body.linear_velocity != Vec3::ZERO || body.angular_velocity != Vec3::ZERO;
            }
            body.kinetic_energy() > threshold * body.mass()
        };

        for constraint in constraints {
            let info = constraint.info();
            let Some([a, b]) = self.bodies.get_disjoint_mut([info.body_a, info.body_b]) else {
                continue;
            };
            if a.is_sleeping() && is_active(b) {
                a.wake();
            } else if b.is_sleeping() && is_active(a) {
                b.wake();
            }
        }
    }

    /// Cast a ray and return the closest hit nearer than `max_distance`
    ///
    /// `None` limits the ray to [`DEFAULT_RAY_DISTANCE`]. A zero-length
    /// direction never hits.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: Option<f32>) -> Option<RaycastHit> {
        self.raycast_filtered(origin, direction, max_distance, CollisionLayer::ALL)
    }

    /// [`raycast`](Self::raycast) against bodies whose collider layer
    /// intersects `mask`
    pub fn raycast_filtered(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: Option<f32>,
        mask: CollisionLayer,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(origin, direction)?;
        let mut closest: Option<RaycastHit> = None;
        let mut best = max_distance.unwrap_or(DEFAULT_RAY_DISTANCE);

        for body in self.ray_candidates(mask) {
            if let Some(hit) = raycast_body(&ray, body) {
                if hit.distance < best {
                    best = hit.distance;
                    closest = Some(hit);
                }
            }
        }

        closest
    }

    /// Every hit along the ray within `max_distance`, nearest first
    pub fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: Option<f32>,
        mask: CollisionLayer,
    ) -> Vec<RaycastHit> {
        let Some(ray) = Ray::new(origin, direction) else {
            return Vec::new();
        };
        let limit = max_distance.unwrap_or(DEFAULT_RAY_DISTANCE);

        let mut hits: Vec<RaycastHit> = self
            .ray_candidates(mask)
            .filter_map(|body| raycast_body(&ray, body))
            .filter(|hit| hit.distance < limit)
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn ray_candidates(&self, mask: CollisionLayer) -> impl Iterator<Item = &RigidBody> {
        self.bodies.values().filter(move |body| {
            body.collider()
                .is_some_and(|c| c.filter.layer.intersects(mask))
        })
    }

    /// Poses of all bodies, in [`body_keys`](Self::body_keys) order
    pub fn transforms(&self) -> Vec<BodyTransform> {
        self.bodies.values().map(BodyTransform::of).collect()
    }

    /// [`transforms`](Self::transforms) as raw bytes
    pub fn transforms_as_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.transforms()).to_vec()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
