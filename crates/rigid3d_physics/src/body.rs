//! Rigid body types and integration

use log::debug;
use rigid3d_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::shapes::{Aabb, Collider};

// Define generational key type for rigid bodies
new_key_type! {
    /// Key to a rigid body in the physics world
    ///
    /// Uses generational indexing: once a body is removed, old keys return
    /// `None` even if the slot is reused.
    pub struct BodyKey;
}

/// Seconds a body must stay below the energy threshold before it sleeps
pub const SLEEP_DELAY: f32 = 0.5;

/// How a body participates in the simulation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyType {
    /// Affected by forces, gravity and contacts
    #[default]
    Dynamic,
    /// Never moves; infinite mass
    Static,
    /// Moved only by its user-set velocity; infinite mass for contacts
    Kinematic,
}

/// Descriptor used to create a [`RigidBody`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Ignored for static bodies
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    /// When false the body never falls asleep
    pub allow_sleep: bool,
    pub collider: Option<Collider>,
    /// Free-form tag for the owning application
    pub user_data: u64,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            linear_damping: 0.01,
            angular_damping: 0.01,
            gravity_scale: 1.0,
            fixed_rotation: false,
            allow_sleep: true,
            collider: None,
            user_data: 0,
        }
    }
}

impl BodyDesc {
    /// A dynamic body at `position`
    pub fn dynamic(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// A static body at `position`
    pub fn new_static(position: Vec3) -> Self {
        Self {
            body_type: BodyType::Static,
            position,
            ..Self::default()
        }
    }

    /// A kinematic body at `position`
    pub fn kinematic(position: Vec3) -> Self {
        Self {
            body_type: BodyType::Kinematic,
            position,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the orientation; normalized on build
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, velocity: Vec3) -> Self {
        self.angular_velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Multiplier on world gravity (0.0 disables gravity)
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    pub fn with_allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    /// Build the body under the key it will be stored at
    pub fn build(self, key: BodyKey) -> RigidBody {
        let mut body = RigidBody {
            key,
            body_type: self.body_type,
            position: self.position,
            rotation: self.rotation.normalize(),
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            gravity_scale: self.gravity_scale,
            user_data: self.user_data,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: Vec3::ZERO,
            inverse_inertia: Vec3::ZERO,
            fixed_rotation: self.fixed_rotation,
            allow_sleep: self.allow_sleep,
            collider: None,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            sleeping: false,
            sleep_timer: 0.0,
        };

        if body.body_type != BodyType::Static {
            body.mass = self.mass.max(0.0);
            body.linear_velocity = self.linear_velocity;
            body.angular_velocity = self.angular_velocity;
        }

        body.collider = self.collider.map(|mut c| {
            c.attach(key);
            c
        });
        body.update_mass_properties();
        body
    }
}

/// A rigid body with pose, velocities, mass properties and sleep state
#[derive(Clone, Debug)]
pub struct RigidBody {
    key: BodyKey,
    body_type: BodyType,
    /// Position of the center of mass (world coordinates)
    pub position: Vec3,
    /// Orientation, kept unit length by the integrator
    pub rotation: Quat,
    /// Linear velocity (units per second)
    pub linear_velocity: Vec3,
    /// Angular velocity (radians per second, world axes)
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub user_data: u64,
    mass: f32,
    inverse_mass: f32,
    inertia: Vec3,
    inverse_inertia: Vec3,
    fixed_rotation: bool,
    allow_sleep: bool,
    collider: Option<Collider>,
    force: Vec3,
    torque: Vec3,
    sleeping: bool,
    sleep_timer: f32,
}

impl RigidBody {
    /// Recompute inverse mass and inertia from mass, type and collider
    fn update_mass_properties(&mut self) {
        if self.body_type == BodyType::Static {
            self.mass = 0.0;
            self.inverse_mass = 0.0;
            self.inertia = Vec3::ZERO;
            self.inverse_inertia = Vec3::ZERO;
            return;
        }

        self.inertia = match &self.collider {
            Some(collider) if self.mass > 0.0 => collider.compute_inertia(self.mass),
            _ => Vec3::ONE,
        };

        if self.body_type == BodyType::Kinematic {
            self.inverse_mass = 0.0;
            self.inverse_inertia = Vec3::ZERO;
            return;
        }

        self.inverse_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
        let inv = |i: f32| if i > 0.0 { 1.0 / i } else { 0.0 };
        self.inverse_inertia = Vec3::new(inv(self.inertia.x), inv(self.inertia.y), inv(self.inertia.z));
    }

    pub fn key(&self) -> BodyKey {
        self.key
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    pub fn is_kinematic(&self) -> bool {
        self.body_type == BodyType::Kinematic
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Diagonal of the inertia tensor
    pub fn inertia(&self) -> Vec3 {
        self.inertia
    }

    pub fn inverse_inertia(&self) -> Vec3 {
        self.inverse_inertia
    }

    pub fn is_fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    pub fn allows_sleep(&self) -> bool {
        self.allow_sleep
    }

    /// Enable or disable sleeping; disabling wakes the body
    pub fn set_allow_sleep(&mut self, allow: bool) {
        self.allow_sleep = allow;
        if !allow {
            self.wake();
        }
    }

    /// Seconds spent below the sleep threshold
    pub fn sleep_timer(&self) -> f32 {
        self.sleep_timer
    }

    /// Force accumulated since the last force integration
    pub fn accumulated_force(&self) -> Vec3 {
        self.force
    }

    /// Torque accumulated since the last force integration
    pub fn accumulated_torque(&self) -> Vec3 {
        self.torque
    }

    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    /// Attach a collider, replacing any previous one
    ///
    /// Inertia is recomputed from the new shape.
    pub fn set_collider(&mut self, mut collider: Collider) {
        collider.attach(self.key);
        self.collider = Some(collider);
        self.update_mass_properties();
    }

    /// Detach and return the collider
    pub fn take_collider(&mut self) -> Option<Collider> {
        let collider = self.collider.take();
        self.update_mass_properties();
        collider
    }

    /// Change the mass of a dynamic or kinematic body
    pub fn set_mass(&mut self, mass: f32) {
        if self.is_static() {
            return;
        }
        self.mass = mass.max(0.0);
        self.update_mass_properties();
    }

    /// World-space bounds of the collider
    pub fn aabb(&self) -> Option<Aabb> {
        self.collider
            .as_ref()
            .map(|c| c.aabb(self.position, self.rotation))
    }

    /// Teleport the body
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.wake();
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.wake();
    }

    /// No-op on static bodies
    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        if self.is_static() {
            return;
        }
        self.linear_velocity = velocity;
        self.wake();
    }

    /// No-op on static bodies
    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        if self.is_static() {
            return;
        }
        self.angular_velocity = velocity;
        self.wake();
    }

    /// Accumulate a force, optionally at a world-space point (adds torque)
    ///
    /// Only dynamic bodies respond to forces.
    pub fn apply_force(&mut self, force: Vec3, point: Option<Vec3>) {
        if !self.is_dynamic() {
            return;
        }
        self.force += force;
        if let Some(point) = point {
            self.torque += (point - self.position).cross(force);
        }
        self.wake();
    }

    /// Apply an instantaneous change in momentum, optionally at a world-space point
    pub fn apply_impulse(&mut self, impulse: Vec3, point: Option<Vec3>) {
        if self.is_static() {
            return;
        }
        self.linear_velocity += impulse * self.inverse_mass;
        if let Some(point) = point {
            if !self.fixed_rotation {
                let angular = (point - self.position).cross(impulse);
                self.angular_velocity += self.inverse_inertia.component_mul(angular);
            }
        }
        self.wake();
    }

    pub fn apply_torque(&mut self, torque: Vec3) {
        if !self.is_dynamic() || self.fixed_rotation {
            return;
        }
        self.torque += torque;
        self.wake();
    }

    /// Integrate accumulated forces and gravity into velocity, then damp
    ///
    /// Only awake dynamic bodies are affected; accumulators are always cleared.
    pub fn integrate_forces(&mut self, dt: f32, gravity: Vec3) {
        if self.is_dynamic() && !self.sleeping {
            let total = self.force + gravity * (self.mass * self.gravity_scale);
            self.linear_velocity += total * (self.inverse_mass * dt);

            if !self.fixed_rotation {
                self.angular_velocity += self.inverse_inertia.component_mul(self.torque) * dt;
            }

            self.linear_velocity *= 1.0 / (1.0 + self.linear_damping * dt);
            self.angular_velocity *= 1.0 / (1.0 + self.angular_damping * dt);
        }

        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    /// Integrate velocities into the pose
    pub fn integrate_velocity(&mut self, dt: f32) {
        if self.is_static() || self.sleeping {
            return;
        }
        self.position += self.linear_velocity * dt;
        if !self.fixed_rotation {
            self.rotation = self.rotation.integrate(self.angular_velocity, dt);
        }
    }

    pub fn kinetic_energy(&self) -> f32 {
        let w = self.angular_velocity;
        let rotational = self.inertia.x * w.x * w.x + self.inertia.y * w.y * w.y + self.inertia.z * w.z * w.z;
        0.5 * self.mass * self.linear_velocity.length_squared() + 0.5 * rotational
    }

    pub fn wake(&mut self) {
        if self.sleeping {
            debug!("body {:?} woke up", self.key);
        }
        self.sleeping = false;
        self.sleep_timer = 0.0;
    }

    /// Put the body to sleep, zeroing both velocities
    pub fn sleep(&mut self) {
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.sleeping = true;
    }

    /// Advance the sleep heuristic by `dt`
    ///
    /// A dynamic body whose kinetic energy stays below `threshold * mass` for
    /// longer than [`SLEEP_DELAY`] falls asleep; any more energy wakes it.
    /// Bodies with sleeping disabled are skipped.
    pub(crate) fn update_sleep(&mut self, dt: f32, threshold: f32) {
        if !self.is_dynamic() || !self.allow_sleep {
            return;
        }

        if self.kinetic_energy() < threshold * self.mass {
            self.sleep_timer += dt;
            if self.sleep_timer > SLEEP_DELAY && !self.sleeping {
                debug!("body {:?} fell asleep", self.key);
                self.sleep();
            }
        } else {
            self.wake();
        }
    }
}
