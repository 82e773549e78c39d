//! Rigid-body physics simulation for rigid3d
//!
//! This crate provides:
//! - Collider shapes (boxes, spheres, capsules, planes)
//! - Broadphase and narrowphase collision detection with layer filtering
//! - Impulse-based contact resolution with friction and restitution
//! - A fixed-timestep world with sleeping, raycasts and queued events

pub mod body;
pub mod broadphase;
pub mod collision;
pub mod contact;
pub mod events;
pub mod material;
pub mod raycast;
pub mod shapes;
pub mod world;

// Re-export commonly used types
pub use body::{BodyDesc, BodyKey, BodyType, RigidBody, SLEEP_DELAY};
pub use broadphase::AabbBroadphase;
pub use collision::{detect, CollisionFilter, CollisionInfo, CollisionLayer, Contact};
pub use contact::{ContactConstraint, CORRECTION_PERCENT, PENETRATION_SLOP};
pub use events::{EventMask, PhysicsEvent};
pub use material::PhysicsMaterial;
pub use raycast::{Ray, RaycastHit};
pub use shapes::{Aabb, Capsule, Collider, ColliderKind, ColliderShape, Cuboid, Plane, Sphere};
pub use world::{BodyTransform, PhysicsConfig, PhysicsWorld, StepReport, DEFAULT_RAY_DISTANCE};
