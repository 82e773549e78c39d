//! SceneBuilder - Declarative scene construction
//!
//! Provides a fluent API for populating a physics world.

use std::collections::HashMap;

use log::debug;
use rigid3d_math::Vec3;
use rigid3d_physics::{
    BodyDesc, BodyKey, Collider, CollisionFilter, CollisionLayer, PhysicsConfig, PhysicsMaterial,
    PhysicsWorld,
};

/// A built physics world plus the names given to its bodies
pub struct Scene {
    pub world: PhysicsWorld,
    names: HashMap<String, BodyKey>,
}

impl Scene {
    /// Look up a body by the name it was added under
    pub fn body(&self, name: &str) -> Option<BodyKey> {
        self.names.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = (&str, BodyKey)> + '_ {
        self.names.iter().map(|(name, key)| (name.as_str(), *key))
    }
}

/// Builder for constructing physics scenes
///
/// Bodies are created when [`build`](Self::build) runs, so the config can be
/// set at any point in the chain.
///
/// # Example
/// ```ignore
/// let scene = SceneBuilder::new()
///     .with_config(PhysicsConfig::default())
///     .add_floor(0.0, PhysicsMaterial::CONCRETE)
///     .add_sphere(Vec3::new(0.0, 5.0, 0.0), 0.5, 1.0, "ball")
///     .build();
/// ```
pub struct SceneBuilder {
    config: PhysicsConfig,
    bodies: Vec<(Option<String>, BodyDesc)>,
}

impl SceneBuilder {
    /// Create a new scene builder with the default physics config
    pub fn new() -> Self {
        Self {
            config: PhysicsConfig::default(),
            bodies: Vec::new(),
        }
    }

    /// Use the given physics configuration
    pub fn with_config(mut self, config: PhysicsConfig) -> Self {
        self.config = config;
        self
    }

    fn push(mut self, name: Option<&str>, desc: BodyDesc) -> Self {
        self.bodies.push((name.map(str::to_string), desc));
        self
    }

    /// Add an upward-facing floor plane at the given height, named "floor"
    pub fn add_floor(self, y: f32, material: PhysicsMaterial) -> Self {
        let collider = Collider::plane(Vec3::Y, y)
            .with_material(material)
            .with_filter(CollisionFilter::static_world());
        self.push(Some("floor"), BodyDesc::new_static(Vec3::ZERO).with_collider(collider))
    }

    /// Add a static plane with the given normal and distance from origin
    pub fn add_wall(self, normal: Vec3, distance: f32, material: PhysicsMaterial) -> Self {
        let collider = Collider::plane(normal, distance)
            .with_material(material)
            .with_filter(CollisionFilter::static_world());
        self.push(None, BodyDesc::new_static(Vec3::ZERO).with_collider(collider))
    }

    /// Add a dynamic sphere
    pub fn add_sphere(self, position: Vec3, radius: f32, mass: f32, name: &str) -> Self {
        let desc = BodyDesc::dynamic(position)
            .with_mass(mass)
            .with_collider(Collider::sphere(radius).with_material(PhysicsMaterial::RUBBER));
        self.push(Some(name), desc)
    }

    /// Add a dynamic box with full edge lengths `size`
    pub fn add_box(self, position: Vec3, size: Vec3, mass: f32, name: &str) -> Self {
        let desc = BodyDesc::dynamic(position)
            .with_mass(mass)
            .with_collider(Collider::cuboid(size).with_material(PhysicsMaterial::WOOD));
        self.push(Some(name), desc)
    }

    /// Add a dynamic capsule along the Y axis
    ///
    /// Capsules have no contact generation, so they fall through everything.
    pub fn add_capsule(self, position: Vec3, radius: f32, height: f32, mass: f32, name: &str) -> Self {
        let desc = BodyDesc::dynamic(position)
            .with_mass(mass)
            .with_collider(Collider::capsule(radius, height).with_material(PhysicsMaterial::WOOD));
        self.push(Some(name), desc)
    }

    /// Add an immovable box
    pub fn add_static_box(self, position: Vec3, size: Vec3, material: PhysicsMaterial, name: &str) -> Self {
        let collider = Collider::cuboid(size)
            .with_material(material)
            .with_filter(CollisionFilter::static_world());
        self.push(Some(name), BodyDesc::new_static(position).with_collider(collider))
    }

    /// Add a box-shaped trigger volume reporting bodies on the `detects` layers
    pub fn add_trigger(self, position: Vec3, size: Vec3, detects: CollisionLayer, name: &str) -> Self {
        let collider = Collider::cuboid(size)
            .with_trigger(true)
            .with_filter(CollisionFilter::trigger(detects));
        self.push(Some(name), BodyDesc::new_static(position).with_collider(collider))
    }

    /// Add a body that doesn't fit the standard patterns
    pub fn add_body(self, desc: BodyDesc) -> Self {
        self.push(None, desc)
    }

    /// Add a custom body under a name
    pub fn add_named_body(self, desc: BodyDesc, name: &str) -> Self {
        self.push(Some(name), desc)
    }

    /// Number of bodies queued so far
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Create the world and add every queued body in order
    ///
    /// A name used twice refers to the body added last.
    pub fn build(self) -> Scene {
        let mut world = PhysicsWorld::with_config(self.config);
        let mut names = HashMap::new();

        for (name, desc) in self.bodies {
            let key = world.add_body(desc);
            if let Some(name) = name {
                names.insert(name, key);
            }
        }

        debug!("built scene with {} bodies", world.body_count());
        Scene { world, names }
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}
