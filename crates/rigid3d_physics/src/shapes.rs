//! Collision shapes and colliders
//!
//! Shapes hold geometry only, in body-local terms. World-space queries take the
//! owning body's pose and recompute everything; nothing derived is cached.

use std::f32::consts::PI;

use rigid3d_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::body::BodyKey;
use crate::collision::CollisionFilter;
use crate::material::PhysicsMaterial;

/// Half-size of the box reported for unbounded shapes
pub const INFINITE_EXTENT: f32 = 1e10;

/// An axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner (all components are minimums)
    pub min: Vec3,
    /// Maximum corner (all components are maximums)
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a position with given half-extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// An effectively infinite box, used for planes
    pub fn infinite() -> Self {
        Self::from_center_half_extents(Vec3::ZERO, Vec3::splat(INFINITE_EXTENT))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents (half the size in each dimension)
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Whether two boxes overlap on all three axes (touching counts)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max.x >= other.min.x
            && self.min.x <= other.max.x
            && self.max.y >= other.min.y
            && self.min.y <= other.max.y
            && self.max.z >= other.min.z
            && self.min.z <= other.max.z
    }

    /// Check if a point is inside or on the AABB
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Get the closest point inside or on the AABB to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp_components(self.min, self.max)
    }
}

/// A box with full side lengths `size`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    pub size: Vec3,
}

impl Cuboid {
    /// Negative side lengths are treated as their magnitude
    pub fn new(size: Vec3) -> Self {
        Self { size: size.abs() }
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size.abs() * 0.5
    }

    /// The unrotated box around `position`
    ///
    /// Narrowphase and raycasts treat boxes as axis-aligned.
    pub fn world_bounds(&self, position: Vec3) -> Aabb {
        Aabb::from_center_half_extents(position, self.half_extents())
    }

    /// Bounds of the box under `rotation`
    pub fn aabb(&self, position: Vec3, rotation: Quat) -> Aabb {
        let h = self.half_extents();
        let ex = rotation.rotate_vector(Vec3::new(h.x, 0.0, 0.0)).abs();
        let ey = rotation.rotate_vector(Vec3::new(0.0, h.y, 0.0)).abs();
        let ez = rotation.rotate_vector(Vec3::new(0.0, 0.0, h.z)).abs();
        Aabb::from_center_half_extents(position, ex + ey + ez)
    }

    pub fn compute_inertia(&self, mass: f32) -> Vec3 {
        let factor = mass / 12.0;
        let s = self.size;
        Vec3::new(
            factor * (s.y * s.y + s.z * s.z),
            factor * (s.x * s.x + s.z * s.z),
            factor * (s.x * s.x + s.y * s.y),
        )
    }
}

/// A sphere of `radius` around the body origin
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub radius: f32,
}

impl Sphere {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn aabb(&self, position: Vec3) -> Aabb {
        Aabb::from_center_half_extents(position, Vec3::splat(self.radius))
    }

    pub fn compute_inertia(&self, mass: f32) -> Vec3 {
        Vec3::splat(0.4 * mass * self.radius * self.radius)
    }
}

/// A capsule along the local Y axis
///
/// `height` is measured tip to tip, so the cylindrical core is
/// `height - 2 * radius` long.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub radius: f32,
    pub height: f32,
}

impl Capsule {
    pub fn new(radius: f32, height: f32) -> Self {
        Self { radius, height }
    }

    /// Length of the cylindrical core
    pub fn cylinder_height(&self) -> f32 {
        (self.height - 2.0 * self.radius).max(0.0)
    }

    pub fn aabb(&self, position: Vec3, rotation: Quat) -> Aabb {
        let half_axis = rotation
            .rotate_vector(Vec3::new(0.0, self.cylinder_height() * 0.5, 0.0))
            .abs();
        Aabb::from_center_half_extents(position, half_axis + Vec3::splat(self.radius))
    }

    /// Cylinder plus two hemispherical caps, mass split by volume
    pub fn compute_inertia(&self, mass: f32) -> Vec3 {
        let r = self.radius;
        let h = self.cylinder_height();
        let sphere_volume = 4.0 / 3.0 * PI * r * r * r;
        let cylinder_volume = PI * r * r * h;
        let total_volume = sphere_volume + cylinder_volume;
        if total_volume <= 0.0 {
            return Vec3::ZERO;
        }

        let sphere_mass = mass * sphere_volume / total_volume;
        let cylinder_mass = mass * cylinder_volume / total_volume;

        let i_sphere = 0.4 * sphere_mass * r * r;
        let i_cylinder_xz = cylinder_mass * (3.0 * r * r + h * h) / 12.0;
        let i_cylinder_y = 0.5 * cylinder_mass * r * r;

        Vec3::new(
            i_cylinder_xz + i_sphere,
            i_cylinder_y + i_sphere,
            i_cylinder_xz + i_sphere,
        )
    }
}

/// An infinite plane `normal · p = distance` in world space
///
/// The owning body's pose does not move the plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal pointing to the solid side's outside
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Create a plane; the normal is normalized
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalized(),
            distance,
        }
    }

    /// A horizontal plane facing +Y at height `y`
    pub fn floor(y: f32) -> Self {
        Self::new(Vec3::Y, y)
    }

    /// Signed distance from a point, positive on the normal side
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// Geometry of a collider
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Box(Cuboid),
    Sphere(Sphere),
    Capsule(Capsule),
    Plane(Plane),
    /// Declared but not simulated: no narrowphase or raycast support
    Mesh,
    /// Declared but not simulated: no narrowphase or raycast support
    Heightfield,
}

/// Shape discriminant used for dispatch and reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderKind {
    Box,
    Sphere,
    Capsule,
    Plane,
    Mesh,
    Heightfield,
}

impl ColliderShape {
    pub fn kind(&self) -> ColliderKind {
        match self {
            ColliderShape::Box(_) => ColliderKind::Box,
            ColliderShape::Sphere(_) => ColliderKind::Sphere,
            ColliderShape::Capsule(_) => ColliderKind::Capsule,
            ColliderShape::Plane(_) => ColliderKind::Plane,
            ColliderShape::Mesh => ColliderKind::Mesh,
            ColliderShape::Heightfield => ColliderKind::Heightfield,
        }
    }

    /// Bounding box at the given pose
    pub fn aabb(&self, position: Vec3, rotation: Quat) -> Aabb {
        match self {
            ColliderShape::Box(b) => b.aabb(position, rotation),
            ColliderShape::Sphere(s) => s.aabb(position),
            ColliderShape::Capsule(c) => c.aabb(position, rotation),
            ColliderShape::Plane(_) | ColliderShape::Mesh | ColliderShape::Heightfield => {
                Aabb::infinite()
            }
        }
    }

    /// Diagonal inertia tensor for a body of `mass`
    pub fn compute_inertia(&self, mass: f32) -> Vec3 {
        match self {
            ColliderShape::Box(b) => b.compute_inertia(mass),
            ColliderShape::Sphere(s) => s.compute_inertia(mass),
            ColliderShape::Capsule(c) => c.compute_inertia(mass),
            ColliderShape::Plane(_) | ColliderShape::Mesh | ColliderShape::Heightfield => {
                Vec3::ZERO
            }
        }
    }
}

/// A shape with surface properties, attached to at most one body
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    #[serde(default)]
    pub material: PhysicsMaterial,
    /// Trigger colliders report contacts but are never resolved
    #[serde(default)]
    pub is_trigger: bool,
    #[serde(default)]
    pub filter: CollisionFilter,
    /// Owning body, set by the world on insertion
    #[serde(skip)]
    body: Option<BodyKey>,
}

impl Collider {
    /// Create a collider with default material and filter
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            material: PhysicsMaterial::default(),
            is_trigger: false,
            filter: CollisionFilter::default(),
            body: None,
        }
    }

    /// Box collider with full side lengths `size`
    pub fn cuboid(size: Vec3) -> Self {
        Self::new(ColliderShape::Box(Cuboid::new(size)))
    }

    pub fn sphere(radius: f32) -> Self {
        Self::new(ColliderShape::Sphere(Sphere::new(radius)))
    }

    pub fn capsule(radius: f32, height: f32) -> Self {
        Self::new(ColliderShape::Capsule(Capsule::new(radius, height)))
    }

    pub fn plane(normal: Vec3, distance: f32) -> Self {
        Self::new(ColliderShape::Plane(Plane::new(normal, distance)))
    }

    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.material.friction = friction.max(0.0);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.material.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    pub fn with_trigger(mut self, is_trigger: bool) -> Self {
        self.is_trigger = is_trigger;
        self
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn kind(&self) -> ColliderKind {
        self.shape.kind()
    }

    /// Key of the body owning this collider
    pub fn body(&self) -> Option<BodyKey> {
        self.body
    }

    pub(crate) fn attach(&mut self, key: BodyKey) {
        self.body = Some(key);
    }

    pub fn aabb(&self, position: Vec3, rotation: Quat) -> Aabb {
        self.shape.aabb(position, rotation)
    }

    pub fn compute_inertia(&self, mass: f32) -> Vec3 {
        self.shape.compute_inertia(mass)
    }
}
