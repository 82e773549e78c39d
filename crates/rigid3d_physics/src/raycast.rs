//! Ray queries against colliders
//!
//! Spheres, boxes and planes can be hit. Capsules, meshes and heightfields
//! are never reported. A ray starting inside a sphere or box hits where it
//! leaves the shape.

use rigid3d_math::Vec3;

use crate::body::{BodyKey, RigidBody};
use crate::shapes::{Aabb, ColliderShape, Plane};

/// Tolerance for parallel rays and face classification
const RAY_EPSILON: f32 = 1e-4;

/// A half-line with a unit direction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Create a ray; `None` if `direction` has zero length
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.normalized();
        if direction == Vec3::ZERO {
            return None;
        }
        Some(Self { origin, direction })
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Closest intersection of a ray with a body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    pub body: BodyKey,
    pub point: Vec3,
    /// Surface normal at the hit point
    pub normal: Vec3,
    /// Distance along the ray
    pub distance: f32,
}

/// Distance and normal of a ray hit on a sphere
pub fn ray_vs_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let t = if -b - root >= 0.0 {
        -b - root
    } else if -b + root >= 0.0 {
        -b + root
    } else {
        return None;
    };

    let normal = (ray.point_at(t) - center).normalized();
    Some((t, normal))
}

/// Distance and face normal of a ray hit on an axis-aligned box (slab test)
pub fn ray_vs_aabb(ray: &Ray, aabb: &Aabb) -> Option<(f32, Vec3)> {
    let origin = ray.origin.to_array();
    let dir = ray.direction.to_array();
    let min = aabb.min.to_array();
    let max = aabb.max.to_array();

    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        if dir[axis].abs() < RAY_EPSILON {
            if origin[axis] < min[axis] || origin[axis] > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / dir[axis];
        let mut t1 = (min[axis] - origin[axis]) * inv;
        let mut t2 = (max[axis] - origin[axis]) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_near = t_near.max(t1);
        t_far = t_far.min(t2);
        if t_near > t_far {
            return None;
        }
    }

    if t_far < 0.0 {
        return None;
    }
    let t = if t_near >= 0.0 { t_near } else { t_far };
    Some((t, face_normal(aabb, ray.point_at(t))))
}

/// Normal of the box face a surface point lies on (x, then y, then z; min before max)
fn face_normal(aabb: &Aabb, point: Vec3) -> Vec3 {
    let faces = [
        (point.x - aabb.min.x, -Vec3::X),
        (point.x - aabb.max.x, Vec3::X),
        (point.y - aabb.min.y, -Vec3::Y),
        (point.y - aabb.max.y, Vec3::Y),
        (point.z - aabb.min.z, -Vec3::Z),
    ];
    faces
        .iter()
        .find(|(gap, _)| gap.abs() < RAY_EPSILON)
        .map(|&(_, normal)| normal)
        .unwrap_or(Vec3::Z)
}

/// Distance of a ray hit on a plane; the normal is the plane normal
pub fn ray_vs_plane(ray: &Ray, plane: &Plane) -> Option<(f32, Vec3)> {
    let denom = plane.normal.dot(ray.direction);
    if denom.abs() < RAY_EPSILON {
        return None;
    }

    let t = (plane.distance - plane.normal.dot(ray.origin)) / denom;
    if t < 0.0 {
        return None;
    }
    Some((t, plane.normal))
}

/// Intersect a ray with the collider of one body
pub fn raycast_body(ray: &Ray, body: &RigidBody) -> Option<RaycastHit> {
    let collider = body.collider()?;

    let (distance, normal) = match &collider.shape {
        ColliderShape::Sphere(s) => ray_vs_sphere(ray, body.position, s.radius),
        ColliderShape::Box(b) => ray_vs_aabb(ray, &b.world_bounds(body.position)),
        ColliderShape::Plane(p) => ray_vs_plane(ray, p),
        ColliderShape::Capsule(_) | ColliderShape::Mesh | ColliderShape::Heightfield => None,
    }?;

    Some(RaycastHit {
        body: body.key(),
        point: ray.point_at(distance),
        normal,
        distance,
    })
}
