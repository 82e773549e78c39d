//! Narrowphase collision detection and collision filtering
//!
//! Shape-pair tests produce a [`Contact`] whose normal points from the first
//! shape toward the second. [`detect`] dispatches on the collider kinds of two
//! bodies and wraps the result into a [`CollisionInfo`].
//!
//! Boxes are tested as axis-aligned boxes around the body position; their
//! rotation only affects broadphase bounds.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::body::{BodyKey, RigidBody};
use crate::shapes::{Aabb, ColliderShape, Plane};
use rigid3d_math::Vec3;

bitflags! {
    /// Collision layers for filtering which colliders can touch
    ///
    /// Each layer is a bit in a 32-bit mask. A collider can belong to several
    /// layers and lists the layers it collides with in its filter mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayer: u32 {
        /// Default layer for most objects
        const DEFAULT = 1 << 0;
        /// Static level geometry (floors, walls)
        const STATIC = 1 << 1;
        /// Player or NPC characters
        const CHARACTER = 1 << 2;
        /// Props pushed around by characters
        const PROP = 1 << 3;
        /// Trigger volumes (detect but don't push)
        const TRIGGER = 1 << 4;
        /// Fast-moving projectiles
        const PROJECTILE = 1 << 5;
        /// Small cosmetic pieces
        const DEBRIS = 1 << 6;
        /// All layers
        const ALL = 0xFFFFFFFF;
    }
}

/// Collision filter determining what a collider touches
///
/// Two colliders A and B are tested if `(A.layer & B.mask) != 0` and
/// `(B.layer & A.mask) != 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    /// Which layer(s) this collider belongs to
    pub layer: CollisionLayer,
    /// Which layer(s) this collider can collide with
    pub mask: CollisionLayer,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            layer: CollisionLayer::DEFAULT,
            mask: CollisionLayer::ALL,
        }
    }
}

impl CollisionFilter {
    pub fn new(layer: CollisionLayer, mask: CollisionLayer) -> Self {
        Self { layer, mask }
    }

    /// Check if both filters accept each other
    pub fn collides_with(&self, other: &Self) -> bool {
        self.layer.intersects(other.mask) && other.layer.intersects(self.mask)
    }

    /// Static level geometry, touched by everything
    pub fn static_world() -> Self {
        Self {
            layer: CollisionLayer::STATIC,
            mask: CollisionLayer::ALL,
        }
    }

    /// Characters ignore each other
    pub fn character() -> Self {
        Self {
            layer: CollisionLayer::CHARACTER,
            mask: CollisionLayer::ALL & !CollisionLayer::CHARACTER,
        }
    }

    /// A trigger volume that only reports the given layers
    pub fn trigger(detects: CollisionLayer) -> Self {
        Self {
            layer: CollisionLayer::TRIGGER,
            mask: detects,
        }
    }

    /// Projectiles hit characters, props and the level, but not triggers,
    /// debris, or other projectiles
    pub fn projectile() -> Self {
        Self {
            layer: CollisionLayer::PROJECTILE,
            mask: CollisionLayer::STATIC | CollisionLayer::CHARACTER | CollisionLayer::PROP,
        }
    }

    /// Debris only settles on static geometry
    pub fn debris() -> Self {
        Self {
            layer: CollisionLayer::DEBRIS,
            mask: CollisionLayer::STATIC,
        }
    }
}

/// Contact between two shapes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Point of contact in world space
    pub point: Vec3,
    /// Unit normal pointing from the first shape toward the second
    pub normal: Vec3,
    /// Penetration depth (positive means overlapping)
    pub penetration: f32,
}

impl Contact {
    pub fn new(point: Vec3, normal: Vec3, penetration: f32) -> Self {
        Self {
            point,
            normal,
            penetration,
        }
    }

    /// The same contact seen from the other shape
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// A resolved or trigger contact between two bodies, rebuilt every sub-step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionInfo {
    pub body_a: BodyKey,
    pub body_b: BodyKey,
    /// Contact point in world space
    pub point: Vec3,
    /// Unit normal pointing from `body_a` toward `body_b`
    pub normal: Vec3,
    pub penetration: f32,
    /// Accumulated normal impulse applied by the solver (zero for triggers
    /// and for contacts between two immovable bodies)
    pub impulse: f32,
}

impl CollisionInfo {
    pub fn new(body_a: BodyKey, body_b: BodyKey, contact: Contact) -> Self {
        Self {
            body_a,
            body_b,
            point: contact.point,
            normal: contact.normal,
            penetration: contact.penetration,
            impulse: 0.0,
        }
    }

    /// Whether `key` is one of the two bodies
    pub fn involves(&self, key: BodyKey) -> bool {
        self.body_a == key || self.body_b == key
    }

    /// The body paired with `key`, if `key` is part of this contact
    pub fn other(&self, key: BodyKey) -> Option<BodyKey> {
        if self.body_a == key {
            Some(self.body_b)
        } else if self.body_b == key {
            Some(self.body_a)
        } else {
            None
        }
    }
}

/// Test sphere vs sphere collision
///
/// Coincident centers resolve along +Y.
pub fn sphere_vs_sphere(center_a: Vec3, radius_a: f32, center_b: Vec3, radius_b: f32) -> Option<Contact> {
    let delta = center_b - center_a;
    let dist_sq = delta.length_squared();
    let radius_sum = radius_a + radius_b;

    if dist_sq >= radius_sum * radius_sum {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 0.0 { delta / dist } else { Vec3::Y };
    let point = center_a + normal * radius_a;

    Some(Contact::new(point, normal, radius_sum - dist))
}

/// Test sphere vs plane collision
///
/// The sphere is the first shape, so the normal is the plane normal reversed.
/// The contact point is the sphere center projected onto the plane.
pub fn sphere_vs_plane(center: Vec3, radius: f32, plane: &Plane) -> Option<Contact> {
    let signed_dist = plane.signed_distance(center);

    if signed_dist >= radius {
        return None;
    }

    let point = center - plane.normal * signed_dist;
    Some(Contact::new(point, -plane.normal, radius - signed_dist))
}

/// Test box vs plane collision
///
/// Penetration is measured at the box vertex deepest below the plane. The
/// contact point sits at that depth directly beneath the box center (the
/// middle of the bottom face for an axis-aligned plane), so the normal
/// impulse never spins the box.
pub fn aabb_vs_plane(aabb: &Aabb, plane: &Plane) -> Option<Contact> {
    let center = aabb.center();
    let reach = aabb.half_extents().dot(plane.normal.abs());
    let signed_dist = plane.signed_distance(center) - reach;

    if signed_dist >= 0.0 {
        return None;
    }

    let point = center - plane.normal * reach;
    Some(Contact::new(point, -plane.normal, -signed_dist))
}

/// Test box vs sphere collision
///
/// The normal points from the box toward the sphere center, or +Y when the
/// center is inside the box.
pub fn aabb_vs_sphere(aabb: &Aabb, center: Vec3, radius: f32) -> Option<Contact> {
    let closest = aabb.closest_point(center);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq >= radius * radius {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 0.0 { delta / dist } else { Vec3::Y };

    Some(Contact::new(closest, normal, radius - dist))
}

/// Test box vs box collision
///
/// Separates along the axis of least overlap (ties favour x, then y, then z).
/// The contact point is the center of the overlap region.
pub fn aabb_vs_aabb(a: &Aabb, b: &Aabb) -> Option<Contact> {
    if !a.overlaps(b) {
        return None;
    }

    let overlap_min = a.min.max_components(b.min);
    let overlap_max = a.max.min_components(b.max);
    let overlap = overlap_max - overlap_min;
    let (ca, cb) = (a.center(), b.center());

    let toward = |a: f32, b: f32, axis: Vec3| if a < b { axis } else { -axis };

    let mut penetration = overlap.x;
    let mut normal = toward(ca.x, cb.x, Vec3::X);

    if overlap.y < penetration {
        penetration = overlap.y;
        normal = toward(ca.y, cb.y, Vec3::Y);
    }
    if overlap.z < penetration {
        penetration = overlap.z;
        normal = toward(ca.z, cb.z, Vec3::Z);
    }

    let point = (overlap_min + overlap_max) * 0.5;
    Some(Contact::new(point, normal, penetration))
}

/// Narrowphase test between the colliders of two bodies
///
/// Returns `None` when either body has no attached collider or the shape
/// pair is unsupported (capsules, meshes, heightfields, plane vs plane).
pub fn detect(a: &RigidBody, b: &RigidBody) -> Option<CollisionInfo> {
    let collider_a = a.collider()?;
    let collider_b = b.collider()?;
    let key_a = collider_a.body()?;
    let key_b = collider_b.body()?;

    let contact = shape_contact(&collider_a.shape, a.position, &collider_b.shape, b.position)?;
    Some(CollisionInfo::new(key_a, key_b, contact))
}

fn shape_contact(a: &ColliderShape, pos_a: Vec3, b: &ColliderShape, pos_b: Vec3) -> Option<Contact> {
    use ColliderShape::*;

    match (a, b) {
        (Sphere(sa), Sphere(sb)) => sphere_vs_sphere(pos_a, sa.radius, pos_b, sb.radius),
        (Sphere(s), Plane(p)) => sphere_vs_plane(pos_a, s.radius, p),
        (Plane(p), Sphere(s)) => {
            sphere_vs_plane(pos_b, s.radius, p).map(Contact::flipped)
        }
        (Box(ba), Box(bb)) => aabb_vs_aabb(&ba.world_bounds(pos_a), &bb.world_bounds(pos_b)),
        (Box(bx), Sphere(s)) => aabb_vs_sphere(&bx.world_bounds(pos_a), pos_b, s.radius),
        (Sphere(s), Box(bx)) => {
            aabb_vs_sphere(&bx.world_bounds(pos_b), pos_a, s.radius).map(Contact::flipped)
        }
        (Box(bx), Plane(p)) => aabb_vs_plane(&bx.world_bounds(pos_a), p),
        (Plane(p), Box(bx)) => {
            aabb_vs_plane(&bx.world_bounds(pos_b), p).map(Contact::flipped)
        }
        _ => None,
    }
}
