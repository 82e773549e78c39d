//! Impulse-based contact resolution
//!
//! Each [`ContactConstraint`] wraps one non-trigger [`CollisionInfo`] and is
//! solved once per velocity iteration. A pass applies a normal impulse with
//! restitution, a Coulomb-clamped friction impulse, and a Baumgarte-style
//! positional correction that moves bodies directly.

use rigid3d_math::Vec3;

use crate::body::RigidBody;
use crate::collision::CollisionInfo;
use crate::shapes::Collider;

/// Penetration tolerated without positional correction
pub const PENETRATION_SLOP: f32 = 0.01;

/// Fraction of the remaining penetration removed per pass
pub const CORRECTION_PERCENT: f32 = 0.8;

/// Tangential speed below which friction is skipped
const TANGENT_EPSILON: f32 = 1e-4;

/// Inverse mass properties a body presents to the solver
///
/// Sleeping bodies act as immovable, and fixed-rotation bodies as
/// infinitely stiff against spin.
#[derive(Clone, Copy, Debug)]
struct Response {
    inverse_mass: f32,
    inverse_inertia: Vec3,
}

impl Response {
    fn of(body: &RigidBody) -> Self {
        if body.is_sleeping() {
            return Self {
                inverse_mass: 0.0,
                inverse_inertia: Vec3::ZERO,
            };
        }
        Self {
            inverse_mass: body.inverse_mass(),
            inverse_inertia: if body.is_fixed_rotation() {
                Vec3::ZERO
            } else {
                body.inverse_inertia()
            },
        }
    }

    /// Inverse effective mass along `dir` for an impulse at offset `r`
    fn angular_term(&self, r: Vec3, dir: Vec3) -> f32 {
        let r_cross = r.cross(dir);
        r_cross.dot(self.inverse_inertia.component_mul(r_cross))
    }

    fn apply(&self, body: &mut RigidBody, impulse: Vec3, r: Vec3) {
        body.linear_velocity += impulse * self.inverse_mass;
        body.angular_velocity += self.inverse_inertia.component_mul(r.cross(impulse));
    }
}

/// Velocity of the material point at offset `r` from the body center
fn point_velocity(body: &RigidBody, r: Vec3) -> Vec3 {
    body.linear_velocity + body.angular_velocity.cross(r)
}

/// A contact to be solved between two bodies
#[derive(Clone, Debug)]
pub struct ContactConstraint {
    info: CollisionInfo,
    friction: f32,
    restitution: f32,
    /// Positional correction already applied along the normal
    corrected: f32,
}

impl ContactConstraint {
    /// Combine the colliders' materials for this contact
    pub fn new(info: CollisionInfo, collider_a: &Collider, collider_b: &Collider) -> Self {
        let material = collider_a.material.combine(&collider_b.material);
        Self {
            info,
            friction: material.friction,
            restitution: material.restitution,
            corrected: 0.0,
        }
    }

    pub fn info(&self) -> &CollisionInfo {
        &self.info
    }

    pub fn into_info(self) -> CollisionInfo {
        self.info
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Run one solver pass on the two bodies of this contact
    ///
    /// `a` and `b` must be the bodies named by `body_a` and `body_b`.
    pub fn resolve(&mut self, a: &mut RigidBody, b: &mut RigidBody) {
        let resp_a = Response::of(a);
        let resp_b = Response::of(b);
        let inv_mass_sum = resp_a.inverse_mass + resp_b.inverse_mass;
        if inv_mass_sum == 0.0 {
            return;
        }

        let n = self.info.normal;
        let point = self.info.point;
        let ra = point - a.position;
        let rb = point - b.position;

        let relative = point_velocity(b, rb) - point_velocity(a, ra);
        let vn = relative.dot(n);
        if vn > 0.0 {
            return;
        }

        // Normal impulse
        let k_normal = inv_mass_sum + resp_a.angular_term(ra, n) + resp_b.angular_term(rb, n);
        let j = -(1.0 + self.restitution) * vn / k_normal;
        let impulse = n * j;
        resp_a.apply(a, -impulse, ra);
        resp_b.apply(b, impulse, rb);
        self.info.impulse += j;

        // Friction against the post-impulse sliding velocity
        let relative = point_velocity(b, rb) - point_velocity(a, ra);
        let tangent_vel = relative - n * relative.dot(n);
        let tangent_speed = tangent_vel.length();
        if tangent_speed > TANGENT_EPSILON && self.friction > 0.0 {
            let t = tangent_vel / tangent_speed;
            let k_tangent = inv_mass_sum + resp_a.angular_term(ra, t) + resp_b.angular_term(rb, t);
            let jt = (-tangent_speed / k_tangent).max(-self.friction * j);
            let friction_impulse = t * jt;
            resp_a.apply(a, -friction_impulse, ra);
            resp_b.apply(b, friction_impulse, rb);
        }

        // Positional correction on what is left of the penetration
        let remaining = self.info.penetration - self.corrected;
        let amount = (remaining - PENETRATION_SLOP).max(0.0) * CORRECTION_PERCENT / inv_mass_sum;
        if amount > 0.0 {
            a.position -= n * (amount * resp_a.inverse_mass);
            b.position += n * (amount * resp_b.inverse_mass);
            self.corrected += amount * inv_mass_sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyDesc, BodyKey};
    use crate::collision::detect;
    use crate::material::PhysicsMaterial;
    use slotmap::SlotMap;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.0001
    }

    struct Pair {
        bodies: SlotMap<BodyKey, RigidBody>,
        a: BodyKey,
        b: BodyKey,
    }

    impl Pair {
        fn new(a: BodyDesc, b: BodyDesc) -> Self {
            let mut bodies: SlotMap<BodyKey, RigidBody> = SlotMap::with_key();
            let a = bodies.insert_with_key(|k| a.build(k));
            let b = bodies.insert_with_key(|k| b.build(k));
            Self { bodies, a, b }
        }

        fn constraint(&self) -> ContactConstraint {
            let (a, b) = (&self.bodies[self.a], &self.bodies[self.b]);
            let info = detect(a, b).expect("bodies should overlap");
            ContactConstraint::new(info, a.collider().unwrap(), b.collider().unwrap())
        }

        fn resolve(&mut self, constraint: &mut ContactConstraint) {
            let [a, b] = self.bodies.get_disjoint_mut([self.a, self.b]).unwrap();
            constraint.resolve(a, b);
        }

        fn momentum(&self) -> Vec3 {
            let a = &self.bodies[self.a];
            let b = &self.bodies[self.b];
            a.linear_velocity * a.mass() + b.linear_velocity * b.mass()
        }
    }

    fn ball(x: f32, vx: f32, mass: f32) -> BodyDesc {
        BodyDesc::dynamic(Vec3::new(x, 0.0, 0.0))
            .with_mass(mass)
            .with_linear_velocity(Vec3::new(vx, 0.0, 0.0))
            .with_collider(Collider::sphere(1.0).with_restitution(0.5).with_friction(0.0))
    }

    #[test]
    fn test_materials_combine() {
        let a = Collider::sphere(1.0).with_material(PhysicsMaterial::ICE);
        let b = Collider::sphere(1.0).with_material(PhysicsMaterial::RUBBER);
        let pair = Pair::new(
            BodyDesc::dynamic(Vec3::ZERO).with_collider(a),
            BodyDesc::dynamic(Vec3::X).with_collider(b),
        );
        let c = pair.constraint();
        assert!(approx(c.friction(), (0.05_f32 * 0.9).sqrt()));
        assert_eq!(c.restitution(), 0.8);
    }

    #[test]
    fn test_head_on_conserves_momentum() {
        let mut pair = Pair::new(ball(0.0, 2.0, 1.0), ball(1.9, -1.0, 3.0));
        let before = pair.momentum();
        let mut c = pair.constraint();
        pair.resolve(&mut c);
        let after = pair.momentum();

        assert!(approx(before.x, after.x));
        assert!(c.info().impulse > 0.0);

        // Bodies now separate along the normal
        let va = pair.bodies[pair.a].linear_velocity.x;
        let vb = pair.bodies[pair.b].linear_velocity.x;
        assert!(vb > va);
    }

    #[test]
    fn test_restitution_sets_separation_speed() {
        let mut pair = Pair::new(ball(0.0, 1.0, 1.0), ball(1.9, -1.0, 1.0));
        let mut c = pair.constraint();
        pair.resolve(&mut c);

        let va = pair.bodies[pair.a].linear_velocity.x;
        let vb = pair.bodies[pair.b].linear_velocity.x;
        // Approach speed 2, restitution 0.5
        assert!(approx(vb - va, 1.0));
    }

    #[test]
    fn test_separating_contact_is_skipped() {
        let mut pair = Pair::new(ball(0.0, -1.0, 1.0), ball(1.9, 1.0, 1.0));
        let mut c = pair.constraint();
        pair.resolve(&mut c);
        assert_eq!(pair.bodies[pair.a].linear_velocity.x, -1.0);
        assert_eq!(pair.bodies[pair.a].position, Vec3::ZERO);
        assert_eq!(c.info().impulse, 0.0);
    }

    #[test]
    fn test_energy_does_not_increase() {
        let mut pair = Pair::new(ball(0.0, 3.0, 2.0), ball(1.5, -0.5, 1.0));
        let energy = |p: &Pair| p.bodies[p.a].kinetic_energy() + p.bodies[p.b].kinetic_energy();
        let before = energy(&pair);
        let mut c = pair.constraint();
        for _ in 0..8 {
            pair.resolve(&mut c);
        }
        assert!(energy(&pair) <= before + 0.0001);
    }

    #[test]
    fn test_static_body_is_never_moved() {
        let mut pair = Pair::new(
            BodyDesc::new_static(Vec3::ZERO).with_collider(Collider::plane(Vec3::Y, 0.0)),
            BodyDesc::dynamic(Vec3::new(0.0, 0.5, 0.0))
                .with_linear_velocity(Vec3::new(0.0, -3.0, 0.0))
                .with_collider(Collider::sphere(1.0)),
        );
        let mut c = pair.constraint();
        for _ in 0..8 {
            pair.resolve(&mut c);
        }
        let floor = &pair.bodies[pair.a];
        assert_eq!(floor.position, Vec3::ZERO);
        assert_eq!(floor.linear_velocity, Vec3::ZERO);
        assert!(pair.bodies[pair.b].linear_velocity.y >= 0.0);
        assert!(pair.bodies[pair.b].position.y > 0.5);
    }

    #[test]
    fn test_positional_correction_converges_without_overshoot() {
        let mut pair = Pair::new(ball(0.0, 0.0, 1.0), ball(1.0, 0.0, 1.0));
        let mut c = pair.constraint();
        for _ in 0..8 {
            pair.resolve(&mut c);
        }
        let distance = pair.bodies[pair.a].position.distance(pair.bodies[pair.b].position);
        assert!(distance >= 2.0 - PENETRATION_SLOP - 0.001);
        assert!(distance <= 2.0);
    }

    #[test]
    fn test_friction_slows_sliding() {
        let mut pair = Pair::new(
            BodyDesc::new_static(Vec3::ZERO).with_collider(Collider::plane(Vec3::Y, 0.0)),
            BodyDesc::dynamic(Vec3::new(0.0, 0.45, 0.0))
                .with_fixed_rotation(true)
                .with_linear_velocity(Vec3::new(5.0, -1.0, 0.0))
                .with_collider(Collider::cuboid(Vec3::ONE).with_friction(1.0).with_restitution(0.0)),
        );
        let mut c = pair.constraint();
        pair.resolve(&mut c);

        let v = pair.bodies[pair.b].linear_velocity;
        // Floor restitution 0.3 wins; friction is capped at mu * 1.3
        assert!(v.x < 5.0);
        assert!(v.x > 0.0);
        assert!(approx(v.y, 0.3));
    }

    #[test]
    fn test_sleeping_body_acts_immovable() {
        let mut pair = Pair::new(ball(0.0, 0.0, 1.0), ball(1.9, -1.0, 1.0));
        pair.bodies[pair.a].sleep();
        let mut c = pair.constraint();
        pair.resolve(&mut c);
        assert_eq!(pair.bodies[pair.a].linear_velocity, Vec3::ZERO);
        assert!(pair.bodies[pair.a].is_sleeping());
        assert!(pair.bodies[pair.b].linear_velocity.x > 0.0);
    }

    #[test]
    fn test_two_immovable_bodies_are_skipped() {
        let mut pair = Pair::new(
            BodyDesc::kinematic(Vec3::ZERO).with_collider(Collider::sphere(1.0)),
            BodyDesc::new_static(Vec3::X).with_collider(Collider::sphere(1.0)),
        );
        let mut c = pair.constraint();
        pair.resolve(&mut c);
        assert_eq!(pair.bodies[pair.a].position, Vec3::ZERO);
        assert_eq!(c.info().impulse, 0.0);
    }
}
