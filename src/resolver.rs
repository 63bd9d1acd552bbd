// src/resolver.rs
//! Single-pass impulse resolver.
//!
//! One positional correction plus one normal impulse per contact. There is
//! no iteration, warm starting or friction, so stacks of three or more bodies
//! jitter.

use serde::{Deserialize, Serialize};

use crate::collision::CollisionManifold;
use crate::math::PhysicsVector;
use crate::rigidbody::RigidBody;

/// What the resolver did with a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// Positions corrected and impulse applied.
    Resolved,
    /// Positions corrected; bodies were already moving apart so no impulse.
    Separating,
    /// Both bodies have zero inverse mass. Nothing changed.
    Immovable,
}

/// Mutable view of one side of a contact.
pub struct ContactBody<'a, V: PhysicsVector> {
    pub position: &'a mut V,
    pub body: &'a mut RigidBody<V>,
}

impl<'a, V: PhysicsVector> ContactBody<'a, V> {
    #[inline]
    pub fn new(position: &'a mut V, body: &'a mut RigidBody<V>) -> Self {
        Self { position, body }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolver {
    /// Fraction of the penetration removed per contact, in (0, 1].
    pub bias_factor: f32,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            bias_factor: Self::DEFAULT_BIAS_FACTOR,
        }
    }
}

impl Resolver {
    pub const DEFAULT_BIAS_FACTOR: f32 = 0.8;

    pub fn new(bias_factor: f32) -> Self {
        let bias_factor = if bias_factor.is_finite() && bias_factor > 0.0 {
            bias_factor.min(1.0)
        } else {
            Self::DEFAULT_BIAS_FACTOR
        };
        Self { bias_factor }
    }

    /// Resolve a positive manifold between `a` and `b`.
    ///
    /// The manifold normal points from A to B. A body with zero inverse mass,
    /// or one that is not dynamic, is never moved and never has its velocity
    /// changed.
    pub fn resolve<V: PhysicsVector>(
        &self,
        manifold: &CollisionManifold<V>,
        a: ContactBody<'_, V>,
        b: ContactBody<'_, V>,
    ) -> Resolution {
        let im_a = a.body.effective_inverse_mass();
        let im_b = b.body.effective_inverse_mass();
        let total_inv_mass = im_a + im_b;
        if total_inv_mass <= 0.0 {
            return Resolution::Immovable;
        }

        // Biased correction scaled by 1/Σim, then shared by inverse-mass ratio.
        // Pairs with Σim < 1 are pushed past the contact surface.
        let normal = manifold.normal;
        let correction = normal * (manifold.penetration / total_inv_mass * self.bias_factor);
        *a.position -= correction * (im_a / total_inv_mass);
        *b.position += correction * (im_b / total_inv_mass);

        let relative_velocity = b.body.velocity() - a.body.velocity();
        let v_along_normal = relative_velocity.dot(normal);
        if v_along_normal > 0.0 {
            return Resolution::Separating;
        }

        let e = a.body.restitution.min(b.body.restitution);
        let j = -(1.0 + e) * v_along_normal / total_inv_mass;
        let impulse = normal * j;
        a.body.apply_impulse(-impulse);
        b.body.apply_impulse(impulse);
        Resolution::Resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene2D;
    use glam::{Vec2, Vec3};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn manifold<V: PhysicsVector>(normal: V, penetration: f32) -> CollisionManifold<V> {
        let mut scene = Scene2D::new("ids");
        let a = scene.spawn("a", Vec2::ZERO);
        let b = scene.spawn("b", Vec2::ZERO);
        CollisionManifold {
            collided: true,
            normal,
            penetration,
            a,
            b,
        }
    }

    fn body(mass: f32, velocity: Vec2, restitution: f32) -> RigidBody<Vec2> {
        let mut body = RigidBody::new(Vec2::ZERO, mass);
        body.set_velocity(velocity);
        body.restitution = restitution;
        body
    }

    #[test]
    fn test_elastic_head_on() {
        let (m1, m2, u1, u2) = (1.0, 2.0, 2.0, -1.0);
        let mut a = body(m1, Vec2::new(u1, 0.0), 1.0);
        let mut b = body(m2, Vec2::new(u2, 0.0), 1.0);
        let (mut pa, mut pb) = (Vec2::ZERO, Vec2::new(1.9, 0.0));

        let out = Resolver::default().resolve(
            &manifold(Vec2::X, 0.1),
            ContactBody::new(&mut pa, &mut a),
            ContactBody::new(&mut pb, &mut b),
        );
        assert_eq!(out, Resolution::Resolved);

        let v1 = ((m1 - m2) * u1 + 2.0 * m2 * u2) / (m1 + m2);
        let v2 = ((m2 - m1) * u2 + 2.0 * m1 * u1) / (m1 + m2);
        assert!(approx(a.velocity().x, v1), "{} vs {}", a.velocity().x, v1);
        assert!(approx(b.velocity().x, v2), "{} vs {}", b.velocity().x, v2);
        assert!(approx(v1, -2.0) && approx(v2, 1.0));
    }

    #[test]
    fn test_positional_correction_split_by_inverse_mass() {
        let mut a = body(1.0, Vec2::ZERO, 0.0);
        let mut b = body(3.0, Vec2::ZERO, 0.0);
        let (mut pa, mut pb) = (Vec2::ZERO, Vec2::ZERO);
        Resolver::new(0.8).resolve(
            &manifold(Vec2::Y, 1.0),
            ContactBody::new(&mut pa, &mut a),
            ContactBody::new(&mut pb, &mut b),
        );
        // Σim = 4/3, correction = 1 / (4/3) * 0.8 = 0.6; A takes 3/4 of it.
        assert!(approx(pa.y, -0.45));
        assert!(approx(pb.y, 0.15));
        assert!(approx(pb.y - pa.y, 0.6));
    }

    #[test]
    fn test_correction_divides_by_total_inverse_mass() {
        let mut a = body(1.0, Vec2::ZERO, 0.0);
        let mut b = body(2.0, Vec2::ZERO, 0.0);
        let (mut pa, mut pb) = (Vec2::ZERO, Vec2::new(1.9, 0.0));
        Resolver::default().resolve(
            &manifold(Vec2::X, 0.1),
            ContactBody::new(&mut pa, &mut a),
            ContactBody::new(&mut pb, &mut b),
        );
        // Σim = 1.5: correction = 0.1 / 1.5 * 0.8, split 2/3 to A and 1/3 to B.
        let correction = 0.1 / 1.5 * 0.8;
        assert!(approx(pa.x, -correction * (2.0 / 3.0)), "{}", pa.x);
        assert!(approx(pb.x, 1.9 + correction / 3.0), "{}", pb.x);
        assert!(approx(pa.x, -0.035_555_56));
        assert!(approx(pb.x, 1.917_777_8));
    }

    #[test]
    fn test_immovable_pair_is_noop() {
        let mut a = RigidBody::<Vec3>::new_static(Vec3::ZERO);
        let mut b = RigidBody::<Vec3>::new(Vec3::ZERO, 0.0);
        b.set_velocity(Vec3::new(0.0, -4.0, 0.0));
        let (mut pa, mut pb) = (Vec3::ZERO, Vec3::ONE);
        let out = Resolver::default().resolve(
            &manifold(Vec3::Y, 0.5),
            ContactBody::new(&mut pa, &mut a),
            ContactBody::new(&mut pb, &mut b),
        );
        assert_eq!(out, Resolution::Immovable);
        assert_eq!((pa, pb), (Vec3::ZERO, Vec3::ONE));
        assert_eq!(b.velocity(), Vec3::new(0.0, -4.0, 0.0));
    }

    #[test]
    fn test_static_side_never_moves() {
        let mut floor = RigidBody::<Vec2>::new_static(Vec2::ZERO);
        floor.restitution = 1.0;
        let mut ball = body(2.0, Vec2::new(0.0, 10.0), 0.5);
        // y-down world: ball above floor falls toward +y, normal from ball to floor.
        let (mut p_ball, mut p_floor) = (Vec2::new(0.0, -0.9), Vec2::ZERO);
        let out = Resolver::default().resolve(
            &manifold(Vec2::Y, 0.1),
            ContactBody::new(&mut p_ball, &mut ball),
            ContactBody::new(&mut p_floor, &mut floor),
        );
        assert_eq!(out, Resolution::Resolved);
        assert_eq!(p_floor, Vec2::ZERO);
        assert_eq!(floor.velocity(), Vec2::ZERO);
        // Σim = 0.5, so the ball moves 0.1 / 0.5 * 0.8 = 0.16.
        assert!(approx(p_ball.y, -0.9 - 0.16));
        assert!(approx(ball.velocity().y, -5.0));
    }

    #[test]
    fn test_separating_skips_impulse() {
        let mut a = body(1.0, Vec2::new(-1.0, 0.0), 1.0);
        let mut b = body(1.0, Vec2::new(1.0, 0.0), 1.0);
        let (mut pa, mut pb) = (Vec2::ZERO, Vec2::new(1.0, 0.0));
        let out = Resolver::default().resolve(
            &manifold(Vec2::X, 0.5),
            ContactBody::new(&mut pa, &mut a),
            ContactBody::new(&mut pb, &mut b),
        );
        assert_eq!(out, Resolution::Separating);
        assert_eq!(a.velocity(), Vec2::new(-1.0, 0.0));
        assert_eq!(b.velocity(), Vec2::new(1.0, 0.0));
        assert!(pa.x < 0.0 && pb.x > 1.0);
    }

    #[test]
    fn test_normal_energy_does_not_increase() {
        let cases = [
            (1.0, 2.0, 3.0, -1.0, 1.0),
            (5.0, 0.5, 1.0, 0.0, 0.3),
            (2.0, 2.0, 0.5, -4.0, 0.0),
            (0.1, 10.0, 7.0, 6.9, 0.9),
        ];
        for (m1, m2, u1, u2, e) in cases {
            let mut a = body(m1, Vec2::new(u1, 0.7), e);
            let mut b = body(m2, Vec2::new(u2, -0.2), e);
            let before = 0.5 * m1 * u1 * u1 + 0.5 * m2 * u2 * u2;
            let (mut pa, mut pb) = (Vec2::ZERO, Vec2::X);
            Resolver::default().resolve(
                &manifold(Vec2::X, 0.05),
                ContactBody::new(&mut pa, &mut a),
                ContactBody::new(&mut pb, &mut b),
            );
            let va = a.velocity().x;
            let vb = b.velocity().x;
            let after = 0.5 * m1 * va * va + 0.5 * m2 * vb * vb;
            assert!(after <= before + 1e-4, "energy grew: {before} -> {after}");
            // Tangential velocity is untouched.
            assert_eq!(a.velocity().y, 0.7);
        }
    }
}
