// src/rigidbody.rs
//! Per-entity dynamics state.

use crate::collider::Collider;
use crate::components::RigidBodyDesc;
use crate::math::PhysicsVector;

/// Defines how a body reacts to physics forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Affected by gravity, forces and integration.
    Dynamic,
    /// Never integrated and never pushed by contacts, whatever its mass.
    Static,
}

/// Dynamics state owned by the physics world, one per simulated entity.
///
/// `inverse_mass` is derived from `mass` and kept private so the two can never
/// disagree: a body with zero mass has zero inverse mass and is immovable.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody<V: PhysicsVector> {
    mass: f32,
    inverse_mass: f32,
    inverse_inertia: V::Angular,

    /// Position written back at the end of the last step. The entity
    /// transform stays authoritative.
    position: V,
    velocity: V,
    angular_velocity: V::Angular,

    force_accumulator: V,
    torque_accumulator: V::Angular,

    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    body_type: BodyType,
    is_grounded: bool,
}

impl<V: PhysicsVector> RigidBody<V> {
    /// A dynamic body at rest with default material properties.
    pub fn new(position: V, mass: f32) -> Self {
        let mass = if mass.is_finite() { mass.max(0.0) } else { 0.0 };
        Self {
            mass,
            inverse_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            inverse_inertia: if mass > 0.0 { V::angular_splat(1.0) } else { V::angular_splat(0.0) },
            position,
            velocity: V::zero(),
            angular_velocity: V::Angular::default(),
            force_accumulator: V::zero(),
            torque_accumulator: V::Angular::default(),
            linear_damping: RigidBodyDesc::<V>::DEFAULT_LINEAR_DAMPING,
            angular_damping: RigidBodyDesc::<V>::DEFAULT_ANGULAR_DAMPING,
            restitution: RigidBodyDesc::<V>::DEFAULT_RESTITUTION,
            body_type: BodyType::Dynamic,
            is_grounded: false,
        }
    }

    /// An immovable body (zero mass, never integrated).
    pub fn new_static(position: V) -> Self {
        let mut body = Self::new(position, 0.0);
        body.body_type = BodyType::Static;
        body
    }

    /// Build a body from its declared component fields, seeded at the
    /// entity's current position. When the entity also carries a box
    /// collider, rotational inertia is derived from the box.
    pub fn from_desc(desc: &RigidBodyDesc<V>, position: V, collider: Option<&Collider<V>>) -> Self {
        let mut body = Self::new(position, desc.mass);
        body.velocity = desc.initial_velocity;
        body.angular_velocity = desc.initial_angular_velocity;
        body.restitution = desc.restitution.clamp(0.0, 1.0);
        body.linear_damping = clamp_damping(desc.linear_damping);
        body.angular_damping = clamp_damping(desc.angular_damping);
        body.body_type = if desc.is_dynamic { BodyType::Dynamic } else { BodyType::Static };
        if let Some(collider) = collider {
            body.inverse_inertia = V::box_inverse_inertia(body.mass, collider.half_extents());
        }
        body
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Inverse mass as seen by contacts and impulses: zero for bodies that
    /// are not dynamic, whatever their mass.
    #[inline]
    pub fn effective_inverse_mass(&self) -> f32 {
        if self.is_dynamic() {
            self.inverse_mass
        } else {
            0.0
        }
    }

    #[inline]
    pub fn inverse_inertia(&self) -> V::Angular {
        self.inverse_inertia
    }

    #[inline]
    pub fn position(&self) -> V {
        self.position
    }

    #[inline]
    pub(crate) fn set_position(&mut self, position: V) {
        self.position = position;
    }

    #[inline]
    pub fn velocity(&self) -> V {
        self.velocity
    }

    #[inline]
    pub fn set_velocity(&mut self, velocity: V) {
        self.velocity = velocity;
    }

    #[inline]
    pub fn angular_velocity(&self) -> V::Angular {
        self.angular_velocity
    }

    #[inline]
    pub fn set_angular_velocity(&mut self, angular_velocity: V::Angular) {
        self.angular_velocity = angular_velocity;
    }

    #[inline]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// True when the body touched ground (or rested on another body) during
    /// the last step. Gameplay code gates jumps on this.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.is_grounded
    }

    #[inline]
    pub(crate) fn set_grounded(&mut self, grounded: bool) {
        self.is_grounded = grounded;
    }

    #[inline]
    pub fn force_accumulator(&self) -> V {
        self.force_accumulator
    }

    #[inline]
    pub fn torque_accumulator(&self) -> V::Angular {
        self.torque_accumulator
    }

    /// Accumulate a force for the current step. Ignored by non-dynamic bodies.
    pub fn add_force(&mut self, force: V) {
        if self.is_dynamic() {
            self.force_accumulator += force;
        }
    }

    /// Accumulate a force applied at world-space `point`.
    ///
    /// The lever arm is measured from the position the last step wrote back,
    /// so an off-center push adds `(point - position) × force` of torque.
    pub fn add_force_at_point(&mut self, force: V, point: V) {
        if self.is_dynamic() {
            self.force_accumulator += force;
            self.torque_accumulator += (point - self.position).torque_cross(force);
        }
    }

    /// Accumulate a torque for the current step. Ignored by non-dynamic bodies.
    pub fn add_torque(&mut self, torque: V::Angular) {
        if self.is_dynamic() {
            self.torque_accumulator += torque;
        }
    }

    /// Instant velocity change. No effect on immovable or non-dynamic bodies.
    pub fn apply_impulse(&mut self, impulse: V) {
        self.velocity += impulse * self.effective_inverse_mass();
    }

    /// Reset both accumulators. Called by the world at the end of every
    /// integration of this body.
    pub fn clear_accumulators(&mut self) {
        self.force_accumulator = V::zero();
        self.torque_accumulator = V::Angular::default();
    }
}

#[inline]
fn clamp_damping(d: f32) -> f32 {
    // [0, 1): a damping of exactly 1 would stop a body dead in one second.
    if d.is_finite() {
        d.clamp(0.0, 0.999)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_inverse_mass_matches_mass() {
        for mass in [0.0, 0.5, 1.0, 2.0, 1000.0, -3.0] {
            let body = RigidBody::new(Vec2::ZERO, mass);
            assert!(body.mass() >= 0.0);
            let expected = if body.mass() > 0.0 { 1.0 / body.mass() } else { 0.0 };
            assert_eq!(body.inverse_mass(), expected);
        }
    }

    #[test]
    fn test_zero_mass_ignores_impulses() {
        let mut body = RigidBody::new(Vec3::ZERO, 0.0);
        body.apply_impulse(Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(body.velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_static_body_ignores_forces() {
        let mut body = RigidBody::<Vec2>::new_static(Vec2::ZERO);
        body.add_force(Vec2::new(1.0, 1.0));
        body.add_torque(3.0);
        assert_eq!(body.force_accumulator(), Vec2::ZERO);
        assert_eq!(body.torque_accumulator(), 0.0);
        assert!(!body.is_dynamic());

        let mut heavy_static = RigidBody::from_desc(
            &RigidBodyDesc::<Vec2> { mass: 10.0, is_dynamic: false, ..RigidBodyDesc::default() },
            Vec2::ZERO,
            None,
        );
        assert_eq!(heavy_static.inverse_mass(), 0.1);
        assert_eq!(heavy_static.effective_inverse_mass(), 0.0);
        heavy_static.apply_impulse(Vec2::X);
        assert_eq!(heavy_static.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_force_at_point_adds_torque() {
        let mut body = RigidBody::new(Vec3::new(1.0, 0.0, 0.0), 1.0);
        body.add_force_at_point(Vec3::new(0.0, 0.0, 2.0), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(body.force_accumulator(), Vec3::new(0.0, 0.0, 2.0));
        // Arm (0, 1, 0) × (0, 0, 2) = (2, 0, 0).
        assert_eq!(body.torque_accumulator(), Vec3::new(2.0, 0.0, 0.0));

        // Through the center: no torque.
        let mut centered = RigidBody::new(Vec2::ZERO, 1.0);
        centered.add_force_at_point(Vec2::new(5.0, 0.0), Vec2::new(-2.0, 0.0));
        assert_eq!(centered.torque_accumulator(), 0.0);

        let mut wall = RigidBody::<Vec2>::new_static(Vec2::ZERO);
        wall.add_force_at_point(Vec2::X, Vec2::Y);
        assert_eq!(wall.force_accumulator(), Vec2::ZERO);
        assert_eq!(wall.torque_accumulator(), 0.0);
    }

    #[test]
    fn test_clear_accumulators() {
        let mut body = RigidBody::new(Vec3::ZERO, 2.0);
        body.add_force(Vec3::new(0.0, -19.6, 0.0));
        body.add_torque(Vec3::X);
        body.clear_accumulators();
        assert_eq!(body.force_accumulator(), Vec3::ZERO);
        assert_eq!(body.torque_accumulator(), Vec3::ZERO);
    }

    #[test]
    fn test_from_desc_clamps_fields() {
        let desc = RigidBodyDesc::<Vec2> {
            mass: 4.0,
            restitution: 1.5,
            linear_damping: 2.0,
            is_dynamic: false,
            initial_velocity: Vec2::new(3.0, 0.0),
            ..RigidBodyDesc::default()
        };
        let collider = Collider::new(Vec2::new(1.0, 1.0), Vec2::ZERO).unwrap();
        let body = RigidBody::from_desc(&desc, Vec2::new(5.0, 6.0), Some(&collider));

        assert_eq!(body.restitution, 1.0);
        assert!(body.linear_damping < 1.0);
        assert_eq!(body.body_type(), BodyType::Static);
        assert_eq!(body.velocity(), Vec2::new(3.0, 0.0));
        assert_eq!(body.position(), Vec2::new(5.0, 6.0));
        // 2x2 box, mass 4: I = 4/12 * (4 + 4)
        assert!((body.inverse_inertia() - 12.0 / 32.0).abs() < 1e-6);
    }
}
