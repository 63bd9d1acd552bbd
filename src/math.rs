// src/math.rs
//! Dimension abstraction over `glam` vectors.
//!
//! The 2D and 3D simulations share one implementation; everything that
//! differs between them (vector arity, how rotation is represented, default
//! gravity and ground, component type tags) lives behind [`PhysicsVector`].

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use glam::{Vec2, Vec3};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Vector type a physics world is parameterized over.
pub trait PhysicsVector:
    Copy
    + Debug
    + PartialEq
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<f32, Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign<f32>
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Rotation / angular velocity / torque representation.
    /// `f32` (z-axis angle) in 2D, Euler angles in 3D.
    type Angular: Copy
        + Debug
        + PartialEq
        + Default
        + Add<Output = Self::Angular>
        + Mul<f32, Output = Self::Angular>
        + Mul<Output = Self::Angular>
        + AddAssign
        + MulAssign<f32>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Number of axes.
    const DIM: usize;
    /// "2D" or "3D", used in log lines.
    const LABEL: &'static str;
    /// Component `type` tag for rigid bodies in scene records.
    const RIGID_BODY_TAG: &'static str;
    /// Component `type` tag for box colliders in scene records.
    const BOX_COLLIDER_TAG: &'static str;

    /// Gravity used when the scene does not declare one.
    const DEFAULT_GRAVITY: Self;
    /// Direction the grounded heuristic treats as "up".
    const DEFAULT_UP: Self;
    /// Half extent applied on every axis when a collider declares no size.
    const DEFAULT_HALF_EXTENT: f32;
    /// Ground bounces slower than this are zeroed.
    const DEFAULT_REST_SPEED: f32;
    /// Unit normal of the implicit ground plane (pointing into free space).
    const DEFAULT_GROUND_NORMAL: Self;
    /// Free space is `p · normal >= offset`.
    const DEFAULT_GROUND_OFFSET: f32;

    fn splat(v: f32) -> Self;
    fn axis(&self, i: usize) -> f32;
    fn set_axis(&mut self, i: usize, v: f32);
    fn dot(self, other: Self) -> f32;
    fn abs(self) -> Self;
    fn mul_elements(self, other: Self) -> Self;
    fn is_finite(self) -> bool;

    /// Build a vector from exactly `DIM` floats.
    fn from_slice(values: &[f32]) -> Option<Self>;

    fn angular_splat(v: f32) -> Self::Angular;

    /// Diagonal inverse inertia of a solid box with the given half extents.
    fn box_inverse_inertia(mass: f32, half_extents: Self) -> Self::Angular;

    /// Torque of `force` applied at lever arm `self`: the scalar
    /// `x·fy − y·fx` in 2D, the cross product in 3D.
    fn torque_cross(self, force: Self) -> Self::Angular;

    #[inline]
    fn zero() -> Self {
        Self::splat(0.0)
    }

    #[inline]
    fn one() -> Self {
        Self::splat(1.0)
    }

    /// Unit vector along axis `i` with the given sign.
    #[inline]
    fn unit_axis(i: usize, sign: f32) -> Self {
        let mut v = Self::zero();
        v.set_axis(i, sign);
        v
    }

    #[inline]
    fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Projection of a box with these half extents onto `direction`.
    #[inline]
    fn support_extent(self, direction: Self) -> f32 {
        self.dot(direction.abs())
    }
}

#[inline]
fn inverse_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

impl PhysicsVector for Vec2 {
    type Angular = f32;

    const DIM: usize = 2;
    const LABEL: &'static str = "2D";
    const RIGID_BODY_TAG: &'static str = "Rigidbody2D";
    const BOX_COLLIDER_TAG: &'static str = "BoxCollider2D";

    // Pixel units, y pointing down the screen.
    const DEFAULT_GRAVITY: Self = Vec2::new(0.0, 980.0);
    const DEFAULT_UP: Self = Vec2::new(0.0, -1.0);
    const DEFAULT_HALF_EXTENT: f32 = 16.0;
    const DEFAULT_REST_SPEED: f32 = 5.0;
    const DEFAULT_GROUND_NORMAL: Self = Vec2::new(0.0, -1.0);
    const DEFAULT_GROUND_OFFSET: f32 = -300.0;

    #[inline]
    fn splat(v: f32) -> Self {
        Vec2::splat(v)
    }

    #[inline]
    fn axis(&self, i: usize) -> f32 {
        self[i]
    }

    #[inline]
    fn set_axis(&mut self, i: usize, v: f32) {
        self[i] = v;
    }

    #[inline]
    fn dot(self, other: Self) -> f32 {
        Vec2::dot(self, other)
    }

    #[inline]
    fn abs(self) -> Self {
        Vec2::abs(self)
    }

    #[inline]
    fn mul_elements(self, other: Self) -> Self {
        self * other
    }

    #[inline]
    fn is_finite(self) -> bool {
        Vec2::is_finite(self)
    }

    fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [x, y] => Some(Vec2::new(*x, *y)),
            _ => None,
        }
    }

    #[inline]
    fn angular_splat(v: f32) -> f32 {
        v
    }

    #[inline]
    fn torque_cross(self, force: Self) -> f32 {
        self.perp_dot(force)
    }

    fn box_inverse_inertia(mass: f32, half_extents: Self) -> f32 {
        let size = half_extents * 2.0;
        inverse_or_zero(mass / 12.0 * (size.x * size.x + size.y * size.y))
    }
}

impl PhysicsVector for Vec3 {
    type Angular = Vec3;

    const DIM: usize = 3;
    const LABEL: &'static str = "3D";
    const RIGID_BODY_TAG: &'static str = "Rigidbody3D";
    const BOX_COLLIDER_TAG: &'static str = "BoxCollider3D";

    // Meters, y up.
    const DEFAULT_GRAVITY: Self = Vec3::new(0.0, -9.8, 0.0);
    const DEFAULT_UP: Self = Vec3::Y;
    const DEFAULT_HALF_EXTENT: f32 = 1.0;
    const DEFAULT_REST_SPEED: f32 = 0.1;
    const DEFAULT_GROUND_NORMAL: Self = Vec3::Y;
    const DEFAULT_GROUND_OFFSET: f32 = 0.0;

    #[inline]
    fn splat(v: f32) -> Self {
        Vec3::splat(v)
    }

    #[inline]
    fn axis(&self, i: usize) -> f32 {
        self[i]
    }

    #[inline]
    fn set_axis(&mut self, i: usize, v: f32) {
        self[i] = v;
    }

    #[inline]
    fn dot(self, other: Self) -> f32 {
        Vec3::dot(self, other)
    }

    #[inline]
    fn abs(self) -> Self {
        Vec3::abs(self)
    }

    #[inline]
    fn mul_elements(self, other: Self) -> Self {
        self * other
    }

    #[inline]
    fn is_finite(self) -> bool {
        Vec3::is_finite(self)
    }

    fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [x, y, z] => Some(Vec3::new(*x, *y, *z)),
            _ => None,
        }
    }

    #[inline]
    fn angular_splat(v: f32) -> Vec3 {
        Vec3::splat(v)
    }

    #[inline]
    fn torque_cross(self, force: Self) -> Vec3 {
        self.cross(force)
    }

    fn box_inverse_inertia(mass: f32, half_extents: Self) -> Vec3 {
        let s = half_extents * 2.0;
        let k = mass / 12.0;
        Vec3::new(
            inverse_or_zero(k * (s.y * s.y + s.z * s.z)),
            inverse_or_zero(k * (s.x * s.x + s.z * s.z)),
            inverse_or_zero(k * (s.x * s.x + s.y * s.y)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_requires_exact_arity() {
        assert_eq!(<Vec2 as PhysicsVector>::from_slice(&[1.0, 2.0]), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(<Vec2 as PhysicsVector>::from_slice(&[1.0]), None);
        assert_eq!(<Vec2 as PhysicsVector>::from_slice(&[1.0, 2.0, 3.0]), None);
        assert_eq!(
            <Vec3 as PhysicsVector>::from_slice(&[1.0, 2.0, 3.0]),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn test_unit_axis_and_support() {
        assert_eq!(<Vec3 as PhysicsVector>::unit_axis(2, -1.0), Vec3::new(0.0, 0.0, -1.0));
        let half = Vec2::new(3.0, 5.0);
        assert_eq!(half.support_extent(Vec2::new(0.0, -1.0)), 5.0);
    }

    #[test]
    fn test_box_inertia() {
        // Unit cube of mass 6: I = 6/12 * (1 + 1) = 1 on every axis.
        let inv = Vec3::box_inverse_inertia(6.0, Vec3::splat(0.5));
        assert!((inv - Vec3::ONE).abs().max_element() < 1e-6);
        assert_eq!(Vec2::box_inverse_inertia(0.0, Vec2::ONE), 0.0);
    }

    #[test]
    fn test_torque_cross() {
        assert_eq!(Vec2::X.torque_cross(Vec2::new(0.0, 3.0)), 3.0);
        assert_eq!(Vec2::Y.torque_cross(Vec2::new(3.0, 0.0)), -3.0);
        assert_eq!(Vec3::X.torque_cross(Vec3::Y), Vec3::Z);
    }
}
