// src/collision.rs
//! Narrow phase: axis-aligned box overlap.
//!
//! Boxes never rotate here, even when their entity does. Colliders stay
//! axis-aligned so collision shapes match what gameplay expects.

use crate::collider::Collider;
use crate::math::PhysicsVector;
use crate::scene::Entity;

/// World-space box built from an entity transform and its collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape<V: PhysicsVector> {
    pub center: V,
    pub half_extents: V,
}

impl<V: PhysicsVector> BoxShape<V> {
    /// Offset is applied unscaled; extents follow the absolute scale.
    #[inline]
    pub fn from_collider(collider: &Collider<V>, position: V, scale: V) -> Self {
        Self {
            center: collider.world_center(position),
            half_extents: collider.scaled_half_extents(scale),
        }
    }

    #[inline]
    pub fn min(&self) -> V {
        self.center - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> V {
        self.center + self.half_extents
    }
}

/// Result of a narrow-phase test between entities `a` and `b`.
///
/// `normal` is a unit axis pointing from A toward B. Resolution pushes A
/// along `-normal` and B along `+normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionManifold<V: PhysicsVector> {
    pub collided: bool,
    pub normal: V,
    pub penetration: f32,
    pub a: Entity,
    pub b: Entity,
}

impl<V: PhysicsVector> CollisionManifold<V> {
    #[inline]
    pub fn none(a: Entity, b: Entity) -> Self {
        Self {
            collided: false,
            normal: V::zero(),
            penetration: 0.0,
            a,
            b,
        }
    }
}

/// Stateless box-vs-box detector.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollisionDetector;

impl CollisionDetector {
    /// Test two boxes for overlap.
    ///
    /// The separation axis is the one with the smallest positive overlap; on
    /// equal overlaps the lowest axis index wins (x, then y, then z).
    pub fn detect<V: PhysicsVector>(
        &self,
        a: Entity,
        shape_a: &BoxShape<V>,
        b: Entity,
        shape_b: &BoxShape<V>,
    ) -> CollisionManifold<V> {
        let delta = shape_b.center - shape_a.center;

        let mut best_axis = 0;
        let mut best_overlap = f32::INFINITY;
        for i in 0..V::DIM {
            let overlap =
                (shape_a.half_extents.axis(i) + shape_b.half_extents.axis(i)) - delta.axis(i).abs();
            if overlap.is_nan() || overlap <= 0.0 {
                return CollisionManifold::none(a, b);
            }
            if overlap < best_overlap {
                best_overlap = overlap;
                best_axis = i;
            }
        }

        let sign = if delta.axis(best_axis) > 0.0 { 1.0 } else { -1.0 };
        CollisionManifold {
            collided: true,
            normal: V::unit_axis(best_axis, sign),
            penetration: best_overlap,
            a,
            b,
        }
    }

    /// Convenience wrapper building both shapes from transforms.
    pub fn detect_colliders<V: PhysicsVector>(
        &self,
        a: Entity,
        (position_a, scale_a, collider_a): (V, V, &Collider<V>),
        b: Entity,
        (position_b, scale_b, collider_b): (V, V, &Collider<V>),
    ) -> CollisionManifold<V> {
        self.detect(
            a,
            &BoxShape::from_collider(collider_a, position_a, scale_a),
            b,
            &BoxShape::from_collider(collider_b, position_b, scale_b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene2D;
    use glam::{Vec2, Vec3};

    fn ids() -> (Entity, Entity) {
        let mut scene = Scene2D::new("ids");
        (scene.spawn("a", Vec2::ZERO), scene.spawn("b", Vec2::ZERO))
    }

    fn shape2(cx: f32, cy: f32, hx: f32, hy: f32) -> BoxShape<Vec2> {
        BoxShape {
            center: Vec2::new(cx, cy),
            half_extents: Vec2::new(hx, hy),
        }
    }

    #[test]
    fn test_literal_overlap_case() {
        let (a, b) = ids();
        let m = CollisionDetector.detect(a, &shape2(0.0, 0.0, 1.0, 1.0), b, &shape2(1.5, 0.0, 1.0, 1.0));
        assert!(m.collided);
        assert!((m.penetration - 0.5).abs() < 1e-6);
        assert_eq!(m.normal, Vec2::new(1.0, 0.0));
        assert_eq!((m.a, m.b), (a, b));
    }

    #[test]
    fn test_normal_points_toward_b() {
        let (a, b) = ids();
        let m = CollisionDetector.detect(a, &shape2(0.0, 0.0, 1.0, 1.0), b, &shape2(0.0, -1.8, 1.0, 1.0));
        assert!(m.collided);
        assert_eq!(m.normal, Vec2::new(0.0, -1.0));
        assert!((m.penetration - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_touching_is_not_collision() {
        let (a, b) = ids();
        let m = CollisionDetector.detect(a, &shape2(0.0, 0.0, 1.0, 1.0), b, &shape2(2.0, 0.0, 1.0, 1.0));
        assert!(!m.collided);
        let m = CollisionDetector.detect(a, &shape2(0.0, 0.0, 1.0, 1.0), b, &shape2(0.5, 3.0, 1.0, 1.0));
        assert!(!m.collided);
        assert_eq!(m.penetration, 0.0);
    }

    #[test]
    fn test_tie_prefers_lowest_axis() {
        let (a, b) = ids();
        let m = CollisionDetector.detect(a, &shape2(0.0, 0.0, 1.0, 1.0), b, &shape2(1.0, 1.0, 1.0, 1.0));
        assert!(m.collided);
        assert_eq!(m.normal, Vec2::X);

        let m = CollisionDetector.detect(
            a,
            &BoxShape { center: Vec3::ZERO, half_extents: Vec3::ONE },
            b,
            &BoxShape { center: Vec3::new(0.0, -1.5, -1.5), half_extents: Vec3::ONE },
        );
        assert!(m.collided);
        assert_eq!(m.normal, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_coincident_centers_use_negative_sign() {
        let (a, b) = ids();
        let m = CollisionDetector.detect(a, &shape2(0.0, 0.0, 1.0, 2.0), b, &shape2(0.0, 0.0, 1.0, 2.0));
        assert!(m.collided);
        assert_eq!(m.normal, Vec2::new(-1.0, 0.0));
        assert!((m.penetration - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_scale_and_offset() {
        let (a, b) = ids();
        let ca = Collider::new(Vec2::splat(1.0), Vec2::new(0.0, 2.0)).unwrap();
        let cb = Collider::new(Vec2::splat(1.0), Vec2::ZERO).unwrap();
        // Without the offset A would sit well below B.
        let m = CollisionDetector.detect_colliders(
            a,
            (Vec2::new(0.0, -1.0), Vec2::ONE, &ca),
            b,
            (Vec2::new(0.0, 2.5), Vec2::ONE, &cb),
        );
        assert!(m.collided);
        assert!((m.penetration - 0.5).abs() < 1e-6);

        // Scale 3 on x makes the boxes reach each other.
        let m = CollisionDetector.detect_colliders(
            a,
            (Vec2::ZERO, Vec2::new(3.0, 1.0), &cb),
            b,
            (Vec2::new(3.5, 0.0), Vec2::ONE, &cb),
        );
        assert!(m.collided);
        assert!((m.penetration - 0.5).abs() < 1e-6);
    }
}
