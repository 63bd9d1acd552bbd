// src/boundary.rs
//! Implicit static ground plane.
//!
//! Stand-in for a general static collider set: every dynamic body is kept on
//! the free side of one half-space.

use serde::{Deserialize, Serialize};

use crate::collision::BoxShape;
use crate::error::{PhysicsError, Result};
use crate::math::PhysicsVector;
use crate::rigidbody::RigidBody;

/// Free space is every point `p` with `p · normal >= offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "", try_from = "GroundRecord<V>", into = "GroundRecord<V>")]
pub struct GroundPlane<V: PhysicsVector> {
    normal: V,
    offset: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(bound = "")]
struct GroundRecord<V: PhysicsVector> {
    normal: V,
    #[serde(default)]
    offset: f32,
}

impl<V: PhysicsVector> TryFrom<GroundRecord<V>> for GroundPlane<V> {
    type Error = PhysicsError;

    fn try_from(r: GroundRecord<V>) -> Result<Self> {
        GroundPlane::new(r.normal, r.offset)
    }
}

impl<V: PhysicsVector> From<GroundPlane<V>> for GroundRecord<V> {
    fn from(g: GroundPlane<V>) -> Self {
        Self {
            normal: g.normal,
            offset: g.offset,
        }
    }
}

/// Outcome of a ground test for one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub penetration: f32,
    /// Normal speed into the plane before the bounce.
    pub impact_speed: f32,
}

impl<V: PhysicsVector> Default for GroundPlane<V> {
    fn default() -> Self {
        Self {
            normal: V::DEFAULT_GROUND_NORMAL,
            offset: V::DEFAULT_GROUND_OFFSET,
        }
    }
}

impl<V: PhysicsVector> GroundPlane<V> {
    /// Plane with the given normal (normalized here) and offset.
    pub fn new(normal: V, offset: f32) -> Result<Self> {
        let len_sq = normal.length_squared();
        if !normal.is_finite() || !offset.is_finite() || len_sq <= f32::EPSILON {
            return Err(PhysicsError::format(format_args!(
                "ground plane needs a finite non-zero normal, got {:?}",
                normal
            )));
        }
        Ok(Self {
            normal: normal * (1.0 / len_sq.sqrt()),
            offset,
        })
    }

    /// Horizontal floor whose surface passes through `point`.
    pub fn through(normal: V, point: V) -> Result<Self> {
        let plane = Self::new(normal, 0.0)?;
        Ok(Self {
            offset: point.dot(plane.normal),
            ..plane
        })
    }

    #[inline]
    pub fn normal(&self) -> V {
        self.normal
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Signed distance of a box's lowest support point to the plane.
    /// Negative means the box pokes through.
    #[inline]
    pub fn separation(&self, shape: &BoxShape<V>) -> f32 {
        shape.center.dot(self.normal) - shape.half_extents.support_extent(self.normal) - self.offset
    }

    /// Push the body fully out of the plane and bounce its normal velocity.
    ///
    /// Bounces slower than `rest_speed` are zeroed so resting bodies settle.
    /// Bodies with zero inverse mass are left alone.
    pub fn resolve(
        &self,
        shape: &BoxShape<V>,
        position: &mut V,
        body: &mut RigidBody<V>,
        rest_speed: f32,
    ) -> Option<GroundContact> {
        if body.effective_inverse_mass() <= 0.0 {
            return None;
        }
        let separation = self.separation(shape);
        if separation.is_nan() || separation >= 0.0 {
            return None;
        }
        let penetration = -separation;
        *position += self.normal * penetration;

        let velocity = body.velocity();
        let vn = velocity.dot(self.normal);
        let mut impact_speed = 0.0;
        if vn < 0.0 {
            impact_speed = -vn;
            let mut bounced = -vn * body.restitution;
            if bounced < rest_speed {
                bounced = 0.0;
            }
            body.set_velocity(velocity + self.normal * (bounced - vn));
        }
        body.set_grounded(true);
        Some(GroundContact {
            penetration,
            impact_speed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_default_planes() {
        let g2 = GroundPlane::<Vec2>::default();
        let on_floor = BoxShape {
            center: Vec2::new(0.0, 284.0),
            half_extents: Vec2::splat(16.0),
        };
        assert!(g2.separation(&on_floor).abs() < 1e-4);

        let g3 = GroundPlane::<Vec3>::default();
        let sunk = BoxShape {
            center: Vec3::new(3.0, 0.5, -2.0),
            half_extents: Vec3::ONE,
        };
        assert!((g3.separation(&sunk) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_bounces_and_grounds() {
        let plane = GroundPlane::<Vec3>::default();
        let mut body = RigidBody::new(Vec3::ZERO, 1.0);
        body.restitution = 0.5;
        body.set_velocity(Vec3::new(1.0, -4.0, 0.0));
        let mut position = Vec3::new(0.0, 0.8, 0.0);
        let shape = BoxShape {
            center: position,
            half_extents: Vec3::ONE,
        };

        let contact = plane.resolve(&shape, &mut position, &mut body, 0.1).unwrap();
        assert!((contact.penetration - 0.2).abs() < 1e-6);
        assert_eq!(contact.impact_speed, 4.0);
        assert!((position.y - 1.0).abs() < 1e-6);
        assert_eq!(body.velocity(), Vec3::new(1.0, 2.0, 0.0));
        assert!(body.is_grounded());
    }

    #[test]
    fn test_slow_bounce_comes_to_rest() {
        let plane = GroundPlane::<Vec2>::default();
        let mut body = RigidBody::new(Vec2::ZERO, 1.0);
        body.set_velocity(Vec2::new(0.0, 10.0));
        let mut position = Vec2::new(0.0, 290.0);
        let shape = BoxShape {
            center: position,
            half_extents: Vec2::splat(16.0),
        };
        // 10 * 0.3 = 3, under the 5 px/s rest speed.
        plane.resolve(&shape, &mut position, &mut body, 5.0).unwrap();
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert!((position.y - 284.0).abs() < 1e-4);
    }

    #[test]
    fn test_clear_of_plane_and_immovable() {
        let plane = GroundPlane::<Vec3>::default();
        let mut body = RigidBody::new(Vec3::ZERO, 1.0);
        let mut position = Vec3::new(0.0, 5.0, 0.0);
        let shape = BoxShape {
            center: position,
            half_extents: Vec3::ONE,
        };
        assert!(plane.resolve(&shape, &mut position, &mut body, 0.1).is_none());

        let mut wall = RigidBody::new_static(Vec3::ZERO);
        let mut position = Vec3::new(0.0, -5.0, 0.0);
        let shape = BoxShape {
            center: position,
            half_extents: Vec3::ONE,
        };
        assert!(plane.resolve(&shape, &mut position, &mut wall, 0.1).is_none());
        assert_eq!(position.y, -5.0);
    }

    #[test]
    fn test_plane_validation() {
        assert!(GroundPlane::new(Vec2::ZERO, 0.0).is_err());
        let tilted = GroundPlane::new(Vec2::new(0.0, -2.0), 1.0).unwrap();
        assert_eq!(tilted.normal(), Vec2::new(0.0, -1.0));
        let floor = GroundPlane::through(Vec3::Y, Vec3::new(0.0, -3.0, 0.0)).unwrap();
        assert_eq!(floor.offset(), -3.0);
        let parsed: GroundPlane<Vec3> = serde_json::from_str(r#"{ "normal": [0, 2, 0], "offset": 1 }"#).unwrap();
        assert_eq!(parsed.normal(), Vec3::Y);
    }
}
