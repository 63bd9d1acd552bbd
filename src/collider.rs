// src/collider.rs
//! Box collider shape description.

use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};
use crate::math::PhysicsVector;

/// Axis-aligned box used only for overlap testing.
///
/// Half extents are always positive and finite; the only way to build one is
/// through [`Collider::new`] (or deserialization, which goes through it).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "", try_from = "ColliderRecord<V>", into = "ColliderRecord<V>")]
pub struct Collider<V: PhysicsVector> {
    half_extents: V,
    local_offset: V,
}

impl<V: PhysicsVector> Collider<V> {
    /// Create a collider, rejecting any non-positive or non-finite extent.
    pub fn new(half_extents: V, local_offset: V) -> Result<Self> {
        let valid = half_extents.is_finite()
            && local_offset.is_finite()
            && (0..V::DIM).all(|i| half_extents.axis(i) > 0.0);
        if !valid {
            return Err(PhysicsError::InvalidCollider {
                extents: format!("{:?}", half_extents),
            });
        }
        Ok(Self {
            half_extents,
            local_offset,
        })
    }

    /// Collider from full sizes (`width`, `height`, ...) as authored in scenes.
    pub fn from_size(size: V, local_offset: V) -> Result<Self> {
        Self::new(size * 0.5, local_offset)
    }

    #[inline]
    pub fn half_extents(&self) -> V {
        self.half_extents
    }

    #[inline]
    pub fn local_offset(&self) -> V {
        self.local_offset
    }

    /// Half extents after applying an entity scale. Negative scale mirrors
    /// the box but does not shrink it.
    #[inline]
    pub fn scaled_half_extents(&self, scale: V) -> V {
        self.half_extents.mul_elements(scale.abs())
    }

    /// Box center for an entity at `position`.
    #[inline]
    pub fn world_center(&self, position: V) -> V {
        position + self.local_offset
    }
}

impl<V: PhysicsVector> Default for Collider<V> {
    fn default() -> Self {
        Self {
            half_extents: V::splat(V::DEFAULT_HALF_EXTENT),
            local_offset: V::zero(),
        }
    }
}

/// Plain serialized layout of a collider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(bound = "")]
struct ColliderRecord<V: PhysicsVector> {
    half_extents: V,
    #[serde(default = "V::zero")]
    local_offset: V,
}

impl<V: PhysicsVector> TryFrom<ColliderRecord<V>> for Collider<V> {
    type Error = PhysicsError;

    fn try_from(record: ColliderRecord<V>) -> Result<Self> {
        Collider::new(record.half_extents, record.local_offset)
    }
}

impl<V: PhysicsVector> From<Collider<V>> for ColliderRecord<V> {
    fn from(c: Collider<V>) -> Self {
        Self {
            half_extents: c.half_extents,
            local_offset: c.local_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[test]
    fn test_rejects_non_positive_extents() {
        assert!(Collider::new(Vec2::new(1.0, 0.0), Vec2::ZERO).unwrap_err().is_invalid_collider());
        assert!(Collider::new(Vec3::new(1.0, 1.0, -2.0), Vec3::ZERO).is_err());
        assert!(Collider::new(Vec2::new(f32::NAN, 1.0), Vec2::ZERO).is_err());
        assert!(Collider::new(Vec2::new(0.5, 2.0), Vec2::ZERO).is_ok());
    }

    #[test]
    fn test_size_and_scale() {
        let c = Collider::from_size(Vec2::new(32.0, 16.0), Vec2::new(0.0, 4.0)).unwrap();
        assert_eq!(c.half_extents(), Vec2::new(16.0, 8.0));
        assert_eq!(c.scaled_half_extents(Vec2::new(-2.0, 0.5)), Vec2::new(32.0, 4.0));
        assert_eq!(c.world_center(Vec2::new(10.0, 10.0)), Vec2::new(10.0, 14.0));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Collider<Vec3> =
            serde_json::from_str(r#"{ "half_extents": [1.0, 2.0, 3.0] }"#).unwrap();
        assert_eq!(ok.half_extents(), Vec3::new(1.0, 2.0, 3.0));

        let bad = serde_json::from_str::<Collider<Vec3>>(r#"{ "half_extents": [1.0, 0.0, 3.0] }"#);
        assert!(bad.is_err());
    }
}
