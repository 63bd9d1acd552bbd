//! Physics component field contracts as authored in scene records.

use serde::{Deserialize, Serialize};

use crate::collider::Collider;
use crate::error::{PhysicsError, Result};
use crate::math::PhysicsVector;

/// Declared fields of a `Rigidbody2D` / `Rigidbody3D` component.
///
/// Accepts both the snake_case keys written by the editor and the camelCase
/// keys used by older scene files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound = "")]
pub struct RigidBodyDesc<V: PhysicsVector> {
    pub mass: f32,
    pub restitution: f32,
    #[serde(alias = "linearDamping")]
    pub linear_damping: f32,
    #[serde(alias = "angularDamping")]
    pub angular_damping: f32,
    #[serde(alias = "isDynamic")]
    pub is_dynamic: bool,
    #[serde(alias = "initialVelocity")]
    pub initial_velocity: V,
    #[serde(alias = "initialAngularVelocity")]
    pub initial_angular_velocity: V::Angular,
}

impl<V: PhysicsVector> RigidBodyDesc<V> {
    pub const DEFAULT_MASS: f32 = 1.0;
    pub const DEFAULT_RESTITUTION: f32 = 0.3;
    pub const DEFAULT_LINEAR_DAMPING: f32 = 0.01;
    pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.05;
}

impl<V: PhysicsVector> Default for RigidBodyDesc<V> {
    fn default() -> Self {
        Self {
            mass: Self::DEFAULT_MASS,
            restitution: Self::DEFAULT_RESTITUTION,
            linear_damping: Self::DEFAULT_LINEAR_DAMPING,
            angular_damping: Self::DEFAULT_ANGULAR_DAMPING,
            is_dynamic: true,
            initial_velocity: V::zero(),
            initial_angular_velocity: V::Angular::default(),
        }
    }
}

/// Raw `BoxCollider2D` / `BoxCollider3D` record. Sizes are kept as plain
/// float lists so arity mistakes can be reported instead of failing the
/// whole record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BoxColliderRecord {
    #[serde(alias = "halfExtents")]
    half_extents: Option<Vec<f32>>,
    width: Option<f32>,
    height: Option<f32>,
    depth: Option<f32>,
    #[serde(alias = "center_offset")]
    offset: Option<Vec<f32>>,
}

impl BoxColliderRecord {
    /// Resolve the record into a validated collider.
    ///
    /// `half_extents` wins over `width`/`height`/`depth`; axes with no size
    /// fall back to the dimension's default extent.
    pub(crate) fn into_collider<V: PhysicsVector>(self) -> Result<Collider<V>> {
        let offset = match self.offset {
            Some(values) => V::from_slice(&values).ok_or_else(|| {
                PhysicsError::invalid_component(
                    V::BOX_COLLIDER_TAG,
                    format!("offset needs {} values, got {}", V::DIM, values.len()),
                )
            })?,
            None => V::zero(),
        };

        if let Some(values) = self.half_extents {
            let half = V::from_slice(&values).ok_or_else(|| {
                PhysicsError::invalid_component(
                    V::BOX_COLLIDER_TAG,
                    format!("half_extents needs {} values, got {}", V::DIM, values.len()),
                )
            })?;
            return Collider::new(half, offset);
        }

        let default_size = V::DEFAULT_HALF_EXTENT * 2.0;
        let mut size = V::splat(default_size);
        for (axis, value) in [self.width, self.height, self.depth].into_iter().enumerate().take(V::DIM) {
            if let Some(v) = value {
                size.set_axis(axis, v);
            }
        }
        Collider::from_size(size, offset)
    }
}
