//! Typed components attached to scene objects.
//!
//! Scene files store components as `{ "type": ..., ...fields }` records. The
//! physics core only understands rigid bodies and box colliders; everything
//! else is carried through untouched as [`Component::Other`].

use serde_json::{Map, Value};

use crate::collider::Collider;
use crate::error::{PhysicsError, Result};
use crate::math::PhysicsVector;

pub mod physics;

pub use physics::RigidBodyDesc;
use physics::BoxColliderRecord;

/// Discriminant of a [`Component`], used for quick lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    RigidBody,
    BoxCollider,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Component<V: PhysicsVector> {
    RigidBody(RigidBodyDesc<V>),
    BoxCollider(Collider<V>),
    /// Any component type the physics core does not read.
    Other { kind: String, fields: Map<String, Value> },
}

impl<V: PhysicsVector> Component<V> {
    #[inline]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::RigidBody(_) => ComponentKind::RigidBody,
            Component::BoxCollider(_) => ComponentKind::BoxCollider,
            Component::Other { .. } => ComponentKind::Other,
        }
    }

    /// Type tag as written in scene records.
    pub fn type_name(&self) -> &str {
        match self {
            Component::RigidBody(_) => V::RIGID_BODY_TAG,
            Component::BoxCollider(_) => V::BOX_COLLIDER_TAG,
            Component::Other { kind, .. } => kind,
        }
    }

    /// Parse a `{ "type": ..., ... }` record.
    ///
    /// Box colliders are validated here, so a collider with a non-positive
    /// extent never makes it onto an entity.
    pub fn from_record(record: &Value) -> Result<Self> {
        let fields = record
            .as_object()
            .ok_or_else(|| PhysicsError::invalid_component("<unknown>", "record is not an object"))?;
        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| PhysicsError::invalid_component("<unknown>", "missing `type`"))?;

        if kind.eq_ignore_ascii_case(V::RIGID_BODY_TAG) {
            let desc: RigidBodyDesc<V> = serde_json::from_value(record.clone())
                .map_err(|e| PhysicsError::from(e).context(format!("parsing {kind}")))?;
            Ok(Component::RigidBody(desc))
        } else if kind.eq_ignore_ascii_case(V::BOX_COLLIDER_TAG) {
            let raw: BoxColliderRecord = serde_json::from_value(record.clone())
                .map_err(|e| PhysicsError::from(e).context(format!("parsing {kind}")))?;
            Ok(Component::BoxCollider(raw.into_collider()?))
        } else {
            let mut fields = fields.clone();
            fields.remove("type");
            Ok(Component::Other {
                kind: kind.to_owned(),
                fields,
            })
        }
    }

    /// Inverse of [`Component::from_record`].
    pub fn to_record(&self) -> Result<Value> {
        let mut fields = match self {
            Component::RigidBody(desc) => match serde_json::to_value(desc)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            Component::BoxCollider(collider) => {
                let mut map = Map::new();
                map.insert("half_extents".into(), serde_json::to_value(collider.half_extents())?);
                map.insert("offset".into(), serde_json::to_value(collider.local_offset())?);
                map
            }
            Component::Other { fields, .. } => fields.clone(),
        };
        fields.insert("type".into(), Value::String(self.type_name().to_owned()));
        Ok(Value::Object(fields))
    }
}
