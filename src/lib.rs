// src/lib.rs
//! Rigid-body physics core for Slop Engine scenes.
//!
//! Everything is generic over [`PhysicsVector`], implemented for
//! `glam::Vec2` and `glam::Vec3`, so the 2D and 3D worlds share one
//! integrator, detector and resolver.
//!
//! ```
//! use slop_physics::{FixedTimestep, PhysicsWorld3D, Scene3D};
//!
//! # fn main() -> slop_physics::Result<()> {
//! let mut scene = Scene3D::from_json_str(r#"{ "is_3d": true, "objects": [] }"#)?;
//! let mut world = PhysicsWorld3D::new();
//! let mut timestep = FixedTimestep::default();
//! timestep.accumulate(1.0 / 30.0);
//! for dt in timestep.steps() {
//!     world.step(dt, &mut scene);
//! }
//! # Ok(())
//! # }
//! ```

pub mod boundary;
pub mod broad_phase;
pub mod collider;
pub mod collision;
pub mod components;
pub mod error;
pub mod math;
pub mod physics;
pub mod resolver;
pub mod rigidbody;
pub mod scene;
pub mod time;

pub use boundary::{GroundContact, GroundPlane};
pub use broad_phase::{AllPairs, BroadPhase};
pub use collider::Collider;
pub use collision::{BoxShape, CollisionDetector, CollisionManifold};
pub use components::{Component, ComponentKind, RigidBodyDesc};
pub use error::{PhysicsError, Result};
pub use math::PhysicsVector;
pub use physics::{
    parse_gravity, CollisionEvent, PhysicsConfig, PhysicsWorld, PhysicsWorld2D, PhysicsWorld3D, StepStats,
};
pub use resolver::{ContactBody, Resolution, Resolver};
pub use rigidbody::{BodyType, RigidBody};
pub use scene::{Entity, Scene, Scene2D, Scene3D, SceneObject};
pub use time::FixedTimestep;
