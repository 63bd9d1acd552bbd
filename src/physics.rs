// src/physics.rs
//! Dimension-generic rigid-body world.
//!
//! One `step` runs, in order: gravity sync, body creation, semi-implicit
//! Euler integration, broad phase, box-vs-box detection with impulse
//! resolution, and the ground-plane boundary. Positions are mutated in place
//! on the scene objects, so a body resolved later in the same step sees the
//! already-corrected positions of earlier ones.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::boundary::GroundPlane;
use crate::broad_phase::{AllPairs, BroadPhase};
use crate::collider::Collider;
use crate::collision::{BoxShape, CollisionDetector};
use crate::error::{PhysicsError, Result};
use crate::math::PhysicsVector;
use crate::resolver::{ContactBody, Resolution, Resolver};
use crate::rigidbody::RigidBody;
use crate::scene::{Entity, Scene, SceneObject};

/// Default capacity for pre-allocated buffers
const DEFAULT_MAPPING_CAPACITY: usize = 256;
/// Events beyond this many undrained ones are dropped.
const EVENT_CAPACITY: usize = 4096;
/// cos 60°: a contact normal this close to straight down counts as ground.
const GROUNDED_COS: f32 = 0.5;

/* -------------------------------------------------------------------------- */
/*                            Physics Configuration                            */
/* -------------------------------------------------------------------------- */

/// Configuration options for physics simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound = "")]
pub struct PhysicsConfig<V: PhysicsVector> {
    /// Gravity used when the scene declares none.
    pub default_gravity: V,
    /// Fraction of pair penetration removed per contact.
    pub bias_factor: f32,
    /// Implicit static floor. `None` disables the boundary.
    pub ground: Option<GroundPlane<V>>,
    /// "Up" for the grounded heuristic.
    pub up: V,
    /// Ground bounces slower than this are zeroed.
    pub rest_speed: f32,
    /// Larger frame deltas are clamped to this.
    pub max_dt: Option<f32>,
}

impl<V: PhysicsVector> Default for PhysicsConfig<V> {
    fn default() -> Self {
        Self {
            default_gravity: V::DEFAULT_GRAVITY,
            bias_factor: Resolver::DEFAULT_BIAS_FACTOR,
            ground: Some(GroundPlane::default()),
            up: V::DEFAULT_UP,
            rest_speed: V::DEFAULT_REST_SPEED,
            max_dt: None,
        }
    }
}

impl<V: PhysicsVector> PhysicsConfig<V> {
    /// Parse a config document. Missing keys take the dimension defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PhysicsError::from(e).context("parsing physics config"))?;
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if !self.default_gravity.is_finite() {
            return Err(PhysicsError::MalformedGravity {
                expected: V::DIM,
                found: format!("{:?}", self.default_gravity),
            });
        }
        if !(self.bias_factor > 0.0 && self.bias_factor <= 1.0) {
            return Err(PhysicsError::format(format_args!(
                "bias_factor must be in (0, 1], got {}",
                self.bias_factor
            )));
        }
        if !(self.rest_speed >= 0.0) {
            return Err(PhysicsError::format(format_args!(
                "rest_speed must be non-negative, got {}",
                self.rest_speed
            )));
        }
        if let Some(max_dt) = self.max_dt {
            if !(max_dt > 0.0) {
                return Err(PhysicsError::format(format_args!("max_dt must be positive, got {}", max_dt)));
            }
        }
        Ok(self)
    }
}

/// Read a scene `gravity` property: an array of exactly `DIM` numbers.
pub fn parse_gravity<V: PhysicsVector>(value: &Value) -> Result<V> {
    let malformed = || PhysicsError::MalformedGravity {
        expected: V::DIM,
        found: value.to_string(),
    };
    let items = value.as_array().ok_or_else(malformed)?;
    let values = items
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(malformed)?;
    V::from_slice(&values).filter(|g| g.is_finite()).ok_or_else(malformed)
}

/* -------------------------------------------------------------------------- */
/*                              Events & Metrics                               */
/* -------------------------------------------------------------------------- */

/// One positive contact from the last steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent<V: PhysicsVector> {
    pub a: Entity,
    /// `None` when `a` hit the ground plane.
    pub b: Option<Entity>,
    /// From A toward B; for ground contacts, the plane normal.
    pub normal: V,
    pub penetration: f32,
    pub outcome: Resolution,
}

/// Counters for a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StepStats {
    pub bodies_integrated: usize,
    pub pairs_tested: usize,
    pub contacts: usize,
    /// Contacts where both bodies were immovable.
    pub unresolved: usize,
    pub ground_contacts: usize,
    pub events_dropped: usize,
    pub step_time_ms: f32,
}

/// Collision-pass entry: an object with both a body and a collider.
#[derive(Clone, Copy)]
struct Candidate<V: PhysicsVector> {
    object: usize,
    body: usize,
    collider: Collider<V>,
}

/* -------------------------------------------------------------------------- */
/*                              Physics World                                  */
/* -------------------------------------------------------------------------- */

pub struct PhysicsWorld<V: PhysicsVector> {
    config: PhysicsConfig<V>,
    gravity: V,
    detector: CollisionDetector,
    resolver: Resolver,
    broad_phase: Box<dyn BroadPhase<V>>,

    /// Dense arena of (entity, body) with a parallel index for O(1) lookups.
    bodies: Vec<(Entity, RigidBody<V>)>,
    index: HashMap<Entity, usize>,

    events: (Sender<CollisionEvent<V>>, Receiver<CollisionEvent<V>>),

    // Scratch buffers reused across steps.
    slots: Vec<Option<usize>>,
    candidates: Vec<Candidate<V>>,
    shapes: Vec<BoxShape<V>>,
    pairs: Vec<(usize, usize)>,
    live: HashSet<Entity>,

    last_stats: StepStats,
    total_steps: u64,
}

pub type PhysicsWorld2D = PhysicsWorld<glam::Vec2>;
pub type PhysicsWorld3D = PhysicsWorld<glam::Vec3>;

impl<V: PhysicsVector> Default for PhysicsWorld<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: PhysicsVector> PhysicsWorld<V> {
    /// World with the dimension's default configuration.
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    pub fn with_config(config: PhysicsConfig<V>) -> Self {
        let (sender, receiver) = bounded(EVENT_CAPACITY);
        debug!(
            "{} physics world: gravity {:?}, ground {:?}",
            V::LABEL,
            config.default_gravity,
            config.ground
        );
        Self {
            gravity: config.default_gravity,
            resolver: Resolver::new(config.bias_factor),
            detector: CollisionDetector,
            broad_phase: Box::new(AllPairs),
            config,
            bodies: Vec::with_capacity(DEFAULT_MAPPING_CAPACITY),
            index: HashMap::with_capacity(DEFAULT_MAPPING_CAPACITY),
            events: (sender, receiver),
            slots: Vec::new(),
            candidates: Vec::new(),
            shapes: Vec::new(),
            pairs: Vec::new(),
            live: HashSet::new(),
            last_stats: StepStats::default(),
            total_steps: 0,
        }
    }

    /// Replace the pairing strategy.
    pub fn with_broad_phase(mut self, broad_phase: Box<dyn BroadPhase<V>>) -> Self {
        debug!("{} physics broad phase: {}", V::LABEL, broad_phase.name());
        self.broad_phase = broad_phase;
        self
    }

    #[inline]
    pub fn config(&self) -> &PhysicsConfig<V> {
        &self.config
    }

    /// Gravity applied by the most recent step.
    #[inline]
    pub fn gravity(&self) -> V {
        self.gravity
    }

    #[inline]
    pub fn body(&self, entity: Entity) -> Option<&RigidBody<V>> {
        self.index.get(&entity).map(|&i| &self.bodies[i].1)
    }

    #[inline]
    pub fn body_mut(&mut self, entity: Entity) -> Option<&mut RigidBody<V>> {
        match self.index.get(&entity) {
            Some(&i) => Some(&mut self.bodies[i].1),
            None => None,
        }
    }

    #[inline]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (Entity, &RigidBody<V>)> {
        self.bodies.iter().map(|(e, b)| (*e, b))
    }

    /// Drop the cached body of a destroyed entity.
    pub fn remove_body(&mut self, entity: Entity) -> Option<RigidBody<V>> {
        let i = self.index.remove(&entity)?;
        let (_, body) = self.bodies.swap_remove(i);
        if let Some((moved, _)) = self.bodies.get(i) {
            self.index.insert(*moved, i);
        }
        Some(body)
    }

    /// Drains collision events from the channel. Non-blocking.
    pub fn drain_events(&self) -> Vec<CollisionEvent<V>> {
        self.events.1.try_iter().collect()
    }

    #[inline]
    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    #[inline]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Advance `scene` by `dt` seconds.
    pub fn step(&mut self, dt: f32, scene: &mut Scene<V>) -> StepStats {
        let (properties, objects) = scene.split_mut();
        self.step_objects(dt, properties.get("gravity"), objects)
    }

    /// Advance a list of objects by `dt` seconds, reading gravity from
    /// `gravity` (the scene's property, if any).
    ///
    /// A non-positive `dt` leaves everything untouched.
    pub fn step_objects(&mut self, dt: f32, gravity: Option<&Value>, objects: &mut [SceneObject<V>]) -> StepStats {
        if dt.is_nan() || dt <= 0.0 {
            if dt < 0.0 || dt.is_nan() {
                warn!("{} physics step skipped: invalid dt {}", V::LABEL, dt);
            }
            return StepStats::default();
        }
        let dt = match self.config.max_dt {
            Some(max_dt) if dt > max_dt => max_dt,
            _ => dt,
        };

        let _span = tracing::debug_span!("physics_step", dim = V::LABEL, dt = f64::from(dt)).entered();
        let start = Instant::now();
        let mut stats = StepStats::default();

        self.sync_gravity(gravity);
        self.sync_bodies(objects);
        self.integrate(dt, objects, &mut stats);
        self.collide(objects, &mut stats);

        for (obj, slot) in objects.iter().zip(&self.slots) {
            if let Some(i) = *slot {
                self.bodies[i].1.set_position(obj.position);
            }
        }

        stats.step_time_ms = start.elapsed().as_secs_f32() * 1000.0;
        self.total_steps += 1;
        self.last_stats = stats;
        debug!(
            "{} step {}: {} bodies, {} pairs, {} contacts ({} unresolved), {} ground, {:.3} ms",
            V::LABEL,
            self.total_steps,
            stats.bodies_integrated,
            stats.pairs_tested,
            stats.contacts,
            stats.unresolved,
            stats.ground_contacts,
            stats.step_time_ms
        );
        stats
    }

    fn sync_gravity(&mut self, property: Option<&Value>) {
        match property {
            None => self.gravity = self.config.default_gravity,
            Some(value) => match parse_gravity::<V>(value) {
                Ok(g) => self.gravity = g,
                Err(e) => warn!("{}; keeping gravity {:?}", e, self.gravity),
            },
        }
    }

    /// Prune bodies whose entity is gone, create bodies for new ones, and map
    /// every object to its arena slot.
    fn sync_bodies(&mut self, objects: &[SceneObject<V>]) {
        self.live.clear();
        self.live
            .extend(objects.iter().filter(|o| o.rigid_body().is_some()).map(|o| o.id()));

        let before = self.bodies.len();
        let live = &self.live;
        self.bodies.retain(|(e, _)| live.contains(e));
        if self.bodies.len() != before {
            debug!("{} physics dropped {} stale bodies", V::LABEL, before - self.bodies.len());
            self.index.clear();
            self.index
                .extend(self.bodies.iter().enumerate().map(|(i, (e, _))| (*e, i)));
        }

        self.slots.clear();
        for obj in objects {
            let Some(desc) = obj.rigid_body() else {
                self.slots.push(None);
                continue;
            };
            let i = match self.index.get(&obj.id()) {
                Some(&i) => i,
                None => {
                    let body = RigidBody::from_desc(desc, obj.position, obj.collider());
                    trace!("{} body created for `{}` ({})", V::LABEL, obj.name, obj.id());
                    self.bodies.push((obj.id(), body));
                    self.index.insert(obj.id(), self.bodies.len() - 1);
                    self.bodies.len() - 1
                }
            };
            self.slots.push(Some(i));
        }
    }

    /// Semi-implicit Euler: velocity first, then position from the new velocity.
    fn integrate(&mut self, dt: f32, objects: &mut [SceneObject<V>], stats: &mut StepStats) {
        let gravity = self.gravity;
        for (obj, slot) in objects.iter_mut().zip(&self.slots) {
            let Some(i) = *slot else { continue };
            let body = &mut self.bodies[i].1;
            if !body.is_dynamic() {
                body.clear_accumulators();
                continue;
            }

            body.add_force(gravity * body.mass());
            let linear_decay = (1.0 - body.linear_damping * dt).max(0.0);
            let velocity = body.velocity() * linear_decay + body.force_accumulator() * (body.inverse_mass() * dt);
            body.set_velocity(velocity);
            obj.position += velocity * dt;

            // Euler-angle accumulation; drifts for large rotations.
            let angular_decay = (1.0 - body.angular_damping * dt).max(0.0);
            let angular = body.angular_velocity() * angular_decay
                + body.torque_accumulator() * body.inverse_inertia() * dt;
            body.set_angular_velocity(angular);
            obj.rotation += angular * dt;

            body.clear_accumulators();
            stats.bodies_integrated += 1;
        }
    }

    fn collide(&mut self, objects: &mut [SceneObject<V>], stats: &mut StepStats) {
        for (_, body) in &mut self.bodies {
            body.set_grounded(false);
        }

        self.candidates.clear();
        self.shapes.clear();
        for (object, (obj, slot)) in objects.iter().zip(&self.slots).enumerate() {
            if let (Some(body), Some(collider)) = (*slot, obj.collider()) {
                self.candidates.push(Candidate {
                    object,
                    body,
                    collider: *collider,
                });
                self.shapes
                    .push(BoxShape::from_collider(collider, obj.position, obj.scale));
            }
        }

        self.broad_phase.find_pairs(&self.shapes, &mut self.pairs);
        self.pairs.sort_unstable();
        stats.pairs_tested = self.pairs.len();

        let mut next_pair = 0;
        for ci in 0..self.candidates.len() {
            while next_pair < self.pairs.len() && self.pairs[next_pair].0 == ci {
                let (i, j) = self.pairs[next_pair];
                next_pair += 1;
                if i != j {
                    let (ca, cb) = (self.candidates[i], self.candidates[j]);
                    self.resolve_pair(objects, ca, cb, stats);
                }
            }
            let c = self.candidates[ci];
            self.resolve_ground(&mut objects[c.object], c.body, Some(&c.collider), stats);
        }

        // Dynamic bodies without a collider are kept above ground as points.
        for object in 0..self.slots.len() {
            if let Some(body) = self.slots[object] {
                if objects[object].collider().is_none() {
                    self.resolve_ground(&mut objects[object], body, None, stats);
                }
            }
        }
    }

    fn resolve_pair(
        &mut self,
        objects: &mut [SceneObject<V>],
        ca: Candidate<V>,
        cb: Candidate<V>,
        stats: &mut StepStats,
    ) {
        if ca.object == cb.object || ca.body == cb.body {
            return;
        }
        let (obj_a, obj_b) = pair_mut(objects, ca.object, cb.object);
        let shape_a = BoxShape::from_collider(&ca.collider, obj_a.position, obj_a.scale);
        let shape_b = BoxShape::from_collider(&cb.collider, obj_b.position, obj_b.scale);
        let manifold = self.detector.detect(obj_a.id(), &shape_a, obj_b.id(), &shape_b);
        if !manifold.collided {
            return;
        }
        stats.contacts += 1;

        let ((_, body_a), (_, body_b)) = pair_mut(&mut self.bodies, ca.body, cb.body);
        let outcome = self.resolver.resolve(
            &manifold,
            ContactBody::new(&mut obj_a.position, body_a),
            ContactBody::new(&mut obj_b.position, body_b),
        );

        if outcome == Resolution::Immovable {
            stats.unresolved += 1;
            trace!("unresolved contact {} / {}: both immovable", manifold.a, manifold.b);
        } else {
            // The normal points from A to B; whoever has the other body
            // beneath it is standing on something.
            let up = self.config.up;
            if manifold.normal.dot(up) < -GROUNDED_COS {
                body_a.set_grounded(true);
            }
            if (-manifold.normal).dot(up) < -GROUNDED_COS {
                body_b.set_grounded(true);
            }
            trace!(
                "contact {} / {}: normal {:?}, depth {:.4}, {:?}",
                manifold.a,
                manifold.b,
                manifold.normal,
                manifold.penetration,
                outcome
            );
        }

        self.emit(
            CollisionEvent {
                a: manifold.a,
                b: Some(manifold.b),
                normal: manifold.normal,
                penetration: manifold.penetration,
                outcome,
            },
            stats,
        );
    }

    fn resolve_ground(
        &mut self,
        obj: &mut SceneObject<V>,
        body: usize,
        collider: Option<&Collider<V>>,
        stats: &mut StepStats,
    ) {
        let Some(ground) = self.config.ground else { return };
        let rigid = &mut self.bodies[body].1;
        if !rigid.is_dynamic() {
            return;
        }
        let shape = match collider {
            Some(c) => BoxShape::from_collider(c, obj.position, obj.scale),
            None => BoxShape {
                center: obj.position,
                half_extents: V::zero(),
            },
        };
        let Some(contact) = ground.resolve(&shape, &mut obj.position, rigid, self.config.rest_speed) else {
            return;
        };
        stats.ground_contacts += 1;
        trace!(
            "`{}` hit ground: depth {:.4}, speed {:.3}",
            obj.name,
            contact.penetration,
            contact.impact_speed
        );
        self.emit(
            CollisionEvent {
                a: obj.id(),
                b: None,
                normal: ground.normal(),
                penetration: contact.penetration,
                outcome: Resolution::Resolved,
            },
            stats,
        );
    }

    fn emit(&self, event: CollisionEvent<V>, stats: &mut StepStats) {
        match self.events.0.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => stats.events_dropped += 1,
            // The receiver lives as long as the sender; nothing to do.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Two distinct mutable elements of one slice.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}
