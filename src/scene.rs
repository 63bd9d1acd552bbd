// src/scene.rs
// Minimal entity store the physics world steps over.
// Objects keep insertion order; that order is the simulation order.

use std::collections::VecDeque;
use std::fmt;

use log::warn;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::collider::Collider;
use crate::components::{Component, ComponentKind, RigidBodyDesc};
use crate::error::{PhysicsError, Result};
use crate::math::PhysicsVector;

/// Entity id (index + generation)
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// One simulation-relevant object: transform plus typed components.
#[derive(Debug, Clone)]
pub struct SceneObject<V: PhysicsVector> {
    id: Entity,
    pub uid: Option<String>,
    pub name: String,
    pub position: V,
    pub rotation: V::Angular,
    pub scale: V,
    components: Vec<Component<V>>,
}

impl<V: PhysicsVector> SceneObject<V> {
    fn new(id: Entity, name: String, position: V) -> Self {
        Self {
            id,
            uid: None,
            name,
            position,
            rotation: V::Angular::default(),
            scale: V::one(),
            components: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> Entity {
        self.id
    }

    #[inline]
    pub fn components(&self) -> &[Component<V>] {
        &self.components
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }

    pub fn rigid_body(&self) -> Option<&RigidBodyDesc<V>> {
        self.components.iter().find_map(|c| match c {
            Component::RigidBody(desc) => Some(desc),
            _ => None,
        })
    }

    pub fn collider(&self) -> Option<&Collider<V>> {
        self.components.iter().find_map(|c| match c {
            Component::BoxCollider(collider) => Some(collider),
            _ => None,
        })
    }

    /// Attach a component. An object holds at most one rigid body and one
    /// box collider; attaching another replaces the previous one.
    pub fn add_component(&mut self, component: Component<V>) {
        let kind = component.kind();
        if kind != ComponentKind::Other {
            if let Some(slot) = self.components.iter_mut().find(|c| c.kind() == kind) {
                *slot = component;
                return;
            }
        }
        self.components.push(component);
    }

    /// Parse and attach a `{ "type": ..., ... }` record.
    pub fn add_component_record(&mut self, record: &Value) -> Result<()> {
        let component = Component::from_record(record).map_err(|e| {
            let kind = record.get("type").and_then(Value::as_str).unwrap_or("component");
            e.context(format!("attaching {kind} to `{}`", self.name))
        })?;
        self.add_component(component);
        Ok(())
    }

    /// Remove every component of `kind`, returning how many were dropped.
    pub fn remove_components(&mut self, kind: ComponentKind) -> usize {
        let before = self.components.len();
        self.components.retain(|c| c.kind() != kind);
        before - self.components.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    position: Option<usize>,
}

/// Scene container
#[derive(Debug, Clone)]
pub struct Scene<V: PhysicsVector> {
    pub name: String,
    /// Free-form property bag; physics reads the `gravity` key.
    pub properties: Map<String, Value>,
    objects: Vec<SceneObject<V>>,
    slots: Vec<Slot>,
    free_list: VecDeque<u32>,
}

pub type Scene2D = Scene<glam::Vec2>;
pub type Scene3D = Scene<glam::Vec3>;

impl<V: PhysicsVector> Default for Scene<V> {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl<V: PhysicsVector> Scene<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Map::new(),
            objects: Vec::new(),
            slots: Vec::new(),
            free_list: VecDeque::new(),
        }
    }

    /// Spawn a new object at the end of the iteration order.
    pub fn spawn(&mut self, name: impl Into<String>, position: V) -> Entity {
        let index = match self.free_list.pop_front() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    position: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = Entity {
            index,
            generation: slot.generation,
        };
        slot.position = Some(self.objects.len());
        self.objects.push(SceneObject::new(id, name.into(), position));
        id
    }

    /// Despawn entity and free its index. Returns false for stale handles.
    pub fn despawn(&mut self, e: Entity) -> bool {
        let Some(pos) = self.position_of(e) else {
            return false;
        };
        self.objects.remove(pos);
        for obj in &self.objects[pos..] {
            if let Some(p) = self.slots[obj.id.index as usize].position.as_mut() {
                *p -= 1;
            }
        }
        let slot = &mut self.slots[e.index as usize];
        slot.position = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push_back(e.index);
        true
    }

    fn position_of(&self, e: Entity) -> Option<usize> {
        self.slots
            .get(e.index as usize)
            .filter(|slot| slot.generation == e.generation)
            .and_then(|slot| slot.position)
    }

    #[inline]
    pub fn contains(&self, e: Entity) -> bool {
        self.position_of(e).is_some()
    }

    pub fn get(&self, e: Entity) -> Option<&SceneObject<V>> {
        self.position_of(e).map(|p| &self.objects[p])
    }

    pub fn get_mut(&mut self, e: Entity) -> Option<&mut SceneObject<V>> {
        self.position_of(e).map(move |p| &mut self.objects[p])
    }

    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.objects.iter().find(|o| o.name == name).map(|o| o.id)
    }

    #[inline]
    pub fn objects(&self) -> &[SceneObject<V>] {
        &self.objects
    }

    #[inline]
    pub fn objects_mut(&mut self) -> &mut [SceneObject<V>] {
        &mut self.objects
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Property bag and objects borrowed together, as a physics step needs.
    pub fn split_mut(&mut self) -> (&Map<String, Value>, &mut [SceneObject<V>]) {
        (&self.properties, &mut self.objects)
    }

    /// Load a scene from its JSON record.
    ///
    /// Individual components that fail to parse are skipped with a warning;
    /// only a structurally broken document is an error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if let Some(is_3d) = value.get("is_3d").and_then(Value::as_bool) {
            if is_3d != (V::DIM == 3) {
                return Err(PhysicsError::format(format_args!(
                    "scene is {} but a {} scene was requested",
                    if is_3d { "3D" } else { "2D" },
                    V::LABEL
                )));
            }
        }
        let record: SceneRecord<V> = serde_json::from_value(value)
            .map_err(|e| PhysicsError::from(e).context("reading scene objects"))?;

        let mut scene = Scene::new(record.name);
        scene.properties = record.scene_properties;
        for obj in record.objects {
            let id = scene.spawn(obj.name, obj.position);
            let Some(target) = scene.get_mut(id) else {
                continue;
            };
            target.uid = obj.uid;
            target.rotation = obj.rotation;
            target.scale = obj.scale;
            for component in &obj.components {
                if let Err(e) = target.add_component_record(component) {
                    warn!("skipping component: {}", e);
                }
            }
        }
        Ok(scene)
    }
}

#[derive(Deserialize)]
#[serde(bound = "")]
struct SceneRecord<V: PhysicsVector> {
    #[serde(default)]
    name: String,
    #[serde(default)]
    scene_properties: Map<String, Value>,
    #[serde(default)]
    objects: Vec<ObjectRecord<V>>,
}

#[derive(Deserialize)]
#[serde(bound = "")]
struct ObjectRecord<V: PhysicsVector> {
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default = "V::zero")]
    position: V,
    #[serde(default)]
    rotation: V::Angular,
    #[serde(default = "V::one")]
    scale: V,
    #[serde(default)]
    components: Vec<Value>,
}
