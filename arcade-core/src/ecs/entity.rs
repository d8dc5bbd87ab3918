// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Entity records
//!
//! An [`Entity`] is a homogeneous record: transform, kinematics, collision
//! attributes and lifecycle flags shared by every game object, plus a typed
//! [`Payload`] for the data only some kinds of object carry. Per-type logic
//! lives in the behavior table, not on the entity.

use crate::ecs::components::{DamageReport, Payload};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Unique identifier for an entity
///
/// Ids are assigned by the registry starting at 1 and are never reused while
/// the registry lives. [`EntityId::UNASSIGNED`] marks an entity that has not
/// been registered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Placeholder id carried by entities before registration
    pub const UNASSIGNED: EntityId = EntityId(0);

    /// Create a new EntityId from a raw u64 value
    pub fn new(id: u64) -> Self {
        EntityId(id)
    }

    /// Get the raw u64 value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Whether this id was handed out by a registry
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Classification tag used for the type index and behavior dispatch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(Cow<'static, str>);

impl EntityType {
    /// Untyped default
    pub const ENTITY: EntityType = EntityType::new("entity");
    /// Player-controlled character
    pub const PLAYER: EntityType = EntityType::new("player");
    /// Hostile character
    pub const ENEMY: EntityType = EntityType::new("enemy");
    /// Companion that follows the player
    pub const COMPANION: EntityType = EntityType::new("companion");
    /// Short-lived damaging object
    pub const PROJECTILE: EntityType = EntityType::new("projectile");
    /// Static level geometry
    pub const OBSTACLE: EntityType = EntityType::new("obstacle");
    /// Goal region
    pub const OBJECTIVE: EntityType = EntityType::new("objective");
    /// Generic overlap region
    pub const TRIGGER: EntityType = EntityType::new("trigger");

    /// Create a type tag from a static name
    pub const fn new(name: &'static str) -> Self {
        EntityType(Cow::Borrowed(name))
    }

    /// Create a type tag from a runtime name (level data, scripts)
    pub fn custom(name: impl Into<String>) -> Self {
        EntityType(Cow::Owned(name.into()))
    }

    /// The tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collision layer bits
///
/// An entity belongs to the categories in its `layer` and is willing to
/// collide with the categories in its `mask`. Both sides must opt in.
pub mod layers {
    /// Belongs to / collides with nothing
    pub const NONE: u32 = 0;
    /// Player characters
    pub const PLAYER: u32 = 1;
    /// Enemies and their attacks
    pub const ENEMY: u32 = 2;
    /// Level geometry
    pub const WALL: u32 = 4;
    /// Pickups
    pub const ITEM: u32 = 8;
    /// Overlap regions
    pub const TRIGGER: u32 = 16;
    /// Every category
    pub const ALL: u32 = 255;
}

/// Axis-aligned rectangle in world space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum x
    pub left: f32,
    /// Minimum y
    pub top: f32,
    /// Maximum x
    pub right: f32,
    /// Maximum y
    pub bottom: f32,
}

impl Bounds {
    /// Create bounds from edges
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Bounds {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create bounds from a top-left corner and a size
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Bounds::new(pos.x, pos.y, pos.x + size.x, pos.y + size.y)
    }

    /// Width of the rectangle
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the rectangle
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Horizontal center
    pub fn center_x(&self) -> f32 {
        self.left + self.width() / 2.0
    }

    /// Vertical center
    pub fn center_y(&self) -> f32 {
        self.top + self.height() / 2.0
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x(), self.center_y())
    }

    /// Strict overlap: touching edges do not count
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    /// Inclusive intersection, used by region queries
    pub fn touches(&self, other: &Bounds) -> bool {
        self.right >= other.left
            && self.left <= other.right
            && self.bottom >= other.top
            && self.top <= other.bottom
    }

    /// Inclusive point containment
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

/// A game object
///
/// Position is the top-left corner. Bounds are always derived from
/// position and size via [`Entity::bounds`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub(crate) id: EntityId,
    /// Classification tag
    pub entity_type: EntityType,

    /// Current top-left position
    pub pos: Vec2,
    /// Position at the start of the current tick, for interpolation
    pub prev_pos: Vec2,
    /// Velocity in units per second
    pub vel: Vec2,
    /// Acceleration in units per second squared
    pub accel: Vec2,
    /// Width and height
    pub size: Vec2,

    /// Categories this entity belongs to
    pub layer: u32,
    /// Categories this entity collides with
    pub mask: u32,
    /// Participates in the spatial grid and collision tests
    pub solid: bool,
    /// Detects overlap but is never positionally resolved
    pub is_trigger: bool,
    /// Never displaced by collision response
    pub is_static: bool,
    /// Relative mass for positional correction (non-positive counts as 1)
    pub mass: f32,
    /// Fraction of velocity kept when bouncing off a static body
    pub bounciness: f32,

    /// Updated by the registry each tick
    pub is_active: bool,
    /// Removed at the next flush point
    pub is_dead: bool,
    /// Included in render frames
    pub is_visible: bool,
    /// Render order; higher draws later
    pub depth: i32,

    /// Type-specific data
    pub payload: Payload,
}

impl Entity {
    /// Create an unregistered, non-solid 16x16 entity
    pub fn new(entity_type: EntityType, pos: Vec2) -> Self {
        Entity {
            id: EntityId::UNASSIGNED,
            entity_type,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            accel: Vec2::ZERO,
            size: Vec2::new(16.0, 16.0),
            layer: layers::NONE,
            mask: layers::ALL,
            solid: false,
            is_trigger: false,
            is_static: false,
            mass: 1.0,
            bounciness: 0.0,
            is_active: true,
            is_dead: false,
            is_visible: true,
            depth: 0,
            payload: Payload::None,
        }
    }

    /// Pre-assign an id (the registry keeps it instead of allocating one)
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    /// Set width and height
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    /// Set the initial velocity
    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    /// Make the entity solid on the given layer and mask
    pub fn solid(mut self, layer: u32, mask: u32) -> Self {
        self.solid = true;
        self.layer = layer;
        self.mask = mask;
        self
    }

    /// Mark as static geometry
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as a trigger region
    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Set the mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set the bounciness
    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }

    /// Set the render depth
    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// The entity's id ([`EntityId::UNASSIGNED`] before registration)
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Bounds derived from the current position and size
    pub fn bounds(&self) -> Bounds {
        Bounds::from_pos_size(self.pos, self.size)
    }

    /// Center of the current bounds
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Mass used for positional correction
    pub fn effective_mass(&self) -> f32 {
        if self.mass > 0.0 && self.mass.is_finite() {
            self.mass
        } else {
            1.0
        }
    }

    /// Active and not dead
    pub fn is_live(&self) -> bool {
        self.is_active && !self.is_dead
    }

    /// Explicit Euler step: acceleration into velocity, velocity into position
    pub fn integrate(&mut self, dt: f32) {
        self.vel += self.accel * dt;
        self.pos += self.vel * dt;
    }

    /// Position blended between the previous and current tick
    pub fn interpolated(&self, alpha: f32) -> Vec2 {
        self.prev_pos.lerp(self.pos, alpha)
    }

    /// Mark for removal at the next flush point
    pub fn destroy(&mut self) {
        self.is_dead = true;
    }

    /// Hurt an `Actor` payload
    ///
    /// Returns `None` for entities without vitals.
    pub fn take_damage(&mut self, amount: f32) -> Option<DamageReport> {
        let vitals = self.payload.as_actor_mut()?;
        let before = vitals.health;
        let defeated = vitals.apply_damage(amount);
        Some(DamageReport {
            dealt: before - vitals.health,
            remaining: vitals.health,
            defeated,
        })
    }

    /// Distance between top-left corners
    pub fn distance_to(&self, other: &Entity) -> f32 {
        self.pos.distance(other.pos)
    }

    /// Angle from this entity to another, in radians
    pub fn angle_to(&self, other: &Entity) -> f32 {
        let delta = other.pos - self.pos;
        delta.y.atan2(delta.x)
    }

    /// Whether every kinematic field is finite
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.accel.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert!(id.is_assigned());
        assert!(!EntityId::UNASSIGNED.is_assigned());
        assert_eq!(id.to_string(), "Entity(42)");
    }

    #[test]
    fn test_bounds_derived_from_position() {
        let mut entity = Entity::new(EntityType::ENTITY, Vec2::new(8.0, 4.0)).with_size(16.0, 10.0);
        let b = entity.bounds();
        assert_eq!((b.left, b.top, b.right, b.bottom), (8.0, 4.0, 24.0, 14.0));
        assert_eq!(b.center(), Vec2::new(16.0, 9.0));

        entity.pos = Vec2::new(0.0, 0.0);
        assert_eq!(entity.bounds().right, 16.0);
    }

    #[test]
    fn test_strict_overlap_excludes_touching() {
        let a = Bounds::new(0.0, 0.0, 16.0, 16.0);
        let b = Bounds::new(16.0, 0.0, 32.0, 16.0);
        assert!(!a.overlaps(&b));
        assert!(a.touches(&b));
        assert!(a.overlaps(&Bounds::new(15.0, 15.0, 20.0, 20.0)));
    }

    #[test]
    fn test_integrate_and_interpolate() {
        let mut entity = Entity::new(EntityType::ENTITY, Vec2::ZERO).with_velocity(Vec2::new(60.0, 0.0));
        entity.accel = Vec2::new(0.0, 120.0);
        entity.prev_pos = entity.pos;
        entity.integrate(0.5);
        assert_eq!(entity.vel, Vec2::new(60.0, 60.0));
        assert_eq!(entity.pos, Vec2::new(30.0, 30.0));
        assert_eq!(entity.interpolated(0.5), Vec2::new(15.0, 15.0));
    }

    #[test]
    fn test_effective_mass() {
        let entity = Entity::new(EntityType::ENTITY, Vec2::ZERO);
        assert_eq!(entity.with_mass(0.0).effective_mass(), 1.0);
        let heavy = Entity::new(EntityType::ENTITY, Vec2::ZERO).with_mass(3.0);
        assert_eq!(heavy.effective_mass(), 3.0);
    }

    #[test]
    fn test_entity_type_tags() {
        assert_eq!(EntityType::PLAYER.as_str(), "player");
        assert_eq!(EntityType::custom("player"), EntityType::PLAYER);
    }

    #[test]
    fn test_take_damage_needs_vitals() {
        let mut rock = Entity::new(EntityType::OBSTACLE, Vec2::ZERO);
        assert!(rock.take_damage(5.0).is_none());

        let mut enemy = Entity::new(EntityType::ENEMY, Vec2::ZERO)
            .with_payload(Payload::Actor(crate::ecs::components::Vitals::new(10.0)));
        let report = enemy.take_damage(4.0).unwrap();
        assert_eq!(report.dealt, 4.0);
        assert_eq!(report.remaining, 6.0);
        assert!(!report.defeated);
        assert!(enemy.take_damage(8.0).unwrap().defeated);
    }
}
