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
//! Per-type behavior strategies
//!
//! Entities are plain data. What an entity *does* is decided by the
//! [`Archetype`] registered for its [`EntityType`]: a [`Movement`] strategy
//! that advances kinematics and a [`Behavior`] that runs game logic, reacts
//! to collisions and describes how the entity should look. Both are trait
//! objects shared by every entity of the type, so they hold configuration
//! only, never per-entity state.

use crate::ecs::{Entity, EntityType, TickContext};
use crate::error::BehaviorError;
use crate::render::VisualState;
use std::collections::HashMap;
use std::fmt;

/// Advances an entity's kinematics for one tick
pub trait Movement {
    /// Move `entity`; runs before [`Behavior::update`]
    fn step(&self, entity: &mut Entity, ctx: &TickContext<'_>) -> Result<(), BehaviorError>;

    /// Get the name of this strategy for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Game logic attached to an entity type
///
/// Every method has a no-op default.
pub trait Behavior {
    /// Per-tick logic, after movement
    fn update(&self, _entity: &mut Entity, _ctx: &mut TickContext<'_>) -> Result<(), BehaviorError> {
        Ok(())
    }

    /// Called once per overlapping pair per tick
    fn on_collision(
        &self,
        _entity: &mut Entity,
        _other: &Entity,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), BehaviorError> {
        Ok(())
    }

    /// Called when the entity enters the registry
    fn on_added(&self, _entity: &mut Entity) {}

    /// Called when the entity leaves the registry
    fn on_removed(&self, _entity: &Entity) {}

    /// Type-specific render state
    fn visual_state(&self, entity: &Entity) -> VisualState {
        VisualState::from_payload(&entity.payload)
    }

    /// Get the name of this behavior for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Movement plus behavior for one entity type
pub struct Archetype {
    /// Kinematics strategy
    pub movement: Box<dyn Movement>,
    /// Logic strategy
    pub behavior: Box<dyn Behavior>,
}

impl Archetype {
    /// Pair a movement with a behavior
    pub fn new(movement: impl Movement + 'static, behavior: impl Behavior + 'static) -> Self {
        Archetype {
            movement: Box::new(movement),
            behavior: Box::new(behavior),
        }
    }
}

impl Default for Archetype {
    /// Ballistic movement, no logic
    fn default() -> Self {
        Archetype::new(
            crate::ecs::strategies::Ballistic,
            crate::ecs::strategies::Inert,
        )
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("movement", &self.movement.name())
            .field("behavior", &self.behavior.name())
            .finish()
    }
}

/// Archetype table keyed by entity type
///
/// Types without an entry fall back to [`Archetype::default`].
#[derive(Debug, Default)]
pub struct Archetypes {
    table: HashMap<EntityType, Archetype>,
    fallback: Archetype,
}

impl Archetypes {
    /// Create an empty table
    pub fn new() -> Self {
        Archetypes::default()
    }

    /// Table with the built-in game archetypes
    ///
    /// Players steer from input. Projectiles fly ballistically and deal
    /// damage. Enemies and companions drift under their own velocity. Those
    /// three track health when given an `Actor` payload and otherwise
    /// cannot be defeated. Obstacles stay put and objectives report when the
    /// player reaches them.
    pub fn standard() -> Self {
        use crate::ecs::strategies::*;

        let mut table = Archetypes::new();
        table.register(
            EntityType::PLAYER,
            Archetype::new(Steered { speed: 120.0 }, ActorLogic),
        );
        table.register(EntityType::ENEMY, Archetype::new(Ballistic, ActorLogic));
        table.register(EntityType::COMPANION, Archetype::new(Ballistic, ActorLogic));
        table.register(
            EntityType::PROJECTILE,
            Archetype::new(Ballistic, ProjectileLogic),
        );
        table.register(EntityType::OBSTACLE, Archetype::new(Stationary, Inert));
        table.register(EntityType::TRIGGER, Archetype::new(Stationary, Inert));
        table.register(EntityType::OBJECTIVE, Archetype::new(Stationary, ObjectiveLogic));
        table
    }

    /// Register or replace the archetype for a type
    pub fn register(&mut self, entity_type: EntityType, archetype: Archetype) -> Option<Archetype> {
        log::debug!(
            "archetype for {}: {} + {}",
            entity_type,
            archetype.movement.name(),
            archetype.behavior.name()
        );
        self.table.insert(entity_type, archetype)
    }

    /// Archetype used for entities of `entity_type`
    pub fn get(&self, entity_type: &EntityType) -> &Archetype {
        self.table.get(entity_type).unwrap_or(&self.fallback)
    }

    /// Whether the type has an explicit entry
    pub fn contains(&self, entity_type: &EntityType) -> bool {
        self.table.contains_key(entity_type)
    }

    /// Number of explicit entries
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether there are no explicit entries
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
