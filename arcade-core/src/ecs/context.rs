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
//! Call-scoped simulation context
//!
//! Entities never hold references back into the registry or the simulation.
//! Everything a movement or behavior callback may touch is handed to it in a
//! [`TickContext`] that lives only for the duration of the call: a read-only
//! view of the world, a [`Commands`] buffer for structural changes, and the
//! shared services (input, particle and projectile pools, event outbox, rng).

use crate::config::SimConfig;
use crate::ecs::{Bounds, Entity, EntityId, EntityRegistry};
use crate::events::{SimEvent, SoundCue};
use crate::input::InputState;
use crate::pool::{ParticlePool, ProjectilePool};
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// A deferred structural change
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a new entity
    Spawn(Box<Entity>),
    /// Remove an entity
    Despawn(EntityId),
    /// Hurt another entity's `Actor` payload
    Damage {
        /// Entity to hurt
        target: EntityId,
        /// Health to remove
        amount: f32,
        /// Responsible entity
        source: Option<EntityId>,
    },
}

/// Buffer of commands issued by entity callbacks
///
/// The registry drains it after each callback and applies the commands at
/// its next flush point.
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    /// Create an empty buffer
    pub fn new() -> Self {
        Commands::default()
    }

    /// Queue a spawn
    pub fn spawn(&mut self, entity: Entity) {
        self.queue.push(Command::Spawn(Box::new(entity)));
    }

    /// Queue a removal
    pub fn despawn(&mut self, id: EntityId) {
        self.queue.push(Command::Despawn(id));
    }

    /// Queue damage against another entity
    pub fn damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) {
        self.queue.push(Command::Damage {
            target,
            amount,
            source,
        });
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every queued command in issue order
    pub fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.queue.drain(..)
    }
}

/// Services shared by every entity during a tick
#[derive(Debug)]
pub struct Resources {
    /// Input sampled for this tick
    pub input: InputState,
    /// Cosmetic particles
    pub particles: ParticlePool,
    /// Pooled projectiles
    pub projectiles: ProjectilePool,
    /// Events produced this tick, drained by the simulation
    pub events: Vec<SimEvent>,
    /// Deterministic random source
    pub rng: Pcg32,
    /// Region outside which transient objects are discarded
    pub playfield: Bounds,
}

impl Resources {
    /// Build services sized and seeded from `config`
    pub fn new(config: &SimConfig) -> Self {
        Resources {
            input: InputState::new(),
            particles: ParticlePool::new(config.particles.clone(), config.playfield),
            projectiles: ProjectilePool::new(config.projectiles.clone(), config.playfield),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(config.seed),
            playfield: config.playfield,
        }
    }

    /// Borrow everything as a context for one callback
    pub fn context<'c>(
        &'c mut self,
        dt: f32,
        world: &'c EntityRegistry,
        commands: &'c mut Commands,
    ) -> TickContext<'c> {
        TickContext {
            dt,
            world,
            commands,
            input: &self.input,
            particles: &mut self.particles,
            projectiles: &mut self.projectiles,
            events: &mut self.events,
            rng: &mut self.rng,
            playfield: self.playfield,
        }
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources::new(&SimConfig::default())
    }
}

/// Everything one entity callback may use
///
/// `world` excludes the entity being called; that one is passed separately
/// by mutable reference.
pub struct TickContext<'c> {
    /// Tick length in seconds
    pub dt: f32,
    /// Read-only view of the other entities
    pub world: &'c EntityRegistry,
    /// Deferred structural changes
    pub commands: &'c mut Commands,
    /// Input for this tick
    pub input: &'c InputState,
    /// Particle pool
    pub particles: &'c mut ParticlePool,
    /// Projectile pool
    pub projectiles: &'c mut ProjectilePool,
    /// Event outbox
    pub events: &'c mut Vec<SimEvent>,
    /// Random source
    pub rng: &'c mut Pcg32,
    /// Playfield bounds
    pub playfield: Bounds,
}

impl TickContext<'_> {
    /// Push an event
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Request a sound
    pub fn play(&mut self, cue: SoundCue) {
        self.events.push(SimEvent::Sound(cue));
    }

    /// Spray particles around a point
    pub fn burst(&mut self, center: glam::Vec2, count: usize, color: u32) {
        self.particles.burst(&mut *self.rng, center, count, color);
    }
}
