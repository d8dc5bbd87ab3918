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
//! Canonical entity store
//!
//! The registry owns every entity outright. During an update pass (and
//! during collision notification) structural changes are never applied
//! immediately: adds, removes and damage are queued and applied together at
//! the flush point that ends the pass. Code running inside a pass can
//! therefore spawn entities or destroy itself without disturbing the
//! iteration in progress.
//!
//! Entity callbacks are fail-soft. An error returned by a movement or
//! behavior, or a panic raised inside one, is caught here, logged, and the
//! entity is marked dead; every other entity still runs.

use crate::ecs::{
    Archetype, Archetypes, Bounds, Command, Commands, Entity, EntityId, EntityType, Resources,
};
use crate::error::BehaviorError;
use crate::events::{SimEvent, SoundCue};
use crate::render::VisualState;
use glam::Vec2;
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};

/// Why an entity callback was abandoned
#[derive(Debug)]
enum Fault {
    Error(BehaviorError),
    Panic(String),
}

impl Fault {
    fn describe(&self) -> String {
        match self {
            Fault::Error(e) => e.to_string(),
            Fault::Panic(msg) => format!("panicked: {}", msg),
        }
    }
}

/// Run an entity callback, converting errors and panics into a [`Fault`]
fn guarded<F>(f: F) -> Result<(), Fault>
where
    F: FnOnce() -> Result<(), BehaviorError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Fault::Error(e)),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(Fault::Panic(msg))
        }
    }
}

fn check_finite(entity: &Entity) -> Result<(), BehaviorError> {
    if entity.is_finite() {
        Ok(())
    } else {
        Err(BehaviorError::NonFinite {
            entity: entity.id().raw(),
        })
    }
}

/// Counters describing the registry's contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryStats {
    /// Registered entities
    pub total: usize,
    /// Entities with `is_active`
    pub active: usize,
    /// Entities with `is_visible`
    pub visible: usize,
    /// Entities marked dead but not yet flushed
    pub dead: usize,
    /// Queued adds awaiting the next flush
    pub pending_adds: usize,
    /// Queued removes awaiting the next flush
    pub pending_removes: usize,
    /// Entity count per type tag
    pub by_type: BTreeMap<String, usize>,
}

/// Owner of all entities, their type index and per-type behavior
#[derive(Debug)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
    /// Insertion order; iteration follows it for determinism
    order: Vec<EntityId>,
    type_index: HashMap<EntityType, Vec<EntityId>>,
    archetypes: Archetypes,
    next_id: u64,
    updating: bool,
    pending_adds: Vec<Entity>,
    pending_removes: Vec<EntityId>,
    pending_damage: Vec<(EntityId, f32, Option<EntityId>)>,
}

impl EntityRegistry {
    /// Create an empty registry whose entities all use the default archetype
    pub fn new() -> Self {
        Self::with_archetypes(Archetypes::new())
    }

    /// Create an empty registry with a behavior table
    pub fn with_archetypes(archetypes: Archetypes) -> Self {
        EntityRegistry {
            entities: HashMap::new(),
            order: Vec::new(),
            type_index: HashMap::new(),
            archetypes,
            next_id: 1,
            updating: false,
            pending_adds: Vec::new(),
            pending_removes: Vec::new(),
            pending_damage: Vec::new(),
        }
    }

    /// Register or replace the archetype for a type
    pub fn register_archetype(&mut self, entity_type: EntityType, archetype: Archetype) {
        self.archetypes.register(entity_type, archetype);
    }

    /// The behavior table
    pub fn archetypes(&self) -> &Archetypes {
        &self.archetypes
    }

    // ----------------------------------------------------------------------
    // Lifecycle
    // ----------------------------------------------------------------------

    /// Register an entity and return its id
    ///
    /// An entity without an id (or whose id is already taken) receives the
    /// next free one. Inside a pass the entity is queued and becomes visible
    /// at the flush point.
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        if entity.id.is_assigned() && !self.id_in_use(entity.id) {
            self.next_id = self.next_id.max(entity.id.raw() + 1);
        } else {
            if entity.id.is_assigned() {
                log::warn!("{} is already registered; assigning a fresh id", entity.id);
            }
            entity.id = EntityId::new(self.next_id);
            self.next_id += 1;
        }

        let id = entity.id;
        if self.updating {
            log::trace!("queueing add of {} ({})", id, entity.entity_type);
            self.pending_adds.push(entity);
        } else {
            self.insert_now(entity);
        }
        id
    }

    /// Remove an entity
    ///
    /// Unknown ids are ignored. Inside a pass the removal is queued. Returns
    /// whether anything was removed or queued.
    pub fn remove(&mut self, id: EntityId) -> bool {
        if self.updating {
            let known = self.entities.contains_key(&id) || self.pending_adds.iter().any(|e| e.id == id);
            if known {
                self.pending_removes.push(id);
            }
            known
        } else {
            self.remove_now(id)
        }
    }

    fn id_in_use(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id) || self.pending_adds.iter().any(|e| e.id == id)
    }

    fn insert_now(&mut self, mut entity: Entity) {
        let id = entity.id;
        let behavior = &self.archetypes.get(&entity.entity_type).behavior;
        if let Err(fault) = guarded(|| {
            behavior.on_added(&mut entity);
            Ok(())
        }) {
            log::error!("on_added hook for {} failed: {}", id, fault.describe());
        }

        self.type_index
            .entry(entity.entity_type.clone())
            .or_default()
            .push(id);
        self.order.push(id);
        self.entities.insert(id, entity);
    }

    fn remove_now(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.remove(&id) else {
            return false;
        };

        let behavior = &self.archetypes.get(&entity.entity_type).behavior;
        if let Err(fault) = guarded(|| {
            behavior.on_removed(&entity);
            Ok(())
        }) {
            log::error!("on_removed hook for {} failed: {}", id, fault.describe());
        }

        self.unindex(id, &entity.entity_type);
        self.order.retain(|&other| other != id);
        true
    }

    fn unindex(&mut self, id: EntityId, entity_type: &EntityType) {
        let emptied = match self.type_index.get_mut(entity_type) {
            Some(ids) => {
                ids.retain(|&other| other != id);
                ids.is_empty()
            }
            None => false,
        };
        if emptied {
            self.type_index.remove(entity_type);
        }
    }

    /// Remove every entity immediately, running `on_removed` for each
    ///
    /// Also drops anything queued. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        let ids = std::mem::take(&mut self.order);
        for id in ids {
            let Some(entity) = self.entities.remove(&id) else {
                continue;
            };
            let behavior = &self.archetypes.get(&entity.entity_type).behavior;
            if let Err(fault) = guarded(|| {
                behavior.on_removed(&entity);
                Ok(())
            }) {
                log::error!("on_removed hook for {} failed: {}", id, fault.describe());
            }
        }
        self.entities.clear();
        self.type_index.clear();
        self.pending_adds.clear();
        self.pending_removes.clear();
        self.pending_damage.clear();
        log::debug!("registry cleared");
    }

    // ----------------------------------------------------------------------
    // Passes
    // ----------------------------------------------------------------------

    /// Whether structural changes are currently being queued
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Start queueing structural changes until the next [`flush`](Self::flush)
    pub fn begin_deferred(&mut self) {
        self.updating = true;
    }

    /// Run one update pass
    ///
    /// Every active entity present at the start of the pass has its
    /// movement and behavior run exactly once, in insertion order. Entities
    /// that are dead (already, or after their own update) are collected.
    /// Queued adds, damage and removes are then applied in one flush.
    pub fn update(&mut self, dt: f32, resources: &mut Resources) {
        self.begin_deferred();
        let snapshot = self.order.clone();
        let mut commands = Commands::new();

        for id in snapshot {
            let Some(mut entity) = self.entities.remove(&id) else {
                continue;
            };
            if entity.is_dead {
                self.pending_removes.push(id);
                self.entities.insert(id, entity);
                continue;
            }
            if !entity.is_active {
                self.entities.insert(id, entity);
                continue;
            }

            entity.prev_pos = entity.pos;
            let tagged = entity.entity_type.clone();
            let outcome = {
                let archetype = self.archetypes.get(&entity.entity_type);
                let mut ctx = resources.context(dt, self, &mut commands);
                guarded(|| {
                    archetype.movement.step(&mut entity, &ctx)?;
                    archetype.behavior.update(&mut entity, &mut ctx)?;
                    check_finite(&entity)
                })
            };
            if entity.entity_type != tagged {
                self.unindex(id, &tagged);
                self.type_index
                    .entry(entity.entity_type.clone())
                    .or_default()
                    .push(id);
            }
            self.settle(entity, outcome, "update", &mut commands, &mut resources.events);
        }

        self.flush(&mut resources.events);
    }

    /// Deliver one collision notification to each side of a pair
    ///
    /// Meant to run between [`begin_deferred`](Self::begin_deferred) and
    /// [`flush`](Self::flush). Missing ids are skipped, and so is the
    /// callback of a side already marked dead this tick.
    pub fn notify_pair(&mut self, a: EntityId, b: EntityId, dt: f32, resources: &mut Resources) {
        let mut commands = Commands::new();
        self.notify(a, b, dt, resources, &mut commands);
        self.notify(b, a, dt, resources, &mut commands);
    }

    fn notify(
        &mut self,
        id: EntityId,
        other_id: EntityId,
        dt: f32,
        resources: &mut Resources,
        commands: &mut Commands,
    ) {
        // Dead entities stay visible to their partner but get no callback.
        if self.entities.get(&id).map_or(true, |e| e.is_dead) {
            return;
        }
        let Some(mut entity) = self.entities.remove(&id) else {
            return;
        };
        let outcome = match self.entities.get(&other_id) {
            Some(other) => {
                let behavior = &self.archetypes.get(&entity.entity_type).behavior;
                let mut ctx = resources.context(dt, self, commands);
                guarded(|| {
                    behavior.on_collision(&mut entity, other, &mut ctx)?;
                    check_finite(&entity)
                })
            }
            None => Ok(()),
        };
        self.settle(entity, outcome, "on_collision", commands, &mut resources.events);
    }

    /// Put a detached entity back, recording any fault and draining its commands
    fn settle(
        &mut self,
        mut entity: Entity,
        outcome: Result<(), Fault>,
        stage: &str,
        commands: &mut Commands,
        events: &mut Vec<SimEvent>,
    ) {
        let id = entity.id;
        if let Err(fault) = outcome {
            match &fault {
                Fault::Error(e) => {
                    log::warn!("{} {} failed in {}: {}", entity.entity_type, id, stage, e)
                }
                Fault::Panic(msg) => {
                    log::error!("{} {} panicked in {}: {}", entity.entity_type, id, stage, msg)
                }
            }
            entity.is_dead = true;
            events.push(SimEvent::EntityFault {
                entity: id,
                reason: fault.describe(),
            });
        }

        let dead = entity.is_dead;
        self.entities.insert(id, entity);
        if dead && !self.pending_removes.contains(&id) {
            self.pending_removes.push(id);
        }

        let queued: Vec<Command> = commands.drain().collect();
        for command in queued {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Spawn(entity) => {
                self.add(*entity);
            }
            Command::Despawn(id) => {
                self.remove(id);
            }
            Command::Damage {
                target,
                amount,
                source,
            } => self.queue_damage(target, amount, source),
        }
    }

    /// Queue damage against an `Actor`, applied at the next flush
    pub fn queue_damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) {
        self.pending_damage.push((target, amount, source));
    }

    /// Apply everything queued since [`begin_deferred`](Self::begin_deferred)
    ///
    /// Adds land first, then damage, then removes. Queue order is kept within
    /// each group.
    pub fn flush(&mut self, events: &mut Vec<SimEvent>) {
        self.updating = false;

        let adds = std::mem::take(&mut self.pending_adds);
        let add_count = adds.len();
        for entity in adds {
            self.insert_now(entity);
        }

        for (target, amount, source) in std::mem::take(&mut self.pending_damage) {
            let Some(entity) = self.entities.get_mut(&target) else {
                continue;
            };
            if let Some(report) = entity.take_damage(amount) {
                if report.dealt > 0.0 {
                    events.push(SimEvent::Damaged {
                        target,
                        source,
                        amount: report.dealt,
                        remaining: report.remaining,
                    });
                    events.push(SimEvent::Sound(SoundCue::Hit));
                }
            }
        }

        let removes = std::mem::take(&mut self.pending_removes);
        let removed = removes.into_iter().filter(|id| self.remove_now(*id)).count();

        if add_count > 0 || removed > 0 {
            log::trace!("flush: {} added, {} removed", add_count, removed);
        }
    }

    // ----------------------------------------------------------------------
    // Queries (live set)
    // ----------------------------------------------------------------------

    /// Look up an entity by id
    ///
    /// Inside a callback the entity being called is not visible here.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable lookup, for use between passes
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Whether `id` is in the live set
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether there are no live entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.order.iter().filter_map(move |id| self.entities.get(id))
    }

    /// Entities tagged `entity_type`, in insertion order
    pub fn by_type(&self, entity_type: &EntityType) -> Vec<&Entity> {
        self.type_index
            .get(entity_type)
            .map(|ids| ids.iter().filter_map(|id| self.entities.get(id)).collect())
            .unwrap_or_default()
    }

    /// Entities whose tag is any of `types`, grouped by type in the given order
    pub fn by_types(&self, types: &[EntityType]) -> Vec<&Entity> {
        types.iter().flat_map(|t| self.by_type(t)).collect()
    }

    /// Entities matching a predicate
    pub fn query(&self, predicate: impl Fn(&Entity) -> bool) -> Vec<&Entity> {
        self.iter().filter(|e| predicate(e)).collect()
    }

    /// First entity matching a predicate
    pub fn find(&self, predicate: impl Fn(&Entity) -> bool) -> Option<&Entity> {
        self.iter().find(|e| predicate(e))
    }

    /// Entities whose center lies within `radius` of `point`, nearest first
    pub fn in_radius(&self, point: Vec2, radius: f32) -> Vec<&Entity> {
        let mut hits: Vec<(f32, &Entity)> = self
            .iter()
            .map(|e| (e.center().distance(point), e))
            .filter(|(d, _)| *d <= radius)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, e)| e).collect()
    }

    /// Entities whose bounds overlap `rect`
    pub fn in_rect(&self, rect: &Bounds) -> Vec<&Entity> {
        self.iter().filter(|e| e.bounds().overlaps(rect)).collect()
    }

    /// Render state for an entity, from its archetype
    pub fn visual_state(&self, entity: &Entity) -> VisualState {
        self.archetypes
            .get(&entity.entity_type)
            .behavior
            .visual_state(entity)
    }

    /// Snapshot of registry counters
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: self.entities.len(),
            pending_adds: self.pending_adds.len(),
            pending_removes: self.pending_removes.len(),
            ..RegistryStats::default()
        };
        for entity in self.entities.values() {
            stats.active += entity.is_active as usize;
            stats.visible += entity.is_visible as usize;
            stats.dead += entity.is_dead as usize;
            *stats
                .by_type
                .entry(entity.entity_type.as_str().to_string())
                .or_default() += 1;
        }
        stats
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
