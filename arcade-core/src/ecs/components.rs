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
//! Typed per-entity payloads
//!
//! Data that only some entity kinds carry lives in [`Payload`], a tagged
//! union hung off the otherwise homogeneous [`Entity`](crate::ecs::Entity)
//! record. Behaviors match on the variant they expect and report
//! [`BehaviorError::MissingPayload`](crate::error::BehaviorError) otherwise.

use crate::ecs::{EntityId, EntityType};
use serde::{Deserialize, Serialize};

/// Type-specific entity data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// No extra data
    #[default]
    None,
    /// Something with health that can be hurt and defeated
    Actor(Vitals),
    /// A damaging shot
    Projectile(ProjectileState),
    /// Labelled level geometry
    Obstacle(ObstacleState),
    /// A goal region
    Objective(ObjectiveState),
}

impl Payload {
    /// Variant name, for error messages and render state
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::None => "none",
            Payload::Actor(_) => "actor",
            Payload::Projectile(_) => "projectile",
            Payload::Obstacle(_) => "obstacle",
            Payload::Objective(_) => "objective",
        }
    }

    /// Actor vitals, if present
    pub fn as_actor(&self) -> Option<&Vitals> {
        match self {
            Payload::Actor(vitals) => Some(vitals),
            _ => None,
        }
    }

    /// Mutable actor vitals, if present
    pub fn as_actor_mut(&mut self) -> Option<&mut Vitals> {
        match self {
            Payload::Actor(vitals) => Some(vitals),
            _ => None,
        }
    }

    /// Projectile state, if present
    pub fn as_projectile(&self) -> Option<&ProjectileState> {
        match self {
            Payload::Projectile(state) => Some(state),
            _ => None,
        }
    }

    /// Mutable projectile state, if present
    pub fn as_projectile_mut(&mut self) -> Option<&mut ProjectileState> {
        match self {
            Payload::Projectile(state) => Some(state),
            _ => None,
        }
    }
}

/// Health and damage bookkeeping
///
/// # Examples
///
/// ```
/// use arcade_core::ecs::components::Vitals;
///
/// let mut vitals = Vitals::new(30.0);
/// assert!(!vitals.apply_damage(10.0));
/// assert_eq!(vitals.health, 20.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current health
    pub health: f32,
    /// Health ceiling
    pub max_health: f32,
    /// Seconds of damage immunity remaining
    pub invulnerable_for: f32,
    /// Immunity granted after each hit
    pub invulnerability_window: f32,
}

impl Vitals {
    /// Create full-health vitals
    ///
    /// # Panics
    ///
    /// Panics if `max_health` is not positive and finite. This is a
    /// programming error in entity setup, not a runtime condition.
    pub fn new(max_health: f32) -> Self {
        assert!(
            max_health > 0.0 && max_health.is_finite(),
            "Max health must be positive and finite"
        );
        Vitals {
            health: max_health,
            max_health,
            invulnerable_for: 0.0,
            invulnerability_window: 0.0,
        }
    }

    /// Grant a period of immunity after each hit
    pub fn with_invulnerability(mut self, seconds: f32) -> Self {
        self.invulnerability_window = seconds.max(0.0);
        self
    }

    /// Whether health has run out
    pub fn is_defeated(&self) -> bool {
        self.health <= 0.0
    }

    /// Health as a fraction of the maximum, clamped to [0, 1]
    pub fn fraction(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Apply damage unless immune
    ///
    /// Returns true when this hit took the actor from alive to defeated.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if self.is_defeated() || self.invulnerable_for > 0.0 || amount <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.invulnerable_for = self.invulnerability_window;
        self.is_defeated()
    }

    /// Count down the immunity timer
    pub fn tick(&mut self, dt: f32) {
        self.invulnerable_for = (self.invulnerable_for - dt).max(0.0);
    }
}

/// Outcome of [`Entity::take_damage`](crate::ecs::Entity::take_damage)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    /// Health actually removed (0 while invulnerable)
    pub dealt: f32,
    /// Health left
    pub remaining: f32,
    /// This hit took the actor to zero
    pub defeated: bool,
}

/// State carried by projectile entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Damage dealt on hit
    pub damage: f32,
    /// Entity that fired it; never damaged by its own shot
    pub owner: Option<EntityId>,
    /// Type of entity this projectile is meant to hit
    pub target: EntityType,
    /// Seconds left before expiry
    pub lifetime: f32,
    /// Lifetime at spawn
    pub max_lifetime: f32,
}

impl ProjectileState {
    /// Create a projectile aimed at `target` that expires after `lifetime` seconds
    pub fn new(damage: f32, target: EntityType, lifetime: f32) -> Self {
        ProjectileState {
            damage,
            owner: None,
            target,
            lifetime,
            max_lifetime: lifetime,
        }
    }

    /// Record who fired the projectile
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Label for a piece of level geometry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObstacleState {
    /// Visual variant, e.g. "plant" or "sign"
    pub style: String,
    /// Text drawn above the obstacle
    pub label: String,
}

/// Goal-region state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectiveState {
    /// Set once the player has entered the region
    pub reached: bool,
}
