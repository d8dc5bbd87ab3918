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
//! Built-in movement and behavior strategies

use crate::ecs::{Behavior, Entity, EntityType, Movement, TickContext};
use crate::error::BehaviorError;
use crate::events::{SimEvent, SoundCue};
use glam::Vec2;

/// Particles sprayed when a projectile connects
const HIT_BURST: usize = 8;
/// Particles sprayed when an actor is defeated
const DEFEAT_BURST: usize = 16;

/// Explicit Euler integration of acceleration and velocity
#[derive(Debug, Clone, Copy, Default)]
pub struct Ballistic;

impl Movement for Ballistic {
    fn step(&self, entity: &mut Entity, ctx: &TickContext<'_>) -> Result<(), BehaviorError> {
        entity.integrate(ctx.dt);
        Ok(())
    }
}

/// Never moves
#[derive(Debug, Clone, Copy, Default)]
pub struct Stationary;

impl Movement for Stationary {
    fn step(&self, _entity: &mut Entity, _ctx: &TickContext<'_>) -> Result<(), BehaviorError> {
        Ok(())
    }
}

/// Velocity set from the input direction each tick
#[derive(Debug, Clone, Copy)]
pub struct Steered {
    /// Units per second at full deflection
    pub speed: f32,
}

impl Movement for Steered {
    fn step(&self, entity: &mut Entity, ctx: &TickContext<'_>) -> Result<(), BehaviorError> {
        entity.vel = ctx.input.direction() * self.speed;
        entity.pos += entity.vel * ctx.dt;
        Ok(())
    }
}

/// Walk toward the nearest live entity of a type, stopping at a distance
#[derive(Debug, Clone)]
pub struct Follow {
    /// Type to follow
    pub target: EntityType,
    /// Units per second
    pub speed: f32,
    /// Center-to-center distance at which to stop
    pub distance: f32,
}

impl Movement for Follow {
    fn step(&self, entity: &mut Entity, ctx: &TickContext<'_>) -> Result<(), BehaviorError> {
        let center = entity.center();
        let nearest = ctx
            .world
            .by_type(&self.target)
            .into_iter()
            .filter(|e| e.is_live())
            .map(|e| e.center() - center)
            .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()));

        entity.vel = match nearest {
            Some(offset) if offset.length() > self.distance => {
                offset.normalize_or_zero() * self.speed
            }
            _ => Vec2::ZERO,
        };
        entity.pos += entity.vel * ctx.dt;
        Ok(())
    }
}

/// No game logic
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl Behavior for Inert {}

/// Damaging shot with a lifetime
///
/// Expires when its lifetime runs out or it leaves the playfield. On touching
/// an entity of its target type (other than its owner) it queues damage,
/// sprays particles, plays a hit and destroys itself. Static level geometry
/// stops it without damage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectileLogic;

impl Behavior for ProjectileLogic {
    fn update(&self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> Result<(), BehaviorError> {
        let id = entity.id().raw();
        let state = entity
            .payload
            .as_projectile_mut()
            .ok_or(BehaviorError::MissingPayload {
                entity: id,
                expected: "projectile",
            })?;

        state.lifetime -= ctx.dt;
        if state.lifetime <= 0.0 || !ctx.playfield.contains_point(entity.center()) {
            entity.destroy();
        }
        Ok(())
    }

    fn on_collision(
        &self,
        entity: &mut Entity,
        other: &Entity,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), BehaviorError> {
        if entity.is_dead {
            return Ok(());
        }
        let state = entity
            .payload
            .as_projectile()
            .ok_or(BehaviorError::MissingPayload {
                entity: entity.id().raw(),
                expected: "projectile",
            })?;

        if Some(other.id()) == state.owner {
            return Ok(());
        }

        if other.entity_type == state.target {
            let source = state.owner.or(Some(entity.id()));
            ctx.commands.damage(other.id(), state.damage, source);
            ctx.burst(entity.center(), HIT_BURST, 0xffd040);
            ctx.play(SoundCue::Hit);
            entity.destroy();
        } else if other.is_static && !other.is_trigger {
            entity.destroy();
        }
        Ok(())
    }
}

/// Health bookkeeping for anything with `Actor` vitals
///
/// Counts down the invulnerability timer and, once health reaches zero,
/// announces the defeat and destroys the entity. Entities without vitals
/// cannot be hurt and are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorLogic;

impl Behavior for ActorLogic {
    fn update(&self, entity: &mut Entity, ctx: &mut TickContext<'_>) -> Result<(), BehaviorError> {
        let id = entity.id();
        let Some(vitals) = entity.payload.as_actor_mut() else {
            return Ok(());
        };

        vitals.tick(ctx.dt);
        if vitals.is_defeated() {
            ctx.emit(SimEvent::Defeated {
                entity: id,
                entity_type: entity.entity_type.clone(),
            });
            ctx.play(SoundCue::Defeat);
            ctx.burst(entity.center(), DEFEAT_BURST, 0xff4040);
            entity.destroy();
        }
        Ok(())
    }
}

/// Goal region that fires once when a player enters it
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectiveLogic;

impl Behavior for ObjectiveLogic {
    fn on_collision(
        &self,
        entity: &mut Entity,
        other: &Entity,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), BehaviorError> {
        if other.entity_type != EntityType::PLAYER {
            return Ok(());
        }
        let id = entity.id();
        let crate::ecs::components::Payload::Objective(state) = &mut entity.payload else {
            return Err(BehaviorError::MissingPayload {
                entity: id.raw(),
                expected: "objective",
            });
        };

        if !state.reached {
            state.reached = true;
            log::info!("objective {} reached by {}", id, other.id());
            ctx.emit(SimEvent::ObjectiveReached {
                objective: id,
                by: other.id(),
            });
            ctx.play(SoundCue::Objective);
        }
        Ok(())
    }
}
