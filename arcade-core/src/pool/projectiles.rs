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
//! Pooled lightweight projectiles
//!
//! These are bullets that live only in the pool, never in the entity
//! registry. Each tick they move, count down, and probe the collision grid at
//! their center; the first solid entity they touch (other than the shooter)
//! is reported as a hit and the projectile is released.

use super::{ObjectPool, PoolConfig, PoolHandle, PoolStats, Poolable};
use crate::collision::CollisionResolver;
use crate::ecs::{layers, Bounds, EntityId, EntityRegistry};
use glam::Vec2;

/// Default edge length of a projectile
pub const PROJECTILE_SIZE: f32 = 8.0;

/// A pooled projectile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projectile {
    /// Center position
    pub pos: Vec2,
    /// Velocity in units per second
    pub vel: Vec2,
    /// Edge length
    pub size: f32,
    /// Damage dealt on hit
    pub damage: f32,
    /// Shooter, never hit by its own projectile
    pub owner: Option<EntityId>,
    /// Seconds left to live
    pub lifetime: f32,
    /// Layers this projectile can hit
    pub mask: u32,
}

impl Projectile {
    /// Bounds around the center
    pub fn bounds(&self) -> Bounds {
        let half = self.size / 2.0;
        Bounds::new(
            self.pos.x - half,
            self.pos.y - half,
            self.pos.x + half,
            self.pos.y + half,
        )
    }
}

/// Spawn arguments for a [`Projectile`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileInit {
    /// Spawn center
    pub pos: Vec2,
    /// Velocity
    pub vel: Vec2,
    /// Damage dealt on hit
    pub damage: f32,
    /// Shooter
    pub owner: Option<EntityId>,
    /// Lifetime in seconds
    pub lifetime: f32,
    /// Layers this projectile can hit
    pub mask: u32,
}

impl ProjectileInit {
    /// A projectile that hits anything, living two seconds
    pub fn new(pos: Vec2, vel: Vec2, damage: f32) -> Self {
        ProjectileInit {
            pos,
            vel,
            damage,
            owner: None,
            lifetime: 2.0,
            mask: layers::ALL,
        }
    }

    /// Set the shooter
    pub fn with_owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Restrict which layers can be hit
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }
}

impl Poolable for Projectile {
    type Init = ProjectileInit;

    fn reset(&mut self, init: ProjectileInit) {
        self.pos = init.pos;
        self.vel = init.vel;
        self.size = PROJECTILE_SIZE;
        self.damage = init.damage;
        self.owner = init.owner;
        self.lifetime = init.lifetime;
        self.mask = init.mask;
    }
}

/// A projectile striking a solid entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileHit {
    /// Entity that was struck
    pub target: EntityId,
    /// Shooter, if known
    pub owner: Option<EntityId>,
    /// Damage carried
    pub damage: f32,
    /// Where the hit happened
    pub point: Vec2,
}

/// Pool of projectiles confined to a playfield
#[derive(Debug)]
pub struct ProjectilePool {
    pool: ObjectPool<Projectile>,
    playfield: Bounds,
}

impl ProjectilePool {
    /// Create a pool pre-populated per `config`
    pub fn new(config: PoolConfig, playfield: Bounds) -> Self {
        ProjectilePool {
            pool: ObjectPool::new(config),
            playfield,
        }
    }

    /// Launch a projectile
    pub fn fire(&mut self, init: ProjectileInit) -> PoolHandle {
        self.pool.acquire(init)
    }

    /// Advance every projectile, returning the hits of this step
    ///
    /// Expired, escaped and spent projectiles are released after the walk.
    pub fn update_all(
        &mut self,
        dt: f32,
        resolver: &CollisionResolver,
        registry: &EntityRegistry,
    ) -> Vec<ProjectileHit> {
        let playfield = self.playfield;
        let mut spent = Vec::new();
        let mut hits = Vec::new();

        self.pool.for_each_active_mut(|handle, projectile| {
            projectile.pos += projectile.vel * dt;
            projectile.lifetime -= dt;

            if projectile.lifetime <= 0.0 || !playfield.contains_point(projectile.pos) {
                spent.push(handle);
                return;
            }

            let target = resolver
                .solids_at(registry, projectile.pos, projectile.mask)
                .into_iter()
                .find(|id| Some(*id) != projectile.owner);
            if let Some(target) = target {
                hits.push(ProjectileHit {
                    target,
                    owner: projectile.owner,
                    damage: projectile.damage,
                    point: projectile.pos,
                });
                spent.push(handle);
            }
        });

        for handle in spent {
            self.pool.release(handle);
        }
        hits
    }

    /// Release every projectile
    pub fn release_all(&mut self) {
        self.pool.release_all();
    }

    /// Iterate over live projectiles
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> + '_ {
        self.pool.iter_active().map(|(_, p)| p)
    }

    /// Look up one projectile
    pub fn get(&self, handle: PoolHandle) -> Option<&Projectile> {
        self.pool.get(handle)
    }

    /// Number of live projectiles
    pub fn active_len(&self) -> usize {
        self.pool.active_len()
    }

    /// Pool counters
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}
