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
//! Pooled visual particles

use super::{ObjectPool, PoolConfig, PoolHandle, PoolStats, Poolable};
use crate::ecs::Bounds;
use glam::Vec2;
use rand::Rng;

/// A single cosmetic particle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Particle {
    /// Position
    pub pos: Vec2,
    /// Velocity in units per second
    pub vel: Vec2,
    /// Seconds left before the particle expires
    pub life: f32,
    /// Lifetime it was spawned with
    pub max_life: f32,
    /// Edge length of the square sprite
    pub size: f32,
    /// Packed 0xRRGGBB colour
    pub color: u32,
    /// Fade factor, 1 at spawn and 0 at expiry
    pub alpha: f32,
}

/// Spawn arguments for a [`Particle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleInit {
    /// Spawn position
    pub pos: Vec2,
    /// Initial velocity
    pub vel: Vec2,
    /// Lifetime in seconds
    pub life: f32,
    /// Sprite size
    pub size: f32,
    /// Packed 0xRRGGBB colour
    pub color: u32,
}

impl Poolable for Particle {
    type Init = ParticleInit;

    fn reset(&mut self, init: ParticleInit) {
        self.pos = init.pos;
        self.vel = init.vel;
        self.life = init.life.max(0.0);
        self.max_life = self.life;
        self.size = init.size;
        self.color = init.color;
        self.alpha = 1.0;
    }
}

impl Particle {
    fn step(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.life -= dt;
        self.alpha = if self.max_life > 0.0 {
            (self.life / self.max_life).max(0.0)
        } else {
            0.0
        };
    }
}

/// Pool of particles confined to a playfield
#[derive(Debug)]
pub struct ParticlePool {
    pool: ObjectPool<Particle>,
    playfield: Bounds,
}

impl ParticlePool {
    /// Speed range of burst particles, per axis
    pub const BURST_SPEED: f32 = 100.0;

    /// Create a pool pre-populated per `config`
    pub fn new(config: PoolConfig, playfield: Bounds) -> Self {
        ParticlePool {
            pool: ObjectPool::new(config),
            playfield,
        }
    }

    /// Spawn one particle
    pub fn emit(&mut self, init: ParticleInit) -> PoolHandle {
        self.pool.acquire(init)
    }

    /// Spawn `count` particles around `center` with random velocities
    pub fn burst<R: Rng + ?Sized>(&mut self, rng: &mut R, center: Vec2, count: usize, color: u32) {
        for _ in 0..count {
            let vel = Vec2::new(
                rng.random_range(-Self::BURST_SPEED..=Self::BURST_SPEED),
                rng.random_range(-Self::BURST_SPEED..=Self::BURST_SPEED),
            );
            self.emit(ParticleInit {
                pos: center,
                vel,
                life: rng.random_range(0.3..=0.8),
                size: rng.random_range(2.0..=5.0),
                color,
            });
        }
    }

    /// Advance every live particle and release expired or escaped ones
    ///
    /// Returns how many particles were released.
    pub fn update_all(&mut self, dt: f32) -> usize {
        let playfield = self.playfield;
        let mut expired = Vec::new();
        self.pool.for_each_active_mut(|handle, particle| {
            particle.step(dt);
            if particle.life <= 0.0 || !playfield.contains_point(particle.pos) {
                expired.push(handle);
            }
        });

        expired.into_iter().filter(|h| self.pool.release(*h)).count()
    }

    /// Release every particle
    pub fn release_all(&mut self) {
        self.pool.release_all();
    }

    /// Iterate over live particles
    pub fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.pool.iter_active().map(|(_, p)| p)
    }

    /// Look up one particle
    pub fn get(&self, handle: PoolHandle) -> Option<&Particle> {
        self.pool.get(handle)
    }

    /// Number of live particles
    pub fn active_len(&self) -> usize {
        self.pool.active_len()
    }

    /// Pool counters
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}
