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
//! Object pooling for short-lived game objects
//!
//! An [`ObjectPool`] owns every instance it ever constructs. Each instance is
//! always in exactly one of two sets: `available` or `active`. `acquire`
//! moves an instance from available to active (constructing one when
//! available is empty) and reinitializes it; `release` moves it back.
//!
//! Callers hold [`PoolHandle`]s rather than references. Handles carry a
//! generation that is bumped on every release, so a stale handle can never
//! reach an instance that has since been recycled, and releasing twice is a
//! harmless no-op.

mod particles;
mod projectiles;

pub use particles::{Particle, ParticleInit, ParticlePool};
pub use projectiles::{Projectile, ProjectileHit, ProjectileInit, ProjectilePool};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Instances constructed up front
    pub initial_size: usize,
    /// Whether to log when the pool has to construct a new instance
    pub log_resize_events: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial_size: 10,
            log_resize_events: false,
        }
    }
}

impl PoolConfig {
    /// Create a pool configuration with the given pre-population size
    pub fn new(initial_size: usize) -> Self {
        PoolConfig {
            initial_size,
            log_resize_events: false,
        }
    }

    /// Enable logging for growth events
    pub fn with_logging(mut self) -> Self {
        self.log_resize_events = true;
        self
    }
}

/// Statistics for monitoring pool performance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Acquires served from the available set
    pub hits: usize,
    /// Acquires that had to construct a new instance
    pub misses: usize,
    /// Instances currently available
    pub available: usize,
    /// Instances currently active
    pub active: usize,
    /// Highest active count ever observed
    pub peak_active: usize,
}

impl PoolStats {
    /// Total instances owned by the pool
    pub fn total(&self) -> usize {
        self.available + self.active
    }

    /// Calculate the hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Types that can be recycled by an [`ObjectPool`]
pub trait Poolable {
    /// Arguments applied on every acquire
    type Init;

    /// Reinitialize a recycled or freshly constructed instance
    fn reset(&mut self, init: Self::Init);
}

/// Generational reference to a pooled instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// Slot index inside the pool
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the handle was issued for
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

struct Slot<T> {
    value: T,
    generation: u32,
    /// Position in `active`, or None while available
    active_index: Option<usize>,
}

/// A recycler for instances of `T`
pub struct ObjectPool<T: Poolable> {
    slots: Vec<Slot<T>>,
    available: Vec<u32>,
    active: Vec<u32>,
    factory: Box<dyn Fn() -> T>,
    config: PoolConfig,
    stats: PoolStats,
    generation_floor: u32,
}

impl<T: Poolable + Default + 'static> ObjectPool<T> {
    /// Create a pool that constructs instances with `T::default()`
    pub fn new(config: PoolConfig) -> Self {
        Self::with_factory(config, T::default)
    }
}

impl<T: Poolable> ObjectPool<T> {
    /// Create a pool with a custom constructor, pre-populated per `config`
    pub fn with_factory(config: PoolConfig, factory: impl Fn() -> T + 'static) -> Self {
        let mut pool = ObjectPool {
            slots: Vec::with_capacity(config.initial_size),
            available: Vec::with_capacity(config.initial_size),
            active: Vec::with_capacity(config.initial_size),
            factory: Box::new(factory),
            config,
            stats: PoolStats::default(),
            generation_floor: 0,
        };
        for _ in 0..pool.config.initial_size {
            let index = pool.construct();
            pool.available.push(index);
        }
        pool
    }

    fn construct(&mut self) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            value: (self.factory)(),
            generation: self.generation_floor,
            active_index: None,
        });
        index
    }

    /// Take an instance, reinitialize it with `init` and mark it active
    pub fn acquire(&mut self, init: T::Init) -> PoolHandle {
        let index = match self.available.pop() {
            Some(index) => {
                self.stats.hits += 1;
                index
            }
            None => {
                self.stats.misses += 1;
                if self.config.log_resize_events {
                    log::debug!(
                        "pool growing to {} instances (hit rate: {:.1}%)",
                        self.slots.len() + 1,
                        self.stats.hit_rate()
                    );
                }
                self.construct()
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.value.reset(init);
        slot.active_index = Some(self.active.len());
        self.active.push(index);

        self.stats.peak_active = self.stats.peak_active.max(self.active.len());
        PoolHandle {
            index,
            generation: slot.generation,
        }
    }

    fn slot_is_live(&self, handle: PoolHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .map(|slot| slot.generation == handle.generation && slot.active_index.is_some())
            .unwrap_or(false)
    }

    /// Return an instance to the available set
    ///
    /// Returns false (and does nothing) when the handle is stale or the
    /// instance is already free.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        if !self.slot_is_live(handle) {
            return false;
        }

        let slot = &mut self.slots[handle.index as usize];
        let position = match slot.active_index.take() {
            Some(position) => position,
            None => return false,
        };
        slot.generation = slot.generation.wrapping_add(1);

        self.active.swap_remove(position);
        if let Some(&moved) = self.active.get(position) {
            self.slots[moved as usize].active_index = Some(position);
        }
        self.available.push(handle.index);
        true
    }

    /// Release every active instance
    pub fn release_all(&mut self) {
        for index in self.active.drain(..) {
            let slot = &mut self.slots[index as usize];
            slot.active_index = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.available.push(index);
        }
    }

    /// Release every active instance for which `predicate` returns true
    ///
    /// Decisions are collected over the whole active set first and applied
    /// afterwards, so the predicate never observes a half-updated set.
    pub fn release_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let doomed: Vec<PoolHandle> = self
            .iter_active()
            .filter(|(_, value)| predicate(value))
            .map(|(handle, _)| handle)
            .collect();
        doomed.into_iter().filter(|h| self.release(*h)).count()
    }

    /// Drop every instance the pool owns
    ///
    /// Outstanding handles stay invalid; new instances start at a fresh
    /// generation.
    pub fn clear(&mut self) {
        let max_generation = self.slots.iter().map(|s| s.generation).max().unwrap_or(0);
        self.generation_floor = self.generation_floor.max(max_generation).wrapping_add(1);
        self.slots.clear();
        self.available.clear();
        self.active.clear();
    }

    /// Borrow an active instance
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if self.slot_is_live(handle) {
            Some(&self.slots[handle.index as usize].value)
        } else {
            None
        }
    }

    /// Mutably borrow an active instance
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if self.slot_is_live(handle) {
            Some(&mut self.slots[handle.index as usize].value)
        } else {
            None
        }
    }

    /// Whether the handle refers to a currently active instance
    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.slot_is_live(handle)
    }

    /// Iterate over active instances
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        self.active.iter().map(move |&index| {
            let slot = &self.slots[index as usize];
            (
                PoolHandle {
                    index,
                    generation: slot.generation,
                },
                &slot.value,
            )
        })
    }

    /// Visit every active instance mutably
    ///
    /// The active set cannot change during the walk; collect handles and
    /// release them afterwards.
    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(PoolHandle, &mut T)) {
        for &index in &self.active {
            let slot = &mut self.slots[index as usize];
            let handle = PoolHandle {
                index,
                generation: slot.generation,
            };
            f(handle, &mut slot.value);
        }
    }

    /// Number of free instances
    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    /// Number of instances in use
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Snapshot of the pool's counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.available.len(),
            active: self.active.len(),
            ..self.stats.clone()
        }
    }
}

impl<T: Poolable> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("available", &self.available.len())
            .field("active", &self.active.len())
            .field("config", &self.config)
            .finish()
    }
}
