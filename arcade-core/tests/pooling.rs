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
//! Object pool lifecycle tests

use arcade_core::ecs::{layers, Bounds, Entity, EntityRegistry, EntityType};
use arcade_core::collision::CollisionResolver;
use arcade_core::pool::{ObjectPool, ParticleInit, ParticlePool, PoolConfig, Poolable, ProjectileInit, ProjectilePool};
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Spark {
    charge: u32,
}

impl Poolable for Spark {
    type Init = u32;

    fn reset(&mut self, init: u32) {
        self.charge = init;
    }
}

fn counting_pool(initial_size: usize) -> (ObjectPool<Spark>, Rc<Cell<usize>>) {
    let built = Rc::new(Cell::new(0));
    let counter = built.clone();
    let pool = ObjectPool::with_factory(PoolConfig::new(initial_size), move || {
        counter.set(counter.get() + 1);
        Spark::default()
    });
    (pool, built)
}

#[test]
fn test_fourth_acquire_constructs_and_all_return() {
    let (mut pool, built) = counting_pool(3);
    assert_eq!(built.get(), 3);
    assert_eq!(pool.available_len(), 3);

    let handles: Vec<_> = (0..3).map(|i| pool.acquire(i)).collect();
    assert_eq!(built.get(), 3);
    let fourth = pool.acquire(3);
    assert_eq!(built.get(), 4);
    assert_eq!(pool.available_len(), 0);
    assert_eq!(pool.active_len(), 4);

    for handle in handles.into_iter().chain(std::iter::once(fourth)) {
        assert!(pool.release(handle));
    }
    assert_eq!(pool.available_len(), 4);
    assert_eq!(pool.active_len(), 0);

    let stats = pool.stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.peak_active, 4);
}

#[test]
fn test_double_release_is_ignored() {
    let (mut pool, _) = counting_pool(2);
    let handle = pool.acquire(7);

    assert!(pool.release(handle));
    assert!(!pool.release(handle));
    assert_eq!(pool.available_len(), 2);
    assert_eq!(pool.active_len(), 0);
}

#[test]
fn test_stale_handle_cannot_reach_recycled_instance() {
    let (mut pool, _) = counting_pool(1);
    let old = pool.acquire(1);
    pool.release(old);
    let new = pool.acquire(2);

    assert_eq!(old.index(), new.index());
    assert!(pool.get(old).is_none());
    assert!(!pool.release(old));
    assert_eq!(pool.get(new).map(|s| s.charge), Some(2));
}

#[test]
fn test_acquired_instance_is_reinitialized() {
    let (mut pool, _) = counting_pool(1);
    let handle = pool.acquire(5);
    pool.get_mut(handle).unwrap().charge = 99;
    pool.release(handle);

    let again = pool.acquire(6);
    assert_eq!(pool.get(again).unwrap().charge, 6);
}

#[test]
fn test_release_where_and_clear() {
    let (mut pool, _) = counting_pool(4);
    let handles: Vec<_> = (0..4).map(|i| pool.acquire(i)).collect();

    assert_eq!(pool.release_where(|s| s.charge % 2 == 0), 2);
    assert_eq!(pool.active_len(), 2);

    pool.clear();
    assert_eq!(pool.active_len(), 0);
    assert_eq!(pool.available_len(), 0);
    assert!(handles.iter().all(|h| !pool.is_active(*h)));

    let fresh = pool.acquire(10);
    assert!(handles.iter().all(|h| *h != fresh));
}

#[test]
fn test_particles_expire_back_into_pool() {
    let playfield = Bounds::new(-1000.0, -1000.0, 1000.0, 1000.0);
    let mut particles = ParticlePool::new(PoolConfig::new(8), playfield);
    let mut rng = Pcg32::seed_from_u64(3);

    particles.burst(&mut rng, Vec2::ZERO, 5, 0xff8800);
    particles.emit(ParticleInit {
        pos: Vec2::ZERO,
        vel: Vec2::ZERO,
        life: 10.0,
        size: 2.0,
        color: 0xffffff,
    });
    assert_eq!(particles.active_len(), 6);

    // Burst particles live at most a second.
    let released: usize = (0..90).map(|_| particles.update_all(1.0 / 60.0)).sum();
    assert_eq!(released, 5);
    assert_eq!(particles.active_len(), 1);
    assert_eq!(particles.stats().available, 7);
}

#[test]
fn test_projectile_hits_solid_and_recycles() {
    let mut registry = EntityRegistry::new();
    let wall = registry.add(
        Entity::new(EntityType::OBSTACLE, Vec2::new(40.0, -20.0))
            .with_size(20.0, 40.0)
            .solid(layers::WALL, layers::ALL)
            .as_static(),
    );
    let mut resolver = CollisionResolver::new(64.0);
    resolver.rebuild(&registry);

    let playfield = Bounds::new(-100.0, -100.0, 100.0, 100.0);
    let mut projectiles = ProjectilePool::new(PoolConfig::new(2), playfield);
    let shot = projectiles.fire(ProjectileInit::new(Vec2::ZERO, Vec2::new(600.0, 0.0), 3.0));

    let mut hits = Vec::new();
    for _ in 0..10 {
        hits.extend(projectiles.update_all(1.0 / 60.0, &resolver, &registry));
    }

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].target, wall);
    assert_eq!(hits[0].damage, 3.0);
    assert!(projectiles.get(shot).is_none());
    assert_eq!(projectiles.active_len(), 0);
}
