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
//! Benchmarks for the collision step and spatial queries
//!
//! Populates a field of small dynamic boxes plus a wall border, then times
//! a full resolver step and the read-only queries at several densities.

use arcade_core::collision::CollisionResolver;
use arcade_core::ecs::{layers, Bounds, Entity, EntityRegistry, EntityType, Resources};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

const FIELD: f32 = 1024.0;

fn populate(n: usize) -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    let mut rng = Pcg32::seed_from_u64(42);

    for i in 0..n {
        let pos = Vec2::new(rng.random_range(0.0..FIELD), rng.random_range(0.0..FIELD));
        let layer = if i % 2 == 0 { layers::ENEMY } else { layers::PLAYER };
        registry.add(
            Entity::new(EntityType::ENEMY, pos)
                .with_size(12.0, 12.0)
                .with_velocity(Vec2::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0)))
                .solid(layer, layers::ALL),
        );
    }

    for (x, y, w, h) in [
        (-16.0, -16.0, FIELD + 32.0, 16.0),
        (-16.0, FIELD, FIELD + 32.0, 16.0),
        (-16.0, 0.0, 16.0, FIELD),
        (FIELD, 0.0, 16.0, FIELD),
    ] {
        registry.add(
            Entity::new(EntityType::OBSTACLE, Vec2::new(x, y))
                .with_size(w, h)
                .solid(layers::WALL, layers::ALL)
                .as_static(),
        );
    }
    registry
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("collision_step");

    for n in [100usize, 1000, 5000].iter() {
        for cell_size in [32.0f32, 64.0, 128.0] {
            group.bench_with_input(
                BenchmarkId::new(format!("cell_{}", cell_size), n),
                n,
                |b, &n| {
                    let mut registry = populate(n);
                    let mut resolver = CollisionResolver::new(cell_size);
                    let mut resources = Resources::default();
                    b.iter(|| black_box(resolver.step(&mut registry, &mut resources, 1.0 / 60.0)));
                },
            );
        }
    }

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let registry = populate(1000);
    let mut resolver = CollisionResolver::new(64.0);
    resolver.rebuild(&registry);

    c.bench_function("raycast_across_field", |b| {
        b.iter(|| {
            black_box(resolver.raycast(
                &registry,
                Vec2::new(0.0, FIELD / 2.0),
                Vec2::new(1.0, 0.3),
                FIELD,
                layers::ALL,
            ))
        });
    });

    c.bench_function("query_rect_quarter", |b| {
        let rect = Bounds::new(0.0, 0.0, FIELD / 2.0, FIELD / 2.0);
        b.iter(|| black_box(resolver.query_rect(&registry, &rect, layers::ALL)));
    });

    c.bench_function("point_in_solid", |b| {
        b.iter(|| black_box(resolver.point_in_solid(&registry, Vec2::new(FIELD / 3.0, FIELD / 3.0), layers::ALL)));
    });
}

criterion_group!(benches, bench_step, bench_queries);
criterion_main!(benches);
