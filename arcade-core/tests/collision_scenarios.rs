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
//! Collision scenarios run through the full resolver step

use arcade_core::collision::{can_collide, test_collision, Axis, CollisionResolver};
use arcade_core::ecs::strategies::Stationary;
use arcade_core::ecs::{layers, Archetype, Behavior, Bounds, Entity, EntityId, EntityRegistry, EntityType, Resources, TickContext};
use arcade_core::error::BehaviorError;
use arcade_core::events::SimEvent;
use glam::Vec2;
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

type Contacts = Rc<RefCell<Vec<(EntityId, EntityId)>>>;

struct ContactLog {
    seen: Contacts,
}

impl Behavior for ContactLog {
    fn on_collision(
        &self,
        entity: &mut Entity,
        other: &Entity,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), BehaviorError> {
        self.seen.borrow_mut().push((entity.id(), other.id()));
        Ok(())
    }
}

fn sensor_registry(seen: &Contacts) -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    registry.register_archetype(
        EntityType::custom("sensor"),
        Archetype::new(Stationary, ContactLog { seen: seen.clone() }),
    );
    registry
}

fn sensor(x: f32, y: f32, layer: u32, mask: u32) -> Entity {
    Entity::new(EntityType::custom("sensor"), Vec2::new(x, y))
        .with_size(16.0, 16.0)
        .solid(layer, mask)
}

#[test]
fn test_diagonal_overlap_resolves_on_x_and_notifies_once() {
    let seen: Contacts = Rc::default();
    let mut registry = sensor_registry(&seen);
    let a = registry.add(sensor(0.0, 0.0, layers::ENEMY, layers::PLAYER));
    let b = registry.add(sensor(8.0, 8.0, layers::PLAYER, layers::ENEMY));

    {
        let (ea, eb) = (registry.get(a).unwrap(), registry.get(b).unwrap());
        assert!(can_collide(ea, eb));
        assert!(test_collision(ea, eb));
        let resolution = arcade_core::collision::resolve_pair(ea, eb).unwrap();
        assert_eq!(resolution.axis, Axis::X);
        assert_eq!(resolution.penetration, 8.0);
    }

    let mut resolver = CollisionResolver::new(64.0);
    let mut resources = Resources::default();
    let contacts = resolver.step(&mut registry, &mut resources, 1.0 / 60.0);

    assert_eq!(contacts, 1);
    assert_eq!(*seen.borrow(), vec![(a, b), (b, a)]);

    // Equal masses split the 8 units evenly along X.
    assert_eq!(registry.get(a).unwrap().pos, Vec2::new(-4.0, 0.0));
    assert_eq!(registry.get(b).unwrap().pos, Vec2::new(12.0, 8.0));
    assert!(!test_collision(registry.get(a).unwrap(), registry.get(b).unwrap()));
}

#[test]
fn test_static_wall_takes_no_correction() {
    let mut registry = EntityRegistry::new();
    let wall = registry.add(
        Entity::new(EntityType::OBSTACLE, Vec2::new(16.0, 0.0))
            .with_size(16.0, 16.0)
            .solid(layers::WALL, layers::ALL)
            .as_static()
            .with_mass(1000.0),
    );
    let ball = registry.add(
        Entity::new(EntityType::custom("ball"), Vec2::new(8.0, 0.0))
            .with_size(16.0, 16.0)
            .with_velocity(Vec2::new(50.0, 10.0))
            .with_bounciness(0.5)
            .solid(layers::ENEMY, layers::WALL),
    );

    let mut resolver = CollisionResolver::new(64.0);
    let mut resources = Resources::default();
    resolver.step(&mut registry, &mut resources, 1.0 / 60.0);

    let wall = registry.get(wall).unwrap();
    assert_eq!(wall.pos, Vec2::new(16.0, 0.0));
    assert_eq!(wall.vel, Vec2::ZERO);

    let ball = registry.get(ball).unwrap();
    assert_eq!(ball.pos, Vec2::new(0.0, 0.0));
    assert_eq!(ball.vel, Vec2::new(-25.0, 10.0));
}

#[test]
fn test_trigger_is_notified_but_not_moved() {
    let seen: Contacts = Rc::default();
    let mut registry = sensor_registry(&seen);
    let zone = registry.add(sensor(0.0, 0.0, layers::TRIGGER, layers::PLAYER).as_trigger());
    let player = registry.add(sensor(4.0, 4.0, layers::PLAYER, layers::TRIGGER));

    let mut resolver = CollisionResolver::new(64.0);
    let mut resources = Resources::default();
    resolver.step(&mut registry, &mut resources, 1.0 / 60.0);

    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(registry.get(zone).unwrap().pos, Vec2::ZERO);
    assert_eq!(registry.get(player).unwrap().pos, Vec2::new(4.0, 4.0));
}

#[test]
fn test_filtered_pair_is_ignored() {
    let seen: Contacts = Rc::default();
    let mut registry = sensor_registry(&seen);
    registry.add(sensor(0.0, 0.0, layers::ENEMY, layers::PLAYER));
    registry.add(sensor(4.0, 4.0, layers::ENEMY, layers::PLAYER));

    let mut resolver = CollisionResolver::new(64.0);
    let mut resources = Resources::default();
    assert_eq!(resolver.step(&mut registry, &mut resources, 1.0 / 60.0), 0);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_touching_edges_do_not_collide() {
    let a = sensor(0.0, 0.0, layers::ENEMY, layers::PLAYER);
    let b = sensor(16.0, 0.0, layers::PLAYER, layers::ENEMY);
    assert!(can_collide(&a, &b));
    assert!(!test_collision(&a, &b));
}

#[test]
fn test_queries_after_step() {
    let mut registry = EntityRegistry::new();
    let wall = registry.add(
        Entity::new(EntityType::OBSTACLE, Vec2::new(100.0, 0.0))
            .with_size(40.0, 100.0)
            .solid(layers::WALL, layers::ALL)
            .as_static(),
    );
    let zone = registry.add(
        Entity::new(EntityType::TRIGGER, Vec2::new(40.0, 0.0))
            .with_size(20.0, 20.0)
            .solid(layers::TRIGGER, layers::PLAYER)
            .as_static()
            .as_trigger(),
    );

    let mut resolver = CollisionResolver::new(64.0);
    let mut resources = Resources::default();
    resolver.step(&mut registry, &mut resources, 1.0 / 60.0);

    assert_eq!(resolver.point_in_solid(&registry, Vec2::new(110.0, 50.0), layers::ALL), Some(wall));
    assert_eq!(resolver.point_in_solid(&registry, Vec2::new(50.0, 10.0), layers::ALL), None);
    assert!(resolver.solids_at(&registry, Vec2::new(110.0, 50.0), layers::ENEMY).is_empty());

    let mut found = resolver.query_rect(&registry, &Bounds::new(0.0, 0.0, 100.0, 20.0), layers::ALL);
    found.sort();
    assert_eq!(found, vec![wall, zone]);

    let hits = resolver.raycast(&registry, Vec2::new(0.0, 10.0), Vec2::X, 300.0, layers::ALL);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entity, wall);
    assert!(resolver.raycast(&registry, Vec2::new(0.0, 10.0), Vec2::ZERO, 300.0, layers::ALL).is_empty());
}

struct Volatile;

impl Behavior for Volatile {
    fn on_collision(
        &self,
        _entity: &mut Entity,
        _other: &Entity,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), BehaviorError> {
        panic!("collision handler blew up");
    }
}

#[test]
fn test_panicking_collision_handler_is_contained() {
    let seen: Contacts = Rc::default();
    let mut registry = sensor_registry(&seen);
    registry.register_archetype(EntityType::custom("volatile"), Archetype::new(Stationary, Volatile));

    let volatile = registry.add(
        Entity::new(EntityType::custom("volatile"), Vec2::ZERO)
            .with_size(16.0, 16.0)
            .solid(layers::ALL, layers::ALL)
            .as_static(),
    );
    let b = registry.add(sensor(4.0, 0.0, layers::ALL, layers::ALL).as_static());
    let c = registry.add(sensor(8.0, 0.0, layers::ALL, layers::ALL).as_static());

    let mut resolver = CollisionResolver::new(64.0);
    let mut resources = Resources::default();
    assert_eq!(resolver.step(&mut registry, &mut resources, 1.0 / 60.0), 3);

    assert!(!registry.contains(volatile));
    assert!(registry.contains(b) && registry.contains(c));

    let faults: Vec<EntityId> = resources
        .events
        .iter()
        .filter_map(|e| match e {
            SimEvent::EntityFault { entity, .. } => Some(*entity),
            _ => None,
        })
        .collect();
    assert_eq!(faults, vec![volatile]);

    let seen = seen.borrow();
    for pair in [(b, volatile), (c, volatile), (b, c), (c, b)] {
        assert!(seen.contains(&pair), "missing notification {:?}", pair);
    }
    assert_eq!(seen.len(), 4);
}

#[test]
fn test_far_away_entities_do_not_break_the_step() {
    let mut registry = EntityRegistry::new();
    for x in [1.0e12f32, -1.0e12, 1.0e30] {
        registry.add(
            Entity::new(EntityType::ENEMY, Vec2::new(x, x))
                .with_size(16.0, 16.0)
                .solid(layers::ENEMY, layers::ALL),
        );
    }
    // Spans far more cells than any entity may occupy
    let huge = registry.add(
        Entity::new(EntityType::OBSTACLE, Vec2::new(-1.0e9, -1.0e9))
            .with_size(2.0e9, 2.0e9)
            .solid(layers::WALL, layers::ALL)
            .as_static(),
    );
    let a = registry.add(plain_box(0.0, 0.0));
    let b = registry.add(plain_box(8.0, 0.0));

    let mut resolver = CollisionResolver::new(64.0);
    let mut resources = Resources::default();
    resolver.step(&mut registry, &mut resources, 1.0 / 60.0);

    assert!(resolver.contacts().contains(&(a, b)));
    assert!(!resolver.grid().members().contains(&huge));
    assert_eq!(registry.len(), 6);

    let everything = resolver.query_rect(&registry, &Bounds::new(-3.0e38, -3.0e38, 3.0e38, 3.0e38), layers::ENEMY);
    assert_eq!(everything.len(), 5);
}

fn plain_box(x: f32, y: f32) -> Entity {
    Entity::new(EntityType::custom("plain"), Vec2::new(x, y))
        .with_size(16.0, 16.0)
        .solid(layers::ENEMY, layers::ENEMY)
}

fn arb_entity() -> impl Strategy<Value = Entity> {
    (
        -100.0f32..100.0,
        -100.0f32..100.0,
        1.0f32..50.0,
        1.0f32..50.0,
        0u32..64,
        0u32..64,
    )
        .prop_map(|(x, y, w, h, layer, mask)| {
            Entity::new(EntityType::custom("any"), Vec2::new(x, y))
                .with_size(w, h)
                .solid(layer, mask)
        })
}

proptest! {
    #[test]
    fn prop_filter_and_overlap_are_symmetric(a in arb_entity(), b in arb_entity()) {
        prop_assert_eq!(can_collide(&a, &b), can_collide(&b, &a));
        prop_assert_eq!(test_collision(&a, &b), test_collision(&b, &a));
    }

    #[test]
    fn prop_resolution_separates_dynamic_pairs(a in arb_entity(), b in arb_entity()) {
        if let Some(r) = arcade_core::collision::resolve_pair(&a, &b) {
            let mut a = a;
            let mut b = b;
            a.pos += r.shift_a;
            b.pos += r.shift_b;
            let ab = a.bounds();
            let bb = b.bounds();
            let gap = match r.axis {
                Axis::X => (ab.right - bb.left).min(bb.right - ab.left),
                Axis::Y => (ab.bottom - bb.top).min(bb.bottom - ab.top),
            };
            prop_assert!(gap <= 1e-3, "still overlapping by {}", gap);
        }
    }
}
