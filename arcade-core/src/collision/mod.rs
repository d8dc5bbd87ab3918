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
//! Broad phase, narrow phase and contact resolution
//!
//! - [`grid`]: the per-tick uniform grid used for candidate lookup
//! - [`resolver`]: the layer filter, AABB test, separation response and
//!   ray/point/region queries

pub mod grid;
pub mod resolver;

pub use grid::{CellKey, SpatialGrid};
pub use resolver::{can_collide, resolve_pair, test_collision, Axis, CollisionResolver, RayHit, Resolution};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{layers, Entity, EntityRegistry, EntityType, Resources};
    use glam::Vec2;

    #[test]
    fn test_pair_found_once_across_shared_cells() {
        let mut registry = EntityRegistry::new();
        // Both boxes straddle the same four cells
        let a = registry.add(
            Entity::new(EntityType::ENEMY, Vec2::new(56.0, 56.0))
                .with_size(16.0, 16.0)
                .solid(layers::ALL, layers::ALL),
        );
        let b = registry.add(
            Entity::new(EntityType::ENEMY, Vec2::new(60.0, 60.0))
                .with_size(16.0, 16.0)
                .solid(layers::ALL, layers::ALL),
        );

        let mut resolver = CollisionResolver::new(64.0);
        let mut resources = Resources::default();
        assert_eq!(resolver.step(&mut registry, &mut resources, 1.0 / 60.0), 1);
        assert_eq!(resolver.contacts(), &[(a, b)]);
        assert_eq!(resolver.cell_count(), 4);
    }

    #[test]
    fn test_separated_bodies_have_no_contacts() {
        let mut registry = EntityRegistry::new();
        registry.add(Entity::new(EntityType::ENEMY, Vec2::ZERO).solid(layers::ALL, layers::ALL));
        registry.add(Entity::new(EntityType::ENEMY, Vec2::new(16.0, 0.0)).solid(layers::ALL, layers::ALL));

        let mut resolver = CollisionResolver::new(64.0);
        let mut resources = Resources::default();
        assert_eq!(resolver.step(&mut registry, &mut resources, 1.0 / 60.0), 0);
        assert!(resolver.contacts().is_empty());
    }
}
