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
//! Narrow phase, resolution and spatial queries

use super::grid::SpatialGrid;
use crate::config::SimConfig;
use crate::ecs::{Bounds, Entity, EntityId, EntityRegistry, Resources};
use glam::Vec2;
use std::collections::HashSet;

/// Axis a contact was resolved along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal
    X,
    /// Vertical
    Y,
}

impl Axis {
    fn unit(self) -> Vec2 {
        match self {
            Axis::X => Vec2::X,
            Axis::Y => Vec2::Y,
        }
    }

    fn component(self, v: Vec2) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    fn with_component(self, v: Vec2, value: f32) -> Vec2 {
        match self {
            Axis::X => Vec2::new(value, v.y),
            Axis::Y => Vec2::new(v.x, value),
        }
    }
}

/// Position and velocity changes for one resolved contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Axis of least penetration
    pub axis: Axis,
    /// Penetration depth along `axis`
    pub penetration: f32,
    /// Displacement applied to the first entity
    pub shift_a: Vec2,
    /// Displacement applied to the second entity
    pub shift_b: Vec2,
    /// First entity's velocity afterwards
    pub vel_a: Vec2,
    /// Second entity's velocity afterwards
    pub vel_b: Vec2,
}

/// A ray sample that landed inside an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entity hit
    pub entity: EntityId,
    /// Sample point inside the entity
    pub point: Vec2,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Whether two entities opt into colliding with each other
///
/// Both masks must accept the other's layer, so the relation is symmetric
/// and a zero layer or mask on either side rules the pair out.
pub fn can_collide(a: &Entity, b: &Entity) -> bool {
    (a.mask & b.layer) != 0 && (b.mask & a.layer) != 0
}

/// Strict AABB overlap; touching edges do not count
pub fn test_collision(a: &Entity, b: &Entity) -> bool {
    a.bounds().overlaps(&b.bounds())
}

/// Work out how an overlapping pair separates
///
/// Returns `None` when nothing would change: either side is a trigger, both
/// are static, or the boxes do not actually overlap.
///
/// The pair is pushed apart along the axis of least penetration (X on an
/// exact tie). Between two dynamic bodies the push is split so each moves by
/// the *other's* share of the combined mass; against a static body the
/// dynamic side takes all of it. Velocity response is deliberately simple
/// and ignores mass: two dynamic bodies swap their components along the
/// axis, while a body hitting a static one reflects its component scaled by
/// its own bounciness.
pub fn resolve_pair(a: &Entity, b: &Entity) -> Option<Resolution> {
    if a.is_trigger || b.is_trigger || (a.is_static && b.is_static) {
        return None;
    }

    let (ab, bb) = (a.bounds(), b.bounds());
    let pen_x = (ab.right - bb.left).min(bb.right - ab.left);
    let pen_y = (ab.bottom - bb.top).min(bb.bottom - ab.top);
    if !(pen_x > 0.0 && pen_y > 0.0) {
        return None;
    }

    let (axis, penetration) = if pen_x <= pen_y {
        (Axis::X, pen_x)
    } else {
        (Axis::Y, pen_y)
    };
    let sign = if axis.component(ab.center()) < axis.component(bb.center()) {
        -1.0
    } else {
        1.0
    };
    let separation = axis.unit() * penetration * sign;

    let (shift_a, shift_b) = if a.is_static {
        (Vec2::ZERO, -separation)
    } else if b.is_static {
        (separation, Vec2::ZERO)
    } else {
        let (ma, mb) = (a.effective_mass(), b.effective_mass());
        let total = ma + mb;
        (separation * (mb / total), -separation * (ma / total))
    };

    let reflect = |e: &Entity| {
        let v = -axis.component(e.vel) * e.bounciness;
        axis.with_component(e.vel, if v.is_finite() { v } else { 0.0 })
    };
    let (vel_a, vel_b) = if a.is_static {
        (a.vel, reflect(b))
    } else if b.is_static {
        (reflect(a), b.vel)
    } else {
        (
            axis.with_component(a.vel, axis.component(b.vel)),
            axis.with_component(b.vel, axis.component(a.vel)),
        )
    };

    Some(Resolution {
        axis,
        penetration,
        shift_a,
        shift_b,
        vel_a,
        vel_b,
    })
}

/// Collision detection, response and spatial queries over a [`SpatialGrid`]
///
/// The grid is tick-scoped: [`step`](Self::step) rebuilds it from the
/// registry before resolving, and the queries read whatever the last build
/// indexed, using each entity's live bounds.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    grid: SpatialGrid,
    max_ray_steps: usize,
    contacts: Vec<(EntityId, EntityId)>,
}

impl CollisionResolver {
    /// Default cap on ray samples
    pub const DEFAULT_MAX_RAY_STEPS: usize = 100;

    /// Create a resolver with the given cell size
    pub fn new(cell_size: f32) -> Self {
        CollisionResolver {
            grid: SpatialGrid::new(cell_size),
            max_ray_steps: Self::DEFAULT_MAX_RAY_STEPS,
            contacts: Vec::new(),
        }
    }

    /// Create a resolver from the simulation configuration
    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.cell_size).with_max_ray_steps(config.max_ray_steps)
    }

    /// Override the ray sample cap
    pub fn with_max_ray_steps(mut self, steps: usize) -> Self {
        self.max_ray_steps = steps.max(1);
        self
    }

    /// The grid from the last rebuild
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Re-index the registry's current entities
    pub fn rebuild(&mut self, registry: &EntityRegistry) {
        self.grid.rebuild(registry);
    }

    /// Detect, resolve and report every contact for this tick
    ///
    /// Each unordered pair is considered once, lower id first. Resolution is
    /// applied as soon as a pair is found, so later pairs see corrected
    /// positions. Both sides of every overlapping pair are notified once,
    /// triggers included; structural changes from those callbacks are
    /// flushed at the end. Returns the number of contacts.
    pub fn step(&mut self, registry: &mut EntityRegistry, resources: &mut Resources, dt: f32) -> usize {
        self.grid.rebuild(registry);
        self.contacts.clear();
        let mut checked = HashSet::new();

        registry.begin_deferred();
        for &id in self.grid.members() {
            let Some(center) = registry.get(id).map(Entity::center) else {
                continue;
            };

            for other in self.grid.neighbours(center) {
                if other == id {
                    continue;
                }
                let pair = (id.min(other), id.max(other));
                if !checked.insert(pair) {
                    continue;
                }

                let (Some(a), Some(b)) = (registry.get(pair.0), registry.get(pair.1)) else {
                    continue;
                };
                if !can_collide(a, b) || !test_collision(a, b) {
                    continue;
                }

                if let Some(resolution) = resolve_pair(a, b) {
                    if let Some(a) = registry.get_mut(pair.0) {
                        a.pos += resolution.shift_a;
                        a.vel = resolution.vel_a;
                    }
                    if let Some(b) = registry.get_mut(pair.1) {
                        b.pos += resolution.shift_b;
                        b.vel = resolution.vel_b;
                    }
                }

                registry.notify_pair(pair.0, pair.1, dt, resources);
                self.contacts.push(pair);
            }
        }
        registry.flush(&mut resources.events);

        log::trace!(
            "collision step: {} indexed, {} contacts",
            self.grid.len(),
            self.contacts.len()
        );
        self.contacts.len()
    }

    /// Contact pairs found by the last [`step`](Self::step)
    pub fn contacts(&self) -> &[(EntityId, EntityId)] {
        &self.contacts
    }

    /// Occupied cells in the current grid
    pub fn cell_count(&self) -> usize {
        self.grid.cell_count()
    }

    fn matches(entity: &Entity, layer_mask: u32) -> bool {
        entity.layer & layer_mask != 0
    }

    /// Every non-trigger indexed entity containing `point` whose layer is in `layer_mask`
    pub fn solids_at(&self, registry: &EntityRegistry, point: Vec2, layer_mask: u32) -> Vec<EntityId> {
        self.grid
            .cell(self.grid.cell_of(point))
            .iter()
            .copied()
            .filter(|id| {
                registry.get(*id).is_some_and(|e| {
                    !e.is_trigger && Self::matches(e, layer_mask) && e.bounds().contains_point(point)
                })
            })
            .collect()
    }

    /// First non-trigger indexed entity containing `point`
    pub fn point_in_solid(&self, registry: &EntityRegistry, point: Vec2, layer_mask: u32) -> Option<EntityId> {
        self.solids_at(registry, point, layer_mask).into_iter().next()
    }

    /// Indexed entities whose bounds touch `rect` and whose layer is in `layer_mask`
    pub fn query_rect(&self, registry: &EntityRegistry, rect: &Bounds, layer_mask: u32) -> Vec<EntityId> {
        self.grid
            .candidates_in(rect)
            .into_iter()
            .filter(|id| {
                registry
                    .get(*id)
                    .is_some_and(|e| Self::matches(e, layer_mask) && e.bounds().touches(rect))
            })
            .collect()
    }

    /// Sample a ray and report the entities it passes through, nearest first
    ///
    /// Samples are taken every half cell along the normalized direction,
    /// starting at the origin, for at most `max_distance / step` samples and
    /// never more than the configured cap. Each entity is reported once, at
    /// its first sample. Triggers are ignored. A zero direction hits nothing.
    pub fn raycast(
        &self,
        registry: &EntityRegistry,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        layer_mask: u32,
    ) -> Vec<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO || !(max_distance >= 0.0) {
            return Vec::new();
        }

        let step = self.grid.cell_size() / 2.0;
        let limit = (max_distance / step).min(self.max_ray_steps as f32);
        let mut seen = HashSet::new();
        let mut hits = Vec::new();

        let mut i = 0usize;
        while (i as f32) < limit {
            let point = origin + dir * (i as f32 * step);
            for id in self.solids_at(registry, point, layer_mask) {
                if seen.insert(id) {
                    hits.push(RayHit {
                        entity: id,
                        point,
                        distance: point.distance(origin),
                    });
                }
            }
            i += 1;
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{layers, EntityType};

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> Entity {
        Entity::new(EntityType::ENTITY, Vec2::new(x, y))
            .with_size(w, h)
            .solid(layers::ALL, layers::ALL)
    }

    #[test]
    fn test_layer_filter_is_mutual() {
        let enemy = boxed(0.0, 0.0, 16.0, 16.0).solid(layers::ENEMY, layers::PLAYER);
        let player = boxed(0.0, 0.0, 16.0, 16.0).solid(layers::PLAYER, layers::ENEMY);
        let item = boxed(0.0, 0.0, 16.0, 16.0).solid(layers::ITEM, layers::PLAYER);
        assert!(can_collide(&enemy, &player));
        // The item accepts players, but players do not accept items
        assert!(!can_collide(&item, &player));
        assert!(!can_collide(&player, &item));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = boxed(0.0, 0.0, 10.0, 10.0);
        let b = boxed(10.0, 0.0, 10.0, 10.0);
        assert!(!test_collision(&a, &b));
        assert!(resolve_pair(&a, &b).is_none());
    }

    #[test]
    fn test_smaller_axis_chosen() {
        let a = boxed(0.0, 0.0, 10.0, 10.0);
        let b = boxed(8.0, 3.0, 10.0, 10.0);
        let r = resolve_pair(&a, &b).unwrap();
        assert_eq!(r.axis, Axis::X);
        assert_eq!(r.penetration, 2.0);
        assert_eq!(r.shift_a, Vec2::new(-1.0, 0.0));
        assert_eq!(r.shift_b, Vec2::new(1.0, 0.0));

        let c = boxed(3.0, 8.0, 10.0, 10.0);
        let r = resolve_pair(&a, &c).unwrap();
        assert_eq!(r.axis, Axis::Y);
        assert_eq!(r.shift_a, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_mass_weighting() {
        let light = boxed(0.0, 0.0, 10.0, 10.0).with_mass(1.0);
        let heavy = boxed(6.0, 0.0, 10.0, 10.0).with_mass(3.0);
        let r = resolve_pair(&light, &heavy).unwrap();
        assert_eq!(r.shift_a, Vec2::new(-3.0, 0.0));
        assert_eq!(r.shift_b, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_dynamic_pair_swaps_axis_velocity() {
        let a = boxed(0.0, 0.0, 10.0, 10.0).with_velocity(Vec2::new(5.0, 1.0));
        let b = boxed(8.0, 0.0, 10.0, 10.0).with_velocity(Vec2::new(-2.0, 7.0));
        let r = resolve_pair(&a, &b).unwrap();
        assert_eq!(r.vel_a, Vec2::new(-2.0, 1.0));
        assert_eq!(r.vel_b, Vec2::new(5.0, 7.0));
    }

    #[test]
    fn test_static_side_reflects_with_bounciness() {
        let wall = boxed(0.0, 0.0, 10.0, 100.0).as_static();
        let ball = boxed(8.0, 40.0, 10.0, 10.0)
            .with_velocity(Vec2::new(-10.0, 3.0))
            .with_bounciness(0.5);
        let r = resolve_pair(&wall, &ball).unwrap();
        assert_eq!(r.shift_a, Vec2::ZERO);
        assert_eq!(r.shift_b, Vec2::new(2.0, 0.0));
        assert_eq!(r.vel_a, Vec2::ZERO);
        assert_eq!(r.vel_b, Vec2::new(5.0, 3.0));
    }

    #[test]
    fn test_triggers_and_static_pairs_unresolved() {
        let a = boxed(0.0, 0.0, 10.0, 10.0);
        let trigger = boxed(5.0, 5.0, 10.0, 10.0).as_trigger();
        assert!(test_collision(&a, &trigger));
        assert!(resolve_pair(&a, &trigger).is_none());

        let s1 = boxed(0.0, 0.0, 10.0, 10.0).as_static();
        let s2 = boxed(5.0, 5.0, 10.0, 10.0).as_static();
        assert!(resolve_pair(&s1, &s2).is_none());
    }

    fn world() -> (EntityRegistry, CollisionResolver, EntityId, EntityId, EntityId) {
        let mut registry = EntityRegistry::new();
        let near = registry.add(boxed(40.0, 0.0, 10.0, 10.0).as_static().solid(layers::WALL, layers::ALL));
        let far = registry.add(boxed(100.0, -5.0, 20.0, 20.0).as_static().solid(layers::ENEMY, layers::ALL));
        let trigger = registry.add(boxed(70.0, 0.0, 10.0, 10.0).as_trigger().solid(layers::TRIGGER, layers::ALL));
        let mut resolver = CollisionResolver::new(16.0);
        resolver.rebuild(&registry);
        (registry, resolver, near, far, trigger)
    }

    #[test]
    fn test_raycast_sorted_and_masked() {
        let (registry, resolver, near, far, _) = world();
        let hits = resolver.raycast(&registry, Vec2::new(0.0, 5.0), Vec2::new(3.0, 0.0), 200.0, layers::ALL);
        let ids: Vec<_> = hits.iter().map(|h| h.entity).collect();
        assert_eq!(ids, vec![near, far]);
        assert_eq!(hits[0].distance, 40.0);

        let walls = resolver.raycast(&registry, Vec2::new(0.0, 5.0), Vec2::X, 200.0, layers::ENEMY);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].entity, far);
    }

    #[test]
    fn test_raycast_respects_limits() {
        let (registry, resolver, _, _, _) = world();
        assert!(resolver.raycast(&registry, Vec2::new(0.0, 5.0), Vec2::X, 30.0, layers::ALL).is_empty());
        assert!(resolver.raycast(&registry, Vec2::new(0.0, 5.0), Vec2::ZERO, 200.0, layers::ALL).is_empty());

        let capped = resolver.clone().with_max_ray_steps(3);
        assert!(capped.raycast(&registry, Vec2::new(0.0, 5.0), Vec2::X, 200.0, layers::ALL).is_empty());
    }

    #[test]
    fn test_point_and_region_queries() {
        let (registry, resolver, near, far, trigger) = world();
        assert_eq!(resolver.point_in_solid(&registry, Vec2::new(45.0, 5.0), layers::ALL), Some(near));
        assert_eq!(resolver.point_in_solid(&registry, Vec2::new(75.0, 5.0), layers::ALL), None);
        assert_eq!(resolver.point_in_solid(&registry, Vec2::new(45.0, 5.0), layers::ENEMY), None);

        let region = resolver.query_rect(&registry, &Bounds::new(30.0, 0.0, 110.0, 10.0), layers::ALL);
        assert_eq!(region.len(), 3);
        assert!(region.contains(&near) && region.contains(&far) && region.contains(&trigger));

        let enemies = resolver.query_rect(&registry, &Bounds::new(0.0, 0.0, 500.0, 500.0), layers::ENEMY);
        assert_eq!(enemies, vec![far]);
    }
}
