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
//! Uniform spatial grid
//!
//! Rebuilt from scratch every tick. An entity is appended to every cell its
//! bounds touch, so a body larger than a cell appears in several lists.
//!
//! Cell coordinates saturate at the `i32` range, so entities far outside
//! any sensible playfield share the edge cells instead of overflowing. An
//! entity spanning more than [`MAX_CELLS_PER_ENTITY`] cells is not indexed.

use crate::ecs::{Bounds, Entity, EntityId, EntityRegistry};
use glam::Vec2;
use std::collections::{HashMap, HashSet};

/// Integer cell coordinate `(floor(x / cell), floor(y / cell))`
pub type CellKey = (i32, i32);

/// Most cells a single entity may be listed in
pub const MAX_CELLS_PER_ENTITY: u64 = 1 << 16;

/// Per-tick broad-phase index of collidable entities
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<EntityId>>,
    /// Indexed entities in registry order
    members: Vec<EntityId>,
}

impl SpatialGrid {
    /// Create an empty grid
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not positive and finite.
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "Cell size must be positive and finite"
        );
        SpatialGrid {
            cell_size,
            cells: HashMap::new(),
            members: Vec::new(),
        }
    }

    /// Side length of a cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing a point
    pub fn cell_of(&self, point: Vec2) -> CellKey {
        (
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
        )
    }

    fn corners(&self, bounds: &Bounds) -> (CellKey, CellKey) {
        (
            self.cell_of(Vec2::new(bounds.left, bounds.top)),
            self.cell_of(Vec2::new(bounds.right, bounds.bottom)),
        )
    }

    /// How many cells a rectangle touches
    pub fn span(&self, bounds: &Bounds) -> u64 {
        let ((x0, y0), (x1, y1)) = self.corners(bounds);
        let width = (i64::from(x1) - i64::from(x0) + 1).max(0) as u64;
        let height = (i64::from(y1) - i64::from(y0) + 1).max(0) as u64;
        width.saturating_mul(height)
    }

    /// Every cell a rectangle touches
    ///
    /// Lazy; check [`span`](Self::span) before walking a large rectangle.
    pub fn cells_overlapping(&self, bounds: &Bounds) -> impl Iterator<Item = CellKey> {
        let ((x0, y0), (x1, y1)) = self.corners(bounds);
        (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| (x, y)))
    }

    /// Whether an entity belongs in the grid
    ///
    /// Only live solid entities with a non-zero layer and mask can ever
    /// collide, so nothing else is indexed.
    pub fn indexes(entity: &Entity) -> bool {
        entity.solid && entity.is_live() && entity.layer != 0 && entity.mask != 0
    }

    /// Drop every cell
    pub fn clear(&mut self) {
        self.cells.clear();
        self.members.clear();
    }

    /// Index one entity under every cell its bounds touch
    ///
    /// Returns false, leaving the grid unchanged, when the bounds span more
    /// than [`MAX_CELLS_PER_ENTITY`] cells.
    pub fn insert(&mut self, id: EntityId, bounds: &Bounds) -> bool {
        let span = self.span(bounds);
        if span > MAX_CELLS_PER_ENTITY {
            log::debug!("{} spans {} grid cells; not indexed", id, span);
            return false;
        }
        let keys: Vec<CellKey> = self.cells_overlapping(bounds).collect();
        for key in keys {
            self.cells.entry(key).or_default().push(id);
        }
        self.members.push(id);
        true
    }

    /// Rebuild from the registry's current entities
    pub fn rebuild(&mut self, registry: &EntityRegistry) {
        self.clear();
        for entity in registry.iter().filter(|e| Self::indexes(e)) {
            self.insert(entity.id(), &entity.bounds());
        }
    }

    /// Indexed entities in registry order
    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    /// Entities in one cell
    pub fn cell(&self, key: CellKey) -> &[EntityId] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entities listed in the 3x3 block of cells around `point`'s cell
    ///
    /// An entity listed in several of those cells is yielded once per cell.
    /// At the edge of the coordinate range the block collapses onto the edge
    /// cells, so the same cell may be visited more than once.
    pub fn neighbours(&self, point: Vec2) -> impl Iterator<Item = EntityId> + '_ {
        let (cx, cy) = self.cell_of(point);
        (-1..=1)
            .flat_map(move |dx| {
                (-1..=1).map(move |dy| (cx.saturating_add(dx), cy.saturating_add(dy)))
            })
            .flat_map(move |key| self.cell(key).iter().copied())
    }

    /// Distinct entities listed in any cell `bounds` touches
    ///
    /// A rectangle covering more cells than are occupied is answered by
    /// scanning the occupied cells instead.
    pub fn candidates_in(&self, bounds: &Bounds) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        if self.span(bounds) <= self.cells.len() as u64 {
            return self
                .cells_overlapping(bounds)
                .flat_map(|key| self.cell(key).iter().copied())
                .filter(|id| seen.insert(*id))
                .collect();
        }

        let ((x0, y0), (x1, y1)) = self.corners(bounds);
        let mut keys: Vec<CellKey> = self
            .cells
            .keys()
            .filter(|(x, y)| (x0..=x1).contains(x) && (y0..=y1).contains(y))
            .copied()
            .collect();
        keys.sort_unstable();
        keys.into_iter()
            .flat_map(|key| self.cell(key).iter().copied())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
