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
//! Read-only render snapshots
//!
//! The simulation never draws. Once per rendered frame it can build a
//! [`RenderFrame`] describing every visible entity (positions blended by the
//! scheduler's interpolation factor), live particles and pooled projectiles,
//! and hand it to a [`RenderSink`].

use crate::ecs::components::Payload;
use crate::ecs::{Bounds, EntityId, EntityRegistry, EntityType};
use crate::error::CollaboratorError;
use crate::pool::{ParticlePool, ProjectilePool};
use glam::Vec2;

/// Type-specific drawing hints
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VisualState {
    /// Nothing beyond bounds
    #[default]
    Plain,
    /// Something with a health bar
    Actor {
        /// Health in [0, 1]
        health: f32,
        /// Currently invulnerable (draw blinking)
        flashing: bool,
    },
    /// A shot; `fade` runs from 1 at launch to 0 at expiry
    Projectile {
        /// Remaining lifetime fraction
        fade: f32,
    },
    /// Labelled geometry
    Obstacle {
        /// Visual variant
        style: String,
        /// Caption
        label: String,
    },
    /// Goal region
    Objective {
        /// Already reached
        reached: bool,
    },
}

impl VisualState {
    /// Derive drawing hints from a payload
    pub fn from_payload(payload: &Payload) -> Self {
        match payload {
            Payload::None => VisualState::Plain,
            Payload::Actor(v) => VisualState::Actor {
                health: v.fraction(),
                flashing: v.invulnerable_for > 0.0,
            },
            Payload::Projectile(p) => VisualState::Projectile {
                fade: if p.max_lifetime > 0.0 {
                    (p.lifetime / p.max_lifetime).clamp(0.0, 1.0)
                } else {
                    0.0
                },
            },
            Payload::Obstacle(o) => VisualState::Obstacle {
                style: o.style.clone(),
                label: o.label.clone(),
            },
            Payload::Objective(o) => VisualState::Objective { reached: o.reached },
        }
    }
}

/// One visible entity
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    /// Source entity
    pub id: EntityId,
    /// Type tag, for sprite lookup
    pub entity_type: EntityType,
    /// Position blended between `prev_pos` and `current_pos`
    pub pos: Vec2,
    /// Position at the start of the last tick
    pub prev_pos: Vec2,
    /// Position at the end of the last tick
    pub current_pos: Vec2,
    /// Width and height
    pub size: Vec2,
    /// Bounds at `current_pos`
    pub bounds: Bounds,
    /// Draw order
    pub depth: i32,
    /// Type-specific hints
    pub visual: VisualState,
}

/// One live particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSprite {
    /// Position
    pub pos: Vec2,
    /// Edge length
    pub size: f32,
    /// Packed 0xRRGGBB colour
    pub color: u32,
    /// Opacity
    pub alpha: f32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    /// Interpolation factor in [0, 1)
    pub interpolation: f32,
    /// Visible entities, ascending depth
    pub items: Vec<RenderItem>,
    /// Live particles
    pub particles: Vec<ParticleSprite>,
    /// Bounds of live pooled projectiles
    pub projectiles: Vec<Bounds>,
}

impl RenderFrame {
    /// Snapshot the registry and pools
    pub fn build(
        registry: &EntityRegistry,
        particles: &ParticlePool,
        projectiles: &ProjectilePool,
        interpolation: f32,
    ) -> Self {
        let mut items: Vec<RenderItem> = registry
            .iter()
            .filter(|e| e.is_visible && !e.is_dead)
            .map(|e| RenderItem {
                id: e.id(),
                entity_type: e.entity_type.clone(),
                pos: e.interpolated(interpolation),
                prev_pos: e.prev_pos,
                current_pos: e.pos,
                size: e.size,
                bounds: e.bounds(),
                depth: e.depth,
                visual: registry.visual_state(e),
            })
            .collect();
        items.sort_by_key(|item| item.depth);

        RenderFrame {
            interpolation,
            items,
            particles: particles
                .iter()
                .map(|p| ParticleSprite {
                    pos: p.pos,
                    size: p.size,
                    color: p.color,
                    alpha: p.alpha,
                })
                .collect(),
            projectiles: projectiles.iter().map(|p| p.bounds()).collect(),
        }
    }
}

/// Rendering collaborator
pub trait RenderSink {
    /// Draw a frame; failures are reported, never retried
    fn submit(&mut self, frame: &RenderFrame) -> Result<(), CollaboratorError>;
}

/// Hand a frame to an optional sink, logging failures
///
/// Returns whether the frame was accepted.
pub fn present(frame: &RenderFrame, sink: Option<&mut (dyn RenderSink + '_)>) -> bool {
    let Some(sink) = sink else {
        return false;
    };
    match sink.submit(frame) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("dropping render frame: {}", e);
            false
        }
    }
}
