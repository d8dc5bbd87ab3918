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
//! # Arcade Core
//!
//! The real-time simulation core of a 2D arcade game: an entity registry
//! with deferred mutation, a uniform-grid collision resolver, object pools
//! for short-lived objects, and a fixed-timestep scheduler.
//!
//! ## Features
//!
//! - **Entity Registry**: homogeneous entities with typed payloads, per-type
//!   movement and behavior strategies, fail-soft updates
//! - **Collision**: symmetric layer filtering, strict AABB overlap,
//!   least-penetration separation, ray/point/region queries
//! - **Pooling**: generational handles, guarded release, particle and
//!   projectile pools that recycle themselves
//! - **Fixed Timestep**: accumulator clock with a spiral-of-death clamp and
//!   an interpolation factor for rendering
//!
//! ## Example
//!
//! ```rust
//! use arcade_core::ecs::{layers, Entity, EntityType};
//! use arcade_core::{SimConfig, Simulation};
//! use glam::Vec2;
//! use std::time::Duration;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! let wall = Entity::new(EntityType::OBSTACLE, Vec2::new(64.0, 0.0))
//!     .with_size(16.0, 64.0)
//!     .solid(layers::WALL, layers::ALL)
//!     .as_static();
//! sim.registry_mut().add(wall);
//!
//! let stats = sim.frame(Duration::from_millis(20));
//! assert_eq!(stats.ticks, 1);
//! ```

#![warn(missing_docs)]

/// Collision detection and response
pub mod collision;

/// Simulation configuration
pub mod config;

/// Entity storage and per-tick execution
pub mod ecs;

/// Error types
pub mod error;

/// Simulation events and the audio collaborator
pub mod events;

/// Per-tick input state
pub mod input;

/// Level data loading
pub mod level;

/// Object pooling for short-lived objects
pub mod pool;

/// Render snapshots and the rendering collaborator
pub mod render;

/// Top-level simulation loop
pub mod sim;

pub use collision::CollisionResolver;
pub use config::SimConfig;
pub use ecs::{Entity, EntityId, EntityRegistry, EntityType};
pub use error::SimError;
pub use sim::Simulation;
