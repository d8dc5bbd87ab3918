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
//! Entity storage and per-tick execution
//!
//! This module provides:
//! - The homogeneous [`Entity`] record and its typed [`components::Payload`]
//! - The [`EntityRegistry`] with deferred structural mutation
//! - Per-type [`Movement`] and [`Behavior`] strategies bundled as [`Archetype`]s
//! - The call-scoped [`TickContext`] handed to every callback
//! - The fixed-timestep [`scheduler`]

mod behavior;
pub mod components;
mod context;
mod entity;
mod registry;
pub mod scheduler;
pub mod strategies;

pub use behavior::{Archetype, Archetypes, Behavior, Movement};
pub use context::{Command, Commands, Resources, TickContext};
pub use entity::{layers, Bounds, Entity, EntityId, EntityType};
pub use registry::{EntityRegistry, RegistryStats};
pub use scheduler::{FixedTimestep, FrameStats};
