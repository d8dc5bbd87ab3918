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
//! Top-level simulation loop
//!
//! [`Simulation`] owns the registry, the collision resolver, the pools and
//! the collaborator handles, and runs each fixed tick in a fixed order:
//!
//! 1. entity update pass (structural changes flushed at its end)
//! 2. grid rebuild, contact resolution and notification (flushed again)
//! 3. particle and projectile pools
//! 4. input edge history rolled over
//! 5. sound cues forwarded to the audio sink

use crate::collision::CollisionResolver;
use crate::config::SimConfig;
use crate::ecs::{Archetypes, EntityRegistry, FixedTimestep, FrameStats, Resources};
use crate::error::SimError;
use crate::events::{dispatch_sounds, AudioSink, SimEvent};
use crate::input::InputState;
use crate::level::{LevelData, LevelSpawn};
use crate::pool::{PoolHandle, ProjectileInit};
use crate::render::{present, RenderFrame, RenderSink};
use std::time::Duration;

/// Particles sprayed where a pooled projectile lands
const PROJECTILE_HIT_BURST: usize = 6;

/// The simulation core
pub struct Simulation {
    config: SimConfig,
    registry: EntityRegistry,
    resolver: CollisionResolver,
    clock: FixedTimestep,
    resources: Resources,
    audio: Option<Box<dyn AudioSink>>,
    renderer: Option<Box<dyn RenderSink>>,
    outbox: Vec<SimEvent>,
    ticks: u64,
}

impl Simulation {
    /// Create a simulation with the built-in archetypes
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        Self::with_archetypes(config, Archetypes::standard())
    }

    /// Create a simulation with a custom behavior table
    pub fn with_archetypes(config: SimConfig, archetypes: Archetypes) -> Result<Self, SimError> {
        config.validate()?;
        let clock = FixedTimestep::from_config(&config)?;
        log::info!(
            "simulation at {} Hz, cell size {}, seed {:#x}",
            config.tick_rate,
            config.cell_size,
            config.seed
        );

        Ok(Simulation {
            registry: EntityRegistry::with_archetypes(archetypes),
            resolver: CollisionResolver::from_config(&config),
            clock,
            resources: Resources::new(&config),
            audio: None,
            renderer: None,
            outbox: Vec::new(),
            ticks: 0,
            config,
        })
    }

    /// Attach an audio collaborator
    pub fn set_audio(&mut self, sink: Box<dyn AudioSink>) {
        self.audio = Some(sink);
    }

    /// Attach a rendering collaborator
    pub fn set_renderer(&mut self, sink: Box<dyn RenderSink>) {
        self.renderer = Some(sink);
    }

    /// Advance by one rendered frame's elapsed time
    ///
    /// Runs as many ticks as the clock allows, then presents a frame to the
    /// renderer if one is attached. Events from earlier frames are dropped.
    pub fn frame(&mut self, elapsed: Duration) -> FrameStats {
        self.outbox.clear();

        let stats = self.clock.advance(elapsed);
        for _ in 0..stats.ticks {
            self.tick();
        }

        if self.renderer.is_some() {
            let frame = self.render_frame(self.clock.interpolation());
            present(&frame, self.renderer.as_deref_mut());
        }
        stats
    }

    /// Run exactly one fixed tick
    pub fn tick(&mut self) {
        let dt = self.clock.dt();

        self.registry.update(dt, &mut self.resources);
        self.resolver.step(&mut self.registry, &mut self.resources, dt);

        self.resources.particles.update_all(dt);
        let hits = self
            .resources
            .projectiles
            .update_all(dt, &self.resolver, &self.registry);
        if !hits.is_empty() {
            self.registry.begin_deferred();
            for hit in &hits {
                self.registry.queue_damage(hit.target, hit.damage, hit.owner);
                self.resources.particles.burst(
                    &mut self.resources.rng,
                    hit.point,
                    PROJECTILE_HIT_BURST,
                    0xffd040,
                );
            }
            self.registry.flush(&mut self.resources.events);
        }

        self.resources.input.end_tick();

        let events = std::mem::take(&mut self.resources.events);
        dispatch_sounds(&events, self.audio.as_deref_mut());
        self.outbox.extend(events);
        self.ticks += 1;
    }

    /// Replace the world with a level's contents
    ///
    /// Pooled objects are reclaimed and every entity is removed first.
    pub fn load_level(&mut self, level: &LevelData) -> LevelSpawn {
        self.resources.particles.release_all();
        self.resources.projectiles.release_all();
        self.registry.clear();
        self.clock.reset();
        level.spawn_into(&mut self.registry)
    }

    /// Launch a pooled projectile
    pub fn fire_projectile(&mut self, init: ProjectileInit) -> PoolHandle {
        self.resources.projectiles.fire(init)
    }

    /// Snapshot for the renderer, blending positions by `alpha`
    ///
    /// Pass [`interpolation`](Self::interpolation) for the usual case.
    pub fn render_frame(&self, alpha: f32) -> RenderFrame {
        RenderFrame::build(
            &self.registry,
            &self.resources.particles,
            &self.resources.projectiles,
            alpha,
        )
    }

    /// Leftover fraction of a tick after the last frame
    pub fn interpolation(&self) -> f32 {
        self.clock.interpolation()
    }

    /// Events produced since the last [`frame`](Self::frame)
    pub fn events(&self) -> &[SimEvent] {
        &self.outbox
    }

    /// Take the pending events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Input state read by the next tick
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.resources.input
    }

    /// The entity registry
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Mutable access to the entity registry, between ticks
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// The collision resolver and its last grid
    pub fn resolver(&self) -> &CollisionResolver {
        &self.resolver
    }

    /// Shared services (pools, rng, input)
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Active configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Ticks run since creation
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("ticks", &self.ticks)
            .field("entities", &self.registry.len())
            .field("audio", &self.audio.is_some())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}
