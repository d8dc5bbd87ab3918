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
//! Simulation configuration
//!
//! [`SimConfig`] is plain serde data with defaults matching a 60 Hz arcade
//! loop on a 256x224 playfield. It can be built in code, parsed from JSON, or
//! loaded from the file named by the `ARCADE_CORE_CONFIG` environment
//! variable:
//!
//! ```bash
//! export ARCADE_CORE_CONFIG=/path/to/arcade.json
//! ```
//!
//! Missing fields fall back to their defaults, so a config file only needs
//! the values it changes.

use crate::ecs::Bounds;
use crate::error::SimError;
use crate::pool::PoolConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "ARCADE_CORE_CONFIG";

/// Top-level simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed simulation ticks per second
    pub tick_rate: f64,
    /// Frames longer than this are clamped to a single tick (spiral-of-death guard)
    pub max_frame_time_ms: f64,
    /// Side length of a spatial grid cell, in world units
    pub cell_size: f32,
    /// Upper bound on samples taken by a ray query
    pub max_ray_steps: usize,
    /// Region outside which particles and projectiles are recycled
    pub playfield: Bounds,
    /// Particle pool sizing
    pub particles: PoolConfig,
    /// Projectile pool sizing
    pub projectiles: PoolConfig,
    /// Seed for the simulation RNG (particle bursts)
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            tick_rate: 60.0,
            max_frame_time_ms: 250.0,
            cell_size: 64.0,
            max_ray_steps: 100,
            playfield: Bounds::new(-50.0, -50.0, 306.0, 274.0),
            particles: PoolConfig::new(50),
            projectiles: PoolConfig::new(20),
            seed: 0x5eed_a2c4,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Load from the file named by `ARCADE_CORE_CONFIG`, or use defaults
    ///
    /// An unset variable is not an error. A set variable pointing at a
    /// missing or malformed file is.
    pub fn from_env() -> Result<Self, SimError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                log::info!("loading simulation config from {}", path);
                Self::from_file(path)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Duration of one fixed tick
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }

    /// Frame-time ceiling for the spiral-of-death guard
    pub fn max_frame_time(&self) -> Duration {
        Duration::from_secs_f64(self.max_frame_time_ms / 1000.0)
    }

    /// Check that every value is usable
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "tick_rate {} must be positive and finite",
                self.tick_rate
            )));
        }
        if self.tick_rate > 1000.0 {
            return Err(SimError::InvalidConfig(format!(
                "tick_rate {} is above 1000 Hz",
                self.tick_rate
            )));
        }

        let tick_ms = 1000.0 / self.tick_rate;
        if !self.max_frame_time_ms.is_finite() || self.max_frame_time_ms < tick_ms {
            return Err(SimError::InvalidConfig(format!(
                "max_frame_time_ms {} must be at least one tick ({:.3} ms)",
                self.max_frame_time_ms, tick_ms
            )));
        }

        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "cell_size {} must be positive and finite",
                self.cell_size
            )));
        }

        if self.max_ray_steps == 0 {
            return Err(SimError::InvalidConfig(
                "max_ray_steps must be at least 1".to_string(),
            ));
        }

        if self.playfield.width() <= 0.0 || self.playfield.height() <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "playfield {:?} has no area",
                self.playfield
            )));
        }

        Ok(())
    }
}
