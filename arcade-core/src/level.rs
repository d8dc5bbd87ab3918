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
//! Level data loading
//!
//! Levels are JSON documents describing static geometry, trigger regions,
//! an optional objective, enemies and the player's start. Everything is
//! ingested as ordinary entities; the simulation has no other notion of a
//! level.
//!
//! ```json
//! {
//!   "format_version": "1.1.0",
//!   "name": "The Wedding Begins",
//!   "player_start": [40.0, 120.0],
//!   "obstacles": [{ "x": 300, "y": 250, "width": 80, "height": 100, "style": "plant" }],
//!   "objective": { "x": 400, "y": 300, "width": 50, "height": 50 }
//! }
//! ```

use crate::ecs::components::{ObjectiveState, ObstacleState, Payload, Vitals};
use crate::ecs::{layers, Entity, EntityId, EntityRegistry, EntityType};
use crate::error::SimError;
use glam::Vec2;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Level format this crate reads and writes
pub const LEVEL_FORMAT_VERSION: &str = "1.1.0";

/// Player hitbox
pub const PLAYER_SIZE: Vec2 = Vec2::new(32.0, 48.0);
/// Player starting health
pub const PLAYER_HEALTH: f32 = 100.0;
/// Seconds of immunity after the player is hit
pub const PLAYER_INVULNERABILITY: f32 = 1.0;

/// Check whether a level written as `found` can be read by format `supported`
///
/// Majors must match. For 1.x and later a level's minor must not be newer
/// than ours; for 0.x the minors must match exactly.
pub fn is_format_compatible(found: &str, supported: &str) -> Result<bool, SimError> {
    let found = Version::parse(found)?;
    let supported = Version::parse(supported)?;

    if found.major != supported.major {
        return Ok(false);
    }
    Ok(if found.major != 0 {
        found.minor <= supported.minor
    } else {
        found.minor == supported.minor
    })
}

/// A rectangle in level coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl RegionSpec {
    fn validate(&self, what: &str) -> Result<(), SimError> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return Err(SimError::InvalidLevel(format!(
                "{} at ({}, {}) must have positive, finite size",
                what, self.x, self.y
            )));
        }
        Ok(())
    }

    fn entity(&self, entity_type: EntityType) -> Entity {
        Entity::new(entity_type, Vec2::new(self.x, self.y)).with_size(self.width, self.height)
    }
}

/// Solid, static level geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    /// Placement
    #[serde(flatten)]
    pub region: RegionSpec,
    /// Visual variant
    #[serde(default)]
    pub style: String,
    /// Caption
    #[serde(default)]
    pub label: String,
}

/// An enemy placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    /// Placement
    #[serde(flatten)]
    pub region: RegionSpec,
    /// Starting health
    pub health: f32,
}

/// A complete level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Semver of the format the file was written in
    pub format_version: String,
    /// Display name
    pub name: String,
    /// Where to spawn the player, if anywhere
    #[serde(default)]
    pub player_start: Option<Vec2>,
    /// Walls and props
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,
    /// Regions that notify the player on overlap
    #[serde(default)]
    pub triggers: Vec<RegionSpec>,
    /// Goal region
    #[serde(default)]
    pub objective: Option<RegionSpec>,
    /// Enemy placements
    #[serde(default)]
    pub enemies: Vec<EnemySpec>,
}

/// Ids of everything a level spawned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelSpawn {
    /// The player, if the level places one
    pub player: Option<EntityId>,
    /// Obstacles, in file order
    pub obstacles: Vec<EntityId>,
    /// Triggers, in file order
    pub triggers: Vec<EntityId>,
    /// The objective
    pub objective: Option<EntityId>,
    /// Enemies, in file order
    pub enemies: Vec<EntityId>,
}

impl LevelData {
    /// An empty level in the current format
    pub fn new(name: impl Into<String>) -> Self {
        LevelData {
            format_version: LEVEL_FORMAT_VERSION.to_string(),
            name: name.into(),
            player_start: None,
            obstacles: Vec::new(),
            triggers: Vec::new(),
            objective: None,
            enemies: Vec::new(),
        }
    }

    /// Parse, version-check and validate a level
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let level: LevelData = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Read a level file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("loading level from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the format version and geometry
    pub fn validate(&self) -> Result<(), SimError> {
        if !is_format_compatible(&self.format_version, LEVEL_FORMAT_VERSION)? {
            return Err(SimError::IncompatibleLevel {
                found: self.format_version.clone(),
                supported: LEVEL_FORMAT_VERSION,
            });
        }
        for obstacle in &self.obstacles {
            obstacle.region.validate("obstacle")?;
        }
        for trigger in &self.triggers {
            trigger.validate("trigger")?;
        }
        if let Some(objective) = &self.objective {
            objective.validate("objective")?;
        }
        for enemy in &self.enemies {
            enemy.region.validate("enemy")?;
            if !(enemy.health > 0.0 && enemy.health.is_finite()) {
                return Err(SimError::InvalidLevel(format!(
                    "enemy at ({}, {}) needs positive health",
                    enemy.region.x, enemy.region.y
                )));
            }
        }
        if let Some(start) = self.player_start {
            if !start.is_finite() {
                return Err(SimError::InvalidLevel("player start is not finite".into()));
            }
        }
        Ok(())
    }

    /// Register every entity the level describes
    ///
    /// Call [`validate`](Self::validate) first for untrusted data; invalid
    /// enemy health is clamped to 1 here rather than rejected.
    pub fn spawn_into(&self, registry: &mut EntityRegistry) -> LevelSpawn {
        let mut spawn = LevelSpawn::default();

        for obstacle in &self.obstacles {
            let entity = obstacle
                .region
                .entity(EntityType::OBSTACLE)
                .solid(layers::WALL, layers::ALL)
                .as_static()
                .with_payload(Payload::Obstacle(ObstacleState {
                    style: obstacle.style.clone(),
                    label: obstacle.label.clone(),
                }));
            spawn.obstacles.push(registry.add(entity));
        }

        for trigger in &self.triggers {
            let entity = trigger
                .entity(EntityType::TRIGGER)
                .solid(layers::TRIGGER, layers::PLAYER)
                .as_static()
                .as_trigger();
            spawn.triggers.push(registry.add(entity));
        }

        if let Some(objective) = &self.objective {
            let entity = objective
                .entity(EntityType::OBJECTIVE)
                .solid(layers::TRIGGER, layers::PLAYER)
                .as_static()
                .as_trigger()
                .with_payload(Payload::Objective(ObjectiveState::default()));
            spawn.objective = Some(registry.add(entity));
        }

        for enemy in &self.enemies {
            let health = if enemy.health > 0.0 && enemy.health.is_finite() {
                enemy.health
            } else {
                1.0
            };
            let entity = enemy
                .region
                .entity(EntityType::ENEMY)
                .solid(layers::ENEMY, layers::PLAYER | layers::WALL | layers::ENEMY)
                .with_payload(Payload::Actor(Vitals::new(health)));
            spawn.enemies.push(registry.add(entity));
        }

        if let Some(start) = self.player_start {
            let player = Entity::new(EntityType::PLAYER, start)
                .with_size(PLAYER_SIZE.x, PLAYER_SIZE.y)
                .solid(
                    layers::PLAYER,
                    layers::ENEMY | layers::WALL | layers::ITEM | layers::TRIGGER,
                )
                .with_depth(1)
                .with_payload(Payload::Actor(
                    Vitals::new(PLAYER_HEALTH).with_invulnerability(PLAYER_INVULNERABILITY),
                ));
            spawn.player = Some(registry.add(player));
        }

        log::info!(
            "level '{}': {} obstacles, {} triggers, {} enemies",
            self.name,
            spawn.obstacles.len(),
            spawn.triggers.len(),
            spawn.enemies.len()
        );
        spawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = r#"{
        "format_version": "1.0.3",
        "name": "The Ceremony",
        "player_start": [40.0, 120.0],
        "obstacles": [
            { "x": 300, "y": 250, "width": 80, "height": 100, "style": "plant", "label": "Questionable Plant" },
            { "x": 0, "y": 0, "width": 10, "height": 10 }
        ],
        "triggers": [{ "x": 50, "y": 50, "width": 20, "height": 20 }],
        "objective": { "x": 500, "y": 200, "width": 50, "height": 50 },
        "enemies": [{ "x": 200, "y": 100, "width": 32, "height": 48, "health": 30 }]
    }"#;

    #[test]
    fn test_format_compatibility() {
        assert!(is_format_compatible("1.0.0", "1.1.0").unwrap());
        assert!(!is_format_compatible("1.2.0", "1.1.0").unwrap());
        assert!(!is_format_compatible("2.0.0", "1.1.0").unwrap());
        assert!(!is_format_compatible("0.2.0", "0.1.0").unwrap());
        assert!(is_format_compatible("0.1.5", "0.1.0").unwrap());
        assert!(matches!(is_format_compatible("one", "1.1.0"), Err(SimError::Version(_))));
    }

    #[test]
    fn test_parse_and_spawn() {
        let level = LevelData::from_json_str(LEVEL).unwrap();
        assert_eq!(level.obstacles[0].label, "Questionable Plant");
        assert_eq!(level.obstacles[1].style, "");

        let mut registry = EntityRegistry::new();
        let spawn = level.spawn_into(&mut registry);
        assert_eq!(registry.len(), 6);
        assert_eq!(spawn.obstacles.len(), 2);

        let wall = registry.get(spawn.obstacles[0]).unwrap();
        assert!(wall.solid && wall.is_static && !wall.is_trigger);
        assert_eq!(wall.size, Vec2::new(80.0, 100.0));

        let goal = registry.get(spawn.objective.unwrap()).unwrap();
        assert!(goal.is_trigger);

        let player = registry.get(spawn.player.unwrap()).unwrap();
        assert_eq!(player.pos, Vec2::new(40.0, 120.0));
        assert_eq!(player.payload.as_actor().unwrap().health, PLAYER_HEALTH);
        assert!(crate::collision::can_collide(player, goal));
        assert!(crate::collision::can_collide(player, wall));
    }

    #[test]
    fn test_rejects_newer_format() {
        let json = LEVEL.replace("1.0.3", "1.4.0");
        assert!(matches!(
            LevelData::from_json_str(&json),
            Err(SimError::IncompatibleLevel { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let json = LEVEL.replace("\"width\": 20", "\"width\": -20");
        assert!(matches!(LevelData::from_json_str(&json), Err(SimError::InvalidLevel(_))));

        let json = LEVEL.replace("\"health\": 30", "\"health\": 0");
        assert!(matches!(LevelData::from_json_str(&json), Err(SimError::InvalidLevel(_))));
    }

    #[test]
    fn test_round_trip_keeps_level() {
        let level = LevelData::from_json_str(LEVEL).unwrap();
        let again = LevelData::from_json_str(&level.to_json().unwrap()).unwrap();
        assert_eq!(level, again);
    }
}
