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
//! Arcade demo
//!
//! Loads a small level, walks the player right while firing at an enemy,
//! and prints what the simulation reports. Run with
//! `RUST_LOG=debug cargo run --example arcade_demo` to see the engine logs.

use arcade_core::error::CollaboratorError;
use arcade_core::events::{AudioSink, SimEvent, SoundCue};
use arcade_core::input::Button;
use arcade_core::level::LevelData;
use arcade_core::pool::ProjectileInit;
use arcade_core::render::{RenderFrame, RenderSink};
use arcade_core::{EntityType, SimConfig, Simulation};
use glam::Vec2;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

const LEVEL: &str = r#"{
    "format_version": "1.1.0",
    "name": "demo",
    "player_start": [0.0, 80.0],
    "obstacles": [
        { "x": 230.0, "y": 0.0, "width": 16.0, "height": 224.0, "style": "steel", "label": "east wall" }
    ],
    "objective": { "x": 180.0, "y": 80.0, "width": 24.0, "height": 48.0 },
    "enemies": [
        { "x": 120.0, "y": 20.0, "width": 20.0, "height": 20.0, "health": 8.0 }
    ]
}"#;

struct ConsoleAudio;

impl AudioSink for ConsoleAudio {
    fn play(&mut self, cue: &SoundCue) -> Result<(), CollaboratorError> {
        println!("  [audio] {:?}", cue);
        Ok(())
    }
}

struct FrameCounter {
    frames: Rc<Cell<u32>>,
    items: Rc<Cell<usize>>,
}

impl RenderSink for FrameCounter {
    fn submit(&mut self, frame: &RenderFrame) -> Result<(), CollaboratorError> {
        self.frames.set(self.frames.get() + 1);
        self.items.set(frame.items.len() + frame.particles.len());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Arcade Core - Demo");
    println!("==================\n");

    let mut sim = Simulation::new(SimConfig::default())?;
    sim.set_audio(Box::new(ConsoleAudio));
    let frames = Rc::new(Cell::new(0));
    let items = Rc::new(Cell::new(0));
    sim.set_renderer(Box::new(FrameCounter {
        frames: frames.clone(),
        items: items.clone(),
    }));

    let level = LevelData::from_json_str(LEVEL)?;
    let spawn = sim.load_level(&level);
    println!("Loaded level '{}': {:?}\n", level.name, sim.registry().stats().by_type);

    let player = spawn.player.ok_or("level has no player")?;
    let enemy = spawn.enemies[0];
    sim.input_mut().press(Button::Right);

    // Uneven frame times, including one long stall
    let pattern = [16u64, 17, 16, 33, 16, 400, 16, 17];
    for (frame, ms) in pattern.iter().cycle().take(240).enumerate() {
        if frame % 30 == 0 {
            let origin = sim.registry().get(player).map(|p| p.center()).unwrap_or(Vec2::ZERO);
            let target = sim.registry().get(enemy).map(|e| e.center());
            if let Some(target) = target {
                let aim = (target - origin).normalize_or_zero() * 300.0;
                sim.fire_projectile(ProjectileInit::new(origin, aim, 3.0).with_owner(player));
                println!("frame {:3}: fired at {}", frame, enemy);
            }
        }

        let stats = sim.frame(Duration::from_millis(*ms));
        if stats.clamped {
            println!("frame {:3}: {} ms stall clamped to one tick", frame, ms);
        }

        for event in sim.events() {
            match event {
                SimEvent::Damaged { target, remaining, .. } => {
                    println!("frame {:3}: {} hit, {} health left", frame, target, remaining)
                }
                SimEvent::Defeated { entity, .. } => println!("frame {:3}: {} defeated", frame, entity),
                SimEvent::ObjectiveReached { by, .. } => {
                    println!("frame {:3}: objective reached by {}", frame, by)
                }
                _ => {}
            }
        }
    }

    let stats = sim.registry().stats();
    println!("\nAfter {} ticks:", sim.tick_count());
    println!("  entities: {} ({} players)", stats.total, sim.registry().by_type(&EntityType::PLAYER).len());
    if let Some(p) = sim.registry().get(player) {
        println!("  player at ({:.1}, {:.1})", p.pos.x, p.pos.y);
    }
    println!("  frames rendered: {}, last frame drew {} sprites", frames.get(), items.get());
    println!("  particle pool: {:?}", sim.resources().particles.stats());

    Ok(())
}
