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
//! Simulation events and the audio collaborator
//!
//! Entity logic never calls collaborators directly. It pushes [`SimEvent`]s
//! into the tick's outbox; after the tick the simulation hands sound cues to
//! the [`AudioSink`], if one is attached. A missing or failing sink is logged
//! and skipped, so audio can never affect simulation state.

use crate::ecs::{EntityId, EntityType};
use crate::error::CollaboratorError;

/// A sound the game wants played
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Two solid bodies hit each other
    Collision,
    /// An actor took damage
    Hit,
    /// An actor was defeated
    Defeat,
    /// A projectile was fired
    Shoot,
    /// A level objective was reached
    Objective,
    /// Game-specific cue
    Named(String),
}

/// Discrete, fire-and-forget simulation output
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Play a sound
    Sound(SoundCue),
    /// An actor lost health
    Damaged {
        /// Entity that was hurt
        target: EntityId,
        /// Entity or owner responsible, if known
        source: Option<EntityId>,
        /// Health removed
        amount: f32,
        /// Health left afterwards
        remaining: f32,
    },
    /// An actor's health reached zero
    Defeated {
        /// The defeated entity
        entity: EntityId,
        /// Its type tag
        entity_type: EntityType,
    },
    /// A player entered an objective region
    ObjectiveReached {
        /// The objective entity
        objective: EntityId,
        /// The entity that reached it
        by: EntityId,
    },
    /// An entity faulted and was removed
    EntityFault {
        /// The faulted entity
        entity: EntityId,
        /// Logged cause
        reason: String,
    },
}

/// Audio playback collaborator
pub trait AudioSink {
    /// Play a cue; failures are reported, never retried
    fn play(&mut self, cue: &SoundCue) -> Result<(), CollaboratorError>;
}

/// Forward every sound cue in `events` to `sink`
///
/// Returns how many cues were played successfully. With no sink attached the
/// cues are dropped.
pub fn dispatch_sounds(events: &[SimEvent], sink: Option<&mut (dyn AudioSink + '_)>) -> usize {
    let Some(sink) = sink else {
        return 0;
    };

    let mut played = 0;
    for event in events {
        if let SimEvent::Sound(cue) = event {
            match sink.play(cue) {
                Ok(()) => played += 1,
                Err(e) => log::warn!("skipping sound {:?}: {}", cue, e),
            }
        }
    }
    played
}
