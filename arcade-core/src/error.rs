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
//! Error types
//!
//! The simulation tick itself never fails: per-entity faults are contained at
//! the registry boundary and collaborator failures are logged and skipped.
//! The types here describe those contained faults, plus the errors returned
//! by loaders that run outside the tick (configuration and level data).

use thiserror::Error;

/// Errors returned by configuration and level loading
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading a config or level file failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON could not be parsed into the expected shape
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    /// A version string is not valid semver
    #[error("invalid version string: {0}")]
    Version(#[from] semver::Error),

    /// Level data is structurally valid JSON but describes impossible geometry
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// Level data was written for an incompatible format version
    #[error("level format {found} is incompatible with supported format {supported}")]
    IncompatibleLevel {
        /// Version declared by the level file
        found: String,
        /// Version this crate reads
        supported: &'static str,
    },
}

/// A fault raised by an entity's movement, behavior or collision callback
///
/// The registry logs these and marks the offending entity dead. They are
/// never propagated out of a tick.
#[derive(Debug, Error)]
pub enum BehaviorError {
    /// The entity's payload does not match what its behavior expects
    #[error("entity {entity} has no {expected} payload")]
    MissingPayload {
        /// Raw id of the entity
        entity: u64,
        /// Name of the payload variant the behavior needed
        expected: &'static str,
    },

    /// The entity reached a numerically invalid state
    #[error("entity {entity} reached a non-finite state")]
    NonFinite {
        /// Raw id of the entity
        entity: u64,
    },

    /// Free-form failure from game-specific logic
    #[error("{0}")]
    Failed(String),
}

/// Failure reported by an external collaborator (audio, rendering)
#[derive(Debug, Error)]
#[error("{collaborator} unavailable: {reason}")]
pub struct CollaboratorError {
    /// Which collaborator failed, for the log line
    pub collaborator: &'static str,
    /// Human-readable cause
    pub reason: String,
}

impl CollaboratorError {
    /// Create a new collaborator error
    pub fn new(collaborator: &'static str, reason: impl Into<String>) -> Self {
        CollaboratorError {
            collaborator,
            reason: reason.into(),
        }
    }
}
