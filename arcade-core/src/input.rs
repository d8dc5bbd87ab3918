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
//! Per-tick input snapshot
//!
//! The platform layer owns devices and key mapping. Once per tick it writes
//! into an [`InputState`]: a normalized direction and the set of held
//! buttons. Entity strategies read it through the tick context. Edge queries
//! compare against the previous tick, so [`InputState::end_tick`] must run
//! exactly once per simulated tick.

use glam::Vec2;

/// Logical controller buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Button {
    /// D-pad up
    Up = 1 << 0,
    /// D-pad down
    Down = 1 << 1,
    /// D-pad left
    Left = 1 << 2,
    /// D-pad right
    Right = 1 << 3,
    /// Primary action
    A = 1 << 4,
    /// Secondary action
    B = 1 << 5,
    /// Start / pause
    Start = 1 << 6,
    /// Select / menu
    Select = 1 << 7,
}

impl Button {
    fn bit(self) -> u16 {
        self as u16
    }
}

/// Button and direction state for one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    held: u16,
    previous: u16,
    axis: Option<Vec2>,
}

impl InputState {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a button as held
    pub fn press(&mut self, button: Button) {
        self.held |= button.bit();
    }

    /// Mark a button as released
    pub fn release(&mut self, button: Button) {
        self.held &= !button.bit();
    }

    /// Override the direction with an analog value (stick, touch pad)
    ///
    /// The vector is normalized; `None` returns control to the d-pad.
    pub fn set_axis(&mut self, axis: Option<Vec2>) {
        self.axis = axis.map(|v| v.normalize_or_zero());
    }

    /// Whether a button is held this tick
    pub fn is_down(&self, button: Button) -> bool {
        self.held & button.bit() != 0
    }

    /// Held this tick but not the previous one
    pub fn just_pressed(&self, button: Button) -> bool {
        self.is_down(button) && self.previous & button.bit() == 0
    }

    /// Held the previous tick but not this one
    pub fn just_released(&self, button: Button) -> bool {
        !self.is_down(button) && self.previous & button.bit() != 0
    }

    /// Normalized movement direction (zero when idle)
    pub fn direction(&self) -> Vec2 {
        if let Some(axis) = self.axis {
            return axis;
        }
        let mut dir = Vec2::ZERO;
        if self.is_down(Button::Left) {
            dir.x -= 1.0;
        }
        if self.is_down(Button::Right) {
            dir.x += 1.0;
        }
        if self.is_down(Button::Up) {
            dir.y -= 1.0;
        }
        if self.is_down(Button::Down) {
            dir.y += 1.0;
        }
        dir.normalize_or_zero()
    }

    /// Roll the current buttons into the edge-detection history
    pub fn end_tick(&mut self) {
        self.previous = self.held;
    }
}
