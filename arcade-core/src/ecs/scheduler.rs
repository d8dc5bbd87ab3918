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
//! Fixed-timestep scheduler
//!
//! Rendered frames arrive at whatever rate the host manages; the simulation
//! always advances in whole ticks of a fixed length. Each frame's elapsed
//! time is added to an accumulator which is then consumed tick by tick. The
//! leftover fraction of a tick is exposed as an interpolation factor so the
//! renderer can blend between the previous and current tick.
//!
//! A frame longer than the configured ceiling (a breakpoint, a stalled
//! window) does not trigger a catch-up burst: the accumulator is set to
//! exactly one tick instead, bounding the work done in any single frame.

use crate::config::SimConfig;
use crate::error::SimError;
use std::time::Duration;

/// What a call to [`FixedTimestep::frame`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Ticks simulated this frame
    pub ticks: u32,
    /// Leftover fraction of a tick, in [0, 1)
    pub interpolation: f32,
    /// Whether the frame exceeded the ceiling and was clamped
    pub clamped: bool,
}

/// Accumulator-based fixed-step clock
///
/// # Examples
///
/// ```
/// use arcade_core::ecs::scheduler::FixedTimestep;
/// use std::time::Duration;
///
/// let mut clock = FixedTimestep::new(Duration::from_millis(10), Duration::from_millis(250)).unwrap();
/// let mut ticks = 0;
/// let stats = clock.frame(Duration::from_millis(25), |_dt| ticks += 1);
/// assert_eq!(ticks, 2);
/// assert!((stats.interpolation - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    tick: Duration,
    max_frame_time: Duration,
    accumulator: Duration,
    total_ticks: u64,
}

impl FixedTimestep {
    /// Create a clock with the given tick length and frame ceiling
    ///
    /// The tick must be non-zero and no longer than the ceiling.
    pub fn new(tick: Duration, max_frame_time: Duration) -> Result<Self, SimError> {
        if tick.is_zero() {
            return Err(SimError::InvalidConfig("tick duration must be non-zero".into()));
        }
        if max_frame_time < tick {
            return Err(SimError::InvalidConfig(format!(
                "max frame time {:?} is shorter than one tick ({:?})",
                max_frame_time, tick
            )));
        }
        Ok(FixedTimestep {
            tick,
            max_frame_time,
            accumulator: Duration::ZERO,
            total_ticks: 0,
        })
    }

    /// Create a clock from the simulation configuration
    pub fn from_config(config: &SimConfig) -> Result<Self, SimError> {
        Self::new(config.tick_duration(), config.max_frame_time())
    }

    /// Length of one tick
    pub fn tick_duration(&self) -> Duration {
        self.tick
    }

    /// Length of one tick in seconds
    pub fn dt(&self) -> f32 {
        self.tick.as_secs_f32()
    }

    /// Account for one rendered frame's elapsed time
    ///
    /// Returns how many ticks are now due; the caller runs them.
    pub fn advance(&mut self, elapsed: Duration) -> FrameStats {
        let clamped = elapsed > self.max_frame_time;
        if clamped {
            log::debug!(
                "frame took {:?} (ceiling {:?}); simulating a single tick",
                elapsed,
                self.max_frame_time
            );
            self.accumulator = self.tick;
        } else {
            self.accumulator += elapsed;
        }

        let mut ticks = 0;
        while self.accumulator >= self.tick {
            self.accumulator -= self.tick;
            ticks += 1;
        }
        self.total_ticks += u64::from(ticks);

        FrameStats {
            ticks,
            interpolation: self.interpolation(),
            clamped,
        }
    }

    /// Consume one rendered frame's elapsed time
    ///
    /// Calls `step` once per whole tick with the tick length in seconds.
    pub fn frame<F>(&mut self, elapsed: Duration, mut step: F) -> FrameStats
    where
        F: FnMut(f32),
    {
        let stats = self.advance(elapsed);
        let dt = self.dt();
        for _ in 0..stats.ticks {
            step(dt);
        }
        stats
    }

    /// Leftover fraction of a tick, in [0, 1)
    pub fn interpolation(&self) -> f32 {
        (self.accumulator.as_secs_f64() / self.tick.as_secs_f64()) as f32
    }

    /// Ticks simulated since creation or the last reset
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Drop any accumulated time
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.total_ticks = 0;
    }
}
