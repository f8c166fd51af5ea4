// Copyright 2025 eraflo
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

//! Time utilities shared by the guard and telemetry subsystems.
//!
//! These run on the host's monotonic clock and are independent of the
//! active backend's clock, so guard measurements stay meaningful even under
//! the synthetic-clock null backend.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Returns microseconds elapsed since the first call in this process.
///
/// Monotonic and process-wide; the first caller establishes the epoch.
pub fn monotonic_us() -> u64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_micros() as u64
}

/// A simple stopwatch over the host monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Creates a stopwatch and starts it immediately.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Returns the elapsed time in microseconds.
    pub fn elapsed_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }

    /// Returns the elapsed time in seconds as a float.
    pub fn elapsed_secs_f64(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Restarts the stopwatch from now.
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
