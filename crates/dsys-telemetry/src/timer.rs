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

//! Interval timers feeding the counter grid.
//!
//! Call sites bracket timed sections unconditionally; when telemetry is
//! disabled the timer comes back inactive and `timer_end` is a no-op, so
//! no call site ever needs to branch on the enabled state.

use crate::lane::{Lane, Metric};
use crate::store::PerfTelemetry;
use dsys_core::time::monotonic_us;

/// A running measurement of one timed section.
#[derive(Debug, Clone, Copy)]
pub struct PerfTimer {
    lane: Lane,
    metric: Metric,
    start_us: u64,
    active: bool,
}

impl PerfTimer {
    /// Whether `timer_end` will record anything for this timer.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl PerfTelemetry {
    /// Starts a timer targeting one counter.
    pub fn timer_begin(&self, lane: Lane, metric: Metric) -> PerfTimer {
        PerfTimer {
            lane,
            metric,
            start_us: monotonic_us(),
            active: self.is_enabled(),
        }
    }

    /// Stops a timer and adds the elapsed microseconds to its counter.
    ///
    /// Inactive timers (begun while telemetry was disabled) are discarded.
    pub fn timer_end(&mut self, timer: PerfTimer) {
        if !timer.active {
            return;
        }
        let elapsed_us = monotonic_us().saturating_sub(timer.start_us);
        self.add(timer.lane, timer.metric, elapsed_us);
    }
}
