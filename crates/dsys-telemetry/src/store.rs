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

//! The perf counter store.
//!
//! Three parallel (lane x metric) tables are visible to readers: `current`
//! accumulates the in-flight tick and is zeroed by `tick_begin`; `last`
//! holds the previous tick's final values; `max` holds the running maximum
//! across all ticks since the last reset. A fourth table, the running sum,
//! is maintained alongside for future reporting but not yet exported.
//!
//! Per-tick snapshots land in a bounded sample list; overflow sets a sticky
//! flag instead of growing, so the store's memory use is fixed for the
//! whole run.

use crate::lane::{Lane, Metric};
use dsys_core::report::ActStamp;

/// Maximum number of retained per-tick samples.
pub const SAMPLE_CAPACITY: usize = 256;

/// One (lane x metric) table of counter values.
pub type MetricGrid = [[u64; Metric::COUNT]; Lane::COUNT];

const ZERO_GRID: MetricGrid = [[0; Metric::COUNT]; Lane::COUNT];

/// A snapshot of the counter grid at the end of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfSample {
    /// The ACT time supplied to `tick_begin`.
    pub act_time: f64,
    /// The tick index supplied to `tick_begin`.
    pub tick: u64,
    /// The final `current` table of that tick.
    pub values: MetricGrid,
}

/// The telemetry store: counter grids plus bounded sample history.
///
/// Caller-serialized like the rest of the platform layer; a disabled store
/// turns every mutation into a no-op so call sites never need to branch.
#[derive(Debug)]
pub struct PerfTelemetry {
    enabled: bool,
    current: MetricGrid,
    last: MetricGrid,
    max: MetricGrid,
    sum: MetricGrid,
    samples: Vec<PerfSample>,
    overflow: bool,
    tick_open: bool,
    act: ActStamp,
}

impl PerfTelemetry {
    /// Creates an enabled, empty store.
    pub fn new() -> Self {
        Self {
            enabled: true,
            current: ZERO_GRID,
            last: ZERO_GRID,
            max: ZERO_GRID,
            sum: ZERO_GRID,
            samples: Vec::new(),
            overflow: false,
            tick_open: false,
            act: ActStamp::default(),
        }
    }

    /// Enables or disables the store. Disabled stores ignore mutations.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns whether the store accepts mutations.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Overwrites a counter in the in-flight tick.
    pub fn set(&mut self, lane: Lane, metric: Metric, value: u64) {
        if !self.enabled {
            return;
        }
        self.current[lane.index()][metric.index()] = value;
    }

    /// Adds to a counter in the in-flight tick.
    pub fn add(&mut self, lane: Lane, metric: Metric, value: u64) {
        if !self.enabled {
            return;
        }
        let slot = &mut self.current[lane.index()][metric.index()];
        *slot = slot.saturating_add(value);
    }

    /// Raises a counter in the in-flight tick to at least `value`.
    pub fn accumulate_max(&mut self, lane: Lane, metric: Metric, value: u64) {
        if !self.enabled {
            return;
        }
        let slot = &mut self.current[lane.index()][metric.index()];
        if value > *slot {
            *slot = value;
        }
    }

    /// Opens a tick: zeroes the `current` table and records the ACT stamp
    /// that will annotate the tick's sample.
    pub fn tick_begin(&mut self, act_time: f64, tick: u64) {
        if !self.enabled {
            return;
        }
        if self.tick_open {
            log::debug!("tick {tick} began before the previous tick ended");
        }
        self.current = ZERO_GRID;
        self.act = ActStamp::new(act_time, tick);
        self.tick_open = true;
    }

    /// Closes a tick: archives a snapshot and folds `current` into the
    /// `last`, `sum`, and `max` tables.
    pub fn tick_end(&mut self) {
        if !self.enabled || !self.tick_open {
            return;
        }
        self.tick_open = false;

        if self.samples.len() < SAMPLE_CAPACITY {
            self.samples.push(PerfSample {
                act_time: self.act.act_time,
                tick: self.act.sim_tick,
                values: self.current,
            });
        } else if !self.overflow {
            self.overflow = true;
            log::warn!("perf sample history full ({SAMPLE_CAPACITY}); later ticks are dropped");
        }

        for lane in 0..Lane::COUNT {
            for metric in 0..Metric::COUNT {
                let value = self.current[lane][metric];
                self.last[lane][metric] = value;
                self.sum[lane][metric] = self.sum[lane][metric].saturating_add(value);
                if value > self.max[lane][metric] {
                    self.max[lane][metric] = value;
                }
            }
        }
    }

    /// Reads the in-flight tick's counter.
    pub fn current(&self, lane: Lane, metric: Metric) -> u64 {
        self.current[lane.index()][metric.index()]
    }

    /// Reads the previous tick's final counter.
    pub fn last(&self, lane: Lane, metric: Metric) -> u64 {
        self.last[lane.index()][metric.index()]
    }

    /// Reads the running maximum since the last reset.
    pub fn max_seen(&self, lane: Lane, metric: Metric) -> u64 {
        self.max[lane.index()][metric.index()]
    }

    /// The archived per-tick samples, oldest first.
    pub fn samples(&self) -> &[PerfSample] {
        &self.samples
    }

    /// Whether sample history overflowed since the last reset.
    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    pub(crate) fn max_grid(&self) -> &MetricGrid {
        &self.max
    }

    /// Clears every table, the sample history, and the overflow flag.
    /// The enabled switch is untouched.
    pub fn reset(&mut self) {
        self.current = ZERO_GRID;
        self.last = ZERO_GRID;
        self.max = ZERO_GRID;
        self.sum = ZERO_GRID;
        self.samples.clear();
        self.overflow = false;
        self.tick_open = false;
        self.act = ActStamp::default();
    }
}

impl Default for PerfTelemetry {
    fn default() -> Self {
        Self::new()
    }
}
