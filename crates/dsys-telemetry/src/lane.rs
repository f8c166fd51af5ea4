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

//! The two axes of the perf counter grid.
//!
//! Both enumerations are closed and their names are part of the telemetry
//! schema consumed by CI tooling; adding, removing, or renaming a variant
//! is a schema change and must be versioned accordingly.

/// Execution tier of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Lane {
    /// Player-adjacent, per-frame simulation.
    Local = 0,
    /// Mid-range aggregation.
    Meso = 1,
    /// Wide-area, low-frequency simulation.
    Macro = 2,
    /// Orbit-level background processing.
    Orbital = 3,
}

impl Lane {
    /// Number of lanes.
    pub const COUNT: usize = 4;

    /// All lanes, in index order.
    pub const ALL: [Lane; Lane::COUNT] = [Lane::Local, Lane::Meso, Lane::Macro, Lane::Orbital];

    /// The lane's grid row.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The schema name used in telemetry records.
    pub const fn name(self) -> &'static str {
        match self {
            Lane::Local => "local",
            Lane::Meso => "meso",
            Lane::Macro => "macro",
            Lane::Orbital => "orbital",
        }
    }
}

/// A measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Metric {
    /// Total tick wall time, microseconds.
    TickTotalUs = 0,
    /// Scheduler dispatch time inside the tick, microseconds.
    SchedDispatchUs = 1,
    /// Scheduler jobs run this tick.
    SchedJobsRun = 2,
    /// Engine events drained from the queue this tick.
    EventsPolled = 3,
    /// Event-queue depth after draining.
    EventQueueDepth = 4,
    /// Entries in the interest set.
    InterestEntries = 5,
    /// Byte size of the interest set.
    InterestBytes = 6,
    /// Render submission time, microseconds.
    RenderSubmitUs = 7,
    /// Bytes streamed out to disk this tick.
    StreamBytesOut = 8,
    /// Network messages received.
    NetMsgsIn = 9,
    /// Network messages sent.
    NetMsgsOut = 10,
    /// Network bytes received.
    NetBytesIn = 11,
    /// Network bytes sent.
    NetBytesOut = 12,
}

impl Metric {
    /// Number of metrics.
    pub const COUNT: usize = 13;

    /// All metrics, in index order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::TickTotalUs,
        Metric::SchedDispatchUs,
        Metric::SchedJobsRun,
        Metric::EventsPolled,
        Metric::EventQueueDepth,
        Metric::InterestEntries,
        Metric::InterestBytes,
        Metric::RenderSubmitUs,
        Metric::StreamBytesOut,
        Metric::NetMsgsIn,
        Metric::NetMsgsOut,
        Metric::NetBytesIn,
        Metric::NetBytesOut,
    ];

    /// The metric's grid column.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The schema name used in telemetry records.
    pub const fn name(self) -> &'static str {
        match self {
            Metric::TickTotalUs => "tick_total_us",
            Metric::SchedDispatchUs => "sched_dispatch_us",
            Metric::SchedJobsRun => "sched_jobs_run",
            Metric::EventsPolled => "events_polled",
            Metric::EventQueueDepth => "event_queue_depth",
            Metric::InterestEntries => "interest_entries",
            Metric::InterestBytes => "interest_bytes",
            Metric::RenderSubmitUs => "render_submit_us",
            Metric::StreamBytesOut => "stream_bytes_out",
            Metric::NetMsgsIn => "net_msgs_in",
            Metric::NetMsgsOut => "net_msgs_out",
            Metric::NetBytesIn => "net_bytes_in",
            Metric::NetBytesOut => "net_bytes_out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_indices_match_declaration_order() {
        for (expected, lane) in Lane::ALL.iter().enumerate() {
            assert_eq!(lane.index(), expected);
        }
    }

    #[test]
    fn metric_indices_match_declaration_order() {
        for (expected, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(metric.index(), expected);
        }
    }

    #[test]
    fn schema_names_are_unique() {
        for (i, a) in Metric::ALL.iter().enumerate() {
            for b in Metric::ALL.iter().skip(i + 1) {
                assert_ne!(a.name(), b.name());
            }
        }
    }
}
