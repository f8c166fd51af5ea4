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

//! # Dsys Telemetry
//!
//! Performance telemetry for the platform services layer: a two-dimensional
//! (lane x metric) counter/timer store with bounded per-tick sample history
//! and a file-based flush (newline-delimited telemetry stream plus a budget
//! report).
//!
//! Telemetry is strictly non-authoritative: it observes the simulation and
//! must never feed back into it.

#![warn(missing_docs)]

pub mod flush;
pub mod lane;
pub mod store;
pub mod timer;

pub use flush::{FlushDesc, FlushOutput};
pub use lane::{Lane, Metric};
pub use store::{MetricGrid, PerfSample, PerfTelemetry, SAMPLE_CAPACITY};
pub use timer::PerfTimer;
