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

//! # Dsys Guard
//!
//! The execution-guard subsystem: per-thread tagging (marking a thread
//! "must not block"), a blocking-I/O violation detector with structured
//! report generation, a non-blocking derived-job queue for offloading
//! blocking work off latency-critical threads, and a frame stall watchdog.
//!
//! Everything here is observation-only: guard verdicts block the guarded
//! I/O call itself, but no guard state ever feeds back into simulation
//! results.

#![warn(missing_docs)]

pub mod ioban;
pub mod jobs;
pub mod tag;
pub mod watchdog;

mod report;

pub use ioban::{CallSite, GuardedOp, HandleTrack, IoBanGuard, HANDLE_TRACK_CAPACITY};
pub use jobs::{DerivedJobQueue, JOB_QUEUE_CAPACITY};
pub use tag::{ThreadTag, ThreadTagFlags, TagError, MAX_TAGGED_THREADS};
pub use watchdog::StallWatchdog;

use std::path::PathBuf;

/// Shared configuration for the I/O-ban guard and the stall watchdog.
#[derive(Debug, Clone, Default)]
pub struct GuardConfig {
    /// Master switch; disabled guards are complete no-ops.
    pub enabled: bool,
    /// When set, a detected violation aborts the process after its report
    /// is durably written. Intended for CI enforcement.
    pub fatal: bool,
    /// Report root override; falls back to `DOMINIUM_RUN_ROOT`, then the
    /// current directory.
    pub run_root: Option<PathBuf>,
}
