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

//! Shared plumbing for on-disk diagnostic reports.
//!
//! The guard subsystem and perf telemetry both emit files under a common
//! "run root". Resolution order is fixed and consumed by CI tooling:
//! explicit caller override, then the `DOMINIUM_RUN_ROOT` environment
//! variable, then the current directory.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Environment variable naming the report output root.
pub const RUN_ROOT_ENV: &str = "DOMINIUM_RUN_ROOT";

/// Environment variable carrying the telemetry tier label. Consumed by test
/// harnesses, never read by the core itself.
pub const PERF_TIER_ENV: &str = "DOMINIUM_PERF_TIER";

/// An externally supplied simulation timestamp attached to diagnostic
/// reports and telemetry samples for correlation with sim state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActStamp {
    /// Simulation time in ACT units.
    pub act_time: f64,
    /// Simulation tick index.
    pub sim_tick: u64,
}

impl ActStamp {
    /// Creates a stamp from an ACT time and tick index.
    pub fn new(act_time: f64, sim_tick: u64) -> Self {
        Self { act_time, sim_tick }
    }
}

/// Resolves the run root for report output.
///
/// Priority: explicit override, `DOMINIUM_RUN_ROOT`, current directory.
pub fn resolve_run_root(override_root: Option<&Path>) -> PathBuf {
    if let Some(root) = override_root {
        return root.to_path_buf();
    }
    if let Ok(root) = std::env::var(RUN_ROOT_ENV) {
        if !root.is_empty() {
            return PathBuf::from(root);
        }
    }
    PathBuf::from(".")
}

/// Sanitizes a fixture name for use in report file names.
///
/// Only ASCII alphanumerics, `_` and `-` survive; every other character is
/// replaced with `_` so fixture labels can never escape the report
/// directory or produce platform-hostile file names.
pub fn sanitize_fixture(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes a line-oriented `key: value` report, durably.
///
/// Parent directories are created as needed. The file is flushed and synced
/// before returning so a fatal-mode abort immediately afterwards cannot
/// lose the report.
pub fn write_kv_report(path: &Path, lines: &[(String, String)]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    for (key, value) in lines {
        writeln!(file, "{key}: {value}")?;
    }
    file.flush()?;
    file.sync_all()?;
    Ok(())
}
