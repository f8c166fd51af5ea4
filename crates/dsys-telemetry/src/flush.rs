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

//! Flushing telemetry to disk.
//!
//! Two stable artifacts, both consumed by CI tooling:
//!
//! - `perf/telemetry/telemetry_<fixture>_<seq>.jsonl`: one JSON object per
//!   (sample x lane).
//! - `perf/budgets/PERF-BUDGET-002_<fixture>_<seq>.json`: one JSON object
//!   with every lane x metric running maximum as a flat
//!   `<lane>_<metric>_max` key.
//!
//! Each flush call consumes one process-wide sequence number, so repeated
//! flushes never collide on disk even for the same fixture.

use crate::lane::{Lane, Metric};
use crate::store::PerfTelemetry;
use anyhow::Context;
use dsys_core::report::{resolve_run_root, sanitize_fixture};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

/// Directory for the telemetry stream, relative to the run root.
pub const TELEMETRY_DIR: &str = "perf/telemetry";

/// Directory for budget reports, relative to the run root.
pub const BUDGETS_DIR: &str = "perf/budgets";

static FLUSH_SEQ: AtomicU32 = AtomicU32::new(0);

/// What a flush should emit, and where.
#[derive(Debug, Clone)]
pub struct FlushDesc {
    /// Fixture name; sanitized before use in file names.
    pub fixture: String,
    /// Optional tier label (typically from `DOMINIUM_PERF_TIER`).
    pub tier: Option<String>,
    /// Whether to write the JSONL telemetry stream.
    pub emit_stream: bool,
    /// Whether to write the budget report.
    pub emit_budget: bool,
    /// Run-root override; falls back to `DOMINIUM_RUN_ROOT`, then the
    /// current directory.
    pub run_root: Option<PathBuf>,
}

impl FlushDesc {
    /// A flush of both artifacts for the given fixture.
    pub fn new(fixture: impl Into<String>) -> Self {
        Self {
            fixture: fixture.into(),
            tier: None,
            emit_stream: true,
            emit_budget: true,
            run_root: None,
        }
    }
}

/// The files a flush produced.
#[derive(Debug, Clone, Default)]
pub struct FlushOutput {
    /// Path of the telemetry stream, when emitted.
    pub stream_path: Option<PathBuf>,
    /// Path of the budget report, when emitted.
    pub budget_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct StreamRecord<'a> {
    tick: u64,
    act_time: f64,
    lane: &'a str,
    fixture: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<&'a str>,
    #[serde(flatten)]
    metrics: Map<String, Value>,
}

impl PerfTelemetry {
    /// Writes the recorded samples to disk per `desc`.
    ///
    /// Both report directories are created under the resolved run root
    /// regardless of the emit flags, and one sequence number is consumed
    /// per call.
    pub fn flush(&self, desc: &FlushDesc) -> anyhow::Result<FlushOutput> {
        let root = resolve_run_root(desc.run_root.as_deref());
        let fixture = sanitize_fixture(&desc.fixture);
        let seq = FLUSH_SEQ.fetch_add(1, Ordering::Relaxed);

        let telemetry_dir = root.join(TELEMETRY_DIR);
        let budgets_dir = root.join(BUDGETS_DIR);
        fs::create_dir_all(&telemetry_dir)
            .with_context(|| format!("creating {}", telemetry_dir.display()))?;
        fs::create_dir_all(&budgets_dir)
            .with_context(|| format!("creating {}", budgets_dir.display()))?;

        let mut output = FlushOutput::default();

        if desc.emit_stream {
            let path = telemetry_dir.join(format!("telemetry_{fixture}_{seq}.jsonl"));
            self.write_stream(&path, &fixture, desc.tier.as_deref())
                .with_context(|| format!("writing {}", path.display()))?;
            output.stream_path = Some(path);
        }

        if desc.emit_budget {
            let path = budgets_dir.join(format!("PERF-BUDGET-002_{fixture}_{seq}.json"));
            self.write_budget(&path, &fixture, desc.tier.as_deref())
                .with_context(|| format!("writing {}", path.display()))?;
            output.budget_path = Some(path);
        }

        log::info!(
            "flushed {} samples for fixture '{fixture}' (seq {seq})",
            self.samples().len()
        );
        Ok(output)
    }

    fn write_stream(
        &self,
        path: &std::path::Path,
        fixture: &str,
        tier: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        for sample in self.samples() {
            for lane in Lane::ALL {
                let mut metrics = Map::new();
                for metric in Metric::ALL {
                    metrics.insert(
                        metric.name().to_string(),
                        Value::from(sample.values[lane.index()][metric.index()]),
                    );
                }
                let record = StreamRecord {
                    tick: sample.tick,
                    act_time: sample.act_time,
                    lane: lane.name(),
                    fixture,
                    tier,
                    metrics,
                };
                serde_json::to_writer(&mut file, &record)?;
                writeln!(file)?;
            }
        }
        file.flush()?;
        Ok(())
    }

    fn write_budget(
        &self,
        path: &std::path::Path,
        fixture: &str,
        tier: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut budget = Map::new();
        budget.insert("fixture".to_string(), Value::from(fixture));
        if let Some(tier) = tier {
            budget.insert("tier".to_string(), Value::from(tier));
        }
        budget.insert("samples".to_string(), Value::from(self.samples().len()));
        budget.insert("overflow".to_string(), Value::from(self.overflowed()));
        let max = self.max_grid();
        for lane in Lane::ALL {
            for metric in Metric::ALL {
                budget.insert(
                    format!("{}_{}_max", lane.name(), metric.name()),
                    Value::from(max[lane.index()][metric.index()]),
                );
            }
        }

        let mut file = File::create(path)?;
        serde_json::to_writer_pretty(&mut file, &Value::Object(budget))?;
        writeln!(file)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn recorded_store() -> PerfTelemetry {
        let mut perf = PerfTelemetry::new();
        perf.tick_begin(0.5, 1);
        perf.add(Lane::Local, Metric::EventsPolled, 4);
        perf.add(Lane::Macro, Metric::NetBytesIn, 2_048);
        perf.tick_end();
        perf.tick_begin(1.0, 2);
        perf.add(Lane::Local, Metric::EventsPolled, 9);
        perf.tick_end();
        perf
    }

    #[test]
    fn flush_writes_stream_and_budget() {
        let temp = tempfile::tempdir().unwrap();
        let perf = recorded_store();
        let mut desc = FlushDesc::new("boot_smoke");
        desc.tier = Some("fast".to_string());
        desc.run_root = Some(temp.path().to_path_buf());

        let output = perf.flush(&desc).expect("flush failed");
        let stream_path = output.stream_path.expect("no stream emitted");
        let budget_path = output.budget_path.expect("no budget emitted");

        // One line per sample x lane.
        let stream = fs::read_to_string(&stream_path).unwrap();
        let lines: Vec<&str> = stream.lines().collect();
        assert_eq!(lines.len(), 2 * Lane::COUNT);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["tick"], 1);
        assert_eq!(first["lane"], "local");
        assert_eq!(first["fixture"], "boot_smoke");
        assert_eq!(first["tier"], "fast");
        assert_eq!(first["events_polled"], 4);

        let budget: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&budget_path).unwrap()).unwrap();
        assert_eq!(budget["samples"], 2);
        assert_eq!(budget["overflow"], false);
        assert_eq!(budget["local_events_polled_max"], 9);
        assert_eq!(budget["macro_net_bytes_in_max"], 2_048);
        assert_eq!(budget["orbital_tick_total_us_max"], 0);
    }

    #[test]
    fn repeated_flushes_never_collide() {
        let temp = tempfile::tempdir().unwrap();
        let perf = recorded_store();
        let mut desc = FlushDesc::new("repeat");
        desc.run_root = Some(temp.path().to_path_buf());

        let first = perf.flush(&desc).unwrap();
        let second = perf.flush(&desc).unwrap();
        assert_ne!(first.stream_path, second.stream_path);
        assert_ne!(first.budget_path, second.budget_path);
        assert!(second.stream_path.unwrap().exists());
    }

    #[test]
    fn fixture_names_are_sanitized_in_file_names() {
        let temp = tempfile::tempdir().unwrap();
        let perf = recorded_store();
        let mut desc = FlushDesc::new("boot/smoke test");
        desc.run_root = Some(temp.path().to_path_buf());

        let output = perf.flush(&desc).unwrap();
        let name = output
            .stream_path
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(name.starts_with("telemetry_boot_smoke_test_"));
    }

    #[test]
    fn emit_flags_suppress_artifacts_but_directories_exist() {
        let temp = tempfile::tempdir().unwrap();
        let perf = recorded_store();
        let mut desc = FlushDesc::new("quiet");
        desc.run_root = Some(temp.path().to_path_buf());
        desc.emit_stream = false;
        desc.emit_budget = false;

        let output = perf.flush(&desc).unwrap();
        assert!(output.stream_path.is_none());
        assert!(output.budget_path.is_none());
        assert!(temp.path().join(TELEMETRY_DIR).is_dir());
        assert!(temp.path().join(BUDGETS_DIR).is_dir());
    }
}
