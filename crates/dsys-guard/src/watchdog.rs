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

//! The frame stall watchdog.
//!
//! `frame_begin`/`frame_end` bracket one unit of work on a latency-critical
//! thread. The watchdog is observational: it measures after the fact and
//! reports stalls, it never preempts. Only threads tagged `NO_BLOCK` are
//! policed; on any other thread both calls are no-ops.

use crate::report;
use crate::tag;
use crate::GuardConfig;
use dsys_core::report::ActStamp;
use dsys_core::time::monotonic_us;
use std::path::PathBuf;

/// Default stall threshold: 100 milliseconds.
pub const DEFAULT_STALL_THRESHOLD_US: u64 = 100_000;

/// Detects frames that overrun their time budget on no-block threads.
///
/// One frame window is open at a time; state is caller-serialized like the
/// rest of the guard subsystem.
#[derive(Debug)]
pub struct StallWatchdog {
    enabled: bool,
    fatal: bool,
    run_root: Option<PathBuf>,
    threshold_us: u64,
    act: ActStamp,

    frame_open: bool,
    frame_start_us: u64,
    frame_tag: String,
    frame_thread: u64,

    longest_us: u64,
    triggered: bool,
    stall_count: u64,
    report_count: u64,
}

impl StallWatchdog {
    /// Creates a watchdog from shared guard configuration, with the
    /// default threshold.
    pub fn new(config: GuardConfig) -> Self {
        Self {
            enabled: config.enabled,
            fatal: config.fatal,
            run_root: config.run_root,
            threshold_us: DEFAULT_STALL_THRESHOLD_US,
            act: ActStamp::default(),
            frame_open: false,
            frame_start_us: 0,
            frame_tag: String::new(),
            frame_thread: 0,
            longest_us: 0,
            triggered: false,
            stall_count: 0,
            report_count: 0,
        }
    }

    /// Enables or disables the watchdog.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the stall threshold in microseconds.
    pub fn set_threshold_us(&mut self, threshold_us: u64) {
        self.threshold_us = threshold_us;
    }

    /// Returns the configured threshold in microseconds.
    pub fn threshold_us(&self) -> u64 {
        self.threshold_us
    }

    /// Sets the ACT context attached to subsequent reports.
    pub fn set_act(&mut self, act: ActStamp) {
        self.act = act;
    }

    /// Opens a frame window.
    ///
    /// No-op unless the watchdog is enabled and the calling thread is
    /// tagged `NO_BLOCK`. An already-open window is restarted; the
    /// abandoned measurement is discarded.
    pub fn frame_begin(&mut self, frame_tag: &str) {
        if !self.enabled || !tag::is_current_no_block() {
            return;
        }
        if self.frame_open {
            log::debug!(
                "frame '{}' abandoned without frame_end; measurement discarded",
                self.frame_tag
            );
        }
        self.frame_open = true;
        self.frame_start_us = monotonic_us();
        self.frame_tag.clear();
        self.frame_tag.push_str(frame_tag);
        self.frame_thread = tag::thread_ordinal();
    }

    /// Closes the frame window and evaluates the elapsed time.
    ///
    /// A clock regression (end before start) is tolerated by silently
    /// discarding the measurement; the watchdog never reports a negative
    /// duration.
    pub fn frame_end(&mut self) {
        if !self.enabled || !tag::is_current_no_block() || !self.frame_open {
            return;
        }
        self.frame_open = false;

        let now = monotonic_us();
        if now < self.frame_start_us {
            log::trace!("clock regressed across frame window; measurement discarded");
            return;
        }
        let duration_us = now - self.frame_start_us;
        if duration_us > self.longest_us {
            self.longest_us = duration_us;
        }
        if duration_us <= self.threshold_us {
            return;
        }

        self.stall_count += 1;
        self.report_count += 1;
        self.triggered = true;
        log::error!(
            "frame '{}' stalled: {duration_us}us against a {}us threshold (stall #{})",
            self.frame_tag,
            self.threshold_us,
            self.stall_count
        );
        self.write_report(duration_us);

        if self.fatal {
            log::error!("fatal guard mode set; aborting after stall report");
            std::process::abort();
        }
    }

    /// Clears counters and the triggered flag. Configuration (`enabled`,
    /// threshold, fatal mode) is untouched.
    pub fn reset(&mut self) {
        self.frame_open = false;
        self.longest_us = 0;
        self.triggered = false;
        self.stall_count = 0;
        self.report_count = 0;
    }

    /// Whether any stall has been detected since the last reset.
    pub fn was_triggered(&self) -> bool {
        self.triggered
    }

    /// The longest completed frame seen since the last reset.
    pub fn longest_us(&self) -> u64 {
        self.longest_us
    }

    /// Stalls detected since the last reset.
    pub fn stall_count(&self) -> u64 {
        self.stall_count
    }

    /// Reports written since the last reset.
    pub fn report_count(&self) -> u64 {
        self.report_count
    }

    fn write_report(&self, duration_us: u64) {
        let seq = report::next_stall_seq();
        let mut lines = report::common_header(
            "PERF-STALL-001",
            "frame exceeded its stall threshold on a no-block thread",
            self.act,
        );
        lines.push(("frame_tag".to_string(), self.frame_tag.clone()));
        lines.push(("duration_us".to_string(), duration_us.to_string()));
        lines.push(("threshold_us".to_string(), self.threshold_us.to_string()));
        lines.push(("longest_us".to_string(), self.longest_us.to_string()));
        lines.push(("stall_count".to_string(), self.stall_count.to_string()));
        report::write_guard_report(
            self.run_root.as_deref(),
            &format!("PERF-STALL-001_{seq}.log"),
            &lines,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{clear_current, tag_current, ThreadTagFlags};
    use std::fs;
    use std::thread;
    use std::time::Duration;

    fn watchdog_in(dir: &std::path::Path) -> StallWatchdog {
        StallWatchdog::new(GuardConfig {
            enabled: true,
            fatal: false,
            run_root: Some(dir.to_path_buf()),
        })
    }

    fn stall_reports(root: &std::path::Path) -> Vec<String> {
        let dir = root.join("perf/no_modal_loading");
        match fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with("PERF-STALL-001_"))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn slow_frame_triggers_and_reports() {
        thread::spawn(|| {
            let temp = tempfile::tempdir().unwrap();
            let mut watchdog = watchdog_in(temp.path());
            watchdog.set_threshold_us(1_000);
            tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();

            watchdog.frame_begin("sim_tick");
            thread::sleep(Duration::from_millis(5));
            watchdog.frame_end();
            clear_current();

            assert!(watchdog.was_triggered());
            assert_eq!(watchdog.stall_count(), 1);
            assert!(watchdog.longest_us() >= 5_000);

            let files = stall_reports(temp.path());
            assert_eq!(files.len(), 1);
            let body =
                fs::read_to_string(temp.path().join("perf/no_modal_loading").join(&files[0]))
                    .unwrap();
            assert!(body.contains("check: PERF-STALL-001\n"));
            assert!(body.contains("frame_tag: sim_tick\n"));
            assert!(body.contains("threshold_us: 1000\n"));
            assert!(body.contains("stall_count: 1\n"));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn fast_frame_does_not_trigger() {
        thread::spawn(|| {
            let temp = tempfile::tempdir().unwrap();
            let mut watchdog = watchdog_in(temp.path());
            watchdog.set_threshold_us(1_000_000);
            tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();

            watchdog.frame_begin("sim_tick");
            watchdog.frame_end();
            clear_current();

            assert!(!watchdog.was_triggered());
            assert_eq!(watchdog.stall_count(), 0);
            assert!(stall_reports(temp.path()).is_empty());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn untagged_thread_is_not_policed() {
        thread::spawn(|| {
            let temp = tempfile::tempdir().unwrap();
            let mut watchdog = watchdog_in(temp.path());
            watchdog.set_threshold_us(1);

            watchdog.frame_begin("sim_tick");
            thread::sleep(Duration::from_millis(3));
            watchdog.frame_end();

            assert!(!watchdog.was_triggered());
            assert_eq!(watchdog.longest_us(), 0);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn reset_clears_counters_but_keeps_configuration() {
        thread::spawn(|| {
            let temp = tempfile::tempdir().unwrap();
            let mut watchdog = watchdog_in(temp.path());
            watchdog.set_threshold_us(1_000);
            tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();

            watchdog.frame_begin("sim_tick");
            thread::sleep(Duration::from_millis(3));
            watchdog.frame_end();
            clear_current();
            assert!(watchdog.was_triggered());

            watchdog.reset();
            assert!(!watchdog.was_triggered());
            assert_eq!(watchdog.stall_count(), 0);
            assert_eq!(watchdog.longest_us(), 0);
            assert_eq!(watchdog.threshold_us(), 1_000);
        })
        .join()
        .unwrap();
    }
}
