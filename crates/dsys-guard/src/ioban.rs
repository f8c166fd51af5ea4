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

//! The blocking-I/O violation detector.
//!
//! Every guarded filesystem operation calls [`IoBanGuard::check`] at entry.
//! On a thread tagged `NO_BLOCK` the call is a violation: counters are
//! bumped, a structured `PERF-IOBAN-001_<seq>.log` report is written, and
//! in fatal mode the process aborts. The wrapping operation then returns
//! its own failure sentinel without performing the real I/O.

use crate::report;
use crate::tag::{self, ThreadTagFlags};
use crate::GuardConfig;
use dsys_core::report::ActStamp;
use std::path::PathBuf;

/// Capacity of each handle-to-path table (files and directories).
pub const HANDLE_TRACK_CAPACITY: usize = 64;

const UNKNOWN_PATH: &str = "<unknown>";

/// The operations the guard polices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedOp {
    /// `file_open`
    FileOpen,
    /// `file_read`
    FileRead,
    /// `file_write`
    FileWrite,
    /// `file_seek`
    FileSeek,
    /// `file_tell`
    FileTell,
    /// `file_close`
    FileClose,
    /// `dir_open`
    DirOpen,
    /// `dir_next`
    DirNext,
    /// `dir_close`
    DirClose,
}

impl GuardedOp {
    /// Number of guarded operation kinds.
    pub const COUNT: usize = 9;

    /// All guarded operations, in report order.
    pub const ALL: [GuardedOp; GuardedOp::COUNT] = [
        GuardedOp::FileOpen,
        GuardedOp::FileRead,
        GuardedOp::FileWrite,
        GuardedOp::FileSeek,
        GuardedOp::FileTell,
        GuardedOp::FileClose,
        GuardedOp::DirOpen,
        GuardedOp::DirNext,
        GuardedOp::DirClose,
    ];

    /// The operation name used in reports.
    pub const fn name(self) -> &'static str {
        match self {
            GuardedOp::FileOpen => "file_open",
            GuardedOp::FileRead => "file_read",
            GuardedOp::FileWrite => "file_write",
            GuardedOp::FileSeek => "file_seek",
            GuardedOp::FileTell => "file_tell",
            GuardedOp::FileClose => "file_close",
            GuardedOp::DirOpen => "dir_open",
            GuardedOp::DirNext => "dir_next",
            GuardedOp::DirClose => "dir_close",
        }
    }

    const fn index(self) -> usize {
        match self {
            GuardedOp::FileOpen => 0,
            GuardedOp::FileRead => 1,
            GuardedOp::FileWrite => 2,
            GuardedOp::FileSeek => 3,
            GuardedOp::FileTell => 4,
            GuardedOp::FileClose => 5,
            GuardedOp::DirOpen => 6,
            GuardedOp::DirNext => 7,
            GuardedOp::DirClose => 8,
        }
    }
}

/// A source location supplied by the guarded call site, for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Source file.
    pub file: &'static str,
    /// Line number.
    pub line: u32,
}

/// Handle-to-path association tables.
///
/// Exists purely to make violation reports human-readable: file and
/// directory handles are registered with their originating path at open
/// time and forgotten at close. Lookups miss silently (`"<unknown>"`) when
/// a handle was never tracked or was already removed.
#[derive(Debug, Default)]
pub struct HandleTrack {
    files: Vec<(u32, String)>,
    dirs: Vec<(u32, String)>,
}

impl HandleTrack {
    fn register(table: &mut Vec<(u32, String)>, id: u32, path: String) -> bool {
        if table.len() >= HANDLE_TRACK_CAPACITY {
            return false;
        }
        table.retain(|(existing, _)| *existing != id);
        table.push((id, path));
        true
    }

    fn lookup(table: &[(u32, String)], id: u32) -> &str {
        table
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, path)| path.as_str())
            .unwrap_or(UNKNOWN_PATH)
    }

    /// Associates a file handle with its path. Rejects when full.
    pub fn register_file(&mut self, id: u32, path: impl Into<String>) -> bool {
        Self::register(&mut self.files, id, path.into())
    }

    /// Associates a directory handle with its path. Rejects when full.
    pub fn register_dir(&mut self, id: u32, path: impl Into<String>) -> bool {
        Self::register(&mut self.dirs, id, path.into())
    }

    /// Drops a file handle's association, if present.
    pub fn forget_file(&mut self, id: u32) {
        self.files.retain(|(existing, _)| *existing != id);
    }

    /// Drops a directory handle's association, if present.
    pub fn forget_dir(&mut self, id: u32) {
        self.dirs.retain(|(existing, _)| *existing != id);
    }

    /// Resolves a file handle to its path, or `"<unknown>"`.
    pub fn file_path(&self, id: u32) -> &str {
        Self::lookup(&self.files, id)
    }

    /// Resolves a directory handle to its path, or `"<unknown>"`.
    pub fn dir_path(&self, id: u32) -> &str {
        Self::lookup(&self.dirs, id)
    }

    /// Drops every association.
    pub fn clear(&mut self) {
        self.files.clear();
        self.dirs.clear();
    }
}

/// The I/O-ban violation detector.
///
/// Owned by the dispatcher; checked at the entry of every guarded
/// filesystem operation. All state is caller-serialized.
#[derive(Debug)]
pub struct IoBanGuard {
    enabled: bool,
    fatal: bool,
    run_root: Option<PathBuf>,
    act: ActStamp,
    total_violations: u64,
    per_op: [u64; GuardedOp::COUNT],
    handles: HandleTrack,
}

impl IoBanGuard {
    /// Creates a guard from shared configuration.
    pub fn new(config: GuardConfig) -> Self {
        Self {
            enabled: config.enabled,
            fatal: config.fatal,
            run_root: config.run_root,
            act: ActStamp::default(),
            total_violations: 0,
            per_op: [0; GuardedOp::COUNT],
            handles: HandleTrack::default(),
        }
    }

    /// Enables or disables the guard globally.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns whether the guard is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the ACT context attached to subsequent reports. Supplied by the
    /// caller out-of-band; the guard never derives simulation time itself.
    pub fn set_act(&mut self, act: ActStamp) {
        self.act = act;
    }

    /// Returns the handle-to-path tables for report annotation.
    pub fn handles(&self) -> &HandleTrack {
        &self.handles
    }

    /// Mutable access to the handle-to-path tables.
    pub fn handles_mut(&mut self) -> &mut HandleTrack {
        &mut self.handles
    }

    /// Total violations detected since construction or [`reset`].
    ///
    /// [`reset`]: IoBanGuard::reset
    pub fn violation_count(&self) -> u64 {
        self.total_violations
    }

    /// Violations detected for one operation kind.
    pub fn op_violation_count(&self, op: GuardedOp) -> u64 {
        self.per_op[op.index()]
    }

    /// Clears violation counters. Configuration and handle tracking are
    /// untouched.
    pub fn reset(&mut self) {
        self.total_violations = 0;
        self.per_op = [0; GuardedOp::COUNT];
    }

    /// The violation check, invoked at the entry of every guarded call.
    ///
    /// Returns `true` when the operation must be blocked: the calling
    /// thread is tagged `NO_BLOCK` and the guard is enabled. In that case
    /// counters have been bumped and a report written; in fatal mode this
    /// call does not return.
    pub fn check(&mut self, op: GuardedOp, path: &str, site: Option<CallSite>) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(tag) = tag::current_tag() else {
            return false;
        };
        if !tag.flags.contains(ThreadTagFlags::NO_BLOCK) {
            return false;
        }

        self.total_violations += 1;
        self.per_op[op.index()] += 1;
        log::error!(
            "blocking {} of '{path}' on no-block thread '{}' (violation #{})",
            op.name(),
            tag.name,
            self.total_violations
        );
        self.write_report(op, path, site);

        if self.fatal {
            log::error!("fatal guard mode set; aborting after violation report");
            std::process::abort();
        }
        true
    }

    fn write_report(&self, op: GuardedOp, path: &str, site: Option<CallSite>) {
        let seq = report::next_ioban_seq();
        let mut lines = report::common_header(
            "PERF-IOBAN-001",
            "blocking I/O performed on a thread tagged no-block",
            self.act,
        );
        lines.push(("operation".to_string(), op.name().to_string()));
        lines.push(("path".to_string(), path.to_string()));
        let call_site = match site {
            Some(site) => format!("{}:{}", site.file, site.line),
            None => UNKNOWN_PATH.to_string(),
        };
        lines.push(("call_site".to_string(), call_site));
        lines.push((
            "violations_total".to_string(),
            self.total_violations.to_string(),
        ));
        for kind in GuardedOp::ALL {
            lines.push((
                format!("violations_{}", kind.name()),
                self.per_op[kind.index()].to_string(),
            ));
        }
        report::write_guard_report(
            self.run_root.as_deref(),
            &format!("PERF-IOBAN-001_{seq}.log"),
            &lines,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{clear_current, tag_current};
    use std::fs;

    fn guard_in(dir: &std::path::Path) -> IoBanGuard {
        IoBanGuard::new(GuardConfig {
            enabled: true,
            fatal: false,
            run_root: Some(dir.to_path_buf()),
        })
    }

    fn report_files(root: &std::path::Path) -> Vec<String> {
        let dir = root.join("perf/no_modal_loading");
        match fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn untagged_thread_passes() {
        std::thread::spawn(|| {
            let temp = tempfile::tempdir().unwrap();
            let mut guard = guard_in(temp.path());
            assert!(!guard.check(GuardedOp::FileOpen, "save.bin", None));
            assert_eq!(guard.violation_count(), 0);
            assert!(report_files(temp.path()).is_empty());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn disabled_guard_ignores_no_block_threads() {
        std::thread::spawn(|| {
            let temp = tempfile::tempdir().unwrap();
            let mut guard = guard_in(temp.path());
            guard.set_enabled(false);
            tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();
            assert!(!guard.check(GuardedOp::FileRead, "save.bin", None));
            assert_eq!(guard.violation_count(), 0);
            clear_current();
        })
        .join()
        .unwrap();
    }

    #[test]
    fn violation_blocks_counts_and_reports() {
        std::thread::spawn(|| {
            let temp = tempfile::tempdir().unwrap();
            let mut guard = guard_in(temp.path());
            guard.set_act(dsys_core::report::ActStamp::new(12.5, 42));
            tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();

            let blocked = guard.check(
                GuardedOp::FileOpen,
                "data/save.bin",
                Some(CallSite {
                    file: "loader.rs",
                    line: 88,
                }),
            );
            clear_current();

            assert!(blocked);
            assert_eq!(guard.violation_count(), 1);
            assert_eq!(guard.op_violation_count(GuardedOp::FileOpen), 1);
            assert_eq!(guard.op_violation_count(GuardedOp::FileRead), 0);

            let files = report_files(temp.path());
            assert_eq!(files.len(), 1);
            assert!(files[0].starts_with("PERF-IOBAN-001_"));

            let body =
                fs::read_to_string(temp.path().join("perf/no_modal_loading").join(&files[0]))
                    .unwrap();
            assert!(body.contains("check: PERF-IOBAN-001\n"));
            assert!(body.contains("sim_tick: 42\n"));
            assert!(body.contains("thread_name: render\n"));
            assert!(body.contains("operation: file_open\n"));
            assert!(body.contains("path: data/save.bin\n"));
            assert!(body.contains("call_site: loader.rs:88\n"));
            assert!(body.contains("violations_total: 1\n"));
            assert!(body.contains("violations_file_open: 1\n"));
            assert!(body.contains("violations_dir_next: 0\n"));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn cleared_tag_stops_violations() {
        std::thread::spawn(|| {
            let temp = tempfile::tempdir().unwrap();
            let mut guard = guard_in(temp.path());
            tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();
            assert!(guard.check(GuardedOp::DirOpen, "assets", None));
            clear_current();
            assert!(!guard.check(GuardedOp::DirOpen, "assets", None));
            assert_eq!(guard.violation_count(), 1);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn handle_track_round_trip_and_silent_miss() {
        let mut track = HandleTrack::default();
        assert!(track.register_file(3, "data/level.pak"));
        assert_eq!(track.file_path(3), "data/level.pak");
        assert_eq!(track.file_path(99), "<unknown>");

        track.forget_file(3);
        assert_eq!(track.file_path(3), "<unknown>");

        assert!(track.register_dir(1, "assets"));
        assert_eq!(track.dir_path(1), "assets");
        track.clear();
        assert_eq!(track.dir_path(1), "<unknown>");
    }

    #[test]
    fn handle_track_rejects_past_capacity() {
        let mut track = HandleTrack::default();
        for id in 0..HANDLE_TRACK_CAPACITY as u32 {
            assert!(track.register_file(id, format!("file_{id}")));
        }
        assert!(!track.register_file(999, "one_too_many"));
        // Directory table is independent.
        assert!(track.register_dir(0, "still_room"));
    }
}
