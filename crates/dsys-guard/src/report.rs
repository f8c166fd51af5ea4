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

//! Shared writer for guard violation reports.
//!
//! Both report families (`PERF-IOBAN-001`, `PERF-STALL-001`) are
//! line-oriented `key: value` text under `<run_root>/perf/no_modal_loading/`
//! and share the same metadata header. Sequence numbers are monotonic for
//! the process lifetime, so repeated violations never collide on disk.

use crate::tag;
use dsys_core::report::{resolve_run_root, write_kv_report, ActStamp};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

/// Directory for guard reports, relative to the run root.
pub(crate) const REPORT_DIR: &str = "perf/no_modal_loading";

static IOBAN_SEQ: AtomicU32 = AtomicU32::new(0);
static STALL_SEQ: AtomicU32 = AtomicU32::new(0);

pub(crate) fn next_ioban_seq() -> u32 {
    IOBAN_SEQ.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn next_stall_seq() -> u32 {
    STALL_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Builds the metadata header shared by every guard report: check id,
/// description, ACT context, and the calling thread's identity.
pub(crate) fn common_header(
    check_id: &str,
    description: &str,
    act: ActStamp,
) -> Vec<(String, String)> {
    let (thread_name, thread_flags) = match tag::current_tag() {
        Some(tag) => (tag.name, tag.flags.bits()),
        None => ("<untagged>".to_string(), 0),
    };
    vec![
        ("check".to_string(), check_id.to_string()),
        ("description".to_string(), description.to_string()),
        ("act_time".to_string(), format!("{:.6}", act.act_time)),
        ("sim_tick".to_string(), act.sim_tick.to_string()),
        (
            "thread_id".to_string(),
            tag::thread_ordinal().to_string(),
        ),
        ("thread_name".to_string(), thread_name),
        ("thread_flags".to_string(), format!("{thread_flags:#x}")),
    ]
}

/// Writes one guard report file, durably, and returns its path.
///
/// Failures are logged and swallowed; a broken disk must not turn an
/// observation into a crash (fatal mode aborts separately, and only after
/// a successful write).
pub(crate) fn write_guard_report(
    run_root: Option<&Path>,
    file_name: &str,
    lines: &[(String, String)],
) -> Option<PathBuf> {
    let path = resolve_run_root(run_root).join(REPORT_DIR).join(file_name);
    match write_kv_report(&path, lines) {
        Ok(()) => Some(path),
        Err(error) => {
            log::error!("failed to write guard report {}: {error}", path.display());
            None
        }
    }
}
