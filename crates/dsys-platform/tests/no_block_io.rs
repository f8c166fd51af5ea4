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

//! The I/O ban, end to end through the dispatcher.

use dsys_core::error::PlatformError;
use dsys_core::platform::FileMode;
use dsys_guard::{tag, GuardConfig, GuardedOp, ThreadTagFlags};
use dsys_platform::{Platform, PlatformConfig};
use std::fs;
use std::path::Path;

fn ioban_reports(root: &Path) -> Vec<String> {
    let dir = root.join("perf/no_modal_loading");
    match fs::read_dir(&dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("PERF-IOBAN-001_"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn no_block_thread_is_denied_file_io() {
    // Tag state is thread-local; keep the whole scenario on one thread.
    std::thread::spawn(|| {
        let temp = tempfile::tempdir().unwrap();
        let mut platform = Platform::init(PlatformConfig {
            backend: None,
            guard: GuardConfig {
                enabled: true,
                fatal: false,
                run_root: Some(temp.path().to_path_buf()),
            },
        });

        // Stage a file while the thread is still allowed to block.
        let save = Path::new("data/save.bin");
        let file = platform.file_open(save, FileMode::Write, None).unwrap();
        platform.file_write(file, b"state").unwrap();
        platform.file_close(file).unwrap();
        assert!(ioban_reports(temp.path()).is_empty());

        // The same call on a no-block thread is a violation: null handle,
        // exactly one counter bump, exactly one report file, no real I/O.
        tag::tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();
        let denied = platform.file_open(save, FileMode::Read, None);
        assert!(matches!(denied, Err(PlatformError::Blocked)));
        assert_eq!(platform.io_guard().violation_count(), 1);
        assert_eq!(
            platform.io_guard().op_violation_count(GuardedOp::FileOpen),
            1
        );
        assert_eq!(ioban_reports(temp.path()).len(), 1);

        // Untagged again, the identical call succeeds and touches no
        // violation state.
        tag::clear_current();
        let file = platform.file_open(save, FileMode::Read, None).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(platform.file_read(file, &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"state");
        platform.file_close(file).unwrap();
        assert_eq!(platform.io_guard().violation_count(), 1);
        assert_eq!(ioban_reports(temp.path()).len(), 1);
    })
    .join()
    .unwrap();
}

#[test]
fn reports_name_the_path_from_handle_tracking() {
    std::thread::spawn(|| {
        let temp = tempfile::tempdir().unwrap();
        let mut platform = Platform::init(PlatformConfig {
            backend: None,
            guard: GuardConfig {
                enabled: true,
                fatal: false,
                run_root: Some(temp.path().to_path_buf()),
            },
        });

        // Open while blocking is allowed, then violate on a later read:
        // the report must carry the path resolved from the handle table.
        let pak = Path::new("assets/world.pak");
        let staged = platform.file_open(pak, FileMode::Write, None).unwrap();
        platform.file_write(staged, b"pak").unwrap();
        platform.file_close(staged).unwrap();
        let file = platform.file_open(pak, FileMode::Read, None).unwrap();

        tag::tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();
        let mut buf = [0u8; 4];
        assert!(platform.file_read(file, &mut buf).is_err());
        tag::clear_current();

        let reports = ioban_reports(temp.path());
        assert_eq!(reports.len(), 1);
        let body =
            fs::read_to_string(temp.path().join("perf/no_modal_loading").join(&reports[0]))
                .unwrap();
        assert!(body.contains("operation: file_read\n"));
        assert!(body.contains("path: assets/world.pak\n"));
        assert!(body.contains("thread_name: render\n"));
    })
    .join()
    .unwrap();
}

#[test]
fn directory_enumeration_is_guarded_too() {
    std::thread::spawn(|| {
        let temp = tempfile::tempdir().unwrap();
        let mut platform = Platform::init(PlatformConfig {
            backend: None,
            guard: GuardConfig {
                enabled: true,
                fatal: false,
                run_root: Some(temp.path().to_path_buf()),
            },
        });

        let file = platform
            .file_open(Path::new("assets/a.pak"), FileMode::Write, None)
            .unwrap();
        platform.file_write(file, b"x").unwrap();
        platform.file_close(file).unwrap();

        tag::tag_current(ThreadTagFlags::NO_BLOCK, "render").unwrap();
        assert!(matches!(
            platform.dir_open(Path::new("assets"), None),
            Err(PlatformError::Blocked)
        ));
        tag::clear_current();

        assert_eq!(
            platform.io_guard().op_violation_count(GuardedOp::DirOpen),
            1
        );

        let dir = platform.dir_open(Path::new("assets"), None).unwrap();
        assert_eq!(platform.dir_next(dir).unwrap().unwrap().name, "a.pak");
        platform.dir_close(dir).unwrap();
    })
    .join()
    .unwrap();
}
