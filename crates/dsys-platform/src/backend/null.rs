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

//! The deterministic null backend.
//!
//! A fully functional backend that performs no real I/O: the clock is
//! synthetic and advances by a fixed quantum per query, windows are plain
//! records, the filesystem is an in-memory path/bytes store, and processes
//! exit immediately with status 0. The dispatcher falls back to this
//! backend whenever the requested one fails to initialize, so the rest of
//! the engine never has to special-case "no backend". Determinism tests
//! also run against it: all of its behavior is bit-for-bit reproducible.

use dsys_core::error::{PlatformError, PlatformResult};
use dsys_core::platform::{
    dir_entry_order, BackendCapabilities, BackendDir, BackendFile, BackendProcess, BackendWindow,
    DirEntry, DirEntryKind, FileMode, NativeHandle, PathRoot, PlatformBackend, ProcessCommand,
    UiModeFlags, WindowDesc, WindowMode, WindowState,
};
use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Microseconds the synthetic clock advances on every query.
const CLOCK_QUANTUM_US: u64 = 100;

type MemFs = Rc<RefCell<HashMap<PathBuf, Vec<u8>>>>;

/// The null backend.
#[derive(Debug, Default)]
pub struct NullBackend {
    clock_us: Cell<u64>,
    fs: MemFs,
}

impl NullBackend {
    /// The backend's canonical name.
    pub const NAME: &'static str = "null";

    /// Creates a null backend with an empty in-memory filesystem and the
    /// clock at its epoch.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlatformBackend for NullBackend {
    fn init(&mut self) -> PlatformResult<()> {
        log::info!("null backend initialized (synthetic clock, in-memory filesystem)");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.fs.borrow_mut().clear();
        log::info!("null backend shut down");
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            name: Self::NAME,
            windows: true,
            mouse: true,
            gamepad: false,
            high_res_timer: true,
            ui_modes: UiModeFlags::HEADLESS,
        }
    }

    fn time_now_us(&self) -> u64 {
        let now = self.clock_us.get() + CLOCK_QUANTUM_US;
        self.clock_us.set(now);
        now
    }

    fn sleep_ms(&self, ms: u32) {
        // No real waiting: time simply passes on the synthetic clock.
        self.clock_us.set(self.clock_us.get() + u64::from(ms) * 1_000);
    }

    fn window_create(&mut self, desc: &WindowDesc) -> PlatformResult<Box<dyn BackendWindow>> {
        Ok(Box::new(NullWindow {
            width: desc.width,
            height: desc.height,
            mode: desc.mode,
            visible: desc.visible,
        }))
    }

    fn resolve_path(&self, root: PathRoot) -> PlatformResult<PathBuf> {
        // Fixed relative paths keep recorded traces reproducible.
        let path = match root {
            PathRoot::App => ".",
            PathRoot::UserData => "./user/data",
            PathRoot::UserConfig => "./user/config",
            PathRoot::UserCache => "./user/cache",
            PathRoot::Temp => "./tmp",
        };
        Ok(PathBuf::from(path))
    }

    fn file_open(&mut self, path: &Path, mode: FileMode) -> PlatformResult<Box<dyn BackendFile>> {
        match mode {
            FileMode::Read => {
                let fs = self.fs.borrow();
                let data = fs
                    .get(path)
                    .cloned()
                    .ok_or_else(|| PlatformError::NotFound(path.display().to_string()))?;
                Ok(Box::new(NullFile::reader(data)))
            }
            FileMode::Write => Ok(Box::new(NullFile::writer(
                path.to_path_buf(),
                self.fs.clone(),
                Vec::new(),
            ))),
            FileMode::Append => {
                let existing = self.fs.borrow().get(path).cloned().unwrap_or_default();
                Ok(Box::new(NullFile::writer(
                    path.to_path_buf(),
                    self.fs.clone(),
                    existing,
                )))
            }
        }
    }

    fn dir_open(&mut self, path: &Path) -> PlatformResult<Box<dyn BackendDir>> {
        let fs = self.fs.borrow();
        let mut entries: Vec<DirEntry> = Vec::new();
        for stored in fs.keys() {
            let Ok(relative) = stored.strip_prefix(path) else {
                continue;
            };
            let mut components = relative.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let kind = if components.next().is_some() {
                DirEntryKind::Directory
            } else {
                DirEntryKind::File
            };
            if !entries.iter().any(|entry| entry.name == name) {
                entries.push(DirEntry { name, kind });
            }
        }
        entries.sort_by(|a, b| dir_entry_order(&a.name, &b.name));
        Ok(Box::new(NullDir { entries, index: 0 }))
    }

    fn process_spawn(
        &mut self,
        command: &ProcessCommand,
    ) -> PlatformResult<Box<dyn BackendProcess>> {
        log::debug!("null backend 'spawning' {} (stub, exits 0)", command.program);
        Ok(Box::new(NullProcess { destroyed: false }))
    }
}

struct NullWindow {
    width: u32,
    height: u32,
    mode: WindowMode,
    visible: bool,
}

impl BackendWindow for NullWindow {
    fn set_mode(&mut self, mode: WindowMode) -> PlatformResult<()> {
        self.mode = mode;
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32) -> PlatformResult<()> {
        if width == 0 || height == 0 {
            return Err(PlatformError::InvalidArgument(
                "window size must be non-zero".to_string(),
            ));
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        // Scale factor is fixed at 1.0, so the framebuffer matches.
        (self.width, self.height)
    }

    fn dpi_scale(&self) -> f32 {
        1.0
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn state(&self) -> WindowState {
        if self.visible {
            WindowState::Normal
        } else {
            WindowState::Hidden
        }
    }

    fn native_handle(&self) -> Option<NativeHandle> {
        None
    }
}

struct NullFile {
    path: PathBuf,
    store: Option<MemFs>,
    data: Vec<u8>,
    cursor: usize,
    writable: bool,
}

impl NullFile {
    fn reader(data: Vec<u8>) -> Self {
        Self {
            path: PathBuf::new(),
            store: None,
            data,
            cursor: 0,
            writable: false,
        }
    }

    fn writer(path: PathBuf, store: MemFs, data: Vec<u8>) -> Self {
        let cursor = data.len();
        Self {
            path,
            store: Some(store),
            data,
            cursor,
            writable: true,
        }
    }
}

impl BackendFile for NullFile {
    fn read(&mut self, buf: &mut [u8]) -> PlatformResult<usize> {
        if self.writable {
            return Err(PlatformError::InvalidArgument(
                "file is open for writing".to_string(),
            ));
        }
        let available = self.data.len().saturating_sub(self.cursor);
        let count = available.min(buf.len());
        buf[..count].copy_from_slice(&self.data[self.cursor..self.cursor + count]);
        self.cursor += count;
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> PlatformResult<usize> {
        if !self.writable {
            return Err(PlatformError::InvalidArgument(
                "file is open for reading".to_string(),
            ));
        }
        if self.cursor > self.data.len() {
            self.data.resize(self.cursor, 0);
        }
        let end = self.cursor + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.cursor..end].copy_from_slice(buf);
        self.cursor = end;
        Ok(buf.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> PlatformResult<u64> {
        let base: i64 = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => self.data.len() as i64 + delta,
            SeekFrom::Current(delta) => self.cursor as i64 + delta,
        };
        if base < 0 {
            return Err(PlatformError::InvalidArgument(
                "seek before start of file".to_string(),
            ));
        }
        self.cursor = base as usize;
        Ok(self.cursor as u64)
    }

    fn tell(&self) -> u64 {
        self.cursor as u64
    }
}

impl Drop for NullFile {
    fn drop(&mut self) {
        // Writers commit their buffer to the in-memory store at close time.
        if let Some(store) = self.store.take() {
            store
                .borrow_mut()
                .insert(std::mem::take(&mut self.path), std::mem::take(&mut self.data));
        }
    }
}

struct NullDir {
    entries: Vec<DirEntry>,
    index: usize,
}

impl BackendDir for NullDir {
    fn next_entry(&mut self) -> Option<DirEntry> {
        let entry = self.entries.get(self.index).cloned();
        if entry.is_some() {
            self.index += 1;
        }
        entry
    }
}

struct NullProcess {
    destroyed: bool,
}

impl BackendProcess for NullProcess {
    fn wait(&mut self) -> PlatformResult<i32> {
        if self.destroyed {
            return Err(PlatformError::InvalidArgument(
                "process already destroyed".to_string(),
            ));
        }
        Ok(0)
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }
}
