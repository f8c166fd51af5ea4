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

//! The backend dispatcher.
//!
//! [`Platform`] is an application-owned context object holding the single
//! active backend, the event queue, the window registry, and the
//! dispatcher-issued handle tables. Every public platform operation routes
//! through it; failures come back as `Err` and are mirrored into a
//! last-error code/text pair, and nothing here ever panics on an ordinary
//! failure.
//!
//! There is no internal locking: one thread drives the dispatcher at a
//! time, by the documented caller-serialized contract.

pub mod registry;
pub mod windows;

pub use windows::{WindowId, WindowRegistry};

use dsys_core::error::{LastError, PlatformError, PlatformResult};
use dsys_core::event::{Event, EventQueue};
use dsys_core::platform::{
    BackendCapabilities, BackendDir, BackendFile, BackendProcess, DirEntry, FileMode,
    NativeHandle, PathRoot, PlatformBackend, ProcessCommand, WindowDesc, WindowMode, WindowState,
};
use dsys_guard::{CallSite, GuardConfig, GuardedOp, IoBanGuard, HANDLE_TRACK_CAPACITY};
use std::path::{Path, PathBuf};

/// A dispatcher-issued open-file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

/// A dispatcher-issued open-directory handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirId(pub u32);

/// A dispatcher-issued child-process handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

/// Startup configuration for the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct PlatformConfig {
    /// Requested backend name; `None` takes the compiled-in backend. An
    /// unknown name degrades to the null backend with a logged warning.
    pub backend: Option<String>,
    /// Configuration shared with the I/O-ban guard.
    pub guard: GuardConfig,
}

struct HandleTable<T> {
    entries: Vec<(u32, T)>,
    next_id: u32,
    capacity: usize,
    kind: &'static str,
}

impl<T> HandleTable<T> {
    fn new(capacity: usize, kind: &'static str) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            capacity,
            kind,
        }
    }

    fn insert(&mut self, value: T) -> PlatformResult<u32> {
        if self.entries.len() >= self.capacity {
            return Err(PlatformError::Exhausted(self.kind));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, value));
        Ok(id)
    }

    fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(existing, _)| *existing == id)
            .map(|(_, value)| value)
    }

    fn remove(&mut self, id: u32) -> Option<T> {
        let index = self
            .entries
            .iter()
            .position(|(existing, _)| *existing == id)?;
        Some(self.entries.remove(index).1)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The backend dispatcher and platform service context.
pub struct Platform {
    backend: Box<dyn PlatformBackend>,
    caps: BackendCapabilities,
    active: bool,
    events: EventQueue,
    windows: WindowRegistry,
    files: HandleTable<Box<dyn BackendFile>>,
    dirs: HandleTable<Box<dyn BackendDir>>,
    processes: HandleTable<Box<dyn BackendProcess>>,
    io_guard: IoBanGuard,
    last_error: LastError,
}

impl Platform {
    /// Initializes the platform layer. Never fails: if the requested or
    /// compiled backend cannot be brought up, the deterministic null
    /// backend is substituted silently, so downstream code never observes
    /// "no backend".
    pub fn init(config: PlatformConfig) -> Self {
        let mut backend = match config.backend.as_deref() {
            Some(name) => match registry::select(name) {
                Ok(backend) => backend,
                Err(error) => {
                    log::warn!("backend selection failed ({error}); falling back to null");
                    registry::create_null()
                }
            },
            None => registry::create_compiled(),
        };

        if let Err(error) = backend.init() {
            log::warn!(
                "backend '{}' failed to initialize ({error}); falling back to null",
                backend.capabilities().name
            );
            backend = registry::create_null();
            if backend.init().is_err() {
                log::error!("null backend failed to initialize; continuing uninitialized");
            }
        }

        let caps = backend.capabilities();
        log::info!("platform initialized with backend '{}'", caps.name);
        Self {
            backend,
            caps,
            active: true,
            events: EventQueue::new(),
            windows: WindowRegistry::new(),
            files: HandleTable::new(HANDLE_TRACK_CAPACITY, "file handles"),
            dirs: HandleTable::new(HANDLE_TRACK_CAPACITY, "directory handles"),
            processes: HandleTable::new(HANDLE_TRACK_CAPACITY, "process handles"),
            io_guard: IoBanGuard::new(config.guard),
            last_error: LastError::default(),
        }
    }

    /// Shuts the platform down: the backend is stopped and the window
    /// registry, event queue, and handle tables are cleared. Subsequent
    /// operations answer `Unsupported`.
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.backend.shutdown();
        self.windows.clear();
        self.events.clear();
        self.files.clear();
        self.dirs.clear();
        self.processes.clear();
        self.io_guard.handles_mut().clear();
        self.active = false;
        log::info!("platform shut down");
    }

    fn failure<T>(&mut self, error: PlatformError) -> PlatformResult<T> {
        self.last_error.record(&error);
        Err(error)
    }

    fn note<T>(&mut self, result: PlatformResult<T>) -> PlatformResult<T> {
        if let Err(ref error) = result {
            self.last_error.record(error);
        }
        result
    }

    /// The active backend's capability descriptor.
    pub fn capabilities(&self) -> BackendCapabilities {
        self.caps
    }

    /// The active backend's name.
    pub fn backend_name(&self) -> &'static str {
        self.caps.name
    }

    /// The most recent failure, for diagnostics.
    pub fn last_error(&self) -> &LastError {
        &self.last_error
    }

    /// The I/O-ban guard, for configuration and counter queries.
    pub fn io_guard(&self) -> &IoBanGuard {
        &self.io_guard
    }

    /// Mutable access to the I/O-ban guard.
    pub fn io_guard_mut(&mut self) -> &mut IoBanGuard {
        &mut self.io_guard
    }

    // --- Time ---

    /// The active backend's monotonic clock, microseconds. Returns 0 after
    /// shutdown.
    pub fn time_now_us(&self) -> u64 {
        if !self.active {
            return 0;
        }
        self.backend.time_now_us()
    }

    /// Sleeps the calling thread. No-op after shutdown.
    pub fn sleep_ms(&self, ms: u32) {
        if self.active {
            self.backend.sleep_ms(ms);
        }
    }

    // --- Events ---

    /// Pushes an event into the queue, stamping unset metadata.
    ///
    /// A zero timestamp is filled from the active backend's clock; a zero
    /// window id on a window-scoped event is filled from the registry's
    /// primary window. Fails (returns `false`) when the queue is full;
    /// events are never silently overwritten.
    pub fn push_event(&mut self, mut event: Event) -> bool {
        if !self.active {
            return false;
        }
        if event.timestamp_us == 0 {
            event.timestamp_us = self.backend.time_now_us();
        }
        if event.window_id == 0 && event.is_window_scoped() {
            if let Some(WindowId(id)) = self.windows.primary_id() {
                event.window_id = id;
            }
        }
        self.events.push(event)
    }

    /// Pumps the backend into the queue, then pops the oldest event.
    ///
    /// The backend is only pumped while the queue has room, so no backend
    /// event is ever dropped by the pump itself.
    pub fn poll_event(&mut self) -> Option<Event> {
        if !self.active {
            return None;
        }
        while !self.events.is_full() {
            let Some(event) = self.backend.poll_event() else {
                break;
            };
            self.push_event(event);
        }
        self.events.pop()
    }

    /// Number of events currently queued.
    pub fn event_queue_depth(&self) -> usize {
        self.events.len()
    }

    // --- Windows ---

    /// Creates a window and registers it under a fresh id.
    pub fn window_create(&mut self, desc: &WindowDesc) -> PlatformResult<WindowId> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let window = match self.backend.window_create(desc) {
            Ok(window) => window,
            Err(error) => return self.failure(error),
        };
        Ok(self.windows.insert(window))
    }

    /// Destroys a window.
    pub fn window_destroy(&mut self, id: WindowId) -> PlatformResult<()> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        if self.windows.remove(id) {
            Ok(())
        } else {
            self.failure(PlatformError::NotFound(format!("window {}", id.0)))
        }
    }

    /// Changes a window's presentation mode.
    pub fn window_set_mode(&mut self, id: WindowId, mode: WindowMode) -> PlatformResult<()> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get_mut(id) {
            Some(window) => {
                let result = window.set_mode(mode);
                self.note(result)
            }
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// Resizes a window's inner area.
    pub fn window_set_size(&mut self, id: WindowId, width: u32, height: u32) -> PlatformResult<()> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get_mut(id) {
            Some(window) => {
                let result = window.set_size(width, height);
                self.note(result)
            }
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// A window's inner size in physical pixels.
    pub fn window_size(&mut self, id: WindowId) -> PlatformResult<(u32, u32)> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get(id) {
            Some(window) => Ok(window.size()),
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// A window's framebuffer size in pixels.
    pub fn window_framebuffer_size(&mut self, id: WindowId) -> PlatformResult<(u32, u32)> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get(id) {
            Some(window) => Ok(window.framebuffer_size()),
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// A window's DPI scale factor.
    pub fn window_dpi_scale(&mut self, id: WindowId) -> PlatformResult<f32> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get(id) {
            Some(window) => Ok(window.dpi_scale()),
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// Makes a window visible.
    pub fn window_show(&mut self, id: WindowId) -> PlatformResult<()> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get_mut(id) {
            Some(window) => {
                window.show();
                Ok(())
            }
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// Hides a window.
    pub fn window_hide(&mut self, id: WindowId) -> PlatformResult<()> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get_mut(id) {
            Some(window) => {
                window.hide();
                Ok(())
            }
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// A window's observable state.
    pub fn window_state(&mut self, id: WindowId) -> PlatformResult<WindowState> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get(id) {
            Some(window) => Ok(window.state()),
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// A window's native handle, if the backend exposes one.
    pub fn window_native_handle(&mut self, id: WindowId) -> PlatformResult<Option<NativeHandle>> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.windows.get(id) {
            Some(window) => Ok(window.native_handle()),
            None => self.failure(PlatformError::NotFound(format!("window {}", id.0))),
        }
    }

    /// Number of live windows.
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    // --- Paths ---

    /// Resolves a logical path root through the active backend.
    pub fn resolve_path(&mut self, root: PathRoot) -> PlatformResult<PathBuf> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let result = self.backend.resolve_path(root);
        self.note(result)
    }

    // --- Files (guarded) ---

    /// Opens a file. Guarded: on a no-block thread this is a violation and
    /// the backend is never touched.
    pub fn file_open(
        &mut self,
        path: &Path,
        mode: FileMode,
        site: Option<CallSite>,
    ) -> PlatformResult<FileId> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path_text = path.display().to_string();
        if self.io_guard.check(GuardedOp::FileOpen, &path_text, site) {
            return self.failure(PlatformError::Blocked);
        }
        let file = match self.backend.file_open(path, mode) {
            Ok(file) => file,
            Err(error) => return self.failure(error),
        };
        let id = match self.files.insert(file) {
            Ok(id) => id,
            Err(error) => return self.failure(error),
        };
        if !self.io_guard.handles_mut().register_file(id, path_text) {
            log::debug!("handle track full; file {id} will report as <unknown>");
        }
        Ok(FileId(id))
    }

    /// Reads from an open file. Guarded.
    pub fn file_read(&mut self, id: FileId, buf: &mut [u8]) -> PlatformResult<usize> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path = self.io_guard.handles().file_path(id.0).to_string();
        if self.io_guard.check(GuardedOp::FileRead, &path, None) {
            return self.failure(PlatformError::Blocked);
        }
        match self.files.get_mut(id.0) {
            Some(file) => {
                let result = file.read(buf);
                self.note(result)
            }
            None => self.failure(PlatformError::NotFound(format!("file handle {}", id.0))),
        }
    }

    /// Writes to an open file. Guarded.
    pub fn file_write(&mut self, id: FileId, buf: &[u8]) -> PlatformResult<usize> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path = self.io_guard.handles().file_path(id.0).to_string();
        if self.io_guard.check(GuardedOp::FileWrite, &path, None) {
            return self.failure(PlatformError::Blocked);
        }
        match self.files.get_mut(id.0) {
            Some(file) => {
                let result = file.write(buf);
                self.note(result)
            }
            None => self.failure(PlatformError::NotFound(format!("file handle {}", id.0))),
        }
    }

    /// Repositions an open file's cursor. Guarded.
    pub fn file_seek(&mut self, id: FileId, pos: std::io::SeekFrom) -> PlatformResult<u64> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path = self.io_guard.handles().file_path(id.0).to_string();
        if self.io_guard.check(GuardedOp::FileSeek, &path, None) {
            return self.failure(PlatformError::Blocked);
        }
        match self.files.get_mut(id.0) {
            Some(file) => {
                let result = file.seek(pos);
                self.note(result)
            }
            None => self.failure(PlatformError::NotFound(format!("file handle {}", id.0))),
        }
    }

    /// Reports an open file's cursor. Guarded.
    pub fn file_tell(&mut self, id: FileId) -> PlatformResult<u64> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path = self.io_guard.handles().file_path(id.0).to_string();
        if self.io_guard.check(GuardedOp::FileTell, &path, None) {
            return self.failure(PlatformError::Blocked);
        }
        match self.files.get_mut(id.0) {
            Some(file) => Ok(file.tell()),
            None => self.failure(PlatformError::NotFound(format!("file handle {}", id.0))),
        }
    }

    /// Closes an open file. Guarded.
    pub fn file_close(&mut self, id: FileId) -> PlatformResult<()> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path = self.io_guard.handles().file_path(id.0).to_string();
        if self.io_guard.check(GuardedOp::FileClose, &path, None) {
            return self.failure(PlatformError::Blocked);
        }
        match self.files.remove(id.0) {
            Some(file) => {
                drop(file);
                self.io_guard.handles_mut().forget_file(id.0);
                Ok(())
            }
            None => self.failure(PlatformError::NotFound(format!("file handle {}", id.0))),
        }
    }

    // --- Directories (guarded) ---

    /// Opens a directory for enumeration. Guarded.
    pub fn dir_open(&mut self, path: &Path, site: Option<CallSite>) -> PlatformResult<DirId> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path_text = path.display().to_string();
        if self.io_guard.check(GuardedOp::DirOpen, &path_text, site) {
            return self.failure(PlatformError::Blocked);
        }
        let dir = match self.backend.dir_open(path) {
            Ok(dir) => dir,
            Err(error) => return self.failure(error),
        };
        let id = match self.dirs.insert(dir) {
            Ok(id) => id,
            Err(error) => return self.failure(error),
        };
        if !self.io_guard.handles_mut().register_dir(id, path_text) {
            log::debug!("handle track full; directory {id} will report as <unknown>");
        }
        Ok(DirId(id))
    }

    /// Yields the next directory entry, `Ok(None)` when exhausted. Guarded.
    pub fn dir_next(&mut self, id: DirId) -> PlatformResult<Option<DirEntry>> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path = self.io_guard.handles().dir_path(id.0).to_string();
        if self.io_guard.check(GuardedOp::DirNext, &path, None) {
            return self.failure(PlatformError::Blocked);
        }
        match self.dirs.get_mut(id.0) {
            Some(dir) => Ok(dir.next_entry()),
            None => self.failure(PlatformError::NotFound(format!("directory handle {}", id.0))),
        }
    }

    /// Closes a directory enumeration. Guarded.
    pub fn dir_close(&mut self, id: DirId) -> PlatformResult<()> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let path = self.io_guard.handles().dir_path(id.0).to_string();
        if self.io_guard.check(GuardedOp::DirClose, &path, None) {
            return self.failure(PlatformError::Blocked);
        }
        match self.dirs.remove(id.0) {
            Some(dir) => {
                drop(dir);
                self.io_guard.handles_mut().forget_dir(id.0);
                Ok(())
            }
            None => self.failure(PlatformError::NotFound(format!("directory handle {}", id.0))),
        }
    }

    // --- Processes ---

    /// Spawns a child process through the active backend.
    pub fn process_spawn(&mut self, command: &ProcessCommand) -> PlatformResult<ProcessId> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        let child = match self.backend.process_spawn(command) {
            Ok(child) => child,
            Err(error) => return self.failure(error),
        };
        let id = match self.processes.insert(child) {
            Ok(id) => id,
            Err(error) => return self.failure(error),
        };
        Ok(ProcessId(id))
    }

    /// Waits for a child process to exit and returns its exit code.
    pub fn process_wait(&mut self, id: ProcessId) -> PlatformResult<i32> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.processes.get_mut(id.0) {
            Some(child) => {
                let result = child.wait();
                self.note(result)
            }
            None => self.failure(PlatformError::NotFound(format!("process handle {}", id.0))),
        }
    }

    /// Terminates a child process and releases its handle.
    pub fn process_destroy(&mut self, id: ProcessId) -> PlatformResult<()> {
        if !self.active {
            return self.failure(PlatformError::Unsupported);
        }
        match self.processes.remove(id.0) {
            Some(mut child) => {
                child.destroy();
                Ok(())
            }
            None => self.failure(PlatformError::NotFound(format!("process handle {}", id.0))),
        }
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.shutdown();
    }
}
