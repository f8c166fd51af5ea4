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

//! The contract every platform backend must satisfy.
//!
//! This module defines a common, engine-wide interface for interacting with
//! the underlying operating system: windowing, input delivery, time,
//! filesystem, directory enumeration, and process spawning. Concrete
//! backends live in the platform crate; this crate holds only the traits
//! and the plain data types they exchange.

pub mod backend;
pub mod file;
pub mod process;
pub mod window;

pub use backend::{BackendCapabilities, PlatformBackend, UiModeFlags};
pub use file::{dir_entry_order, BackendDir, BackendFile, DirEntry, DirEntryKind, FileMode};
pub use process::{BackendProcess, ProcessCommand};
pub use window::{BackendWindow, NativeHandle, WindowDesc, WindowMode, WindowState};

/// The logical filesystem roots a backend must be able to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathRoot {
    /// The application install/bundle root.
    App,
    /// Per-user persistent data.
    UserData,
    /// Per-user configuration.
    UserConfig,
    /// Per-user cache, safe to delete.
    UserCache,
    /// Scratch space, may vanish between runs.
    Temp,
}

impl PathRoot {
    /// All logical roots, in a stable order.
    pub const ALL: [PathRoot; 5] = [
        PathRoot::App,
        PathRoot::UserData,
        PathRoot::UserConfig,
        PathRoot::UserCache,
        PathRoot::Temp,
    ];
}
