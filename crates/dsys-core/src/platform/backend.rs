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

//! The backend trait and its capability descriptor.

use super::file::{BackendDir, BackendFile, FileMode};
use super::process::{BackendProcess, ProcessCommand};
use super::window::{BackendWindow, WindowDesc};
use super::PathRoot;
use crate::error::{PlatformError, PlatformResult};
use crate::event::Event;
use std::path::{Path, PathBuf};

/// Flags for the UI presentation modes a backend can drive.
///
/// Multiple modes can be combined using the flag operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UiModeFlags {
    bits: u32,
}

impl UiModeFlags {
    /// No UI modes.
    pub const NONE: Self = Self { bits: 0 };
    /// Conventional windowed GUI.
    pub const GUI: Self = Self { bits: 1 << 0 };
    /// Text-mode terminal UI.
    pub const TUI: Self = Self { bits: 1 << 1 };
    /// No presentation at all (servers, CI).
    pub const HEADLESS: Self = Self { bits: 1 << 2 };
    /// All modes.
    pub const ALL: Self = Self {
        bits: Self::GUI.bits | Self::TUI.bits | Self::HEADLESS.bits,
    };

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every bit of `other` is present.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks whether no mode is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

/// Static description of what a backend can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// The backend's canonical name, matched case-insensitively at
    /// selection time.
    pub name: &'static str,
    /// Whether the backend can create windows.
    pub windows: bool,
    /// Whether the backend delivers mouse input.
    pub mouse: bool,
    /// Whether the backend delivers gamepad input.
    pub gamepad: bool,
    /// Whether the backend clock has sub-millisecond resolution.
    pub high_res_timer: bool,
    /// The UI presentation modes the backend supports.
    pub ui_modes: UiModeFlags,
}

/// The uniform contract every platform backend implements.
///
/// Operations a backend cannot provide keep the default implementation,
/// which answers [`PlatformError::Unsupported`]; the dispatcher forwards
/// that as a sentinel failure and never treats it as fatal.
///
/// Backends are driven by a single thread at a time; the contract contains
/// no locks, and serialization is the caller's responsibility.
pub trait PlatformBackend {
    /// Brings the backend up. Called exactly once before any other call.
    fn init(&mut self) -> PlatformResult<()>;

    /// Tears the backend down. No other call follows.
    fn shutdown(&mut self);

    /// Returns the backend's static capability descriptor.
    fn capabilities(&self) -> BackendCapabilities;

    /// Returns the backend's monotonic clock, in microseconds.
    fn time_now_us(&self) -> u64;

    /// Sleeps the calling thread for at least `ms` milliseconds.
    fn sleep_ms(&self, ms: u32);

    /// Creates a window. Default: unsupported.
    fn window_create(&mut self, desc: &WindowDesc) -> PlatformResult<Box<dyn BackendWindow>> {
        let _ = desc;
        Err(PlatformError::Unsupported)
    }

    /// Pumps the OS once and returns the next raw engine event, if any.
    fn poll_event(&mut self) -> Option<Event> {
        None
    }

    /// Resolves a logical path root. Default: unsupported.
    fn resolve_path(&self, root: PathRoot) -> PlatformResult<PathBuf> {
        let _ = root;
        Err(PlatformError::Unsupported)
    }

    /// Opens a file. Default: unsupported.
    fn file_open(&mut self, path: &Path, mode: FileMode) -> PlatformResult<Box<dyn BackendFile>> {
        let _ = (path, mode);
        Err(PlatformError::Unsupported)
    }

    /// Opens a directory for enumeration. Default: unsupported.
    ///
    /// Implementations must yield entries in the stable, platform-
    /// independent order defined by [`super::dir_entry_order`].
    fn dir_open(&mut self, path: &Path) -> PlatformResult<Box<dyn BackendDir>> {
        let _ = path;
        Err(PlatformError::Unsupported)
    }

    /// Spawns a child process. Default: unsupported.
    fn process_spawn(
        &mut self,
        command: &ProcessCommand,
    ) -> PlatformResult<Box<dyn BackendProcess>> {
        let _ = command;
        Err(PlatformError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_mode_flags_combine() {
        let modes = UiModeFlags::GUI.union(UiModeFlags::HEADLESS);
        assert!(modes.contains(UiModeFlags::GUI));
        assert!(modes.contains(UiModeFlags::HEADLESS));
        assert!(!modes.contains(UiModeFlags::TUI));
        assert!(!modes.is_empty());
        assert!(UiModeFlags::NONE.is_empty());
        assert!(UiModeFlags::ALL.contains(UiModeFlags::TUI));
    }

    #[test]
    fn default_trait_methods_answer_unsupported() {
        struct Bare;
        impl PlatformBackend for Bare {
            fn init(&mut self) -> PlatformResult<()> {
                Ok(())
            }
            fn shutdown(&mut self) {}
            fn capabilities(&self) -> BackendCapabilities {
                BackendCapabilities {
                    name: "bare",
                    windows: false,
                    mouse: false,
                    gamepad: false,
                    high_res_timer: false,
                    ui_modes: UiModeFlags::NONE,
                }
            }
            fn time_now_us(&self) -> u64 {
                0
            }
            fn sleep_ms(&self, _ms: u32) {}
        }

        let mut bare = Bare;
        assert_eq!(
            bare.resolve_path(PathRoot::Temp),
            Err(PlatformError::Unsupported)
        );
        assert!(bare.poll_event().is_none());
        assert!(matches!(
            bare.dir_open(Path::new(".")),
            Err(PlatformError::Unsupported)
        ));
    }
}
