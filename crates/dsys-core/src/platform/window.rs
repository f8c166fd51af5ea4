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

//! Window abstractions of the backend contract.

use crate::error::PlatformResult;

/// An opaque native window handle, for graphics interop.
///
/// The value is backend-defined (an HWND, an X11 window id, a pointer);
/// the engine only carries it, never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub u64);

/// The presentation mode of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    /// A regular decorated window.
    #[default]
    Windowed,
    /// An undecorated window covering the work area.
    Borderless,
    /// Exclusive fullscreen.
    Fullscreen,
}

/// The observable state of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    /// Visible and interactive.
    #[default]
    Normal,
    /// Minimized to the shell.
    Minimized,
    /// Maximized to the work area.
    Maximized,
    /// Created but not shown.
    Hidden,
}

/// Parameters for creating a window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDesc {
    /// Title-bar text.
    pub title: String,
    /// Initial inner width in physical pixels.
    pub width: u32,
    /// Initial inner height in physical pixels.
    pub height: u32,
    /// Initial presentation mode.
    pub mode: WindowMode,
    /// Whether the window is shown immediately.
    pub visible: bool,
}

impl Default for WindowDesc {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 1280,
            height: 720,
            mode: WindowMode::Windowed,
            visible: true,
        }
    }
}

/// A live window owned by a backend.
///
/// Any windowing backend (Win32, X11, Wayland, SDL, the null backend, ...)
/// implements this trait to be drivable through the dispatcher.
pub trait BackendWindow {
    /// Changes the presentation mode.
    fn set_mode(&mut self, mode: WindowMode) -> PlatformResult<()>;

    /// Resizes the inner area, in physical pixels.
    fn set_size(&mut self, width: u32, height: u32) -> PlatformResult<()>;

    /// Returns the inner size (width, height) in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Returns the framebuffer size in pixels, which may differ from the
    /// inner size on scaled displays.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Returns the DPI scale factor.
    fn dpi_scale(&self) -> f32;

    /// Makes the window visible.
    fn show(&mut self);

    /// Hides the window.
    fn hide(&mut self);

    /// Returns the current observable state.
    fn state(&self) -> WindowState;

    /// Returns the native handle, if the backend has one.
    fn native_handle(&self) -> Option<NativeHandle>;
}
