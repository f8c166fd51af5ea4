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

//! Translation from raw backend input to engine events.
//!
//! This module is the adapter layer between whatever a concrete backend's
//! event pump produces and the engine's [`Event`] model: scancodes map to
//! stable key codes, mouse buttons are remapped, and cursor deltas are
//! derived from successive absolute positions.
//!
//! Raw events are collected into a bounded [`CaptureBatch`] per pump.
//! When a pump yields more than one event, the batch is canonicalized
//! before it reaches the event queue, so backend-dependent intra-pump
//! ordering never leaks into recorded behavior.

use crate::dispatch::Platform;
use dsys_core::event::{Event, EventKind, KeyCode, MouseButton};
use dsys_core::trace::normalize;

/// Maximum raw events captured in one pump.
pub const CAPTURE_BATCH_CAPACITY: usize = 64;

/// A raw input occurrence as a backend's pump reports it, before any
/// engine-level mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// A key changed state, identified by a USB-HID-style scancode.
    Key {
        /// Raw scancode.
        scancode: u32,
        /// Pressed (`true`) or released (`false`).
        pressed: bool,
    },
    /// Committed text input.
    Text {
        /// The committed UTF-8 fragment.
        text: String,
    },
    /// Absolute cursor position.
    MouseMove {
        /// Cursor x in window space.
        x: i32,
        /// Cursor y in window space.
        y: i32,
    },
    /// A mouse button changed state.
    MouseButton {
        /// Backend button index (1 = left, 2 = right, 3 = middle, ...).
        index: u8,
        /// Pressed (`true`) or released (`false`).
        pressed: bool,
        /// Cursor x at the transition.
        x: i32,
        /// Cursor y at the transition.
        y: i32,
        /// Consecutive-click count.
        clicks: u8,
    },
    /// Wheel motion on two axes.
    Wheel {
        /// Horizontal delta.
        dx: f32,
        /// Vertical delta.
        dy: f32,
    },
    /// The window's inner area changed size.
    Resize {
        /// New width in physical pixels.
        width: u32,
        /// New height in physical pixels.
        height: u32,
    },
    /// The window's DPI scale factor changed.
    ScaleChange {
        /// New scale factor.
        scale: f32,
    },
    /// The user asked the window/application to close.
    CloseRequest,
}

/// Maps a raw scancode to the engine's stable key code.
///
/// Unknown codes map to [`KeyCode::Unknown`] rather than failing, so exotic
/// keys degrade gracefully instead of dropping events.
pub fn map_scancode(scancode: u32) -> KeyCode {
    match scancode {
        4 => KeyCode::A,
        5 => KeyCode::B,
        6 => KeyCode::C,
        7 => KeyCode::D,
        8 => KeyCode::E,
        9 => KeyCode::F,
        10 => KeyCode::G,
        11 => KeyCode::H,
        12 => KeyCode::I,
        13 => KeyCode::J,
        14 => KeyCode::K,
        15 => KeyCode::L,
        16 => KeyCode::M,
        17 => KeyCode::N,
        18 => KeyCode::O,
        19 => KeyCode::P,
        20 => KeyCode::Q,
        21 => KeyCode::R,
        22 => KeyCode::S,
        23 => KeyCode::T,
        24 => KeyCode::U,
        25 => KeyCode::V,
        26 => KeyCode::W,
        27 => KeyCode::X,
        28 => KeyCode::Y,
        29 => KeyCode::Z,
        30 => KeyCode::Digit1,
        31 => KeyCode::Digit2,
        32 => KeyCode::Digit3,
        33 => KeyCode::Digit4,
        34 => KeyCode::Digit5,
        35 => KeyCode::Digit6,
        36 => KeyCode::Digit7,
        37 => KeyCode::Digit8,
        38 => KeyCode::Digit9,
        39 => KeyCode::Digit0,
        40 => KeyCode::Enter,
        41 => KeyCode::Escape,
        42 => KeyCode::Backspace,
        43 => KeyCode::Tab,
        44 => KeyCode::Space,
        79 => KeyCode::ArrowRight,
        80 => KeyCode::ArrowLeft,
        81 => KeyCode::ArrowDown,
        82 => KeyCode::ArrowUp,
        _ => KeyCode::Unknown,
    }
}

/// Maps a backend button index to the engine's mouse button.
pub fn map_mouse_button(index: u8) -> MouseButton {
    match index {
        1 => MouseButton::Left,
        2 => MouseButton::Right,
        3 => MouseButton::Middle,
        4 => MouseButton::Back,
        5 => MouseButton::Forward,
        other => MouseButton::Other(other as u16),
    }
}

/// One pump's worth of translated events, bounded and canonicalized on
/// flush.
#[derive(Debug, Default)]
pub struct CaptureBatch {
    events: Vec<Event>,
    last_cursor: Option<(i32, i32)>,
}

impl CaptureBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates a raw input and appends the resulting event.
    ///
    /// Returns `false` when the batch is full or the raw input carries no
    /// engine-level meaning (zero wheel motion).
    pub fn push_raw(&mut self, raw: &RawInput) -> bool {
        if self.events.len() >= CAPTURE_BATCH_CAPACITY {
            log::debug!("capture batch full ({CAPTURE_BATCH_CAPACITY}); raw input dropped");
            return false;
        }
        let Some(event) = self.translate(raw) else {
            return false;
        };
        self.events.push(event);
        true
    }

    fn translate(&mut self, raw: &RawInput) -> Option<Event> {
        let kind = match raw {
            RawInput::Key { scancode, pressed } => {
                let key = map_scancode(*scancode);
                if *pressed {
                    EventKind::KeyPressed { key }
                } else {
                    EventKind::KeyReleased { key }
                }
            }
            RawInput::Text { text } => EventKind::TextInput { text: text.clone() },
            RawInput::MouseMove { x, y } => {
                let (dx, dy) = match self.last_cursor {
                    Some((last_x, last_y)) => (x - last_x, y - last_y),
                    None => (0, 0),
                };
                self.last_cursor = Some((*x, *y));
                EventKind::MouseMoved {
                    x: *x,
                    y: *y,
                    dx,
                    dy,
                }
            }
            RawInput::MouseButton {
                index,
                pressed,
                x,
                y,
                clicks,
            } => {
                let button = map_mouse_button(*index);
                if *pressed {
                    EventKind::MouseButtonPressed {
                        button,
                        x: *x,
                        y: *y,
                        clicks: *clicks,
                    }
                } else {
                    EventKind::MouseButtonReleased {
                        button,
                        x: *x,
                        y: *y,
                        clicks: *clicks,
                    }
                }
            }
            RawInput::Wheel { dx, dy } => {
                if *dx == 0.0 && *dy == 0.0 {
                    return None;
                }
                EventKind::MouseWheelScrolled {
                    delta_x: *dx,
                    delta_y: *dy,
                }
            }
            RawInput::Resize { width, height } => EventKind::WindowResized {
                width: *width,
                height: *height,
            },
            RawInput::ScaleChange { scale } => EventKind::DpiChanged { scale: *scale },
            RawInput::CloseRequest => EventKind::Quit,
        };
        Some(Event::new(kind))
    }

    /// Number of translated events waiting to flush.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drains the batch in canonical order.
    ///
    /// Batches with more than one event are normalized first, so the order
    /// the backend's pump happened to deliver them in never becomes
    /// observable.
    pub fn drain_normalized(&mut self) -> Vec<Event> {
        if self.events.len() > 1 {
            normalize(&mut self.events);
        }
        std::mem::take(&mut self.events)
    }

    /// Flushes the batch into the dispatcher's event queue, canonicalized.
    ///
    /// Returns the number of events accepted; a full queue stops the flush
    /// and drops the remainder (the queue never overwrites).
    pub fn flush_into(&mut self, platform: &mut Platform) -> usize {
        let mut accepted = 0;
        for event in self.drain_normalized() {
            if !platform.push_event(event) {
                log::warn!("event queue full during capture flush; remainder dropped");
                break;
            }
            accepted += 1;
        }
        accepted
    }
}
