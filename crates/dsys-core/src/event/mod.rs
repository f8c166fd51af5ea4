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

//! The engine-level event model.
//!
//! Events are backend-agnostic: every platform backend translates its raw
//! OS events into this representation before they enter the event queue, so
//! nothing above the platform layer ever sees toolkit-specific types.

pub mod queue;

pub use queue::EventQueue;

/// A physical key, identified by a stable, backend-independent code.
///
/// Discriminants follow USB HID usage IDs and are part of the recorded
/// trace format; they must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
#[allow(missing_docs)]
pub enum KeyCode {
    Unknown = 0,
    A = 4,
    B = 5,
    C = 6,
    D = 7,
    E = 8,
    F = 9,
    G = 10,
    H = 11,
    I = 12,
    J = 13,
    K = 14,
    L = 15,
    M = 16,
    N = 17,
    O = 18,
    P = 19,
    Q = 20,
    R = 21,
    S = 22,
    T = 23,
    U = 24,
    V = 25,
    W = 26,
    X = 27,
    Y = 28,
    Z = 29,
    Digit1 = 30,
    Digit2 = 31,
    Digit3 = 32,
    Digit4 = 33,
    Digit5 = 34,
    Digit6 = 35,
    Digit7 = 36,
    Digit8 = 37,
    Digit9 = 38,
    Digit0 = 39,
    Enter = 40,
    Escape = 41,
    Backspace = 42,
    Tab = 43,
    Space = 44,
    ArrowRight = 79,
    ArrowLeft = 80,
    ArrowDown = 81,
    ArrowUp = 82,
}

impl KeyCode {
    /// Returns the stable numeric code used in traces and canonical keys.
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// An engine-internal representation of a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MouseButton {
    /// The left mouse button.
    Left,
    /// The right mouse button.
    Right,
    /// The middle mouse button.
    Middle,
    /// The back mouse button (typically on the side).
    Back,
    /// The forward mouse button (typically on the side).
    Forward,
    /// Another mouse button, identified by a numeric code.
    Other(u16),
}

impl MouseButton {
    /// Returns a stable numeric code for canonical ordering and hashing.
    pub fn code(self) -> u32 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Right => 2,
            MouseButton::Middle => 3,
            MouseButton::Back => 4,
            MouseButton::Forward => 5,
            MouseButton::Other(id) => 8 + id as u32,
        }
    }
}

/// The payload of an engine event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// The application was asked to quit.
    Quit,
    /// A window's inner area changed size.
    WindowResized {
        /// New width in physical pixels.
        width: u32,
        /// New height in physical pixels.
        height: u32,
    },
    /// A keyboard key was pressed.
    KeyPressed {
        /// The physical key.
        key: KeyCode,
    },
    /// A keyboard key was released.
    KeyReleased {
        /// The physical key.
        key: KeyCode,
    },
    /// Committed text input, as a short UTF-8 fragment.
    TextInput {
        /// The committed text.
        text: String,
    },
    /// The mouse cursor moved.
    MouseMoved {
        /// Absolute x-coordinate in window space.
        x: i32,
        /// Absolute y-coordinate in window space.
        y: i32,
        /// Horizontal motion since the previous report.
        dx: i32,
        /// Vertical motion since the previous report.
        dy: i32,
    },
    /// A mouse button was pressed.
    MouseButtonPressed {
        /// The button that was pressed.
        button: MouseButton,
        /// Cursor x-coordinate at press time.
        x: i32,
        /// Cursor y-coordinate at press time.
        y: i32,
        /// Consecutive-click count (1 = single click).
        clicks: u8,
    },
    /// A mouse button was released.
    MouseButtonReleased {
        /// The button that was released.
        button: MouseButton,
        /// Cursor x-coordinate at release time.
        x: i32,
        /// Cursor y-coordinate at release time.
        y: i32,
        /// Consecutive-click count carried from the press.
        clicks: u8,
    },
    /// The mouse wheel was scrolled.
    MouseWheelScrolled {
        /// Horizontal scroll delta.
        delta_x: f32,
        /// Vertical scroll delta.
        delta_y: f32,
    },
    /// The DPI scale factor of a window changed.
    DpiChanged {
        /// The new scale factor.
        scale: f32,
    },
}

/// An engine event: a payload plus delivery metadata.
///
/// A zero `timestamp_us` or `window_id` means "unset"; the dispatcher fills
/// both when the event is pushed into the queue.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// The event payload.
    pub kind: EventKind,
    /// Backend clock time in microseconds; 0 = stamp on push.
    pub timestamp_us: u64,
    /// Owning window id; 0 = fill from the window registry on push.
    pub window_id: u32,
}

impl Event {
    /// Creates an event with unset timestamp and window id.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp_us: 0,
            window_id: 0,
        }
    }

    /// Returns true for payloads that are scoped to a window (everything
    /// except [`EventKind::Quit`]).
    pub fn is_window_scoped(&self) -> bool {
        !matches!(self.kind, EventKind::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_are_stable() {
        assert_eq!(KeyCode::A.code(), 4);
        assert_eq!(KeyCode::Space.code(), 44);
        assert_eq!(KeyCode::ArrowUp.code(), 82);
    }

    #[test]
    fn mouse_button_codes_do_not_collide() {
        let codes = [
            MouseButton::Left.code(),
            MouseButton::Right.code(),
            MouseButton::Middle.code(),
            MouseButton::Back.code(),
            MouseButton::Forward.code(),
            MouseButton::Other(0).code(),
            MouseButton::Other(1).code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn quit_is_not_window_scoped() {
        assert!(!Event::new(EventKind::Quit).is_window_scoped());
        assert!(Event::new(EventKind::TextInput { text: "é".into() }).is_window_scoped());
    }
}
