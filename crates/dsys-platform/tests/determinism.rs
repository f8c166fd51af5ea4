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

//! Cross-backend input determinism.
//!
//! Two backends delivering the same logical input in different pump orders
//! must canonicalize to identical event sequences with identical content
//! hashes; that equality is the pass condition for backend equivalence.

use dsys_core::trace::{hash_events, normalize, InputTrace};
use dsys_platform::{CaptureBatch, RawInput};

fn capture(raws: &[RawInput]) -> CaptureBatch {
    let mut batch = CaptureBatch::new();
    for raw in raws {
        assert!(batch.push_raw(raw), "raw input rejected");
    }
    batch
}

#[test]
fn differently_ordered_backends_hash_identically() {
    // The same logical batch: mouse-move(10,20), key-down(A),
    // mouse-button-down(1), key-up(A), quit - delivered in each backend's
    // own pump order.
    let win32_pump = [
        RawInput::MouseMove { x: 10, y: 20 },
        RawInput::Key {
            scancode: 4,
            pressed: true,
        },
        RawInput::MouseButton {
            index: 1,
            pressed: true,
            x: 10,
            y: 20,
            clicks: 1,
        },
        RawInput::Key {
            scancode: 4,
            pressed: false,
        },
        RawInput::CloseRequest,
    ];
    let null_pump = [
        RawInput::CloseRequest,
        RawInput::Key {
            scancode: 4,
            pressed: false,
        },
        RawInput::MouseMove { x: 10, y: 20 },
        RawInput::Key {
            scancode: 4,
            pressed: true,
        },
        RawInput::MouseButton {
            index: 1,
            pressed: true,
            x: 10,
            y: 20,
            clicks: 1,
        },
    ];

    let mut recorded_win32 = InputTrace::new("win32");
    for event in capture(&win32_pump).drain_normalized() {
        assert!(recorded_win32.record(event));
    }
    let mut recorded_null = InputTrace::new("null");
    for event in capture(&null_pump).drain_normalized() {
        assert!(recorded_null.record(event));
    }

    let replayed_win32 = recorded_win32.play("win32");
    let replayed_null = recorded_null.play("null");

    assert_eq!(replayed_win32.len(), 5);
    assert_eq!(replayed_win32.len(), replayed_null.len());
    assert_eq!(
        hash_events(&replayed_win32),
        hash_events(&replayed_null),
        "logically-equivalent batches must hash identically"
    );
}

#[test]
fn replay_is_stable_under_repeated_normalization() {
    let pump = [
        RawInput::Key {
            scancode: 26,
            pressed: true,
        },
        RawInput::MouseMove { x: 3, y: 4 },
        RawInput::Wheel { dx: 0.0, dy: 1.0 },
    ];
    let mut trace = InputTrace::new("null");
    for event in capture(&pump).drain_normalized() {
        trace.record(event);
    }

    let mut replayed = trace.play("null");
    let hash_once = hash_events(&replayed);
    normalize(&mut replayed);
    assert_eq!(hash_events(&replayed), hash_once);
}

#[test]
fn diverging_input_is_detected() {
    let mut left = InputTrace::new("win32");
    for event in capture(&[RawInput::MouseMove { x: 10, y: 20 }]).drain_normalized() {
        left.record(event);
    }
    let mut right = InputTrace::new("null");
    for event in capture(&[RawInput::MouseMove { x: 10, y: 21 }]).drain_normalized() {
        right.record(event);
    }
    assert_ne!(
        hash_events(&left.play("win32")),
        hash_events(&right.play("null"))
    );
}
