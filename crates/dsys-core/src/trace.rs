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

//! Input-trace canonicalization and hashing.
//!
//! Backends may deliver logically-equivalent event batches in different
//! intra-frame orders depending on the OS event-pump. To prove that two
//! backends produced equivalent input, each batch is independently reordered
//! into a backend-independent canonical order and content-hashed; equal
//! hashes across backends is the pass condition.
//!
//! Ties between logically-identical events keep their original relative
//! order (stable sort), so `normalize` is deterministic, not merely
//! equivalence-preserving, and is idempotent.

use crate::event::{Event, EventKind};

/// Maximum number of events an [`InputTrace`] will record.
pub const TRACE_MAX_EVENTS: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// The backend-independent sort key for an event.
///
/// `(type rank, primary, secondary, tertiary)`; the last three fields are
/// type-dependent. Float payloads contribute their raw bit patterns, which
/// is arbitrary as an ordering but stable across backends, and stability is
/// all canonicalization needs.
fn canonical_key(event: &Event) -> (u32, i64, i64, i64) {
    match &event.kind {
        EventKind::Quit => (0, 0, 0, 0),
        EventKind::WindowResized { width, height } => (1, *width as i64, *height as i64, 0),
        EventKind::KeyPressed { key } => (2, key.code() as i64, 0, 0),
        EventKind::KeyReleased { key } => (3, key.code() as i64, 0, 0),
        EventKind::TextInput { text } => (4, fnv1a_bytes(FNV_OFFSET, text.as_bytes()) as i64, 0, 0),
        EventKind::MouseMoved { x, y, .. } => (5, *x as i64, *y as i64, 0),
        EventKind::MouseButtonPressed { button, x, y, .. } => {
            (6, button.code() as i64, *x as i64, *y as i64)
        }
        EventKind::MouseButtonReleased { button, x, y, .. } => {
            (7, button.code() as i64, *x as i64, *y as i64)
        }
        EventKind::MouseWheelScrolled { delta_x, delta_y } => {
            (8, delta_x.to_bits() as i64, delta_y.to_bits() as i64, 0)
        }
        EventKind::DpiChanged { scale } => (9, scale.to_bits() as i64, 0, 0),
    }
}

fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a_u64(hash: u64, value: u64) -> u64 {
    fnv1a_bytes(hash, &value.to_le_bytes())
}

/// Reorders a batch into canonical, backend-independent order.
///
/// The sort is stable, so events with identical canonical keys keep their
/// original relative order and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(batch: &mut [Event]) {
    batch.sort_by(|a, b| canonical_key(a).cmp(&canonical_key(b)));
}

/// Hashes an (already normalized) event sequence.
///
/// Order-sensitive FNV-1a accumulation over the canonical key fields of
/// every event, seeded with the batch count. Two differently-ordered but
/// logically-equivalent batches normalize to the same sequence and
/// therefore hash identically.
pub fn hash_events(events: &[Event]) -> u64 {
    let mut hash = fnv1a_u64(FNV_OFFSET, events.len() as u64);
    for event in events {
        let (rank, a, b, c) = canonical_key(event);
        hash = fnv1a_u64(hash, rank as u64);
        hash = fnv1a_u64(hash, a as u64);
        hash = fnv1a_u64(hash, b as u64);
        hash = fnv1a_u64(hash, c as u64);
    }
    hash
}

/// A bounded recording of an event batch, labeled with the backend that
/// produced it.
#[derive(Debug, Clone)]
pub struct InputTrace {
    label: String,
    events: Vec<Event>,
}

impl InputTrace {
    /// Creates an empty trace under the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            events: Vec::new(),
        }
    }

    /// Records an event, failing once the trace holds [`TRACE_MAX_EVENTS`].
    pub fn record(&mut self, event: Event) -> bool {
        if self.events.len() >= TRACE_MAX_EVENTS {
            log::debug!(
                "trace '{}' is full ({TRACE_MAX_EVENTS} events), record rejected",
                self.label
            );
            return false;
        }
        self.events.push(event);
        true
    }

    /// Returns the label the trace was recorded under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the recorded events in recording order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Replays the trace: copies the recorded batch and re-normalizes it.
    ///
    /// `backend_name` is accepted for trace-format compatibility but must
    /// not alter the output; replay is backend-agnostic.
    pub fn play(&self, backend_name: &str) -> Vec<Event> {
        let _ = backend_name;
        let mut replayed = self.events.clone();
        normalize(&mut replayed);
        replayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyCode, MouseButton};

    fn key_down(key: KeyCode) -> Event {
        Event::new(EventKind::KeyPressed { key })
    }

    fn key_up(key: KeyCode) -> Event {
        Event::new(EventKind::KeyReleased { key })
    }

    fn mouse_move(x: i32, y: i32) -> Event {
        Event::new(EventKind::MouseMoved { x, y, dx: 0, dy: 0 })
    }

    fn mouse_down(button: MouseButton) -> Event {
        Event::new(EventKind::MouseButtonPressed {
            button,
            x: 0,
            y: 0,
            clicks: 1,
        })
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut batch = vec![
            key_up(KeyCode::A),
            Event::new(EventKind::Quit),
            mouse_move(10, 20),
            key_down(KeyCode::A),
        ];
        normalize(&mut batch);
        let once = batch.clone();
        normalize(&mut batch);
        assert_eq!(batch, once);
    }

    #[test]
    fn equivalent_batches_hash_identically() {
        let forward = vec![
            mouse_move(10, 20),
            key_down(KeyCode::A),
            mouse_down(MouseButton::Left),
            key_up(KeyCode::A),
            Event::new(EventKind::Quit),
        ];
        let mut shuffled = vec![
            Event::new(EventKind::Quit),
            key_up(KeyCode::A),
            mouse_down(MouseButton::Left),
            mouse_move(10, 20),
            key_down(KeyCode::A),
        ];
        let mut forward = forward;
        normalize(&mut forward);
        normalize(&mut shuffled);
        assert_eq!(hash_events(&forward), hash_events(&shuffled));
    }

    #[test]
    fn different_payloads_hash_differently() {
        let a = vec![mouse_move(10, 20)];
        let b = vec![mouse_move(10, 21)];
        assert_ne!(hash_events(&a), hash_events(&b));
    }

    #[test]
    fn hash_is_sensitive_to_batch_count() {
        let one = vec![key_down(KeyCode::A)];
        let two = vec![key_down(KeyCode::A), key_down(KeyCode::A)];
        assert_ne!(hash_events(&one), hash_events(&two));
    }

    #[test]
    fn ties_preserve_recording_order() {
        // Two identical key-downs differ only in timestamp; after
        // normalization the earlier recording must still come first.
        let mut first = key_down(KeyCode::W);
        first.timestamp_us = 100;
        let mut second = key_down(KeyCode::W);
        second.timestamp_us = 200;

        let mut batch = vec![first.clone(), second.clone()];
        normalize(&mut batch);
        assert_eq!(batch[0], first);
        assert_eq!(batch[1], second);
    }

    #[test]
    fn trace_rejects_past_capacity() {
        let mut trace = InputTrace::new("overflow");
        for _ in 0..TRACE_MAX_EVENTS {
            assert!(trace.record(key_down(KeyCode::A)));
        }
        assert!(!trace.record(key_down(KeyCode::A)));
        assert_eq!(trace.len(), TRACE_MAX_EVENTS);
    }

    #[test]
    fn play_ignores_backend_name() {
        let mut trace = InputTrace::new("any");
        trace.record(key_up(KeyCode::B));
        trace.record(key_down(KeyCode::B));
        let a = trace.play("win32");
        let b = trace.play("null");
        assert_eq!(a, b);
        assert_eq!(hash_events(&a), hash_events(&b));
    }
}
