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

//! The bounded engine event queue.
//!
//! Backends push into this queue and the application loop drains it; both
//! real backends and the deterministic null backend go through the same
//! interface. The queue is strictly FIFO and never overwrites: a push onto
//! a full queue fails and leaves the queue unchanged, so overflow behavior
//! is deterministic and the caller decides whether to retry.

use super::Event;
use std::collections::VecDeque;

/// Default queue capacity, in events.
pub const EVENT_QUEUE_CAPACITY: usize = 128;

/// A fixed-capacity FIFO of engine events.
///
/// Capacity is tracked explicitly, so every slot is usable. Serialization
/// is the caller's job; the queue itself takes no locks.
#[derive(Debug)]
pub struct EventQueue {
    items: VecDeque<Event>,
    capacity: usize,
}

impl EventQueue {
    /// Creates a queue with the default capacity of 128 events.
    pub fn new() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }

    /// Creates a queue with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an event, failing if the queue is full.
    ///
    /// Returns `true` on success. On `false` the queue is unchanged and the
    /// event was dropped by the caller's choice, never silently overwritten.
    pub fn push(&mut self, event: Event) -> bool {
        if self.items.len() >= self.capacity {
            log::debug!("event queue full ({} events), push rejected", self.capacity);
            return false;
        }
        self.items.push_back(event);
        true
    }

    /// Removes and returns the oldest event, or `None` when empty.
    pub fn pop(&mut self) -> Option<Event> {
        self.items.pop_front()
    }

    /// Returns the number of queued events.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when no events are queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true when a push would be rejected.
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Returns the fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops all queued events.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn resize_event(width: u32) -> Event {
        Event::new(EventKind::WindowResized { width, height: 1 })
    }

    #[test]
    fn push_pop_is_fifo() {
        let mut queue = EventQueue::new();
        assert!(queue.push(resize_event(1)));
        assert!(queue.push(resize_event(2)));
        assert!(queue.push(resize_event(3)));

        for expected in 1..=3 {
            let event = queue.pop().expect("queue should not be empty");
            assert_eq!(
                event.kind,
                EventKind::WindowResized {
                    width: expected,
                    height: 1
                }
            );
        }
        assert!(queue.pop().is_none());
    }

    #[test]
    fn overflow_push_is_rejected_and_queue_unchanged() {
        let mut queue = EventQueue::with_capacity(4);
        for i in 0..4 {
            assert!(queue.push(resize_event(i)));
        }
        assert!(queue.is_full());
        assert!(!queue.push(resize_event(99)));
        assert_eq!(queue.len(), 4);

        // The rejected event never entered the queue.
        for i in 0..4 {
            assert_eq!(
                queue.pop().unwrap().kind,
                EventKind::WindowResized {
                    width: i,
                    height: 1
                }
            );
        }
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = EventQueue::new();
        queue.push(resize_event(7));
        queue.push(Event::new(EventKind::Quit));
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }
}
