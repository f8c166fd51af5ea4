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

//! Per-thread execution tags.
//!
//! A thread tags itself (`untagged -> tagged -> untagged`); tagging again
//! overwrites flags and name in place. Tags live in thread-local storage,
//! so reads from the owning thread are lock-free; only the process-wide
//! tagged-thread count is shared, and it is a single atomic.
//!
//! The count is capped at [`MAX_TAGGED_THREADS`]. Exhaustion fails loudly
//! with [`TagError::CapacityExhausted`] rather than reusing a live slot.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;

/// Maximum number of concurrently tagged threads.
pub const MAX_TAGGED_THREADS: usize = 8;

/// Flags describing the execution discipline of a tagged thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadTagFlags {
    bits: u32,
}

impl ThreadTagFlags {
    /// No discipline; equivalent to an untagged thread.
    pub const NONE: Self = Self { bits: 0 };
    /// The thread must never perform blocking I/O (UI/render threads).
    pub const NO_BLOCK: Self = Self { bits: 1 << 0 };

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
}

/// The tag a thread carries while marked.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadTag {
    /// Execution-discipline flags.
    pub flags: ThreadTagFlags,
    /// Human-readable thread name used in violation reports.
    pub name: String,
}

/// Errors from tagging operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TagError {
    /// All tag slots are in use; clear another thread's tag first.
    #[error("thread tag table exhausted ({MAX_TAGGED_THREADS} threads already tagged)")]
    CapacityExhausted,
}

thread_local! {
    static CURRENT_TAG: RefCell<Option<ThreadTag>> = const { RefCell::new(None) };
    static THREAD_ORDINAL: u64 = NEXT_ORDINAL.fetch_add(1, Ordering::Relaxed);
}

static NEXT_ORDINAL: AtomicU64 = AtomicU64::new(1);
static TAGGED_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Returns a process-unique ordinal for the calling thread, assigned on
/// first use. Stable for the thread's lifetime; used in reports.
pub fn thread_ordinal() -> u64 {
    THREAD_ORDINAL.with(|ordinal| *ordinal)
}

fn try_reserve_slot() -> bool {
    let mut count = TAGGED_COUNT.load(Ordering::Relaxed);
    loop {
        if count >= MAX_TAGGED_THREADS {
            return false;
        }
        match TAGGED_COUNT.compare_exchange_weak(
            count,
            count + 1,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return true,
            Err(observed) => count = observed,
        }
    }
}

/// Tags the calling thread.
///
/// Re-tagging an already-tagged thread overwrites flags and name in place
/// without consuming another slot. Fails with
/// [`TagError::CapacityExhausted`] when [`MAX_TAGGED_THREADS`] other
/// threads are already tagged.
pub fn tag_current(flags: ThreadTagFlags, name: impl Into<String>) -> Result<(), TagError> {
    let name = name.into();
    CURRENT_TAG.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() && !try_reserve_slot() {
            log::warn!("thread tag rejected for '{name}': all slots in use");
            return Err(TagError::CapacityExhausted);
        }
        log::trace!("thread {} tagged as '{name}'", thread_ordinal());
        *slot = Some(ThreadTag { flags, name });
        Ok(())
    })
}

/// Removes the calling thread's tag, if any. Untagged threads are a no-op.
pub fn clear_current() {
    CURRENT_TAG.with(|slot| {
        if slot.borrow_mut().take().is_some() {
            TAGGED_COUNT.fetch_sub(1, Ordering::AcqRel);
            log::trace!("thread {} untagged", thread_ordinal());
        }
    });
}

/// Returns a snapshot of the calling thread's tag, if tagged.
pub fn current_tag() -> Option<ThreadTag> {
    CURRENT_TAG.with(|slot| slot.borrow().clone())
}

/// Returns true when the calling thread is tagged `NO_BLOCK`.
pub fn is_current_no_block() -> bool {
    CURRENT_TAG.with(|slot| {
        slot.borrow()
            .as_ref()
            .is_some_and(|tag| tag.flags.contains(ThreadTagFlags::NO_BLOCK))
    })
}

/// Returns the number of currently tagged threads, process-wide.
pub fn tagged_count() -> usize {
    TAGGED_COUNT.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tag state is per-thread; run each case on a fresh thread so tests
    // stay independent of each other and of the harness thread.
    fn on_fresh_thread(body: impl FnOnce() + Send + 'static) {
        std::thread::spawn(body).join().expect("test thread panicked");
    }

    #[test]
    fn untagged_thread_has_no_tag() {
        on_fresh_thread(|| {
            assert!(current_tag().is_none());
            assert!(!is_current_no_block());
            // Clearing an untagged thread is a no-op.
            clear_current();
        });
    }

    #[test]
    fn tag_clear_round_trip() {
        on_fresh_thread(|| {
            tag_current(ThreadTagFlags::NO_BLOCK, "render").expect("tagging failed");
            let tag = current_tag().expect("tag missing");
            assert_eq!(tag.name, "render");
            assert!(is_current_no_block());

            clear_current();
            assert!(current_tag().is_none());
            assert!(!is_current_no_block());
        });
    }

    #[test]
    fn retagging_overwrites_in_place() {
        on_fresh_thread(|| {
            tag_current(ThreadTagFlags::NO_BLOCK, "ui").unwrap();
            tag_current(ThreadTagFlags::NONE, "ui-relaxed").unwrap();
            let tag = current_tag().unwrap();
            assert_eq!(tag.name, "ui-relaxed");
            assert!(!is_current_no_block());
            clear_current();
            assert!(current_tag().is_none());
        });
    }

    #[test]
    fn thread_ordinals_are_unique() {
        let a = std::thread::spawn(thread_ordinal).join().unwrap();
        let b = std::thread::spawn(thread_ordinal).join().unwrap();
        assert_ne!(a, b);
    }
}
