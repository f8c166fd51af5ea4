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

//! The derived-job queue.
//!
//! A no-block thread cannot perform blocking work, but it can *schedule*
//! it: jobs submitted here are executed later by whatever thread calls
//! [`DerivedJobQueue::run_next`] from a context where blocking is
//! acceptable (a worker thread, or the end of frame).
//!
//! Strict FIFO, bounded, and non-blocking on both ends: `submit` rejects
//! when the queue is full rather than waiting or overwriting, and
//! `run_next` returns immediately when there is nothing to do.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Capacity of the derived-job queue.
pub const JOB_QUEUE_CAPACITY: usize = 64;

struct DerivedJob {
    tag: String,
    job: Box<dyn FnOnce() + Send + 'static>,
}

/// A bounded FIFO of work deferred off latency-critical threads.
///
/// Cloning yields another handle onto the same queue, so a no-block
/// thread can keep one end while a worker drains the other.
#[derive(Clone)]
pub struct DerivedJobQueue {
    tx: Sender<DerivedJob>,
    rx: Receiver<DerivedJob>,
    rejected: Arc<AtomicU64>,
}

impl DerivedJobQueue {
    /// Creates an empty queue with capacity [`JOB_QUEUE_CAPACITY`].
    pub fn new() -> Self {
        let (tx, rx) = bounded(JOB_QUEUE_CAPACITY);
        Self {
            tx,
            rx,
            rejected: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueues a job, failing when the queue is full.
    ///
    /// Never blocks and never overwrites older jobs. Exhaustion is not a
    /// policy violation (no report is written), but it is observable via
    /// [`rejected_count`].
    ///
    /// [`rejected_count`]: DerivedJobQueue::rejected_count
    pub fn submit(&self, tag: impl Into<String>, job: impl FnOnce() + Send + 'static) -> bool {
        let entry = DerivedJob {
            tag: tag.into(),
            job: Box::new(job),
        };
        match self.tx.try_send(entry) {
            Ok(()) => true,
            Err(TrySendError::Full(entry)) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                log::debug!("derived job '{}' rejected: queue full", entry.tag);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Dequeues and runs the oldest job; returns whether one ran.
    ///
    /// Call only from a context where blocking is acceptable; the queue
    /// itself never checks, by contract.
    pub fn run_next(&self) -> bool {
        match self.rx.try_recv() {
            Ok(entry) => {
                log::trace!("running derived job '{}'", entry.tag);
                (entry.job)();
                true
            }
            Err(_) => false,
        }
    }

    /// Number of jobs waiting to run.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Number of submissions rejected because the queue was full.
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl Default for DerivedJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[test]
    fn submit_then_run_invokes_exactly_once() {
        let queue = DerivedJobQueue::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let observed = runs.clone();

        assert!(queue.submit("touch", move || {
            observed.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(queue.pending(), 1);
        assert!(queue.run_next());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!queue.run_next());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn jobs_run_in_submission_order() {
        let queue = DerivedJobQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5u32 {
            let order = order.clone();
            assert!(queue.submit(format!("job-{i}"), move || {
                order.lock().unwrap().push(i);
            }));
        }
        while queue.run_next() {}
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn pending_tracks_submitted_minus_run() {
        let queue = DerivedJobQueue::new();
        for _ in 0..3 {
            queue.submit("noop", || {});
        }
        assert_eq!(queue.pending(), 3);
        queue.run_next();
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn full_queue_rejects_without_losing_existing_jobs() {
        let queue = DerivedJobQueue::new();
        for i in 0..JOB_QUEUE_CAPACITY {
            assert!(queue.submit(format!("job-{i}"), || {}));
        }
        assert!(!queue.submit("overflow", || {}));
        assert_eq!(queue.pending(), JOB_QUEUE_CAPACITY);
        assert_eq!(queue.rejected_count(), 1);
    }

    #[test]
    fn worker_thread_drains_jobs_submitted_elsewhere() {
        let queue = DerivedJobQueue::new();
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let observed = runs.clone();
            queue.submit("cross-thread", move || {
                observed.fetch_add(1, Ordering::SeqCst);
            });
        }
        let worker_queue = queue.clone();
        let worker = std::thread::spawn(move || while worker_queue.run_next() {});
        worker.join().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 4);
        assert_eq!(queue.pending(), 0);
    }
}
