use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use treemount_core::{LayoutHandler, LayoutTask, MainThreadScheduler};

/// Layout handler that only runs tasks when the test says so.
#[derive(Default)]
pub struct ManualLayoutHandler {
    queue: Mutex<VecDeque<LayoutTask>>,
    posted: AtomicUsize,
}

impl ManualLayoutHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }

    /// Total number of tasks ever posted.
    pub fn posted_count(&self) -> usize {
        self.posted.load(Ordering::SeqCst)
    }

    /// Runs the oldest queued task. Returns false when there was none.
    pub fn run_next(&self) -> bool {
        // Popped before running: tasks may post again.
        let task = self.queue.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty, including ones posted along the
    /// way. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl LayoutHandler for ManualLayoutHandler {
    fn post(&self, task: LayoutTask) {
        self.posted.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().push_back(task);
    }
}

impl fmt::Debug for ManualLayoutHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualLayoutHandler")
            .field("pending", &self.pending_count())
            .field("posted", &self.posted_count())
            .finish()
    }
}

/// Counts main-thread pass requests.
#[derive(Debug, Default)]
pub struct RecordingMainThreadScheduler {
    requests: AtomicUsize,
}

impl RecordingMainThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Returns the requests since the last call and resets the count.
    pub fn take_requests(&self) -> usize {
        self.requests.swap(0, Ordering::SeqCst)
    }
}

impl MainThreadScheduler for RecordingMainThreadScheduler {
    fn request_main_thread_pass(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}
