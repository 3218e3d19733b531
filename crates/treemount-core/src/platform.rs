//! Scheduling contracts between a component tree and its host platform.
//!
//! A tree runs on one main thread and computes layouts on whatever executor
//! its [`LayoutHandler`] wraps. Results travel back through the tree's own
//! message queue; the [`MainThreadScheduler`] only tells the host that the
//! queue needs draining.

use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Unit of background layout work.
pub type LayoutTask = Box<dyn FnOnce() + Send + 'static>;

/// Executes layout work away from the main thread.
///
/// Implementations must run every posted task exactly once. They may run
/// tasks of different trees concurrently; a tree never needs more than one of
/// its own tasks at a time since posting is coalesced per tree.
pub trait LayoutHandler: Send + Sync {
    fn post(&self, task: LayoutTask);
}

/// Wakes the main thread when a tree has messages waiting.
///
/// The host answers a request by calling
/// [`ComponentTree::process_main_thread_messages`](crate::ComponentTree::process_main_thread_messages)
/// from its main thread.
pub trait MainThreadScheduler: Send + Sync {
    fn request_main_thread_pass(&self);
}

/// Scheduler for hosts that drain messages on their own cadence.
#[derive(Debug, Default)]
pub struct DefaultMainThreadScheduler;

impl MainThreadScheduler for DefaultMainThreadScheduler {
    fn request_main_thread_pass(&self) {}
}

/// Runs layout work on the thread that posts it.
#[derive(Debug, Default)]
pub struct InlineLayoutHandler;

impl LayoutHandler for InlineLayoutHandler {
    fn post(&self, task: LayoutTask) {
        task();
    }
}

/// Serializes layout computation across the trees that share it.
///
/// Reentrant: a layout engine may drive a tree synchronously from inside a
/// computation on the same thread.
#[derive(Clone, Default)]
pub struct LayoutLock(Arc<ReentrantMutex<()>>);

impl LayoutLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.0.lock()
    }

    pub fn is_locked(&self) -> bool {
        self.0.is_locked()
    }
}

impl std::fmt::Debug for LayoutLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}
