//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the scheduling traits
//! defined in `treemount-core`. Applications can construct a [`StdRuntime`]
//! and hand it to a [`ComponentTreeBuilder`] so trees compute layouts on a
//! worker pool and wake the host's main loop when results are ready.

mod pool;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use treemount_core::{ComponentTreeBuilder, LayoutHandler, MainThreadScheduler, TreeError};

pub use pool::LayoutThreadPool;

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Main-thread scheduler that records pass requests in a flag and pokes an
/// optional waker.
pub struct StdMainThreadScheduler {
    pass_requested: AtomicBool,
    waker: RwLock<Option<Waker>>,
}

impl StdMainThreadScheduler {
    pub fn new() -> Self {
        Self {
            pass_requested: AtomicBool::new(false),
            waker: RwLock::new(None),
        }
    }

    /// Returns whether a pass has been requested since the last call.
    pub fn take_main_thread_pass(&self) -> bool {
        self.pass_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a pass is requested.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.waker.write() = Some(Arc::new(waker));
    }

    pub fn clear_waker(&self) {
        *self.waker.write() = None;
    }

    fn wake(&self) {
        // Called without the lock held so the waker may re-register itself.
        let waker = self.waker.read().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdMainThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdMainThreadScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdMainThreadScheduler")
            .field("pass_requested", &self.pass_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl MainThreadScheduler for StdMainThreadScheduler {
    fn request_main_thread_pass(&self) {
        self.pass_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Convenience container bundling the main-thread scheduler and a layout
/// pool shared by every tree it configures.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdMainThreadScheduler>,
    layout_pool: Arc<LayoutThreadPool>,
}

impl StdRuntime {
    pub const DEFAULT_LAYOUT_THREADS: usize = 2;

    /// Creates a runtime with [`Self::DEFAULT_LAYOUT_THREADS`] layout
    /// workers.
    pub fn new() -> Result<Self, TreeError> {
        Self::with_layout_threads(Self::DEFAULT_LAYOUT_THREADS)
    }

    pub fn with_layout_threads(threads: usize) -> Result<Self, TreeError> {
        Ok(Self {
            scheduler: Arc::new(StdMainThreadScheduler::default()),
            layout_pool: Arc::new(LayoutThreadPool::new("treemount-layout", threads)?),
        })
    }

    /// Points `builder` at this runtime's scheduler and layout pool.
    pub fn configure(&self, builder: ComponentTreeBuilder) -> ComponentTreeBuilder {
        builder
            .layout_handler(self.layout_handler())
            .main_thread_scheduler(self.main_thread_scheduler())
    }

    pub fn scheduler(&self) -> Arc<StdMainThreadScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn main_thread_scheduler(&self) -> Arc<dyn MainThreadScheduler> {
        self.scheduler.clone()
    }

    pub fn layout_handler(&self) -> Arc<dyn LayoutHandler> {
        self.layout_pool.clone()
    }

    pub fn layout_pool(&self) -> Arc<LayoutThreadPool> {
        Arc::clone(&self.layout_pool)
    }

    /// Returns whether a main-thread pass was requested since the last poll.
    pub fn take_main_thread_pass(&self) -> bool {
        self.scheduler.take_main_thread_pass()
    }

    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_waker(waker);
    }

    pub fn clear_waker(&self) {
        self.scheduler.clear_waker();
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("layout_pool", &self.layout_pool)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use treemount_core::{Component, ComponentTree, Context, SizeSpec};
    use treemount_testing::{CountingLayoutEngine, FakeHostView};

    use super::*;

    #[test]
    fn pass_request_sets_flag_and_wakes() {
        let scheduler = StdMainThreadScheduler::new();
        let (tx, rx) = mpsc::channel();
        scheduler.set_waker(move || tx.send(()).expect("send"));

        scheduler.request_main_thread_pass();

        assert!(rx.try_recv().is_ok());
        assert!(scheduler.take_main_thread_pass());
        assert!(!scheduler.take_main_thread_pass());
    }

    #[test]
    fn cleared_waker_is_not_called() {
        let scheduler = StdMainThreadScheduler::new();
        let (tx, rx) = mpsc::channel();
        scheduler.set_waker(move || tx.send(()).expect("send"));
        scheduler.clear_waker();

        scheduler.request_main_thread_pass();

        assert!(rx.try_recv().is_err());
        assert!(scheduler.take_main_thread_pass());
    }

    #[test]
    fn async_layout_on_the_pool_reaches_the_main_thread() {
        let runtime = StdRuntime::with_layout_threads(1).expect("runtime");
        let (tx, rx) = mpsc::channel();
        runtime.set_waker(move || {
            let _ = tx.send(());
        });

        let context = Context::new("activity");
        let engine = CountingLayoutEngine::new();
        let mut tree = runtime
            .configure(ComponentTree::create(context.clone(), Component::new("Root", ())))
            .build(engine.clone());
        let view = FakeHostView::new(context);
        view.set_measured_size(100, 100);
        tree.set_host_view(Box::new(view.clone())).expect("bind");
        tree.attach().expect("attach");

        tree.set_size_spec_async(SizeSpec::exactly(100), SizeSpec::exactly(100));

        rx.recv_timeout(Duration::from_secs(5))
            .expect("layout pool woke the main thread");
        assert!(runtime.take_main_thread_pass());
        assert_eq!(tree.process_main_thread_messages(), 1);
        assert_eq!(engine.compute_count(), 1);
        assert!(tree.main_thread_layout_state().is_some());
        assert_eq!(view.mount_count(), 1);
    }
}
