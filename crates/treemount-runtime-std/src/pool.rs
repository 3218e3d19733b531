use std::fmt;

use rayon::{ThreadPool, ThreadPoolBuilder};
use treemount_core::{LayoutHandler, LayoutTask, TreeError};

/// Fixed set of worker threads computing layouts for any number of trees.
///
/// Tasks posted from outside the pool are started in post order; with more
/// than one worker they may finish out of order.
pub struct LayoutThreadPool {
    name: String,
    pool: ThreadPool,
}

impl LayoutThreadPool {
    /// Spawns `threads` workers (at least one) named `{name}-{index}`.
    pub fn new(name: &str, threads: usize) -> Result<Self, TreeError> {
        let thread_prefix = name.to_owned();
        let panic_name = name.to_owned();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(move |index| format!("{thread_prefix}-{index}"))
            .panic_handler(move |_| log::error!("layout task panicked in pool {panic_name}"))
            .build()
            .map_err(|source| TreeError::LayoutThreadSpawn {
                name: name.to_owned(),
                source,
            })?;
        log::debug!(
            "started layout pool {name} with {} workers",
            pool.current_num_threads()
        );
        Ok(Self {
            name: name.to_owned(),
            pool,
        })
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl LayoutHandler for LayoutThreadPool {
    fn post(&self, task: LayoutTask) {
        self.pool.spawn_fifo(task);
    }
}

impl fmt::Debug for LayoutThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutThreadPool")
            .field("name", &self.name)
            .field("threads", &self.thread_count())
            .finish()
    }
}
