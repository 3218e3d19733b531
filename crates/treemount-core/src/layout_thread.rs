//! Dedicated background thread for layout computation.

use std::sync::{Arc, OnceLock};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::TreeError;
use crate::platform::{InlineLayoutHandler, LayoutHandler, LayoutTask};

pub const DEFAULT_LAYOUT_THREAD_NAME: &str = "ComponentLayoutThread";

/// A single worker thread running layout tasks in post order.
pub struct LayoutThread {
    name: String,
    pool: ThreadPool,
}

impl LayoutThread {
    pub fn spawn(name: impl Into<String>) -> Result<Self, TreeError> {
        let name = name.into();
        let thread_name = name.clone();
        let panic_name = name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(move |_| thread_name.clone())
            // A panicking layout must not take the shared thread down with it.
            .panic_handler(move |_| log::error!("layout task panicked on {panic_name}"))
            .build()
            .map_err(|source| TreeError::LayoutThreadSpawn {
                name: name.clone(),
                source,
            })?;
        Ok(Self { name, pool })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl LayoutHandler for LayoutThread {
    fn post(&self, task: LayoutTask) {
        self.pool.spawn_fifo(task);
    }
}

impl std::fmt::Debug for LayoutThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutThread").field("name", &self.name).finish()
    }
}

static DEFAULT_LAYOUT_HANDLER: OnceLock<Arc<dyn LayoutHandler>> = OnceLock::new();

/// Handler shared by every tree that was not given its own. The thread is
/// started on first use and lives for the rest of the process.
pub fn default_layout_handler() -> Arc<dyn LayoutHandler> {
    DEFAULT_LAYOUT_HANDLER
        .get_or_init(|| match LayoutThread::spawn(DEFAULT_LAYOUT_THREAD_NAME) {
            Ok(thread) => Arc::new(thread),
            Err(err) => {
                log::error!("{err}; computing async layouts inline");
                Arc::new(InlineLayoutHandler)
            }
        })
        .clone()
}
