use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;

use super::slots::TreeSlots;
use super::{ComponentTree, TreeCore, TreeId};
use crate::component::Component;
use crate::context::Context;
use crate::engine::LayoutEngine;
use crate::layout_thread::default_layout_handler;
use crate::platform::{DefaultMainThreadScheduler, LayoutHandler, LayoutLock, MainThreadScheduler};
use crate::state_handler::StateHandler;

/// Options a tree was built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    pub incremental_mount: bool,
    pub layout_diffing: bool,
    pub async_state_updates: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            incremental_mount: true,
            layout_diffing: true,
            async_state_updates: true,
        }
    }
}

/// Configures a [`ComponentTree`] before it is built.
pub struct ComponentTreeBuilder {
    context: Context,
    root: Component,
    config: TreeConfig,
    layout_handler: Option<Arc<dyn LayoutHandler>>,
    layout_lock: Option<LayoutLock>,
    state_handler: Option<StateHandler>,
    main_thread: Option<Arc<dyn MainThreadScheduler>>,
}

impl ComponentTreeBuilder {
    pub(crate) fn new(context: Context, root: Component) -> Self {
        Self {
            context,
            root,
            config: TreeConfig::default(),
            layout_handler: None,
            layout_lock: None,
            state_handler: None,
            main_thread: None,
        }
    }

    /// Whether mounting is restricted to the visible area. Defaults to true.
    pub fn incremental_mount(mut self, enabled: bool) -> Self {
        self.config.incremental_mount = enabled;
        self
    }

    /// Whether layout passes receive the previous result to diff against.
    /// Defaults to true.
    pub fn layout_diffing(mut self, enabled: bool) -> Self {
        self.config.layout_diffing = enabled;
        self
    }

    /// Whether [`ComponentTree::update_state_async`] is allowed. Defaults to
    /// true.
    pub fn async_state_updates(mut self, enabled: bool) -> Self {
        self.config.async_state_updates = enabled;
        self
    }

    /// Executor for async layouts. Defaults to the shared layout thread.
    pub fn layout_handler(mut self, handler: Arc<dyn LayoutHandler>) -> Self {
        self.layout_handler = Some(handler);
        self
    }

    /// Serializes this tree's layouts with every other tree using `lock`.
    pub fn layout_lock(mut self, lock: LayoutLock) -> Self {
        self.layout_lock = Some(lock);
        self
    }

    /// Starts the tree from existing state instead of an empty handler.
    pub fn state_handler(mut self, state_handler: StateHandler) -> Self {
        self.state_handler = Some(state_handler);
        self
    }

    pub fn main_thread_scheduler(mut self, scheduler: Arc<dyn MainThreadScheduler>) -> Self {
        self.main_thread = Some(scheduler);
        self
    }

    pub fn build(self, engine: Arc<dyn LayoutEngine>) -> ComponentTree {
        let core = TreeCore {
            id: TreeId::next(),
            context: self.context,
            config: self.config,
            engine,
            layout_handler: self.layout_handler.unwrap_or_else(default_layout_handler),
            layout_lock: self.layout_lock,
            main_thread: self
                .main_thread
                .unwrap_or_else(|| Arc::new(DefaultMainThreadScheduler)),
            messages: Mutex::new(VecDeque::new()),
            layout_posted: AtomicBool::new(false),
            slots: Mutex::new(TreeSlots::new(
                self.root,
                self.state_handler.unwrap_or_default(),
            )),
        };
        log::debug!("created component tree {} ({:?})", core.id, core.config);
        ComponentTree {
            core: Arc::new(core),
            host_view: None,
            is_attached: false,
            is_mounting: false,
            _main_thread_only: PhantomData,
        }
    }
}
