//! The component tree state machine.
//!
//! A [`ComponentTree`] lives on the main thread and owns the bound host view.
//! Everything a layout thread may touch sits in a shared core behind one
//! mutex; [`TreeHandle`] exposes the thread-safe half of the API.

mod builder;
mod handle;
mod lifecycle;
mod mount;
mod scheduler;
mod slots;

use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use treemount_graphics::Size;

use crate::component::{Component, ComponentKey};
use crate::context::Context;
use crate::engine::LayoutEngine;
use crate::error::TreeError;
use crate::host::HostView;
use crate::layout_state::{LayoutStateProbe, LayoutStateRef};
use crate::platform::{LayoutHandler, LayoutLock, MainThreadScheduler};
use crate::size_spec::SizeSpec;
use crate::state_handler::{StateUpdate, StateValue};

pub use builder::{ComponentTreeBuilder, TreeConfig};
pub use handle::TreeHandle;

use scheduler::{Delivery, LayoutMode, Scheduled};
use slots::{PendingLayoutCalculation, TreeSlots};

static NEXT_TREE_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(usize);

impl TreeId {
    fn next() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Work layout threads hand back to the main thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MainThreadMessage {
    BackgroundLayoutStateUpdated,
}

pub(crate) struct TreeCore {
    id: TreeId,
    context: Context,
    config: TreeConfig,
    engine: Arc<dyn LayoutEngine>,
    layout_handler: Arc<dyn LayoutHandler>,
    layout_lock: Option<LayoutLock>,
    main_thread: Arc<dyn MainThreadScheduler>,
    messages: Mutex<VecDeque<MainThreadMessage>>,
    layout_posted: AtomicBool,
    slots: Mutex<TreeSlots>,
}

impl TreeCore {
    fn notify_main_thread(&self, message: MainThreadMessage) {
        self.messages.lock().push_back(message);
        self.main_thread.request_main_thread_pass();
    }

    fn root(&self) -> Option<Component> {
        self.slots.lock().root.clone()
    }

    fn is_released(&self) -> bool {
        self.slots.lock().released
    }

    fn has_compatible_layout(&self, width_spec: SizeSpec, height_spec: SizeSpec) -> bool {
        let slots = self.slots.lock();
        let compatible = |layout: &Option<LayoutStateRef>| {
            layout
                .as_ref()
                .is_some_and(|layout| layout.is_compatible_spec(width_spec, height_spec))
        };
        compatible(&slots.main_thread_layout) || compatible(&slots.background_layout)
    }

    fn state_value<T>(&self, key: &ComponentKey) -> Option<Arc<T>>
    where
        T: std::any::Any + Send + Sync,
    {
        self.slots
            .lock()
            .state_handler
            .as_ref()
            .and_then(|handler| handler.state_value::<T>(key))
    }

    fn state(&self, key: &ComponentKey) -> Option<StateValue> {
        self.slots
            .lock()
            .state_handler
            .as_ref()
            .and_then(|handler| handler.state(key).cloned())
    }
}

fn release_all(layouts: impl IntoIterator<Item = LayoutStateRef>) {
    for layout in layouts {
        layout.release_ref();
    }
}

/// Main-thread owner of a component hierarchy and its host view.
///
/// Not `Send`: attachment, the bound view and mounting belong to the thread
/// that built the tree. Use [`ComponentTree::handle`] to drive layout from
/// other threads.
pub struct ComponentTree {
    core: Arc<TreeCore>,
    host_view: Option<Box<dyn HostView>>,
    is_attached: bool,
    is_mounting: bool,
    _main_thread_only: PhantomData<*const ()>,
}

impl ComponentTree {
    /// Starts configuring a tree for `root`.
    pub fn create(context: Context, root: Component) -> ComponentTreeBuilder {
        ComponentTreeBuilder::new(context, root)
    }

    pub fn id(&self) -> TreeId {
        self.core.id
    }

    pub fn context(&self) -> &Context {
        &self.core.context
    }

    pub fn config(&self) -> TreeConfig {
        self.core.config
    }

    pub fn is_incremental_mount_enabled(&self) -> bool {
        self.core.config.incremental_mount
    }

    /// Thread-safe handle sharing this tree's layout state.
    pub fn handle(&self) -> TreeHandle {
        TreeHandle::new(Arc::clone(&self.core))
    }

    /// Current root, `None` once released.
    pub fn root(&self) -> Option<Component> {
        self.core.root()
    }

    pub fn is_attached(&self) -> bool {
        self.is_attached
    }

    pub fn is_mounting(&self) -> bool {
        self.is_mounting
    }

    pub fn is_released(&self) -> bool {
        self.core.is_released()
    }

    pub fn has_host_view(&self) -> bool {
        self.host_view.is_some()
    }

    pub fn main_thread_layout_state(&self) -> Option<LayoutStateProbe> {
        self.core
            .slots
            .lock()
            .main_thread_layout
            .as_ref()
            .map(LayoutStateRef::probe)
    }

    pub fn background_layout_state(&self) -> Option<LayoutStateProbe> {
        self.core
            .slots
            .lock()
            .background_layout
            .as_ref()
            .map(LayoutStateRef::probe)
    }

    pub fn has_compatible_layout(&self, width_spec: SizeSpec, height_spec: SizeSpec) -> bool {
        self.core.has_compatible_layout(width_spec, height_spec)
    }

    pub fn set_root(&mut self, root: Component) {
        self.schedule(Some(root), None, None, Self::SYNC);
    }

    pub fn set_root_async(&mut self, root: Component) {
        self.schedule(Some(root), None, None, LayoutMode::Async);
    }

    pub fn set_size_spec(&mut self, width_spec: SizeSpec, height_spec: SizeSpec) {
        self.schedule(None, Some(width_spec), Some(height_spec), Self::SYNC);
    }

    /// Like [`set_size_spec`](Self::set_size_spec), returning the size of
    /// the layout that satisfies the size spec, or zero when there is none.
    pub fn set_size_spec_with_output(&mut self, width_spec: SizeSpec, height_spec: SizeSpec) -> Size {
        self.schedule(None, Some(width_spec), Some(height_spec), Self::SYNC)
    }

    pub fn set_size_spec_async(&mut self, width_spec: SizeSpec, height_spec: SizeSpec) {
        self.schedule(None, Some(width_spec), Some(height_spec), LayoutMode::Async);
    }

    pub fn set_root_and_size_spec(
        &mut self,
        root: Component,
        width_spec: SizeSpec,
        height_spec: SizeSpec,
    ) {
        self.schedule(Some(root), Some(width_spec), Some(height_spec), Self::SYNC);
    }

    pub fn set_root_and_size_spec_with_output(
        &mut self,
        root: Component,
        width_spec: SizeSpec,
        height_spec: SizeSpec,
    ) -> Size {
        self.schedule(Some(root), Some(width_spec), Some(height_spec), Self::SYNC)
    }

    /// Queues `update` for `key` and lays the tree out again on this thread.
    pub fn update_state_sync(&mut self, key: ComponentKey, update: StateUpdate) {
        let scheduled = self.core.update_state(key, update, Self::SYNC);
        self.deliver(scheduled);
    }

    /// Queues `update` for `key` and lays the tree out on the layout handler.
    pub fn update_state_async(
        &mut self,
        key: ComponentKey,
        update: StateUpdate,
    ) -> Result<(), TreeError> {
        self.core.update_state_async(key, update)
    }

    /// Committed state of `key`, if it has the requested type.
    pub fn state_value<T>(&self, key: &ComponentKey) -> Option<Arc<T>>
    where
        T: std::any::Any + Send + Sync,
    {
        self.core.state_value(key)
    }

    pub fn state(&self, key: &ComponentKey) -> Option<StateValue> {
        self.core.state(key)
    }

    /// Handles everything layout threads queued for this tree. Returns the
    /// number of messages processed.
    pub fn process_main_thread_messages(&mut self) -> usize {
        let messages = std::mem::take(&mut *self.core.messages.lock());
        let processed = messages.len();
        for message in messages {
            match message {
                MainThreadMessage::BackgroundLayoutStateUpdated => {
                    self.background_layout_state_updated()
                }
            }
        }
        processed
    }

    /// Number of messages waiting for [`process_main_thread_messages`](Self::process_main_thread_messages).
    pub fn pending_main_thread_messages(&self) -> usize {
        self.core.messages.lock().len()
    }

    /// Drops the root, the layout results and the state. Queued background
    /// work notices and stops.
    pub fn release(&mut self) {
        if let Some(view) = self.host_view.as_mut() {
            view.clear_component_tree();
        }
        self.host_view = None;

        let layouts = {
            let mut slots = self.core.slots.lock();
            if slots.released {
                return;
            }
            slots.released = true;
            slots.root = None;
            slots.state_handler = None;
            slots.schedule_after_measure = PendingLayoutCalculation::None;
            slots.take_layouts()
        };
        self.core.messages.lock().clear();
        log::debug!("released component tree {}", self.core.id);
        release_all(layouts);
    }

    const SYNC: LayoutMode = LayoutMode::Sync(Delivery::Caller);

    fn schedule(
        &mut self,
        root: Option<Component>,
        width_spec: Option<SizeSpec>,
        height_spec: Option<SizeSpec>,
        mode: LayoutMode,
    ) -> Size {
        let scheduled = self
            .core
            .set_root_and_size_spec_internal(root, width_spec, height_spec, mode);
        self.deliver(scheduled)
    }

    fn deliver(&mut self, scheduled: Scheduled) -> Size {
        if scheduled.installed() {
            self.background_layout_state_updated();
        }
        scheduled.size.unwrap_or(Size::ZERO)
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("id", &self.core.id)
            .field("context", &self.core.context)
            .field("is_attached", &self.is_attached)
            .field("has_host_view", &self.host_view.is_some())
            .finish()
    }
}

impl Drop for ComponentTree {
    fn drop(&mut self) {
        self.release();
    }
}
