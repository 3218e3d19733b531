//! Deciding when to lay out, and running the computation.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::Instant;

use treemount_graphics::Size;

use super::slots::{PendingLayoutCalculation, TreeSlots};
use super::{release_all, MainThreadMessage, TreeCore};
use crate::component::{Component, ComponentKey};
use crate::engine::LayoutRequest;
use crate::error::TreeError;
use crate::layout_state::{LayoutState, LayoutStateRef};
use crate::size_spec::{self, SizeSpec};
use crate::state_handler::{StateHandler, StateUpdate};

/// Where a synchronously installed background layout gets reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// The caller is the main-thread tree and handles it on return.
    Caller,
    MainThreadQueue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LayoutMode {
    Sync(Delivery),
    Async,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScheduleOutcome {
    /// Nothing changed that needs a new layout.
    Skipped,
    /// Recorded for after the running measure.
    Deferred,
    Posted,
    Computed { installed: bool },
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Scheduled {
    pub(crate) outcome: ScheduleOutcome,
    pub(crate) size: Option<Size>,
}

impl Scheduled {
    fn new(outcome: ScheduleOutcome, size: Option<Size>) -> Self {
        Self { outcome, size }
    }

    pub(crate) fn installed(&self) -> bool {
        matches!(self.outcome, ScheduleOutcome::Computed { installed: true })
    }
}

/// The queued calculation of one tree. Dropping it unrun, as a handler that
/// discards work does, lets the tree post again.
struct PostedLayout {
    core: Weak<TreeCore>,
    ran: bool,
}

impl PostedLayout {
    fn run(mut self) {
        self.ran = true;
        let Some(core) = self.core.upgrade() else {
            return;
        };
        core.layout_posted.store(false, Ordering::Release);
        core.calculate_layout(Delivery::MainThreadQueue);
    }
}

impl Drop for PostedLayout {
    fn drop(&mut self) {
        if self.ran {
            return;
        }
        if let Some(core) = self.core.upgrade() {
            log::debug!("layout task of tree {} dropped without running", core.id);
            core.layout_posted.store(false, Ordering::Release);
        }
    }
}

impl TreeCore {
    /// Records a new root and/or size spec and lays out when the current
    /// results no longer fit. `None` keeps the current value.
    pub(crate) fn set_root_and_size_spec_internal(
        self: &Arc<Self>,
        root: Option<Component>,
        width_spec: Option<SizeSpec>,
        height_spec: Option<SizeSpec>,
        mode: LayoutMode,
    ) -> Scheduled {
        {
            let mut slots = self.slots.lock();
            if slots.released {
                log::debug!("tree {} is released, ignoring new root or size spec", self.id);
                return Scheduled::new(ScheduleOutcome::Skipped, None);
            }

            // Pending updates must not be satisfied by a layout computed
            // before they were queued.
            let has_pending_updates = slots
                .state_handler
                .as_ref()
                .is_some_and(StateHandler::has_pending_updates);
            let root = if has_pending_updates {
                root.map(|root| root.make_shallow_copy_with_new_id())
            } else {
                root
            };

            if slots.has_view_measure_spec && root.is_none() {
                // The host view owns the size spec until it is detached.
                log::trace!("tree {} ignores a size spec while measured by its view", self.id);
                return Scheduled::new(ScheduleOutcome::Skipped, None);
            }

            let root_unchanged = root.as_ref().map_or(true, |root| {
                slots.root.as_ref().map(Component::id) == Some(root.id())
            });
            if root_unchanged && specs_are_compatible(&slots, width_spec, height_spec) {
                let size = slots.most_recent_layout().map(|layout| layout.size());
                return Scheduled::new(ScheduleOutcome::Skipped, size);
            }

            if let Some(width_spec) = width_spec {
                slots.width_spec = Some(width_spec);
            }
            if let Some(height_spec) = height_spec {
                slots.height_spec = Some(height_spec);
            }
            if let Some(root) = root {
                slots.root = Some(root);
            }

            if slots.is_measuring {
                let requested = match mode {
                    LayoutMode::Async => PendingLayoutCalculation::Async,
                    LayoutMode::Sync(_) => PendingLayoutCalculation::Sync,
                };
                slots.schedule_after_measure = slots.schedule_after_measure.max(requested);
                return Scheduled::new(ScheduleOutcome::Deferred, None);
            }
        }

        match mode {
            LayoutMode::Async => {
                self.post_calculate_layout();
                Scheduled::new(ScheduleOutcome::Posted, None)
            }
            LayoutMode::Sync(delivery) => self.calculate_layout(delivery),
        }
    }

    /// Queues one calculation on the layout handler. Requests arriving while
    /// one is queued fold into it; the task reads the state current when it
    /// runs.
    pub(crate) fn post_calculate_layout(self: &Arc<Self>) {
        if self.layout_posted.swap(true, Ordering::AcqRel) {
            log::trace!("tree {} already has a layout queued", self.id);
            return;
        }
        let task = PostedLayout {
            core: Arc::downgrade(self),
            ran: false,
        };
        self.layout_handler.post(Box::new(move || task.run()));
    }

    /// Computes a layout for the current root and size spec and installs it
    /// as the background layout if it is still relevant when done.
    pub(crate) fn calculate_layout(&self, delivery: Delivery) -> Scheduled {
        let (root, width_spec, height_spec, previous, state_handler) = {
            let slots = self.slots.lock();
            if slots.released {
                return Scheduled::new(ScheduleOutcome::Skipped, None);
            }
            let (Some(root), Some(width_spec), Some(height_spec)) =
                (slots.root.as_ref(), slots.width_spec, slots.height_spec)
            else {
                log::trace!("tree {} has no root or size spec to lay out", self.id);
                return Scheduled::new(ScheduleOutcome::Skipped, None);
            };
            if slots.has_compatible_component_and_spec() {
                let size = slots.most_recent_layout().map(|layout| layout.size());
                return Scheduled::new(ScheduleOutcome::Skipped, size);
            }
            let previous = if self.config.layout_diffing {
                slots.main_thread_layout.as_ref().map(LayoutStateRef::acquire_ref)
            } else {
                None
            };
            let state_handler = slots
                .state_handler
                .as_ref()
                .map(StateHandler::snapshot)
                .unwrap_or_default();
            (
                root.make_shallow_copy(),
                width_spec,
                height_spec,
                previous,
                state_handler,
            )
        };

        let layout = self.calculate_layout_state(
            root,
            width_spec,
            height_spec,
            previous.as_deref(),
            state_handler,
            delivery == Delivery::MainThreadQueue,
        );
        let size = layout.size();
        release_all(previous);

        let (to_release, installed) = {
            let mut slots = self.slots.lock();
            // Another computation may have produced a compatible layout, or
            // the root and spec moved on while this one ran.
            let relevant = !slots.released
                && !slots.has_compatible_component_and_spec()
                && slots.is_compatible_component_and_spec(Some(&layout));
            if relevant {
                if let Some(pass) = layout.consume_state_handler() {
                    if let Some(state_handler) = slots.state_handler.as_mut() {
                        state_handler.commit(pass);
                    }
                }
                (slots.background_layout.replace(layout), true)
            } else {
                log::debug!(
                    "tree {} discards stale layout {} for component {}",
                    self.id,
                    layout.id(),
                    layout.component_id()
                );
                (Some(layout), false)
            }
        };
        release_all(to_release);

        if installed && delivery == Delivery::MainThreadQueue {
            self.notify_main_thread(MainThreadMessage::BackgroundLayoutStateUpdated);
        }
        Scheduled::new(ScheduleOutcome::Computed { installed }, Some(size))
    }

    /// Runs the engine. Must be called without the slots lock held.
    pub(crate) fn calculate_layout_state(
        &self,
        root: Component,
        width_spec: SizeSpec,
        height_spec: SizeSpec,
        previous: Option<&LayoutState>,
        state_handler: StateHandler,
        background: bool,
    ) -> LayoutStateRef {
        let _serialized = self.layout_lock.as_ref().map(|lock| lock.lock());
        let diffing = self.config.layout_diffing;
        let component_id = root.id();
        let started = Instant::now();
        let request = LayoutRequest::new(
            root,
            width_spec,
            height_spec,
            diffing,
            previous.filter(|_| diffing),
            state_handler,
        );
        let layout = self.engine.compute(request);
        log::debug!(
            "tree {} laid out component {} at {}x{} in {:?} (background: {}, diffing: {})",
            self.id,
            component_id,
            width_spec,
            height_spec,
            started.elapsed(),
            background,
            diffing
        );
        layout
    }

    pub(crate) fn update_state(
        self: &Arc<Self>,
        key: ComponentKey,
        update: StateUpdate,
        mode: LayoutMode,
    ) -> Scheduled {
        let root = {
            let mut slots = self.slots.lock();
            if slots.released {
                return Scheduled::new(ScheduleOutcome::Skipped, None);
            }
            let Some(root) = slots.root.as_ref().map(Component::make_shallow_copy) else {
                return Scheduled::new(ScheduleOutcome::Skipped, None);
            };
            if let Some(state_handler) = slots.state_handler.as_mut() {
                state_handler.queue_state_update(key, update);
            }
            root
        };
        self.set_root_and_size_spec_internal(Some(root), None, None, mode)
    }

    pub(crate) fn update_state_async(
        self: &Arc<Self>,
        key: ComponentKey,
        update: StateUpdate,
    ) -> Result<(), TreeError> {
        if !self.config.async_state_updates {
            return TreeError::AsyncStateUpdatesDisabled.report();
        }
        self.update_state(key, update, LayoutMode::Async);
        Ok(())
    }
}

/// Whether the requested specs can be served by what the tree already has.
fn specs_are_compatible(
    slots: &TreeSlots,
    width_spec: Option<SizeSpec>,
    height_spec: Option<SizeSpec>,
) -> bool {
    let width_unchanged = width_spec.map_or(true, |spec| Some(spec) == slots.width_spec);
    let height_unchanged = height_spec.map_or(true, |spec| Some(spec) == slots.height_spec);
    if width_unchanged && height_unchanged {
        return true;
    }
    match (
        slots.width_spec,
        slots.height_spec,
        width_spec,
        height_spec,
        slots.most_recent_layout(),
    ) {
        (
            Some(old_width_spec),
            Some(old_height_spec),
            Some(new_width_spec),
            Some(new_height_spec),
            Some(layout),
        ) => size_spec::has_compatible_size_spec(
            old_width_spec,
            old_height_spec,
            new_width_spec,
            new_height_spec,
            layout.width(),
            layout.height(),
        ),
        _ => false,
    }
}
