//! Host view binding, attachment and measurement.

use treemount_graphics::Size;

use super::scheduler::Delivery;
use super::slots::PendingLayoutCalculation;
use super::{release_all, ComponentTree};
use crate::component::{Component, ComponentId};
use crate::error::TreeError;
use crate::host::HostView;
use crate::size_spec::SizeSpec;
use crate::state_handler::StateHandler;

/// Result of reconciling the two layout slots on the main thread.
struct Reconciled {
    main_thread_layout_changed: bool,
    root_id: ComponentId,
}

fn mark_mount_state_dirty(host_view: &mut Option<Box<dyn HostView>>) {
    if let Some(view) = host_view.as_mut() {
        view.set_mount_state_dirty();
    }
}

impl ComponentTree {
    /// Binds `view` as the host of this tree.
    ///
    /// The view must share this tree's base context. A view replaced while
    /// the tree is attached is detached from it; otherwise it only loses its
    /// reference to the tree.
    pub fn set_host_view(&mut self, view: Box<dyn HostView>) -> Result<(), TreeError> {
        if !view.context().has_same_base_context(&self.core.context) {
            return TreeError::ContextMismatch {
                view: view.context().to_string(),
                tree: self.core.context.to_string(),
            }
            .report();
        }

        if self.is_attached {
            if let Some(previous) = self.host_view.as_mut() {
                previous.detach_component_tree();
            }
            self.detach();
        } else if let Some(previous) = self.host_view.as_mut() {
            previous.clear_component_tree();
        }
        self.host_view = Some(view);
        Ok(())
    }

    /// Unbinds the host view and hands it back.
    pub fn clear_host_view(&mut self) -> Result<Option<Box<dyn HostView>>, TreeError> {
        if self.is_attached {
            return TreeError::ClearHostViewWhileAttached {
                tree: self.core.id,
            }
            .report();
        }
        Ok(self.host_view.take())
    }

    pub fn attach(&mut self) -> Result<(), TreeError> {
        if self.host_view.is_none() {
            return TreeError::AttachWithoutHostView {
                tree: self.core.id,
            }
            .report();
        }
        self.is_attached = true;

        let Some(reconciled) = self.reconcile_layouts() else {
            return Ok(());
        };
        let Some(view) = self.host_view.as_mut() else {
            return Ok(());
        };
        let measured = view.measured_size();
        if measured.is_zero() {
            // Mounting waits for the first measure.
            return Ok(());
        }

        let needs_layout = !self.core_has_layout_for_size(reconciled.root_id, measured);
        let Some(view) = self.host_view.as_mut() else {
            return Ok(());
        };
        if needs_layout || view.is_mount_state_dirty() {
            view.request_layout();
        } else {
            view.rebind();
        }
        Ok(())
    }

    /// Marks the tree detached. Layout results are kept for the next attach.
    pub fn detach(&mut self) {
        self.core.slots.lock().has_view_measure_spec = false;
        self.is_attached = false;
    }

    /// Lays the tree out for the host view's measure pass and returns the
    /// resulting size.
    ///
    /// The size spec is owned by the host view from here until it detaches.
    /// When no existing layout fits, or `force_layout` is set, the layout is
    /// computed on this thread.
    pub fn measure(&mut self, width_spec: SizeSpec, height_spec: SizeSpec, force_layout: bool) -> Size {
        let (to_release, stale, pass) = {
            let mut slots = self.core.slots.lock();
            if slots.released {
                return Size::ZERO;
            }
            slots.is_measuring = true;
            slots.width_spec = Some(width_spec);
            slots.height_spec = Some(height_spec);
            slots.has_view_measure_spec = true;

            let selection = slots.select_best_main_thread_layout();
            if selection.main_thread_layout_changed {
                mark_mount_state_dirty(&mut self.host_view);
            }

            let needs_layout = force_layout
                || !slots.is_compatible_component_and_spec(slots.main_thread_layout.as_ref());
            let pass = match slots.root.as_ref() {
                Some(root) if needs_layout => Some((
                    root.make_shallow_copy(),
                    slots
                        .state_handler
                        .as_ref()
                        .map(StateHandler::snapshot)
                        .unwrap_or_default(),
                )),
                _ => None,
            };
            // The old result goes before the new one is built.
            let stale = if pass.is_some() {
                slots.main_thread_layout.take()
            } else {
                None
            };
            (selection.to_release, stale, pass)
        };
        release_all(to_release.into_iter().chain(stale));

        if let Some((root, state_handler)) = pass {
            let layout = self.core.calculate_layout_state(
                root,
                width_spec,
                height_spec,
                None,
                state_handler,
                false,
            );
            let replaced = {
                let mut slots = self.core.slots.lock();
                if let Some(pass) = layout.consume_state_handler() {
                    if let Some(state_handler) = slots.state_handler.as_mut() {
                        state_handler.commit(pass);
                    }
                }
                slots.main_thread_layout.replace(layout)
            };
            release_all(replaced);
            mark_mount_state_dirty(&mut self.host_view);
        }

        let (size, deferred) = {
            let mut slots = self.core.slots.lock();
            slots.is_measuring = false;
            let size = slots
                .main_thread_layout
                .as_ref()
                .map_or(Size::ZERO, |layout| layout.size());
            let deferred = std::mem::take(&mut slots.schedule_after_measure);
            // Requests recorded during the measure already updated the root
            // and spec. They only need running if the measured layout does
            // not cover them.
            let deferred = if slots.root.is_some() && !slots.has_compatible_component_and_spec() {
                deferred
            } else {
                PendingLayoutCalculation::None
            };
            (size, deferred)
        };

        match deferred {
            PendingLayoutCalculation::None => {}
            PendingLayoutCalculation::Async => self.core.post_calculate_layout(),
            PendingLayoutCalculation::Sync => {
                if self.core.calculate_layout(Delivery::Caller).installed() {
                    self.background_layout_state_updated();
                }
            }
        }
        size
    }

    /// Reconciles a freshly installed background layout with what is mounted.
    pub(crate) fn background_layout_state_updated(&mut self) {
        if !self.is_attached {
            // Handled by the next attach.
            return;
        }
        let Some(reconciled) = self.reconcile_layouts() else {
            return;
        };
        if !reconciled.main_thread_layout_changed {
            return;
        }
        let Some(view) = self.host_view.as_ref() else {
            return;
        };
        let measured = view.measured_size();
        if measured.is_zero() {
            return;
        }

        if self.core_has_layout_for_size(reconciled.root_id, measured) {
            self.mount_if_dirty();
        } else if let Some(view) = self.host_view.as_mut() {
            view.request_layout();
        }
    }

    /// Runs the arbiter and releases the layout it displaced. `None` when
    /// the tree has been released.
    fn reconcile_layouts(&mut self) -> Option<Reconciled> {
        let (selection, root_id) = {
            let mut slots = self.core.slots.lock();
            let root_id = slots.root.as_ref().map(Component::id)?;
            let selection = slots.select_best_main_thread_layout();
            if selection.main_thread_layout_changed {
                mark_mount_state_dirty(&mut self.host_view);
            }
            (selection, root_id)
        };
        let main_thread_layout_changed = selection.main_thread_layout_changed;
        release_all(selection.to_release);
        Some(Reconciled {
            main_thread_layout_changed,
            root_id,
        })
    }

    fn core_has_layout_for_size(&self, root_id: ComponentId, size: Size) -> bool {
        self.core
            .slots
            .lock()
            .main_thread_layout
            .as_ref()
            .is_some_and(|layout| {
                layout.is_component_id(root_id) && layout.is_compatible_size(size.width, size.height)
            })
    }
}
