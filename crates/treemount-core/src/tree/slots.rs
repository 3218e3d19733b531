//! Lock-guarded part of a component tree and the dual-buffer arbiter.

use crate::component::Component;
use crate::layout_state::LayoutStateRef;
use crate::size_spec::SizeSpec;
use crate::state_handler::StateHandler;

/// Layout request that arrived while the tree was being measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum PendingLayoutCalculation {
    #[default]
    None,
    Async,
    Sync,
}

/// Everything the main thread and layout threads share. Only ever touched
/// through the tree's mutex.
#[derive(Default)]
pub(crate) struct TreeSlots {
    pub(crate) root: Option<Component>,
    pub(crate) width_spec: Option<SizeSpec>,
    pub(crate) height_spec: Option<SizeSpec>,
    pub(crate) has_view_measure_spec: bool,
    pub(crate) main_thread_layout: Option<LayoutStateRef>,
    // Whoever moves this out must leave `None` behind.
    pub(crate) background_layout: Option<LayoutStateRef>,
    pub(crate) state_handler: Option<StateHandler>,
    pub(crate) is_measuring: bool,
    pub(crate) schedule_after_measure: PendingLayoutCalculation,
    pub(crate) released: bool,
}

/// Outcome of [`TreeSlots::select_best_main_thread_layout`].
#[must_use = "the displaced layout state must be released after unlocking"]
pub(crate) struct Selection {
    pub(crate) to_release: Option<LayoutStateRef>,
    pub(crate) main_thread_layout_changed: bool,
}

impl TreeSlots {
    pub(crate) fn new(root: Component, state_handler: StateHandler) -> Self {
        Self {
            root: Some(root),
            state_handler: Some(state_handler),
            ..Self::default()
        }
    }

    pub(crate) fn has_size_spec(&self) -> bool {
        self.width_spec.is_some() && self.height_spec.is_some()
    }

    pub(crate) fn is_compatible_spec(&self, layout: Option<&LayoutStateRef>) -> bool {
        match (layout, self.width_spec, self.height_spec) {
            (Some(layout), Some(width_spec), Some(height_spec)) => {
                layout.is_compatible_spec(width_spec, height_spec)
            }
            _ => false,
        }
    }

    pub(crate) fn is_compatible_component_and_spec(&self, layout: Option<&LayoutStateRef>) -> bool {
        match (layout, self.root.as_ref()) {
            (Some(layout), Some(root)) => {
                layout.is_component_id(root.id()) && self.is_compatible_spec(Some(layout))
            }
            _ => false,
        }
    }

    /// Whether either slot already holds a layout for the current root and
    /// size spec.
    pub(crate) fn has_compatible_component_and_spec(&self) -> bool {
        self.is_compatible_component_and_spec(self.main_thread_layout.as_ref())
            || self.is_compatible_component_and_spec(self.background_layout.as_ref())
    }

    /// Most recent result, used to answer size queries without computing.
    pub(crate) fn most_recent_layout(&self) -> Option<&LayoutStateRef> {
        self.background_layout
            .as_ref()
            .or(self.main_thread_layout.as_ref())
    }

    /// Picks the layout that becomes authoritative on the main thread and
    /// hands back the one it displaced.
    pub(crate) fn select_best_main_thread_layout(&mut self) -> Selection {
        let keep_main_thread_layout =
            if self.is_compatible_component_and_spec(self.main_thread_layout.as_ref()) {
                // A perfect match means nothing needs to be remounted.
                true
            } else if self.is_compatible_spec(self.background_layout.as_ref())
                || !self.is_compatible_spec(self.main_thread_layout.as_ref())
            {
                // The background result was created more recently.
                false
            } else {
                // Still the right size. Swapping in an incompatible background
                // layout would force a main-thread relayout.
                true
            };

        if keep_main_thread_layout {
            log::trace!("arbiter keeps the main thread layout");
            Selection {
                to_release: self.background_layout.take(),
                main_thread_layout_changed: false,
            }
        } else {
            let promoted = self.background_layout.take();
            let changed = match (self.main_thread_layout.as_ref(), promoted.as_ref()) {
                (Some(current), Some(promoted)) => !LayoutStateRef::ptr_eq(current, promoted),
                (None, None) => false,
                _ => true,
            };
            log::trace!("arbiter promotes the background layout (changed: {changed})");
            Selection {
                to_release: std::mem::replace(&mut self.main_thread_layout, promoted),
                main_thread_layout_changed: changed,
            }
        }
    }

    /// Empties both layout slots, for release outside the lock.
    pub(crate) fn take_layouts(&mut self) -> Vec<LayoutStateRef> {
        self.main_thread_layout
            .take()
            .into_iter()
            .chain(self.background_layout.take())
            .collect()
    }
}
