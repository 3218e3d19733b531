use treemount_graphics::Rect;

use super::ComponentTree;
use crate::error::TreeError;
use crate::layout_state::LayoutStateRef;

impl ComponentTree {
    /// Mounts the main thread layout if the host view is dirty. Returns
    /// whether anything was mounted.
    pub fn layout(&mut self) -> bool {
        self.mount_if_dirty()
    }

    /// Mounts only what intersects the host view's visible area.
    pub fn incremental_mount_component(&mut self) -> Result<(), TreeError> {
        if !self.core.config.incremental_mount {
            return TreeError::IncrementalMountDisabled.report();
        }
        self.mount_visible();
        Ok(())
    }

    /// The part of the host view visible inside its parent, in the host's
    /// own coordinates. `None` without a host view or when nothing shows.
    pub fn visible_rect(&self) -> Option<Rect> {
        let view = self.host_view.as_ref()?;
        let location = view.location_on_screen();
        let mut visible = view.bounds_on_screen();
        if let Some(parent) = view.parent_bounds_on_screen() {
            visible = visible.intersect(&parent)?;
        }
        Some(visible.offset(-location.x, -location.y))
    }

    pub(crate) fn mount_if_dirty(&mut self) -> bool {
        let dirty = self
            .host_view
            .as_ref()
            .is_some_and(|view| view.is_mount_state_dirty());
        if !dirty {
            return false;
        }
        if self.core.config.incremental_mount {
            self.mount_visible();
        } else {
            self.mount_component(None);
        }
        true
    }

    fn mount_visible(&mut self) {
        match self.visible_rect() {
            Some(visible) => self.mount_component(Some(visible)),
            None => log::debug!("tree {} has no visible area, skipping mount", self.core.id),
        }
    }

    fn mount_component(&mut self, visible_rect: Option<Rect>) {
        let layout = self
            .core
            .slots
            .lock()
            .main_thread_layout
            .as_ref()
            .map(LayoutStateRef::acquire_ref);
        let Some(layout) = layout else {
            log::debug!("tree {} has no layout to mount", self.core.id);
            return;
        };
        if let Some(view) = self.host_view.as_mut() {
            self.is_mounting = true;
            view.mount(&layout, visible_rect);
            self.is_mounting = false;
        }
        layout.release_ref();
    }
}
