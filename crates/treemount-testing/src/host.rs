use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use treemount_core::{ComponentId, Context, HostView, LayoutState, LayoutStateId};
use treemount_graphics::{Point, Rect, Size};

/// One call to [`HostView::mount`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountRecord {
    pub layout_state_id: LayoutStateId,
    pub component_id: ComponentId,
    pub visible_rect: Option<Rect>,
    /// Render nodes that intersected the visible rect, parents first.
    pub mounted: Vec<ComponentId>,
}

#[derive(Default)]
struct FakeHostState {
    measured: Size,
    location: Point,
    size: Size,
    parent_bounds: Option<Rect>,
    mount_state_dirty: bool,
    mounts: Vec<MountRecord>,
    rebinds: usize,
    layout_requests: usize,
    clears: usize,
    detaches: usize,
}

/// Host view that records what the tree asks of it.
///
/// Clones share their state, so a test keeps one clone and hands another to
/// the tree.
#[derive(Clone)]
pub struct FakeHostView {
    context: Context,
    state: Rc<RefCell<FakeHostState>>,
}

impl FakeHostView {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            state: Rc::new(RefCell::new(FakeHostState::default())),
        }
    }

    /// Sets the measured size and lays the view out at that size.
    pub fn set_measured_size(&self, width: i32, height: i32) {
        let mut state = self.state.borrow_mut();
        state.measured = Size::new(width, height);
        state.size = Size::new(width, height);
    }

    pub fn set_location_on_screen(&self, x: i32, y: i32) {
        self.state.borrow_mut().location = Point::new(x, y);
    }

    pub fn set_size(&self, width: i32, height: i32) {
        self.state.borrow_mut().size = Size::new(width, height);
    }

    /// `None` models a parent that is not a view.
    pub fn set_parent_bounds_on_screen(&self, bounds: Option<Rect>) {
        self.state.borrow_mut().parent_bounds = bounds;
    }

    pub fn mark_mount_state_dirty(&self) {
        self.state.borrow_mut().mount_state_dirty = true;
    }

    pub fn mount_state_dirty(&self) -> bool {
        self.state.borrow().mount_state_dirty
    }

    pub fn mount_count(&self) -> usize {
        self.state.borrow().mounts.len()
    }

    pub fn mounts(&self) -> Vec<MountRecord> {
        self.state.borrow().mounts.clone()
    }

    pub fn last_mount(&self) -> Option<MountRecord> {
        self.state.borrow().mounts.last().cloned()
    }

    pub fn rebind_count(&self) -> usize {
        self.state.borrow().rebinds
    }

    pub fn layout_request_count(&self) -> usize {
        self.state.borrow().layout_requests
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clears
    }

    pub fn detach_count(&self) -> usize {
        self.state.borrow().detaches
    }
}

impl HostView for FakeHostView {
    fn context(&self) -> &Context {
        &self.context
    }

    fn measured_width(&self) -> i32 {
        self.state.borrow().measured.width
    }

    fn measured_height(&self) -> i32 {
        self.state.borrow().measured.height
    }

    fn is_mount_state_dirty(&self) -> bool {
        self.state.borrow().mount_state_dirty
    }

    fn set_mount_state_dirty(&mut self) {
        self.mark_mount_state_dirty();
    }

    fn mount(&mut self, layout_state: &LayoutState, visible_rect: Option<Rect>) {
        let mut mounted = Vec::new();
        if let Some(render_tree) = layout_state.render_tree() {
            render_tree.for_each_visible(visible_rect, &mut |node| mounted.push(node.component_id));
        }
        let mut state = self.state.borrow_mut();
        state.mounts.push(MountRecord {
            layout_state_id: layout_state.id(),
            component_id: layout_state.component_id(),
            visible_rect,
            mounted,
        });
        state.mount_state_dirty = false;
    }

    fn rebind(&mut self) {
        self.state.borrow_mut().rebinds += 1;
    }

    fn request_layout(&mut self) {
        self.state.borrow_mut().layout_requests += 1;
    }

    fn location_on_screen(&self) -> Point {
        self.state.borrow().location
    }

    fn width(&self) -> i32 {
        self.state.borrow().size.width
    }

    fn height(&self) -> i32 {
        self.state.borrow().size.height
    }

    fn parent_bounds_on_screen(&self) -> Option<Rect> {
        self.state.borrow().parent_bounds
    }

    fn clear_component_tree(&mut self) {
        self.state.borrow_mut().clears += 1;
    }

    fn detach_component_tree(&mut self) {
        self.state.borrow_mut().detaches += 1;
    }
}

impl fmt::Debug for FakeHostView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FakeHostView")
            .field("context", &self.context)
            .field("measured", &state.measured)
            .field("dirty", &state.mount_state_dirty)
            .field("mounts", &state.mounts.len())
            .finish()
    }
}
