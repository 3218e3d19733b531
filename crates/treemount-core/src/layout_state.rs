//! Results of layout passes and their explicit reference counting.
//!
//! A [`LayoutState`] is shared between the main-thread slot, the background
//! slot and in-flight computations. Every holder owns one [`LayoutStateRef`]
//! and gives it back with [`LayoutStateRef::release_ref`]; the render tree
//! and the captured state handler are freed when the last reference goes.
//! Dropping a reference without releasing it leaks the count.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use treemount_graphics::{Rect, Size};

use crate::component::ComponentId;
use crate::size_spec::{self, SizeSpec};
use crate::state_handler::StateHandler;

pub type LayoutStateId = u64;

static NEXT_LAYOUT_STATE_ID: AtomicU64 = AtomicU64::new(1);

/// Positioned node of a computed layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderNode {
    pub component_id: ComponentId,
    pub bounds: Rect,
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(component_id: ComponentId, bounds: Rect, children: Vec<RenderNode>) -> Self {
        Self {
            component_id,
            bounds,
            children,
        }
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RenderNode::count).sum::<usize>()
    }

    /// Visits the nodes whose bounds intersect `visible`, parents first.
    /// `None` visits everything. Children of an invisible node are still
    /// visited since they may overflow their parent.
    pub fn for_each_visible(&self, visible: Option<Rect>, f: &mut impl FnMut(&RenderNode)) {
        if visible.map_or(true, |rect| self.bounds.intersects(&rect)) {
            f(self);
        }
        for child in &self.children {
            child.for_each_visible(visible, f);
        }
    }
}

pub struct LayoutState {
    id: LayoutStateId,
    component_id: ComponentId,
    width_spec: SizeSpec,
    height_spec: SizeSpec,
    size: Size,
    render_tree: Mutex<Option<Arc<RenderNode>>>,
    state_handler: Mutex<Option<StateHandler>>,
}

impl LayoutState {
    pub fn builder(
        component_id: ComponentId,
        width_spec: SizeSpec,
        height_spec: SizeSpec,
    ) -> LayoutStateBuilder {
        LayoutStateBuilder {
            component_id,
            width_spec,
            height_spec,
            size: Size::ZERO,
            render_tree: None,
            state_handler: None,
        }
    }

    pub fn id(&self) -> LayoutStateId {
        self.id
    }

    pub fn component_id(&self) -> ComponentId {
        self.component_id
    }

    pub fn width_spec(&self) -> SizeSpec {
        self.width_spec
    }

    pub fn height_spec(&self) -> SizeSpec {
        self.height_spec
    }

    pub fn width(&self) -> i32 {
        self.size.width
    }

    pub fn height(&self) -> i32 {
        self.size.height
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// The positioned tree, or `None` once the state has been freed.
    pub fn render_tree(&self) -> Option<Arc<RenderNode>> {
        self.render_tree.lock().clone()
    }

    /// Takes the state handler captured by the layout pass. Only the first
    /// caller gets it.
    pub fn consume_state_handler(&self) -> Option<StateHandler> {
        self.state_handler.lock().take()
    }

    pub fn is_component_id(&self, component_id: ComponentId) -> bool {
        self.component_id == component_id
    }

    pub fn is_compatible_spec(&self, width_spec: SizeSpec, height_spec: SizeSpec) -> bool {
        size_spec::is_compatible(self.width_spec, width_spec, self.size.width)
            && size_spec::is_compatible(self.height_spec, height_spec, self.size.height)
    }

    pub fn is_compatible_component_and_spec(
        &self,
        component_id: ComponentId,
        width_spec: SizeSpec,
        height_spec: SizeSpec,
    ) -> bool {
        self.is_component_id(component_id) && self.is_compatible_spec(width_spec, height_spec)
    }

    pub fn is_compatible_size(&self, width: i32, height: i32) -> bool {
        self.size.width == width && self.size.height == height
    }

    fn free(&self) {
        self.render_tree.lock().take();
        self.state_handler.lock().take();
    }
}

impl fmt::Debug for LayoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutState")
            .field("id", &self.id)
            .field("component_id", &self.component_id)
            .field("width_spec", &self.width_spec)
            .field("height_spec", &self.height_spec)
            .field("size", &self.size)
            .finish()
    }
}

pub struct LayoutStateBuilder {
    component_id: ComponentId,
    width_spec: SizeSpec,
    height_spec: SizeSpec,
    size: Size,
    render_tree: Option<RenderNode>,
    state_handler: Option<StateHandler>,
}

impl LayoutStateBuilder {
    pub fn size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn render_tree(mut self, root: RenderNode) -> Self {
        self.render_tree = Some(root);
        self
    }

    pub fn state_handler(mut self, state_handler: StateHandler) -> Self {
        self.state_handler = Some(state_handler);
        self
    }

    /// Builds the state and hands out its first reference.
    pub fn build(self) -> LayoutStateRef {
        let state = LayoutState {
            id: NEXT_LAYOUT_STATE_ID.fetch_add(1, Ordering::Relaxed),
            component_id: self.component_id,
            width_spec: self.width_spec,
            height_spec: self.height_spec,
            size: self.size,
            render_tree: Mutex::new(self.render_tree.map(Arc::new)),
            state_handler: Mutex::new(self.state_handler),
        };
        LayoutStateRef {
            inner: Arc::new(Counted {
                state,
                ref_count: AtomicUsize::new(1),
                freed: AtomicBool::new(false),
            }),
            released: false,
        }
    }
}

struct Counted {
    state: LayoutState,
    ref_count: AtomicUsize,
    freed: AtomicBool,
}

/// One counted reference to a [`LayoutState`].
#[must_use = "layout state references must be released with `release_ref`"]
pub struct LayoutStateRef {
    inner: Arc<Counted>,
    released: bool,
}

impl LayoutStateRef {
    /// Registers a new holder.
    pub fn acquire_ref(&self) -> LayoutStateRef {
        let previous = self.inner.ref_count.fetch_add(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "acquired a reference to a freed layout state");
        LayoutStateRef {
            inner: Arc::clone(&self.inner),
            released: false,
        }
    }

    /// Gives this holder's reference back, freeing the state when it was the
    /// last one.
    pub fn release_ref(mut self) {
        self.released = true;
        let previous = self
            .inner
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1));
        match previous {
            Ok(1) => {
                self.inner.freed.store(true, Ordering::Release);
                self.inner.state.free();
            }
            Ok(_) => {}
            Err(_) => panic!(
                "layout state {} released more than once",
                self.inner.state.id
            ),
        }
    }

    pub fn ref_count(&self) -> usize {
        self.inner.ref_count.load(Ordering::Acquire)
    }

    pub fn ptr_eq(a: &LayoutStateRef, b: &LayoutStateRef) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Uncounted observer, for tests and diagnostics.
    pub fn probe(&self) -> LayoutStateProbe {
        LayoutStateProbe {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::ops::Deref for LayoutStateRef {
    type Target = LayoutState;

    fn deref(&self) -> &LayoutState {
        &self.inner.state
    }
}

impl fmt::Debug for LayoutStateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutStateRef")
            .field("state", &self.inner.state)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

impl Drop for LayoutStateRef {
    fn drop(&mut self) {
        if !self.released && cfg!(debug_assertions) && !std::thread::panicking() {
            log::warn!(
                "layout state {} reference dropped without release_ref",
                self.inner.state.id
            );
        }
    }
}

/// Observes a layout state's reference count without holding a reference.
#[derive(Clone)]
pub struct LayoutStateProbe {
    inner: Arc<Counted>,
}

impl LayoutStateProbe {
    pub fn id(&self) -> LayoutStateId {
        self.inner.state.id
    }

    pub fn component_id(&self) -> ComponentId {
        self.inner.state.component_id
    }

    pub fn ref_count(&self) -> usize {
        self.inner.ref_count.load(Ordering::Acquire)
    }

    pub fn is_released(&self) -> bool {
        self.inner.freed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for LayoutStateProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutStateProbe")
            .field("id", &self.id())
            .field("ref_count", &self.ref_count())
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKey;
    use crate::state_handler::StateUpdate;

    fn layout(component_id: ComponentId, width: i32, height: i32) -> LayoutStateRef {
        LayoutState::builder(component_id, SizeSpec::exactly(width), SizeSpec::exactly(height))
            .size(Size::new(width, height))
            .render_tree(RenderNode::new(
                component_id,
                Rect::new(0, 0, width, height),
                Vec::new(),
            ))
            .build()
    }

    #[test]
    fn last_release_frees_the_state() {
        let first = layout(1, 100, 200);
        let probe = first.probe();
        let second = first.acquire_ref();
        assert_eq!(probe.ref_count(), 2);

        first.release_ref();
        assert!(!probe.is_released());
        assert!(second.render_tree().is_some());

        second.release_ref();
        assert!(probe.is_released());
        assert_eq!(probe.ref_count(), 0);
    }

    #[test]
    fn freeing_drops_render_tree_and_state_handler() {
        let mut handler = StateHandler::new();
        handler.queue_state_update(ComponentKey::new("k"), StateUpdate::set(1u8));
        let state = LayoutState::builder(3, SizeSpec::exactly(1), SizeSpec::exactly(1))
            .render_tree(RenderNode::new(3, Rect::new(0, 0, 1, 1), Vec::new()))
            .state_handler(handler)
            .build();
        let probe = state.probe();

        state.release_ref();

        assert!(probe.inner.state.render_tree().is_none());
        assert!(probe.inner.state.consume_state_handler().is_none());
    }

    #[test]
    #[should_panic(expected = "released more than once")]
    fn releasing_a_freed_state_panics() {
        let state = layout(1, 10, 10);
        let probe = state.probe();
        let stray = LayoutStateRef {
            inner: Arc::clone(&probe.inner),
            released: false,
        };
        state.release_ref();
        stray.release_ref();
    }

    #[test]
    fn state_handler_is_consumed_once() {
        let state = LayoutState::builder(1, SizeSpec::exactly(1), SizeSpec::exactly(1))
            .state_handler(StateHandler::new())
            .build();

        assert!(state.consume_state_handler().is_some());
        assert!(state.consume_state_handler().is_none());
        state.release_ref();
    }

    #[test]
    fn compatibility_checks_component_and_specs() {
        let state = layout(5, 100, 200);

        assert!(state.is_compatible_component_and_spec(
            5,
            SizeSpec::exactly(100),
            SizeSpec::exactly(200)
        ));
        assert!(!state.is_compatible_component_and_spec(
            6,
            SizeSpec::exactly(100),
            SizeSpec::exactly(200)
        ));
        assert!(!state.is_compatible_spec(SizeSpec::at_most(300), SizeSpec::exactly(200)));
        assert!(state.is_compatible_size(100, 200));
        assert!(!state.is_compatible_size(100, 199));
        state.release_ref();
    }

    #[test]
    fn visible_nodes_are_filtered_by_rect() {
        let root = RenderNode::new(
            1,
            Rect::new(0, 0, 100, 100),
            vec![
                RenderNode::new(2, Rect::new(0, 0, 100, 40), Vec::new()),
                RenderNode::new(3, Rect::new(0, 60, 100, 100), Vec::new()),
            ],
        );

        let mut visible = Vec::new();
        root.for_each_visible(Some(Rect::new(0, 0, 100, 50)), &mut |node| {
            visible.push(node.component_id)
        });
        assert_eq!(visible, vec![1, 2]);

        let mut all = Vec::new();
        root.for_each_visible(None, &mut |node| all.push(node.component_id));
        assert_eq!(all, vec![1, 2, 3]);
        assert_eq!(root.count(), 3);
    }
}
