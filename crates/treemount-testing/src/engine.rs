use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use treemount_core::{
    Component, ComponentId, LayoutEngine, LayoutRequest, LayoutStateProbe, LayoutStateRef,
    RenderNode, SizeSpec,
};
use treemount_graphics::{Rect, Size};

type ComputeHook = Arc<dyn Fn(&Component) + Send + Sync>;

/// What a [`CountingLayoutEngine`] was asked to compute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub component_id: ComponentId,
    pub width_spec: SizeSpec,
    pub height_spec: SizeSpec,
    pub diffing_enabled: bool,
    pub had_previous: bool,
    pub thread_name: Option<String>,
}

/// Layout engine that sizes the root to its specs and counts its work.
///
/// The root gets `rows` children stacked vertically, each `row_height` tall.
/// Pending state updates of the root's key are applied on every pass.
pub struct CountingLayoutEngine {
    preferred: Mutex<Size>,
    rows: AtomicUsize,
    row_height: i32,
    computed: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
    produced: Mutex<Vec<LayoutStateProbe>>,
    on_compute: Mutex<Option<ComputeHook>>,
}

impl CountingLayoutEngine {
    pub const DEFAULT_ROW_HEIGHT: i32 = 10;

    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            preferred: Mutex::new(Size::ZERO),
            rows: AtomicUsize::new(0),
            row_height: Self::DEFAULT_ROW_HEIGHT,
            computed: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            produced: Mutex::new(Vec::new()),
            on_compute: Mutex::new(None),
        })
    }

    /// Size requested from non-exact specs.
    pub fn set_preferred_size(&self, width: i32, height: i32) {
        *self.preferred.lock() = Size::new(width, height);
    }

    pub fn set_rows(&self, rows: usize) {
        self.rows.store(rows, Ordering::SeqCst);
    }

    /// Runs `hook` with the root at the start of every computation.
    pub fn set_on_compute(&self, hook: impl Fn(&Component) + Send + Sync + 'static) {
        *self.on_compute.lock() = Some(Arc::new(hook));
    }

    pub fn compute_count(&self) -> usize {
        self.computed.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Observers for every layout state this engine produced, oldest first.
    pub fn produced(&self) -> Vec<LayoutStateProbe> {
        self.produced.lock().clone()
    }

    /// Layout states still holding at least one reference.
    pub fn live_layout_states(&self) -> Vec<LayoutStateProbe> {
        self.produced
            .lock()
            .iter()
            .filter(|probe| !probe.is_released())
            .cloned()
            .collect()
    }

    fn render_tree(&self, root: ComponentId, size: Size) -> RenderNode {
        let rows = self.rows.load(Ordering::SeqCst);
        let children = (0..rows)
            .map(|index| {
                let top = index as i32 * self.row_height;
                RenderNode::new(
                    Self::row_id(root, index),
                    Rect::new(0, top, size.width, top + self.row_height),
                    Vec::new(),
                )
            })
            .collect();
        RenderNode::new(root, Rect::new(0, 0, size.width, size.height), children)
    }

    /// Component id the engine gives row `index` of `root`.
    pub fn row_id(root: ComponentId, index: usize) -> ComponentId {
        root * 1_000 + index as ComponentId + 1
    }
}

impl LayoutEngine for CountingLayoutEngine {
    fn compute(&self, mut request: LayoutRequest<'_>) -> LayoutStateRef {
        let hook = self.on_compute.lock().clone();
        if let Some(hook) = hook {
            hook(request.root());
        }
        self.computed.fetch_add(1, Ordering::SeqCst);

        let root = request.root().clone();
        self.requests.lock().push(RecordedRequest {
            component_id: root.id(),
            width_spec: request.width_spec(),
            height_spec: request.height_spec(),
            diffing_enabled: request.diffing_enabled(),
            had_previous: request.previous().is_some(),
            thread_name: std::thread::current().name().map(str::to_owned),
        });

        request.state_handler_mut().apply_pending_updates(root.key());

        let preferred = *self.preferred.lock();
        let size = Size::new(
            request.width_spec().resolve(preferred.width),
            request.height_spec().resolve(preferred.height),
        );
        let render_tree = self.render_tree(root.id(), size);
        let layout = request.finish(size, Some(render_tree));
        self.produced.lock().push(layout.probe());
        layout
    }
}

impl fmt::Debug for CountingLayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingLayoutEngine")
            .field("computed", &self.compute_count())
            .field("preferred", &*self.preferred.lock())
            .finish()
    }
}
