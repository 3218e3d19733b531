#![allow(dead_code)]

use std::sync::Arc;

use treemount_core::{Component, ComponentTree, ComponentTreeBuilder, Context, SizeSpec};
use treemount_testing::{
    CountingLayoutEngine, FakeHostView, ManualLayoutHandler, RecordingMainThreadScheduler,
};

pub struct Harness {
    pub context: Context,
    pub engine: Arc<CountingLayoutEngine>,
    pub layout_handler: Arc<ManualLayoutHandler>,
    pub scheduler: Arc<RecordingMainThreadScheduler>,
    pub view: FakeHostView,
    pub tree: ComponentTree,
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Tree with a bound, unattached host view and a manually driven layout
/// handler.
pub fn harness() -> Harness {
    harness_with(|builder| builder)
}

pub fn harness_with(configure: impl FnOnce(ComponentTreeBuilder) -> ComponentTreeBuilder) -> Harness {
    init_logging();
    let context = Context::new("activity");
    let engine = CountingLayoutEngine::new();
    let layout_handler = Arc::new(ManualLayoutHandler::new());
    let scheduler = Arc::new(RecordingMainThreadScheduler::new());
    let builder = ComponentTree::create(context.clone(), Component::new("Root", ()).with_key("root"))
        .layout_handler(layout_handler.clone())
        .main_thread_scheduler(scheduler.clone());
    let mut tree = configure(builder).build(engine.clone());
    let view = FakeHostView::new(context.clone());
    tree.set_host_view(Box::new(view.clone()))
        .expect("host view shares the tree context");
    Harness {
        context,
        engine,
        layout_handler,
        scheduler,
        view,
        tree,
    }
}

pub fn exactly(size: i32) -> SizeSpec {
    SizeSpec::exactly(size)
}
