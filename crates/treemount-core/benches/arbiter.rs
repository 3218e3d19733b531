use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use treemount_core::{Component, ComponentTree, Context, SizeSpec};
use treemount_testing::{CountingLayoutEngine, FakeHostView, ManualLayoutHandler};

const ROW_SAMPLES: &[usize] = &[0, 16, 64, 256];
const VIEW_SIZE: i32 = 1080;

struct Fixture {
    tree: ComponentTree,
    view: FakeHostView,
    layout_handler: Arc<ManualLayoutHandler>,
}

impl Fixture {
    fn new(rows: usize) -> Self {
        let context = Context::new("bench");
        let engine = CountingLayoutEngine::new();
        engine.set_rows(rows);
        let layout_handler = Arc::new(ManualLayoutHandler::new());
        let mut tree = ComponentTree::create(context.clone(), Component::new("Root", ()))
            .layout_handler(layout_handler.clone())
            .build(engine);
        let view = FakeHostView::new(context);
        view.set_measured_size(VIEW_SIZE, VIEW_SIZE);
        tree.set_host_view(Box::new(view.clone()))
            .expect("bench view shares the tree context");
        tree.attach().expect("attach");
        Self {
            tree,
            view,
            layout_handler,
        }
    }

    fn spec() -> SizeSpec {
        SizeSpec::exactly(VIEW_SIZE)
    }
}

fn bench_measure_reuse(c: &mut Criterion) {
    let mut fixture = Fixture::new(64);
    fixture.tree.measure(Fixture::spec(), Fixture::spec(), false);

    c.bench_function("measure_compatible_layout", |b| {
        b.iter(|| {
            black_box(
                fixture
                    .tree
                    .measure(black_box(Fixture::spec()), black_box(Fixture::spec()), false),
            );
        });
    });
}

fn bench_forced_measure_and_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("forced_measure_and_mount");
    for &rows in ROW_SAMPLES {
        let mut fixture = Fixture::new(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                fixture.tree.measure(Fixture::spec(), Fixture::spec(), true);
                black_box(fixture.tree.layout());
            });
        });
        black_box(fixture.view.mount_count());
    }
    group.finish();
}

fn bench_background_promotion(c: &mut Criterion) {
    let mut fixture = Fixture::new(64);
    fixture.tree.measure(Fixture::spec(), Fixture::spec(), false);

    c.bench_function("background_layout_promotion", |b| {
        b.iter(|| {
            fixture.tree.set_root_async(Component::new("Root", ()));
            fixture.layout_handler.run_pending();
            black_box(fixture.tree.process_main_thread_messages());
        });
    });
}

criterion_group!(
    benches,
    bench_measure_reuse,
    bench_forced_measure_and_mount,
    bench_background_promotion
);
criterion_main!(benches);
