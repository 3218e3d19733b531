mod common;

use treemount_core::TreeError;
use treemount_graphics::Rect;
use treemount_testing::CountingLayoutEngine;

use common::{exactly, harness, harness_with};

#[test]
fn visible_rect_is_clipped_by_a_view_parent() {
    let h = harness();
    h.view.set_location_on_screen(10, 10);
    h.view.set_size(100, 100);
    h.view.set_parent_bounds_on_screen(Some(Rect::new(0, 0, 50, 50)));

    assert_eq!(h.tree.visible_rect(), Some(Rect::new(0, 0, 40, 40)));
}

#[test]
fn visible_rect_without_a_view_parent_is_the_whole_view() {
    let h = harness();
    h.view.set_location_on_screen(10, 10);
    h.view.set_size(100, 100);

    assert_eq!(h.tree.visible_rect(), Some(Rect::new(0, 0, 100, 100)));
}

#[test]
fn nothing_is_mounted_outside_the_parent() {
    let mut h = harness();
    h.tree.measure(exactly(100), exactly(100), false);
    h.view.set_location_on_screen(200, 200);
    h.view.set_size(100, 100);
    h.view.set_parent_bounds_on_screen(Some(Rect::new(0, 0, 50, 50)));

    assert_eq!(h.tree.visible_rect(), None);
    h.tree.incremental_mount_component().expect("enabled");

    assert_eq!(h.view.mount_count(), 0);
}

#[test]
fn incremental_mount_only_mounts_visible_rows() {
    let mut h = harness();
    h.engine.set_rows(10);
    h.view.set_measured_size(100, 100);
    h.view.set_parent_bounds_on_screen(Some(Rect::new(0, 0, 100, 30)));
    h.tree.measure(exactly(100), exactly(100), false);
    let root = h.tree.root().expect("root").id();

    assert!(h.tree.layout());

    let mount = h.view.last_mount().expect("mounted");
    assert_eq!(mount.visible_rect, Some(Rect::new(0, 0, 100, 30)));
    assert_eq!(
        mount.mounted,
        vec![
            root,
            CountingLayoutEngine::row_id(root, 0),
            CountingLayoutEngine::row_id(root, 1),
            CountingLayoutEngine::row_id(root, 2),
        ]
    );
}

#[test]
fn layout_is_a_no_op_when_the_view_is_clean() {
    let mut h = harness();
    h.view.set_measured_size(100, 100);
    h.tree.measure(exactly(100), exactly(100), false);

    assert!(h.tree.layout());
    assert!(!h.tree.layout());
    assert_eq!(h.view.mount_count(), 1);
    assert!(!h.tree.is_mounting());
}

#[test]
fn disabled_incremental_mount_mounts_everything() {
    let mut h = harness_with(|builder| builder.incremental_mount(false));
    h.engine.set_rows(20);
    h.view.set_measured_size(100, 100);
    h.view.set_parent_bounds_on_screen(Some(Rect::new(0, 0, 10, 10)));
    h.tree.measure(exactly(100), exactly(100), false);

    assert!(h.tree.layout());

    let mount = h.view.last_mount().expect("mounted");
    assert_eq!(mount.visible_rect, None);
    assert_eq!(mount.mounted.len(), 21);
    assert!(matches!(
        h.tree.incremental_mount_component(),
        Err(TreeError::IncrementalMountDisabled)
    ));
}

#[test]
fn layout_without_a_result_mounts_nothing() {
    let mut h = harness();
    h.view.mark_mount_state_dirty();

    assert!(h.tree.layout());
    assert_eq!(h.view.mount_count(), 0);
}
