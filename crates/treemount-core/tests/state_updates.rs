mod common;

use std::sync::Arc;

use parking_lot::Mutex;
use treemount_core::{ComponentKey, StateHandler, StateUpdate, TreeError};

use common::{exactly, harness, harness_with};

fn increment() -> StateUpdate {
    StateUpdate::new(|count: Option<&u32>| count.copied().unwrap_or(0) + 1)
}

fn root_key() -> ComponentKey {
    ComponentKey::new("root")
}

#[test]
fn sync_update_lays_out_a_new_root() {
    let mut h = harness();
    h.tree.set_size_spec(exactly(100), exactly(100));
    let before = h.tree.root().expect("root").id();

    h.tree.update_state_sync(root_key(), increment());

    assert_eq!(h.engine.compute_count(), 2);
    assert_ne!(h.tree.root().expect("root").id(), before);
    assert_eq!(h.tree.state_value::<u32>(&root_key()).as_deref(), Some(&1));
}

#[test]
fn async_updates_fold_into_one_layout() {
    let mut h = harness();
    h.tree.set_size_spec(exactly(100), exactly(100));

    h.tree
        .update_state_async(root_key(), increment())
        .expect("async updates enabled");
    h.tree
        .update_state_async(root_key(), increment())
        .expect("async updates enabled");

    assert_eq!(h.layout_handler.pending_count(), 1);
    assert!(h.tree.state_value::<u32>(&root_key()).is_none());

    h.layout_handler.run_pending();

    assert_eq!(h.engine.compute_count(), 2);
    assert_eq!(h.tree.state_value::<u32>(&root_key()).as_deref(), Some(&2));
}

#[test]
fn async_updates_can_be_disabled() {
    let mut h = harness_with(|builder| builder.async_state_updates(false));
    h.tree.set_size_spec(exactly(100), exactly(100));
    let root = h.tree.root().expect("root").id();

    let result = h.tree.update_state_async(root_key(), increment());

    assert!(matches!(result, Err(TreeError::AsyncStateUpdatesDisabled)));
    assert_eq!(h.layout_handler.posted_count(), 0);
    assert_eq!(h.tree.root().expect("root").id(), root);

    h.tree.update_state_sync(root_key(), increment());
    assert_eq!(h.tree.state_value::<u32>(&root_key()).as_deref(), Some(&1));
}

#[test]
fn update_queued_during_a_pass_is_not_lost() {
    let mut h = harness();
    h.tree.set_size_spec(exactly(100), exactly(100));
    let handle = Mutex::new(Some(h.tree.handle()));
    h.engine.set_on_compute(move |_| {
        let handle = handle.lock().take();
        if let Some(handle) = handle {
            handle
                .update_state_async(root_key(), increment())
                .expect("async updates enabled");
        }
    });

    h.tree
        .update_state_async(root_key(), increment())
        .expect("async updates enabled");
    h.layout_handler.run_pending();

    // The first pass went stale when the second update re-issued the root.
    assert_eq!(h.engine.compute_count(), 3);
    assert_eq!(h.tree.state_value::<u32>(&root_key()).as_deref(), Some(&2));
    assert!(h.engine.produced()[1].is_released());
}

#[test]
fn builder_state_seeds_the_tree() {
    let mut state = StateHandler::new();
    state.initialize_state(&root_key(), Arc::new(5u32));
    let mut h = harness_with(move |builder| builder.state_handler(state));
    h.tree.set_size_spec(exactly(100), exactly(100));

    assert_eq!(h.tree.state_value::<u32>(&root_key()).as_deref(), Some(&5));

    h.tree.update_state_sync(root_key(), increment());

    assert_eq!(h.tree.state_value::<u32>(&root_key()).as_deref(), Some(&6));
    assert_eq!(h.tree.handle().state_value::<u32>(&root_key()).as_deref(), Some(&6));
}

#[test]
fn updates_on_a_released_tree_are_ignored() {
    let mut h = harness();
    h.tree.set_size_spec(exactly(100), exactly(100));
    h.tree.release();

    h.tree.update_state_sync(root_key(), increment());
    h.tree
        .update_state_async(root_key(), increment())
        .expect("nothing to reject");

    assert_eq!(h.engine.compute_count(), 1);
    assert_eq!(h.layout_handler.posted_count(), 0);
    assert!(h.tree.state(&root_key()).is_none());
}
