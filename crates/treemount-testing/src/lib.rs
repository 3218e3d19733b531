//! Testing utilities for treemount component trees.
//!
//! Every collaborator a [`ComponentTree`](treemount_core::ComponentTree)
//! talks to has a recording fake here, so tests can drive a tree step by
//! step and assert on what it asked the platform to do.

mod engine;
mod host;
mod scheduler;

pub use engine::{CountingLayoutEngine, RecordedRequest};
pub use host::{FakeHostView, MountRecord};
pub use scheduler::{ManualLayoutHandler, RecordingMainThreadScheduler};

pub mod prelude {
    pub use crate::engine::CountingLayoutEngine;
    pub use crate::host::FakeHostView;
    pub use crate::scheduler::{ManualLayoutHandler, RecordingMainThreadScheduler};
}
