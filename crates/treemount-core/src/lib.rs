#![doc = r"Component tree management: scheduling layouts off the main thread, reconciling their results and triggering mounts."]

mod collections;
pub mod component;
pub mod context;
pub mod engine;
pub mod error;
pub mod host;
pub mod layout_state;
pub mod layout_thread;
pub mod platform;
pub mod size_spec;
pub mod state_handler;
pub mod tree;

pub use component::{Component, ComponentId, ComponentKey};
pub use context::Context;
pub use engine::{LayoutEngine, LayoutRequest};
pub use error::TreeError;
pub use host::HostView;
pub use layout_state::{
    LayoutState, LayoutStateBuilder, LayoutStateId, LayoutStateProbe, LayoutStateRef, RenderNode,
};
pub use layout_thread::{default_layout_handler, LayoutThread, DEFAULT_LAYOUT_THREAD_NAME};
pub use platform::{
    DefaultMainThreadScheduler, InlineLayoutHandler, LayoutHandler, LayoutLock, LayoutTask,
    MainThreadScheduler,
};
pub use size_spec::{SizeSpec, SizeSpecMode};
pub use state_handler::{StateHandler, StateUpdate, StateValue};
pub use tree::{ComponentTree, ComponentTreeBuilder, TreeConfig, TreeHandle, TreeId};

pub mod prelude {
    pub use crate::component::{Component, ComponentKey};
    pub use crate::context::Context;
    pub use crate::engine::{LayoutEngine, LayoutRequest};
    pub use crate::host::HostView;
    pub use crate::size_spec::SizeSpec;
    pub use crate::state_handler::StateUpdate;
    pub use crate::tree::{ComponentTree, TreeHandle};
}
