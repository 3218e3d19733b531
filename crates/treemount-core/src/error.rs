use thiserror::Error;

use crate::tree::TreeId;

/// Integration mistakes reported by [`ComponentTree`](crate::ComponentTree).
///
/// These never describe runtime conditions worth recovering from. The call
/// that returns one has not changed the tree.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("trying to attach component tree {tree} without a host view")]
    AttachWithoutHostView { tree: TreeId },

    #[error("clearing the host view while component tree {tree} is attached")]
    ClearHostViewWhileAttached { tree: TreeId },

    #[error("base view context differs, view context is: {view}, component tree context is: {tree}")]
    ContextMismatch { view: String, tree: String },

    #[error("calling incremental_mount_component() but incremental mount is not enabled")]
    IncrementalMountDisabled,

    #[error("triggering async state updates on this component tree is disabled, use sync state updates")]
    AsyncStateUpdatesDisabled,

    #[error("failed to spawn layout thread `{name}`: {source}")]
    LayoutThreadSpawn {
        name: String,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

impl TreeError {
    /// Logs the error before handing it back, so misuse is visible even when
    /// the caller drops the result.
    pub(crate) fn report<T>(self) -> Result<T, TreeError> {
        log::error!("{self}");
        Err(self)
    }
}
