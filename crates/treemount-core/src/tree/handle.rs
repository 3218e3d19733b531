use std::any::Any;
use std::fmt;
use std::sync::Arc;

use treemount_graphics::Size;

use super::scheduler::{Delivery, LayoutMode};
use super::{TreeCore, TreeId};
use crate::component::{Component, ComponentKey};
use crate::error::TreeError;
use crate::size_spec::SizeSpec;
use crate::state_handler::{StateUpdate, StateValue};

/// Thread-safe access to a [`ComponentTree`](super::ComponentTree)'s root,
/// size spec and state.
///
/// Layouts computed through a handle are reported to the main thread as a
/// message, even when computed synchronously.
#[derive(Clone)]
pub struct TreeHandle {
    core: Arc<TreeCore>,
}

const SYNC: LayoutMode = LayoutMode::Sync(Delivery::MainThreadQueue);

impl TreeHandle {
    pub(crate) fn new(core: Arc<TreeCore>) -> Self {
        Self { core }
    }

    pub fn id(&self) -> TreeId {
        self.core.id
    }

    pub fn root(&self) -> Option<Component> {
        self.core.root()
    }

    pub fn is_released(&self) -> bool {
        self.core.is_released()
    }

    pub fn set_root(&self, root: Component) {
        self.core
            .set_root_and_size_spec_internal(Some(root), None, None, SYNC);
    }

    pub fn set_root_async(&self, root: Component) {
        self.core
            .set_root_and_size_spec_internal(Some(root), None, None, LayoutMode::Async);
    }

    pub fn set_size_spec(&self, width_spec: SizeSpec, height_spec: SizeSpec) {
        self.set_size_spec_with_output(width_spec, height_spec);
    }

    pub fn set_size_spec_with_output(&self, width_spec: SizeSpec, height_spec: SizeSpec) -> Size {
        self.core
            .set_root_and_size_spec_internal(None, Some(width_spec), Some(height_spec), SYNC)
            .size
            .unwrap_or(Size::ZERO)
    }

    pub fn set_size_spec_async(&self, width_spec: SizeSpec, height_spec: SizeSpec) {
        self.core.set_root_and_size_spec_internal(
            None,
            Some(width_spec),
            Some(height_spec),
            LayoutMode::Async,
        );
    }

    pub fn set_root_and_size_spec(&self, root: Component, width_spec: SizeSpec, height_spec: SizeSpec) {
        self.set_root_and_size_spec_with_output(root, width_spec, height_spec);
    }

    pub fn set_root_and_size_spec_with_output(
        &self,
        root: Component,
        width_spec: SizeSpec,
        height_spec: SizeSpec,
    ) -> Size {
        self.core
            .set_root_and_size_spec_internal(Some(root), Some(width_spec), Some(height_spec), SYNC)
            .size
            .unwrap_or(Size::ZERO)
    }

    pub fn update_state_sync(&self, key: ComponentKey, update: StateUpdate) {
        self.core.update_state(key, update, SYNC);
    }

    pub fn update_state_async(&self, key: ComponentKey, update: StateUpdate) -> Result<(), TreeError> {
        self.core.update_state_async(key, update)
    }

    pub fn has_compatible_layout(&self, width_spec: SizeSpec, height_spec: SizeSpec) -> bool {
        self.core.has_compatible_layout(width_spec, height_spec)
    }

    pub fn state_value<T>(&self, key: &ComponentKey) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.core.state_value(key)
    }

    pub fn state(&self, key: &ComponentKey) -> Option<StateValue> {
        self.core.state(key)
    }
}

impl fmt::Debug for TreeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeHandle").field("id", &self.core.id).finish()
    }
}
