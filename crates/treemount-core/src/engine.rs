use treemount_graphics::Size;

use crate::component::Component;
use crate::layout_state::{LayoutState, LayoutStateRef, RenderNode};
use crate::size_spec::SizeSpec;
use crate::state_handler::StateHandler;

/// Computes layouts for component trees.
///
/// `compute` may be called from the main thread or from a layout thread, and
/// for several trees at once. It must be pure given the request, including
/// the state snapshot it carries.
pub trait LayoutEngine: Send + Sync {
    fn compute(&self, request: LayoutRequest<'_>) -> LayoutStateRef;
}

/// Inputs of one layout pass.
pub struct LayoutRequest<'a> {
    root: Component,
    width_spec: SizeSpec,
    height_spec: SizeSpec,
    diffing_enabled: bool,
    previous: Option<&'a LayoutState>,
    state_handler: StateHandler,
}

impl<'a> LayoutRequest<'a> {
    pub fn new(
        root: Component,
        width_spec: SizeSpec,
        height_spec: SizeSpec,
        diffing_enabled: bool,
        previous: Option<&'a LayoutState>,
        state_handler: StateHandler,
    ) -> Self {
        Self {
            root,
            width_spec,
            height_spec,
            diffing_enabled,
            previous,
            state_handler,
        }
    }

    pub fn root(&self) -> &Component {
        &self.root
    }

    pub fn width_spec(&self) -> SizeSpec {
        self.width_spec
    }

    pub fn height_spec(&self) -> SizeSpec {
        self.height_spec
    }

    pub fn diffing_enabled(&self) -> bool {
        self.diffing_enabled
    }

    /// Result to diff against, when diffing is enabled and one exists.
    pub fn previous(&self) -> Option<&'a LayoutState> {
        self.previous
    }

    /// The pass-local state. Engines apply pending updates of the components
    /// they lay out through it.
    pub fn state_handler_mut(&mut self) -> &mut StateHandler {
        &mut self.state_handler
    }

    /// Wraps the computed geometry into a layout state that captures this
    /// pass's state handler.
    pub fn finish(self, size: Size, render_tree: Option<RenderNode>) -> LayoutStateRef {
        let builder = LayoutState::builder(self.root.id(), self.width_spec, self.height_spec)
            .size(size)
            .state_handler(self.state_handler);
        match render_tree {
            Some(root) => builder.render_tree(root),
            None => builder,
        }
        .build()
    }
}
