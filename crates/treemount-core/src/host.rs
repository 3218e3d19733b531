use treemount_graphics::{Point, Rect, Size};

use crate::context::Context;
use crate::layout_state::LayoutState;

/// The platform view a component tree mounts its content into.
///
/// A tree owns at most one host view. The view reports its geometry and
/// mount-dirty flag and performs the actual mounting.
pub trait HostView {
    fn context(&self) -> &Context;

    fn measured_width(&self) -> i32;

    fn measured_height(&self) -> i32;

    fn is_mount_state_dirty(&self) -> bool;

    fn set_mount_state_dirty(&mut self);

    /// Mounts `layout_state`. With a visible rect only the content
    /// intersecting it needs to be attached; `None` mounts everything.
    fn mount(&mut self, layout_state: &LayoutState, visible_rect: Option<Rect>);

    /// Re-binds already mounted content without remounting it.
    fn rebind(&mut self);

    /// Asks the platform for a new measure and layout pass.
    fn request_layout(&mut self);

    fn location_on_screen(&self) -> Point;

    fn width(&self) -> i32;

    fn height(&self) -> i32;

    /// On-screen bounds of the parent when the parent is itself a view.
    fn parent_bounds_on_screen(&self) -> Option<Rect>;

    /// Drops the view's back-reference to the tree.
    fn clear_component_tree(&mut self);

    /// Called on a view that is replaced while the tree is attached. The view
    /// must unmount its content and drop its back-reference.
    fn detach_component_tree(&mut self);

    fn measured_size(&self) -> Size {
        Size::new(self.measured_width(), self.measured_height())
    }

    fn bounds_on_screen(&self) -> Rect {
        Rect::from_origin_and_size(
            self.location_on_screen(),
            Size::new(self.width(), self.height()),
        )
    }
}
