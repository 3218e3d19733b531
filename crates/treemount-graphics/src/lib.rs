//! Integer geometry for treemount.
//!
//! Host views report positions and sizes in whole pixels, so everything here
//! is `i32` based and follows the platform rect conventions: `right` and
//! `bottom` are exclusive and an empty rect has no area.

mod geometry;

pub use geometry::*;

pub mod prelude {
    pub use crate::geometry::{Point, Rect, Size};
}
