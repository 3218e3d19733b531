use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns true when both dimensions are zero, which is how host views
    /// report that they have not been measured yet.
    pub fn is_zero(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// Axis-aligned rectangle described by its edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Builds the bounds of something placed at `origin` with the given size.
    pub fn from_origin_and_size(origin: Point, size: Size) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            right: origin.x + size.width,
            bottom: origin.y + size.height,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Returns the overlap of `self` and `other`, or `None` when they do not
    /// overlap. Touching edges do not count as an overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(Rect::new(left, top, right, bottom))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersect(other).is_some()
    }

    #[must_use]
    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect({}, {} - {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_clips_to_the_overlap() {
        let host = Rect::from_origin_and_size(Point::new(10, 10), Size::new(100, 100));
        let parent = Rect::from_origin_and_size(Point::ZERO, Size::new(50, 50));

        assert_eq!(host.intersect(&parent), Some(Rect::new(10, 10, 50, 50)));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);

        assert_eq!(a.intersect(&b), None);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn offset_translates_every_edge() {
        let rect = Rect::new(10, 10, 50, 50).offset(-10, -10);

        assert_eq!(rect, Rect::new(0, 0, 40, 40));
        assert_eq!(rect.size(), Size::new(40, 40));
    }

    #[test]
    fn empty_rect_has_no_area() {
        assert!(Rect::new(5, 5, 5, 20).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
    }

    #[test]
    fn contains_excludes_right_and_bottom_edges() {
        let rect = Rect::new(0, 0, 10, 10);

        assert!(rect.contains(Point::new(0, 0)));
        assert!(!rect.contains(Point::new(10, 5)));
    }
}
