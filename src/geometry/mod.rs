mod quad;
mod thickness;

pub use quad::*;
pub use thickness::*;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub const INFINITY: Self = Self {
        width: f32::INFINITY,
        height: f32::INFINITY,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Shrinks by `thickness`, never going below zero.
    pub fn deflate(self, thickness: Thickness) -> Self {
        Self {
            width: (self.width - thickness.horizontal()).max(0.0),
            height: (self.height - thickness.vertical()).max(0.0),
        }
    }

    pub fn inflate(self, thickness: Thickness) -> Self {
        Self {
            width: self.width + thickness.horizontal(),
            height: self.height + thickness.vertical(),
        }
    }

    pub fn max(self, other: Self) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    pub fn min(self, other: Self) -> Self {
        Self {
            width: self.width.min(other.width),
            height: self.height.min(other.height),
        }
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(self, point: Point) -> bool {
        point.x >= self.x && point.y >= self.y && point.x <= self.right() && point.y <= self.bottom()
    }

    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Moves every edge inwards; the result keeps a non-negative size.
    pub fn deflate(self, thickness: Thickness) -> Self {
        let width = (self.width - thickness.horizontal()).max(0.0);
        let height = (self.height - thickness.vertical()).max(0.0);
        Self::new(self.x + thickness.left, self.y + thickness.top, width, height)
    }

    pub fn inflate(self, thickness: Thickness) -> Self {
        Self::new(
            self.x - thickness.left,
            self.y - thickness.top,
            self.width + thickness.horizontal(),
            self.height + thickness.vertical(),
        )
    }

    /// Snaps both corners to whole pixels so edges land on pixel boundaries.
    pub fn round_to_pixels(self) -> Self {
        let left = self.x.round();
        let top = self.y.round();
        let right = self.right().round();
        let bottom = self.bottom().round();
        Self::new(left, top, (right - left).max(0.0), (bottom - top).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect, Size, Thickness};

    #[test]
    fn deflate_never_goes_negative() {
        let rect = Rect::new(10.0, 10.0, 6.0, 4.0).deflate(Thickness::uniform(5.0));
        assert_eq!(rect.x, 15.0);
        assert_eq!(rect.y, 15.0);
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.height, 0.0);
        assert_eq!(Size::new(3.0, 3.0).deflate(Thickness::uniform(4.0)), Size::ZERO);
    }

    #[test]
    fn intersect_of_disjoint_rects_is_none() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 0.0, 10.0, 10.0);
        assert!(a.intersect(b).is_none());
        let c = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(c), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn round_to_pixels_snaps_edges() {
        let rect = Rect::new(0.4, 1.6, 10.2, 3.3).round_to_pixels();
        assert_eq!(rect, Rect::new(0.0, 2.0, 11.0, 3.0));
        assert!(rect.contains(Point::new(5.0, 4.0)));
    }
}
