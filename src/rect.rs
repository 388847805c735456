//! Rectangles, sizes and margins.
//!
//! Everything in here is measured in device pixels unless stated otherwise; see [`crate::dpi`]
//! for conversions from 1/96" units.

use cgmath::{Point2, Vector2, Zero};

/// A size. `x` is the width and `y` is the height.
pub type Size = Vector2<i32>;

/// A point.
pub type Point = Point2<i32>;

/// Creates a new size.
pub fn size(width: i32, height: i32) -> Size {
    Vector2::new(width, height)
}

/// Component-wise maximum of two sizes.
pub fn max_size(a: Size, b: Size) -> Size {
    size(a.x.max(b.x), a.y.max(b.y))
}

/// A rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Rectangle origin.
    pub origin: Point,

    /// Rectangle size.
    pub size: Size,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Rect {
        Rect {
            origin: Point2::new(x, y),
            size: size(width, height),
        }
    }

    /// Creates a new rectangle at the given origin.
    pub fn from_origin_size(origin: Point, size: Size) -> Rect {
        Rect { origin, size }
    }

    /// Returns a zero-sized rectangle at the origin.
    pub fn zero() -> Rect {
        Rect {
            origin: Point2::new(0, 0),
            size: Vector2::zero(),
        }
    }

    pub fn x(&self) -> i32 {
        self.origin.x
    }

    pub fn y(&self) -> i32 {
        self.origin.y
    }

    pub fn width(&self) -> i32 {
        self.size.x
    }

    pub fn height(&self) -> i32 {
        self.size.y
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.origin.x + self.size.x
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.y
    }

    /// Returns true if the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    /// Returns true if the two rectangles intersect.
    pub fn intersects(&self, rect: Rect) -> bool {
        self.origin.x < rect.right()
            && self.origin.y < rect.bottom()
            && rect.origin.x < self.right()
            && rect.origin.y < self.bottom()
    }

    /// Returns the intersection rectangle.
    pub fn intersect(&self, rect: Rect) -> Option<Rect> {
        if !self.intersects(rect) {
            return None;
        }

        let min_x = self.origin.x.max(rect.origin.x);
        let min_y = self.origin.y.max(rect.origin.y);
        let max_x = self.right().min(rect.right());
        let max_y = self.bottom().min(rect.bottom());

        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Returns the parts of this rectangle that are not covered by `rect`.
    ///
    /// The result has at most four rectangles: full-width bands above and below the overlap, and
    /// the pieces left and right of it.
    pub fn subtract(&self, rect: Rect) -> Vec<Rect> {
        let overlap = match self.intersect(rect) {
            Some(overlap) => overlap,
            None => {
                return if self.is_empty() {
                    Vec::new()
                } else {
                    vec![*self]
                }
            }
        };

        let mut parts = Vec::with_capacity(4);
        if overlap.y() > self.y() {
            parts.push(Rect::new(self.x(), self.y(), self.width(), overlap.y() - self.y()));
        }
        if overlap.bottom() < self.bottom() {
            parts.push(Rect::new(
                self.x(),
                overlap.bottom(),
                self.width(),
                self.bottom() - overlap.bottom(),
            ));
        }
        if overlap.x() > self.x() {
            parts.push(Rect::new(self.x(), overlap.y(), overlap.x() - self.x(), overlap.height()));
        }
        if overlap.right() < self.right() {
            parts.push(Rect::new(
                overlap.right(),
                overlap.y(),
                self.right() - overlap.right(),
                overlap.height(),
            ));
        }
        parts
    }

    /// Returns a new rectangle shrunk by the given margins.
    pub fn inset(&self, margins: Margins) -> Rect {
        Rect::new(
            self.origin.x + margins.h_near,
            self.origin.y + margins.v_near,
            self.size.x - margins.horizontal(),
            self.size.y - margins.vertical(),
        )
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::zero()
    }
}

/// Margins around the content of a container.
///
/// Depending on context these are in 1/96" units or device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Margins {
    pub h_near: i32,
    pub v_near: i32,
    pub h_far: i32,
    pub v_far: i32,
}

impl Margins {
    pub fn new(h_near: i32, v_near: i32, h_far: i32, v_far: i32) -> Margins {
        Margins {
            h_near,
            v_near,
            h_far,
            v_far,
        }
    }

    /// Same margin on every side.
    pub fn uniform(value: i32) -> Margins {
        Margins::new(value, value, value, value)
    }

    /// Returns true if any side is negative.
    pub fn is_negative(&self) -> bool {
        self.h_near < 0 || self.v_near < 0 || self.h_far < 0 || self.v_far < 0
    }

    /// Sum of the horizontal margins.
    pub fn horizontal(&self) -> i32 {
        self.h_near + self.h_far
    }

    /// Sum of the vertical margins.
    pub fn vertical(&self) -> i32 {
        self.v_near + self.v_far
    }

    /// Total size taken up by the margins.
    pub fn size(&self) -> Size {
        size(self.horizontal(), self.vertical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert!(a.intersects(b));
        assert_eq!(a.intersect(b), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersect(Rect::new(10, 0, 5, 5)), None);
    }

    #[test]
    fn subtract_translated_rect() {
        let old = Rect::new(0, 0, 10, 10);
        let new = Rect::new(3, 0, 10, 10);
        assert_eq!(old.subtract(new), vec![Rect::new(0, 0, 3, 10)]);

        let new = Rect::new(2, 4, 10, 10);
        let parts = old.subtract(new);
        let area: i32 = parts.iter().map(|r| r.width() * r.height()).sum();
        assert_eq!(area, 100 - 8 * 6);
        assert!(parts.iter().all(|p| p.intersect(new).is_none()));

        assert_eq!(old.subtract(Rect::new(20, 20, 1, 1)), vec![old]);
        assert!(old.subtract(old).is_empty());
    }

    #[test]
    fn inset_by_margins() {
        let r = Rect::new(0, 0, 100, 50).inset(Margins::new(1, 2, 3, 4));
        assert_eq!(r, Rect::new(1, 2, 96, 44));
    }
}
