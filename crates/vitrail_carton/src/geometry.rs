//! Rectangle and size calculations in CSS pixels.

use serde::{Deserialize, Serialize};

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check whether `other` fits entirely inside this size.
    #[inline]
    pub fn fits(&self, other: &Size) -> bool {
        other.width <= self.width && other.height <= self.height
    }
}

/// A rectangle in viewport coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at `(x, y)` with the given size.
    #[inline]
    pub const fn at(x: f64, y: f64, size: Size) -> Self {
        Self::new(x, y, size.width, size.height)
    }

    /// Create an empty rectangle at the origin.
    #[inline]
    pub const fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if a point is inside the rectangle (right/bottom exclusive).
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Check if every edge lies within `[0, viewport]` on both axes.
    pub fn is_within(&self, viewport: &Size) -> bool {
        self.left() >= 0.0
            && self.top() >= 0.0
            && self.right() <= viewport.width
            && self.bottom() <= viewport.height
    }

    /// Offset the rectangle by (dx, dy).
    #[inline]
    pub fn offset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

impl From<(f64, f64, f64, f64)> for Rect {
    fn from((x, y, width, height): (f64, f64, f64, f64)) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<(f64, f64)> for Size {
    fn from((width, height): (f64, f64)) -> Self {
        Self::new(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.left(), 10.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.top(), 20.0);
        assert_eq!(rect.bottom(), 60.0);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(10.0, 10.0));
        assert!(rect.contains(29.5, 29.5));
        assert!(!rect.contains(9.0, 10.0));
        assert!(!rect.contains(30.0, 30.0));
    }

    #[test]
    fn test_rect_within_viewport() {
        let viewport = Size::new(100.0, 100.0);
        assert!(Rect::new(0.0, 0.0, 100.0, 100.0).is_within(&viewport));
        assert!(!Rect::new(-1.0, 0.0, 10.0, 10.0).is_within(&viewport));
        assert!(!Rect::new(95.0, 0.0, 10.0, 10.0).is_within(&viewport));
    }

    #[test]
    fn test_size_fits() {
        let viewport = Size::new(800.0, 600.0);
        assert!(viewport.fits(&Size::new(400.0, 300.0)));
        assert!(!viewport.fits(&Size::new(900.0, 300.0)));
    }
}
