use core::ops::{Add, Sub};

use super::Vec2;

/// Axis-aligned rectangle stored by its four edges, in logical pixels (top-left origin).
///
/// A well-formed rect has `left <= right` and `top <= bottom`. Edge-wise arithmetic
/// (`a - b`, `a + d`) is used by the 2D hierarchy to express resize deltas, so a
/// `Rect` may also hold a delta whose edges are unordered.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Rect {
    #[inline]
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self { top, right, bottom, left }
    }

    /// Builds a rect from an origin (top-left) and a size.
    #[inline]
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            top: origin.y,
            right: origin.x + size.x,
            bottom: origin.y + size.y,
            left: origin.x,
        }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn origin(self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    #[inline]
    pub fn size(self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.top.is_finite() && self.right.is_finite() && self.bottom.is_finite() && self.left.is_finite()
    }

    /// Moves all four edges by `offset`.
    #[inline]
    pub fn translated(self, offset: Vec2) -> Self {
        Self {
            top: self.top + offset.y,
            right: self.right + offset.x,
            bottom: self.bottom + offset.y,
            left: self.left + offset.x,
        }
    }

    /// Multiplies each edge by the matching edge of `factors`.
    #[inline]
    pub fn scale_edges(self, factors: Rect) -> Self {
        Self {
            top: self.top * factors.top,
            right: self.right * factors.right,
            bottom: self.bottom * factors.bottom,
            left: self.left * factors.left,
        }
    }

    /// Swaps edges so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        Self {
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
            left: self.left.min(self.right),
        }
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let r = self.normalized();
        p.x >= r.left && p.y >= r.top && p.x < r.right && p.y < r.bottom
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let r = Rect::new(
            a.top.max(b.top),
            a.right.min(b.right),
            a.bottom.min(b.bottom),
            a.left.max(b.left),
        );

        if r.is_empty() { None } else { Some(r) }
    }

    #[inline]
    pub fn abs_diff_eq(self, other: Rect, eps: f32) -> bool {
        (self.top - other.top).abs() <= eps
            && (self.right - other.right).abs() <= eps
            && (self.bottom - other.bottom).abs() <= eps
            && (self.left - other.left).abs() <= eps
    }
}

impl Sub for Rect {
    type Output = Rect;
    #[inline]
    fn sub(self, rhs: Rect) -> Rect {
        Rect::new(
            self.top - rhs.top,
            self.right - rhs.right,
            self.bottom - rhs.bottom,
            self.left - rhs.left,
        )
    }
}

impl Add for Rect {
    type Output = Rect;
    #[inline]
    fn add(self, rhs: Rect) -> Rect {
        Rect::new(
            self.top + rhs.top,
            self.right + rhs.right,
            self.bottom + rhs.bottom,
            self.left + rhs.left,
        )
    }
}
