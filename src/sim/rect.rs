//! Axis-aligned bounding boxes
//!
//! Screen space: origin top-left, x grows right, y grows down. A box is its
//! top-left corner plus a fixed size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    /// Box of `size` centered on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            pos: center - size / 2.0,
            size,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Strict overlap test: boxes that only share an edge do not intersect
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let min = self.pos.min(other.pos);
        let max = Vec2::new(self.right(), self.bottom())
            .max(Vec2::new(other.right(), other.bottom()));
        Rect::from_pos_size(min, max - min)
    }

    /// Bounding extent of many boxes (None when empty)
    pub fn extent<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects
            .into_iter()
            .fold(None, |acc: Option<Rect>, r| Some(acc.map_or(*r, |a| a.union(r))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_pixel_overlap_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(9.0, 9.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_centered() {
        let r = Rect::centered(Vec2::new(50.0, 50.0), Vec2::new(20.0, 10.0));
        assert_eq!(r.pos, Vec2::new(40.0, 45.0));
        assert_eq!(r.center(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_extent() {
        assert!(Rect::extent(Vec::<Rect>::new().iter()).is_none());
        let rects = [
            Rect::new(10.0, 20.0, 30.0, 30.0),
            Rect::new(100.0, 5.0, 30.0, 30.0),
        ];
        let e = Rect::extent(&rects).unwrap();
        assert_eq!(e.left(), 10.0);
        assert_eq!(e.right(), 130.0);
        assert_eq!(e.top(), 5.0);
        assert_eq!(e.bottom(), 50.0);
    }
}
