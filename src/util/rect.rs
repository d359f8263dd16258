//! Axis-aligned bounding rectangle used for dirty tracking.

/// A bounding rect over cells that may have changed.
///
/// Empty iff `width <= 0` or `height <= 0`. The rect over-approximates the
/// truly-changed set; consumers cheaply skip the cells inside it that did
/// not change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub const EMPTY: DirtyRect = DirtyRect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        DirtyRect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// One past the right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// One past the bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Grows the rect to include `(x, y)`; an empty rect becomes the unit
    /// rect at that point.
    pub fn mark(&mut self, x: i32, y: i32) {
        if self.is_empty() {
            *self = DirtyRect::new(x, y, 1, 1);
        } else {
            self.expand(x, y);
        }
    }

    fn expand(&mut self, x: i32, y: i32) {
        if x < self.x {
            self.width += self.x - x;
            self.x = x;
        } else if x >= self.x + self.width {
            self.width = x - self.x + 1;
        }

        if y < self.y {
            self.height += self.y - y;
            self.y = y;
        } else if y >= self.y + self.height {
            self.height = y - self.y + 1;
        }
    }

    pub fn clear(&mut self) {
        *self = DirtyRect::EMPTY;
    }

    /// Intersection with `[0, width) x [0, height)`.
    pub fn clamped(&self, width: i32, height: i32) -> DirtyRect {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(width);
        let y1 = self.bottom().min(height);
        DirtyRect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn fresh_rect_is_empty() {
        assert!(DirtyRect::EMPTY.is_empty());
        assert!(!DirtyRect::EMPTY.contains(0, 0));
    }

    #[test]
    fn first_mark_is_a_unit_rect() {
        let mut rect = DirtyRect::EMPTY;
        rect.mark(5, 7);
        assert_eq!(rect, DirtyRect::new(5, 7, 1, 1));
    }

    #[test]
    fn marks_grow_in_every_direction() {
        let mut rect = DirtyRect::EMPTY;
        rect.mark(10, 10);
        rect.mark(8, 12);
        rect.mark(13, 9);
        assert!(rect.contains(10, 10));
        assert!(rect.contains(8, 12));
        assert!(rect.contains(13, 9));
        assert_eq!(rect, DirtyRect::new(8, 9, 6, 4));
    }

    /// The expansion formula is asymmetric between the negative and
    /// positive directions; pin down that every marked point always ends
    /// up inside the rect regardless of order.
    #[test]
    fn every_marked_point_is_contained() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..200 {
            let mut rect = DirtyRect::EMPTY;
            let mut points = Vec::new();
            for _ in 0..rng.gen_range(1..32) {
                let p = (rng.gen_range(0..64), rng.gen_range(0..64));
                rect.mark(p.0, p.1);
                points.push(p);
            }
            for (x, y) in points {
                assert!(rect.contains(x, y), "({x}, {y}) escaped {rect:?}");
            }
        }
    }

    #[test]
    fn clamp_cuts_to_bounds() {
        let mut rect = DirtyRect::EMPTY;
        rect.mark(-3, 2);
        rect.mark(70, 63);
        let clamped = rect.clamped(64, 64);
        assert_eq!((clamped.x, clamped.y), (0, 2));
        assert_eq!((clamped.right(), clamped.bottom()), (64, 64));

        let mut outside = DirtyRect::EMPTY;
        outside.mark(-2, -2);
        assert!(outside.clamped(64, 64).is_empty());
    }
}
