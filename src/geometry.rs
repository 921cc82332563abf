//! Coordinate types.
//!
//! Two coordinate spaces exist side by side: logical/display coordinates (pointer events, UI
//! layout, `f64`) and source-image pixel coordinates (`i32`). They are separate types and the
//! only bridge between them is [`Scale`].

/// Point in logical/display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of a display surface in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Rectangle in logical/display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Construct a normalized rectangle from two corner points, in any order.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True if both sides are strictly longer than `min`.
    #[inline]
    pub fn exceeds(&self, min: f64) -> bool {
        self.width > min && self.height > min
    }
}

/// Rectangle in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// `(right, bottom)`, or `None` if either edge does not fit in an `i32`.
    pub fn checked_far_corner(&self) -> Option<(i32, i32)> {
        Some((
            self.x.checked_add(self.width)?,
            self.y.checked_add(self.height)?,
        ))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Clamp against a `width`×`height` surface.
    ///
    /// Negative origins move to 0 and the extent is capped at `dimension - origin`. The result
    /// may be empty; callers check [`PixelRect::is_empty`].
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelRect {
        let x = self.x.max(0);
        let y = self.y.max(0);
        let w = self.width.min(width as i32 - x).max(0);
        let h = self.height.min(height as i32 - y).max(0);
        PixelRect::new(x, y, w, h)
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Per-axis factor from logical/display units to image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self::identity()
    }
}

impl Scale {
    pub const fn identity() -> Self {
        Self { x: 1.0, y: 1.0 }
    }

    /// `imagePixelDimension / displayLogicalDimension` per axis.
    ///
    /// A degenerate display axis falls back to 1.0.
    pub fn between(image_width: u32, image_height: u32, display: Size) -> Self {
        let ratio = |pixels: u32, logical: f64| {
            if logical > 0.0 {
                pixels as f64 / logical
            } else {
                1.0
            }
        };
        Self {
            x: ratio(image_width, display.width),
            y: ratio(image_height, display.height),
        }
    }

    /// Map a logical point to integer image pixels (truncating).
    #[inline]
    pub fn map_point(&self, p: Point) -> (i32, i32) {
        ((p.x * self.x) as i32, (p.y * self.y) as i32)
    }

    /// Map a logical point to fractional image pixels.
    #[inline]
    pub fn map_point_f32(&self, p: Point) -> (f32, f32) {
        ((p.x * self.x) as f32, (p.y * self.y) as f32)
    }

    /// Map a logical rectangle to a pixel rectangle; every component truncates independently.
    pub fn map_rect(&self, r: Rect) -> PixelRect {
        PixelRect::new(
            (r.x * self.x) as i32,
            (r.y * self.y) as i32,
            (r.width * self.x) as i32,
            (r.height * self.y) as i32,
        )
    }
}

/// Uniform letterbox scale for showing a `image_width`×`image_height` image inside `display`.
pub fn fit_scale(image_width: u32, image_height: u32, display: Size) -> f64 {
    if image_width == 0 || image_height == 0 {
        return 1.0;
    }
    (display.width / image_width as f64).min(display.height / image_height as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_is_order_independent() {
        let a = Rect::from_points(Point::new(300.0, 300.0), Point::new(100.0, 100.0));
        let b = Rect::from_points(Point::new(100.0, 100.0), Point::new(300.0, 300.0));
        assert_eq!(a, b);
        assert_eq!(a, Rect::new(100.0, 100.0, 200.0, 200.0));
    }

    #[test]
    fn clamp_handles_every_edge() {
        let r = PixelRect::new(-5, -5, 20, 20).clamp_to(10, 10);
        assert_eq!(r, PixelRect::new(0, 0, 10, 10));

        let r = PixelRect::new(8, 8, 20, 20).clamp_to(10, 10);
        assert_eq!(r, PixelRect::new(8, 8, 2, 2));

        let r = PixelRect::new(12, 3, 5, 5).clamp_to(10, 10);
        assert!(r.is_empty());
    }

    #[test]
    fn scale_maps_logical_to_pixels() {
        let scale = Scale::between(2880, 1800, Size::new(1440.0, 900.0));
        assert_eq!(scale, Scale { x: 2.0, y: 2.0 });
        assert_eq!(
            scale.map_rect(Rect::new(10.5, 20.25, 100.0, 50.0)),
            PixelRect::new(21, 40, 200, 100)
        );
        assert_eq!(scale.map_point(Point::new(0.75, 0.75)), (1, 1));
    }

    #[test]
    fn degenerate_display_keeps_identity() {
        let scale = Scale::between(100, 100, Size::new(0.0, 0.0));
        assert_eq!(scale, Scale::identity());
    }

    #[test]
    fn fit_scale_is_uniform() {
        assert_eq!(fit_scale(1000, 800, Size::new(500.0, 500.0)), 0.5);
        assert_eq!(fit_scale(1000, 800, Size::new(2000.0, 800.0)), 1.0);
    }
}
