use crate::geometry::{PixelRect, Point, Scale, Size};
use crate::pixel_buffer::PixelBuffer;

/// Edge of the square sampled around the cursor, in image pixels.
pub const CROP_SIZE: i32 = 35;
/// Edge of the on-screen preview, in logical units.
pub const PREVIEW_EXTENT: f64 = 140.0;
const PREVIEW_OFFSET: f64 = 20.0;
const PREVIEW_FLIP: f64 = 160.0;

/// What the host shows in the magnifier for one cursor position.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnifierView {
    /// Top-left of the preview in logical coordinates.
    pub position: Point,
    /// Pixels around the cursor, `None` when no source image is attached.
    pub crop: Option<PixelBuffer>,
    /// Cursor position label, e.g. `"(120, 45)"`.
    pub label: String,
}

/// Preview placement: down-right of the cursor, flipped per axis when it would leave the screen.
pub fn place(cursor: Point, screen: Size) -> Point {
    let mut x = cursor.x + PREVIEW_OFFSET;
    let mut y = cursor.y + PREVIEW_OFFSET;
    if x + PREVIEW_EXTENT > screen.width {
        x = cursor.x - PREVIEW_FLIP;
    }
    if y + PREVIEW_EXTENT > screen.height {
        y = cursor.y - PREVIEW_FLIP;
    }
    Point::new(x, y)
}

/// Image rectangle sampled for a cursor position, clamped to the image.
pub fn crop_rect(image_width: u32, image_height: u32, screen: Size, cursor: Point) -> PixelRect {
    let (cx, cy) = Scale::between(image_width, image_height, screen).map_point(cursor);
    PixelRect::new(
        cx - CROP_SIZE / 2,
        cy - CROP_SIZE / 2,
        CROP_SIZE,
        CROP_SIZE,
    )
    .clamp_to(image_width, image_height)
}

pub fn sample(image: Option<&PixelBuffer>, screen: Size, cursor: Point) -> MagnifierView {
    let crop = image.and_then(|img| {
        img.crop(crop_rect(img.width(), img.height(), screen, cursor))
    });
    MagnifierView {
        position: place(cursor, screen),
        crop,
        label: format!("({}, {})", cursor.x as i32, cursor.y as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::ChannelOrder;

    #[test]
    fn preview_flips_at_edges() {
        let screen = Size::new(1000.0, 800.0);
        assert_eq!(place(Point::new(100.0, 100.0), screen), Point::new(120.0, 120.0));
        assert_eq!(place(Point::new(900.0, 700.0), screen), Point::new(740.0, 540.0));
    }

    #[test]
    fn crop_is_scaled_and_clamped() {
        let screen = Size::new(500.0, 400.0);
        // 2x image: cursor (100, 100) maps to (200, 200).
        assert_eq!(
            crop_rect(1000, 800, screen, Point::new(100.0, 100.0)),
            PixelRect::new(183, 183, 35, 35)
        );
        // Near the origin the crop starts at 0 and keeps its size.
        assert_eq!(
            crop_rect(1000, 800, screen, Point::new(2.0, 2.0)),
            PixelRect::new(0, 0, 35, 35)
        );
        // Near the far edge the width is cut.
        assert_eq!(
            crop_rect(1000, 800, screen, Point::new(499.0, 399.0)),
            PixelRect::new(981, 781, 19, 19)
        );
    }

    #[test]
    fn sample_labels_logical_position() {
        let img = PixelBuffer::new(100, 100, ChannelOrder::Rgba).unwrap();
        let view = sample(Some(&img), Size::new(100.0, 100.0), Point::new(50.7, 10.2));
        assert_eq!(view.label, "(50, 10)");
        let crop = view.crop.unwrap();
        assert_eq!((crop.width(), crop.height()), (35, 35));

        assert!(sample(None, Size::new(100.0, 100.0), Point::new(1.0, 1.0)).crop.is_none());
    }
}
