//! Block-averaging mosaic (pixelation) used for redaction.

use tracing::debug;

use crate::geometry::PixelRect;
use crate::pixel_buffer::PixelBuffer;

/// Default edge length of a mosaic cell, in pixels.
pub const DEFAULT_BLOCK_SIZE: u32 = 10;

/// Return a copy of `buffer` with `rect` pixelated.
///
/// The rectangle is clamped to the buffer first; if nothing is left the copy is unchanged.
pub fn apply(buffer: &PixelBuffer, rect: PixelRect, block_size: u32) -> PixelBuffer {
    let mut out = buffer.clone();
    apply_in_place(&mut out, rect, block_size);
    out
}

/// Pixelate `rect` of `buffer` in place.
///
/// The clamped region is tiled by `block_size`×`block_size` cells anchored at its top-left
/// corner; trailing cells on the right and bottom edges are smaller. Each cell is overwritten
/// with the truncated per-channel mean of its pixels. A `block_size` of 0 is treated as 1.
pub fn apply_in_place(buffer: &mut PixelBuffer, rect: PixelRect, block_size: u32) {
    let region = rect.clamp_to(buffer.width(), buffer.height());
    if region.is_empty() {
        debug!("Mosaic region {:?} is outside the buffer, skipping", rect);
        return;
    }
    let block = block_size.clamp(1, i32::MAX as u32) as i32;

    let mut y = region.y;
    while y < region.bottom() {
        let cell_h = block.min(region.bottom() - y);
        let mut x = region.x;
        while x < region.right() {
            let cell_w = block.min(region.right() - x);
            let cell = PixelRect::new(x, y, cell_w, cell_h);
            let mean = buffer.block_mean(cell);
            buffer.fill_rect(cell, mean);
            x = x.saturating_add(block);
        }
        y = y.saturating_add(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::ChannelOrder;

    fn checker(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height, ChannelOrder::Rgba).unwrap();
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                buf.set_pixel(x, y, [v, v / 2, 0, 255]);
            }
        }
        buf
    }

    #[test]
    fn averages_each_cell() {
        let buf = checker(4, 4);
        let out = apply(&buf, PixelRect::new(0, 0, 4, 4), 2);
        // Each 2x2 cell holds two 255s and two 0s: mean 127 (truncated).
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(out.pixel(x, y), [127, 63, 0, 255]);
            }
        }
    }

    #[test]
    fn ragged_trailing_cells() {
        let mut buf = PixelBuffer::filled(5, 1, [0, 0, 0, 255]).unwrap();
        buf.set_pixel(4, 0, [200, 0, 0, 255]);
        let out = apply(&buf, PixelRect::new(0, 0, 5, 1), 2);
        // Cells: [0,1], [2,3], [4]; the lone trailing pixel keeps its own value.
        assert_eq!(out.pixel(4, 0), [200, 0, 0, 255]);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn leaves_outside_pixels_untouched() {
        let buf = checker(20, 20);
        let out = apply(&buf, PixelRect::new(-5, 15, 10, 10), 3);
        for y in 0..20 {
            for x in 0..20 {
                if x >= 10 || y < 15 {
                    assert_eq!(out.pixel(x, y), buf.pixel(x, y), "pixel ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn negative_origin_keeps_its_extent() {
        let buf = checker(20, 20);
        let out = apply(&buf, PixelRect::new(-5, 15, 10, 10), 20);
        // Clamped to (0, 15, 10, 5): one cell spanning columns 0..10.
        let mean = out.pixel(0, 15);
        assert_eq!(out.pixel(9, 19), mean);
        assert_ne!(mean, buf.pixel(0, 15));
        assert_eq!(out.pixel(10, 15), buf.pixel(10, 15));
    }

    #[test]
    fn huge_block_gives_a_single_cell() {
        let buf = checker(20, 20);
        let out = apply(&buf, PixelRect::new(0, 0, 20, 20), 3_000_000_000);
        // 200 of the 400 pixels are 255: mean 127.
        for y in 0..20 {
            for x in 0..20 {
                assert_eq!(out.pixel(x, y), [127, 63, 0, 255]);
            }
        }
        assert_eq!(apply(&buf, PixelRect::new(0, 0, 20, 20), u32::MAX), out);
    }

    #[test]
    fn zero_area_and_zero_block() {
        let buf = checker(8, 8);
        assert_eq!(apply(&buf, PixelRect::new(3, 3, 0, 4), 4), buf);
        assert_eq!(apply(&buf, PixelRect::new(9, 9, 4, 4), 4), buf);
        // Block size 0 behaves as 1: every cell is one pixel, so nothing changes.
        assert_eq!(apply(&buf, PixelRect::new(0, 0, 8, 8), 0), buf);
    }

    #[test]
    fn is_idempotent() {
        let buf = checker(33, 17);
        let rect = PixelRect::new(4, 2, 25, 13);
        let once = apply(&buf, rect, DEFAULT_BLOCK_SIZE);
        let twice = apply(&once, rect, DEFAULT_BLOCK_SIZE);
        assert_eq!(once, twice);
    }
}
