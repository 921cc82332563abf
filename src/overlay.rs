//! Translated-text overlay.
//!
//! Blocks are positioned in source-image pixels; the overlay is shown in a display area that
//! letterboxes the image with a uniform scale. Each block becomes a chip at the scaled
//! position whose width is capped at the scaled block width. Chips may overlap.

use image::imageops::FilterType;
use tracing::{debug, warn};

use crate::error::PixelBufferError;
use crate::font::{TextRasterizer, blend_pixel};
use crate::geometry::{Size, fit_scale};
use crate::pixel_buffer::PixelBuffer;
use crate::translation::TranslationBlock;

pub const CHIP_BACKGROUND: [u8; 4] = [255, 255, 255, 200];
pub const CHIP_TEXT_COLOR: [u8; 4] = [0, 0, 0, 255];
pub const CHIP_PADDING: f32 = 2.0;
pub const CHIP_FONT_SIZE: f32 = 11.0;

/// Placement of one translated block in display space.
#[derive(Debug, Clone, PartialEq)]
pub struct Chip {
    pub x: f64,
    pub y: f64,
    /// Outer width limit including padding.
    pub max_width: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub scale: f64,
    pub chips: Vec<Chip>,
}

/// Map blocks into display space for an `image_width`×`image_height` image shown in `display`.
pub fn layout(
    image_width: u32,
    image_height: u32,
    display: Size,
    blocks: &[TranslationBlock],
) -> OverlayLayout {
    let scale = fit_scale(image_width, image_height, display);
    let chips = blocks
        .iter()
        .map(|b| Chip {
            x: b.x * scale,
            y: b.y * scale,
            max_width: b.width * scale,
            text: b.translated_text.clone(),
        })
        .collect();
    OverlayLayout { scale, chips }
}

/// Composites translated chips over a scaled copy of the source image.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    font: Option<TextRasterizer>,
}

impl OverlayRenderer {
    pub fn new(font: Option<TextRasterizer>) -> Self {
        Self { font }
    }

    /// Image scaled into `display` with every block's chip drawn on top.
    pub fn render(
        &self,
        image: &PixelBuffer,
        display: Size,
        blocks: &[TranslationBlock],
    ) -> Result<PixelBuffer, PixelBufferError> {
        let layout = layout(image.width(), image.height(), display, blocks);
        let w = ((image.width() as f64 * layout.scale).round() as u32).max(1);
        let h = ((image.height() as f64 * layout.scale).round() as u32).max(1);
        debug!(
            "Overlay at scale {:.3}: {}x{} with {} chip(s)",
            layout.scale,
            w,
            h,
            layout.chips.len()
        );

        let mut canvas = if (w, h) == (image.width(), image.height()) {
            image.to_rgba_image()
        } else {
            image::imageops::resize(&image.to_rgba_image(), w, h, FilterType::Triangle)
        };

        match &self.font {
            Some(font) => {
                for chip in &layout.chips {
                    draw_chip(&mut canvas, font, chip);
                }
            }
            None if !layout.chips.is_empty() => {
                warn!("No font loaded, overlay chips are not drawn");
            }
            None => {}
        }

        Ok(PixelBuffer::from_rgba_image(canvas)?.to_order(image.channel_order()))
    }
}

fn draw_chip(canvas: &mut image::RgbaImage, font: &TextRasterizer, chip: &Chip) {
    if chip.text.is_empty() {
        return;
    }
    let text_max = (chip.max_width as f32 - 2.0 * CHIP_PADDING).max(1.0);
    let lines = font.wrap(&chip.text, CHIP_FONT_SIZE, text_max);
    let text_width = lines
        .iter()
        .map(|l| font.measure(l, CHIP_FONT_SIZE))
        .fold(0.0f32, f32::max)
        .min(text_max);
    let line_height = font.line_height(CHIP_FONT_SIZE);

    let x0 = chip.x as f32;
    let y0 = chip.y as f32;
    let x1 = x0 + text_width + 2.0 * CHIP_PADDING;
    let y1 = y0 + lines.len() as f32 * line_height + 2.0 * CHIP_PADDING;

    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    let clamp = |v: f32, max: i64| (v.round() as i64).clamp(0, max);
    for py in clamp(y0, ch)..clamp(y1, ch) {
        for px in clamp(x0, cw)..clamp(x1, cw) {
            blend_pixel(canvas, px as u32, py as u32, CHIP_BACKGROUND);
        }
    }

    font.draw(
        canvas,
        x0 + CHIP_PADDING,
        y0 + CHIP_PADDING,
        &lines.join("\n"),
        CHIP_TEXT_COLOR,
        CHIP_FONT_SIZE,
    );
}
