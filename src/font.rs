// Text rasterization
//
// Glyph outlines come from ab_glyph and are blended straight into an `RgbaImage`. Shared by
// annotation Text shapes and overlay chips.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, FontVec, ScaleFont, point};
use image::RgbaImage;
use tracing::{debug, warn};

/// Fonts tried when no font path is configured, in order.
const SYSTEM_FONTS: &[&str] = &[
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/Helvetica.ttc",
];

/// A loaded font plus the drawing and layout helpers built on it.
#[derive(Clone)]
pub struct TextRasterizer {
    font: FontArc,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer").finish_non_exhaustive()
    }
}

impl TextRasterizer {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ab_glyph::InvalidFont> {
        let font = FontVec::try_from_vec_and_index(bytes, 0)?;
        Ok(Self {
            font: FontArc::from(font),
        })
    }

    /// Load a font file, logging and returning `None` on failure.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Font {} not readable: {}", path.display(), e);
                return None;
            }
        };
        match Self::from_bytes(bytes) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Font {} is invalid: {}", path.display(), e);
                None
            }
        }
    }

    /// Configured font if any, otherwise the first well-known system font that loads.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
        for path in candidates {
            if let Some(r) = Self::load(&path) {
                debug!("Using font {}", path.display());
                return Some(r);
            }
        }
        warn!("No usable font found, text will not be rendered");
        None
    }

    pub fn line_height(&self, size: f32) -> f32 {
        let scaled = self.font.as_scaled(size);
        scaled.height() + scaled.line_gap()
    }

    /// Advance width of a single line of text.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(size);
        let mut width = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    /// Greedy wrap to `max_width`. Breaks at the last space when there is one on the line,
    /// otherwise between characters (CJK text has no spaces). Existing newlines are kept.
    pub fn wrap(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            for ch in paragraph.chars() {
                let mut candidate = line.clone();
                candidate.push(ch);
                if line.is_empty() || self.measure(&candidate, size) <= max_width {
                    line = candidate;
                    continue;
                }
                match line.rfind(' ') {
                    Some(idx) if idx > 0 && ch != ' ' => {
                        let mut carried = line[idx + 1..].to_string();
                        lines.push(line[..idx].to_string());
                        carried.push(ch);
                        line = self.break_chars(&carried, size, max_width, &mut lines);
                    }
                    _ => {
                        lines.push(std::mem::take(&mut line));
                        if ch != ' ' {
                            line.push(ch);
                        }
                    }
                }
            }
            lines.push(line);
        }
        lines
    }

    /// Character-level greedy break; full lines go to `lines`, the unfinished tail is returned.
    fn break_chars(&self, text: &str, size: f32, max_width: f32, lines: &mut Vec<String>) -> String {
        let mut line = String::new();
        for ch in text.chars() {
            let mut candidate = line.clone();
            candidate.push(ch);
            if line.is_empty() || self.measure(&candidate, size) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, ch.to_string()));
            }
        }
        line
    }

    /// Draw `text` with its top-left corner at `(x, y)`; `\n` starts a new line.
    pub fn draw(&self, img: &mut RgbaImage, x: f32, y: f32, text: &str, color: [u8; 4], size: f32) {
        let scaled = self.font.as_scaled(size);
        let line_height = self.line_height(size);
        for (i, line) in text.split('\n').enumerate() {
            let mut caret = point(x, y + i as f32 * line_height + scaled.ascent());
            for ch in line.chars() {
                let mut glyph = scaled.scaled_glyph(ch);
                glyph.position = caret;
                caret.x += scaled.h_advance(glyph.id);
                let Some(outlined) = scaled.outline_glyph(glyph) else {
                    continue;
                };
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = gx as i32 + bounds.min.x as i32;
                    let py = gy as i32 + bounds.min.y as i32;
                    if px >= 0 && py >= 0 && px < img.width() as i32 && py < img.height() as i32 {
                        let alpha = (color[3] as f32 * coverage).round().clamp(0.0, 255.0) as u8;
                        blend_pixel(img, px as u32, py as u32, [color[0], color[1], color[2], alpha]);
                    }
                });
            }
        }
    }
}

/// Source-over blend of a straight-alpha color into a straight-alpha image.
pub fn blend_pixel(img: &mut RgbaImage, x: u32, y: u32, src: [u8; 4]) {
    let dst = img.get_pixel_mut(x, y);
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_source_replaces() {
        let mut img = RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        blend_pixel(&mut img, 0, 0, [200, 100, 50, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [200, 100, 50, 255]);
    }

    #[test]
    fn translucent_white_over_black() {
        let mut img = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
        blend_pixel(&mut img, 0, 0, [255, 255, 255, 200]);
        assert_eq!(img.get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn wrap_respects_width_when_a_font_is_available() {
        let Some(r) = TextRasterizer::discover(None) else {
            return;
        };
        let lines = r.wrap("hello wide world of text", 11.0, 40.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(r.measure(line, 11.0) <= 40.0 || line.chars().count() == 1);
        }
        assert!(r.measure("abc", 11.0) > 0.0);
    }

    #[test]
    fn carried_words_are_rebroken_when_they_overflow() {
        let Some(r) = TextRasterizer::discover(None) else {
            return;
        };
        let text = "i supercalifragilistic a expialidocious word";
        for max_width in [12.0, 20.0, 30.0, 45.0, 60.0] {
            let lines = r.wrap(text, 14.0, max_width);
            for line in &lines {
                // Only a lone glyph wider than the box may exceed it.
                assert!(
                    r.measure(line, 14.0) <= max_width || line.chars().count() == 1,
                    "{line:?} wider than {max_width}"
                );
            }
            let rejoined: String = lines.concat().chars().filter(|c| *c != ' ').collect();
            let expected: String = text.chars().filter(|c| *c != ' ').collect();
            assert_eq!(rejoined, expected);
        }
    }
}
