//! Stateless shape renderer.
//!
//! Vector shapes go through tiny-skia, text through [`TextRasterizer`], and Mosaic shapes
//! through [`crate::mosaic`] against whatever has been drawn so far.

use image::{Rgba, RgbaImage};
use tiny_skia::{
    ColorU8, FillRule, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};
use tracing::debug;

use super::shape::{AnnotationShape, ImagePoint, ShapeKind, TEXT_PADDING};
use crate::error::PixelBufferError;
use crate::font::TextRasterizer;
use crate::mosaic;
use crate::pixel_buffer::PixelBuffer;

/// Cubic bezier control distance for a quarter ellipse.
const BEZIER_K: f32 = 0.552_284_8;

/// Draw `shapes` in order over a copy of `base`. The output has the base's size and channel
/// order.
pub fn render(
    base: &PixelBuffer,
    shapes: &[&AnnotationShape],
    font: Option<&TextRasterizer>,
    mosaic_block: u32,
) -> Result<PixelBuffer, PixelBufferError> {
    let mut img = base.to_rgba_image();

    for run in shapes.chunk_by(|a, b| is_vector(a) == is_vector(b)) {
        if is_vector(run[0]) {
            with_pixmap(&mut img, |pixmap| {
                for shape in run {
                    draw_vector(pixmap, shape);
                }
            });
            continue;
        }
        for shape in run {
            match shape.kind {
                ShapeKind::Mosaic => {
                    let mut buf = PixelBuffer::from_rgba_image(img)?;
                    mosaic::apply_in_place(&mut buf, shape.pixel_bounds(), mosaic_block);
                    img = buf.to_rgba_image();
                }
                ShapeKind::Text => draw_text(&mut img, shape, font),
                _ => {}
            }
        }
    }

    Ok(PixelBuffer::from_rgba_image(img)?.to_order(base.channel_order()))
}

fn is_vector(shape: &AnnotationShape) -> bool {
    !matches!(shape.kind, ShapeKind::Mosaic | ShapeKind::Text)
}

/// Premultiply into a Pixmap, draw, and copy back.
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let Some(size) = IntSize::from_wh(img.width(), img.height()) else {
        return;
    };
    let mut data = Vec::with_capacity(img.as_raw().len());
    for p in img.pixels() {
        let c = ColorU8::from_rgba(p[0], p[1], p[2], p[3]).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let Some(mut pixmap) = Pixmap::from_vec(data, size) else {
        return;
    };

    f(&mut pixmap);

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
}

fn paint_for(shape: &AnnotationShape) -> Paint<'static> {
    let c = shape.stroke_color.with_opacity(shape.opacity);
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;
    paint
}

fn stroke_for(shape: &AnnotationShape) -> Stroke {
    Stroke {
        width: shape.stroke_thickness.max(0.5),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

fn build_ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<tiny_skia::Path> {
    let kx = rx * BEZIER_K;
    let ky = ry * BEZIER_K;

    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy - ry);
    pb.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
    pb.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
    pb.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
    pb.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
    pb.close();
    pb.finish()
}

fn build_polyline(points: &[ImagePoint]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.finish()
}

fn draw_vector(pixmap: &mut Pixmap, shape: &AnnotationShape) {
    let paint = paint_for(shape);
    let stroke = stroke_for(shape);
    let identity = Transform::identity();
    let (x, y, w, h) = shape.bounds();

    match shape.kind {
        ShapeKind::Rectangle => {
            let Some(rect) = tiny_skia::Rect::from_xywh(x, y, w, h) else {
                return;
            };
            let path = PathBuilder::from_rect(rect);
            if shape.filled {
                pixmap.fill_path(&path, &paint, FillRule::Winding, identity, None);
            } else {
                pixmap.stroke_path(&path, &paint, &stroke, identity, None);
            }
        }
        ShapeKind::Ellipse => {
            let Some(path) = build_ellipse_path(x + w / 2.0, y + h / 2.0, w / 2.0, h / 2.0) else {
                return;
            };
            if shape.filled {
                pixmap.fill_path(&path, &paint, FillRule::Winding, identity, None);
            } else {
                pixmap.stroke_path(&path, &paint, &stroke, identity, None);
            }
        }
        ShapeKind::Line | ShapeKind::Arrow => {
            if let Some(path) = build_polyline(&[shape.start, shape.end]) {
                pixmap.stroke_path(&path, &paint, &stroke, identity, None);
            }
            if shape.kind == ShapeKind::Arrow {
                let [a, b] = shape.arrow_head();
                let mut pb = PathBuilder::new();
                pb.move_to(shape.end.x, shape.end.y);
                pb.line_to(a.x, a.y);
                pb.line_to(b.x, b.y);
                pb.close();
                if let Some(head) = pb.finish() {
                    pixmap.fill_path(&head, &paint, FillRule::Winding, identity, None);
                }
            }
        }
        ShapeKind::FreeDraw | ShapeKind::Highlighter => {
            if let [only] = shape.points.as_slice() {
                // A click without movement leaves a dot.
                if let Some(dot) = PathBuilder::from_circle(only.x, only.y, stroke.width / 2.0) {
                    pixmap.fill_path(&dot, &paint, FillRule::Winding, identity, None);
                }
            } else if let Some(path) = build_polyline(&shape.points) {
                pixmap.stroke_path(&path, &paint, &stroke, identity, None);
            }
        }
        ShapeKind::Text | ShapeKind::Mosaic => {}
    }
}

fn draw_text(img: &mut RgbaImage, shape: &AnnotationShape, font: Option<&TextRasterizer>) {
    if shape.text.trim().is_empty() {
        return;
    }
    let Some(font) = font else {
        debug!("No font loaded, skipping text annotation");
        return;
    };
    let color = shape.stroke_color.with_opacity(shape.opacity);
    font.draw(
        img,
        shape.start.x + TEXT_PADDING.0,
        shape.start.y + TEXT_PADDING.1,
        &shape.text,
        color.to_array(),
        shape.font_size,
    );
}
