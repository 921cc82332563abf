use tracing::debug;

use super::history::HistoryManager;
use super::render;
use super::shape::{AnnotationShape, ImagePoint, ShapeKind, ToolStyle};
use crate::error::PixelBufferError;
use crate::font::TextRasterizer;
use crate::geometry::{Point, Scale, Size};
use crate::mosaic::DEFAULT_BLOCK_SIZE;
use crate::pixel_buffer::PixelBuffer;

/// An open text entry box waiting for input.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntry {
    pub position: ImagePoint,
    pub text: String,
}

/// Annotation editor over a base image.
///
/// Pointer input arrives in display coordinates and is mapped through the canvas [`Scale`]
/// into base-image pixels; every stored shape is in base-image pixel space.
#[derive(Debug)]
pub struct AnnotationCanvas {
    base: PixelBuffer,
    scale: Scale,
    tool: ShapeKind,
    style: ToolStyle,
    history: HistoryManager<AnnotationShape>,
    drag_start: Option<ImagePoint>,
    draft: Option<AnnotationShape>,
    text_entry: Option<TextEntry>,
    mosaic_block: u32,
    font: Option<TextRasterizer>,
}

impl AnnotationCanvas {
    /// Canvas displayed at 1:1 (display units equal image pixels).
    pub fn new(base: PixelBuffer) -> Self {
        Self {
            base,
            scale: Scale::identity(),
            tool: ShapeKind::Rectangle,
            style: ToolStyle::default(),
            history: HistoryManager::new(),
            drag_start: None,
            draft: None,
            text_entry: None,
            mosaic_block: DEFAULT_BLOCK_SIZE,
            font: None,
        }
    }

    /// Set the logical size the base image is displayed at.
    pub fn set_display_size(&mut self, display: Size) {
        self.scale = Scale::between(self.base.width(), self.base.height(), display);
    }

    pub fn set_font(&mut self, font: Option<TextRasterizer>) {
        self.font = font;
    }

    pub fn set_tool(&mut self, tool: ShapeKind) {
        self.tool = tool;
    }

    pub fn tool(&self) -> ShapeKind {
        self.tool
    }

    pub fn set_style(&mut self, style: ToolStyle) {
        self.style = style;
    }

    pub fn style(&self) -> &ToolStyle {
        &self.style
    }

    pub fn set_mosaic_block(&mut self, block: u32) {
        self.mosaic_block = block;
    }

    pub fn base(&self) -> &PixelBuffer {
        &self.base
    }

    pub fn shapes(&self) -> &[AnnotationShape] {
        self.history.active()
    }

    /// Shape being drawn, if a drag is in progress.
    pub fn draft(&self) -> Option<&AnnotationShape> {
        self.draft.as_ref()
    }

    pub fn text_entry(&self) -> Option<&TextEntry> {
        self.text_entry.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn to_image(&self, p: Point) -> ImagePoint {
        let (x, y) = self.scale.map_point_f32(p);
        ImagePoint::new(x, y)
    }

    // ==================== Pointer protocol ====================

    pub fn pointer_down(&mut self, pos: Point) {
        // Clicking elsewhere takes focus away from an open text entry.
        if self.text_entry.is_some() {
            self.commit_text();
        }

        let p = self.to_image(pos);
        match self.tool {
            ShapeKind::Text => {
                self.text_entry = Some(TextEntry {
                    position: p,
                    text: String::new(),
                });
            }
            kind if kind.is_freeform() => {
                self.drag_start = Some(p);
                self.draft = Some(AnnotationShape::new(kind, p, &self.style));
            }
            _ => {
                self.drag_start = Some(p);
                self.draft = None;
            }
        }
    }

    pub fn pointer_move(&mut self, pos: Point) {
        let Some(start) = self.drag_start else {
            return;
        };
        let p = self.to_image(pos);

        if self.tool.is_freeform() {
            if let Some(draft) = self.draft.as_mut() {
                draft.points.push(p);
                draft.end = p;
            }
        } else {
            // Preview is rebuilt from the anchor on every move.
            let mut shape = AnnotationShape::new(self.tool, start, &self.style);
            shape.end = p;
            self.draft = Some(shape);
        }
    }

    /// Finish the drag; the draft (if any) is committed as one history entry.
    pub fn pointer_up(&mut self, pos: Point) {
        if self.drag_start.take().is_none() {
            return;
        }
        let Some(mut shape) = self.draft.take() else {
            // Press and release without movement creates nothing for two-point tools.
            return;
        };
        if shape.kind.is_two_point() {
            shape.end = self.to_image(pos);
        }
        debug!("Committing {:?} annotation", shape.kind);
        self.history.push(shape);
    }

    // ==================== Text entry ====================

    pub fn set_entry_text(&mut self, text: impl Into<String>) {
        if let Some(entry) = self.text_entry.as_mut() {
            entry.text = text.into();
        }
    }

    /// Close the text entry (focus loss). Commits a Text shape unless the text is blank.
    /// Returns true if a shape was committed.
    pub fn commit_text(&mut self) -> bool {
        let Some(entry) = self.text_entry.take() else {
            return false;
        };
        if entry.text.trim().is_empty() {
            return false;
        }
        let mut shape = AnnotationShape::new(ShapeKind::Text, entry.position, &self.style);
        shape.text = entry.text;
        self.history.push(shape);
        true
    }

    pub fn cancel_text(&mut self) {
        self.text_entry = None;
    }

    // ==================== History ====================

    pub fn undo(&mut self) -> bool {
        self.history.undo().is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo().is_some()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.draft = None;
        self.drag_start = None;
        self.text_entry = None;
    }

    // ==================== Rendering ====================

    /// Base image plus committed shapes plus whatever is in progress.
    pub fn render_preview(&self) -> Result<PixelBuffer, PixelBufferError> {
        let entry_shape = self.text_entry.as_ref().map(|entry| {
            let mut s = AnnotationShape::new(ShapeKind::Text, entry.position, &self.style);
            s.text = entry.text.clone();
            s
        });
        let shapes: Vec<&AnnotationShape> = self
            .history
            .active()
            .iter()
            .chain(self.draft.as_ref())
            .chain(entry_shape.as_ref())
            .collect();
        render::render(&self.base, &shapes, self.font.as_ref(), self.mosaic_block)
    }

    /// Base image plus committed shapes, at base-image pixel size.
    pub fn flatten(&self) -> Result<PixelBuffer, PixelBufferError> {
        let shapes: Vec<&AnnotationShape> = self.history.active().iter().collect();
        render::render(&self.base, &shapes, self.font.as_ref(), self.mosaic_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> AnnotationCanvas {
        AnnotationCanvas::new(PixelBuffer::filled(100, 80, [255, 255, 255, 255]).unwrap())
    }

    #[test]
    fn drag_commits_one_shape() {
        let mut c = canvas();
        c.pointer_down(Point::new(10.0, 10.0));
        c.pointer_move(Point::new(20.0, 20.0));
        c.pointer_move(Point::new(30.0, 25.0));
        assert_eq!(c.shapes().len(), 0);
        assert!(c.draft().is_some());

        c.pointer_up(Point::new(30.0, 25.0));
        assert_eq!(c.shapes().len(), 1);
        assert_eq!(c.shapes()[0].end, ImagePoint::new(30.0, 25.0));
        assert!(c.draft().is_none());
    }

    #[test]
    fn click_without_move_creates_nothing() {
        let mut c = canvas();
        c.pointer_down(Point::new(10.0, 10.0));
        c.pointer_up(Point::new(10.0, 10.0));
        assert!(c.shapes().is_empty());
    }

    #[test]
    fn freeform_collects_points() {
        let mut c = canvas();
        c.set_tool(ShapeKind::FreeDraw);
        c.pointer_down(Point::new(1.0, 1.0));
        for i in 2..6 {
            c.pointer_move(Point::new(i as f64, i as f64));
        }
        c.pointer_up(Point::new(5.0, 5.0));
        assert_eq!(c.shapes()[0].points.len(), 5);
    }

    #[test]
    fn pointer_maps_through_display_scale() {
        let mut c = canvas();
        c.set_display_size(Size::new(50.0, 40.0));
        c.pointer_down(Point::new(5.0, 5.0));
        c.pointer_move(Point::new(10.0, 10.0));
        c.pointer_up(Point::new(10.0, 10.0));
        let s = &c.shapes()[0];
        assert_eq!(s.start, ImagePoint::new(10.0, 10.0));
        assert_eq!(s.end, ImagePoint::new(20.0, 20.0));
    }

    #[test]
    fn blank_text_is_discarded() {
        let mut c = canvas();
        c.set_tool(ShapeKind::Text);
        c.pointer_down(Point::new(5.0, 5.0));
        c.set_entry_text("   ");
        assert!(!c.commit_text());
        assert!(c.shapes().is_empty());

        c.pointer_down(Point::new(5.0, 5.0));
        c.set_entry_text("note");
        // Clicking elsewhere commits the open entry.
        c.pointer_down(Point::new(50.0, 50.0));
        assert_eq!(c.shapes().len(), 1);
        assert_eq!(c.shapes()[0].text, "note");
        assert!(c.text_entry().is_some());
    }

    #[test]
    fn flatten_matches_base_size() {
        let mut c = canvas();
        c.pointer_down(Point::new(10.0, 10.0));
        c.pointer_move(Point::new(90.0, 70.0));
        c.pointer_up(Point::new(90.0, 70.0));
        let out = c.flatten().unwrap();
        assert_eq!((out.width(), out.height()), (100, 80));
        assert_ne!(out, *c.base());
    }
}
