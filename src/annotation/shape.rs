use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::PixelRect;

// ==================== Constants ====================

pub const ARROW_HEAD_LENGTH: f32 = 15.0;
/// Half-angle between the shaft and each head edge.
pub const ARROW_HEAD_ANGLE: f32 = PI / 6.0;
pub const HIGHLIGHTER_THICKNESS_FACTOR: f32 = 4.0;
pub const HIGHLIGHTER_OPACITY: f32 = 0.4;
/// Padding around committed text, horizontal then vertical.
pub const TEXT_PADDING: (f32, f32) = (4.0, 2.0);

// ==================== Color ====================

/// Straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with alpha multiplied by `opacity` (0.0..=1.0).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::RED
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(pub String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color '{}', expected #AARRGGBB or #RRGGBB", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parses `#AARRGGBB` and `#RRGGBB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2).ok_or_else(err)?, 16).map_err(|_| err());
        match hex.len() {
            8 => Ok(Color::rgba(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
            6 => Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

// ==================== Shapes ====================

/// Point in base-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Annotation kind, also used as the canvas tool selector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Arrow,
    Line,
    FreeDraw,
    Highlighter,
    Text,
    Mosaic,
}

impl ShapeKind {
    /// Tools that accumulate a point path instead of a start/end pair.
    pub fn is_freeform(&self) -> bool {
        matches!(self, Self::FreeDraw | Self::Highlighter)
    }

    /// Tools whose draft is rebuilt from start/end on every move.
    pub fn is_two_point(&self) -> bool {
        matches!(
            self,
            Self::Rectangle | Self::Ellipse | Self::Arrow | Self::Line | Self::Mosaic
        )
    }
}

/// A committed or in-progress annotation.
///
/// Pure data; rendering lives in [`super::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationShape {
    pub kind: ShapeKind,
    pub start: ImagePoint,
    pub end: ImagePoint,
    /// Path for FreeDraw and Highlighter.
    pub points: Vec<ImagePoint>,
    pub stroke_color: Color,
    pub stroke_thickness: f32,
    pub text: String,
    pub font_size: f32,
    pub filled: bool,
    pub opacity: f32,
}

impl AnnotationShape {
    pub fn new(kind: ShapeKind, start: ImagePoint, style: &ToolStyle) -> Self {
        let (thickness, opacity) = match kind {
            ShapeKind::Highlighter => (
                style.thickness * HIGHLIGHTER_THICKNESS_FACTOR,
                HIGHLIGHTER_OPACITY,
            ),
            _ => (style.thickness, 1.0),
        };
        Self {
            kind,
            start,
            end: start,
            points: if kind.is_freeform() { vec![start] } else { Vec::new() },
            stroke_color: style.color,
            stroke_thickness: thickness,
            text: String::new(),
            font_size: style.font_size,
            filled: style.filled,
            opacity,
        }
    }

    /// Normalized `(x, y, width, height)` of the start/end pair.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (
            self.start.x.min(self.end.x),
            self.start.y.min(self.end.y),
            (self.end.x - self.start.x).abs(),
            (self.end.y - self.start.y).abs(),
        )
    }

    /// Start/end rectangle truncated to whole pixels (Mosaic region).
    pub fn pixel_bounds(&self) -> PixelRect {
        let (x, y, w, h) = self.bounds();
        PixelRect::new(x as i32, y as i32, w as i32, h as i32)
    }

    /// The two base corners of the arrow head; the tip is `end`.
    pub fn arrow_head(&self) -> [ImagePoint; 2] {
        let angle = (self.end.y - self.start.y).atan2(self.end.x - self.start.x);
        let corner = |offset: f32| {
            ImagePoint::new(
                self.end.x - ARROW_HEAD_LENGTH * (angle + offset).cos(),
                self.end.y - ARROW_HEAD_LENGTH * (angle + offset).sin(),
            )
        };
        [corner(-ARROW_HEAD_ANGLE), corner(ARROW_HEAD_ANGLE)]
    }
}

/// Current tool settings applied to newly created shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolStyle {
    pub color: Color,
    pub thickness: f32,
    pub font_size: f32,
    pub filled: bool,
}

impl Default for ToolStyle {
    fn default() -> Self {
        Self {
            color: Color::RED,
            thickness: 2.0,
            font_size: 14.0,
            filled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_argb_and_rgb() {
        assert_eq!("#FFFF0000".parse::<Color>().unwrap(), Color::RED);
        assert_eq!(
            "#800000FF".parse::<Color>().unwrap(),
            Color::rgba(0, 0, 255, 128)
        );
        assert_eq!("#00FF00".parse::<Color>().unwrap(), Color::rgba(0, 255, 0, 255));
        assert!("FF0000".parse::<Color>().is_err());
        assert!("#GG0000".parse::<Color>().is_err());
        assert_eq!(Color::RED.to_string(), "#FFFF0000");
    }

    #[test]
    fn highlighter_is_wide_and_translucent() {
        let style = ToolStyle::default();
        let s = AnnotationShape::new(ShapeKind::Highlighter, ImagePoint::new(1.0, 1.0), &style);
        assert_eq!(s.stroke_thickness, 8.0);
        assert_eq!(s.opacity, 0.4);
        assert_eq!(s.points.len(), 1);
    }

    #[test]
    fn arrow_head_points_back_along_the_shaft() {
        let style = ToolStyle::default();
        let mut s = AnnotationShape::new(ShapeKind::Arrow, ImagePoint::new(0.0, 0.0), &style);
        s.end = ImagePoint::new(100.0, 0.0);
        let [a, b] = s.arrow_head();
        let dx = ARROW_HEAD_LENGTH * ARROW_HEAD_ANGLE.cos();
        let dy = ARROW_HEAD_LENGTH * ARROW_HEAD_ANGLE.sin();
        assert!((a.x - (100.0 - dx)).abs() < 1e-4 && (a.y - dy).abs() < 1e-4);
        assert!((b.x - (100.0 - dx)).abs() < 1e-4 && (b.y + dy).abs() < 1e-4);
    }
}
