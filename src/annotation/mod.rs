//! Annotation layer: shape records, undo/redo and flattening onto the base image.

mod canvas;
pub mod history;
pub mod render;
pub mod shape;

pub use canvas::{AnnotationCanvas, TextEntry};
pub use history::HistoryManager;
pub use shape::{AnnotationShape, Color, ImagePoint, ShapeKind, ToolStyle};
