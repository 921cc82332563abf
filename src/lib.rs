// Screen capture, annotation, OCR and in-place translation overlay.

pub mod annotation;
pub mod capture;
pub mod clipboard;
pub mod error;
pub mod export;
pub mod font;
pub mod geometry;
pub mod history;
pub mod logging;
pub mod mosaic;
pub mod ocr;
pub mod overlay;
pub mod pipeline;
pub mod pixel_buffer;
pub mod selection;
pub mod settings;
pub mod translation;

// Re-export the main types
pub use annotation::{AnnotationCanvas, AnnotationShape, ShapeKind};
pub use capture::ScreenGrabber;
pub use error::{AppError, AppResult};
pub use geometry::{PixelRect, Point, Rect, Scale, Size};
pub use overlay::OverlayRenderer;
pub use pipeline::{Pipeline, PipelineOutcome, Session};
pub use pixel_buffer::{ChannelOrder, PixelBuffer};
pub use settings::{ConfigManager, Settings};
pub use translation::{TextBlockTranslator, Translator};
