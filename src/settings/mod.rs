//! Persistent user settings.

pub mod defaults;
pub mod manager;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::annotation::{AnnotationCanvas, Color, ToolStyle};
use crate::error::SettingsError;
use crate::export::ExportFormat;
use crate::font::TextRasterizer;
use crate::geometry::Size;
use crate::pixel_buffer::PixelBuffer;
use crate::selection::{self, CaptureMode};
use defaults::*;

pub use manager::ConfigManager;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // Annotation
    /// `#AARRGGBB` or `#RRGGBB`.
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_thickness")]
    pub stroke_thickness: f32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// TrueType/OpenType file used for text shapes and overlay chips.
    #[serde(default)]
    pub font_path: Option<PathBuf>,

    // Languages
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    #[serde(default = "default_source_language")]
    pub source_language: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,

    // Output
    #[serde(default = "default_save_directory")]
    pub save_directory: PathBuf,
    #[serde(default = "default_save_format")]
    pub save_format: String,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default)]
    pub auto_save: bool,

    // Capture
    #[serde(default = "default_capture_mode")]
    pub capture_mode: CaptureMode,
    #[serde(default)]
    pub delay_seconds: u32,

    // History
    #[serde(default = "default_max_history_count")]
    pub max_history_count: usize,
    #[serde(default = "default_keep_history")]
    pub keep_history: bool,

    #[serde(default = "default_ocr_models_dir")]
    pub ocr_models_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stroke_color: default_stroke_color(),
            stroke_thickness: default_stroke_thickness(),
            font_size: default_font_size(),
            font_path: None,

            ocr_language: default_ocr_language(),
            source_language: default_source_language(),
            target_language: default_target_language(),

            save_directory: default_save_directory(),
            save_format: default_save_format(),
            jpeg_quality: default_jpeg_quality(),
            auto_save: false,

            capture_mode: default_capture_mode(),
            delay_seconds: 0,

            max_history_count: default_max_history_count(),
            keep_history: default_keep_history(),

            ocr_models_dir: default_ocr_models_dir(),
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        app_data_dir().join(SETTINGS_FILE_NAME)
    }

    /// Load settings from the default location.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Load settings from `path`.
    ///
    /// Falls back to defaults if the file is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to load settings from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Stroke color, or red when the stored value does not parse.
    pub fn stroke_color(&self) -> Color {
        self.stroke_color.parse().unwrap_or_else(|e| {
            warn!("Invalid stroke color {:?}: {}", self.stroke_color, e);
            Color::RED
        })
    }

    pub fn tool_style(&self) -> ToolStyle {
        ToolStyle {
            color: self.stroke_color(),
            thickness: self.stroke_thickness,
            font_size: self.font_size,
            ..ToolStyle::default()
        }
    }

    /// Selection surface of `screen` logical units in the configured capture mode.
    pub fn selection_model(&self, screen: Size) -> selection::Model {
        selection::Model::new(screen, self.capture_mode)
    }

    /// Annotation canvas over `base` with the configured stroke and text font.
    pub fn annotation_canvas(&self, base: PixelBuffer) -> AnnotationCanvas {
        let mut canvas = AnnotationCanvas::new(base);
        canvas.set_style(self.tool_style());
        canvas.set_font(TextRasterizer::discover(self.font_path.as_deref()));
        canvas
    }

    /// Configured export format, or PNG when unknown.
    pub fn export_format(&self) -> ExportFormat {
        ExportFormat::from_name(&self.save_format, self.jpeg_quality).unwrap_or_else(|e| {
            warn!("{}, saving as PNG", e);
            ExportFormat::Png
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let s: Settings = serde_json::from_str(r#"{"target_language":"ja"}"#).unwrap();
        assert_eq!(s.target_language, "ja");
        assert_eq!(s.stroke_thickness, 2.0);
        assert_eq!(s.ocr_language, "zh-Hans");
        assert_eq!(s.max_history_count, 100);
        assert_eq!(s.capture_mode, CaptureMode::Region);
    }

    #[test]
    fn unreadable_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        assert_eq!(
            Settings::load_from(&dir.path().join("absent.json")),
            Settings::default()
        );
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
        let settings = Settings {
            capture_mode: CaptureMode::Translate,
            font_path: Some(PathBuf::from("/fonts/a.ttf")),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn bad_color_falls_back_to_red() {
        let s = Settings {
            stroke_color: "blue".into(),
            ..Settings::default()
        };
        assert_eq!(s.stroke_color(), Color::RED);
        assert_eq!(Settings::default().tool_style().color, Color::RED);
    }

    #[test]
    fn builds_selection_and_canvas_from_settings() {
        let settings = Settings {
            capture_mode: CaptureMode::Ocr,
            stroke_color: "#FF00FF00".into(),
            stroke_thickness: 5.0,
            font_size: 20.0,
            font_path: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..Settings::default()
        };

        let model = settings.selection_model(Size::new(300.0, 200.0));
        assert_eq!(model.mode(), CaptureMode::Ocr);
        assert_eq!(model.screen(), Size::new(300.0, 200.0));

        let base = PixelBuffer::filled(10, 10, [0, 0, 0, 255]).unwrap();
        let canvas = settings.annotation_canvas(base);
        assert_eq!(canvas.style().color, Color::rgba(0, 255, 0, 255));
        assert_eq!(canvas.style().thickness, 5.0);
        assert_eq!(canvas.style().font_size, 20.0);
        assert_eq!((canvas.base().width(), canvas.base().height()), (10, 10));
    }
}
