//! Text recognition data model and adapter seam.
//!
//! Recognition itself is an external collaborator behind [`TextRecognizer`]. The PaddleOCR
//! backend lives in `engine` behind the `paddle` feature.

#[cfg(feature = "paddle")]
pub mod engine;
mod layout;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OcrError;
use crate::pixel_buffer::PixelBuffer;

pub use layout::{LINE_GROUP_THRESHOLD, group_into_lines};

/// Axis-aligned box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub bounding_rect: BoundingBox,
}

impl OcrWord {
    pub fn new(text: impl Into<String>, bounding_rect: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bounding_rect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OcrLine {
    pub text: String,
    pub words: Vec<OcrWord>,
}

impl OcrLine {
    /// Line whose text is its words joined by single spaces.
    pub fn from_words(words: Vec<OcrWord>) -> Self {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text, words }
    }
}

/// Everything recognized in one image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OcrResult {
    /// All line texts joined by `\n`.
    pub text: String,
    pub lines: Vec<OcrLine>,
}

impl OcrResult {
    pub fn from_lines(lines: Vec<OcrLine>) -> Self {
        let text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self { text, lines }
    }

    /// True when nothing but whitespace was recognized.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Recognition backend.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in `image`. `language_tag` is a BCP-47 style tag such as `zh-Hans`.
    ///
    /// Returns [`OcrError::EngineUnavailable`] when no engine exists for the tag.
    async fn recognize(&self, image: &PixelBuffer, language_tag: &str)
    -> Result<OcrResult, OcrError>;
}

/// Map a language tag to the recognition model family that reads it.
///
/// Matching is on the primary subtag, case-insensitively; `zh-Hans`, `zh-CN` and `zh` all
/// select the Chinese model (which also covers Japanese).
pub fn model_family(language_tag: &str) -> Option<&'static str> {
    let primary = language_tag
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let family = match primary.as_str() {
        "zh" | "ja" => "chinese",
        "en" => "english",
        "ko" => "korean",
        "ar" | "fa" | "ur" => "arabic",
        "ru" | "uk" | "be" | "bg" | "sr" => "cyrillic",
        "hi" | "mr" | "ne" => "devanagari",
        "fr" | "de" | "es" | "pt" | "it" | "nl" | "pl" | "vi" | "tr" | "id" => "latin",
        "el" => "greek",
        "th" => "thai",
        "ta" => "tamil",
        "te" => "telugu",
        _ => return None,
    };
    Some(family)
}

/// Placeholder used when the build has no recognition backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecognizer;

#[async_trait]
impl TextRecognizer for NoRecognizer {
    async fn recognize(
        &self,
        _image: &PixelBuffer,
        language_tag: &str,
    ) -> Result<OcrResult, OcrError> {
        Err(OcrError::EngineUnavailable(format!(
            "{language_tag} (built without the `paddle` feature)"
        )))
    }
}

/// Best recognizer this build offers for models stored in `models_dir`.
pub fn default_recognizer(models_dir: &Path) -> Arc<dyn TextRecognizer> {
    #[cfg(feature = "paddle")]
    {
        Arc::new(engine::PaddleRecognizer::new(models_dir))
    }
    #[cfg(not(feature = "paddle"))]
    {
        tracing::debug!("No OCR backend compiled in, ignoring {}", models_dir.display());
        Arc::new(NoRecognizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_text_joins_lines() {
        let result = OcrResult::from_lines(vec![
            OcrLine::from_words(vec![
                OcrWord::new("hello", BoundingBox::new(0.0, 0.0, 10.0, 5.0)),
                OcrWord::new("world", BoundingBox::new(12.0, 0.0, 10.0, 5.0)),
            ]),
            OcrLine::from_words(vec![OcrWord::new(
                "second",
                BoundingBox::new(0.0, 10.0, 10.0, 5.0),
            )]),
        ]);
        assert_eq!(result.text, "hello world\nsecond");
        assert!(!result.is_empty());
        assert!(OcrResult::default().is_empty());
    }

    #[test]
    fn language_tags_map_to_models() {
        assert_eq!(model_family("zh-Hans"), Some("chinese"));
        assert_eq!(model_family("en-US"), Some("english"));
        assert_eq!(model_family("FR"), Some("latin"));
        assert_eq!(model_family("xx"), None);
        assert_eq!(model_family(""), None);
    }
}
