//! Line-by-line translation of recognized text into positioned blocks.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{TranslationBlock, TranslationResult, Translator};
use crate::error::TranslateError;
use crate::ocr::OcrLine;

/// Pause after every processed line.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);
/// Upper bound on a single translation call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Source-pixel geometry of a line: origin of its first word, summed word widths and tallest
/// word height. A line without words sits at the origin with zero size.
pub fn line_geometry(line: &OcrLine) -> (f64, f64, f64, f64) {
    let (x, y) = line
        .words
        .first()
        .map(|w| (w.bounding_rect.x, w.bounding_rect.y))
        .unwrap_or((0.0, 0.0));
    let width = line.words.iter().map(|w| w.bounding_rect.width).sum();
    let height = line
        .words
        .iter()
        .map(|w| w.bounding_rect.height)
        .fold(0.0, f64::max);
    (x, y, width, height)
}

/// Turns recognized lines into translated, positioned blocks.
///
/// Requests go out one at a time in recognition order.
pub struct TextBlockTranslator {
    translator: Arc<dyn Translator>,
    pacing: Duration,
    call_timeout: Duration,
}

impl TextBlockTranslator {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self {
            translator,
            pacing: DEFAULT_PACING,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub async fn translate_lines(
        &self,
        lines: &[OcrLine],
        source: &str,
        target: &str,
    ) -> TranslationResult {
        self.translate_lines_while(lines, source, target, &|| true)
            .await
    }

    /// Like [`Self::translate_lines`], but stops before the next line once `is_live` returns
    /// false. An aborted batch has `success == false` and keeps the blocks done so far.
    pub async fn translate_lines_while(
        &self,
        lines: &[OcrLine],
        source: &str,
        target: &str,
        is_live: &(dyn Fn() -> bool + Send + Sync),
    ) -> TranslationResult {
        let mut result = TranslationResult {
            source_lang: source.to_string(),
            target_lang: target.to_string(),
            ..Default::default()
        };
        let mut originals = Vec::new();
        let mut translations = Vec::new();

        for line in lines {
            if line.text.trim().is_empty() {
                continue;
            }
            if !is_live() {
                debug!("Translation batch aborted after {} block(s)", result.blocks.len());
                result.error = Some("Translation cancelled".to_string());
                result.original_text = originals.join("\n");
                result.translated_text = translations.join("\n");
                return result;
            }

            let translated = match self.translate_one(&line.text, source, target).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Keeping original text for {:?}: {}", line.text, e);
                    line.text.clone()
                }
            };

            let (x, y, width, height) = line_geometry(line);
            originals.push(line.text.clone());
            translations.push(translated.clone());
            result.blocks.push(TranslationBlock {
                original_text: line.text.clone(),
                translated_text: translated,
                x,
                y,
                width,
                height,
            });

            tokio::time::sleep(self.pacing).await;
        }

        result.success = true;
        result.original_text = originals.join("\n");
        result.translated_text = translations.join("\n");
        result
    }

    async fn translate_one(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let call = self.translator.translate(text, source, target);
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result.map(|t| t.text),
            Err(_) => Err(TranslateError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{BoundingBox, OcrWord};

    #[test]
    fn geometry_sums_widths_and_takes_max_height() {
        let line = OcrLine::from_words(vec![
            OcrWord::new("a", BoundingBox::new(10.0, 20.0, 30.0, 12.0)),
            OcrWord::new("b", BoundingBox::new(50.0, 18.0, 25.0, 16.0)),
        ]);
        assert_eq!(line_geometry(&line), (10.0, 20.0, 55.0, 16.0));
        assert_eq!(line_geometry(&OcrLine::default()), (0.0, 0.0, 0.0, 0.0));
    }
}
