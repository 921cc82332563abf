// PaddleOCR (MNN) backend via ocr-rs
//
// Model files live in one directory: a shared detection model plus a recognition model and
// charset per language family. An engine is built per request on a blocking thread.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ocr_rs::OcrEngine;
use tracing::{debug, info, warn};

use super::{BoundingBox, OcrResult, OcrWord, TextRecognizer, group_into_lines, model_family};
use crate::error::OcrError;
use crate::pixel_buffer::PixelBuffer;

const DETECTION_MODEL: &str = "PP-OCRv5_mobile_det.mnn";

/// (family, recognition model, charset)
const LANGUAGE_MODELS: &[(&str, &str, &str)] = &[
    ("chinese", "PP-OCRv5_mobile_rec.mnn", "ppocr_keys_v5.txt"),
    ("english", "en_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_en.txt"),
    ("korean", "korean_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_korean.txt"),
    ("arabic", "arabic_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_arabic.txt"),
    ("cyrillic", "cyrillic_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_cyrillic.txt"),
    ("devanagari", "devanagari_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_devanagari.txt"),
    ("latin", "latin_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_latin.txt"),
    ("greek", "el_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_el.txt"),
    ("thai", "th_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_th.txt"),
    ("tamil", "ta_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_ta.txt"),
    ("telugu", "te_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_te.txt"),
];

#[derive(Debug, Clone)]
struct ModelPaths {
    det: PathBuf,
    rec: PathBuf,
    charset: PathBuf,
}

/// Recognizer backed by PaddleOCR models in `models_dir`.
#[derive(Debug, Clone)]
pub struct PaddleRecognizer {
    models_dir: PathBuf,
}

impl PaddleRecognizer {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// Model families whose recognition model and charset are both present.
    pub fn available_families(&self) -> Vec<&'static str> {
        LANGUAGE_MODELS
            .iter()
            .filter(|(_, rec, charset)| {
                self.models_dir.join(rec).exists() && self.models_dir.join(charset).exists()
            })
            .map(|(family, _, _)| *family)
            .collect()
    }

    /// Paths for the tag's family. A tag with no mapped or installed family falls back to the
    /// first installed family; `None` only when no family or the detection model is missing.
    fn model_paths(&self, language_tag: &str) -> Option<ModelPaths> {
        let det = self.models_dir.join(DETECTION_MODEL);
        if !det.exists() {
            return None;
        }
        let available = self.available_families();
        let family = match model_family(language_tag) {
            Some(family) if available.contains(&family) => family,
            requested => {
                let fallback = *available.first()?;
                warn!(
                    "No OCR models for {} ({}), falling back to {}",
                    language_tag,
                    requested.unwrap_or("unmapped"),
                    fallback
                );
                fallback
            }
        };
        let (_, rec, charset) = LANGUAGE_MODELS.iter().find(|(f, _, _)| *f == family)?;
        Some(ModelPaths {
            det,
            rec: self.models_dir.join(rec),
            charset: self.models_dir.join(charset),
        })
    }
}

fn run_engine(paths: &ModelPaths, image: image::DynamicImage) -> Result<Vec<OcrWord>> {
    let engine = OcrEngine::new(&paths.det, &paths.rec, &paths.charset, None)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to create OCR engine")?;
    let raw = engine
        .recognize(&image)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("OCR recognition failed")?;

    Ok(raw
        .into_iter()
        .map(|r| {
            OcrWord::new(
                r.text,
                BoundingBox::new(
                    r.bbox.rect.left() as f64,
                    r.bbox.rect.top() as f64,
                    r.bbox.rect.width() as f64,
                    r.bbox.rect.height() as f64,
                ),
            )
        })
        .collect())
}

fn describe(path: &Path) -> String {
    path.display().to_string()
}

#[async_trait]
impl TextRecognizer for PaddleRecognizer {
    async fn recognize(
        &self,
        image: &PixelBuffer,
        language_tag: &str,
    ) -> Result<OcrResult, OcrError> {
        let paths = self.model_paths(language_tag).ok_or_else(|| {
            OcrError::EngineUnavailable(format!(
                "{language_tag} (models in {})",
                describe(&self.models_dir)
            ))
        })?;
        debug!("Recognizing with {}", describe(&paths.rec));

        let dynamic = image::DynamicImage::ImageRgba8(image.to_rgba_image());
        let words = tokio::task::spawn_blocking(move || run_engine(&paths, dynamic))
            .await
            .map_err(|e| OcrError::ProcessingError(e.to_string()))?
            .map_err(|e| OcrError::ProcessingError(format!("{e:#}")))?;

        let lines = group_into_lines(words);
        info!("OCR recognized {} line(s)", lines.len());
        Ok(OcrResult::from_lines(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install(dir: &Path, files: &[&str]) {
        for file in files {
            std::fs::write(dir.join(file), b"").unwrap();
        }
    }

    #[test]
    fn mapped_family_is_used_when_installed() {
        let dir = tempfile::tempdir().unwrap();
        install(
            dir.path(),
            &[DETECTION_MODEL, "PP-OCRv5_mobile_rec.mnn", "ppocr_keys_v5.txt"],
        );
        install(dir.path(), &["ppocr_keys_en.txt", "en_PP-OCRv5_mobile_rec_infer.mnn"]);
        let recognizer = PaddleRecognizer::new(dir.path());

        let paths = recognizer.model_paths("en-US").unwrap();
        assert!(paths.rec.ends_with("en_PP-OCRv5_mobile_rec_infer.mnn"));
        let paths = recognizer.model_paths("ja").unwrap();
        assert!(paths.charset.ends_with("ppocr_keys_v5.txt"));
    }

    #[test]
    fn unmapped_or_missing_families_fall_back_to_an_installed_one() {
        let dir = tempfile::tempdir().unwrap();
        install(
            dir.path(),
            &[DETECTION_MODEL, "korean_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_korean.txt"],
        );
        let recognizer = PaddleRecognizer::new(dir.path());
        assert_eq!(recognizer.available_families(), vec!["korean"]);

        for tag in ["xx-YY", "fr-FR", ""] {
            let paths = recognizer.model_paths(tag).unwrap();
            assert!(paths.rec.ends_with("korean_PP-OCRv5_mobile_rec_infer.mnn"), "{tag}");
        }
    }

    #[test]
    fn nothing_installed_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PaddleRecognizer::new(dir.path()).model_paths("en").is_none());

        // Recognition models without the shared detector are not enough.
        install(dir.path(), &["en_PP-OCRv5_mobile_rec_infer.mnn", "ppocr_keys_en.txt"]);
        assert!(PaddleRecognizer::new(dir.path()).model_paths("en").is_none());
    }
}
