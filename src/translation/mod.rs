//! Machine translation seam and result types.

pub mod blocks;
pub mod language;
pub mod mymemory;

use async_trait::async_trait;

use crate::error::TranslateError;

pub use blocks::TextBlockTranslator;
pub use mymemory::MyMemoryTranslator;

/// Translation provider interface.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` to `target`. `source` may be `"auto"`.
    ///
    /// Blank input is rejected with [`TranslateError::EmptyInput`].
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, TranslateError>;

    /// Provider name for logs and UI.
    fn name(&self) -> &str;
}

/// One successful provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    /// Language pair actually sent to the provider.
    pub source: String,
    pub target: String,
    pub provider: String,
}

/// A translated line positioned in source-image pixel space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationBlock {
    pub original_text: String,
    pub translated_text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Outcome of translating a set of lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationResult {
    pub success: bool,
    pub original_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub error: Option<String>,
    pub blocks: Vec<TranslationBlock>,
}
