// Unified Error Handling Module
//
// Centralized error types for consistent error management across the crate

use std::io;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Pixel buffer error: {0}")]
    PixelBuffer(#[from] PixelBufferError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Pixel buffer construction and codec errors
#[derive(Debug, Error)]
pub enum PixelBufferError {
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Stride {stride} is smaller than a row of {width} pixels")]
    InvalidStride { stride: usize, width: u32 },

    #[error("Pixel data length {actual} does not match stride*height = {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Image codec failed: {0}")]
    Codec(#[from] image::ImageError),
}

/// Screen capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Invalid capture region {width}x{height}")]
    InvalidRegion { width: i32, height: i32 },

    #[error("Region ({x}, {y}, {width}x{height}) is outside the captured surface")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("Screen capture failed: {0}")]
    Platform(String),

    #[error("Screen capture is not supported on this platform")]
    Unsupported,

    #[error(transparent)]
    Buffer(#[from] PixelBufferError),
}

/// OCR-related errors
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("No OCR engine available for language '{0}'")]
    EngineUnavailable(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("OCR initialization failed: {0}")]
    InitializationError(String),
}

/// Translation errors
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("Text to translate is empty")]
    EmptyInput,

    #[error("Translation failed with status {0}")]
    BadStatus(i64),

    #[error("Translation request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed translation response: {0}")]
    Malformed(String),
}

/// Image export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export format '{0}'")]
    UnsupportedFormat(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Encode(#[from] PixelBufferError),
}

/// System clipboard errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard is unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write to the clipboard: {0}")]
    Write(String),
}

/// Settings and history persistence errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
