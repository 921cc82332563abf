// Clipboard output
//
// Copying a capture or recognized text, and the Confirm action that copies a finished
// capture and saves it when auto-save is on.

use std::borrow::Cow;
use std::path::PathBuf;

use arboard::{Clipboard, ImageData};
use tracing::{debug, info};

use crate::error::{AppError, ClipboardError};
use crate::export;
use crate::pixel_buffer::PixelBuffer;
use crate::settings::Settings;

/// Destination for copied images and text.
pub trait ClipboardSink {
    fn set_image(&mut self, image: &PixelBuffer) -> Result<(), ClipboardError>;
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard, opened for each write.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

fn open() -> Result<Clipboard, ClipboardError> {
    Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))
}

impl ClipboardSink for SystemClipboard {
    fn set_image(&mut self, image: &PixelBuffer) -> Result<(), ClipboardError> {
        let rgba = image.to_rgba_image();
        open()?
            .set_image(ImageData {
                width: image.width() as usize,
                height: image.height() as usize,
                bytes: Cow::Owned(rgba.into_raw()),
            })
            .map_err(|e| ClipboardError::Write(e.to_string()))?;
        debug!("Copied {}x{} image to clipboard", image.width(), image.height());
        Ok(())
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        open()?
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

pub fn copy_image(image: &PixelBuffer) -> Result<(), ClipboardError> {
    SystemClipboard.set_image(image)
}

pub fn copy_text(text: &str) -> Result<(), ClipboardError> {
    SystemClipboard.set_text(text)
}

// ==================== Confirm ====================

/// Copy `image` to `sink`, then save it to the save directory when `auto_save` is on.
///
/// The save runs even when the copy fails; the copy error is reported afterwards.
/// Returns the saved path, if any.
pub fn confirm(
    image: &PixelBuffer,
    settings: &Settings,
    sink: &mut dyn ClipboardSink,
) -> Result<Option<PathBuf>, AppError> {
    let copied = sink.set_image(image);

    let saved = if settings.auto_save {
        let format = settings.export_format();
        let path = export::default_save_path(&settings.save_directory, format);
        export::save(image, &path, format)?;
        info!("Auto-saved capture to {}", path.display());
        Some(path)
    } else {
        None
    };

    copied?;
    Ok(saved)
}
