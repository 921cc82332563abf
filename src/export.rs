// Image export
//
// PNG / JPEG / BMP encoding of a PixelBuffer to bytes or to a file.

use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use tracing::info;

use crate::error::{ExportError, PixelBufferError};
use crate::pixel_buffer::PixelBuffer;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    /// Quality 0-100; values above 100 are clamped.
    Jpeg { quality: u8 },
    Bmp,
}

impl ExportFormat {
    /// Parse a format name (`png`, `jpg`/`jpeg`, `bmp`), case-insensitive.
    pub fn from_name(name: &str, jpeg_quality: u8) -> Result<Self, ExportError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg {
                quality: jpeg_quality.min(100),
            }),
            "bmp" => Ok(Self::Bmp),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Format implied by a path's extension. No extension means PNG.
    pub fn from_path(path: &Path, jpeg_quality: u8) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_name(ext, jpeg_quality),
            None => Ok(Self::Png),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
            Self::Bmp => "bmp",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg { quality } => write!(f, "JPEG (quality {quality})"),
            Self::Bmp => write!(f, "BMP"),
        }
    }
}

/// Encode `image` in `format`.
pub fn encode(image: &PixelBuffer, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Png => Ok(image.encode_png()?),
        ExportFormat::Jpeg { quality } => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(image.to_rgba_image()).to_rgb8();
            let mut bytes = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.min(100));
            rgb.write_with_encoder(encoder)
                .map_err(PixelBufferError::from)?;
            Ok(bytes)
        }
        ExportFormat::Bmp => {
            let mut bytes = Vec::new();
            image
                .to_rgba_image()
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Bmp)
                .map_err(PixelBufferError::from)?;
            Ok(bytes)
        }
    }
}

/// Encode and write `image` to `path`, creating parent directories.
pub fn save(image: &PixelBuffer, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
    let bytes = encode(image, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Write {
            path: parent.display().to_string(),
            source,
        })?;
    }
    fs::write(path, &bytes).map_err(|source| ExportError::Write {
        path: path.display().to_string(),
        source,
    })?;
    info!(
        "Saved {}x{} {} to {}",
        image.width(),
        image.height(),
        format,
        path.display()
    );
    Ok(())
}

/// `screenshot_YYYYMMDD_HHMMSS.<ext>`
pub fn default_file_name(time: DateTime<Local>, format: ExportFormat) -> String {
    format!(
        "screenshot_{}.{}",
        time.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Timestamped path inside `directory`.
pub fn default_save_path(directory: &Path, format: ExportFormat) -> PathBuf {
    directory.join(default_file_name(Local::now(), format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> PixelBuffer {
        let mut img = PixelBuffer::filled(8, 6, [10, 20, 30, 255]).unwrap();
        img.set_pixel(3, 2, [200, 100, 50, 255]);
        img
    }

    #[test]
    fn format_names() {
        assert_eq!(ExportFormat::from_name("PNG", 90).unwrap(), ExportFormat::Png);
        assert_eq!(
            ExportFormat::from_name("jpeg", 150).unwrap(),
            ExportFormat::Jpeg { quality: 100 }
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("a/b.bmp"), 90).unwrap(),
            ExportFormat::Bmp
        );
        assert!(matches!(
            ExportFormat::from_name("gif", 90),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn encoded_bytes_decode_to_same_size() {
        for format in [
            ExportFormat::Png,
            ExportFormat::Jpeg { quality: 80 },
            ExportFormat::Bmp,
        ] {
            let bytes = encode(&sample(), format).unwrap();
            let back = PixelBuffer::decode(&bytes).unwrap();
            assert_eq!((back.width(), back.height()), (8, 6), "{format}");
        }
    }

    #[test]
    fn save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("shot.png");
        save(&sample(), &path, ExportFormat::Png).unwrap();
        let back = PixelBuffer::decode(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(back.rgba_at(3, 2), [200, 100, 50, 255]);
    }

    #[test]
    fn file_name_is_timestamped() {
        let t = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(
            default_file_name(t, ExportFormat::Jpeg { quality: 90 }),
            "screenshot_20240305_070809.jpg"
        );
    }
}
