//! Owned 32-bit pixel storage.
//!
//! A [`PixelBuffer`] is the unit of exchange between capture, selection, annotation, OCR and
//! overlay code. Every transform (crop, resize, channel swap) allocates a new buffer; no view
//! outlives its source.

use std::fmt;
use std::io::Cursor;

use image::imageops::FilterType;
use image::{ImageFormat, RgbaImage};

use crate::error::PixelBufferError;
use crate::geometry::PixelRect;

/// Byte order of the four channels of each pixel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    #[default]
    Rgba,
    /// Native order of Win32 DIB sections.
    Bgra,
}

/// Owned 2D array of 4-byte pixels.
///
/// Invariant: `pixels.len() == stride * height` and `stride >= width * 4`.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    pixels: Vec<u8>,
    order: ChannelOrder,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// Zero-filled (transparent black) buffer with a packed stride.
    pub fn new(width: u32, height: u32, order: ChannelOrder) -> Result<Self, PixelBufferError> {
        Self::check_dimensions(width, height)?;
        let stride = width as usize * 4;
        Ok(Self {
            width,
            height,
            stride,
            pixels: vec![0; stride * height as usize],
            order,
        })
    }

    /// Buffer with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, PixelBufferError> {
        Self::check_dimensions(width, height)?;
        let pixels = rgba.repeat(width as usize * height as usize);
        Ok(Self {
            width,
            height,
            stride: width as usize * 4,
            pixels,
            order: ChannelOrder::Rgba,
        })
    }

    /// Wrap raw bytes, validating the length invariant.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: usize,
        pixels: Vec<u8>,
        order: ChannelOrder,
    ) -> Result<Self, PixelBufferError> {
        Self::check_dimensions(width, height)?;
        if stride < width as usize * 4 {
            return Err(PixelBufferError::InvalidStride { stride, width });
        }
        let expected = stride * height as usize;
        if pixels.len() != expected {
            return Err(PixelBufferError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            pixels,
            order,
        })
    }

    pub fn from_rgba_image(img: RgbaImage) -> Result<Self, PixelBufferError> {
        let (width, height) = img.dimensions();
        Self::from_raw(
            width,
            height,
            width as usize * 4,
            img.into_raw(),
            ChannelOrder::Rgba,
        )
    }

    /// Decode any format supported by the `image` crate (PNG, JPEG, BMP, ...).
    pub fn decode(bytes: &[u8]) -> Result<Self, PixelBufferError> {
        let img = image::load_from_memory(bytes)?;
        Self::from_rgba_image(img.to_rgba8())
    }

    fn check_dimensions(width: u32, height: u32) -> Result<(), PixelBufferError> {
        if width == 0 || height == 0 {
            return Err(PixelBufferError::InvalidDimensions { width, height });
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * 4
    }

    /// Raw pixel bytes in the buffer's own channel order.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&value);
    }

    /// Pixel normalized to RGBA regardless of storage order.
    pub fn rgba_at(&self, x: u32, y: u32) -> [u8; 4] {
        let p = self.pixel(x, y);
        match self.order {
            ChannelOrder::Rgba => p,
            ChannelOrder::Bgra => [p[2], p[1], p[0], p[3]],
        }
    }

    /// The `width * 4` meaningful bytes of row `y` (padding excluded).
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.pixels[start..start + self.width as usize * 4]
    }

    /// Packed RGBA copy for the `image` / `tiny-skia` ecosystems.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut raw = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            let row = self.row(y);
            match self.order {
                ChannelOrder::Rgba => raw.extend_from_slice(row),
                ChannelOrder::Bgra => {
                    for px in row.chunks_exact(4) {
                        raw.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
            }
        }
        // Dimensions and length agree by construction.
        RgbaImage::from_raw(self.width, self.height, raw).unwrap_or_default()
    }

    /// Copy with the requested channel order and a packed stride.
    pub fn to_order(&self, order: ChannelOrder) -> PixelBuffer {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            let row = self.row(y);
            if order == self.order {
                out.extend_from_slice(row);
            } else {
                for px in row.chunks_exact(4) {
                    out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            stride: self.width as usize * 4,
            pixels: out,
            order,
        }
    }

    /// Copy out `rect` after clamping it to the buffer; `None` if nothing is left.
    pub fn crop(&self, rect: PixelRect) -> Option<PixelBuffer> {
        let r = rect.clamp_to(self.width, self.height);
        if r.is_empty() {
            return None;
        }
        let (w, h) = (r.width as u32, r.height as u32);
        let mut pixels = Vec::with_capacity(w as usize * h as usize * 4);
        for y in r.y as u32..r.y as u32 + h {
            let start = self.offset(r.x as u32, y);
            pixels.extend_from_slice(&self.pixels[start..start + w as usize * 4]);
        }
        Some(PixelBuffer {
            width: w,
            height: h,
            stride: w as usize * 4,
            pixels,
            order: self.order,
        })
    }

    /// Resize to exactly `width`×`height`.
    pub fn resize(&self, width: u32, height: u32) -> Result<PixelBuffer, PixelBufferError> {
        Self::check_dimensions(width, height)?;
        let resized =
            image::imageops::resize(&self.to_rgba_image(), width, height, FilterType::Triangle);
        Ok(PixelBuffer::from_rgba_image(resized)?.to_order(self.order))
    }

    /// Shrink uniformly to fit within `max_width`×`max_height`; never enlarges.
    pub fn scale_down(&self, max_width: u32, max_height: u32) -> PixelBuffer {
        let scale = (max_width as f64 / self.width as f64).min(max_height as f64 / self.height as f64);
        if scale >= 1.0 {
            return self.clone();
        }
        let w = ((self.width as f64 * scale).round() as u32).max(1);
        let h = ((self.height as f64 * scale).round() as u32).max(1);
        self.resize(w, h).unwrap_or_else(|_| self.clone())
    }

    /// History thumbnail (at most 200×150).
    pub fn thumbnail(&self) -> PixelBuffer {
        self.scale_down(200, 150)
    }

    /// Lossless PNG encoding.
    pub fn encode_png(&self) -> Result<Vec<u8>, PixelBufferError> {
        let mut bytes = Vec::new();
        self.to_rgba_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Per-channel truncated mean over a rectangle already inside the buffer.
    pub fn block_mean(&self, rect: PixelRect) -> [u8; 4] {
        let mut sums = [0u64; 4];
        let mut count = 0u64;
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                let p = self.pixel(x as u32, y as u32);
                for (sum, channel) in sums.iter_mut().zip(p) {
                    *sum += channel as u64;
                }
                count += 1;
            }
        }
        if count == 0 {
            return [0; 4];
        }
        sums.map(|s| (s / count) as u8)
    }

    /// Overwrite every pixel of a rectangle already inside the buffer.
    pub fn fill_rect(&mut self, rect: PixelRect, value: [u8; 4]) {
        for y in rect.y..rect.bottom() {
            let start = self.offset(rect.x as u32, y as u32);
            let end = start + rect.width as usize * 4;
            for px in self.pixels[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&value);
            }
        }
    }
}
