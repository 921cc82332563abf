// Screen capture
//
// `ScreenGrabber` validates requests and delegates the pixel copy to a `ScreenSource`
// backend. Every backend copies pixels out completely; nothing returned here borrows the
// platform surface.

#[cfg(windows)]
mod gdi;
#[cfg(feature = "xcap")]
mod xcap_backend;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::CaptureError;
use crate::geometry::PixelRect;
use crate::pixel_buffer::PixelBuffer;

#[cfg(windows)]
pub use gdi::GdiScreen;
#[cfg(feature = "xcap")]
pub use xcap_backend::XcapScreen;

/// Opaque top-level window identifier (an `HWND` value on Windows, an xcap window id elsewhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// Platform back buffer access.
///
/// Coordinates are physical pixels in virtual-desktop space; the virtual desktop origin may be
/// negative when a monitor sits left of or above the primary one.
pub trait ScreenSource: Send + Sync {
    /// Bounds of the whole virtual desktop.
    fn virtual_bounds(&self) -> Result<PixelRect, CaptureError>;

    /// Bounds of the primary display.
    fn primary_bounds(&self) -> Result<PixelRect, CaptureError>;

    /// Screen rectangle covered by a window, `None` if the handle is unknown.
    fn window_bounds(&self, handle: WindowHandle) -> Option<PixelRect>;

    /// Copy out `region`; `region` is non-empty when called.
    fn grab(&self, region: PixelRect) -> Result<PixelBuffer, CaptureError>;
}

/// Produces [`PixelBuffer`]s of screen areas.
pub struct ScreenGrabber {
    source: Box<dyn ScreenSource>,
}

impl ScreenGrabber {
    pub fn new(source: impl ScreenSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Grabber over the native backend of the current platform.
    pub fn platform_default() -> Result<Self, CaptureError> {
        #[cfg(windows)]
        {
            Ok(Self::new(GdiScreen))
        }
        #[cfg(all(not(windows), feature = "xcap"))]
        {
            Ok(Self::new(XcapScreen))
        }
        #[cfg(all(not(windows), not(feature = "xcap")))]
        {
            Err(CaptureError::Unsupported)
        }
    }

    /// Capture an arbitrary screen rectangle.
    pub fn capture_region(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<PixelBuffer, CaptureError> {
        let region = PixelRect::new(x, y, width, height);
        if width <= 0 || height <= 0 || region.checked_far_corner().is_none() {
            return Err(CaptureError::InvalidRegion { width, height });
        }
        debug!("Capturing region {:?}", region);
        self.source.grab(region)
    }

    /// Capture every monitor as one image.
    pub fn capture_full_virtual_desktop(&self) -> Result<PixelBuffer, CaptureError> {
        let bounds = self.source.virtual_bounds()?;
        self.capture_rect(bounds)
    }

    pub fn capture_primary_display(&self) -> Result<PixelBuffer, CaptureError> {
        let bounds = self.source.primary_bounds()?;
        self.capture_rect(bounds)
    }

    /// Capture the screen area covered by a window.
    ///
    /// Returns `None` for unknown handles, degenerate window rectangles and failed copies.
    pub fn capture_window(&self, handle: WindowHandle) -> Option<PixelBuffer> {
        let bounds = self.source.window_bounds(handle)?;
        if bounds.is_empty() {
            debug!("Window {:?} has an empty rectangle {:?}", handle, bounds);
            return None;
        }
        match self.capture_rect(bounds) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                warn!("Window capture failed for {:?}: {}", handle, e);
                None
            }
        }
    }

    fn capture_rect(&self, rect: PixelRect) -> Result<PixelBuffer, CaptureError> {
        self.capture_region(rect.x, rect.y, rect.width, rect.height)
    }
}

// ==================== In-memory source ====================

/// A fixed image standing in for the virtual desktop.
///
/// Used by tests and by headless runs that operate on an image file instead of a live screen.
#[derive(Debug, Clone)]
pub struct MemoryScreen {
    desktop: PixelBuffer,
    origin: (i32, i32),
    primary: PixelRect,
    windows: HashMap<WindowHandle, PixelRect>,
}

impl MemoryScreen {
    /// Desktop with its origin at (0, 0); the whole image is the primary display.
    pub fn new(desktop: PixelBuffer) -> Self {
        let primary = PixelRect::new(0, 0, desktop.width() as i32, desktop.height() as i32);
        Self {
            desktop,
            origin: (0, 0),
            primary,
            windows: HashMap::new(),
        }
    }

    /// Place the desktop's top-left corner at `(x, y)` in virtual-desktop space.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn with_primary(mut self, primary: PixelRect) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_window(mut self, handle: WindowHandle, bounds: PixelRect) -> Self {
        self.windows.insert(handle, bounds);
        self
    }
}

impl ScreenSource for MemoryScreen {
    fn virtual_bounds(&self) -> Result<PixelRect, CaptureError> {
        Ok(PixelRect::new(
            self.origin.0,
            self.origin.1,
            self.desktop.width() as i32,
            self.desktop.height() as i32,
        ))
    }

    fn primary_bounds(&self) -> Result<PixelRect, CaptureError> {
        Ok(self.primary)
    }

    fn window_bounds(&self, handle: WindowHandle) -> Option<PixelRect> {
        self.windows.get(&handle).copied()
    }

    fn grab(&self, region: PixelRect) -> Result<PixelBuffer, CaptureError> {
        let out_of_bounds = CaptureError::OutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        };
        let (Some(x), Some(y)) = (
            region.x.checked_sub(self.origin.0),
            region.y.checked_sub(self.origin.1),
        ) else {
            return Err(out_of_bounds);
        };
        let local = PixelRect::new(x, y, region.width, region.height);
        let inside = match local.checked_far_corner() {
            Some((right, bottom)) => {
                local.x >= 0
                    && local.y >= 0
                    && right <= self.desktop.width() as i32
                    && bottom <= self.desktop.height() as i32
            }
            None => false,
        };
        if !inside {
            return Err(out_of_bounds);
        }
        self.desktop.crop(local).ok_or(out_of_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::ChannelOrder;

    fn desktop() -> PixelBuffer {
        let mut buf = PixelBuffer::new(40, 30, ChannelOrder::Rgba).unwrap();
        for y in 0..30 {
            for x in 0..40 {
                buf.set_pixel(x, y, [x as u8, y as u8, 0, 255]);
            }
        }
        buf
    }

    #[test]
    fn region_is_copied_out() {
        let grabber = ScreenGrabber::new(MemoryScreen::new(desktop()));
        let shot = grabber.capture_region(5, 6, 10, 4).unwrap();
        assert_eq!((shot.width(), shot.height()), (10, 4));
        assert_eq!(shot.pixel(0, 0), [5, 6, 0, 255]);
    }

    #[test]
    fn rejects_degenerate_regions() {
        let grabber = ScreenGrabber::new(MemoryScreen::new(desktop()));
        assert!(matches!(
            grabber.capture_region(0, 0, 0, 10),
            Err(CaptureError::InvalidRegion { width: 0, height: 10 })
        ));
        assert!(grabber.capture_region(0, 0, 10, -3).is_err());
    }

    #[test]
    fn regions_whose_edges_overflow_are_invalid() {
        let grabber = ScreenGrabber::new(MemoryScreen::new(desktop()));
        assert!(matches!(
            grabber.capture_region(2_147_483_600, 0, 100, 100),
            Err(CaptureError::InvalidRegion { width: 100, height: 100 })
        ));
        assert!(matches!(
            grabber.capture_region(0, i32::MAX, 1, i32::MAX),
            Err(CaptureError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn far_origins_are_out_of_bounds_not_overflows() {
        let screen = MemoryScreen::new(desktop()).with_origin(100, 0);
        let err = screen.grab(PixelRect::new(i32::MIN, 0, 10, 10)).unwrap_err();
        assert!(matches!(err, CaptureError::OutOfBounds { .. }));
        let screen = MemoryScreen::new(desktop()).with_origin(-100, 0);
        let err = screen.grab(PixelRect::new(i32::MAX - 5, 0, 10, 10)).unwrap_err();
        assert!(matches!(err, CaptureError::OutOfBounds { .. }));
    }

    #[test]
    fn regions_outside_the_desktop_fail_without_partial_buffers() {
        let grabber = ScreenGrabber::new(MemoryScreen::new(desktop()));
        assert!(matches!(
            grabber.capture_region(35, 0, 10, 10),
            Err(CaptureError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn negative_origin_virtual_desktop() {
        let screen = MemoryScreen::new(desktop())
            .with_origin(-20, 0)
            .with_primary(PixelRect::new(0, 0, 20, 30));
        let grabber = ScreenGrabber::new(screen);

        let full = grabber.capture_full_virtual_desktop().unwrap();
        assert_eq!((full.width(), full.height()), (40, 30));

        let primary = grabber.capture_primary_display().unwrap();
        assert_eq!((primary.width(), primary.height()), (20, 30));
        assert_eq!(primary.pixel(0, 0), [20, 0, 0, 255]);
    }

    #[test]
    fn window_capture() {
        let screen = MemoryScreen::new(desktop())
            .with_window(WindowHandle(1), PixelRect::new(2, 2, 8, 8))
            .with_window(WindowHandle(2), PixelRect::new(2, 2, 0, 8));
        let grabber = ScreenGrabber::new(screen);

        let win = grabber.capture_window(WindowHandle(1)).unwrap();
        assert_eq!((win.width(), win.height()), (8, 8));
        assert!(grabber.capture_window(WindowHandle(2)).is_none());
        assert!(grabber.capture_window(WindowHandle(99)).is_none());
    }
}
