// Cross-platform screen source via xcap
//
// xcap captures whole monitors; regions are stitched together by cropping each monitor's
// image to its overlap with the requested rectangle.

use tracing::debug;
use xcap::{Monitor, Window};

use super::{ScreenSource, WindowHandle};
use crate::error::CaptureError;
use crate::geometry::PixelRect;
use crate::pixel_buffer::{ChannelOrder, PixelBuffer};

#[derive(Debug, Default, Clone, Copy)]
pub struct XcapScreen;

fn monitors() -> Result<Vec<Monitor>, CaptureError> {
    let all = Monitor::all().map_err(|e| CaptureError::Platform(e.to_string()))?;
    if all.is_empty() {
        return Err(CaptureError::Platform("No monitors detected".to_string()));
    }
    Ok(all)
}

fn monitor_rect(m: &Monitor) -> PixelRect {
    PixelRect::new(m.x(), m.y(), m.width() as i32, m.height() as i32)
}

fn intersect(a: PixelRect, b: PixelRect) -> Option<PixelRect> {
    let (a_right, a_bottom) = a.checked_far_corner()?;
    let (b_right, b_bottom) = b.checked_far_corner()?;
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let width = a_right.min(b_right).checked_sub(x)?;
    let height = a_bottom.min(b_bottom).checked_sub(y)?;
    let r = PixelRect::new(x, y, width, height);
    (!r.is_empty()).then_some(r)
}

impl ScreenSource for XcapScreen {
    fn virtual_bounds(&self) -> Result<PixelRect, CaptureError> {
        let all = monitors()?;
        let (mut left, mut top, mut right, mut bottom) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for m in &all {
            let r = monitor_rect(m);
            left = left.min(r.x);
            top = top.min(r.y);
            right = right.max(r.right());
            bottom = bottom.max(r.bottom());
        }
        Ok(PixelRect::new(left, top, right - left, bottom - top))
    }

    fn primary_bounds(&self) -> Result<PixelRect, CaptureError> {
        let all = monitors()?;
        let primary = all.iter().find(|m| m.is_primary()).unwrap_or(&all[0]);
        Ok(monitor_rect(primary))
    }

    fn window_bounds(&self, handle: WindowHandle) -> Option<PixelRect> {
        let windows = Window::all().ok()?;
        let window = windows.into_iter().find(|w| w.id() as u64 == handle.0)?;
        Some(PixelRect::new(
            window.x(),
            window.y(),
            window.width() as i32,
            window.height() as i32,
        ))
    }

    fn grab(&self, region: PixelRect) -> Result<PixelBuffer, CaptureError> {
        let mut out = PixelBuffer::filled(region.width as u32, region.height as u32, [0, 0, 0, 255])?;
        let mut covered = false;

        for m in monitors()? {
            let bounds = monitor_rect(&m);
            let Some(overlap) = intersect(bounds, region) else {
                continue;
            };
            debug!("Capturing monitor at {:?} for overlap {:?}", bounds, overlap);
            let image = m
                .capture_image()
                .map_err(|e| CaptureError::Platform(e.to_string()))?;
            let (w, h) = (image.width(), image.height());
            let shot = PixelBuffer::from_raw(w, h, w as usize * 4, image.into_raw(), ChannelOrder::Rgba)?;

            for y in 0..overlap.height {
                for x in 0..overlap.width {
                    let sx = (overlap.x - bounds.x + x) as u32;
                    let sy = (overlap.y - bounds.y + y) as u32;
                    if sx >= w || sy >= h {
                        continue;
                    }
                    let dx = (overlap.x - region.x + x) as u32;
                    let dy = (overlap.y - region.y + y) as u32;
                    out.set_pixel(dx, dy, shot.pixel(sx, sy));
                }
            }
            covered = true;
        }

        if !covered {
            return Err(CaptureError::OutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            });
        }
        Ok(out)
    }
}
