// Win32 GDI screen source
//
// BitBlt from the screen DC into a compatible bitmap, then GetDIBits into an owned
// top-down BGRA buffer. All GDI objects are released before returning.

use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, ReleaseDC, SRCCOPY, SelectObject,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, GetWindowRect, IsWindow, SM_CXSCREEN, SM_CXVIRTUALSCREEN, SM_CYSCREEN,
    SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
};

use super::{ScreenSource, WindowHandle};
use crate::error::CaptureError;
use crate::geometry::PixelRect;
use crate::pixel_buffer::{ChannelOrder, PixelBuffer};

/// Live Windows desktop.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdiScreen;

impl ScreenSource for GdiScreen {
    fn virtual_bounds(&self) -> Result<PixelRect, CaptureError> {
        unsafe {
            Ok(PixelRect::new(
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            ))
        }
    }

    fn primary_bounds(&self) -> Result<PixelRect, CaptureError> {
        unsafe {
            Ok(PixelRect::new(
                0,
                0,
                GetSystemMetrics(SM_CXSCREEN),
                GetSystemMetrics(SM_CYSCREEN),
            ))
        }
    }

    fn window_bounds(&self, handle: WindowHandle) -> Option<PixelRect> {
        let hwnd = HWND(handle.0 as usize as *mut std::ffi::c_void);
        unsafe {
            if !IsWindow(Some(hwnd)).as_bool() {
                return None;
            }
            let mut rect = RECT::default();
            GetWindowRect(hwnd, &mut rect).ok()?;
            Some(PixelRect::new(
                rect.left,
                rect.top,
                rect.right - rect.left,
                rect.bottom - rect.top,
            ))
        }
    }

    fn grab(&self, region: PixelRect) -> Result<PixelBuffer, CaptureError> {
        let (width, height) = (region.width, region.height);
        let pixels = unsafe { blit_region(region)? };
        let mut buffer = PixelBuffer::from_raw(
            width as u32,
            height as u32,
            width as usize * 4,
            pixels,
            ChannelOrder::Bgra,
        )?;
        // Screen DIBs leave the alpha byte undefined.
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let mut px = buffer.pixel(x, y);
                px[3] = 255;
                buffer.set_pixel(x, y, px);
            }
        }
        Ok(buffer)
    }
}

unsafe fn blit_region(region: PixelRect) -> Result<Vec<u8>, CaptureError> {
    let (width, height) = (region.width, region.height);
    let desktop = HWND(std::ptr::null_mut());

    unsafe {
        let screen_dc = GetDC(Some(desktop));
        if screen_dc.is_invalid() {
            return Err(CaptureError::Platform("Failed to get screen DC".to_string()));
        }

        let mem_dc = CreateCompatibleDC(Some(screen_dc));
        if mem_dc.is_invalid() {
            ReleaseDC(Some(desktop), screen_dc);
            return Err(CaptureError::Platform(
                "Failed to create memory DC".to_string(),
            ));
        }

        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        if bitmap.is_invalid() {
            let _ = DeleteDC(mem_dc);
            ReleaseDC(Some(desktop), screen_dc);
            return Err(CaptureError::Platform("Failed to create bitmap".to_string()));
        }

        let old_bitmap = SelectObject(mem_dc, bitmap.into());
        let blit = BitBlt(
            mem_dc,
            0,
            0,
            width,
            height,
            Some(screen_dc),
            region.x,
            region.y,
            SRCCOPY,
        );
        SelectObject(mem_dc, old_bitmap);

        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        let lines = if blit.is_ok() {
            let mut bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Negative height: top-down rows.
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                bmiColors: [Default::default(); 1],
            };
            GetDIBits(
                screen_dc,
                bitmap,
                0,
                height as u32,
                Some(pixels.as_mut_ptr() as *mut std::ffi::c_void),
                &mut bmi,
                DIB_RGB_COLORS,
            )
        } else {
            0
        };

        let _ = DeleteDC(mem_dc);
        ReleaseDC(Some(desktop), screen_dc);
        let _ = DeleteObject(bitmap.into());

        if blit.is_err() {
            return Err(CaptureError::Platform("BitBlt failed".to_string()));
        }
        if lines != height {
            return Err(CaptureError::Platform(format!(
                "GetDIBits copied {lines} of {height} rows"
            )));
        }
        Ok(pixels)
    }
}
