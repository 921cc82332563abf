use crate::geometry::{Rect, Size};

/// Vertical gap between the selection and the toolbar.
pub const TOOLBAR_GAP: f64 = 8.0;
pub const TOOLBAR_HEIGHT: f64 = 40.0;
/// Offset above the selection used when the toolbar does not fit below it.
pub const TOOLBAR_FLIP_OFFSET: f64 = 48.0;

/// Four dimming panels covering everything outside the selection.
///
/// Top and bottom span the full screen width; left and right only span the selection's height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaskPanels {
    pub top: Rect,
    pub bottom: Rect,
    pub left: Rect,
    pub right: Rect,
}

impl MaskPanels {
    pub fn around(selection: Rect, screen: Size) -> Self {
        let s = selection;
        Self {
            top: Rect::new(0.0, 0.0, screen.width, s.y.max(0.0)),
            bottom: Rect::new(
                0.0,
                s.bottom(),
                screen.width,
                (screen.height - s.bottom()).max(0.0),
            ),
            left: Rect::new(0.0, s.y, s.x.max(0.0), s.height),
            right: Rect::new(s.right(), s.y, (screen.width - s.right()).max(0.0), s.height),
        }
    }

    pub fn panels(&self) -> [Rect; 4] {
        [self.top, self.bottom, self.left, self.right]
    }
}

/// Top edge of the toolbar for a settled selection.
pub fn toolbar_top(selection: Rect, screen_height: f64) -> f64 {
    let below = selection.bottom() + TOOLBAR_GAP;
    if below + TOOLBAR_HEIGHT > screen_height {
        selection.y - TOOLBAR_FLIP_OFFSET
    } else {
        below
    }
}

/// Size label shown next to the selection, e.g. `"200 × 150"`.
pub fn size_label(selection: Rect) -> String {
    format!("{} × {}", selection.width as i32, selection.height as i32)
}
