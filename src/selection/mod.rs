//! Region selection state machine.
//!
//! The host routes raw pointer and key input as [`Action`]s into [`Model::reduce`] and executes
//! the returned [`Effect`]s. The model never touches UI objects itself.

pub mod magnifier;
pub mod mask;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{PixelRect, Point, Rect, Scale, Size};
use crate::pixel_buffer::PixelBuffer;

pub use magnifier::MagnifierView;
pub use mask::MaskPanels;

/// Both sides of a settled selection must be strictly longer than this (logical units).
pub const MIN_SELECTION_SIZE: f64 = 5.0;

/// What happens automatically once a selection settles.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Wait for the user to pick a toolbar action.
    #[default]
    Region,
    Translate,
    Ocr,
}

/// Selection phase.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum Phase {
    #[default]
    Idle,
    Dragging {
        start: Point,
        rect: Rect,
    },
    Settled {
        rect: Rect,
    },
    Closed,
}

/// Input actions (pure).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    PrimaryDown(Point),
    PointerMove(Point),
    PrimaryUp(Point),
    /// Secondary button press cancels the capture.
    SecondaryDown,
    Escape,
}

/// Effects requested by the model (executed by the host).
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Remove the full-screen dim layer; the split mask takes over.
    HideDimMask,
    /// Restore the full-screen dim layer after an abandoned drag.
    ShowDimMask,
    UpdateMask(MaskPanels),
    UpdateSelection { rect: Rect, label: String },
    UpdateMagnifier(MagnifierView),
    HideMagnifier,
    ShowToolbar { rect: Rect, top: f64 },
    HideToolbar,
    RunOcr { rect: Rect },
    RunTranslate { rect: Rect },
    /// Tear down the capture surface.
    Close,
}

/// Selection state machine model.
#[derive(Debug, Default)]
pub struct Model {
    phase: Phase,
    screen: Size,
    mode: CaptureMode,
    source: Option<Arc<PixelBuffer>>,
}

impl Model {
    /// Model for a capture surface of `screen` logical units.
    pub fn new(screen: Size, mode: CaptureMode) -> Self {
        Self {
            phase: Phase::Idle,
            screen,
            mode,
            source: None,
        }
    }

    /// Attach the frozen screenshot shown under the selection surface.
    pub fn with_source(mut self, source: Arc<PixelBuffer>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn screen(&self) -> Size {
        self.screen
    }

    /// Settled selection in logical coordinates.
    pub fn selection(&self) -> Option<Rect> {
        match self.phase {
            Phase::Settled { rect } => Some(rect),
            _ => None,
        }
    }

    /// Logical-to-pixel scale of the attached screenshot.
    pub fn scale(&self) -> Scale {
        match &self.source {
            Some(src) => Scale::between(src.width(), src.height(), self.screen),
            None => Scale::identity(),
        }
    }

    /// Settled selection in screenshot pixel coordinates.
    pub fn selected_pixels(&self) -> Option<PixelRect> {
        self.selection().map(|rect| self.scale().map_rect(rect))
    }

    /// Copy of the screenshot under the settled selection.
    pub fn selected_image(&self) -> Option<PixelBuffer> {
        let src = self.source.as_ref()?;
        src.crop(self.selected_pixels()?)
    }

    /// Settle a selection covering the whole surface, as if dragged corner to corner.
    ///
    /// Used by hosts that already know the region (the captured image is the selection).
    pub fn select_all(&mut self) -> Vec<Effect> {
        let far = Point::new(self.screen.width, self.screen.height);
        let mut effects = self.reduce(Action::PrimaryDown(Point::new(0.0, 0.0)));
        effects.extend(self.reduce(Action::PrimaryUp(far)));
        effects
    }

    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        if self.phase == Phase::Closed {
            return Vec::new();
        }

        match action {
            Action::PrimaryDown(pos) => {
                let was_settled = matches!(self.phase, Phase::Settled { .. });
                let rect = Rect::new(pos.x, pos.y, 0.0, 0.0);
                self.phase = Phase::Dragging { start: pos, rect };

                let mut effects = vec![Effect::HideDimMask];
                if was_settled {
                    debug!("Restarting selection at {:?}", pos);
                    effects.push(Effect::HideToolbar);
                }
                effects.push(Effect::UpdateMask(MaskPanels::around(rect, self.screen)));
                effects
            }

            Action::PointerMove(pos) => {
                let mut effects = Vec::new();

                if let Phase::Dragging { start, rect } = &mut self.phase {
                    *rect = Rect::from_points(*start, pos);
                    effects.push(Effect::UpdateSelection {
                        rect: *rect,
                        label: mask::size_label(*rect),
                    });
                    effects.push(Effect::UpdateMask(MaskPanels::around(*rect, self.screen)));
                }

                if !matches!(self.phase, Phase::Settled { .. }) {
                    effects.push(Effect::UpdateMagnifier(magnifier::sample(
                        self.source.as_deref(),
                        self.screen,
                        pos,
                    )));
                }
                effects
            }

            Action::PrimaryUp(pos) => {
                let Phase::Dragging { start, .. } = self.phase else {
                    return Vec::new();
                };

                let rect = Rect::from_points(start, pos);
                if !rect.exceeds(MIN_SELECTION_SIZE) {
                    debug!("Selection {:?} too small, back to idle", rect);
                    self.phase = Phase::Idle;
                    return vec![Effect::ShowDimMask];
                }

                self.phase = Phase::Settled { rect };
                let mut effects = vec![
                    Effect::UpdateSelection {
                        rect,
                        label: mask::size_label(rect),
                    },
                    Effect::UpdateMask(MaskPanels::around(rect, self.screen)),
                    Effect::HideMagnifier,
                    Effect::ShowToolbar {
                        rect,
                        top: mask::toolbar_top(rect, self.screen.height),
                    },
                ];
                match self.mode {
                    CaptureMode::Region => {}
                    CaptureMode::Translate => effects.push(Effect::RunTranslate { rect }),
                    CaptureMode::Ocr => effects.push(Effect::RunOcr { rect }),
                }
                effects
            }

            Action::SecondaryDown | Action::Escape => {
                self.phase = Phase::Closed;
                vec![Effect::Close]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::ChannelOrder;

    fn model() -> Model {
        Model::new(Size::new(1000.0, 800.0), CaptureMode::Region)
    }

    fn drag(m: &mut Model, from: (f64, f64), to: (f64, f64)) -> Vec<Effect> {
        m.reduce(Action::PrimaryDown(Point::new(from.0, from.1)));
        m.reduce(Action::PointerMove(Point::new(to.0, to.1)));
        m.reduce(Action::PrimaryUp(Point::new(to.0, to.1)))
    }

    #[test]
    fn reverse_drag_normalizes() {
        let mut m = model();
        let effects = drag(&mut m, (300.0, 300.0), (100.0, 100.0));
        let expected = Rect::new(100.0, 100.0, 200.0, 200.0);

        assert_eq!(m.phase(), &Phase::Settled { rect: expected });
        assert!(effects.contains(&Effect::ShowToolbar {
            rect: expected,
            top: 308.0
        }));
        assert!(effects.contains(&Effect::HideMagnifier));
    }

    #[test]
    fn press_hides_dim_mask_and_splits() {
        let mut m = model();
        let effects = m.reduce(Action::PrimaryDown(Point::new(10.0, 20.0)));
        assert_eq!(effects[0], Effect::HideDimMask);
        assert!(matches!(effects[1], Effect::UpdateMask(_)));
        assert!(matches!(m.phase(), Phase::Dragging { .. }));
    }

    #[test]
    fn move_reports_rect_label_and_mask() {
        let mut m = model();
        m.reduce(Action::PrimaryDown(Point::new(10.0, 20.0)));
        let effects = m.reduce(Action::PointerMove(Point::new(110.0, 70.0)));
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(
            effects[0],
            Effect::UpdateSelection {
                rect,
                label: "100 × 50".to_string()
            }
        );
        assert_eq!(
            effects[1],
            Effect::UpdateMask(MaskPanels::around(rect, Size::new(1000.0, 800.0)))
        );
        assert!(matches!(effects[2], Effect::UpdateMagnifier(_)));
    }

    #[test]
    fn small_drags_return_to_idle() {
        let mut m = model();
        let effects = drag(&mut m, (0.0, 0.0), (5.0, 100.0));
        assert_eq!(m.phase(), &Phase::Idle);
        assert_eq!(effects, vec![Effect::ShowDimMask]);

        drag(&mut m, (0.0, 0.0), (6.0, 6.0));
        assert!(matches!(m.phase(), Phase::Settled { .. }));
    }

    #[test]
    fn settled_rects_always_exceed_minimum() {
        for (i, size) in [0.0, 1.0, 4.9, 5.0, 5.1, 6.0, 40.0].iter().enumerate() {
            let mut m = model();
            let start = 50.0 + i as f64;
            drag(&mut m, (start, start), (start + size, start + 10.0));
            if let Some(rect) = m.selection() {
                assert!(rect.width > MIN_SELECTION_SIZE && rect.height > MIN_SELECTION_SIZE);
            }
        }
    }

    #[test]
    fn settled_press_restarts_drag() {
        let mut m = model();
        drag(&mut m, (0.0, 0.0), (50.0, 50.0));
        let effects = m.reduce(Action::PrimaryDown(Point::new(200.0, 200.0)));
        assert!(effects.contains(&Effect::HideToolbar));
        assert!(matches!(m.phase(), Phase::Dragging { .. }));
    }

    #[test]
    fn magnifier_hidden_while_settled() {
        let mut m = model();
        drag(&mut m, (0.0, 0.0), (50.0, 50.0));
        assert!(m.reduce(Action::PointerMove(Point::new(10.0, 10.0))).is_empty());
    }

    #[test]
    fn cancel_from_any_phase() {
        let mut m = model();
        assert_eq!(m.reduce(Action::Escape), vec![Effect::Close]);
        assert_eq!(m.phase(), &Phase::Closed);
        assert!(m.reduce(Action::PrimaryDown(Point::new(1.0, 1.0))).is_empty());

        let mut m = model();
        m.reduce(Action::PrimaryDown(Point::new(1.0, 1.0)));
        assert_eq!(m.reduce(Action::SecondaryDown), vec![Effect::Close]);
    }

    #[test]
    fn auto_modes_run_on_settle() {
        let mut m = Model::new(Size::new(1000.0, 800.0), CaptureMode::Translate);
        let effects = drag(&mut m, (0.0, 0.0), (50.0, 50.0));
        assert_eq!(
            effects.last(),
            Some(&Effect::RunTranslate {
                rect: Rect::new(0.0, 0.0, 50.0, 50.0)
            })
        );

        let mut m = Model::new(Size::new(1000.0, 800.0), CaptureMode::Ocr);
        let effects = drag(&mut m, (0.0, 0.0), (50.0, 50.0));
        assert!(matches!(effects.last(), Some(Effect::RunOcr { .. })));
    }

    #[test]
    fn selection_maps_to_pixels() {
        let shot = Arc::new(PixelBuffer::new(2000, 1600, ChannelOrder::Bgra).unwrap());
        let mut m = model().with_source(shot);
        drag(&mut m, (10.25, 10.75), (110.5, 60.5));

        assert_eq!(m.selected_pixels(), Some(PixelRect::new(20, 21, 200, 99)));
        let img = m.selected_image().unwrap();
        assert_eq!((img.width(), img.height()), (200, 99));
    }

    #[test]
    fn select_all_settles_on_the_whole_source() {
        let shot = Arc::new(PixelBuffer::filled(64, 48, [1, 2, 3, 255]).unwrap());
        let mut m = Model::new(Size::new(32.0, 24.0), CaptureMode::Translate).with_source(shot);
        let effects = m.select_all();
        assert!(matches!(effects.last(), Some(Effect::RunTranslate { .. })));
        assert_eq!(m.selected_pixels(), Some(PixelRect::new(0, 0, 64, 48)));

        // Too small to settle: nothing to act on.
        let mut tiny = Model::new(Size::new(4.0, 40.0), CaptureMode::Ocr);
        assert_eq!(tiny.select_all().last(), Some(&Effect::ShowDimMask));
        assert_eq!(tiny.selection(), None);
    }
}
