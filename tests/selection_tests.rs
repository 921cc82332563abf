use std::sync::Arc;

use sc_translator::selection::{Action, CaptureMode, Effect, Model, Phase};
use sc_translator::{PixelBuffer, PixelRect, Point, Rect, Size};

fn gradient(w: u32, h: u32) -> PixelBuffer {
    let mut img = PixelBuffer::filled(w, h, [0, 0, 0, 255]).unwrap();
    for y in 0..h {
        for x in 0..w {
            img.set_pixel(x, y, [(x % 256) as u8, (y % 256) as u8, 0, 255]);
        }
    }
    img
}

#[test]
fn settled_rects_are_always_larger_than_five() {
    for (to_x, to_y) in [(105.0, 200.0), (200.0, 105.0), (103.0, 103.0), (106.0, 106.0)] {
        let mut m = Model::new(Size::new(800.0, 600.0), CaptureMode::Region);
        m.reduce(Action::PrimaryDown(Point::new(100.0, 100.0)));
        m.reduce(Action::PointerMove(Point::new(to_x, to_y)));
        m.reduce(Action::PrimaryUp(Point::new(to_x, to_y)));

        match m.phase() {
            Phase::Settled { rect } => assert!(rect.width > 5.0 && rect.height > 5.0),
            Phase::Idle => assert!(to_x - 100.0 <= 5.0 || to_y - 100.0 <= 5.0),
            other => panic!("unexpected phase {other:?}"),
        }
    }
}

#[test]
fn translate_mode_runs_on_settle_and_crops_in_pixels() {
    // Surface shown at half the physical resolution.
    let source = Arc::new(gradient(400, 300));
    let mut m = Model::new(Size::new(200.0, 150.0), CaptureMode::Translate).with_source(source);

    m.reduce(Action::PrimaryDown(Point::new(10.0, 20.0)));
    let moving = m.reduce(Action::PointerMove(Point::new(60.0, 70.0)));
    assert!(
        moving
            .iter()
            .any(|e| matches!(e, Effect::UpdateMagnifier(v) if v.crop.is_some()))
    );

    let settled = m.reduce(Action::PrimaryUp(Point::new(60.0, 70.0)));
    let rect = Rect::new(10.0, 20.0, 50.0, 50.0);
    assert!(settled.contains(&Effect::RunTranslate { rect }));

    assert_eq!(m.selected_pixels(), Some(PixelRect::new(20, 40, 100, 100)));
    let crop = m.selected_image().unwrap();
    assert_eq!((crop.width(), crop.height()), (100, 100));
    assert_eq!(crop.rgba_at(0, 0), [20, 40, 0, 255]);
}

#[test]
fn moves_after_settling_do_not_update_the_magnifier() {
    let mut m = Model::new(Size::new(800.0, 600.0), CaptureMode::Region);
    m.reduce(Action::PrimaryDown(Point::new(100.0, 100.0)));
    m.reduce(Action::PointerMove(Point::new(300.0, 300.0)));
    m.reduce(Action::PrimaryUp(Point::new(300.0, 300.0)));
    assert!(m.reduce(Action::PointerMove(Point::new(10.0, 10.0))).is_empty());
}

#[test]
fn toolbar_flips_above_a_selection_near_the_bottom() {
    let mut m = Model::new(Size::new(800.0, 600.0), CaptureMode::Region);
    m.reduce(Action::PrimaryDown(Point::new(100.0, 400.0)));
    m.reduce(Action::PointerMove(Point::new(300.0, 580.0)));
    let effects = m.reduce(Action::PrimaryUp(Point::new(300.0, 580.0)));
    let rect = Rect::new(100.0, 400.0, 200.0, 180.0);
    assert!(effects.contains(&Effect::ShowToolbar { rect, top: 352.0 }));
}

#[test]
fn escape_closes_and_further_input_is_ignored() {
    let mut m = Model::new(Size::new(800.0, 600.0), CaptureMode::Ocr);
    m.reduce(Action::PrimaryDown(Point::new(100.0, 100.0)));
    assert_eq!(m.reduce(Action::Escape), vec![Effect::Close]);
    assert!(m.reduce(Action::PrimaryUp(Point::new(300.0, 300.0))).is_empty());
    assert_eq!(m.phase(), &Phase::Closed);
}
