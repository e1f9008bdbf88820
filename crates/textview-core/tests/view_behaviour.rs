use std::time::{Duration, Instant};

use textview_core::{
    BlinkScheduler, KeyEvent, Rect, Repaint, TextBuffer, TextPosition, TextRegion, TextView,
};

fn wrapped_view() -> (textview_core::SharedBuffer, TextView) {
    // 200px at 8px per cell: 25 cells per visual span.
    let buffer = TextBuffer::shared(&format!("{}\nab", "x".repeat(60)));
    let mut view = TextView::with_defaults(&buffer);
    view.resize(200.0, 400.0);
    (buffer, view)
}

#[test]
fn test_vertical_motion_keeps_desired_column_across_spans() {
    let (_buffer, mut view) = wrapped_view();
    assert_eq!(view.layout().span_count(0), 3);

    view.set_cursor(TextPosition::new(0, 3));
    view.cursor_down(1);
    assert_eq!(view.cursor_pos(), TextPosition::new(0, 28));
    view.cursor_down(1);
    assert_eq!(view.cursor_pos(), TextPosition::new(0, 53));
    view.cursor_down(1);
    assert_eq!(view.cursor_pos(), TextPosition::new(1, 2));

    // The short line did not reset the desired column.
    view.cursor_up(1);
    assert_eq!(view.cursor_pos(), TextPosition::new(0, 53));
    view.cursor_up(2);
    assert_eq!(view.cursor_pos(), TextPosition::new(0, 3));
}

#[test]
fn test_region_rects_follow_wrapping() {
    let (_buffer, mut view) = wrapped_view();
    view.set_selection(TextRegion::new(
        TextPosition::new(0, 20),
        TextPosition::new(0, 30),
    ));
    assert_eq!(
        view.selection_rects(),
        vec![
            Rect::new(160.0, 0.0, 40.0, 16.0),
            Rect::new(0.0, 16.0, 40.0, 16.0),
        ]
    );
    // The second line starts below all three spans of the first.
    let rects = view.region_rects(TextRegion::new(
        TextPosition::new(1, 0),
        TextPosition::new(1, 2),
    ));
    assert_eq!(rects, vec![Rect::new(0.0, 48.0, 16.0, 16.0)]);
}

#[test]
fn test_resize_rewraps() {
    let (_buffer, mut view) = wrapped_view();
    view.resize(800.0, 400.0);
    assert_eq!(view.layout().span_count(0), 1);
    assert_eq!(view.layout().offsets().to_vec(), vec![0.0f32, 16.0]);
}

#[test]
fn test_page_motion_through_long_document() {
    let text: Vec<String> = (0..100).map(|i| format!("line {i}")).collect();
    let buffer = TextBuffer::shared(&text.join("\n"));
    let mut view = TextView::with_defaults(&buffer);
    // Ten lines of 16px are visible.
    view.resize(400.0, 160.0);
    assert_eq!(view.last_visible_line(), 9);

    view.page_down();
    assert_eq!(view.cursor_pos().line, 9);
    assert_eq!(view.first_visible_line(), 9);
    view.page_down();
    assert_eq!(view.cursor_pos().line, 18);
    assert!(view.cursor_is_visible());

    view.handle_key(&KeyEvent::parse("Control+End").unwrap());
    assert_eq!(view.cursor_pos(), TextPosition::new(99, 7));
    assert_eq!(view.last_visible_line(), 99);
    view.handle_key(&KeyEvent::parse("Control+Home").unwrap());
    assert_eq!(view.cursor_pos(), TextPosition::ZERO);
    assert_eq!(view.first_visible_line(), 0);
}

#[test]
fn test_repaint_requests() {
    let buffer = TextBuffer::shared("one\ntwo\nthree");
    let mut view = TextView::with_defaults(&buffer);
    view.resize(400.0, 300.0);
    assert_eq!(view.take_repaint(), Repaint::Full);
    assert_eq!(view.take_repaint(), Repaint::None);

    view.set_cursor(TextPosition::new(2, 5));
    view.take_repaint();
    view.insert_at_cursor("!");
    assert_eq!(view.take_repaint(), Repaint::Lines { start: 2, end: 2 });

    view.set_cursor(TextPosition::new(0, 1));
    assert_eq!(view.take_repaint(), Repaint::Lines { start: 0, end: 2 });

    view.insert_at_cursor("\n");
    assert_eq!(view.take_repaint(), Repaint::Full);
}

#[test]
fn test_focus_moves_blinking_between_views() {
    let blink = BlinkScheduler::new(Duration::from_millis(500));
    let buffer = TextBuffer::shared("text");
    let mut a = TextView::with_defaults(&buffer);
    let mut b = TextView::with_defaults(&buffer);

    a.focus_in(&blink);
    assert!(a.is_focused());
    assert_eq!(blink.focused(), Some(a.id()));

    let t0 = Instant::now();
    blink.tick(t0);
    assert!(blink.tick(t0 + Duration::from_millis(500)));
    assert!(!a.cursor_visible());

    // Focus moves: the old view is left with a visible cursor.
    a.focus_out(&blink);
    b.focus_in(&blink);
    assert!(a.cursor_visible());
    assert!(b.cursor_visible());
    assert_eq!(blink.focused(), Some(b.id()));

    b.focus_out(&blink);
    assert_eq!(blink.focused(), None);
    assert!(!blink.tick(t0 + Duration::from_secs(5)));
}

#[test]
fn test_solid_cursor_when_blinking_is_off() {
    let blink = BlinkScheduler::new(Duration::from_millis(100));
    let buffer = TextBuffer::shared("text");
    let options = textview_core::EditorOptions {
        cursor_blink_ms: 0,
        ..Default::default()
    };
    let mut view = TextView::new(&buffer, options, textview_core::Theme::default());
    view.focus_in(&blink);
    let t0 = Instant::now();
    blink.tick(t0);
    blink.tick(t0 + Duration::from_millis(100));
    assert!(view.cursor_visible());
}

#[test]
fn test_focus_out_dismisses_search() {
    let blink = BlinkScheduler::new(Duration::from_millis(500));
    let buffer = TextBuffer::shared("find me here");
    let mut view = TextView::with_defaults(&buffer);
    view.focus_in(&blink);
    view.isearch_trigger();
    for ch in "here".chars() {
        view.isearch_key(ch);
    }
    assert_eq!(view.cursor_pos(), TextPosition::new(0, 8));
    view.focus_out(&blink);
    assert!(!view.isearch().is_active());
    assert!(view.find_highlights().is_empty());
    assert_eq!(view.cursor_pos(), TextPosition::new(0, 8));
}

#[test]
fn test_dropping_focused_view_releases_blinking() {
    let blink = BlinkScheduler::new(Duration::from_millis(500));
    let buffer = TextBuffer::shared("text");
    let mut view = TextView::with_defaults(&buffer);
    view.focus_in(&blink);
    assert_eq!(blink.focused(), Some(view.id()));
    drop(view);
    assert_eq!(blink.focused(), None);
    assert!(!blink.tick(Instant::now()));
}
