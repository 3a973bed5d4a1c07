// Host-side tests for pointer gesture tracking.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod input {
    include!("../src/input.rs");
}

use glam::Vec2;
use input::*;

#[test]
fn press_and_release_in_place_is_a_click() {
    let mut t = PointerTracker::new();
    assert_eq!(t.down(1, Vec2::new(100.0, 100.0)), Gesture::DragStart(Vec2::new(100.0, 100.0)));
    // jitter inside the slop still counts as a click
    assert_eq!(t.move_to(1, Vec2::new(103.0, 102.0)), Gesture::DragTo(Vec2::new(103.0, 102.0)));
    assert_eq!(t.up(1, Vec2::new(103.0, 102.0)), Gesture::Click(Vec2::new(103.0, 102.0)));
    assert_eq!(t.active(), 0);
}

#[test]
fn dragging_past_the_slop_never_clicks() {
    let mut t = PointerTracker::new();
    t.down(1, Vec2::ZERO);
    t.move_to(1, Vec2::new(CLICK_SLOP_PX + 10.0, 0.0));
    // coming back to the start does not turn the drag into a click
    t.move_to(1, Vec2::ZERO);
    assert_eq!(t.up(1, Vec2::ZERO), Gesture::DragEnd);
}

#[test]
fn moving_without_a_press_is_hover() {
    let mut t = PointerTracker::new();
    assert_eq!(t.move_to(7, Vec2::new(5.0, 6.0)), Gesture::Hover(Vec2::new(5.0, 6.0)));
}

#[test]
fn two_fingers_pinch_relative_to_their_start_distance() {
    let mut t = PointerTracker::new();
    t.down(1, Vec2::new(0.0, 0.0));
    assert_eq!(t.down(2, Vec2::new(100.0, 0.0)), Gesture::PinchStart);
    match t.move_to(2, Vec2::new(200.0, 0.0)) {
        Gesture::PinchTo(s) => assert!((s - 2.0).abs() < 1e-5),
        other => panic!("expected pinch, got {other:?}"),
    }
    assert_eq!(t.up(2, Vec2::new(200.0, 0.0)), Gesture::PinchEnd);
    assert_eq!(t.primary(), Some(Vec2::ZERO));
    // the remaining finger lifting after a pinch is not a click
    assert_eq!(t.up(1, Vec2::ZERO), Gesture::DragEnd);
}

#[test]
fn third_finger_is_ignored() {
    let mut t = PointerTracker::new();
    t.down(1, Vec2::ZERO);
    t.down(2, Vec2::new(50.0, 0.0));
    assert_eq!(t.down(3, Vec2::new(0.0, 50.0)), Gesture::Ignored);
    assert_eq!(t.active(), 3);
}

#[test]
fn cancel_ends_a_press_without_clicking() {
    let mut t = PointerTracker::new();
    t.down(1, Vec2::new(10.0, 10.0));
    assert_eq!(t.cancel(1), Gesture::DragEnd);
    assert_eq!(t.up(1, Vec2::new(10.0, 10.0)), Gesture::Ignored);
}

#[test]
fn releasing_an_unknown_pointer_is_ignored() {
    let mut t = PointerTracker::new();
    assert_eq!(t.up(9, Vec2::ZERO), Gesture::Ignored);
}

#[test]
fn client_coordinates_scale_to_backing_pixels() {
    let px = client_to_canvas_px(
        Vec2::new(60.0, 30.0),
        Vec2::new(10.0, 10.0),
        Vec2::new(100.0, 50.0),
        Vec2::new(200.0, 100.0),
    );
    assert_eq!(px, Vec2::new(100.0, 40.0));
}

#[test]
fn collapsed_canvas_maps_to_origin() {
    let px = client_to_canvas_px(
        Vec2::new(60.0, 30.0),
        Vec2::ZERO,
        Vec2::new(0.0, 50.0),
        Vec2::new(200.0, 100.0),
    );
    assert_eq!(px, Vec2::ZERO);
}
