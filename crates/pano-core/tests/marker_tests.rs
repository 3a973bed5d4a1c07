// Host-side tests for marker activation and the model toggle.

mod common;

use common::*;
use glam::Vec3;
use pano_core::markers::ActivationIntent;
use pano_core::{ClickOutcome, MarkerId, Media, Mode, ModelState, Ray};

fn orchid() -> MarkerId {
    "m-orchid".into()
}

fn click_orchid(v: &mut pano_core::Viewer) -> pano_core::Activation {
    match v.click(&Ray::new(Vec3::ZERO, Vec3::X)).unwrap() {
        ClickOutcome::Activated(a) => a,
        other => panic!("expected activation, got {other:?}"),
    }
}

#[test]
fn model_is_visible_after_odd_number_of_activations() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    for n in 1..=7 {
        let a = click_orchid(&mut v);
        assert_eq!(a.marker, orchid());
        let visible = v.markers().is_model_visible(&orchid());
        assert_eq!(visible, n % 2 == 1, "after {n} activations");
        // Only "show" transitions ask for a load.
        assert_eq!(a.model.is_some(), visible);
    }
}

#[test]
fn hiding_while_loading_drops_the_late_result() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    let first = click_orchid(&mut v).model.unwrap();
    assert!(matches!(
        v.markers().model_state(&orchid()),
        ModelState::Loading(_)
    ));

    // Second activation before the load finished means hide.
    assert!(click_orchid(&mut v).model.is_none());
    assert!(!v.markers_mut().complete_model_load(&orchid(), first.token, Ok(())));
    assert_eq!(v.markers().model_state(&orchid()), ModelState::Hidden);

    // Showing again issues a fresh token; the old one still does nothing.
    let second = click_orchid(&mut v).model.unwrap();
    assert_ne!(first.token, second.token);
    assert!(!v.markers_mut().complete_model_load(&orchid(), first.token, Ok(())));
    assert!(v.markers_mut().complete_model_load(&orchid(), second.token, Ok(())));
    assert_eq!(v.markers().model_state(&orchid()), ModelState::Shown);
}

#[test]
fn leaving_the_scene_forgets_model_visibility() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    let req = click_orchid(&mut v).model.unwrap();

    let t = v.follow_link(&"l-board".into()).unwrap();
    load(&mut v, &store, &t);
    let t = v.follow_link(&"l-back".into()).unwrap();
    load(&mut v, &store, &t);

    assert_eq!(v.markers().model_state(&orchid()), ModelState::Hidden);
    assert!(!v.markers_mut().complete_model_load(&orchid(), req.token, Ok(())));
    // The next activation starts from "hidden" again.
    assert!(click_orchid(&mut v).model.is_some());
}

#[test]
fn view_mode_presents_marker_content() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    match v.click(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap() {
        ClickOutcome::Activated(a) => match a.intent {
            ActivationIntent::Present(content) => {
                assert_eq!(content.title, "Welcome");
                assert_eq!(content.body, "Mind the tide");
                assert!(content.media.is_none());
            }
            other => panic!("expected content, got {other:?}"),
        },
        other => panic!("expected activation, got {other:?}"),
    }
}

#[test]
fn image_marker_presents_its_media() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    let t = v.follow_link(&"l-board".into()).unwrap();
    load(&mut v, &store, &t);
    let crab = v.markers().get(&"m-crab".into()).unwrap().position;
    match v.click(&Ray::new(Vec3::ZERO, crab)).unwrap() {
        ClickOutcome::Activated(a) => match a.intent {
            ActivationIntent::Present(content) => assert_eq!(
                content.media,
                Some(Media::Image("https://cdn.test/crab.jpg".into()))
            ),
            other => panic!("expected content, got {other:?}"),
        },
        other => panic!("expected activation, got {other:?}"),
    }
}

#[test]
fn author_mode_marker_click_opens_editor() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::Author);
    let a = match v.click(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).unwrap() {
        ClickOutcome::Activated(a) => a,
        other => panic!("expected activation, got {other:?}"),
    };
    match a.intent {
        ActivationIntent::Edit(m) => assert_eq!(m.id.as_str(), "m-info"),
        other => panic!("expected editor, got {other:?}"),
    }
}

#[test]
fn hover_shows_marker_title() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    assert!(v.hover(Some(&Ray::new(Vec3::ZERO, Vec3::X))));
    assert_eq!(v.hovered_label().unwrap().text, "Orchid");
    assert!(!v.hover(Some(&Ray::new(Vec3::ZERO, Vec3::X))));
    assert!(v.hover(None));
    assert!(v.hovered_label().is_none());

    let ind = v.indicators();
    assert_eq!(ind.len(), 4);
    assert!(ind.iter().all(|i| !i.hovered));
}

#[test]
fn tapping_a_marker_shows_its_title_without_hover() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    assert!(v.hovered_label().is_none());

    click_orchid(&mut v);
    let label = v.hovered_label().unwrap();
    assert_eq!(label.text, "Orchid");
    assert_eq!(label.anchor, Vec3::new(10.0, 0.0, 0.0));
    assert!(v.indicators().iter().any(|i| i.hovered));

    // tapping empty sky takes the label away again
    assert_eq!(
        v.click(&Ray::new(Vec3::ZERO, Vec3::Y)).unwrap(),
        ClickOutcome::Ignored
    );
    assert!(v.hovered_label().is_none());
}
