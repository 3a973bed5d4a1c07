// Host-side tests for navigation between panoramas.

mod common;

use common::*;
use glam::Vec3;
use pano_core::authoring::save_link;
use pano_core::viewer::{fetch_scene, ContentsState};
use pano_core::{
    Applied, ClickOutcome, LinkDraft, Mode, PanoError, Ray, TextureState, Viewer, ViewerConfig,
};

#[test]
fn entry_point_is_active_panorama_of_site() {
    let store = site_store();
    let (v, _) = viewer_at_entry(&store, Mode::View);
    let scene = v.scene().unwrap();
    assert_eq!(scene.key.as_ref().unwrap().as_str(), "p-entry");
    assert_eq!(scene.texture, TextureState::Ready);
    assert_eq!(scene.contents, ContentsState::Ready);
    assert_eq!(v.markers().markers().len(), 2);
    assert_eq!(v.links().len(), 2);
    assert!(approx(v.camera().heading(), 10.0));
    assert!(approx(v.camera().fov(), 70.0));
}

#[test]
fn configured_start_panorama_wins_over_active() {
    let store = site_store();
    let mut v = Viewer::new(ViewerConfig {
        site_id: Some("mangroves".into()),
        start_panorama: Some("p-tower".into()),
        ..ViewerConfig::default()
    });
    v.set_catalog(store.panoramas());
    assert_eq!(v.entry_point().unwrap().as_str(), "p-tower");
}

#[test]
fn late_contents_of_previous_scene_are_discarded() {
    let store = site_store();
    let mut v = viewer(Mode::View);
    v.set_catalog(store.panoramas());

    let first = v.open(&"p-entry".into()).unwrap();
    let second = v.open(&"p-boardwalk".into()).unwrap();
    assert_ne!(first.generation, second.generation);

    // The boardwalk answers first, then the entry's slower responses arrive.
    let board = pollster::block_on(fetch_scene(&store, &second));
    assert_eq!(v.apply_contents(&second, board), Applied::Current);
    let entry = pollster::block_on(fetch_scene(&store, &first));
    assert_eq!(v.apply_contents(&first, entry), Applied::Stale);
    assert_eq!(v.apply_texture(&first, Ok(())), Applied::Stale);

    let scene = v.scene().unwrap();
    assert_eq!(scene.key.as_ref().unwrap().as_str(), "p-boardwalk");
    assert_eq!(scene.texture, TextureState::Loading);
    let titles: Vec<_> = v.markers().markers().iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, ["Fiddler crab"]);
}

#[test]
fn close_makes_pending_loads_stale() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    let ticket = v.open(&"p-tower".into()).unwrap();
    v.close();
    assert!(v.scene().is_none());
    assert_eq!(v.apply_texture(&ticket, Ok(())), Applied::Stale);
    assert!(v.markers().markers().is_empty());
}

#[test]
fn following_link_faces_its_heading_with_destination_fov() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    let ticket = v.follow_link(&"l-board".into()).unwrap();
    assert_eq!(ticket.panorama.as_ref().unwrap().as_str(), "p-boardwalk");
    assert!(approx(v.camera().heading(), 135.0));
    assert!(approx(v.camera().pitch(), 5.0));
    assert!(approx(v.camera().fov(), 50.0));
    // Old scene contents are gone until the new ones arrive.
    assert!(v.links().is_empty());
    load(&mut v, &store, &ticket);
    assert_eq!(v.links()[0].id.as_str(), "l-back");
}

#[test]
fn saved_link_leads_to_its_destination_after_reopening() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::Author);
    let t = v.open(&"p-tower".into()).unwrap();
    load(&mut v, &store, &t);
    assert!(v.links().is_empty());

    let draft = LinkDraft {
        target_id: Some("p-boardwalk".into()),
        label: "Down to the water".into(),
        ..LinkDraft::new("p-tower".into(), Vec3::new(0.0, -2.0, -9.0), 42.0)
    };
    let saved = pollster::block_on(save_link(&store, &draft, v.catalog())).unwrap();
    assert!(v.apply_saved_link(saved.clone()));
    assert_eq!(v.links().len(), 1);

    // leave and come back so the link comes from the store
    let t = v.open(&"p-entry".into()).unwrap();
    load(&mut v, &store, &t);
    let t = v.open(&"p-tower".into()).unwrap();
    load(&mut v, &store, &t);
    assert_eq!(v.links(), [saved.clone()]);

    let t = v.follow_link(&saved.id).unwrap();
    assert_eq!(t.panorama.as_ref().unwrap().as_str(), "p-boardwalk");
    assert!(approx(v.camera().heading(), 42.0));
    assert!(approx(v.camera().fov(), 50.0));
}

#[test]
fn cycles_navigate_like_any_other_link() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    for _ in 0..3 {
        let t = v.follow_link(&"l-board".into()).unwrap();
        load(&mut v, &store, &t);
        let t = v.follow_link(&"l-back".into()).unwrap();
        load(&mut v, &store, &t);
    }
    assert_eq!(v.container().unwrap().as_str(), "p-entry");
    assert!(approx(v.camera().heading(), 300.0));
}

#[test]
fn dangling_link_leaves_scene_untouched() {
    let store = site_store();
    let (mut v, ticket) = viewer_at_entry(&store, Mode::View);
    let heading = v.camera().heading();

    let err = v.follow_link(&"l-gone".into()).unwrap_err();
    assert!(matches!(err, PanoError::DanglingLink { .. }));

    assert!(v.is_current(&ticket));
    assert_eq!(v.container().unwrap().as_str(), "p-entry");
    assert_eq!(v.links().len(), 2);
    assert_eq!(v.markers().markers().len(), 2);
    assert_eq!(v.camera().heading(), heading);
}

#[test]
fn clicking_link_in_view_mode_navigates() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::View);
    let ray = Ray::new(Vec3::ZERO, Vec3::NEG_X);
    match v.click(&ray).unwrap() {
        ClickOutcome::Navigate(t) => assert_eq!(t.panorama.unwrap().as_str(), "p-boardwalk"),
        other => panic!("expected navigation, got {other:?}"),
    }
}

#[test]
fn failed_texture_keeps_navigation_available() {
    let store = site_store();
    let mut v = viewer(Mode::View);
    v.set_catalog(store.panoramas());
    let t = v.open(&"p-entry".into()).unwrap();
    v.apply_texture(&t, Err("HTTP 404".into()));
    let contents = pollster::block_on(fetch_scene(&store, &t));
    v.apply_contents(&t, contents);
    assert_eq!(v.scene().unwrap().texture, TextureState::Failed("HTTP 404".into()));
    assert!(v.follow_link(&"l-board".into()).is_ok());
}
