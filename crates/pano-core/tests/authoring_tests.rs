// Host-side tests for authoring: drafts, saves and deletes against the store.

mod common;

use common::*;
use glam::Vec3;
use pano_core::authoring::{
    confirm_delete, save_link, save_marker, save_panorama, DeleteTarget, Editing, Placement,
};
use pano_core::record::{CatalogDump, LinkRow, MarkerRow};
use pano_core::{
    ClickOutcome, MarkerDraft, MarkerKind, MemoryStore, Mode, PanoError, PanoramaDraft,
    PanoramaId, Ray, StoreOp, Viewer,
};

fn down() -> Ray {
    Ray::new(Vec3::ZERO, Vec3::NEG_Y)
}

fn open_marker_draft(v: &Viewer) -> MarkerDraft {
    match v.authoring().editing() {
        Editing::Marker(d) => d.clone(),
        other => panic!("expected marker editor, got {other:?}"),
    }
}

fn remaining_for(store: &MemoryStore, id: &PanoramaId) -> (usize, usize) {
    let markers = store.markers().iter().filter(|m| &m.panorama_id == id).count();
    let links = store.links().iter().filter(|l| &l.source_id == id).count();
    (markers, links)
}

fn delete_entry(store: &MemoryStore) -> Viewer {
    let (mut v, _) = viewer_at_entry(store, Mode::Author);
    let id: PanoramaId = "p-entry".into();
    assert_ne!(remaining_for(store, &id), (0, 0));

    v.authoring_mut()
        .request_delete(DeleteTarget::Panorama(id.clone()));
    let target = match v.authoring().editing() {
        Editing::ConfirmDelete(t) => t.clone(),
        other => panic!("expected confirmation, got {other:?}"),
    };
    pollster::block_on(confirm_delete(store, &target)).unwrap();
    v.apply_deleted(&target);
    v.authoring_mut().finish();

    assert_eq!(remaining_for(store, &id), (0, 0));
    assert!(!store.panoramas().iter().any(|p| p.id == id));
    assert!(v.scene().is_none());
    v
}

#[test]
fn deleting_panorama_leaves_no_dependents_with_cascading_store() {
    let store = site_store();
    delete_entry(&store);
    assert_eq!(store.calls(StoreOp::DeleteMarker), 0);
    assert_eq!(store.calls(StoreOp::DeleteLink), 0);
}

#[test]
fn deleting_panorama_leaves_no_dependents_without_cascade() {
    let store = site_store().with_cascade(false);
    let mut v = delete_entry(&store);
    assert_eq!(store.calls(StoreOp::DeleteMarker), 2);
    assert_eq!(store.calls(StoreOp::DeleteLink), 2);

    // Incoming links survive and are now dangling; following one is refused.
    let t = v.open(&"p-boardwalk".into()).unwrap();
    load(&mut v, &store, &t);
    let err = v.follow_link(&"l-back".into()).unwrap_err();
    assert!(matches!(err, PanoError::DanglingLink { .. }));
}

#[test]
fn unreadable_dependents_are_deleted_with_their_panorama() {
    let mut dump: CatalogDump = serde_json::from_str(SITE).unwrap();
    dump.markers.push(MarkerRow {
        id: Some("m-hologram".into()),
        panorama_id: "p-entry".into(),
        kind: "panorama-3d".into(),
        position_z: -10.0,
        ..MarkerRow::default()
    });
    dump.links.push(LinkRow {
        id: Some("l-nowhere".into()),
        source_panorama_id: "p-entry".into(),
        target_panorama_id: "p-tower".into(),
        ..LinkRow::default()
    });
    let store = MemoryStore::from_dump(dump).with_cascade(false);
    assert_eq!(store.unreadable_markers().len(), 1);
    assert_eq!(store.unreadable_links().len(), 1);

    delete_entry(&store);
    assert!(store.unreadable_markers().is_empty());
    assert!(store.unreadable_links().is_empty());
    assert_eq!(store.calls(StoreOp::DeleteMarker), 3);
    assert_eq!(store.calls(StoreOp::DeleteLink), 3);
}

#[test]
fn failed_dependent_delete_keeps_the_parent() {
    let store = site_store().with_cascade(false);
    store.fail_on(StoreOp::DeleteLink);
    let target = DeleteTarget::Panorama("p-entry".into());
    let err = pollster::block_on(confirm_delete(&store, &target)).unwrap_err();
    assert!(matches!(err, PanoError::Store(_)));
    assert_eq!(store.calls(StoreOp::DeletePanorama), 0);
    assert!(store.panoramas().iter().any(|p| p.id.as_str() == "p-entry"));
}

#[test]
fn unsaved_panorama_cannot_host_markers() {
    let store = site_store();
    let mut v = viewer(Mode::Author);
    v.set_catalog(store.panoramas());
    v.preview_unsaved(&PanoramaDraft {
        title: "Draft".into(),
        image_url: "https://cdn.test/draft.jpg".into(),
        ..PanoramaDraft::default()
    });

    assert_eq!(v.click(&down()), Err(PanoError::UnsavedPanorama));
    assert!(v.authoring().is_idle());
    assert!(v.authoring().error().is_some());
    assert_eq!(v.add_link(), Err(PanoError::UnsavedPanorama));

    let orphan = MarkerDraft {
        panorama_id: None,
        ..MarkerDraft::new("ignored".into(), Vec3::NEG_Z * 10.0)
    };
    let err = pollster::block_on(save_marker(&store, &orphan)).unwrap_err();
    assert_eq!(err, PanoError::UnsavedPanorama);
    assert_eq!(store.calls(StoreOp::InsertMarker), 0);
}

#[test]
fn store_failure_keeps_the_editor_open() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::Author);
    assert_eq!(v.click(&down()).unwrap(), ClickOutcome::Editing);

    let mut draft = open_marker_draft(&v);
    assert_eq!(draft.panorama_id.as_ref().unwrap().as_str(), "p-entry");
    assert!((draft.position - Vec3::new(0.0, -10.0, 0.0)).length() < 1e-3);
    draft.title = "Roots".into();
    draft.content = "Aerial roots breathe at low tide".into();
    *v.authoring_mut().editing_mut() = Editing::Marker(draft.clone());

    store.fail_on(StoreOp::InsertMarker);
    let err = pollster::block_on(save_marker(&store, &draft)).unwrap_err();
    v.authoring_mut().set_error(err.to_string());
    assert!(err.to_string().contains("insert marker"));
    assert_eq!(open_marker_draft(&v).title, "Roots");
    assert_eq!(v.markers().markers().len(), 2);

    store.recover(StoreOp::InsertMarker);
    let saved = pollster::block_on(save_marker(&store, &draft)).unwrap();
    assert!(v.apply_saved_marker(saved));
    v.authoring_mut().finish();
    assert!(v.authoring().is_idle());
    assert!(v.authoring().error().is_none());
    assert_eq!(v.markers().markers().len(), 3);
    assert_eq!(store.markers().len(), 4);
}

#[test]
fn saving_existing_marker_updates_in_place() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::Author);
    let marker = v.markers().get(&"m-info".into()).unwrap().clone();
    v.authoring_mut().edit_marker(&marker);
    let mut draft = open_marker_draft(&v);
    draft.title = "Welcome back".into();

    let saved = pollster::block_on(save_marker(&store, &draft)).unwrap();
    assert_eq!(saved.id, marker.id);
    assert_eq!(store.calls(StoreOp::UpdateMarker), 1);
    assert_eq!(store.calls(StoreOp::InsertMarker), 0);
    assert_eq!(store.markers().len(), 3);

    assert!(v.apply_saved_marker(saved));
    assert_eq!(v.markers().get(&marker.id).unwrap().title, "Welcome back");
}

#[test]
fn media_markers_need_a_url() {
    let store = site_store();
    let mut draft = MarkerDraft::new("p-entry".into(), Vec3::NEG_Z * 10.0);
    draft.kind = MarkerKind::Video { url: "  ".into() };
    let err = pollster::block_on(save_marker(&store, &draft)).unwrap_err();
    assert_eq!(err, PanoError::MissingMediaUrl("video"));

    draft.kind = MarkerKind::Info;
    draft.position = Vec3::ZERO;
    let err = pollster::block_on(save_marker(&store, &draft)).unwrap_err();
    assert_eq!(err, PanoError::DegeneratePosition);
    assert_eq!(store.calls(StoreOp::InsertMarker), 0);
}

#[test]
fn new_link_faces_the_current_heading() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::Author);
    v.authoring_mut().set_placement(Placement::Link);
    assert_eq!(v.click(&down()).unwrap(), ClickOutcome::Editing);

    let mut draft = match v.authoring().editing() {
        Editing::Link(d) => d.clone(),
        other => panic!("expected link editor, got {other:?}"),
    };
    assert!(approx(draft.target_heading_deg, 10.0));
    assert!(draft.target_id.is_none());

    let err = pollster::block_on(save_link(&store, &draft, v.catalog())).unwrap_err();
    assert!(matches!(err, PanoError::InvalidRecord(_)));
    draft.target_id = Some("p-removed".into());
    let err = pollster::block_on(save_link(&store, &draft, v.catalog())).unwrap_err();
    assert_eq!(err, PanoError::UnknownPanorama("p-removed".into()));
    assert_eq!(store.calls(StoreOp::InsertLink), 0);

    draft.target_id = Some("p-tower".into());
    draft.label = "Up the tower".into();
    let saved = pollster::block_on(save_link(&store, &draft, v.catalog())).unwrap();
    assert!(v.apply_saved_link(saved));
    assert_eq!(v.links().len(), 3);
}

#[test]
fn author_mode_link_click_opens_its_editor() {
    let store = site_store();
    let (mut v, t) = viewer_at_entry(&store, Mode::Author);
    let out = v.click(&Ray::new(Vec3::ZERO, Vec3::NEG_X)).unwrap();
    assert_eq!(out, ClickOutcome::Editing);
    match v.authoring().editing() {
        Editing::Link(d) => assert_eq!(d.id.as_ref().unwrap().as_str(), "l-board"),
        other => panic!("expected link editor, got {other:?}"),
    }
    // No navigation happened.
    assert!(v.is_current(&t));
}

#[test]
fn activating_a_panorama_clears_its_siblings() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::Author);
    let mut draft = v.catalog().get(&"p-tower".into()).unwrap().to_draft();
    draft.is_active = true;

    let saved = pollster::block_on(save_panorama(&store, &draft, v.catalog())).unwrap();
    assert_eq!(saved.deactivated.len(), 1);
    assert_eq!(saved.deactivated[0].id.as_str(), "p-entry");
    assert!(v.apply_saved_panorama(saved).is_none());

    let active: Vec<_> = store
        .panoramas()
        .into_iter()
        .filter(|p| p.is_active)
        .map(|p| p.id)
        .collect();
    assert_eq!(active, [PanoramaId::from("p-tower")]);
    assert_eq!(v.entry_point().unwrap().as_str(), "p-tower");
}

fn active_in_store(store: &MemoryStore) -> Vec<PanoramaId> {
    store
        .panoramas()
        .into_iter()
        .filter(|p| p.is_active)
        .map(|p| p.id)
        .collect()
}

fn new_active_lookout() -> PanoramaDraft {
    PanoramaDraft {
        site_id: Some("mangroves".into()),
        title: "Lookout".into(),
        image_url: "https://cdn.test/lookout.jpg".into(),
        is_active: true,
        ..PanoramaDraft::default()
    }
}

#[test]
fn rejected_active_panorama_leaves_siblings_active() {
    let store = site_store();
    let (v, _) = viewer_at_entry(&store, Mode::Author);
    store.fail_on(StoreOp::InsertPanorama);

    let err = pollster::block_on(save_panorama(&store, &new_active_lookout(), v.catalog()));
    assert!(matches!(err, Err(PanoError::Store(_))));
    assert_eq!(store.calls(StoreOp::UpdatePanorama), 0);
    assert_eq!(active_in_store(&store), [PanoramaId::from("p-entry")]);
    assert!(v.catalog().get(&"p-entry".into()).unwrap().is_active);
}

#[test]
fn sibling_left_active_is_reported_and_mirrored() {
    let store = site_store();
    let (mut v, _) = viewer_at_entry(&store, Mode::Author);
    store.fail_on(StoreOp::UpdatePanorama);

    let saved =
        pollster::block_on(save_panorama(&store, &new_active_lookout(), v.catalog())).unwrap();
    assert!(saved.deactivated.is_empty());
    assert_eq!(saved.sibling_error.as_ref().unwrap().op, StoreOp::UpdatePanorama);
    let lookout = saved.panorama.id.clone();
    v.apply_saved_panorama(saved);

    // the viewer shows exactly what the store holds
    let mut in_store = active_in_store(&store);
    in_store.sort();
    let mut in_viewer: Vec<_> = v
        .catalog()
        .iter()
        .filter(|p| p.is_active)
        .map(|p| p.id.clone())
        .collect();
    in_viewer.sort();
    assert_eq!(in_store, in_viewer);
    assert!(in_viewer.contains(&lookout));
}

#[test]
fn new_panorama_needs_an_image() {
    let store = site_store();
    let err = pollster::block_on(save_panorama(
        &store,
        &PanoramaDraft::default(),
        &pano_core::Catalog::default(),
    ))
    .unwrap_err();
    assert!(matches!(err, PanoError::InvalidRecord(_)));
    assert_eq!(store.calls(StoreOp::InsertPanorama), 0);
}

#[test]
fn changing_the_image_reloads_the_scene() {
    let store = site_store();
    let (mut v, t) = viewer_at_entry(&store, Mode::Author);
    v.edit_current_panorama();
    let mut draft = match v.authoring().editing() {
        Editing::Panorama(d) => d.clone(),
        other => panic!("expected panorama editor, got {other:?}"),
    };
    draft.image_url = "https://cdn.test/entry-v2.jpg".into();
    let saved = pollster::block_on(save_panorama(&store, &draft, v.catalog())).unwrap();
    let reload = v.apply_saved_panorama(saved).unwrap();
    assert!(!v.is_current(&t));
    assert_eq!(reload.image_url, "https://cdn.test/entry-v2.jpg");
}
