// Shared fixtures for the host-side integration tests.

#![allow(dead_code)]

use pano_core::{MemoryStore, Mode, PanoramaStore, SceneTicket, Viewer, ViewerConfig};

pub const SITE: &str = r#"{
  "panoramas": [
    {"id": "p-entry", "site_id": "mangroves", "title": "Entrance", "image_url": "https://cdn.test/entry.jpg",
     "is_active": true, "initial_heading": 10.0, "initial_pitch": 0.0, "initial_fov": 70.0,
     "floor_x": 0.2, "floor_y": 0.8},
    {"id": "p-boardwalk", "site_id": "mangroves", "title": "Boardwalk", "image_url": "https://cdn.test/board.jpg",
     "initial_heading": 200.0, "initial_pitch": 5.0, "initial_fov": 50.0, "floor_x": 0.5, "floor_y": 0.5},
    {"id": "p-tower", "site_id": "mangroves", "title": "Tower", "image_url": "https://cdn.test/tower.jpg"}
  ],
  "markers": [
    {"id": "m-info", "panorama_id": "p-entry", "type": "info", "position_x": 0.0, "position_y": 0.0,
     "position_z": -10.0, "title": "Welcome", "content": "Mind the tide"},
    {"id": "m-orchid", "panorama_id": "p-entry", "type": "model", "position_x": 10.0, "position_y": 0.0,
     "position_z": 0.0, "title": "Orchid", "model_url": "https://cdn.test/orchid.glb"},
    {"id": "m-crab", "panorama_id": "p-boardwalk", "type": "image", "media_url": "https://cdn.test/crab.jpg",
     "position_x": 0.0, "position_y": 2.0, "position_z": -9.0, "title": "Fiddler crab"}
  ],
  "links": [
    {"id": "l-board", "source_panorama_id": "p-entry", "target_panorama_id": "p-boardwalk",
     "position_x": -10.0, "position_y": 0.0, "position_z": 0.0, "target_heading": 135.0, "label": "To the boardwalk"},
    {"id": "l-gone", "source_panorama_id": "p-entry", "target_panorama_id": "p-removed",
     "position_x": 0.0, "position_y": 0.0, "position_z": 10.0, "target_heading": 0.0},
    {"id": "l-back", "source_panorama_id": "p-boardwalk", "target_panorama_id": "p-entry",
     "position_x": 0.0, "position_y": 0.0, "position_z": 10.0, "target_heading": 300.0}
  ]
}"#;

pub fn site_store() -> MemoryStore {
    MemoryStore::from_json(SITE).unwrap()
}

pub fn viewer(mode: Mode) -> Viewer {
    Viewer::new(ViewerConfig {
        mode,
        site_id: Some("mangroves".into()),
        ..ViewerConfig::default()
    })
}

/// Load the catalog, open the entry point and apply its contents.
pub fn viewer_at_entry(store: &MemoryStore, mode: Mode) -> (Viewer, SceneTicket) {
    let mut v = viewer(mode);
    v.set_catalog(pollster::block_on(store.fetch_panoramas()).unwrap());
    let entry = v.entry_point().unwrap();
    let ticket = v.open(&entry).unwrap();
    load(&mut v, store, &ticket);
    (v, ticket)
}

pub fn load(v: &mut Viewer, store: &MemoryStore, ticket: &SceneTicket) {
    let contents = pollster::block_on(pano_core::viewer::fetch_scene(store, ticket));
    v.apply_contents(ticket, contents);
    v.apply_texture(ticket, Ok(()));
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
