#![cfg(target_arch = "wasm32")]
use pano_core::{MemoryStore, PanoramaStore, Viewer, ViewerConfig};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod app;
mod assets;
mod bridge;
mod decode;
mod dom;
mod events;
mod forms;
mod frame;
mod input;
mod markup;
mod orientation;
mod overlay;
mod render;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("pano-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id("pano-canvas")
        .ok_or_else(|| anyhow::anyhow!("missing #pano-canvas"))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;
    dom::sync_canvas_backing_size(&canvas);

    // Page-supplied settings: `data-config` on the canvas, JSON.
    let config = match canvas.get_attribute("data-config") {
        Some(json) => ViewerConfig::from_json(&json)?,
        None => ViewerConfig::default(),
    };
    log::info!(
        "[scene] mode {:?}, site {:?}",
        config.mode,
        config.site_id.as_ref().map(|s| s.as_str())
    );

    // A host page that owns the database exposes `window.panoStore`;
    // otherwise records come inline from `data-catalog`.
    match bridge::find_bridge(&window) {
        Some(b) => run(window, document, canvas, config, bridge::JsStore::new(b)).await,
        None => {
            let store = match canvas.get_attribute("data-catalog") {
                Some(json) => MemoryStore::from_json(&json)?,
                None => MemoryStore::new(),
            };
            log::warn!("[scene] no window.panoStore; using the in-page catalog");
            run(window, document, canvas, config, store).await
        }
    }
}

async fn run<S: PanoramaStore + 'static>(
    window: web::Window,
    document: web::Document,
    canvas: web::HtmlCanvasElement,
    config: ViewerConfig,
    store: S,
) -> anyhow::Result<()> {
    let overlay = overlay::Overlay::mount(&document)?;
    overlay.set_loading(true);

    // Leak a canvas clone to satisfy the 'static lifetime of the surface.
    let leaked_canvas: &'static web::HtmlCanvasElement = Box::leak(Box::new(canvas.clone()));
    let gpu = match render::GpuState::new(leaked_canvas, &config).await {
        Ok(g) => g,
        Err(e) => {
            overlay.set_loading(false);
            overlay.show_error(Some("This browser cannot display panoramas (WebGPU unavailable)."));
            return Err(e);
        }
    };

    let app = app::App::new(Viewer::new(config), store, overlay, gpu, canvas, window);
    events::wire_input_handlers(&app);
    events::wire_overlay_actions(&app);
    events::wire_global_keydown(&app);
    events::wire_page_lifecycle(&app);
    app.refresh_chrome();

    if !app.permission_required() {
        app.request_orientation();
    }

    frame::start_loop(Rc::new(RefCell::new(frame::FrameContext::new(app.clone()))));
    app.load_catalog().await;
    Ok(())
}
