use crate::input;
use glam::Vec2;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Click delegation: `handler` gets the `data-action` of the nearest
/// ancestor of the click target that has one, and that element.
pub fn add_action_listener(
    root: &web::Element,
    mut handler: impl FnMut(String, web::Element) + 'static,
) {
    let closure = Closure::wrap(Box::new(move |ev: web::MouseEvent| {
        let Some(target) = ev.target().and_then(|t| t.dyn_into::<web::Element>().ok()) else {
            return;
        };
        let Ok(Some(el)) = target.closest("[data-action]") else {
            return;
        };
        if let Some(action) = el.get_attribute("data-action") {
            ev.prevent_default();
            handler(action, el);
        }
    }) as Box<dyn FnMut(_)>);
    let _ = root.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio();
        let rect = canvas.get_bounding_client_rect();
        let w_px = (rect.width() * dpr) as u32;
        let h_px = (rect.height() * dpr) as u32;
        canvas.set_width(w_px.max(1));
        canvas.set_height(h_px.max(1));
    }
}

/// Pointer position in canvas backing-store pixels.
#[inline]
pub fn pointer_canvas_px(ev: &web::MouseEvent, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    input::client_to_canvas_px(
        Vec2::new(ev.client_x() as f32, ev.client_y() as f32),
        Vec2::new(rect.left() as f32, rect.top() as f32),
        Vec2::new(rect.width() as f32, rect.height() as f32),
        Vec2::new(canvas.width() as f32, canvas.height() as f32),
    )
}

/// Backing-store pixels back to CSS pixels relative to the canvas.
#[inline]
pub fn canvas_px_to_css(px: Vec2, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    let sx = rect.width() as f32 / canvas.width().max(1) as f32;
    let sy = rect.height() as f32 / canvas.height().max(1) as f32;
    Vec2::new(px.x * sx, px.y * sy)
}

pub fn set_visible(el: &web::Element, visible: bool) {
    if visible {
        let _ = el.remove_attribute("hidden");
    } else {
        let _ = el.set_attribute("hidden", "");
    }
}

/// Find `#id`, creating a `<div>` with that id under `parent` when missing.
pub fn ensure_div(
    document: &web::Document,
    parent: &web::Element,
    id: &str,
    class: &str,
) -> anyhow::Result<web::Element> {
    if let Some(el) = document.get_element_by_id(id) {
        return Ok(el);
    }
    let el = document
        .create_element("div")
        .map_err(|e| anyhow::anyhow!(format!("create_element: {:?}", e)))?;
    el.set_id(id);
    el.set_class_name(class);
    parent
        .append_child(&el)
        .map_err(|e| anyhow::anyhow!(format!("append_child: {:?}", e)))?;
    Ok(el)
}
