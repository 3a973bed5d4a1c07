use crate::app::App;
use crate::dom;
use crate::input::{Gesture, PointerTracker};
use pano_core::PanoramaStore;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

fn listen<E: JsCast>(
    target: &web::EventTarget,
    event: &str,
    mut handler: impl FnMut(E) + 'static,
) {
    let closure = Closure::wrap(Box::new(move |ev: web::Event| {
        if let Ok(ev) = ev.dyn_into::<E>() {
            handler(ev);
        }
    }) as Box<dyn FnMut(_)>);
    if let Err(e) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        log::warn!("[ui] could not listen for {}: {:?}", event, e);
    }
    closure.forget();
}

fn apply_gesture<S: PanoramaStore + 'static>(app: &Rc<App<S>>, gesture: Gesture) {
    match gesture {
        Gesture::Hover(px) => app.hover(Some(px)),
        Gesture::DragStart(px) => app.viewer.borrow_mut().camera_mut().drag_start(px),
        Gesture::DragTo(px) => {
            app.viewer.borrow_mut().drag_to(px);
        }
        Gesture::DragEnd => app.viewer.borrow_mut().camera_mut().drag_end(),
        Gesture::PinchStart => {
            let mut v = app.viewer.borrow_mut();
            v.camera_mut().drag_end();
            v.camera_mut().pinch_start();
        }
        Gesture::PinchTo(scale) => app.viewer.borrow_mut().camera_mut().pinch_to(scale),
        Gesture::PinchEnd => app.viewer.borrow_mut().camera_mut().pinch_end(),
        Gesture::Click(px) => {
            app.viewer.borrow_mut().camera_mut().drag_end();
            app.click(px);
        }
        Gesture::Ignored => {}
    }
}

/// Pointer, wheel and resize handling for the canvas.
pub fn wire_input_handlers<S: PanoramaStore + 'static>(app: &Rc<App<S>>) {
    let canvas: web::EventTarget = app.canvas.clone().into();
    let tracker = Rc::new(RefCell::new(PointerTracker::new()));

    {
        let app = app.clone();
        let tracker = tracker.clone();
        listen(&canvas, "pointerdown", move |ev: web::PointerEvent| {
            let px = dom::pointer_canvas_px(&ev, &app.canvas);
            let _ = app.canvas.set_pointer_capture(ev.pointer_id());
            let gesture = tracker.borrow_mut().down(ev.pointer_id(), px);
            apply_gesture(&app, gesture);
            ev.prevent_default();
        });
    }
    {
        let app = app.clone();
        let tracker = tracker.clone();
        listen(&canvas, "pointermove", move |ev: web::PointerEvent| {
            let px = dom::pointer_canvas_px(&ev, &app.canvas);
            let gesture = tracker.borrow_mut().move_to(ev.pointer_id(), px);
            apply_gesture(&app, gesture);
        });
    }
    {
        let app = app.clone();
        let tracker = tracker.clone();
        listen(&canvas, "pointerup", move |ev: web::PointerEvent| {
            let px = dom::pointer_canvas_px(&ev, &app.canvas);
            let gesture = tracker.borrow_mut().up(ev.pointer_id(), px);
            // a resumed second finger keeps dragging from where it is
            let resume = matches!(gesture, Gesture::PinchEnd)
                .then(|| tracker.borrow().primary())
                .flatten();
            apply_gesture(&app, gesture);
            if let Some(p) = resume {
                app.viewer.borrow_mut().camera_mut().drag_start(p);
            }
            // first user gesture: platforms that gate orientation events
            // accept the permission prompt here
            app.request_orientation();
        });
    }
    {
        let app = app.clone();
        let tracker = tracker.clone();
        listen(&canvas, "pointercancel", move |ev: web::PointerEvent| {
            let gesture = tracker.borrow_mut().cancel(ev.pointer_id());
            apply_gesture(&app, gesture);
        });
    }
    {
        let app = app.clone();
        listen(&canvas, "pointerleave", move |ev: web::PointerEvent| {
            if ev.pointer_type() == "mouse" {
                app.hover(None);
            }
        });
    }
    {
        let app = app.clone();
        listen(&canvas, "wheel", move |ev: web::WheelEvent| {
            app.viewer
                .borrow_mut()
                .camera_mut()
                .zoom_by_wheel(ev.delta_y() as f32);
            ev.prevent_default();
        });
    }
    if let Some(window) = web::window() {
        let canvas = app.canvas.clone();
        listen(window.as_ref(), "resize", move |_: web::Event| {
            dom::sync_canvas_backing_size(&canvas);
        });
    }
}

/// Delegated clicks on the overlay's toolbar, map, panel and dialog.
pub fn wire_overlay_actions<S: PanoramaStore + 'static>(app: &Rc<App<S>>) {
    {
        let a = app.clone();
        dom::add_action_listener(&app.overlay.toolbar, move |action, _| {
            a.on_toolbar_action(&action);
        });
    }
    {
        let a = app.clone();
        dom::add_action_listener(app.overlay.map(), move |action, el| {
            a.on_map_action(&action, &el);
        });
    }
    {
        let a = app.clone();
        dom::add_action_listener(app.overlay.panel(), move |action, _| {
            a.on_panel_action(&action);
        });
    }
    {
        let a = app.clone();
        dom::add_action_listener(app.overlay.modal(), move |action, _| {
            a.on_modal_action(&action);
        });
    }
}

fn typing_into_field(ev: &web::KeyboardEvent) -> bool {
    ev.target()
        .and_then(|t| t.dyn_into::<web::Element>().ok())
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

pub fn wire_global_keydown<S: PanoramaStore + 'static>(app: &Rc<App<S>>) {
    let Some(window) = web::window() else {
        return;
    };
    let app = app.clone();
    listen(window.as_ref(), "keydown", move |ev: web::KeyboardEvent| {
        let key = ev.key();
        if key == "Escape" {
            app.dismiss();
            return;
        }
        if typing_into_field(&ev) {
            return;
        }
        match key.as_str() {
            "+" | "=" => app.viewer.borrow_mut().camera_mut().zoom_in(),
            "-" | "_" => app.viewer.borrow_mut().camera_mut().zoom_out(),
            "g" | "G" => app.toggle_gyro(),
            "c" | "C" => app.recalibrate(),
            _ => return,
        }
        ev.prevent_default();
    });
}

/// Orientation events stop with the page and restart with it.
pub fn wire_page_lifecycle<S: PanoramaStore + 'static>(app: &Rc<App<S>>) {
    let Some(window) = web::window() else {
        return;
    };
    {
        let app = app.clone();
        listen(window.as_ref(), "pagehide", move |_: web::Event| {
            app.unmount_orientation();
        });
    }
    {
        let app = app.clone();
        listen(window.as_ref(), "pageshow", move |_: web::Event| {
            if !app.permission_required() {
                app.request_orientation();
            }
        });
    }
}
