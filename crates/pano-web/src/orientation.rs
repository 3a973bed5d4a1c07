//! Browser side of the gyroscope: the permission prompt and the
//! `deviceorientation` subscription feeding the core sampler.

use crate::bridge::js_error_message;
use pano_core::{PermissionOutcome, RawOrientation, Viewer};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Whether the platform wants an explicit grant before sending events.
/// Such a request has to run inside a user gesture.
pub fn permission_required(window: &web::Window) -> bool {
    event_class(window)
        .and_then(|class| js_sys::Reflect::get(&class, &"requestPermission".into()).ok())
        .is_some_and(|f| f.is_function())
}

fn event_class(window: &web::Window) -> Option<JsValue> {
    js_sys::Reflect::get(window, &"DeviceOrientationEvent".into())
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

pub async fn request_permission(window: &web::Window) -> PermissionOutcome {
    let Some(class) = event_class(window) else {
        return PermissionOutcome::Unsupported;
    };
    let request = match js_sys::Reflect::get(&class, &"requestPermission".into()) {
        Ok(f) if f.is_function() => f.unchecked_into::<js_sys::Function>(),
        _ => return PermissionOutcome::NotRequired,
    };
    let promise = match request.call0(&class) {
        Ok(p) => js_sys::Promise::resolve(&p),
        Err(e) => {
            log::warn!("[gyro] requestPermission threw: {}", js_error_message(&e));
            return PermissionOutcome::Denied;
        }
    };
    match JsFuture::from(promise).await {
        Ok(state) if state.as_string().as_deref() == Some("granted") => PermissionOutcome::Granted,
        Ok(state) => {
            log::info!("[gyro] permission answer: {:?}", state.as_string());
            PermissionOutcome::Denied
        }
        Err(e) => {
            log::warn!("[gyro] permission request failed: {}", js_error_message(&e));
            PermissionOutcome::Denied
        }
    }
}

/// Live `deviceorientation` listener; dropping it unsubscribes.
pub struct OrientationSubscription {
    window: web::Window,
    closure: Closure<dyn FnMut(web::DeviceOrientationEvent)>,
}

impl OrientationSubscription {
    pub fn subscribe(window: &web::Window, viewer: Rc<RefCell<Viewer>>) -> Option<Self> {
        let closure = Closure::wrap(Box::new(move |ev: web::DeviceOrientationEvent| {
            let raw = RawOrientation {
                alpha: ev.alpha().map(|v| v as f32),
                beta: ev.beta().map(|v| v as f32),
                gamma: ev.gamma().map(|v| v as f32),
            };
            if let Ok(mut v) = viewer.try_borrow_mut() {
                v.sampler_mut().record(raw);
            }
        }) as Box<dyn FnMut(_)>);
        match window
            .add_event_listener_with_callback("deviceorientation", closure.as_ref().unchecked_ref())
        {
            Ok(()) => {
                log::info!("[gyro] subscribed to deviceorientation");
                Some(Self {
                    window: window.clone(),
                    closure,
                })
            }
            Err(e) => {
                log::warn!("[gyro] could not subscribe: {}", js_error_message(&e));
                None
            }
        }
    }
}

impl Drop for OrientationSubscription {
    fn drop(&mut self) {
        let _ = self.window.remove_event_listener_with_callback(
            "deviceorientation",
            self.closure.as_ref().unchecked_ref(),
        );
        log::info!("[gyro] unsubscribed from deviceorientation");
    }
}
