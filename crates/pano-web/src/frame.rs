use crate::app::App;
use crate::dom;
use crate::render::MarkerInstance;
use pano_core::constants::{HOVER_BRIGHTEN, LINK_COLOR, MARKER_COLOR, MODEL_MARKER_COLOR};
use pano_core::markers::MarkerStyle;
use pano_core::viewer::Indicator;
use pano_core::PanoramaStore;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

const HOVER_GROW: f32 = 1.15;

pub struct FrameContext<S: PanoramaStore + 'static> {
    pub app: Rc<App<S>>,
    instances: Vec<MarkerInstance>,
}

/// Billboard for one indicator. The quad spans the pick cone at the
/// indicator's distance, so what is drawn is what can be clicked.
pub fn instance_for(indicator: &Indicator, pick_angle: f32) -> MarkerInstance {
    let (color, kind) = match indicator.style {
        MarkerStyle::Plain => (MARKER_COLOR, 0.0),
        MarkerStyle::WithModel => (MODEL_MARKER_COLOR, 1.0),
        MarkerStyle::Link => (LINK_COLOR, 2.0),
    };
    let mut scale = 2.0 * indicator.position.length() * pick_angle.tan();
    let mut color = color;
    if indicator.hovered {
        for c in &mut color[..3] {
            *c = (*c * HOVER_BRIGHTEN).min(1.0);
        }
        scale *= HOVER_GROW;
    }
    MarkerInstance {
        position: indicator.position.to_array(),
        scale,
        color,
        kind,
    }
}

impl<S: PanoramaStore + 'static> FrameContext<S> {
    pub fn new(app: Rc<App<S>>) -> Self {
        Self {
            app,
            instances: Vec::new(),
        }
    }

    pub fn frame(&mut self) {
        let app = &self.app;
        app.gpu
            .borrow_mut()
            .resize_if_needed(app.canvas.width(), app.canvas.height());
        let viewport = app.viewport();

        let (frame, label) = {
            let v = app.viewer.borrow();
            let frame = v.frame(viewport);
            let label = v
                .hovered_label()
                .and_then(|l| frame.project(l.anchor).map(|px| (l.text, px)));
            let pick_angle = v.markers().pick_angle();
            self.instances.clear();
            self.instances
                .extend(v.indicators().iter().map(|i| instance_for(i, pick_angle)));
            (frame, label)
        };

        app.overlay.show_label(
            label
                .as_ref()
                .map(|(text, px)| (text.as_str(), dom::canvas_px_to_css(*px, &app.canvas))),
        );

        let mut gpu = app.gpu.borrow_mut();
        match gpu.render(&frame, &self.instances) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::Timeout) => log::debug!("[scene] frame timed out"),
            Err(e) => log::error!("[scene] render error: {:?}", e),
        }
    }
}

pub fn start_loop<S: PanoramaStore + 'static>(frame_ctx: Rc<RefCell<FrameContext<S>>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx.borrow_mut().frame();
        request_frame(&tick_clone);
    }) as Box<dyn FnMut()>));
    request_frame(&tick);
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}
