//! Glue between the core viewer and the page: scene loads, click outcomes,
//! toolbar and dialog actions.
//!
//! Everything runs on the UI thread. Async work clones the `Rc<App>` and
//! reports back through the viewer's ticketed `apply_*` calls, which drop
//! results for scenes that are no longer current. Borrows of the viewer are
//! never held across an `.await`.

use crate::assets;
use crate::forms;
use crate::markup;
use crate::orientation::{self, OrientationSubscription};
use crate::overlay::Overlay;
use crate::render::GpuState;
use glam::Vec2;
use instant::Instant;
use pano_core::authoring::{self, DeleteTarget, Editing, Placement};
use pano_core::orientation::PermissionState;
use pano_core::viewer::{fetch_catalog, fetch_scene};
use pano_core::{
    Activation, ActivationIntent, Applied, ClickOutcome, Mode, PanoramaDraft, PanoramaId,
    PanoramaStore, Ray, SceneTicket, Viewer, Viewport,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

/// Panoramas larger than this are scaled down before upload.
const MAX_PANORAMA_DIM: u32 = 8192;

pub struct App<S: PanoramaStore + 'static> {
    pub viewer: Rc<RefCell<Viewer>>,
    pub overlay: Overlay,
    pub gpu: RefCell<GpuState<'static>>,
    pub canvas: web::HtmlCanvasElement,
    store: S,
    window: web::Window,
    orientation: RefCell<Option<OrientationSubscription>>,
    saving: Cell<bool>,
}

impl<S: PanoramaStore + 'static> App<S> {
    pub fn new(
        viewer: Viewer,
        store: S,
        overlay: Overlay,
        gpu: GpuState<'static>,
        canvas: web::HtmlCanvasElement,
        window: web::Window,
    ) -> Rc<Self> {
        Rc::new(Self {
            viewer: Rc::new(RefCell::new(viewer)),
            overlay,
            gpu: RefCell::new(gpu),
            canvas,
            store,
            window,
            orientation: RefCell::new(None),
            saving: Cell::new(false),
        })
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    /// Ray through a canvas pixel for the current camera.
    pub fn ray_at(&self, px: Vec2) -> Ray {
        self.viewer.borrow().frame(self.viewport()).screen_ray(px)
    }

    // ---------------- Scenes ----------------

    pub async fn load_catalog(self: &Rc<Self>) {
        self.overlay.set_loading(true);
        match fetch_catalog(&self.store).await {
            Ok(panoramas) => self.viewer.borrow_mut().set_catalog(panoramas),
            Err(e) => {
                self.overlay.set_loading(false);
                self.overlay
                    .show_error(Some(&format!("Could not load panoramas: {e}")));
                return;
            }
        }
        self.open_entry_point();
    }

    /// Open the configured start panorama, else the site's active one.
    pub fn open_entry_point(self: &Rc<Self>) {
        let entry = self.viewer.borrow().entry_point();
        match entry {
            Some(id) => self.open(&id),
            None => {
                self.overlay.set_loading(false);
                let message = match self.viewer.borrow().mode() {
                    Mode::Author => "No panoramas yet. Use \u{201c}New panorama\u{201d} to add one.",
                    Mode::View => "There is no panorama to show.",
                };
                self.overlay.show_error(Some(message));
                self.refresh_chrome();
            }
        }
    }

    pub fn open(self: &Rc<Self>, id: &PanoramaId) {
        let opened = self.viewer.borrow_mut().open(id);
        match opened {
            Ok(ticket) => self.load_scene(ticket),
            Err(e) => self.overlay.show_error(Some(&e.to_string())),
        }
    }

    /// Start the texture and the marker/link loads for a freshly opened
    /// scene. The two run independently; either may fail alone.
    pub fn load_scene(self: &Rc<Self>, ticket: SceneTicket) {
        self.overlay.show_error(None);
        self.overlay.show_content(None);
        self.overlay.show_label(None);
        self.overlay.clear_models();
        self.overlay.set_loading(true);
        self.gpu.borrow_mut().clear_panorama();
        self.refresh_chrome();
        self.render_dialog();

        let app = self.clone();
        let texture_ticket = ticket.clone();
        spawn_local(async move {
            let started = Instant::now();
            let max_dim = app
                .gpu
                .borrow()
                .max_texture_dimension()
                .min(MAX_PANORAMA_DIM);
            let result = assets::load_panorama(&texture_ticket.image_url, max_dim).await;
            let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
            let applied = app
                .viewer
                .borrow_mut()
                .apply_texture(&texture_ticket, outcome);
            if applied == Applied::Stale {
                return;
            }
            app.overlay.set_loading(false);
            match result {
                Ok(image) => {
                    app.gpu.borrow_mut().set_panorama(&image);
                    log::info!(
                        "[scene] panorama {}x{} ready in {} ms",
                        image.width,
                        image.height,
                        started.elapsed().as_millis()
                    );
                }
                Err(e) => app
                    .overlay
                    .show_error(Some(&format!("Could not load the panorama image: {e}"))),
            }
        });

        let app = self.clone();
        spawn_local(async move {
            let result = fetch_scene(&app.store, &ticket).await;
            let failure = result.as_ref().err().map(ToString::to_string);
            let applied = app.viewer.borrow_mut().apply_contents(&ticket, result);
            if let (Applied::Current, Some(e)) = (applied, failure) {
                app.overlay
                    .show_error(Some(&format!("Could not load markers and links: {e}")));
            }
        });
    }

    /// Toolbar and overview map for the current state.
    pub fn refresh_chrome(&self) {
        let v = self.viewer.borrow();
        self.overlay.set_toolbar(&markup::toolbar_html(
            v.mode(),
            v.camera().gyro_enabled(),
            v.authoring().placement(),
        ));
        let entries = v.catalog().floor_plan(v.config().site_id.as_ref());
        self.overlay
            .set_floor_plan(&markup::floor_plan_html(&entries, v.container()));
    }

    // ---------------- Pointer ----------------

    pub fn hover(&self, px: Option<Vec2>) {
        let ray = px.map(|p| self.ray_at(p));
        self.viewer.borrow_mut().hover(ray.as_ref());
    }

    pub fn click(self: &Rc<Self>, px: Vec2) {
        let ray = self.ray_at(px);
        let outcome = self.viewer.borrow_mut().click(&ray);
        match outcome {
            Ok(ClickOutcome::Activated(activation)) => self.on_activation(activation),
            Ok(ClickOutcome::Navigate(ticket)) => self.load_scene(ticket),
            Ok(ClickOutcome::Editing) => self.render_dialog(),
            Ok(ClickOutcome::Ignored) => {}
            Err(e) => self.overlay.show_error(Some(&e.to_string())),
        }
    }

    fn on_activation(self: &Rc<Self>, activation: Activation) {
        match &activation.intent {
            ActivationIntent::Edit(marker) => {
                self.viewer.borrow_mut().authoring_mut().edit_marker(marker);
                self.render_dialog();
            }
            ActivationIntent::Present(content) => {
                self.overlay
                    .show_content(Some(&markup::content_html(content)));
            }
        }
        let Some(request) = activation.model else {
            if !self.viewer.borrow().markers().is_model_visible(&activation.marker) {
                self.overlay.hide_model(&activation.marker);
            }
            return;
        };
        let title = self
            .viewer
            .borrow()
            .markers()
            .get(&request.marker)
            .map(|m| m.title.clone())
            .unwrap_or_default();
        self.overlay.model_loading(&request.marker, &title);
        let app = self.clone();
        spawn_local(async move {
            let result = assets::load_model(&request.url).await;
            let current = app.viewer.borrow_mut().markers_mut().complete_model_load(
                &request.marker,
                request.token,
                result.clone(),
            );
            if !current {
                return;
            }
            match result {
                Ok(()) => app.overlay.model_shown(&request.marker, &request.url, &title),
                Err(e) => app
                    .overlay
                    .model_failed(&request.marker, &format!("Could not load model: {e}")),
            }
        });
    }

    // ---------------- Gyroscope ----------------

    /// Ask for orientation events once per mount. Where the platform needs a
    /// grant this must be called from a user gesture.
    pub fn request_orientation(self: &Rc<Self>) {
        {
            let mut v = self.viewer.borrow_mut();
            if v.sampler().permission() != PermissionState::Unknown {
                return;
            }
            v.sampler_mut().begin_permission_request();
        }
        let app = self.clone();
        spawn_local(async move {
            let outcome = orientation::request_permission(&app.window).await;
            app.viewer.borrow_mut().sampler_mut().on_permission(outcome);
            app.sync_orientation();
        });
    }

    pub fn permission_required(&self) -> bool {
        orientation::permission_required(&self.window)
    }

    /// Subscribe to or drop the event source to match the sampler.
    pub fn sync_orientation(&self) {
        let wants = self.viewer.borrow().sampler().wants_subscription();
        let mut subscription = self.orientation.borrow_mut();
        if wants && subscription.is_none() {
            *subscription = OrientationSubscription::subscribe(&self.window, self.viewer.clone());
        } else if !wants {
            subscription.take();
        }
    }

    pub fn toggle_gyro(self: &Rc<Self>) {
        let on = self.viewer.borrow_mut().toggle_gyro();
        if on {
            self.request_orientation();
        }
        self.sync_orientation();
        self.refresh_chrome();
    }

    pub fn recalibrate(&self) {
        if !self.viewer.borrow_mut().recalibrate() {
            log::info!("[gyro] no orientation sample yet; nothing to recalibrate");
        }
    }

    /// Page hidden or torn down: stop listening and forget the calibration.
    pub fn unmount_orientation(&self) {
        self.orientation.borrow_mut().take();
        self.viewer.borrow_mut().sampler_mut().unmount();
    }

    // ---------------- Toolbar and panels ----------------

    pub fn on_toolbar_action(self: &Rc<Self>, action: &str) {
        match action {
            "zoom-in" => self.viewer.borrow_mut().camera_mut().zoom_in(),
            "zoom-out" => self.viewer.borrow_mut().camera_mut().zoom_out(),
            "gyro" => self.toggle_gyro(),
            "recalibrate" => self.recalibrate(),
            "placement" => {
                {
                    let mut v = self.viewer.borrow_mut();
                    let next = match v.authoring().placement() {
                        Placement::Marker => Placement::Link,
                        Placement::Link => Placement::Marker,
                    };
                    v.authoring_mut().set_placement(next);
                }
                self.refresh_chrome();
            }
            "add-marker" | "add-link" => {
                let started = {
                    let mut v = self.viewer.borrow_mut();
                    if action == "add-marker" {
                        v.add_marker()
                    } else {
                        v.add_link()
                    }
                };
                match started {
                    Ok(()) => self.render_dialog(),
                    Err(e) => self.overlay.show_error(Some(&e.to_string())),
                }
            }
            "edit-panorama" => {
                self.viewer.borrow_mut().edit_current_panorama();
                self.render_dialog();
            }
            "new-panorama" => {
                {
                    let mut v = self.viewer.borrow_mut();
                    let draft = PanoramaDraft {
                        site_id: v.config().site_id.clone(),
                        ..PanoramaDraft::default()
                    };
                    v.authoring_mut().edit_panorama(draft);
                }
                self.render_dialog();
            }
            other => log::debug!("[ui] unhandled toolbar action {other}"),
        }
    }

    pub fn on_panel_action(&self, action: &str) {
        if action == "close" {
            self.overlay.show_content(None);
        }
    }

    pub fn on_map_action(self: &Rc<Self>, action: &str, el: &web::Element) {
        if action != "goto" {
            return;
        }
        let Some(id) = el.get_attribute("data-id") else {
            return;
        };
        let id = PanoramaId::from(id);
        if self.viewer.borrow().container() == Some(&id) {
            return;
        }
        self.open(&id);
    }

    /// Escape: dismiss the dialog first, then the content panel.
    pub fn dismiss(&self) {
        if !self.viewer.borrow().authoring().is_idle() {
            self.viewer.borrow_mut().authoring_mut().cancel();
            self.render_dialog();
        } else {
            self.overlay.show_content(None);
        }
    }

    // ---------------- Authoring dialog ----------------

    pub fn render_dialog(&self) {
        let html = {
            let v = self.viewer.borrow();
            let error = v.authoring().error();
            match v.authoring().editing() {
                Editing::Idle => None,
                Editing::Marker(draft) => Some(forms::marker_form(draft, error)),
                Editing::Link(draft) => Some(forms::link_form(draft, v.catalog(), error)),
                Editing::Panorama(draft) => Some(forms::panorama_form(draft, error)),
                Editing::ConfirmDelete(target) => {
                    Some(forms::confirm_form(target, v.catalog(), error))
                }
            }
        };
        self.overlay.show_modal(html.as_deref());
    }

    pub fn on_modal_action(self: &Rc<Self>, action: &str) {
        if self.saving.get() {
            return;
        }
        match action {
            "cancel" => {
                self.viewer.borrow_mut().authoring_mut().cancel();
                self.render_dialog();
            }
            "delete" => {
                let target = match self.viewer.borrow().authoring().editing() {
                    Editing::Marker(d) => d.id.clone().map(DeleteTarget::Marker),
                    Editing::Link(d) => d.id.clone().map(DeleteTarget::Link),
                    Editing::Panorama(d) => d.id.clone().map(DeleteTarget::Panorama),
                    _ => None,
                };
                if let Some(target) = target {
                    self.viewer.borrow_mut().authoring_mut().request_delete(target);
                    self.render_dialog();
                }
            }
            "preview" => {
                if !self.read_form() {
                    return;
                }
                let draft = match self.viewer.borrow().authoring().editing() {
                    Editing::Panorama(d) => d.clone(),
                    _ => return,
                };
                if draft.image_url.trim().is_empty() {
                    self.reject("Enter an image URL to preview.");
                    return;
                }
                let ticket = self.viewer.borrow_mut().preview_unsaved(&draft);
                self.load_scene(ticket);
            }
            "save" => {
                if self.read_form() {
                    self.save();
                }
            }
            "confirm" => self.confirm_delete(),
            other => log::debug!("[ui] unhandled dialog action {other}"),
        }
    }

    fn reject(&self, message: &str) {
        self.viewer.borrow_mut().authoring_mut().set_error(message);
        self.overlay.set_modal_error(message);
    }

    /// Copy the dialog fields into the open draft.
    fn read_form(&self) -> bool {
        let values = self.overlay.modal_values();
        let read = match self.viewer.borrow_mut().authoring_mut().editing_mut() {
            Editing::Marker(draft) => forms::read_marker(&values, draft),
            Editing::Link(draft) => forms::read_link(&values, draft),
            Editing::Panorama(draft) => forms::read_panorama(&values, draft),
            _ => Ok(()),
        };
        match read {
            Ok(()) => true,
            Err(message) => {
                self.reject(&message);
                false
            }
        }
    }

    fn begin_saving(&self, busy: bool) {
        self.saving.set(busy);
        self.overlay.set_modal_busy(busy);
    }

    fn save(self: &Rc<Self>) {
        let (editing, catalog) = {
            let v = self.viewer.borrow();
            (v.authoring().editing().clone(), v.catalog().clone())
        };
        self.begin_saving(true);
        let app = self.clone();
        spawn_local(async move {
            let result = match editing {
                Editing::Marker(draft) => authoring::save_marker(&app.store, &draft)
                    .await
                    .map(|marker| {
                        app.viewer.borrow_mut().apply_saved_marker(marker);
                    }),
                Editing::Link(draft) => authoring::save_link(&app.store, &draft, &catalog)
                    .await
                    .map(|link| {
                        app.viewer.borrow_mut().apply_saved_link(link);
                    }),
                Editing::Panorama(draft) => {
                    match authoring::save_panorama(&app.store, &draft, &catalog).await {
                        Ok(saved) => {
                            let id = saved.panorama.id.clone();
                            if let Some(e) = &saved.sibling_error {
                                app.overlay.show_error(Some(&format!(
                                    "Saved, but another panorama is still marked active: {}",
                                    e
                                )));
                            }
                            let reopen = app.viewer.borrow_mut().apply_saved_panorama(saved);
                            app.viewer.borrow_mut().authoring_mut().finish();
                            match reopen {
                                Some(ticket) => app.load_scene(ticket),
                                None if app.viewer.borrow().scene().is_none() => app.open(&id),
                                None => {}
                            }
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
                _ => Ok(()),
            };
            app.begin_saving(false);
            match result {
                Ok(()) => {
                    app.viewer.borrow_mut().authoring_mut().finish();
                    app.render_dialog();
                    app.refresh_chrome();
                }
                Err(e) => app.reject(&e.to_string()),
            }
        });
    }

    fn confirm_delete(self: &Rc<Self>) {
        let target = match self.viewer.borrow().authoring().editing() {
            Editing::ConfirmDelete(t) => t.clone(),
            _ => return,
        };
        self.begin_saving(true);
        let app = self.clone();
        spawn_local(async move {
            let result = authoring::confirm_delete(&app.store, &target).await;
            app.begin_saving(false);
            if let Err(e) = result {
                app.reject(&e.to_string());
                return;
            }
            {
                let mut v = app.viewer.borrow_mut();
                v.apply_deleted(&target);
                v.authoring_mut().finish();
            }
            app.render_dialog();
            app.refresh_chrome();
            match &target {
                DeleteTarget::Marker(id) => app.overlay.hide_model(id),
                DeleteTarget::Panorama(_) if app.viewer.borrow().scene().is_none() => {
                    app.overlay.clear_models();
                    app.gpu.borrow_mut().clear_panorama();
                    app.open_entry_point();
                }
                _ => {}
            }
        });
    }
}
