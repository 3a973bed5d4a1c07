//! DOM layer over the canvas: loading spinner, error banner, hover label,
//! marker content panel, authoring dialog, overview map, toolbar and the
//! 3D model viewers.

use crate::dom;
use crate::forms::FormValues;
use glam::Vec2;
use pano_core::MarkerId;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct Overlay {
    document: web::Document,
    pub root: web::Element,
    spinner: web::Element,
    banner: web::Element,
    label: web::Element,
    panel: web::Element,
    modal: web::Element,
    map: web::Element,
    pub toolbar: web::Element,
    models: web::Element,
}

impl Overlay {
    /// Reuse elements the page already has (so it can style them), creating
    /// the missing ones inside `#pano-overlay`.
    pub fn mount(document: &web::Document) -> anyhow::Result<Self> {
        let body: web::Element = document
            .body()
            .ok_or_else(|| anyhow::anyhow!("no body"))?
            .into();
        let root = dom::ensure_div(document, &body, "pano-overlay", "pano-overlay")?;
        let part = |id: &str, class: &str| dom::ensure_div(document, &root, id, class);
        let overlay = Self {
            document: document.clone(),
            spinner: part("pano-spinner", "pano-spinner")?,
            banner: part("pano-error", "pano-error")?,
            label: part("pano-label", "pano-label")?,
            panel: part("pano-panel", "pano-panel")?,
            modal: part("pano-modal", "pano-modal")?,
            map: part("pano-map", "pano-map")?,
            toolbar: part("pano-toolbar", "pano-toolbar")?,
            models: part("pano-models", "pano-models")?,
            root,
        };
        for el in [
            &overlay.spinner,
            &overlay.banner,
            &overlay.label,
            &overlay.panel,
            &overlay.modal,
        ] {
            dom::set_visible(el, false);
        }
        Ok(overlay)
    }

    pub fn set_loading(&self, loading: bool) {
        dom::set_visible(&self.spinner, loading);
    }

    pub fn show_error(&self, message: Option<&str>) {
        match message {
            Some(m) => {
                self.banner.set_text_content(Some(m));
                dom::set_visible(&self.banner, true);
            }
            None => dom::set_visible(&self.banner, false),
        }
    }

    /// Hover title at a CSS position relative to the canvas.
    pub fn show_label(&self, label: Option<(&str, Vec2)>) {
        match label {
            Some((text, at)) => {
                if self.label.text_content().as_deref() != Some(text) {
                    self.label.set_text_content(Some(text));
                }
                let _ = self.label.set_attribute(
                    "style",
                    &format!("left:{:.0}px;top:{:.0}px", at.x, at.y),
                );
                dom::set_visible(&self.label, true);
            }
            None => dom::set_visible(&self.label, false),
        }
    }

    pub fn show_content(&self, html: Option<&str>) {
        match html {
            Some(h) => {
                self.panel.set_inner_html(h);
                dom::set_visible(&self.panel, true);
            }
            None => {
                // stops any playing video
                self.panel.set_inner_html("");
                dom::set_visible(&self.panel, false);
            }
        }
    }

    pub fn show_modal(&self, html: Option<&str>) {
        match html {
            Some(h) => {
                self.modal.set_inner_html(h);
                dom::set_visible(&self.modal, true);
            }
            None => {
                self.modal.set_inner_html("");
                dom::set_visible(&self.modal, false);
            }
        }
    }

    pub fn set_modal_error(&self, message: &str) {
        if let Ok(Some(el)) = self.modal.query_selector(".modal-error") {
            el.set_text_content(Some(message));
        }
    }

    pub fn set_modal_busy(&self, busy: bool) {
        let Ok(buttons) = self.modal.query_selector_all("button") else {
            return;
        };
        for i in 0..buttons.length() {
            if let Some(b) = buttons
                .item(i)
                .and_then(|n| n.dyn_into::<web::HtmlButtonElement>().ok())
            {
                b.set_disabled(busy);
            }
        }
    }

    /// Current values of every named field in the dialog.
    pub fn modal_values(&self) -> FormValues {
        let mut values = Vec::new();
        let Ok(fields) = self.modal.query_selector_all("[name]") else {
            return FormValues(values);
        };
        for i in 0..fields.length() {
            let Some(node) = fields.item(i) else {
                continue;
            };
            let field = if let Some(input) = node.dyn_ref::<web::HtmlInputElement>() {
                let value = if input.type_() == "checkbox" {
                    input.checked().to_string()
                } else {
                    input.value()
                };
                Some((input.name(), value))
            } else if let Some(select) = node.dyn_ref::<web::HtmlSelectElement>() {
                Some((select.name(), select.value()))
            } else {
                node.dyn_ref::<web::HtmlTextAreaElement>()
                    .map(|area| (area.name(), area.value()))
            };
            values.extend(field);
        }
        FormValues(values)
    }

    pub fn set_floor_plan(&self, html: &str) {
        self.map.set_inner_html(html);
        dom::set_visible(&self.map, !html.is_empty());
    }

    pub fn set_toolbar(&self, html: &str) {
        self.toolbar.set_inner_html(html);
    }

    fn model_slot(&self, marker: &MarkerId) -> Option<web::Element> {
        let selector = format!("[data-marker=\"{}\"]", marker.as_str().replace('"', "\\\""));
        self.models.query_selector(&selector).ok().flatten()
    }

    /// Placeholder shown while the model is fetched.
    pub fn model_loading(&self, marker: &MarkerId, title: &str) {
        self.hide_model(marker);
        let Ok(slot) = self.document.create_element("div") else {
            return;
        };
        slot.set_class_name("pano-model loading");
        let _ = slot.set_attribute("data-marker", marker.as_str());
        slot.set_text_content(Some(&format!("Loading {title}\u{2026}")));
        let _ = self.models.append_child(&slot);
    }

    /// Replace the placeholder with a `<model-viewer>` element.
    pub fn model_shown(&self, marker: &MarkerId, url: &str, title: &str) {
        let Some(slot) = self.model_slot(marker) else {
            return;
        };
        slot.set_class_name("pano-model");
        slot.set_text_content(None);
        match self.document.create_element("model-viewer") {
            Ok(viewer) => {
                let _ = viewer.set_attribute("src", url);
                let _ = viewer.set_attribute("alt", title);
                let _ = viewer.set_attribute("camera-controls", "");
                let _ = viewer.set_attribute("auto-rotate", "");
                let _ = slot.append_child(&viewer);
            }
            Err(e) => log::warn!("[marker] could not create model viewer: {:?}", e),
        }
    }

    pub fn model_failed(&self, marker: &MarkerId, message: &str) {
        if let Some(slot) = self.model_slot(marker) {
            slot.set_class_name("pano-model failed");
            slot.set_text_content(Some(message));
        }
    }

    pub fn hide_model(&self, marker: &MarkerId) {
        if let Some(slot) = self.model_slot(marker) {
            slot.remove();
        }
    }

    pub fn clear_models(&self) {
        self.models.set_inner_html("");
    }

    pub fn modal(&self) -> &web::Element {
        &self.modal
    }

    pub fn panel(&self) -> &web::Element {
        &self.panel
    }

    pub fn map(&self) -> &web::Element {
        &self.map
    }
}
