// Authoring dialogs: HTML for each draft kind and the readers that write the
// submitted fields back into the draft.

use crate::markup::escape;
use pano_core::authoring::DeleteTarget;
use pano_core::record::parse_marker_kind;
use pano_core::{
    Catalog, FloorPlanPoint, InitialView, LinkDraft, MarkerDraft, MarkerKind, PanoramaDraft,
};
use std::fmt::Write;

/// Name/value pairs collected from a dialog's inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormValues(pub Vec<(String, String)>);

impl FormValues {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self, name: &str) -> String {
        self.get(name).map(str::trim).unwrap_or_default().to_string()
    }

    /// Trimmed value, `None` when blank.
    pub fn optional(&self, name: &str) -> Option<String> {
        Some(self.text(name)).filter(|s| !s.is_empty())
    }

    pub fn number(&self, name: &str, label: &str) -> Result<Option<f32>, String> {
        match self.optional(name) {
            None => Ok(None),
            Some(s) => s
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| format!("{label} must be a number")),
        }
    }

    pub fn checked(&self, name: &str) -> bool {
        matches!(self.get(name), Some("true") | Some("on"))
    }
}

fn text_input(html: &mut String, name: &str, label: &str, value: &str) {
    let _ = write!(
        html,
        r#"<label>{label}<input name="{name}" type="text" value="{}"></label>"#,
        escape(value)
    );
}

fn number_input(html: &mut String, name: &str, label: &str, value: Option<f32>) {
    let value = value.map(|v| format!("{v}")).unwrap_or_default();
    let _ = write!(
        html,
        r#"<label>{label}<input name="{name}" type="number" step="any" value="{value}"></label>"#
    );
}

fn buttons(html: &mut String, extra: &[(&str, &str)]) {
    html.push_str(r#"<div class="modal-actions">"#);
    for (action, label) in extra {
        let _ = write!(
            html,
            r#"<button type="button" data-action="{action}">{label}</button>"#
        );
    }
    html.push_str(r#"<button type="button" data-action="cancel">Cancel</button></div>"#);
}

// Always present so a rejected submit can fill it in without re-rendering
// the inputs.
fn error_line(html: &mut String, error: Option<&str>) {
    let _ = write!(
        html,
        r#"<p class="modal-error" role="alert">{}</p>"#,
        escape(error.unwrap_or_default())
    );
}

const MARKER_KINDS: [(&str, &str); 4] = [
    ("info", "Information"),
    ("image", "Image"),
    ("video", "Video"),
    ("model", "3D model"),
];

pub fn marker_form(draft: &MarkerDraft, error: Option<&str>) -> String {
    let mut html = String::new();
    let heading = if draft.id.is_some() { "Edit marker" } else { "New marker" };
    let _ = write!(html, "<h2>{heading}</h2>");
    error_line(&mut html, error);
    text_input(&mut html, "title", "Title", &draft.title);
    let _ = write!(
        html,
        r#"<label>Content<textarea name="content" rows="4">{}</textarea></label>"#,
        escape(&draft.content)
    );
    html.push_str(r#"<label>Type<select name="type">"#);
    for (value, label) in MARKER_KINDS {
        let selected = if draft.kind.type_name() == value { " selected" } else { "" };
        let _ = write!(html, r#"<option value="{value}"{selected}>{label}</option>"#);
    }
    html.push_str("</select></label>");
    text_input(
        &mut html,
        "media_url",
        "Media URL",
        draft.kind.media_url().unwrap_or_default(),
    );
    text_input(
        &mut html,
        "model_url",
        "Model URL",
        draft.model_url.as_deref().unwrap_or_default(),
    );
    text_input(
        &mut html,
        "icon_url",
        "Icon URL",
        draft.icon_url.as_deref().unwrap_or_default(),
    );
    if draft.id.is_some() {
        buttons(&mut html, &[("save", "Save"), ("delete", "Delete")]);
    } else {
        buttons(&mut html, &[("save", "Save")]);
    }
    html
}

pub fn read_marker(values: &FormValues, draft: &mut MarkerDraft) -> Result<(), String> {
    let media_url = values.optional("media_url");
    let kind = parse_marker_kind(&values.text("type"), media_url.as_deref())
        .map_err(|e| e.to_string())?;
    draft.title = values.text("title");
    draft.content = values.get("content").unwrap_or_default().to_string();
    draft.kind = kind;
    draft.model_url = values.optional("model_url");
    draft.icon_url = values.optional("icon_url");
    if draft.kind == MarkerKind::Model3D && draft.model_url.is_none() {
        return Err("3D model markers need a model URL".into());
    }
    Ok(())
}

/// The destination list offers every known panorama except the link's source.
pub fn link_form(draft: &LinkDraft, catalog: &Catalog, error: Option<&str>) -> String {
    let mut html = String::new();
    let heading = if draft.id.is_some() { "Edit link" } else { "New link" };
    let _ = write!(html, "<h2>{heading}</h2>");
    error_line(&mut html, error);
    text_input(&mut html, "label", "Label", &draft.label);
    html.push_str(r#"<label>Destination<select name="target"><option value="">Choose a panorama</option>"#);
    for p in catalog.iter() {
        if draft.source_id.as_ref() == Some(&p.id) {
            continue;
        }
        let selected = if draft.target_id.as_ref() == Some(&p.id) {
            " selected"
        } else {
            ""
        };
        let title = if p.title.is_empty() {
            p.id.as_str()
        } else {
            p.title.as_str()
        };
        let _ = write!(
            html,
            r#"<option value="{}"{selected}>{}</option>"#,
            escape(p.id.as_str()),
            escape(title)
        );
    }
    html.push_str("</select></label>");
    number_input(
        &mut html,
        "target_heading",
        "Arrival heading (degrees)",
        Some(draft.target_heading_deg),
    );
    if draft.id.is_some() {
        buttons(&mut html, &[("save", "Save"), ("delete", "Delete")]);
    } else {
        buttons(&mut html, &[("save", "Save")]);
    }
    html
}

pub fn read_link(values: &FormValues, draft: &mut LinkDraft) -> Result<(), String> {
    let heading = values.number("target_heading", "Arrival heading")?;
    draft.label = values.text("label");
    draft.target_id = values.optional("target").map(Into::into);
    if let Some(h) = heading {
        draft.target_heading_deg = h;
    }
    Ok(())
}

pub fn panorama_form(draft: &PanoramaDraft, error: Option<&str>) -> String {
    let mut html = String::new();
    let heading = if draft.id.is_some() {
        "Edit panorama"
    } else {
        "New panorama"
    };
    let _ = write!(html, "<h2>{heading}</h2>");
    error_line(&mut html, error);
    text_input(&mut html, "title", "Title", &draft.title);
    let _ = write!(
        html,
        r#"<label>Description<textarea name="description" rows="3">{}</textarea></label>"#,
        escape(&draft.description)
    );
    text_input(&mut html, "image_url", "Image URL", &draft.image_url);
    text_input(
        &mut html,
        "thumbnail_url",
        "Thumbnail URL",
        draft.thumbnail_url.as_deref().unwrap_or_default(),
    );
    let checked = if draft.is_active { " checked" } else { "" };
    let _ = write!(
        html,
        r#"<label class="check"><input name="is_active" type="checkbox"{checked}>Entry point of the site</label>"#
    );
    let v = draft.initial_view;
    number_input(&mut html, "initial_heading", "Initial heading", Some(v.heading_deg));
    number_input(&mut html, "initial_pitch", "Initial pitch", Some(v.pitch_deg));
    number_input(&mut html, "initial_fov", "Initial field of view", Some(v.fov_deg));
    number_input(&mut html, "floor_x", "Map x (0-1)", draft.floor_plan.map(|p| p.x));
    number_input(&mut html, "floor_y", "Map y (0-1)", draft.floor_plan.map(|p| p.y));
    if draft.id.is_some() {
        buttons(
            &mut html,
            &[("save", "Save"), ("preview", "Preview"), ("delete", "Delete")],
        );
    } else {
        buttons(&mut html, &[("save", "Save"), ("preview", "Preview")]);
    }
    html
}

pub fn read_panorama(values: &FormValues, draft: &mut PanoramaDraft) -> Result<(), String> {
    let defaults = InitialView::default();
    let heading = values.number("initial_heading", "Initial heading")?;
    let pitch = values.number("initial_pitch", "Initial pitch")?;
    let fov = values.number("initial_fov", "Initial field of view")?;
    let floor_x = values.number("floor_x", "Map x")?;
    let floor_y = values.number("floor_y", "Map y")?;
    draft.floor_plan = match (floor_x, floor_y) {
        (Some(x), Some(y)) => Some(FloorPlanPoint { x, y }),
        (None, None) => None,
        _ => return Err("map position needs both x and y".into()),
    };
    draft.title = values.text("title");
    draft.description = values.get("description").unwrap_or_default().to_string();
    draft.image_url = values.text("image_url");
    draft.thumbnail_url = values.optional("thumbnail_url");
    draft.is_active = values.checked("is_active");
    draft.initial_view = InitialView {
        heading_deg: heading.unwrap_or(defaults.heading_deg),
        pitch_deg: pitch.unwrap_or(defaults.pitch_deg),
        fov_deg: fov.unwrap_or(defaults.fov_deg),
    };
    Ok(())
}

pub fn confirm_form(target: &DeleteTarget, catalog: &Catalog, error: Option<&str>) -> String {
    let what = match target {
        DeleteTarget::Marker(_) => "this marker".to_string(),
        DeleteTarget::Link(_) => "this link".to_string(),
        DeleteTarget::Panorama(id) => {
            let title = catalog
                .get(id)
                .map(|p| p.title.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or(id.as_str());
            format!(
                "the panorama \u{201c}{}\u{201d} with all its markers and links",
                escape(title)
            )
        }
    };
    let mut html = String::new();
    html.push_str("<h2>Delete</h2>");
    error_line(&mut html, error);
    let _ = write!(html, "<p>Delete {what}? This cannot be undone.</p>");
    buttons(&mut html, &[("confirm", "Delete")]);
    html
}
