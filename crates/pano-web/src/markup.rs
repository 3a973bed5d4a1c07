// HTML fragments for the overlay. Everything that came from the store goes
// through `escape` or `safe_url` before it reaches innerHTML.

use pano_core::authoring::Placement;
use pano_core::{FloorPlanEntry, MarkerContent, Media, Mode, PanoramaId};
use std::fmt::Write;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Only http(s) and root-relative URLs are rendered; anything else
/// (`javascript:`, `data:`) is dropped.
pub fn safe_url(url: &str) -> Option<String> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let allowed = lower.starts_with("https://")
        || lower.starts_with("http://")
        || (url.starts_with('/') && !url.starts_with("//"));
    allowed.then(|| escape(url))
}

fn paragraphs(body: &str) -> String {
    body.lines()
        .map(escape)
        .collect::<Vec<_>>()
        .join("<br>")
}

pub fn content_html(content: &MarkerContent) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<button class="panel-close" data-action="close" aria-label="Close">&times;</button><h2>{}</h2>"#,
        escape(&content.title)
    );
    match &content.media {
        Some(Media::Image(url)) => {
            if let Some(src) = safe_url(url) {
                let _ = write!(
                    html,
                    r#"<img class="panel-media" src="{}" alt="{}">"#,
                    src,
                    escape(&content.title)
                );
            }
        }
        Some(Media::Video(url)) => {
            if let Some(src) = safe_url(url) {
                let _ = write!(
                    html,
                    r#"<video class="panel-media" src="{}" controls playsinline></video>"#,
                    src
                );
            }
        }
        None => {}
    }
    if !content.body.trim().is_empty() {
        let _ = write!(html, "<p>{}</p>", paragraphs(&content.body));
    }
    html
}

/// Overview map: one absolutely positioned button per panorama.
pub fn floor_plan_html(entries: &[FloorPlanEntry], current: Option<&PanoramaId>) -> String {
    let mut html = String::new();
    for e in entries {
        let x = (e.point.x.clamp(0.0, 1.0) * 100.0).round();
        let y = (e.point.y.clamp(0.0, 1.0) * 100.0).round();
        let mut class = String::from("floor-dot");
        if current == Some(&e.id) {
            class.push_str(" current");
        }
        if e.is_active {
            class.push_str(" entry");
        }
        let _ = write!(
            html,
            r#"<button class="{}" style="left:{}%;top:{}%" data-action="goto" data-id="{}" title="{}"></button>"#,
            class,
            x,
            y,
            escape(e.id.as_str()),
            escape(&e.title)
        );
    }
    html
}

fn tool(html: &mut String, action: &str, label: &str, pressed: Option<bool>) {
    let pressed = match pressed {
        Some(on) => format!(r#" aria-pressed="{on}""#),
        None => String::new(),
    };
    let _ = write!(
        html,
        r#"<button type="button" data-action="{action}"{pressed}>{label}</button>"#
    );
}

pub fn toolbar_html(mode: Mode, gyro_on: bool, placement: Placement) -> String {
    let mut html = String::new();
    tool(&mut html, "zoom-in", "+", None);
    tool(&mut html, "zoom-out", "&minus;", None);
    tool(&mut html, "gyro", "Gyroscope", Some(gyro_on));
    tool(&mut html, "recalibrate", "Recenter", None);
    if mode == Mode::Author {
        let placing_links = placement == Placement::Link;
        tool(
            &mut html,
            "placement",
            if placing_links { "Clicks add links" } else { "Clicks add markers" },
            Some(placing_links),
        );
        tool(&mut html, "add-marker", "Add marker", None);
        tool(&mut html, "add-link", "Add link", None);
        tool(&mut html, "edit-panorama", "Edit panorama", None);
        tool(&mut html, "new-panorama", "New panorama", None);
    }
    html
}
