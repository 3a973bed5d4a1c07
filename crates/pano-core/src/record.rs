//! Row shapes exchanged with the persistent store.
//!
//! Columns are snake_case with flattened positions. Reading narrows a row
//! into the model types and rejects anything the viewer cannot use; writing
//! builds the insert/update payload from a draft.

use crate::error::{PanoError, Result};
use crate::model::{
    is_valid_position, FloorPlanPoint, GeoPoint, InitialView, Link, LinkDraft, Marker,
    MarkerDraft, MarkerKind, Panorama, PanoramaDraft,
};
use glam::Vec3;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PanoramaRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub initial_heading: Option<f32>,
    #[serde(default)]
    pub initial_pitch: Option<f32>,
    #[serde(default)]
    pub initial_fov: Option<f32>,
    #[serde(default)]
    pub floor_x: Option<f32>,
    #[serde(default)]
    pub floor_y: Option<f32>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub panorama_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub model_url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source_panorama_id: String,
    pub target_panorama_id: String,
    pub position_x: f32,
    pub position_y: f32,
    pub position_z: f32,
    #[serde(default)]
    pub target_heading: f32,
    #[serde(default)]
    pub label: Option<String>,
}

/// Just the key of a row, read without narrowing the rest of it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RowKey {
    #[serde(default)]
    pub id: Option<String>,
}

/// Ids of every row in a JSON array, whatever else the rows hold.
pub fn row_ids(json: &str) -> Result<Vec<String>> {
    let keys: Vec<RowKey> = rows_from_json(json)?;
    Ok(keys
        .into_iter()
        .filter_map(|k| k.id.filter(|id| !id.is_empty()))
        .collect())
}

/// A whole catalog in one document, used to seed the in-memory store.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogDump {
    #[serde(default)]
    pub panoramas: Vec<PanoramaRow>,
    #[serde(default)]
    pub markers: Vec<MarkerRow>,
    #[serde(default)]
    pub links: Vec<LinkRow>,
}

fn require_id(id: &Option<String>, what: &str) -> Result<String> {
    match id {
        Some(id) if !id.is_empty() => Ok(id.clone()),
        _ => Err(PanoError::InvalidRecord(format!("{what} row without id"))),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Narrow the store's free-text `type` column into a [`MarkerKind`].
pub fn parse_marker_kind(type_name: &str, media_url: Option<&str>) -> Result<MarkerKind> {
    let media = || {
        media_url
            .filter(|u| !u.trim().is_empty())
            .map(str::to_string)
    };
    match type_name.trim().to_ascii_lowercase().as_str() {
        "" | "info" => Ok(MarkerKind::Info),
        "image" => media()
            .map(|url| MarkerKind::Image { url })
            .ok_or(PanoError::MissingMediaUrl("image")),
        "video" => media()
            .map(|url| MarkerKind::Video { url })
            .ok_or(PanoError::MissingMediaUrl("video")),
        "model" | "model3d" => Ok(MarkerKind::Model3D),
        other => Err(PanoError::UnknownMarkerKind(other.to_string())),
    }
}

impl TryFrom<PanoramaRow> for Panorama {
    type Error = PanoError;

    fn try_from(row: PanoramaRow) -> Result<Self> {
        let id = require_id(&row.id, "panorama")?;
        let defaults = InitialView::default();
        let floor_plan = match (row.floor_x, row.floor_y) {
            (Some(x), Some(y)) => Some(FloorPlanPoint { x, y }),
            _ => None,
        };
        let geo = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            _ => None,
        };
        Ok(Panorama {
            id: id.into(),
            site_id: non_empty(row.site_id).map(Into::into),
            title: row.title.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            image_url: row.image_url.unwrap_or_default(),
            thumbnail_url: non_empty(row.thumbnail_url),
            is_active: row.is_active,
            initial_view: InitialView {
                heading_deg: row.initial_heading.unwrap_or(defaults.heading_deg),
                pitch_deg: row.initial_pitch.unwrap_or(defaults.pitch_deg),
                fov_deg: row.initial_fov.unwrap_or(defaults.fov_deg),
            },
            floor_plan,
            geo,
        })
    }
}

impl From<&PanoramaDraft> for PanoramaRow {
    fn from(d: &PanoramaDraft) -> Self {
        PanoramaRow {
            id: d.id.as_ref().map(|id| id.0.clone()),
            site_id: d.site_id.as_ref().map(|id| id.0.clone()),
            title: Some(d.title.clone()),
            description: Some(d.description.clone()),
            image_url: Some(d.image_url.clone()),
            thumbnail_url: d.thumbnail_url.clone(),
            is_active: d.is_active,
            initial_heading: Some(d.initial_view.heading_deg),
            initial_pitch: Some(d.initial_view.pitch_deg),
            initial_fov: Some(d.initial_view.fov_deg),
            floor_x: d.floor_plan.map(|p| p.x),
            floor_y: d.floor_plan.map(|p| p.y),
            latitude: d.geo.map(|g| g.lat),
            longitude: d.geo.map(|g| g.lon),
        }
    }
}

impl TryFrom<MarkerRow> for Marker {
    type Error = PanoError;

    fn try_from(row: MarkerRow) -> Result<Self> {
        let id = require_id(&row.id, "marker")?;
        let kind = parse_marker_kind(&row.kind, row.media_url.as_deref())?;
        let position = Vec3::new(row.position_x, row.position_y, row.position_z);
        if !is_valid_position(position) {
            return Err(PanoError::DegeneratePosition);
        }
        let model_url = non_empty(row.model_url);
        if kind == MarkerKind::Model3D && model_url.is_none() {
            return Err(PanoError::MissingMediaUrl("model"));
        }
        Ok(Marker {
            id: id.into(),
            panorama_id: row.panorama_id.into(),
            kind,
            position,
            title: row.title.unwrap_or_default(),
            content: row.content.unwrap_or_default(),
            icon_url: non_empty(row.icon_url),
            model_url,
        })
    }
}

impl TryFrom<&MarkerDraft> for MarkerRow {
    type Error = PanoError;

    fn try_from(d: &MarkerDraft) -> Result<Self> {
        let panorama_id = d.panorama_id.as_ref().ok_or(PanoError::UnsavedPanorama)?;
        Ok(MarkerRow {
            id: d.id.as_ref().map(|id| id.0.clone()),
            panorama_id: panorama_id.0.clone(),
            kind: d.kind.type_name().to_string(),
            position_x: d.position.x,
            position_y: d.position.y,
            position_z: d.position.z,
            title: Some(d.title.clone()),
            content: Some(d.content.clone()),
            media_url: d.kind.media_url().map(str::to_string),
            icon_url: d.icon_url.clone(),
            model_url: d.model_url.clone(),
        })
    }
}

impl TryFrom<LinkRow> for Link {
    type Error = PanoError;

    fn try_from(row: LinkRow) -> Result<Self> {
        let id = require_id(&row.id, "link")?;
        let position = Vec3::new(row.position_x, row.position_y, row.position_z);
        if !is_valid_position(position) {
            return Err(PanoError::DegeneratePosition);
        }
        Ok(Link {
            id: id.into(),
            source_id: row.source_panorama_id.into(),
            target_id: row.target_panorama_id.into(),
            position,
            target_heading_deg: row.target_heading,
            label: row.label.unwrap_or_default(),
        })
    }
}

impl TryFrom<&LinkDraft> for LinkRow {
    type Error = PanoError;

    fn try_from(d: &LinkDraft) -> Result<Self> {
        let source = d.source_id.as_ref().ok_or(PanoError::UnsavedPanorama)?;
        let target = d
            .target_id
            .as_ref()
            .ok_or_else(|| PanoError::InvalidRecord("link has no destination".into()))?;
        Ok(LinkRow {
            id: d.id.as_ref().map(|id| id.0.clone()),
            source_panorama_id: source.0.clone(),
            target_panorama_id: target.0.clone(),
            position_x: d.position.x,
            position_y: d.position.y,
            position_z: d.position.z,
            target_heading: d.target_heading_deg,
            label: Some(d.label.clone()),
        })
    }
}

/// Decode a JSON array of rows.
pub fn rows_from_json<T: DeserializeOwned>(json: &str) -> Result<Vec<T>> {
    serde_json::from_str(json).map_err(|e| PanoError::InvalidRecord(e.to_string()))
}

/// Decode a single row, as returned by insert/update.
pub fn row_from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| PanoError::InvalidRecord(e.to_string()))
}

/// Narrow every row, skipping (and logging) the ones the viewer cannot use.
pub fn narrow_rows<R, T>(rows: Vec<R>, what: &str) -> Vec<T>
where
    T: TryFrom<R, Error = PanoError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("[store] skipping {} row: {}", what, e);
                None
            }
        })
        .collect()
}
