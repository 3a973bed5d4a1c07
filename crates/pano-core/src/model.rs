//! Panorama, marker and link records as the rest of the crate sees them.
//!
//! These are the narrowed, validated shapes; the raw store rows live in
//! [`crate::record`].

use crate::constants::{FOV_DEFAULT_DEG, MIN_MARKER_DISTANCE};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

record_id!(PanoramaId);
record_id!(MarkerId);
record_id!(LinkId);
record_id!(SiteId);

/// Camera pose applied when a panorama is opened directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitialView {
    pub heading_deg: f32,
    pub pitch_deg: f32,
    pub fov_deg: f32,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            heading_deg: 0.0,
            pitch_deg: 0.0,
            fov_deg: FOV_DEFAULT_DEG,
        }
    }
}

/// Normalised (0..1) position on the site's overview map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloorPlanPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panorama {
    pub id: PanoramaId,
    pub site_id: Option<SiteId>,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,
    pub initial_view: InitialView,
    pub floor_plan: Option<FloorPlanPoint>,
    pub geo: Option<GeoPoint>,
}

impl Panorama {
    pub fn to_draft(&self) -> PanoramaDraft {
        PanoramaDraft {
            id: Some(self.id.clone()),
            site_id: self.site_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            is_active: self.is_active,
            initial_view: self.initial_view,
            floor_plan: self.floor_plan,
            geo: self.geo,
        }
    }
}

/// Editable panorama fields. `id` is `None` until the store has accepted it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanoramaDraft {
    pub id: Option<PanoramaId>,
    pub site_id: Option<SiteId>,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,
    pub initial_view: InitialView,
    pub floor_plan: Option<FloorPlanPoint>,
    pub geo: Option<GeoPoint>,
}

/// What a marker shows when an end user activates it.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkerKind {
    Info,
    Image { url: String },
    Video { url: String },
    Model3D,
}

impl MarkerKind {
    /// Column value written to the store's free-text `type` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            MarkerKind::Info => "info",
            MarkerKind::Image { .. } => "image",
            MarkerKind::Video { .. } => "video",
            MarkerKind::Model3D => "model",
        }
    }

    pub fn media_url(&self) -> Option<&str> {
        match self {
            MarkerKind::Image { url } | MarkerKind::Video { url } => Some(url),
            MarkerKind::Info | MarkerKind::Model3D => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub panorama_id: PanoramaId,
    pub kind: MarkerKind,
    pub position: Vec3,
    pub title: String,
    pub content: String,
    pub icon_url: Option<String>,
    pub model_url: Option<String>,
}

impl Marker {
    pub fn has_model(&self) -> bool {
        self.model_url.is_some()
    }

    pub fn content(&self) -> MarkerContent {
        let media = match &self.kind {
            MarkerKind::Image { url } => Some(Media::Image(url.clone())),
            MarkerKind::Video { url } => Some(Media::Video(url.clone())),
            MarkerKind::Info | MarkerKind::Model3D => None,
        };
        MarkerContent {
            title: self.title.clone(),
            body: self.content.clone(),
            media,
        }
    }

    pub fn to_draft(&self) -> MarkerDraft {
        MarkerDraft {
            id: Some(self.id.clone()),
            panorama_id: Some(self.panorama_id.clone()),
            kind: self.kind.clone(),
            position: self.position,
            title: self.title.clone(),
            content: self.content.clone(),
            icon_url: self.icon_url.clone(),
            model_url: self.model_url.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerDraft {
    pub id: Option<MarkerId>,
    pub panorama_id: Option<PanoramaId>,
    pub kind: MarkerKind,
    pub position: Vec3,
    pub title: String,
    pub content: String,
    pub icon_url: Option<String>,
    pub model_url: Option<String>,
}

impl MarkerDraft {
    pub fn new(panorama_id: PanoramaId, position: Vec3) -> Self {
        Self {
            id: None,
            panorama_id: Some(panorama_id),
            kind: MarkerKind::Info,
            position,
            title: String::new(),
            content: String::new(),
            icon_url: None,
            model_url: None,
        }
    }
}

/// Content presented to an end user when a marker is activated in view mode.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerContent {
    pub title: String,
    pub body: String,
    pub media: Option<Media>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Media {
    Image(String),
    Video(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub source_id: PanoramaId,
    pub target_id: PanoramaId,
    pub position: Vec3,
    pub target_heading_deg: f32,
    pub label: String,
}

impl Link {
    pub fn to_draft(&self) -> LinkDraft {
        LinkDraft {
            id: Some(self.id.clone()),
            source_id: Some(self.source_id.clone()),
            target_id: Some(self.target_id.clone()),
            position: self.position,
            target_heading_deg: self.target_heading_deg,
            label: self.label.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkDraft {
    pub id: Option<LinkId>,
    pub source_id: Option<PanoramaId>,
    pub target_id: Option<PanoramaId>,
    pub position: Vec3,
    pub target_heading_deg: f32,
    pub label: String,
}

impl LinkDraft {
    pub fn new(source_id: PanoramaId, position: Vec3, target_heading_deg: f32) -> Self {
        Self {
            id: None,
            source_id: Some(source_id),
            target_id: None,
            position,
            target_heading_deg,
            label: String::new(),
        }
    }
}

/// A position is usable for picking and depth only away from the camera origin.
#[inline]
pub fn is_valid_position(p: Vec3) -> bool {
    p.is_finite() && p.length() >= MIN_MARKER_DISTANCE
}
