//! Viewer configuration.
//!
//! Every field has a default taken from [`crate::constants`], so a host page
//! only needs to pass the values it wants to change, e.g.
//! `{"mode":"author","site_id":"mangroves"}`.

use crate::constants::*;
use crate::error::{PanoError, Result};
use crate::model::{PanoramaId, SiteId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// End-user viewer: marker activation presents content, links navigate.
    #[default]
    View,
    /// Operator authoring: clicks open the marker/link editor.
    Author,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub mode: Mode,
    pub site_id: Option<SiteId>,
    pub start_panorama: Option<PanoramaId>,
    pub fov_min_deg: f32,
    pub fov_max_deg: f32,
    pub fov_default_deg: f32,
    pub zoom_step_deg: f32,
    pub drag_deg_per_px: f32,
    pub pitch_limit_deg: f32,
    pub backdrop_radius: f32,
    pub backdrop_width_segments: u32,
    pub backdrop_height_segments: u32,
    pub marker_shell_radius: f32,
    pub pick_angle_deg: f32,
    pub gyro_enabled: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::View,
            site_id: None,
            start_panorama: None,
            fov_min_deg: FOV_MIN_DEG,
            fov_max_deg: FOV_MAX_DEG,
            fov_default_deg: FOV_DEFAULT_DEG,
            zoom_step_deg: ZOOM_STEP_DEG,
            drag_deg_per_px: DRAG_DEG_PER_PX,
            pitch_limit_deg: PITCH_LIMIT_DEG,
            backdrop_radius: BACKDROP_RADIUS,
            backdrop_width_segments: BACKDROP_WIDTH_SEGMENTS,
            backdrop_height_segments: BACKDROP_HEIGHT_SEGMENTS,
            marker_shell_radius: MARKER_SHELL_RADIUS,
            pick_angle_deg: PICK_ANGLE_DEG,
            gyro_enabled: true,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| PanoError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let bad = |msg: &str| Err(PanoError::InvalidConfig(msg.to_string()));
        if !(self.fov_min_deg > 0.0 && self.fov_min_deg <= self.fov_max_deg && self.fov_max_deg < 180.0)
        {
            return bad("fov range must satisfy 0 < min <= max < 180");
        }
        if self.zoom_step_deg <= 0.0 {
            return bad("zoom step must be positive");
        }
        if !(0.0..90.0).contains(&self.pitch_limit_deg) {
            return bad("pitch limit must be within [0, 90)");
        }
        if self.marker_shell_radius < MIN_MARKER_DISTANCE {
            return bad("marker shell radius is degenerate");
        }
        if self.backdrop_radius <= self.marker_shell_radius || self.backdrop_radius >= Z_FAR {
            return bad("backdrop must enclose the marker shell and sit inside the far plane");
        }
        if self.backdrop_width_segments < 3 || self.backdrop_height_segments < 2 {
            return bad("backdrop needs at least 3x2 segments");
        }
        if self.pick_angle_deg <= 0.0 {
            return bad("pick angle must be positive");
        }
        Ok(())
    }

    /// Default FOV clamped into the configured range.
    pub fn initial_fov(&self) -> f32 {
        self.fov_default_deg.clamp(self.fov_min_deg, self.fov_max_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ViewerConfig::from_json(r#"{"mode":"author","site_id":"dunes"}"#).unwrap();
        assert_eq!(cfg.mode, Mode::Author);
        assert_eq!(cfg.site_id, Some(SiteId::from("dunes")));
        assert_eq!(cfg.fov_min_deg, FOV_MIN_DEG);
        assert_eq!(cfg.fov_max_deg, FOV_MAX_DEG);
    }

    #[test]
    fn inverted_fov_range_is_rejected() {
        let err = ViewerConfig::from_json(r#"{"fov_min_deg":80,"fov_max_deg":60}"#).unwrap_err();
        assert!(matches!(err, PanoError::InvalidConfig(_)));
    }

    #[test]
    fn backdrop_inside_shell_is_rejected() {
        let cfg = ViewerConfig {
            backdrop_radius: 5.0,
            ..ViewerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
