//! Markers of the current scene: picking, hover labels and activation.

use crate::config::Mode;
use crate::error::{PanoError, Result};
use crate::geom::{angle_to, Ray};
use crate::model::{Marker, MarkerContent, MarkerId};
use fnv::FnvHashMap;
use glam::Vec3;

/// Identifies one model load so a late result can be matched or dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadToken(u64);

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ModelState {
    #[default]
    Hidden,
    Loading(LoadToken),
    Shown,
    Failed(String),
}

/// Ask the host to fetch a marker's model; report back with
/// [`MarkerLayer::complete_model_load`].
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    pub marker: MarkerId,
    pub url: String,
    pub token: LoadToken,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActivationIntent {
    /// Authoring: open the editor for this marker.
    Edit(Marker),
    /// Viewing: present the marker's content to the end user.
    Present(MarkerContent),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Activation {
    pub marker: MarkerId,
    pub intent: ActivationIntent,
    pub model: Option<ModelRequest>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerStyle {
    Plain,
    WithModel,
    Link,
}

/// Floating title anchored at a world position; the host keeps it facing
/// the camera by drawing it in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub anchor: Vec3,
}

/// Index and angle of the item whose pick cone contains the ray and is
/// closest to its axis.
pub(crate) fn nearest_in_cone<'a>(
    ray: &Ray,
    positions: impl Iterator<Item = &'a Vec3>,
    max_angle: f32,
) -> Option<(usize, f32)> {
    let mut best = None::<(usize, f32)>;
    for (i, p) in positions.enumerate() {
        let a = angle_to(ray, *p);
        if a > max_angle {
            continue;
        }
        match best {
            Some((_, ba)) if a >= ba => {}
            _ => best = Some((i, a)),
        }
    }
    best
}

#[derive(Clone, Debug)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
    hovered: Option<MarkerId>,
    models: FnvHashMap<MarkerId, ModelState>,
    next_token: u64,
    pick_angle: f32,
}

impl MarkerLayer {
    pub fn new(pick_angle_deg: f32) -> Self {
        Self {
            markers: Vec::new(),
            hovered: None,
            models: FnvHashMap::default(),
            next_token: 0,
            pick_angle: pick_angle_deg.to_radians(),
        }
    }

    /// Swap in a new scene's markers; all transient state goes with the old ones.
    pub fn replace(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
        self.hovered = None;
        self.models.clear();
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.id == id)
    }

    /// Insert or replace after the store confirmed a save.
    pub fn upsert(&mut self, marker: Marker) {
        match self.markers.iter_mut().find(|m| m.id == marker.id) {
            Some(slot) => {
                if slot.model_url != marker.model_url {
                    self.models.remove(&marker.id);
                }
                *slot = marker;
            }
            None => self.markers.push(marker),
        }
    }

    pub fn remove(&mut self, id: &MarkerId) -> Option<Marker> {
        let idx = self.markers.iter().position(|m| &m.id == id)?;
        self.models.remove(id);
        if self.hovered.as_ref() == Some(id) {
            self.hovered = None;
        }
        Some(self.markers.remove(idx))
    }

    /// Nearest marker under the ray, with its angular distance in radians.
    pub fn pick(&self, ray: &Ray) -> Option<(MarkerId, f32)> {
        let positions = self.markers.iter().map(|m| &m.position);
        let (i, a) = nearest_in_cone(ray, positions, self.pick_angle)?;
        Some((self.markers[i].id.clone(), a))
    }

    pub fn pick_angle(&self) -> f32 {
        self.pick_angle
    }

    /// Returns whether the hovered marker changed.
    pub fn set_hover(&mut self, id: Option<MarkerId>) -> bool {
        if self.hovered == id {
            return false;
        }
        self.hovered = id;
        true
    }

    pub fn hovered(&self) -> Option<&MarkerId> {
        self.hovered.as_ref()
    }

    pub fn label(&self, id: &MarkerId) -> Option<Label> {
        self.get(id).map(|m| Label {
            text: m.title.clone(),
            anchor: m.position,
        })
    }

    /// Activate a marker.
    ///
    /// Markers with a model toggle its visibility: a hidden (or failed) model
    /// starts loading, a loading or shown one is hidden. A second activation
    /// while the first load is still running therefore means "hide", and the
    /// stale load is ignored when it completes.
    pub fn activate(&mut self, id: &MarkerId, mode: Mode) -> Result<Activation> {
        let marker = self
            .get(id)
            .cloned()
            .ok_or_else(|| PanoError::UnknownMarker(id.clone()))?;

        let model = match &marker.model_url {
            Some(url) => {
                let state = self.models.entry(id.clone()).or_default();
                match *state {
                    ModelState::Hidden | ModelState::Failed(_) => {
                        self.next_token += 1;
                        let token = LoadToken(self.next_token);
                        *state = ModelState::Loading(token);
                        log::info!("[marker] {} loading model {}", id, url);
                        Some(ModelRequest {
                            marker: id.clone(),
                            url: url.clone(),
                            token,
                        })
                    }
                    ModelState::Loading(_) | ModelState::Shown => {
                        *state = ModelState::Hidden;
                        log::info!("[marker] {} model hidden", id);
                        None
                    }
                }
            }
            None => None,
        };

        let intent = match mode {
            Mode::Author => ActivationIntent::Edit(marker),
            Mode::View => ActivationIntent::Present(marker.content()),
        };
        Ok(Activation {
            marker: id.clone(),
            intent,
            model,
        })
    }

    /// Apply the outcome of a model load. Returns `false` when the load was
    /// superseded (hidden again, re-requested, or the scene changed).
    pub fn complete_model_load(
        &mut self,
        id: &MarkerId,
        token: LoadToken,
        result: std::result::Result<(), String>,
    ) -> bool {
        let Some(state) = self.models.get_mut(id) else {
            return false;
        };
        if *state != ModelState::Loading(token) {
            log::debug!("[marker] {} dropped stale model load", id);
            return false;
        }
        *state = match result {
            Ok(()) => ModelState::Shown,
            Err(e) => {
                log::warn!("[marker] {} model failed: {}", id, e);
                ModelState::Failed(e)
            }
        };
        true
    }

    pub fn model_state(&self, id: &MarkerId) -> ModelState {
        self.models.get(id).cloned().unwrap_or_default()
    }

    /// The "model shown" flag: true while loading or shown.
    pub fn is_model_visible(&self, id: &MarkerId) -> bool {
        matches!(
            self.models.get(id),
            Some(ModelState::Loading(_)) | Some(ModelState::Shown)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarkerKind;

    fn marker(id: &str, pos: Vec3, model: Option<&str>) -> Marker {
        Marker {
            id: id.into(),
            panorama_id: "p".into(),
            kind: MarkerKind::Info,
            position: pos,
            title: format!("title {id}"),
            content: String::new(),
            icon_url: None,
            model_url: model.map(str::to_string),
        }
    }

    #[test]
    fn pick_prefers_marker_closest_to_ray_axis() {
        let mut layer = MarkerLayer::new(5.0);
        layer.replace(vec![
            marker("near-axis", Vec3::new(0.1, 0.0, -10.0), None),
            marker("off-axis", Vec3::new(0.5, 0.0, -10.0), None),
            marker("behind", Vec3::new(0.0, 0.0, 10.0), None),
        ]);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let (id, _) = layer.pick(&ray).unwrap();
        assert_eq!(id.as_str(), "near-axis");
        let away = Ray::new(Vec3::ZERO, Vec3::Y);
        assert!(layer.pick(&away).is_none());
    }

    #[test]
    fn failed_model_retries_on_next_activation() {
        let mut layer = MarkerLayer::new(5.0);
        layer.replace(vec![marker("m", Vec3::NEG_Z, Some("https://cdn/m.glb"))]);
        let id = MarkerId::from("m");
        let req = layer.activate(&id, Mode::View).unwrap().model.unwrap();
        assert!(layer.complete_model_load(&id, req.token, Err("404".into())));
        assert!(!layer.is_model_visible(&id));
        let again = layer.activate(&id, Mode::View).unwrap();
        assert!(again.model.is_some());
        assert!(layer.is_model_visible(&id));
    }

    #[test]
    fn upsert_with_new_model_resets_state() {
        let mut layer = MarkerLayer::new(5.0);
        layer.replace(vec![marker("m", Vec3::NEG_Z, Some("a.glb"))]);
        let id = MarkerId::from("m");
        layer.activate(&id, Mode::View).unwrap();
        layer.upsert(marker("m", Vec3::NEG_Z, Some("b.glb")));
        assert_eq!(layer.model_state(&id), ModelState::Hidden);
    }

    #[test]
    fn hover_reports_changes_only() {
        let mut layer = MarkerLayer::new(5.0);
        layer.replace(vec![marker("m", Vec3::NEG_Z, None)]);
        assert!(layer.set_hover(Some("m".into())));
        assert!(!layer.set_hover(Some("m".into())));
        assert_eq!(layer.label(&"m".into()).unwrap().text, "title m");
        assert!(layer.set_hover(None));
    }
}
