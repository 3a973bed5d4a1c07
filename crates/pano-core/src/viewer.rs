//! The viewer container: one scene at a time, navigation between scenes, and
//! the routing of clicks to markers, links and authoring.
//!
//! Every scene switch bumps a generation counter. Async work (texture decode,
//! marker and link fetches) is handed a [`SceneTicket`] carrying the
//! generation it was started for; results for an older generation are
//! dropped on arrival, so a slow response can never overwrite a newer scene.

use crate::authoring::{Authoring, DeleteTarget, Editing, SavedPanorama};
use crate::camera::{CameraController, CameraFrame, Viewport};
use crate::catalog::Catalog;
use crate::config::{Mode, ViewerConfig};
use crate::error::{PanoError, Result};
use crate::geom::{ray_sphere_exit, Ray};
use crate::markers::{nearest_in_cone, Activation, Label, MarkerLayer, MarkerStyle};
use crate::model::{Link, LinkId, Marker, MarkerId, Panorama, PanoramaDraft, PanoramaId};
use crate::orientation::OrientationSampler;
use crate::store::PanoramaStore;
use glam::{Vec2, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub enum TextureState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContentsState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// `None` while previewing a panorama that has not been saved yet.
    pub key: Option<PanoramaId>,
    pub title: String,
    pub image_url: String,
    pub generation: u64,
    pub texture: TextureState,
    pub contents: ContentsState,
}

/// Handed to the async loads of one scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneTicket {
    pub generation: u64,
    pub panorama: Option<PanoramaId>,
    pub image_url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneContents {
    pub markers: Vec<Marker>,
    pub links: Vec<Link>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Hit {
    Marker(MarkerId),
    Link(LinkId),
    /// Point on the marker shell behind the backdrop.
    Backdrop(Vec3),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClickOutcome {
    Activated(Activation),
    Navigate(SceneTicket),
    /// An authoring dialog was opened; see [`Viewer::authoring`].
    Editing,
    Ignored,
}

/// One billboard for the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Indicator {
    pub position: Vec3,
    pub style: MarkerStyle,
    pub hovered: bool,
}

pub async fn fetch_catalog<S: PanoramaStore>(store: &S) -> Result<Vec<Panorama>> {
    let panoramas = store.fetch_panoramas().await?;
    log::info!("[scene] catalog has {} panoramas", panoramas.len());
    Ok(panoramas)
}

/// Markers and links of the ticket's panorama. An unsaved panorama has none.
pub async fn fetch_scene<S: PanoramaStore>(store: &S, ticket: &SceneTicket) -> Result<SceneContents> {
    let Some(id) = &ticket.panorama else {
        return Ok(SceneContents::default());
    };
    let markers = store.fetch_markers(id).await?;
    let links = store.fetch_links(id).await?;
    Ok(SceneContents { markers, links })
}

/// The scene a ticket was issued for, if it is still the current one.
fn current_scene<'a>(
    scene: &'a mut Option<Scene>,
    ticket: &SceneTicket,
    what: &str,
) -> Option<&'a mut Scene> {
    let scene = scene.as_mut().filter(|s| s.generation == ticket.generation);
    if scene.is_none() {
        log::debug!(
            "[scene] dropped stale {} for generation {}",
            what,
            ticket.generation
        );
    }
    scene
}

pub struct Viewer {
    config: ViewerConfig,
    catalog: Catalog,
    scene: Option<Scene>,
    generation: u64,
    markers: MarkerLayer,
    links: Vec<Link>,
    hovered_link: Option<LinkId>,
    camera: CameraController,
    sampler: OrientationSampler,
    authoring: Authoring,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let mut sampler = OrientationSampler::mount();
        sampler.set_enabled(config.gyro_enabled);
        Self {
            markers: MarkerLayer::new(config.pick_angle_deg),
            camera: CameraController::new(&config),
            catalog: Catalog::default(),
            scene: None,
            generation: 0,
            links: Vec::new(),
            hovered_link: None,
            sampler,
            authoring: Authoring::new(),
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn set_catalog(&mut self, panoramas: Vec<Panorama>) {
        self.catalog = Catalog::new(panoramas);
    }

    /// Configured start panorama when it exists, else the site's entry point.
    pub fn entry_point(&self) -> Option<PanoramaId> {
        if let Some(start) = &self.config.start_panorama {
            if self.catalog.contains(start) {
                return Some(start.clone());
            }
            log::warn!("[scene] start panorama {} not in catalog", start);
        }
        self.catalog
            .entry_point(self.config.site_id.as_ref())
            .map(|p| p.id.clone())
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Persisted id of the current scene, the container for new markers and links.
    pub fn container(&self) -> Option<&PanoramaId> {
        self.scene.as_ref().and_then(|s| s.key.as_ref())
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    pub fn markers_mut(&mut self) -> &mut MarkerLayer {
        &mut self.markers
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, id: &LinkId) -> Option<&Link> {
        self.links.iter().find(|l| &l.id == id)
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraController {
        &mut self.camera
    }

    pub fn sampler(&self) -> &OrientationSampler {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut OrientationSampler {
        &mut self.sampler
    }

    /// Pointer drag against the live sampler, which decides whether the
    /// gyroscope owns the camera.
    pub fn drag_to(&mut self, px: Vec2) -> bool {
        self.camera.drag_to(px, &self.sampler)
    }

    pub fn authoring(&self) -> &Authoring {
        &self.authoring
    }

    pub fn authoring_mut(&mut self) -> &mut Authoring {
        &mut self.authoring
    }

    pub fn frame(&self, viewport: Viewport) -> CameraFrame {
        self.camera.frame(&self.sampler, viewport)
    }

    /// Gyroscope on/off. Turning it back on keeps the old calibration.
    pub fn toggle_gyro(&mut self) -> bool {
        let on = !self.camera.gyro_enabled();
        self.camera.set_gyro_enabled(on);
        self.sampler.set_enabled(on);
        log::info!("[gyro] {}", if on { "enabled" } else { "disabled" });
        on
    }

    pub fn recalibrate(&mut self) -> bool {
        self.sampler.recalibrate()
    }

    // ---------------- Navigation ----------------

    fn begin_scene(&mut self, key: Option<PanoramaId>, title: &str, image_url: &str) -> SceneTicket {
        self.generation += 1;
        self.markers.clear();
        self.links.clear();
        self.hovered_link = None;
        // A panorama dialog survives the preview of its own draft.
        if !matches!(self.authoring.editing(), Editing::Panorama(_)) {
            self.authoring.cancel();
        }
        let contents = if key.is_some() {
            ContentsState::Loading
        } else {
            ContentsState::Ready
        };
        self.scene = Some(Scene {
            key: key.clone(),
            title: title.to_string(),
            image_url: image_url.to_string(),
            generation: self.generation,
            texture: TextureState::Loading,
            contents,
        });
        log::info!(
            "[scene] open {} (generation {})",
            key.as_ref().map_or("<unsaved>", |k| k.as_str()),
            self.generation
        );
        SceneTicket {
            generation: self.generation,
            panorama: key,
            image_url: image_url.to_string(),
        }
    }

    /// Open a panorama directly, at its initial view.
    pub fn open(&mut self, id: &PanoramaId) -> Result<SceneTicket> {
        let pano = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| PanoError::UnknownPanorama(id.clone()))?;
        let ticket = self.begin_scene(Some(pano.id.clone()), &pano.title, &pano.image_url);
        let v = pano.initial_view;
        self.camera.reset_view(v.heading_deg, v.pitch_deg, v.fov_deg);
        Ok(ticket)
    }

    /// Traverse a link of the current scene. The camera faces the link's
    /// heading; pitch and field of view come from the destination. A link
    /// whose destination is gone leaves everything as it was.
    pub fn follow_link(&mut self, link_id: &LinkId) -> Result<SceneTicket> {
        let link = self
            .link(link_id)
            .cloned()
            .ok_or_else(|| PanoError::UnknownLink(link_id.clone()))?;
        let Some(dest) = self.catalog.get(&link.target_id).cloned() else {
            log::warn!("[scene] link {} points at missing {}", link.id, link.target_id);
            return Err(PanoError::DanglingLink {
                link: link.id,
                target: link.target_id,
            });
        };
        let ticket = self.begin_scene(Some(dest.id.clone()), &dest.title, &dest.image_url);
        self.camera.reset_view(
            link.target_heading_deg,
            dest.initial_view.pitch_deg,
            dest.initial_view.fov_deg,
        );
        Ok(ticket)
    }

    /// Show a panorama that is still being authored, before it has an id.
    pub fn preview_unsaved(&mut self, draft: &PanoramaDraft) -> SceneTicket {
        let ticket = self.begin_scene(draft.id.clone(), &draft.title, &draft.image_url);
        let v = draft.initial_view;
        self.camera.reset_view(v.heading_deg, v.pitch_deg, v.fov_deg);
        ticket
    }

    pub fn close(&mut self) {
        self.generation += 1;
        self.scene = None;
        self.markers.clear();
        self.links.clear();
        self.hovered_link = None;
        log::info!("[scene] closed");
    }

    pub fn is_current(&self, ticket: &SceneTicket) -> bool {
        self.scene
            .as_ref()
            .is_some_and(|s| s.generation == ticket.generation)
    }

    pub fn apply_contents(&mut self, ticket: &SceneTicket, result: Result<SceneContents>) -> Applied {
        let Some(scene) = current_scene(&mut self.scene, ticket, "contents") else {
            return Applied::Stale;
        };
        match result {
            Ok(contents) => {
                scene.contents = ContentsState::Ready;
                for link in &contents.links {
                    if !self.catalog.contains(&link.target_id) {
                        log::warn!("[scene] link {} points at missing {}", link.id, link.target_id);
                    }
                }
                log::info!(
                    "[scene] {} markers, {} links",
                    contents.markers.len(),
                    contents.links.len()
                );
                self.markers.replace(contents.markers);
                self.links = contents.links;
                self.hovered_link = None;
            }
            Err(e) => {
                log::warn!("[scene] could not load markers and links: {}", e);
                scene.contents = ContentsState::Failed(e.to_string());
            }
        }
        Applied::Current
    }

    pub fn apply_texture(
        &mut self,
        ticket: &SceneTicket,
        result: std::result::Result<(), String>,
    ) -> Applied {
        let Some(scene) = current_scene(&mut self.scene, ticket, "texture") else {
            return Applied::Stale;
        };
        scene.texture = match result {
            Ok(()) => TextureState::Ready,
            Err(e) => {
                log::error!("[scene] texture {} failed: {}", ticket.image_url, e);
                TextureState::Failed(e)
            }
        };
        Applied::Current
    }

    // ---------------- Picking ----------------

    /// What lies under the ray: the marker or link nearest the ray axis, else
    /// the point on the marker shell.
    pub fn pick(&self, ray: &Ray) -> Option<Hit> {
        let marker = self.markers.pick(ray);
        let positions = self.links.iter().map(|l| &l.position);
        let link = nearest_in_cone(ray, positions, self.markers.pick_angle());
        match (marker, link) {
            (Some((id, ma)), Some((li, la))) => Some(if la < ma {
                Hit::Link(self.links[li].id.clone())
            } else {
                Hit::Marker(id)
            }),
            (Some((id, _)), None) => Some(Hit::Marker(id)),
            (None, Some((li, _))) => Some(Hit::Link(self.links[li].id.clone())),
            (None, None) => {
                let radius = self.config.marker_shell_radius;
                let t = ray_sphere_exit(ray.origin, ray.dir, Vec3::ZERO, radius)?;
                Some(Hit::Backdrop(ray.at(t)))
            }
        }
    }

    /// Update hover state. Returns whether it changed.
    pub fn hover(&mut self, ray: Option<&Ray>) -> bool {
        let hit = ray.and_then(|r| self.pick(r));
        let (marker, link) = match hit {
            Some(Hit::Marker(id)) => (Some(id), None),
            Some(Hit::Link(id)) => (None, Some(id)),
            _ => (None, None),
        };
        let changed_marker = self.markers.set_hover(marker);
        let changed_link = self.hovered_link != link;
        self.hovered_link = link;
        changed_marker || changed_link
    }

    pub fn hovered_label(&self) -> Option<Label> {
        if let Some(id) = self.markers.hovered() {
            return self.markers.label(id);
        }
        let link = self.link(self.hovered_link.as_ref()?)?;
        let text = if link.label.is_empty() {
            self.catalog
                .get(&link.target_id)
                .map(|p| p.title.clone())
                .unwrap_or_default()
        } else {
            link.label.clone()
        };
        Some(Label {
            text,
            anchor: link.position,
        })
    }

    pub fn indicators(&self) -> Vec<Indicator> {
        let hovered = self.markers.hovered();
        let markers = self.markers.markers().iter().map(|m| Indicator {
            position: m.position,
            style: if m.has_model() {
                MarkerStyle::WithModel
            } else {
                MarkerStyle::Plain
            },
            hovered: hovered == Some(&m.id),
        });
        let links = self.links.iter().map(|l| Indicator {
            position: l.position,
            style: MarkerStyle::Link,
            hovered: self.hovered_link.as_ref() == Some(&l.id),
        });
        markers.chain(links).collect()
    }

    /// Route a click. Markers activate in either mode. Links navigate in view
    /// mode and open their editor in authoring mode, where a backdrop click
    /// starts a new marker or link at the clicked point.
    ///
    /// Touch screens never hover, so a click also moves the hover to what it
    /// hit; the activated marker's title then shows as the floating label.
    pub fn click(&mut self, ray: &Ray) -> Result<ClickOutcome> {
        self.hover(Some(ray));
        let Some(hit) = self.pick(ray) else {
            return Ok(ClickOutcome::Ignored);
        };
        let mode = self.mode();
        match (hit, mode) {
            (Hit::Marker(id), _) => Ok(ClickOutcome::Activated(self.markers.activate(&id, mode)?)),
            (Hit::Link(id), Mode::View) => Ok(ClickOutcome::Navigate(self.follow_link(&id)?)),
            (Hit::Link(id), Mode::Author) => {
                let link = self
                    .link(&id)
                    .cloned()
                    .ok_or(PanoError::UnknownLink(id))?;
                self.authoring.edit_link(&link);
                Ok(ClickOutcome::Editing)
            }
            (Hit::Backdrop(point), Mode::Author) => {
                let container = self.container().cloned();
                let heading = self.camera.heading();
                self.authoring.begin_at(container.as_ref(), point, heading)?;
                Ok(ClickOutcome::Editing)
            }
            (Hit::Backdrop(_), Mode::View) => Ok(ClickOutcome::Ignored),
        }
    }

    /// The "add" action: a new marker straight ahead on the marker shell.
    pub fn add_marker(&mut self) -> Result<()> {
        if self.scene.is_none() {
            return Err(PanoError::NoScene);
        }
        let container = self.container().cloned();
        let ahead = self.camera.rotation(&self.sampler) * Vec3::NEG_Z;
        self.authoring
            .begin_marker(container.as_ref(), ahead * self.config.marker_shell_radius)
    }

    pub fn add_link(&mut self) -> Result<()> {
        if self.scene.is_none() {
            return Err(PanoError::NoScene);
        }
        let container = self.container().cloned();
        let ahead = self.camera.rotation(&self.sampler) * Vec3::NEG_Z;
        let heading = self.camera.heading();
        self.authoring.begin_link(
            container.as_ref(),
            ahead * self.config.marker_shell_radius,
            heading,
        )
    }

    pub fn edit_current_panorama(&mut self) {
        let draft = self
            .container()
            .and_then(|id| self.catalog.get(id))
            .map(Panorama::to_draft)
            .unwrap_or_else(|| PanoramaDraft {
                site_id: self.config.site_id.clone(),
                ..PanoramaDraft::default()
            });
        self.authoring.edit_panorama(draft);
    }

    // ---------------- Store-confirmed changes ----------------

    /// Returns `false` when the marker belongs to another scene.
    pub fn apply_saved_marker(&mut self, marker: Marker) -> bool {
        if self.container() != Some(&marker.panorama_id) {
            return false;
        }
        self.markers.upsert(marker);
        true
    }

    pub fn apply_saved_link(&mut self, link: Link) -> bool {
        if self.container() != Some(&link.source_id) {
            return false;
        }
        match self.links.iter_mut().find(|l| l.id == link.id) {
            Some(slot) => *slot = link,
            None => self.links.push(link),
        }
        true
    }

    /// Record a saved panorama. A previewed draft adopts its new id so it can
    /// host markers; a changed image reopens the scene.
    pub fn apply_saved_panorama(&mut self, saved: SavedPanorama) -> Option<SceneTicket> {
        for sibling in saved.deactivated {
            self.catalog.upsert(sibling);
        }
        let pano = saved.panorama;
        self.catalog.upsert(pano.clone());
        let scene = self.scene.as_mut()?;
        let same = match &scene.key {
            Some(key) => key == &pano.id,
            None => true,
        };
        if !same {
            return None;
        }
        if scene.image_url != pano.image_url {
            return self.open(&pano.id).ok();
        }
        scene.key = Some(pano.id);
        scene.title = pano.title;
        None
    }

    /// Mirror a confirmed delete.
    pub fn apply_deleted(&mut self, target: &DeleteTarget) {
        match target {
            DeleteTarget::Marker(id) => {
                self.markers.remove(id);
            }
            DeleteTarget::Link(id) => {
                self.links.retain(|l| &l.id != id);
                if self.hovered_link.as_ref() == Some(id) {
                    self.hovered_link = None;
                }
            }
            DeleteTarget::Panorama(id) => {
                self.catalog.remove(id);
                if self.container() == Some(id) {
                    self.close();
                }
            }
        }
    }
}
