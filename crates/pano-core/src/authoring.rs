//! Operator editing of panoramas, markers and links from inside the scene.
//!
//! [`Authoring`] is the modal state: which draft is open, or which delete is
//! awaiting confirmation. The async functions below talk to the store; they
//! validate first, so a rejected draft never reaches it, and they return the
//! confirmed record for the viewer to apply. Nothing is changed locally
//! before the store has answered.

use crate::catalog::Catalog;
use crate::error::{PanoError, Result, StoreError};
use crate::model::{
    is_valid_position, Link, LinkDraft, LinkId, Marker, MarkerDraft, MarkerId, MarkerKind,
    Panorama, PanoramaDraft, PanoramaId,
};
use crate::store::PanoramaStore;
use glam::Vec3;

/// What a scene click creates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Placement {
    #[default]
    Marker,
    Link,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeleteTarget {
    Marker(MarkerId),
    Link(LinkId),
    Panorama(PanoramaId),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Editing {
    #[default]
    Idle,
    Marker(MarkerDraft),
    Link(LinkDraft),
    Panorama(PanoramaDraft),
    ConfirmDelete(DeleteTarget),
}

#[derive(Clone, Debug, Default)]
pub struct Authoring {
    placement: Placement,
    editing: Editing,
    error: Option<String>,
}

impl Authoring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    pub fn editing(&self) -> &Editing {
        &self.editing
    }

    /// Form fields write straight into the open draft.
    pub fn editing_mut(&mut self) -> &mut Editing {
        &mut self.editing
    }

    pub fn is_idle(&self) -> bool {
        self.editing == Editing::Idle
    }

    /// Operator-facing message from the last rejected or failed action.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("[author] {}", message);
        self.error = Some(message);
    }

    fn open(&mut self, editing: Editing) {
        self.editing = editing;
        self.error = None;
    }

    /// Open a draft for a scene click at `point`, according to the current
    /// placement. `heading_deg` seeds a new link's facing angle.
    pub fn begin_at(
        &mut self,
        container: Option<&PanoramaId>,
        point: Vec3,
        heading_deg: f32,
    ) -> Result<()> {
        match self.placement {
            Placement::Marker => self.begin_marker(container, point),
            Placement::Link => self.begin_link(container, point, heading_deg),
        }
    }

    pub fn begin_marker(&mut self, container: Option<&PanoramaId>, position: Vec3) -> Result<()> {
        let Some(panorama) = container else {
            self.set_error(PanoError::UnsavedPanorama.to_string());
            return Err(PanoError::UnsavedPanorama);
        };
        self.open(Editing::Marker(MarkerDraft::new(panorama.clone(), position)));
        Ok(())
    }

    pub fn begin_link(
        &mut self,
        container: Option<&PanoramaId>,
        position: Vec3,
        heading_deg: f32,
    ) -> Result<()> {
        let Some(panorama) = container else {
            self.set_error(PanoError::UnsavedPanorama.to_string());
            return Err(PanoError::UnsavedPanorama);
        };
        self.open(Editing::Link(LinkDraft::new(
            panorama.clone(),
            position,
            heading_deg,
        )));
        Ok(())
    }

    pub fn edit_marker(&mut self, marker: &Marker) {
        self.open(Editing::Marker(marker.to_draft()));
    }

    pub fn edit_link(&mut self, link: &Link) {
        self.open(Editing::Link(link.to_draft()));
    }

    pub fn edit_panorama(&mut self, draft: PanoramaDraft) {
        self.open(Editing::Panorama(draft));
    }

    /// Destructive actions go through an explicit confirmation step.
    pub fn request_delete(&mut self, target: DeleteTarget) {
        self.open(Editing::ConfirmDelete(target));
    }

    pub fn cancel(&mut self) {
        self.open(Editing::Idle);
    }

    /// Close the dialog after the store confirmed the action.
    pub fn finish(&mut self) {
        self.open(Editing::Idle);
    }
}

pub fn validate_marker(draft: &MarkerDraft) -> Result<()> {
    if draft.panorama_id.is_none() {
        return Err(PanoError::UnsavedPanorama);
    }
    if !is_valid_position(draft.position) {
        return Err(PanoError::DegeneratePosition);
    }
    match &draft.kind {
        MarkerKind::Image { url } if url.trim().is_empty() => {
            Err(PanoError::MissingMediaUrl("image"))
        }
        MarkerKind::Video { url } if url.trim().is_empty() => {
            Err(PanoError::MissingMediaUrl("video"))
        }
        MarkerKind::Model3D if draft.model_url.is_none() => {
            Err(PanoError::MissingMediaUrl("model"))
        }
        _ => Ok(()),
    }
}

pub fn validate_link(draft: &LinkDraft, catalog: &Catalog) -> Result<()> {
    let source = draft.source_id.as_ref().ok_or(PanoError::UnsavedPanorama)?;
    if !catalog.contains(source) {
        return Err(PanoError::UnknownPanorama(source.clone()));
    }
    let target = draft
        .target_id
        .as_ref()
        .ok_or_else(|| PanoError::InvalidRecord("choose a destination panorama".into()))?;
    if !catalog.contains(target) {
        return Err(PanoError::UnknownPanorama(target.clone()));
    }
    if !is_valid_position(draft.position) {
        return Err(PanoError::DegeneratePosition);
    }
    Ok(())
}

/// Upsert by presence of id.
pub async fn save_marker<S: PanoramaStore>(store: &S, draft: &MarkerDraft) -> Result<Marker> {
    validate_marker(draft)?;
    let saved = match &draft.id {
        Some(id) => store.update_marker(id, draft).await?,
        None => store.insert_marker(draft).await?,
    };
    log::info!("[author] saved marker {} in {}", saved.id, saved.panorama_id);
    Ok(saved)
}

pub async fn save_link<S: PanoramaStore>(
    store: &S,
    draft: &LinkDraft,
    catalog: &Catalog,
) -> Result<Link> {
    validate_link(draft, catalog)?;
    let saved = match &draft.id {
        Some(id) => store.update_link(id, draft).await?,
        None => store.insert_link(draft).await?,
    };
    log::info!(
        "[author] saved link {} {} -> {}",
        saved.id,
        saved.source_id,
        saved.target_id
    );
    Ok(saved)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SavedPanorama {
    pub panorama: Panorama,
    /// Siblings whose active flag was cleared to keep one active per site.
    pub deactivated: Vec<Panorama>,
    /// Set when clearing a sibling failed after the panorama itself was
    /// stored. `deactivated` then holds only the siblings that were cleared.
    pub sibling_error: Option<StoreError>,
}

/// Upsert a panorama. An active panorama is written before its siblings are
/// deactivated, so a rejected save leaves the site's active flags untouched.
pub async fn save_panorama<S: PanoramaStore>(
    store: &S,
    draft: &PanoramaDraft,
    catalog: &Catalog,
) -> Result<SavedPanorama> {
    if draft.image_url.trim().is_empty() {
        return Err(PanoError::InvalidRecord("a panorama needs an image URL".into()));
    }
    let panorama = match &draft.id {
        Some(id) => store.update_panorama(id, draft).await?,
        None => store.insert_panorama(draft).await?,
    };
    log::info!("[author] saved panorama {}", panorama.id);

    let mut deactivated = Vec::new();
    let mut sibling_error = None;
    if panorama.is_active {
        for sibling in catalog.active_siblings(Some(&panorama.id), panorama.site_id.as_ref()) {
            let mut off = sibling.to_draft();
            off.is_active = false;
            match store.update_panorama(&sibling.id, &off).await {
                Ok(p) => deactivated.push(p),
                Err(e) => {
                    log::warn!("[author] {} is still active: {}", sibling.id, e);
                    sibling_error = Some(e);
                    break;
                }
            }
        }
    }
    Ok(SavedPanorama {
        panorama,
        deactivated,
        sibling_error,
    })
}

pub async fn delete_marker<S: PanoramaStore>(store: &S, id: &MarkerId) -> Result<()> {
    store.delete_marker(id).await?;
    log::info!("[author] deleted marker {}", id);
    Ok(())
}

pub async fn delete_link<S: PanoramaStore>(store: &S, id: &LinkId) -> Result<()> {
    store.delete_link(id).await?;
    log::info!("[author] deleted link {}", id);
    Ok(())
}

/// Delete a panorama with its markers and outgoing links. When the store
/// does not cascade, dependents are removed first so a failure part-way
/// never leaves records pointing at a missing panorama.
pub async fn delete_panorama<S: PanoramaStore>(store: &S, id: &PanoramaId) -> Result<()> {
    if !store.cascades_deletes() {
        let dependents = store.fetch_dependents(id).await?;
        for marker in &dependents.markers {
            store.delete_marker(marker).await?;
        }
        for link in &dependents.links {
            store.delete_link(link).await?;
        }
    }
    store.delete_panorama(id).await?;
    log::info!("[author] deleted panorama {}", id);
    Ok(())
}

/// Carry out a delete the operator has confirmed.
pub async fn confirm_delete<S: PanoramaStore>(store: &S, target: &DeleteTarget) -> Result<()> {
    match target {
        DeleteTarget::Marker(id) => delete_marker(store, id).await,
        DeleteTarget::Link(id) => delete_link(store, id).await,
        DeleteTarget::Panorama(id) => delete_panorama(store, id).await,
    }
}
