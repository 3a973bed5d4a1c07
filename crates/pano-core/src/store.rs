//! Contract with the persistent store for panorama, marker and link records.
//!
//! The store is an external collaborator; the viewer only relies on the
//! operations below. Every method resolves on the single UI thread, so the
//! futures are not required to be `Send`.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::model::{
    Link, LinkDraft, LinkId, Marker, MarkerDraft, MarkerId, Panorama, PanoramaDraft, PanoramaId,
};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Every marker and outgoing link row under one panorama, by id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dependents {
    pub markers: Vec<MarkerId>,
    pub links: Vec<LinkId>,
}

#[allow(async_fn_in_trait)]
pub trait PanoramaStore {
    /// Whether deleting a panorama also removes its markers and outgoing
    /// links at the schema level. When `false` the authoring layer deletes
    /// the dependents itself before the parent.
    fn cascades_deletes(&self) -> bool;

    async fn fetch_panoramas(&self) -> StoreResult<Vec<Panorama>>;
    async fn fetch_markers(&self, panorama: &PanoramaId) -> StoreResult<Vec<Marker>>;
    async fn fetch_links(&self, source: &PanoramaId) -> StoreResult<Vec<Link>>;
    /// Ids of the dependent rows, including rows the viewer would skip when
    /// fetching, so none of them outlive their panorama.
    async fn fetch_dependents(&self, panorama: &PanoramaId) -> StoreResult<Dependents>;

    async fn insert_panorama(&self, draft: &PanoramaDraft) -> StoreResult<Panorama>;
    async fn update_panorama(&self, id: &PanoramaId, draft: &PanoramaDraft)
        -> StoreResult<Panorama>;
    async fn delete_panorama(&self, id: &PanoramaId) -> StoreResult<()>;

    async fn insert_marker(&self, draft: &MarkerDraft) -> StoreResult<Marker>;
    async fn update_marker(&self, id: &MarkerId, draft: &MarkerDraft) -> StoreResult<Marker>;
    async fn delete_marker(&self, id: &MarkerId) -> StoreResult<()>;

    async fn insert_link(&self, draft: &LinkDraft) -> StoreResult<Link>;
    async fn update_link(&self, id: &LinkId, draft: &LinkDraft) -> StoreResult<Link>;
    async fn delete_link(&self, id: &LinkId) -> StoreResult<()>;
}
