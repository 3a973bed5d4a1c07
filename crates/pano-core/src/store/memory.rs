use super::{Dependents, PanoramaStore, StoreResult};
use crate::error::{PanoError, StoreError, StoreOp};
use crate::model::{
    Link, LinkDraft, LinkId, Marker, MarkerDraft, MarkerId, Panorama, PanoramaDraft, PanoramaId,
};
use crate::record::{narrow_rows, CatalogDump, LinkRow, MarkerRow};
use fnv::{FnvHashMap, FnvHashSet};
use std::cell::RefCell;

#[derive(Default)]
struct Tables {
    panoramas: Vec<Panorama>,
    markers: Vec<Marker>,
    links: Vec<Link>,
    // Rows stored but never handed to the viewer.
    unreadable_markers: Vec<MarkerRow>,
    unreadable_links: Vec<LinkRow>,
    next_id: u64,
    failing: FnvHashSet<StoreOp>,
    calls: FnvHashMap<StoreOp, usize>,
}

impl Tables {
    fn enter(&mut self, op: StoreOp) -> StoreResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        if self.failing.contains(&op) {
            return Err(StoreError::new(op, "injected failure"));
        }
        Ok(())
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn has_panorama(&self, id: &PanoramaId) -> bool {
        self.panoramas.iter().any(|p| &p.id == id)
    }
}

/// In-process store with the same observable contract as the hosted one.
///
/// Cascading deletes can be switched off to reproduce a store whose schema
/// does not enforce them. Individual operations can be made to fail, and
/// every call is counted, so callers can check what was (not) attempted.
pub struct MemoryStore {
    tables: RefCell<Tables>,
    cascade: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RefCell::new(Tables::default()),
            cascade: true,
        }
    }

    pub fn with_cascade(mut self, cascade: bool) -> Self {
        self.cascade = cascade;
        self
    }

    /// Seed from a catalog document. Marker and link rows that do not
    /// narrow stay in the store, as in a hosted table, but are never fetched.
    pub fn from_dump(dump: CatalogDump) -> Self {
        let store = Self::new();
        {
            let mut t = store.tables.borrow_mut();
            t.panoramas = narrow_rows(dump.panoramas, "panorama");
            let (markers, unreadable_markers) = split_rows(dump.markers, "marker");
            let (links, unreadable_links) = split_rows(dump.links, "link");
            t.markers = markers;
            t.unreadable_markers = unreadable_markers;
            t.links = links;
            t.unreadable_links = unreadable_links;
        }
        store
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let dump: CatalogDump =
            serde_json::from_str(json).map_err(|e| PanoError::InvalidRecord(e.to_string()))?;
        Ok(Self::from_dump(dump))
    }

    pub fn fail_on(&self, op: StoreOp) {
        self.tables.borrow_mut().failing.insert(op);
    }

    pub fn recover(&self, op: StoreOp) {
        self.tables.borrow_mut().failing.remove(&op);
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.tables.borrow().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn panoramas(&self) -> Vec<Panorama> {
        self.tables.borrow().panoramas.clone()
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.tables.borrow().markers.clone()
    }

    pub fn links(&self) -> Vec<Link> {
        self.tables.borrow().links.clone()
    }

    pub fn unreadable_markers(&self) -> Vec<MarkerRow> {
        self.tables.borrow().unreadable_markers.clone()
    }

    pub fn unreadable_links(&self) -> Vec<LinkRow> {
        self.tables.borrow().unreadable_links.clone()
    }
}

fn split_rows<R, T>(rows: Vec<R>, what: &str) -> (Vec<T>, Vec<R>)
where
    R: Clone,
    T: TryFrom<R, Error = PanoError>,
{
    let mut usable = Vec::new();
    let mut unreadable = Vec::new();
    for row in rows {
        match T::try_from(row.clone()) {
            Ok(v) => usable.push(v),
            Err(e) => {
                log::warn!("[store] {} row kept but unreadable: {}", what, e);
                unreadable.push(row);
            }
        }
    }
    (usable, unreadable)
}

fn panorama_from(id: PanoramaId, d: &PanoramaDraft) -> Panorama {
    Panorama {
        id,
        site_id: d.site_id.clone(),
        title: d.title.clone(),
        description: d.description.clone(),
        image_url: d.image_url.clone(),
        thumbnail_url: d.thumbnail_url.clone(),
        is_active: d.is_active,
        initial_view: d.initial_view,
        floor_plan: d.floor_plan,
        geo: d.geo,
    }
}

fn marker_from(op: StoreOp, id: MarkerId, d: &MarkerDraft) -> StoreResult<Marker> {
    let panorama_id = d
        .panorama_id
        .clone()
        .ok_or_else(|| StoreError::new(op, "panorama_id is null"))?;
    Ok(Marker {
        id,
        panorama_id,
        kind: d.kind.clone(),
        position: d.position,
        title: d.title.clone(),
        content: d.content.clone(),
        icon_url: d.icon_url.clone(),
        model_url: d.model_url.clone(),
    })
}

fn link_from(op: StoreOp, id: LinkId, d: &LinkDraft) -> StoreResult<Link> {
    let source_id = d
        .source_id
        .clone()
        .ok_or_else(|| StoreError::new(op, "source_panorama_id is null"))?;
    let target_id = d
        .target_id
        .clone()
        .ok_or_else(|| StoreError::new(op, "target_panorama_id is null"))?;
    Ok(Link {
        id,
        source_id,
        target_id,
        position: d.position,
        target_heading_deg: d.target_heading_deg,
        label: d.label.clone(),
    })
}

fn not_found(op: StoreOp, id: &str) -> StoreError {
    StoreError::new(op, format!("no row with id {}", id))
}

impl PanoramaStore for MemoryStore {
    fn cascades_deletes(&self) -> bool {
        self.cascade
    }

    async fn fetch_panoramas(&self) -> StoreResult<Vec<Panorama>> {
        let mut t = self.tables.borrow_mut();
        t.enter(StoreOp::FetchPanoramas)?;
        Ok(t.panoramas.clone())
    }

    async fn fetch_markers(&self, panorama: &PanoramaId) -> StoreResult<Vec<Marker>> {
        let mut t = self.tables.borrow_mut();
        t.enter(StoreOp::FetchMarkers)?;
        Ok(t.markers
            .iter()
            .filter(|m| &m.panorama_id == panorama)
            .cloned()
            .collect())
    }

    async fn fetch_links(&self, source: &PanoramaId) -> StoreResult<Vec<Link>> {
        let mut t = self.tables.borrow_mut();
        t.enter(StoreOp::FetchLinks)?;
        Ok(t.links
            .iter()
            .filter(|l| &l.source_id == source)
            .cloned()
            .collect())
    }

    async fn fetch_dependents(&self, panorama: &PanoramaId) -> StoreResult<Dependents> {
        let mut t = self.tables.borrow_mut();
        t.enter(StoreOp::FetchDependents)?;
        let markers = t
            .markers
            .iter()
            .filter(|m| &m.panorama_id == panorama)
            .map(|m| m.id.clone())
            .chain(
                t.unreadable_markers
                    .iter()
                    .filter(|r| r.panorama_id == panorama.0)
                    .filter_map(|r| r.id.clone().map(MarkerId::from)),
            )
            .collect();
        let links = t
            .links
            .iter()
            .filter(|l| &l.source_id == panorama)
            .map(|l| l.id.clone())
            .chain(
                t.unreadable_links
                    .iter()
                    .filter(|r| r.source_panorama_id == panorama.0)
                    .filter_map(|r| r.id.clone().map(LinkId::from)),
            )
            .collect();
        Ok(Dependents { markers, links })
    }

    async fn insert_panorama(&self, draft: &PanoramaDraft) -> StoreResult<Panorama> {
        let mut t = self.tables.borrow_mut();
        t.enter(StoreOp::InsertPanorama)?;
        let id = t.fresh_id("pano");
        let p = panorama_from(id.into(), draft);
        t.panoramas.push(p.clone());
        Ok(p)
    }

    async fn update_panorama(
        &self,
        id: &PanoramaId,
        draft: &PanoramaDraft,
    ) -> StoreResult<Panorama> {
        let op = StoreOp::UpdatePanorama;
        let mut t = self.tables.borrow_mut();
        t.enter(op)?;
        let slot = t
            .panoramas
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| not_found(op, id.as_str()))?;
        *slot = panorama_from(id.clone(), draft);
        Ok(slot.clone())
    }

    async fn delete_panorama(&self, id: &PanoramaId) -> StoreResult<()> {
        let op = StoreOp::DeletePanorama;
        let mut t = self.tables.borrow_mut();
        t.enter(op)?;
        if !t.has_panorama(id) {
            return Err(not_found(op, id.as_str()));
        }
        t.panoramas.retain(|p| &p.id != id);
        if self.cascade {
            t.markers.retain(|m| &m.panorama_id != id);
            t.links.retain(|l| &l.source_id != id);
            t.unreadable_markers.retain(|r| r.panorama_id != id.0);
            t.unreadable_links.retain(|r| r.source_panorama_id != id.0);
        }
        Ok(())
    }

    async fn insert_marker(&self, draft: &MarkerDraft) -> StoreResult<Marker> {
        let op = StoreOp::InsertMarker;
        let mut t = self.tables.borrow_mut();
        t.enter(op)?;
        let id = t.fresh_id("marker");
        let m = marker_from(op, id.into(), draft)?;
        if !t.has_panorama(&m.panorama_id) {
            return Err(StoreError::new(op, "panorama_id violates foreign key"));
        }
        t.markers.push(m.clone());
        Ok(m)
    }

    async fn update_marker(&self, id: &MarkerId, draft: &MarkerDraft) -> StoreResult<Marker> {
        let op = StoreOp::UpdateMarker;
        let mut t = self.tables.borrow_mut();
        t.enter(op)?;
        let m = marker_from(op, id.clone(), draft)?;
        let slot = t
            .markers
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| not_found(op, id.as_str()))?;
        *slot = m.clone();
        Ok(m)
    }

    async fn delete_marker(&self, id: &MarkerId) -> StoreResult<()> {
        let op = StoreOp::DeleteMarker;
        let mut t = self.tables.borrow_mut();
        t.enter(op)?;
        let before = t.markers.len() + t.unreadable_markers.len();
        t.markers.retain(|m| &m.id != id);
        t.unreadable_markers
            .retain(|r| r.id.as_deref() != Some(id.as_str()));
        if t.markers.len() + t.unreadable_markers.len() == before {
            return Err(not_found(op, id.as_str()));
        }
        Ok(())
    }

    async fn insert_link(&self, draft: &LinkDraft) -> StoreResult<Link> {
        let op = StoreOp::InsertLink;
        let mut t = self.tables.borrow_mut();
        t.enter(op)?;
        let id = t.fresh_id("link");
        let l = link_from(op, id.into(), draft)?;
        if !t.has_panorama(&l.source_id) || !t.has_panorama(&l.target_id) {
            return Err(StoreError::new(op, "panorama reference violates foreign key"));
        }
        t.links.push(l.clone());
        Ok(l)
    }

    async fn update_link(&self, id: &LinkId, draft: &LinkDraft) -> StoreResult<Link> {
        let op = StoreOp::UpdateLink;
        let mut t = self.tables.borrow_mut();
        t.enter(op)?;
        let l = link_from(op, id.clone(), draft)?;
        if !t.has_panorama(&l.target_id) {
            return Err(StoreError::new(op, "target_panorama_id violates foreign key"));
        }
        let slot = t
            .links
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| not_found(op, id.as_str()))?;
        *slot = l.clone();
        Ok(l)
    }

    async fn delete_link(&self, id: &LinkId) -> StoreResult<()> {
        let op = StoreOp::DeleteLink;
        let mut t = self.tables.borrow_mut();
        t.enter(op)?;
        let before = t.links.len() + t.unreadable_links.len();
        t.links.retain(|l| &l.id != id);
        t.unreadable_links
            .retain(|r| r.id.as_deref() != Some(id.as_str()));
        if t.links.len() + t.unreadable_links.len() == before {
            return Err(not_found(op, id.as_str()));
        }
        Ok(())
    }
}
