//! Adapter from a host-page store object to [`PanoramaStore`].
//!
//! The page sets `window.panoStore` to an object with promise-returning
//! methods; every payload crosses the boundary as a JSON string in the store's
//! row shape (see `pano_core::record`).

use pano_core::record::{
    narrow_rows, row_from_json, row_ids, rows_from_json, LinkRow, MarkerRow, PanoramaRow,
};
use pano_core::store::{Dependents, StoreResult};
use pano_core::{
    Link, LinkDraft, LinkId, Marker, MarkerDraft, MarkerId, PanoError, Panorama, PanoramaDraft,
    PanoramaId, PanoramaStore, StoreError, StoreOp,
};
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

const PANORAMAS: &str = "panoramas";
const MARKERS: &str = "markers";
const LINKS: &str = "links";

#[wasm_bindgen]
extern "C" {
    pub type StoreBridge;

    #[wasm_bindgen(method, catch, js_name = fetchPanoramas)]
    fn fetch_panoramas(this: &StoreBridge) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = fetchMarkers)]
    fn fetch_markers(this: &StoreBridge, panorama_id: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch, js_name = fetchLinks)]
    fn fetch_links(this: &StoreBridge, source_id: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn insert(this: &StoreBridge, table: &str, json: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn update(
        this: &StoreBridge,
        table: &str,
        id: &str,
        json: &str,
    ) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn remove(this: &StoreBridge, table: &str, id: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn cascades(this: &StoreBridge) -> Option<bool>;
}

/// The bridge object from `window.panoStore`, when the page provides one.
pub fn find_bridge(window: &web_sys::Window) -> Option<StoreBridge> {
    let value = js_sys::Reflect::get(window, &JsValue::from_str("panoStore")).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    Some(value.unchecked_into::<StoreBridge>())
}

pub fn js_error_message(e: &JsValue) -> String {
    if let Some(err) = e.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

async fn settle(op: StoreOp, call: Result<js_sys::Promise, JsValue>) -> StoreResult<JsValue> {
    let promise = call.map_err(|e| StoreError::new(op, js_error_message(&e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| StoreError::new(op, js_error_message(&e)))
}

async fn settle_json(op: StoreOp, call: Result<js_sys::Promise, JsValue>) -> StoreResult<String> {
    settle(op, call)
        .await?
        .as_string()
        .ok_or_else(|| StoreError::new(op, "store did not return a JSON string"))
}

fn unusable(op: StoreOp) -> impl Fn(PanoError) -> StoreError {
    move |e| StoreError::new(op, e.to_string())
}

pub struct JsStore {
    bridge: StoreBridge,
}

impl JsStore {
    pub fn new(bridge: StoreBridge) -> Self {
        Self { bridge }
    }

    async fn fetch<R, T>(
        &self,
        op: StoreOp,
        what: &str,
        call: Result<js_sys::Promise, JsValue>,
    ) -> StoreResult<Vec<T>>
    where
        R: DeserializeOwned,
        T: TryFrom<R, Error = PanoError>,
    {
        let json = settle_json(op, call).await?;
        let rows: Vec<R> = rows_from_json(&json).map_err(unusable(op))?;
        Ok(narrow_rows(rows, what))
    }

    /// Row ids only; the rows are not narrowed, so unusable ones are kept.
    async fn ids(
        &self,
        op: StoreOp,
        call: Result<js_sys::Promise, JsValue>,
    ) -> StoreResult<Vec<String>> {
        let json = settle_json(op, call).await?;
        row_ids(&json).map_err(unusable(op))
    }

    /// Insert when `id` is `None`, else update; returns the stored row narrowed.
    async fn write<R, T>(&self, op: StoreOp, table: &str, id: Option<&str>, row: &R) -> StoreResult<T>
    where
        R: Serialize + DeserializeOwned,
        T: TryFrom<R, Error = PanoError>,
    {
        let payload = serde_json::to_string(row).map_err(|e| StoreError::new(op, e.to_string()))?;
        let call = match id {
            Some(id) => self.bridge.update(table, id, &payload),
            None => self.bridge.insert(table, &payload),
        };
        let json = settle_json(op, call).await?;
        let stored: R = row_from_json(&json).map_err(unusable(op))?;
        T::try_from(stored).map_err(unusable(op))
    }

    async fn delete(&self, op: StoreOp, table: &str, id: &str) -> StoreResult<()> {
        settle(op, self.bridge.remove(table, id)).await?;
        Ok(())
    }
}

impl PanoramaStore for JsStore {
    fn cascades_deletes(&self) -> bool {
        self.bridge.cascades().unwrap_or(false)
    }

    async fn fetch_panoramas(&self) -> StoreResult<Vec<Panorama>> {
        let call = self.bridge.fetch_panoramas();
        self.fetch::<PanoramaRow, _>(StoreOp::FetchPanoramas, "panorama", call)
            .await
    }

    async fn fetch_markers(&self, panorama: &PanoramaId) -> StoreResult<Vec<Marker>> {
        let call = self.bridge.fetch_markers(panorama.as_str());
        self.fetch::<MarkerRow, _>(StoreOp::FetchMarkers, "marker", call)
            .await
    }

    async fn fetch_links(&self, source: &PanoramaId) -> StoreResult<Vec<Link>> {
        let call = self.bridge.fetch_links(source.as_str());
        self.fetch::<LinkRow, _>(StoreOp::FetchLinks, "link", call).await
    }

    async fn fetch_dependents(&self, panorama: &PanoramaId) -> StoreResult<Dependents> {
        let op = StoreOp::FetchDependents;
        let markers = self
            .ids(op, self.bridge.fetch_markers(panorama.as_str()))
            .await?;
        let links = self
            .ids(op, self.bridge.fetch_links(panorama.as_str()))
            .await?;
        Ok(Dependents {
            markers: markers.into_iter().map(MarkerId::from).collect(),
            links: links.into_iter().map(LinkId::from).collect(),
        })
    }

    async fn insert_panorama(&self, draft: &PanoramaDraft) -> StoreResult<Panorama> {
        let row = PanoramaRow::from(draft);
        self.write(StoreOp::InsertPanorama, PANORAMAS, None, &row)
            .await
    }

    async fn update_panorama(
        &self,
        id: &PanoramaId,
        draft: &PanoramaDraft,
    ) -> StoreResult<Panorama> {
        let row = PanoramaRow::from(draft);
        self.write(StoreOp::UpdatePanorama, PANORAMAS, Some(id.as_str()), &row)
            .await
    }

    async fn delete_panorama(&self, id: &PanoramaId) -> StoreResult<()> {
        self.delete(StoreOp::DeletePanorama, PANORAMAS, id.as_str())
            .await
    }

    async fn insert_marker(&self, draft: &MarkerDraft) -> StoreResult<Marker> {
        let op = StoreOp::InsertMarker;
        let row = MarkerRow::try_from(draft).map_err(unusable(op))?;
        self.write(op, MARKERS, None, &row).await
    }

    async fn update_marker(&self, id: &MarkerId, draft: &MarkerDraft) -> StoreResult<Marker> {
        let op = StoreOp::UpdateMarker;
        let row = MarkerRow::try_from(draft).map_err(unusable(op))?;
        self.write(op, MARKERS, Some(id.as_str()), &row).await
    }

    async fn delete_marker(&self, id: &MarkerId) -> StoreResult<()> {
        self.delete(StoreOp::DeleteMarker, MARKERS, id.as_str())
            .await
    }

    async fn insert_link(&self, draft: &LinkDraft) -> StoreResult<Link> {
        let op = StoreOp::InsertLink;
        let row = LinkRow::try_from(draft).map_err(unusable(op))?;
        self.write(op, LINKS, None, &row).await
    }

    async fn update_link(&self, id: &LinkId, draft: &LinkDraft) -> StoreResult<Link> {
        let op = StoreOp::UpdateLink;
        let row = LinkRow::try_from(draft).map_err(unusable(op))?;
        self.write(op, LINKS, Some(id.as_str()), &row).await
    }

    async fn delete_link(&self, id: &LinkId) -> StoreResult<()> {
        self.delete(StoreOp::DeleteLink, LINKS, id.as_str()).await
    }
}
