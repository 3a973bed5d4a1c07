//! Fetching panorama images and marker models by URL.

use crate::bridge::js_error_message;
use crate::decode::{self, DecodedImage};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| format!("could not build request: {}", js_error_message(&e)))?;
    let window = web_sys::window().ok_or("no window")?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("fetch failed: {}", js_error_message(&e)))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| "fetch did not return a Response".to_string())?;
    if !resp.ok() {
        return Err(format!("HTTP error: {}", resp.status()));
    }
    let buffer = JsFuture::from(
        resp.array_buffer()
            .map_err(|e| format!("could not read body: {}", js_error_message(&e)))?,
    )
    .await
    .map_err(|e| format!("could not read body: {}", js_error_message(&e)))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Fetch and decode an equirectangular image, scaled to `max_dim`.
pub async fn load_panorama(url: &str, max_dim: u32) -> Result<DecodedImage, String> {
    if url.trim().is_empty() {
        return Err("panorama has no image URL".into());
    }
    let bytes = fetch_bytes(url).await?;
    log::info!("[scene] fetched {} ({} bytes)", url, bytes.len());
    decode::decode_panorama(&bytes, max_dim).map_err(|e| e.to_string())
}

/// Fetch a marker's model so a broken URL is reported before anything is
/// shown; the element that displays it then loads from the HTTP cache.
pub async fn load_model(url: &str) -> Result<(), String> {
    let bytes = fetch_bytes(url).await?;
    if !decode::looks_like_model(&bytes) {
        return Err(format!("{url} is not a glTF model"));
    }
    Ok(())
}
