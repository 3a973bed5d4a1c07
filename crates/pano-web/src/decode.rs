// Panorama image decoding. Pure so it runs in host tests; the GPU upload
// lives in render.rs.

use image::imageops::FilterType;

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub rgba: Vec<u8>,
}

/// Size after scaling `(w, h)` down so neither side exceeds `max`, keeping
/// the aspect ratio. Never upscales and never returns a zero side.
pub fn fit_within(w: u32, h: u32, max: u32) -> (u32, u32) {
    let max = max.max(1);
    if w <= max && h <= max {
        return (w.max(1), h.max(1));
    }
    let scale = max as f64 / w.max(h) as f64;
    let nw = ((w as f64 * scale).round() as u32).clamp(1, max);
    let nh = ((h as f64 * scale).round() as u32).clamp(1, max);
    (nw, nh)
}

/// Decode JPEG/PNG/WebP bytes into RGBA8, downscaled to fit the device's
/// texture limit.
pub fn decode_panorama(bytes: &[u8], max_dim: u32) -> anyhow::Result<DecodedImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| anyhow::anyhow!("could not decode panorama image: {e}"))?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let (nw, nh) = fit_within(w, h, max_dim);
    let rgba = if (nw, nh) != (w, h) {
        log::info!("[scene] downscaling panorama {}x{} -> {}x{}", w, h, nw, nh);
        image::imageops::resize(&rgba, nw, nh, FilterType::Triangle)
    } else {
        rgba
    };
    Ok(DecodedImage {
        width: nw,
        height: nh,
        rgba: rgba.into_raw(),
    })
}

/// Cheap sanity check on a fetched model: binary glTF starts with the
/// `glTF` magic, text glTF is a JSON object.
pub fn looks_like_model(bytes: &[u8]) -> bool {
    if bytes.starts_with(b"glTF") {
        return true;
    }
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}
