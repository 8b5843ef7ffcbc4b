//! Image Tools - Decoding, Background Removal, Fit Resizing

use image::imageops::{self, FilterType};
use image::{ImageResult, RgbaImage};

/// Channel value above which a pixel counts as "near white".
pub const DEFAULT_WHITE_THRESHOLD: u8 = 240;

pub fn decode_rgba(bytes: &[u8]) -> ImageResult<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Make near-white pixels fully transparent. Meant for packshots shot on a
/// plain white sweep; anything else is left untouched.
pub fn remove_near_white_background(image: &RgbaImage, threshold: u8) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        if r > threshold && g > threshold && b > threshold {
            pixel.0[3] = 0;
        }
    }
    out
}

/// Shrink `image` to fit inside `max_w` x `max_h`, keeping its aspect ratio.
/// Images that already fit are returned unchanged.
pub fn resize_fit(image: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= max_w && h <= max_h {
        return image.clone();
    }
    let scale = f64::min(f64::from(max_w) / f64::from(w), f64::from(max_h) / f64::from(h));
    let new_w = ((f64::from(w) * scale).round() as u32).max(1);
    let new_h = ((f64::from(h) * scale).round() as u32).max(1);
    imageops::resize(image, new_w, new_h, FilterType::Lanczos3)
}
