//! Renderer - Canvas to Pixels
//!
//! Paints the background, then every element in ascending `z` (insertion
//! order among equals). An element whose source cannot be resolved or decoded
//! is skipped; only encoding and output I/O can fail a render.

use image::imageops::{self, FilterType};
use image::{ImageEncoder, Pixel, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::assets::AssetResolver;
use crate::canvas::{Align, Canvas, Color, Element, Format, ImageBody, TextBody};
use crate::fonts::{FontProvider, TextStyle};
use crate::geometry::Rect;
use crate::imaging::decode_rgba;

pub const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid canvas size {0}x{1}")]
    InvalidSize(i32, i32),

    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpg => "image/jpeg",
        }
    }
}

/// Deterministic artifact file name for a format/encoding pair.
pub fn artifact_name(format: Format, output: OutputFormat) -> String {
    format!("export_{}.{}", format, output.extension())
}

pub struct Renderer<'a> {
    assets: &'a dyn AssetResolver,
    fonts: &'a dyn FontProvider,
}

impl<'a> Renderer<'a> {
    pub fn new(assets: &'a dyn AssetResolver, fonts: &'a dyn FontProvider) -> Self {
        Self { assets, fonts }
    }

    /// Composite `canvas` into an RGBA bitmap.
    pub fn compose(&self, canvas: &Canvas) -> Result<RgbaImage, RenderError> {
        if canvas.width <= 0 || canvas.height <= 0 {
            return Err(RenderError::InvalidSize(canvas.width, canvas.height));
        }
        let (w, h) = (canvas.width as u32, canvas.height as u32);
        let mut img = RgbaImage::new(w, h);

        if let Some(bg) = &canvas.background_color {
            fill_rect(&mut img, &Rect::new(0, 0, canvas.width, canvas.height), bg);
        }
        if let Some(src) = &canvas.background_image {
            if let Some(bitmap) = self.load_bitmap("background", src) {
                let scaled = imageops::resize(&bitmap, w, h, FilterType::Lanczos3);
                imageops::overlay(&mut img, &scaled, 0, 0);
            }
        }

        for el in canvas.paint_order() {
            if let Some(body) = el.text() {
                self.draw_text(&mut img, el, body);
            } else if let Some(body) = el.image() {
                self.draw_image(&mut img, el, body);
            }
        }
        Ok(img)
    }

    pub fn render(&self, canvas: &Canvas, output: OutputFormat) -> Result<Vec<u8>, RenderError> {
        let img = self.compose(canvas)?;
        encode(&img, output)
    }

    fn load_bitmap(&self, id: &str, src: &str) -> Option<RgbaImage> {
        let Some(bytes) = self.assets.resolve(src) else {
            tracing::warn!(id, src, "image source not found, skipping");
            return None;
        };
        match decode_rgba(&bytes) {
            Ok(bitmap) => Some(bitmap),
            Err(e) => {
                tracing::warn!(id, src, error = %e, "image source unreadable, skipping");
                None
            }
        }
    }

    /// Stretch to the exact bounds box; `keep_aspect` is not honoured here.
    fn draw_image(&self, img: &mut RgbaImage, el: &Element, body: &ImageBody) {
        let b = &el.bounds;
        let (x, y) = (i64::from(b.x), i64::from(b.y));
        let off_canvas = x >= i64::from(img.width())
            || y >= i64::from(img.height())
            || x + i64::from(b.width) <= 0
            || y + i64::from(b.height) <= 0;
        if b.width <= 0 || b.height <= 0 || off_canvas {
            return;
        }
        if let Some(bitmap) = self.load_bitmap(&el.id, &body.src) {
            let scaled = imageops::resize(&bitmap, b.width as u32, b.height as u32, FilterType::Lanczos3);
            imageops::overlay(img, &scaled, x, y);
        }
    }

    fn draw_text(&self, img: &mut RgbaImage, el: &Element, body: &TextBody) {
        let b = &el.bounds;
        if let Some(bg) = &body.background {
            fill_rect(img, b, bg);
        }
        if body.text.is_empty() {
            return;
        }

        let style = TextStyle {
            family: &body.font_family,
            size: body.font_size,
            weight: body.font_weight,
            color: body.color,
        };
        let (tw, th) = self.fonts.measure(&body.text, &style);
        let (tw, th) = (i64::from(tw), i64::from(th));
        let (bx, by, bw, bh) = (i64::from(b.x), i64::from(b.y), i64::from(b.width), i64::from(b.height));

        let x = match body.align {
            Align::Left => bx,
            Align::Center => bx + (bw - tw) / 2,
            Align::Right => bx + bw - tw,
        };
        let y = by + (bh - th) / 2;

        if let Some(glyphs) = self.fonts.rasterize(&body.text, &style) {
            imageops::overlay(img, &glyphs, x, y);
        }
    }
}

/// Alpha-blend `color` over `rect`, clipped to the image.
fn fill_rect(img: &mut RgbaImage, rect: &Rect, color: &Color) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let x0 = i64::from(rect.x).clamp(0, w);
    let y0 = i64::from(rect.y).clamp(0, h);
    let x1 = (i64::from(rect.x) + i64::from(rect.width)).clamp(0, w);
    let y1 = (i64::from(rect.y) + i64::from(rect.height)).clamp(0, h);
    let paint = Rgba(color.to_rgba8());

    for y in y0..y1 {
        for x in x0..x1 {
            img.get_pixel_mut(x as u32, y as u32).blend(&paint);
        }
    }
}

/// Encode a composed bitmap. JPEG output is flattened onto white.
pub fn encode(img: &RgbaImage, output: OutputFormat) -> Result<Vec<u8>, RenderError> {
    let mut buf = Vec::new();
    match output {
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        }
        OutputFormat::Jpg => {
            let mut flat = RgbaImage::from_pixel(img.width(), img.height(), Rgba([255, 255, 255, 255]));
            imageops::overlay(&mut flat, img, 0, 0);
            let rgb: Vec<u8> = flat.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();

            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
            encoder.write_image(&rgb, img.width(), img.height(), image::ExtendedColorType::Rgb8)?;
        }
    }
    Ok(buf)
}

/// Write `bytes` to `dir/name` atomically: a temp file in `dir` is persisted
/// over the destination only once fully written.
pub fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, RenderError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| RenderError::Io { path, source }
    };
    let dest = dir.join(name);

    fs::create_dir_all(dir).map_err(io_err(dir))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err(dir))?;
    tmp.write_all(bytes).map_err(io_err(tmp.path()))?;
    tmp.flush().map_err(io_err(tmp.path()))?;
    tmp.persist(&dest).map_err(|e| RenderError::Io { path: dest.clone(), source: e.error })?;
    Ok(dest)
}
