//! Font Providers - Glyph Metrics and Text Rasterization
//!
//! The renderer never looks fonts up itself. It is handed a [`FontProvider`]:
//! [`SystemFont`] rasterizes through usvg/resvg with the host's fonts and
//! falls back to [`BlockFont`], a deterministic built-in face that tests use
//! directly.

use image::{Rgba, RgbaImage};
use std::fmt::Write;
use std::sync::Arc;

use crate::canvas::{Color, FontWeight};

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle<'a> {
    pub family: &'a str,
    pub size: u32,
    pub weight: FontWeight,
    pub color: Color,
}

pub trait FontProvider: Send + Sync {
    /// Width and height in pixels of `text` set in `style`.
    fn measure(&self, text: &str, style: &TextStyle<'_>) -> (u32, u32);

    /// `text` drawn onto a transparent bitmap of exactly [`measure`](Self::measure) size.
    fn rasterize(&self, text: &str, style: &TextStyle<'_>) -> Option<RgbaImage>;
}

/// Built-in face: every non-space glyph is a solid box half an em wide.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockFont;

impl BlockFont {
    fn advance(size: u32) -> u32 {
        (size / 2).max(1)
    }
}

impl FontProvider for BlockFont {
    fn measure(&self, text: &str, style: &TextStyle<'_>) -> (u32, u32) {
        let glyphs = text.chars().count() as u32;
        (glyphs * Self::advance(style.size), style.size)
    }

    fn rasterize(&self, text: &str, style: &TextStyle<'_>) -> Option<RgbaImage> {
        let (width, height) = self.measure(text, style);
        if width == 0 || height == 0 {
            return None;
        }
        let advance = Self::advance(style.size);
        // leave a 1/8 em inset so adjacent glyphs stay distinct
        let inset = (advance / 8).max(if advance > 2 { 1 } else { 0 });
        let stroke = match style.weight {
            FontWeight::Bold => 0,
            FontWeight::Normal => inset,
        };
        let ink = Rgba(style.color.to_rgba8());

        let mut bitmap = RgbaImage::new(width, height);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x0 = i as u32 * advance + inset;
            let x1 = (i as u32 + 1) * advance - inset;
            for x in x0..x1.max(x0) {
                for y in (height / 5 + stroke)..height.saturating_sub(height / 10) {
                    bitmap.put_pixel(x, y, ink);
                }
            }
        }
        Some(bitmap)
    }
}

/// Host fonts through usvg text layout, with [`BlockFont`] as fallback.
pub struct SystemFont {
    fontdb: Arc<usvg::fontdb::Database>,
    fallback: BlockFont,
}

impl SystemFont {
    /// Load the host's installed fonts. With none installed every call falls back.
    pub fn load() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");

        Self { fontdb: Arc::new(db), fallback: BlockFont }
    }

    fn has_fonts(&self) -> bool {
        self.fontdb.len() > 0
    }

    fn line_height(size: u32) -> u32 {
        size + size / 4
    }

    fn svg(text: &str, style: &TextStyle<'_>, width: u32) -> String {
        let weight = match style.weight {
            FontWeight::Normal => "normal",
            FontWeight::Bold => "bold",
        };
        let c = &style.color;
        let mut svg = String::with_capacity(256);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{h}\">\
             <text x=\"0\" y=\"{baseline}\" font-family=\"{family}, sans-serif\" font-size=\"{size}\" \
             font-weight=\"{weight}\" fill=\"rgb({r},{g},{b})\" fill-opacity=\"{a}\" xml:space=\"preserve\">{body}</text></svg>",
            h = Self::line_height(style.size),
            baseline = style.size,
            family = escape_xml(style.family),
            size = style.size,
            r = c.r,
            g = c.g,
            b = c.b,
            a = c.a.clamp(0.0, 1.0),
            body = escape_xml(text),
        );
        svg
    }

    fn layout(&self, text: &str, style: &TextStyle<'_>, width: u32) -> Option<usvg::Tree> {
        if !self.has_fonts() || text.trim().is_empty() {
            return None;
        }
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&Self::svg(text, style, width.max(1)), &options).ok()?;
        tree.root().has_children().then_some(tree)
    }
}

impl FontProvider for SystemFont {
    fn measure(&self, text: &str, style: &TextStyle<'_>) -> (u32, u32) {
        // lay out on a generous sheet, then read the ink extent back
        let sheet = style.size.saturating_mul(text.chars().count() as u32 + 1);
        match self.layout(text, style, sheet) {
            Some(tree) => {
                let right = tree.root().abs_bounding_box().right().ceil().max(0.0) as u32;
                (right, Self::line_height(style.size))
            }
            None => self.fallback.measure(text, style),
        }
    }

    fn rasterize(&self, text: &str, style: &TextStyle<'_>) -> Option<RgbaImage> {
        let (width, height) = self.measure(text, style);
        let Some(tree) = self.layout(text, style, width) else {
            return self.fallback.rasterize(text, style);
        };
        let mut pixmap = tiny_skia::Pixmap::new(width.max(1), height.max(1))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let mut bitmap = RgbaImage::new(pixmap.width(), pixmap.height());
        for (dst, src) in bitmap.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Some(bitmap)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
