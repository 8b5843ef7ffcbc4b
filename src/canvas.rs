//! Canvas Model - Creatives as Typed Element Lists
//!
//! The JSON shape mirrors the persisted project format: every element carries
//! a `type` discriminator next to its common `id`/`bounds`/`z` fields.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::geometry::Rect;

/// Target output shape. Dimensions and safe zones live in the brand profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Format {
    FbStory,
    IgStory,
    Square,
    Landscape,
    Checkout,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::FbStory,
        Format::IgStory,
        Format::Square,
        Format::Landscape,
        Format::Checkout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::FbStory => "FB_STORY",
            Format::IgStory => "IG_STORY",
            Format::Square => "SQUARE",
            Format::Landscape => "LANDSCAPE",
            Format::Checkout => "CHECKOUT",
        }
    }

    /// Landscape gets side-by-side templates, everything else stacks vertically.
    pub fn is_landscape(&self) -> bool {
        matches!(self, Format::Landscape)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    #[serde(default)]
    pub r: u8,
    #[serde(default)]
    pub g: u8,
    #[serde(default)]
    pub b: u8,
    #[serde(default = "default_alpha", alias = "alpha")]
    pub a: f64,
}

fn default_alpha() -> f64 { 1.0 }

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgb_triple(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// RGBA bytes with alpha clamped into [0, 255].
    pub fn to_rgba8(&self) -> [u8; 4] {
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        [self.r, self.g, self.b, alpha]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

/// Payload shared by `text` and `value_tile` elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBody {
    pub text: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    pub font_size: u32,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub background: Option<Color>,
}

fn default_font_family() -> String { "Arial".to_string() }

impl TextBody {
    pub fn new(text: impl Into<String>, font_size: u32) -> Self {
        Self {
            text: text.into(),
            font_family: default_font_family(),
            font_size,
            font_weight: FontWeight::Normal,
            color: Color::BLACK,
            align: Align::Center,
            background: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = FontWeight::Bold;
        self
    }

    pub fn colored(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn on(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Payload shared by `image`, `logo` and `packshot` elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBody {
    pub src: String,
    #[serde(default = "default_true")]
    pub keep_aspect: bool,
}

fn default_true() -> bool { true }

impl ImageBody {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into(), keep_aspect: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Text(TextBody),
    ValueTile(TextBody),
    Image(ImageBody),
    Logo(ImageBody),
    Packshot(ImageBody),
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Text(_) => "text",
            ElementKind::ValueTile(_) => "value_tile",
            ElementKind::Image(_) => "image",
            ElementKind::Logo(_) => "logo",
            ElementKind::Packshot(_) => "packshot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub bounds: Rect,
    #[serde(default)]
    pub z: i32,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    pub fn new(id: impl Into<String>, bounds: Rect, z: i32, kind: ElementKind) -> Self {
        Self { id: id.into(), bounds, z, kind }
    }

    pub fn text(&self) -> Option<&TextBody> {
        match &self.kind {
            ElementKind::Text(body) | ElementKind::ValueTile(body) => Some(body),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextBody> {
        match &mut self.kind {
            ElementKind::Text(body) | ElementKind::ValueTile(body) => Some(body),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&ImageBody> {
        match &self.kind {
            ElementKind::Image(body) | ElementKind::Logo(body) | ElementKind::Packshot(body) => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn is_packshot(&self) -> bool {
        matches!(self.kind, ElementKind::Packshot(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub format: Format,
    pub width: i32,
    pub height: i32,
    #[serde(default = "default_background")]
    pub background_color: Option<Color>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

fn default_background() -> Option<Color> { Some(Color::WHITE) }

impl Canvas {
    pub fn new(format: Format, width: i32, height: i32) -> Self {
        Self {
            format,
            width,
            height,
            background_color: default_background(),
            background_image: None,
            elements: vec![],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn packshot_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_packshot()).count()
    }

    /// Elements in paint order: ascending `z`, insertion order among equals.
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.z);
        ordered
    }

    /// First element id that occurs more than once, if any.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.elements
            .iter()
            .find(|e| !seen.insert(e.id.as_str()))
            .map(|e| e.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::canonical_json;

    fn sample_canvas() -> Canvas {
        let mut canvas = Canvas::new(Format::Square, 1080, 1080);
        canvas.background_image = Some("bg.png".to_string());
        canvas.elements.push(Element::new(
            "headline",
            Rect::new(150, 200, 780, 90),
            2,
            ElementKind::Text(TextBody::new("Summer range", 64).bold()),
        ));
        canvas.elements.push(Element::new(
            "value",
            Rect::new(150, 800, 320, 120),
            3,
            ElementKind::ValueTile(
                TextBody::new("Only at Tesco", 48).colored(Color::WHITE).on(Color::BLACK),
            ),
        ));
        canvas.elements.push(Element::new(
            "packshot_0",
            Rect::new(600, 600, 300, 300),
            1,
            ElementKind::Packshot(ImageBody::new("assets/can.png")),
        ));
        canvas
    }

    #[test]
    fn test_json_round_trip() {
        let canvas = sample_canvas();
        let json = canvas.to_json().unwrap();
        let back = Canvas::from_json(&json).unwrap();
        assert_eq!(back, canvas);
        assert_eq!(canonical_json(&back).unwrap(), canonical_json(&canvas).unwrap());
    }

    #[test]
    fn test_element_type_discriminator() {
        let canvas = sample_canvas();
        let value = serde_json::to_value(&canvas).unwrap();
        let types: Vec<_> = value["elements"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(types, ["text", "value_tile", "packshot"]);
        assert_eq!(value["format"], "SQUARE");
        assert_eq!(value["elements"][0]["bounds"]["width"], 780);
    }

    #[test]
    fn test_defaults_from_minimal_json() {
        let json = r#"{
            "format": "FB_STORY", "width": 1080, "height": 1920,
            "elements": [
                {"id": "t", "type": "text", "bounds": {"x": 0, "y": 0, "width": 10, "height": 10},
                 "text": "hi", "font_size": 20, "color": {"r": 10, "g": 20, "b": 30, "alpha": 0.5}},
                {"id": "l", "type": "logo", "bounds": {"x": 0, "y": 0, "width": 10, "height": 10},
                 "src": "logo.png"}
            ]
        }"#;
        let canvas = Canvas::from_json(json).unwrap();
        assert_eq!(canvas.background_color, Some(Color::WHITE));
        let text = canvas.elements[0].text().unwrap();
        assert_eq!(text.font_family, "Arial");
        assert_eq!(text.align, Align::Center);
        assert_eq!(text.color.a, 0.5);
        assert_eq!(canvas.elements[0].z, 0);
        assert!(canvas.elements[1].image().unwrap().keep_aspect);
    }

    #[test]
    fn test_unknown_element_type_rejected() {
        let json = r#"{"format": "SQUARE", "width": 1080, "height": 1080, "elements": [
            {"id": "x", "type": "video", "bounds": {"x": 0, "y": 0, "width": 1, "height": 1}}
        ]}"#;
        assert!(Canvas::from_json(json).is_err());
    }

    #[test]
    fn test_paint_order_is_stable() {
        let mut canvas = Canvas::new(Format::Square, 1080, 1080);
        for (id, z) in [("a", 2), ("b", 1), ("c", 2), ("d", 1)] {
            canvas.elements.push(Element::new(
                id,
                Rect::new(0, 0, 1, 1),
                z,
                ElementKind::Image(ImageBody::new("x.png")),
            ));
        }
        let ids: Vec<_> = canvas.paint_order().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "d", "a", "c"]);
    }

    #[test]
    fn test_duplicate_id_detected() {
        let mut canvas = sample_canvas();
        assert_eq!(canvas.duplicate_id(), None);
        let dup = canvas.elements[0].clone();
        canvas.elements.push(dup);
        assert_eq!(canvas.duplicate_id(), Some("headline"));
    }
}
