//! Layout Composer - Deterministic Template Candidates
//!
//! Each call yields one candidate per template of the format's class:
//! landscape formats get side-by-side templates, all others stack
//! vertically. Templates inset content by at least [`MIN_TEMPLATE_MARGIN`]
//! per side regardless of how small the configured safe zone is.

use serde::{Deserialize, Serialize};

use crate::canvas::{Align, Canvas, Color, Element, ElementKind, Format, ImageBody, TextBody};
use crate::config::{BrandProfile, ConfigError};
use crate::geometry::{estimate_text_height, Rect};

pub const MIN_TEMPLATE_MARGIN: i32 = 50;
pub const PACKSHOT_GUTTER: i32 = 20;
pub const MAX_PACKSHOTS: usize = 3;

const BLOCK_GAP: i32 = 24;
const PANEL_GAP: i32 = 8;
/// How far a straddling value tile rises above the packshot row.
const VALUE_TILE_LIFT: i32 = 40;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInputs {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub subhead: Option<String>,
    #[serde(default)]
    pub value_text: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub packshots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub format: Format,
    #[serde(flatten)]
    pub content: ContentInputs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTemplate {
    LandscapeStandard,
    LandscapeInverted,
    VerticalStandard,
    VerticalCentered,
}

impl LayoutTemplate {
    pub fn for_format(format: Format) -> [LayoutTemplate; 2] {
        if format.is_landscape() {
            [LayoutTemplate::LandscapeStandard, LayoutTemplate::LandscapeInverted]
        } else {
            [LayoutTemplate::VerticalStandard, LayoutTemplate::VerticalCentered]
        }
    }
}

/// Produce the candidate canvases for `request`, in template order.
pub fn suggest_layouts(profile: &BrandProfile, request: &LayoutRequest) -> Result<Vec<Canvas>, ConfigError> {
    let spec = profile.format(request.format)?;
    let safe = spec
        .safe_zone
        .with_floor(MIN_TEMPLATE_MARGIN)
        .interior(spec.width, spec.height);

    let candidates = LayoutTemplate::for_format(request.format)
        .into_iter()
        .map(|template| {
            let mut composer = Composer::new(&request.content, safe);
            match template {
                LayoutTemplate::LandscapeStandard => composer.landscape(false),
                LayoutTemplate::LandscapeInverted => composer.landscape(true),
                LayoutTemplate::VerticalStandard => composer.vertical_standard(),
                LayoutTemplate::VerticalCentered => composer.vertical_centered(),
            }
            let mut canvas = Canvas::new(request.format, spec.width, spec.height);
            canvas.elements = composer.elements;
            canvas
        })
        .collect();

    Ok(candidates)
}

/// Lay up to three packshots out as equal columns of `group`.
pub fn arrange_packshots(refs: &[String], group: Rect, z_start: i32) -> Vec<Element> {
    let count = refs.len().min(MAX_PACKSHOTS);
    if count == 0 {
        return vec![];
    }
    let n = count as i32;
    let column = (group.width - (n - 1) * PACKSHOT_GUTTER) / n;

    refs.iter()
        .take(count)
        .enumerate()
        .map(|(i, src)| {
            let i = i as i32;
            Element::new(
                format!("packshot_{i}"),
                Rect::new(group.x + i * (column + PACKSHOT_GUTTER), group.y, column, group.height),
                z_start + i,
                ElementKind::Packshot(ImageBody::new(src.clone())),
            )
        })
        .collect()
}

/// Parse one externally generated layout suggestion.
///
/// Accepts a single canvas, a list of canvases, or `{"candidates": [...]}`.
pub fn parse_suggestion(raw: &str) -> Result<Vec<Canvas>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Suggestion {
        Wrapped { candidates: Vec<Canvas> },
        Many(Vec<Canvas>),
        One(Box<Canvas>),
    }

    Ok(match serde_json::from_str(raw)? {
        Suggestion::Wrapped { candidates } | Suggestion::Many(candidates) => candidates,
        Suggestion::One(canvas) => vec![*canvas],
    })
}

/// Append external suggestions after the deterministic candidates.
/// Anything that fails to parse is dropped.
pub fn merge_suggestions(mut candidates: Vec<Canvas>, raw: &[String]) -> Vec<Canvas> {
    for (i, suggestion) in raw.iter().enumerate() {
        match parse_suggestion(suggestion) {
            Ok(parsed) => candidates.extend(parsed),
            Err(e) => tracing::warn!(index = i, error = %e, "dropping malformed layout suggestion"),
        }
    }
    candidates
}

struct Composer<'a> {
    content: &'a ContentInputs,
    safe: Rect,
    next_z: i32,
    elements: Vec<Element>,
}

impl<'a> Composer<'a> {
    fn new(content: &'a ContentInputs, safe: Rect) -> Self {
        Self { content, safe, next_z: 1, elements: vec![] }
    }

    fn take_z(&mut self) -> i32 {
        let z = self.next_z;
        self.next_z += 1;
        z
    }

    fn push(&mut self, id: &str, bounds: Rect, kind: ElementKind) {
        let z = self.take_z();
        self.elements.push(Element::new(id, bounds, z, kind));
    }

    fn push_logo(&mut self, bounds: Rect) {
        let content = self.content;
        if let Some(logo) = &content.logo {
            self.push("logo", bounds, ElementKind::Logo(ImageBody::new(logo.clone())));
        }
    }

    fn push_packshots(&mut self, group: Rect) {
        let shots = arrange_packshots(&self.content.packshots, group, self.next_z);
        self.next_z += shots.len() as i32;
        self.elements.extend(shots);
    }

    fn packshot_count(&self) -> i32 {
        self.content.packshots.len().min(MAX_PACKSHOTS) as i32
    }

    /// Stack headline and subhead from `y` down, full width of `column`.
    /// Returns the y below the last block.
    fn push_headings(&mut self, column: Rect, mut y: i32, sizes: (u32, u32), gap: i32, panel: Option<Color>, align: Align) -> i32 {
        let content = self.content;
        let blocks = [
            ("headline", content.headline.as_ref(), sizes.0, true),
            ("subhead", content.subhead.as_ref(), sizes.1, false),
        ];
        for (id, text, size, bold) in blocks {
            let Some(text) = text else { continue };
            let height = estimate_text_height(text, size, column.width);
            let mut body = TextBody::new(text.clone(), size).aligned(align);
            if bold {
                body = body.bold();
            }
            if let Some(bg) = panel {
                body = body.on(bg);
            }
            self.push(id, Rect::new(column.x, y, column.width, height), ElementKind::Text(body));
            y += height + gap;
        }
        y
    }

    fn push_value_tile(&mut self, bounds: Rect, size: u32) {
        let content = self.content;
        if let Some(value) = &content.value_text {
            let body = TextBody::new(value.clone(), size).bold().colored(Color::WHITE).on(Color::BLACK);
            self.push("value", bounds, ElementKind::ValueTile(body));
        }
    }

    fn vertical_logo_size(&self) -> (i32, i32) {
        (200.min(self.safe.width), 120.min(self.safe.height / 6))
    }

    fn vertical_headings(&mut self, logo_h: i32) {
        let mut y = self.safe.y;
        if self.content.logo.is_some() {
            y += logo_h + BLOCK_GAP;
        }
        self.push_headings(self.safe, y, (64, 32), BLOCK_GAP, None, Align::Center);
    }

    /// Logo top-left, headings below, packshots bottom-right, value tile bottom-left.
    fn vertical_standard(&mut self) {
        let safe = self.safe;
        let (logo_w, logo_h) = self.vertical_logo_size();
        self.push_logo(Rect::new(safe.x, safe.y, logo_w, logo_h));
        self.vertical_headings(logo_h);

        let n = self.packshot_count();
        if n == 1 {
            let side = (safe.width * 55 / 100).min(safe.height * 40 / 100);
            self.push_packshots(Rect::new(safe.right() - side, safe.bottom() - side, side, side));
        } else if n > 1 {
            let column = (safe.width - (n - 1) * PACKSHOT_GUTTER) / n;
            let row_h = column.min(safe.height * 30 / 100);
            self.push_packshots(Rect::new(safe.x, safe.bottom() - row_h, safe.width, row_h));
        }

        let (tile_w, tile_h) = (320.min(safe.width), 120.min(safe.height / 4));
        self.push_value_tile(Rect::new(safe.x, safe.bottom() - tile_h, tile_w, tile_h), 48);
    }

    /// Everything centered; the value tile straddles the packshot row's top-right corner.
    fn vertical_centered(&mut self) {
        let safe = self.safe;
        let (logo_w, logo_h) = self.vertical_logo_size();
        self.push_logo(Rect::new(safe.x + (safe.width - logo_w) / 2, safe.y, logo_w, logo_h));
        self.vertical_headings(logo_h);

        let n = self.packshot_count();
        let row = (n > 0).then(|| {
            let tile = 240.min((safe.width - 2 * PACKSHOT_GUTTER) / 3).min(safe.height * 30 / 100);
            let row_w = n * tile + (n - 1) * PACKSHOT_GUTTER;
            Rect::new(safe.x + (safe.width - row_w) / 2, safe.bottom() - tile, row_w, tile)
        });
        if let Some(row) = row {
            self.push_packshots(row);
        }

        let (tile_w, tile_h) = (280.min(safe.width), 100.min(safe.height / 4));
        let tile = match row {
            Some(row) => Rect::new(
                (row.right() - tile_w).max(safe.x),
                (row.y - VALUE_TILE_LIFT).max(safe.y),
                tile_w,
                tile_h,
            ),
            None => Rect::new(safe.x + (safe.width - tile_w) / 2, safe.bottom() - tile_h, tile_w, tile_h),
        };
        self.push_value_tile(tile, 48);
    }

    /// Packshots in one half, a white text panel in the other.
    /// `inverted` puts text on the left and the logo top-left.
    fn landscape(&mut self, inverted: bool) {
        let safe = self.safe;
        let half = (safe.width - PACKSHOT_GUTTER) / 2;
        let left = Rect::new(safe.x, safe.y, half, safe.height);
        let right = Rect::new(
            safe.x + half + PACKSHOT_GUTTER,
            safe.y,
            safe.width - half - PACKSHOT_GUTTER,
            safe.height,
        );
        let (media, panel) = if inverted { (right, left) } else { (left, right) };

        let mut y = panel.y;
        if self.content.logo.is_some() {
            let (logo_w, logo_h) = (160.min(panel.width), 48.min(panel.height / 4));
            let x = if inverted { panel.x } else { panel.right() - logo_w };
            self.push_logo(Rect::new(x, y, logo_w, logo_h));
            y += logo_h + PANEL_GAP;
        }
        y = self.push_headings(panel, y, (48, 28), PANEL_GAP, Some(Color::WHITE), Align::Left);

        let content = self.content;
        if let Some(value) = &content.value_text {
            let tile_w = 280.min(panel.width);
            let tile_h = estimate_text_height(value, 36, tile_w);
            self.push_value_tile(Rect::new(panel.x, y, tile_w, tile_h), 36);
        }

        let n = self.packshot_count();
        if n > 0 {
            let tile = ((media.width - (n - 1) * PACKSHOT_GUTTER) / n).min(media.height);
            let group_w = n * tile + (n - 1) * PACKSHOT_GUTTER;
            self.push_packshots(Rect::new(
                media.x + (media.width - group_w) / 2,
                media.y + (media.height - tile) / 2,
                group_w,
                tile,
            ));
        }
    }
}
