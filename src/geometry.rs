//! Geometry Primitives - Rects, Margins, Text Estimates

use serde::{Deserialize, Serialize};

/// Axis-aligned integer rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Saturates at `i32::MAX` for rects that run off the coordinate space.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Safe-zone inset per side, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Margins {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Margins {
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self { top, right, bottom, left }
    }

    pub const fn uniform(inset: i32) -> Self {
        Self::new(inset, inset, inset, inset)
    }

    /// Raise every side to at least `floor`.
    pub fn with_floor(&self, floor: i32) -> Self {
        Self {
            top: self.top.max(floor),
            right: self.right.max(floor),
            bottom: self.bottom.max(floor),
            left: self.left.max(floor),
        }
    }

    /// The interior rectangle left after insetting a `width` x `height` canvas.
    pub fn interior(&self, width: i32, height: i32) -> Rect {
        Rect {
            x: self.left,
            y: self.top,
            width: width - self.left - self.right,
            height: height - self.top - self.bottom,
        }
    }
}

/// True if `rect` reaches into any of the four margin bands of the canvas,
/// i.e. it is not contained in the interior `[l, w-r) x [t, h-b)`.
pub fn intersects_margin(rect: &Rect, canvas_w: i32, canvas_h: i32, margins: &Margins) -> bool {
    let right = i64::from(rect.x) + i64::from(rect.width);
    let bottom = i64::from(rect.y) + i64::from(rect.height);
    rect.x < margins.left
        || rect.y < margins.top
        || right > i64::from(canvas_w) - i64::from(margins.right)
        || bottom > i64::from(canvas_h) - i64::from(margins.bottom)
}

/// Average glyph advance as a fraction of the font size.
pub const GLYPH_WIDTH_FACTOR: f64 = 0.5;
/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.3;

/// Heuristic height of `text` wrapped into a box `width` pixels wide.
///
/// This is not text shaping: every glyph is assumed to be half an em wide and
/// every line 1.3 em tall. Layout templates are tuned against these constants.
pub fn estimate_text_height(text: &str, font_size: u32, width: i32) -> i32 {
    let glyph_width = f64::from(font_size) * GLYPH_WIDTH_FACTOR;
    let chars_per_line = if glyph_width > 0.0 {
        ((f64::from(width) / glyph_width).floor() as usize).max(1)
    } else {
        1
    };
    let lines = text.chars().count() / chars_per_line + 1;
    (lines as f64 * f64::from(font_size) * LINE_HEIGHT_FACTOR).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_MARGINS: Margins = Margins::uniform(150);

    #[test]
    fn test_interior_rect_is_clear() {
        let inside = Rect::new(150, 150, 780, 780);
        assert!(!intersects_margin(&inside, 1080, 1080, &SQUARE_MARGINS));
    }

    #[test]
    fn test_each_band_detected() {
        let cases = [
            Rect::new(149, 500, 10, 10),
            Rect::new(500, 149, 10, 10),
            Rect::new(921, 500, 10, 10),
            Rect::new(500, 921, 10, 10),
        ];
        for rect in cases {
            assert!(intersects_margin(&rect, 1080, 1080, &SQUARE_MARGINS), "{:?}", rect);
        }
    }

    #[test]
    fn test_matches_interior_complement() {
        let margins = Margins::new(250, 50, 250, 50);
        let interior = margins.interior(1080, 1920);
        for x in (0..1080).step_by(97) {
            for y in (0..1920).step_by(131) {
                for (w, h) in [(1, 1), (40, 300), (600, 20)] {
                    let rect = Rect::new(x, y, w, h);
                    assert_eq!(
                        intersects_margin(&rect, 1080, 1920, &margins),
                        !interior.contains(&rect),
                        "{:?}",
                        rect
                    );
                }
            }
        }
    }

    #[test]
    fn test_extreme_bounds_do_not_wrap() {
        let far_right = Rect::new(i32::MAX - 10, 200, 100, 10);
        assert_eq!(far_right.right(), i32::MAX);
        assert!(intersects_margin(&far_right, 1080, 1080, &SQUARE_MARGINS));

        let far_down = Rect::new(200, 2_147_483_000, 10, 1000);
        assert!(intersects_margin(&far_down, 1080, 1080, &SQUARE_MARGINS));

        let negative = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert!(intersects_margin(&negative, 1080, 1080, &SQUARE_MARGINS));
        assert!(!Rect::new(0, 0, 1080, 1080).contains(&far_right));
    }

    #[test]
    fn test_margin_floor() {
        let floored = Margins::new(250, 10, 0, 50).with_floor(50);
        assert_eq!(floored, Margins::new(250, 50, 50, 50));
    }

    #[test]
    fn test_text_height_single_line() {
        // 780 / 32 = 24 chars per line, "Hello" fits on one line
        assert_eq!(estimate_text_height("Hello", 64, 780), 83);
    }

    #[test]
    fn test_text_height_wraps() {
        // 10 chars per line at 20px in a 100px box, 25 chars -> 3 lines
        let text = "a".repeat(25);
        assert_eq!(estimate_text_height(&text, 20, 100), 78);
    }

    #[test]
    fn test_text_height_narrow_box() {
        assert_eq!(estimate_text_height("abc", 48, 1), 250);
    }
}
