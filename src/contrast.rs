//! Contrast - WCAG 2.0 Luminance and Ratios

/// Font size (px) from which text counts as "large" for WCAG purposes.
pub const LARGE_TEXT_MIN_SIZE: u32 = 24;

pub const AA_NORMAL_RATIO: f64 = 4.5;
pub const AA_LARGE_RATIO: f64 = 3.0;

fn linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance of an sRGB triple, in [0, 1].
pub fn relative_luminance(rgb: [u8; 3]) -> f64 {
    0.2126 * linearize(rgb[0]) + 0.7152 * linearize(rgb[1]) + 0.0722 * linearize(rgb[2])
}

/// Contrast ratio between two colors, in [1, 21]. Symmetric.
pub fn contrast_ratio(fg: [u8; 3], bg: [u8; 3]) -> f64 {
    let l1 = relative_luminance(fg);
    let l2 = relative_luminance(bg);
    let (lighter, darker) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

/// WCAG AA check: 3.0 for large text, 4.5 otherwise.
pub fn passes_aa(fg: [u8; 3], bg: [u8; 3], is_large_text: bool) -> bool {
    let threshold = if is_large_text { AA_LARGE_RATIO } else { AA_NORMAL_RATIO };
    contrast_ratio(fg, bg) >= threshold
}

pub fn is_large_text(font_size: u32) -> bool {
    font_size >= LARGE_TEXT_MIN_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: [u8; 3] = [0, 0, 0];
    const WHITE: [u8; 3] = [255, 255, 255];

    #[test]
    fn test_black_white_extremes() {
        assert_eq!(relative_luminance(BLACK), 0.0);
        assert!((relative_luminance(WHITE) - 1.0).abs() < 1e-12);
        assert!((contrast_ratio(BLACK, WHITE) - 21.0).abs() < 1e-9);
        assert!(passes_aa(BLACK, WHITE, false));
    }

    #[test]
    fn test_ratio_symmetric_and_identity() {
        let samples = [[12, 200, 45], [255, 0, 0], [119, 119, 119], [250, 250, 240]];
        for a in samples {
            assert_eq!(contrast_ratio(a, a), 1.0);
            for b in samples {
                assert_eq!(contrast_ratio(a, b), contrast_ratio(b, a));
            }
        }
    }

    #[test]
    fn test_grey_119_boundary() {
        // #777777 on white sits right at the 4.5 line (~4.48)
        let ratio = contrast_ratio([119, 119, 119], WHITE);
        assert!((ratio - 4.48).abs() < 0.01, "ratio = {ratio}");
        assert!(!passes_aa([119, 119, 119], WHITE, false));
        assert!(passes_aa([119, 119, 119], WHITE, true));
        // one step darker clears the normal threshold
        assert!(passes_aa([118, 118, 118], WHITE, false));
    }

    #[test]
    fn test_large_text_threshold() {
        assert!(!is_large_text(23));
        assert!(is_large_text(24));
    }
}
