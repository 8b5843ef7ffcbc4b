//! Autofix Interpreter - Applies Issue Directives to a Canvas Copy
//!
//! Directives are applied in issue order; a later directive on the same
//! element field overwrites an earlier one. The result is not re-checked.

use serde::Serialize;

use crate::canvas::{Canvas, Color};
use crate::compliance::{Autofix, ComplianceIssue};

/// Result of one interpreter pass.
#[derive(Debug, Clone, Serialize)]
pub struct AutofixOutcome {
    pub canvas: Canvas,
    /// Directives that were recognized (including ones that found no target).
    pub applied: usize,
    /// Directives skipped because their action is not understood.
    pub skipped: usize,
}

/// Apply every issue's directive to an independent copy of `canvas`.
pub fn apply_autofixes(canvas: &Canvas, issues: &[ComplianceIssue]) -> Canvas {
    interpret(canvas, issues).canvas
}

/// Like [`apply_autofixes`], also reporting how many directives were skipped.
pub fn interpret(canvas: &Canvas, issues: &[ComplianceIssue]) -> AutofixOutcome {
    let mut updated = canvas.clone();
    let mut applied = 0;
    let mut skipped = 0;

    for issue in issues {
        let Some(fix) = &issue.autofix else { continue };
        if apply_one(&mut updated, fix) {
            applied += 1;
        } else {
            skipped += 1;
            tracing::warn!(code = %issue.code, "skipping unsupported autofix directive");
        }
    }

    AutofixOutcome { canvas: updated, applied, skipped }
}

/// Returns false only for directives the interpreter does not understand.
fn apply_one(canvas: &mut Canvas, fix: &Autofix) -> bool {
    match fix {
        Autofix::NudgeInside { id, min_x, min_y, max_x, max_y } => {
            if let Some(el) = canvas.element_mut(id) {
                // clamp, not translate: min wins when the range is empty
                el.bounds.x = el.bounds.x.min(*max_x).max(*min_x);
                el.bounds.y = el.bounds.y.min(*max_y).max(*min_y);
            }
        }
        Autofix::SetFontSize { id, size } => {
            if let Some(body) = canvas.element_mut(id).and_then(|el| el.text_mut()) {
                body.font_size = *size;
            }
        }
        Autofix::MoveTo { id, x, y } => {
            if let Some(el) = canvas.element_mut(id) {
                if let Some(x) = x {
                    el.bounds.x = *x;
                }
                if let Some(y) = y {
                    el.bounds.y = *y;
                }
            }
        }
        Autofix::LimitPackshots { keep } => {
            let mut kept = 0;
            canvas.elements.retain(|el| {
                if !el.is_packshot() {
                    return true;
                }
                kept += 1;
                kept <= *keep
            });
        }
        Autofix::IncreaseContrast { id } => {
            if let Some(body) = canvas.element_mut(id).and_then(|el| el.text_mut()) {
                body.color = Color::WHITE;
                body.background = Some(Color::BLACK);
            }
        }
        // markers for the editor, nothing to move
        Autofix::HighlightText { .. } | Autofix::HighlightImage { .. } => {}
        Autofix::Unsupported => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Element, ElementKind, Format, ImageBody, TextBody};
    use crate::compliance::{IssueCode, Severity};
    use crate::geometry::Rect;

    fn issue(code: IssueCode, fix: Autofix) -> ComplianceIssue {
        ComplianceIssue {
            code,
            message: String::new(),
            severity: Severity::Error,
            autofix: Some(fix),
        }
    }

    fn canvas_with(elements: Vec<Element>) -> Canvas {
        let mut canvas = Canvas::new(Format::Square, 1080, 1080);
        canvas.elements = elements;
        canvas
    }

    fn headline(x: i32, y: i32, size: u32) -> Element {
        Element::new("headline", Rect::new(x, y, 300, 100), 1, ElementKind::Text(TextBody::new("Hi", size)))
    }

    fn image(id: &str, kind: fn(ImageBody) -> ElementKind) -> Element {
        Element::new(id, Rect::new(200, 200, 100, 100), 1, kind(ImageBody::new(format!("{id}.png"))))
    }

    #[test]
    fn test_original_is_untouched() {
        let canvas = canvas_with(vec![headline(0, 0, 30)]);
        let fixed = apply_autofixes(
            &canvas,
            &[issue(IssueCode::MinFontSize, Autofix::SetFontSize { id: "headline".into(), size: 48 })],
        );
        assert_eq!(canvas.elements[0].text().unwrap().font_size, 30);
        assert_eq!(fixed.elements[0].text().unwrap().font_size, 48);
    }

    #[test]
    fn test_nudge_clamps() {
        let canvas = canvas_with(vec![headline(10, 990, 64)]);
        let fix = Autofix::NudgeInside { id: "headline".into(), min_x: 150, min_y: 150, max_x: 630, max_y: 830 };
        let fixed = apply_autofixes(&canvas, &[issue(IssueCode::SafeZone, fix)]);
        assert_eq!(fixed.elements[0].bounds, Rect::new(150, 830, 300, 100));
    }

    #[test]
    fn test_nudge_empty_range_collapses_to_min() {
        let canvas = canvas_with(vec![headline(500, 500, 64)]);
        let fix = Autofix::NudgeInside { id: "headline".into(), min_x: 150, min_y: 150, max_x: 100, max_y: 90 };
        let fixed = apply_autofixes(&canvas, &[issue(IssueCode::SafeZone, fix)]);
        assert_eq!((fixed.elements[0].bounds.x, fixed.elements[0].bounds.y), (150, 150));
    }

    #[test]
    fn test_set_font_size_ignores_images() {
        let canvas = canvas_with(vec![image("logo", ElementKind::Logo)]);
        let fixed = apply_autofixes(
            &canvas,
            &[issue(IssueCode::MinFontSize, Autofix::SetFontSize { id: "logo".into(), size: 48 })],
        );
        assert_eq!(fixed, canvas);
    }

    #[test]
    fn test_move_to_partial() {
        let canvas = canvas_with(vec![headline(200, 300, 64)]);
        let fix = Autofix::MoveTo { id: "headline".into(), x: None, y: Some(950) };
        let fixed = apply_autofixes(&canvas, &[issue(IssueCode::DrinkawarePosition, fix)]);
        assert_eq!((fixed.elements[0].bounds.x, fixed.elements[0].bounds.y), (200, 950));
    }

    #[test]
    fn test_limit_packshots_keeps_order() {
        let mut elements = vec![image("logo", ElementKind::Logo)];
        for i in 0..5 {
            elements.push(image(&format!("packshot_{i}"), ElementKind::Packshot));
            if i == 1 {
                elements.push(headline(200, 200, 64));
            }
        }
        let canvas = canvas_with(elements);
        let fixed = apply_autofixes(&canvas, &[issue(IssueCode::PackshotLimit, Autofix::LimitPackshots { keep: 3 })]);

        let ids: Vec<_> = fixed.elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["logo", "packshot_0", "packshot_1", "headline", "packshot_2"]);
        assert_eq!(fixed.packshot_count(), 3);
        assert_eq!(fixed.element("headline"), canvas.element("headline"));
    }

    #[test]
    fn test_increase_contrast_forces_white_on_black() {
        let canvas = canvas_with(vec![headline(200, 200, 64)]);
        let fixed = apply_autofixes(
            &canvas,
            &[issue(IssueCode::Contrast, Autofix::IncreaseContrast { id: "headline".into() })],
        );
        let body = fixed.elements[0].text().unwrap();
        assert_eq!(body.color, Color::WHITE);
        assert_eq!(body.background, Some(Color::BLACK));
    }

    #[test]
    fn test_later_directive_wins() {
        let canvas = canvas_with(vec![headline(200, 200, 30)]);
        let fixed = apply_autofixes(
            &canvas,
            &[
                issue(IssueCode::MinFontSize, Autofix::SetFontSize { id: "headline".into(), size: 48 }),
                issue(IssueCode::DrinkawareSize, Autofix::SetFontSize { id: "headline".into(), size: 18 }),
            ],
        );
        assert_eq!(fixed.elements[0].text().unwrap().font_size, 18);
    }

    #[test]
    fn test_missing_target_and_unknown_action() {
        let canvas = canvas_with(vec![headline(200, 200, 64)]);
        let outcome = interpret(
            &canvas,
            &[
                issue(IssueCode::Contrast, Autofix::IncreaseContrast { id: "nope".into() }),
                issue(IssueCode::BannedCopy, Autofix::HighlightText { id: "headline".into() }),
                issue(IssueCode::Contrast, Autofix::Unsupported),
                ComplianceIssue { code: IssueCode::Contrast, message: String::new(), severity: Severity::Info, autofix: None },
            ],
        );
        assert_eq!(outcome.canvas, canvas);
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.skipped, 1);
    }
}
