//! Compliance Engine - Rules Produce Issues, Issues Carry Fixes
//!
//! Rules run in a fixed order and never fail: a rule that cannot evaluate
//! (missing asset, OCR unavailable) contributes nothing. Every directive a
//! rule can attach is an [`Autofix`] variant understood by the interpreter.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::assets::{AssetResolver, TextRecognizer};
use crate::canvas::{Canvas, Color, Element};
use crate::config::{ConfigError, FormatSpec, RuleSet};
use crate::contrast::{is_large_text, passes_aa};
use crate::geometry::intersects_margin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    SafeZone,
    PackshotLimit,
    BannedCopy,
    BannedCopyOcr,
    Contrast,
    DrinkawareSize,
    DrinkawarePosition,
    MinFontSize,
    /// A code this engine does not produce, kept so foreign reports still load.
    #[serde(other)]
    Unknown,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::SafeZone => "SAFE_ZONE",
            IssueCode::PackshotLimit => "PACKSHOT_LIMIT",
            IssueCode::BannedCopy => "BANNED_COPY",
            IssueCode::BannedCopyOcr => "BANNED_COPY_OCR",
            IssueCode::Contrast => "CONTRAST",
            IssueCode::DrinkawareSize => "DRINKAWARE_SIZE",
            IssueCode::DrinkawarePosition => "DRINKAWARE_POSITION",
            IssueCode::MinFontSize => "MIN_FONT_SIZE",
            IssueCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

/// A mechanical repair attached to an issue.
///
/// `Unsupported` absorbs directives this engine cannot read (unknown action,
/// missing action, missing fields) so a batch of issues from JSON still
/// deserializes; the interpreter skips it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Autofix {
    NudgeInside {
        id: String,
        min_x: i32,
        min_y: i32,
        max_x: i32,
        max_y: i32,
    },
    LimitPackshots {
        keep: usize,
    },
    HighlightText {
        id: String,
    },
    HighlightImage {
        id: String,
    },
    IncreaseContrast {
        id: String,
    },
    SetFontSize {
        id: String,
        size: u32,
    },
    MoveTo {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<i32>,
    },
    #[serde(other)]
    Unsupported,
}

impl Autofix {
    pub fn action(&self) -> &'static str {
        match self {
            Autofix::NudgeInside { .. } => "nudge_inside",
            Autofix::LimitPackshots { .. } => "limit_packshots",
            Autofix::HighlightText { .. } => "highlight_text",
            Autofix::HighlightImage { .. } => "highlight_image",
            Autofix::IncreaseContrast { .. } => "increase_contrast",
            Autofix::SetFontSize { .. } => "set_font_size",
            Autofix::MoveTo { .. } => "move_to",
            Autofix::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub code: IssueCode,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, deserialize_with = "lenient_autofix")]
    pub autofix: Option<Autofix>,
}

fn lenient_autofix<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Autofix>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.map(|value| serde_json::from_value(value).unwrap_or(Autofix::Unsupported)))
}

impl ComplianceIssue {
    fn error(code: IssueCode, message: String, autofix: Autofix) -> Self {
        Self {
            code,
            message,
            severity: Severity::Error,
            autofix: Some(autofix),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub passed: bool,
    pub issues: Vec<ComplianceIssue>,
}

impl ComplianceReport {
    pub fn new(issues: Vec<ComplianceIssue>) -> Self {
        Self { passed: issues.is_empty(), issues }
    }

    pub fn count(&self, code: IssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }
}

/// Everything a rule may look at while evaluating one canvas.
pub struct RuleContext<'a> {
    pub canvas: &'a Canvas,
    pub format: &'a FormatSpec,
    pub rules: &'a RuleSet,
    pub assets: &'a dyn AssetResolver,
    pub ocr: &'a dyn TextRecognizer,
}

/// Compliance rule trait - produces issues
pub trait ComplianceRule: Send + Sync {
    fn code(&self) -> IssueCode;
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue>;
}

// --- Concrete Rules ---

pub struct SafeZoneRule;

impl ComplianceRule for SafeZoneRule {
    fn code(&self) -> IssueCode { IssueCode::SafeZone }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue> {
        let (w, h) = (ctx.canvas.width, ctx.canvas.height);
        let m = &ctx.format.safe_zone;

        ctx.canvas.elements.iter()
            .filter(|el| intersects_margin(&el.bounds, w, h, m))
            .map(|el| ComplianceIssue::error(
                self.code(),
                format!("Element {} violates safe zone.", el.id),
                Autofix::NudgeInside {
                    id: el.id.clone(),
                    min_x: m.left,
                    min_y: m.top,
                    max_x: w.saturating_sub(m.right).saturating_sub(el.bounds.width),
                    max_y: h.saturating_sub(m.bottom).saturating_sub(el.bounds.height),
                },
            ))
            .collect()
    }
}

pub struct PackshotLimitRule;

impl ComplianceRule for PackshotLimitRule {
    fn code(&self) -> IssueCode { IssueCode::PackshotLimit }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue> {
        let count = ctx.canvas.packshot_count();
        let limit = ctx.rules.max_packshots;
        if count <= limit {
            return vec![];
        }
        vec![ComplianceIssue::error(
            self.code(),
            format!("Packshots exceed {} (found {}).", limit, count),
            Autofix::LimitPackshots { keep: limit },
        )]
    }
}

pub struct BannedCopyRule {
    pattern: Regex,
}

impl ComplianceRule for BannedCopyRule {
    fn code(&self) -> IssueCode { IssueCode::BannedCopy }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue> {
        text_elements(ctx.canvas)
            .filter(|(_, body)| !body.text.is_empty() && self.pattern.is_match(&body.text))
            .map(|(el, _)| ComplianceIssue::error(
                self.code(),
                format!("Banned copy detected in {}.", el.id),
                Autofix::HighlightText { id: el.id.clone() },
            ))
            .collect()
    }
}

/// Banned copy baked into images, found through the OCR collaborator.
pub struct OcrBannedCopyRule {
    pattern: Regex,
}

impl ComplianceRule for OcrBannedCopyRule {
    fn code(&self) -> IssueCode { IssueCode::BannedCopyOcr }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue> {
        let mut issues = vec![];
        for el in &ctx.canvas.elements {
            let Some(image) = el.image() else { continue };
            let Some(bytes) = ctx.assets.resolve(&image.src) else {
                tracing::debug!(id = %el.id, src = %image.src, "skipping OCR, asset not found");
                continue;
            };
            let text = ctx.ocr.extract_text(&bytes);
            if !text.is_empty() && self.pattern.is_match(&text) {
                issues.push(ComplianceIssue::error(
                    self.code(),
                    format!("Banned text detected in image {} via OCR.", el.id),
                    Autofix::HighlightImage { id: el.id.clone() },
                ));
            }
        }
        issues
    }
}

pub struct ContrastRule;

impl ComplianceRule for ContrastRule {
    fn code(&self) -> IssueCode { IssueCode::Contrast }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue> {
        let canvas_bg = ctx.canvas.background_color.unwrap_or(Color::WHITE);

        text_elements(ctx.canvas)
            .filter(|(_, body)| {
                let bg = body.background.unwrap_or(canvas_bg);
                !passes_aa(body.color.rgb_triple(), bg.rgb_triple(), is_large_text(body.font_size))
            })
            .map(|(el, _)| ComplianceIssue::error(
                self.code(),
                format!("Contrast fails WCAG AA for {}.", el.id),
                Autofix::IncreaseContrast { id: el.id.clone() },
            ))
            .collect()
    }
}

/// Alcohol disclaimer must be legible and sit in the bottom band.
pub struct DrinkawareRule;

const DRINKAWARE_MIN_Y_RATIO: f64 = 0.85;
const DRINKAWARE_TARGET_Y_RATIO: f64 = 0.88;

impl ComplianceRule for DrinkawareRule {
    fn code(&self) -> IssueCode { IssueCode::DrinkawareSize }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue> {
        let needle = ctx.rules.drinkaware_text.to_lowercase();
        let min_size = ctx.rules.min_font_sizes.drinkaware;
        let height = f64::from(ctx.canvas.height);
        let min_y = (height * DRINKAWARE_MIN_Y_RATIO) as i32;

        let mut issues = vec![];
        for (el, body) in text_elements(ctx.canvas) {
            if !body.text.to_lowercase().contains(&needle) {
                continue;
            }
            if body.font_size < min_size {
                issues.push(ComplianceIssue::error(
                    IssueCode::DrinkawareSize,
                    "Drinkaware font size too small.".to_string(),
                    Autofix::SetFontSize { id: el.id.clone(), size: min_size },
                ));
            }
            if el.bounds.y < min_y {
                issues.push(ComplianceIssue::error(
                    IssueCode::DrinkawarePosition,
                    "Drinkaware must be at the bottom area.".to_string(),
                    Autofix::MoveTo {
                        id: el.id.clone(),
                        x: Some(el.bounds.x),
                        y: Some((height * DRINKAWARE_TARGET_Y_RATIO) as i32),
                    },
                ));
            }
        }
        issues
    }
}

pub struct MinFontSizeRule;

impl ComplianceRule for MinFontSizeRule {
    fn code(&self) -> IssueCode { IssueCode::MinFontSize }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue> {
        let minimums = &ctx.rules.min_font_sizes;

        text_elements(ctx.canvas)
            .filter_map(|(el, body)| {
                let min = minimums.for_reserved_id(&el.id)?;
                (body.font_size < min).then(|| ComplianceIssue::error(
                    self.code(),
                    format!("{} font size below minimum.", el.id),
                    Autofix::SetFontSize { id: el.id.clone(), size: min },
                ))
            })
            .collect()
    }
}

fn text_elements(canvas: &Canvas) -> impl Iterator<Item = (&Element, &crate::canvas::TextBody)> {
    canvas.elements.iter().filter_map(|el| el.text().map(|body| (el, body)))
}

/// Compile all banned patterns into one case-insensitive alternation.
pub fn compile_banned_patterns(patterns: &[String]) -> Result<Regex, ConfigError> {
    let joined = if patterns.is_empty() {
        // matches nothing
        r"[^\s\S]".to_string()
    } else {
        patterns.join("|")
    };
    Ok(RegexBuilder::new(&joined).case_insensitive(true).build()?)
}

/// Engine orchestrates rules in their fixed order
pub struct ComplianceEngine {
    rules: Vec<Box<dyn ComplianceRule>>,
}

impl ComplianceEngine {
    pub fn new(rule_set: &RuleSet) -> Result<Self, ConfigError> {
        let pattern = compile_banned_patterns(&rule_set.banned_copy_patterns)?;
        Ok(Self {
            rules: vec![
                Box::new(SafeZoneRule),
                Box::new(PackshotLimitRule),
                Box::new(BannedCopyRule { pattern: pattern.clone() }),
                Box::new(OcrBannedCopyRule { pattern }),
                Box::new(ContrastRule),
                Box::new(DrinkawareRule),
                Box::new(MinFontSizeRule),
            ],
        })
    }

    /// Rule order, first to last.
    pub fn rule_codes(&self) -> Vec<IssueCode> {
        self.rules.iter().map(|r| r.code()).collect()
    }

    pub fn check(&self, ctx: &RuleContext<'_>) -> Vec<ComplianceIssue> {
        let mut all_issues = vec![];
        for rule in &self.rules {
            all_issues.extend(rule.evaluate(ctx));
        }
        all_issues
    }
}
