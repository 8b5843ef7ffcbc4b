//! Creative Pipeline - Single Entry Point
//!
//! Owns the brand profile, the compiled compliance engine and the injected
//! collaborators (assets, OCR, fonts). Every canvas operation validates the
//! canvas against the profile before touching it.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::assets::{AssetResolver, FsAssetResolver, NoOcr, TextRecognizer};
use crate::autofix::{self, AutofixOutcome};
use crate::canvas::{Canvas, Format};
use crate::compliance::{ComplianceEngine, ComplianceIssue, ComplianceReport, RuleContext};
use crate::config::{BrandProfile, ConfigError, FormatSpec};
use crate::fonts::{FontProvider, SystemFont};
use crate::hashing::{canvas_fingerprint, compute_job_hash, compute_manifest_hash, sha256_hex};
use crate::layout::{self, LayoutRequest};
use crate::render::{artifact_name, write_artifact, OutputFormat, RenderError, Renderer};
use crate::ENGINE_VERSION;

/// Round cap used by the CLI when none is given.
pub const DEFAULT_FIX_ROUNDS: usize = 3;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Invalid canvas: {0}")]
    InvalidCanvas(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of [`CreativePipeline::fix_until_clean`].
#[derive(Debug, Clone, Serialize)]
pub struct FixLoop {
    pub canvas: Canvas,
    /// Fix passes actually applied.
    pub rounds: usize,
    /// Issues still reported by the last check.
    pub remaining: Vec<ComplianceIssue>,
    pub converged: bool,
}

/// Manifest of one exported creative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedCreative {
    pub id: String,
    pub profile_id: String,
    pub profile_version: String,
    pub engine_version: String,
    pub format: Format,
    pub output_format: OutputFormat,
    pub content_type: String,
    pub size: [i32; 2],
    pub filename: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub compliance: ComplianceReport,
    pub canvas_hash: String,
    pub content_hash: String,
    pub job_hash: String,
    pub manifest_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
}

pub struct CreativePipeline {
    profile: BrandProfile,
    engine: ComplianceEngine,
    assets: Box<dyn AssetResolver>,
    ocr: Box<dyn TextRecognizer>,
    fonts: Box<dyn FontProvider>,
}

impl CreativePipeline {
    /// Build a pipeline for `profile`, with filesystem assets, no OCR and host fonts.
    pub fn new(profile: BrandProfile) -> Result<Self, PipelineError> {
        profile.check_engine_version(ENGINE_VERSION)?;
        let engine = ComplianceEngine::new(&profile.rules)?;

        Ok(Self {
            profile,
            engine,
            assets: Box::new(FsAssetResolver::new()),
            ocr: Box::new(NoOcr),
            fonts: Box::new(SystemFont::load()),
        })
    }

    pub fn with_assets(mut self, assets: impl AssetResolver + 'static) -> Self {
        self.assets = Box::new(assets);
        self
    }

    pub fn with_ocr(mut self, ocr: impl TextRecognizer + 'static) -> Self {
        self.ocr = Box::new(ocr);
        self
    }

    pub fn with_fonts(mut self, fonts: impl FontProvider + 'static) -> Self {
        self.fonts = Box::new(fonts);
        self
    }

    pub fn profile(&self) -> &BrandProfile {
        &self.profile
    }

    pub fn suggest_layouts(&self, request: &LayoutRequest) -> Result<Vec<Canvas>, PipelineError> {
        Ok(layout::suggest_layouts(&self.profile, request)?)
    }

    pub fn merge_suggestions(&self, candidates: Vec<Canvas>, raw: &[String]) -> Vec<Canvas> {
        layout::merge_suggestions(candidates, raw)
    }

    /// Check that `canvas` belongs to a configured format, has that format's
    /// dimensions and uses unique element ids.
    pub fn validate_canvas(&self, canvas: &Canvas) -> Result<&FormatSpec, PipelineError> {
        let spec = self.profile.format(canvas.format)?;
        if canvas.width != spec.width || canvas.height != spec.height {
            return Err(PipelineError::InvalidCanvas(format!(
                "{} canvas must be {}x{}, got {}x{}",
                canvas.format, spec.width, spec.height, canvas.width, canvas.height
            )));
        }
        if let Some(id) = canvas.duplicate_id() {
            return Err(PipelineError::InvalidCanvas(format!("duplicate element id '{id}'")));
        }
        Ok(spec)
    }

    pub fn check_compliance(&self, canvas: &Canvas) -> Result<ComplianceReport, PipelineError> {
        let format = self.validate_canvas(canvas)?;
        let ctx = RuleContext {
            canvas,
            format,
            rules: &self.profile.rules,
            assets: self.assets.as_ref(),
            ocr: self.ocr.as_ref(),
        };
        Ok(ComplianceReport::new(self.engine.check(&ctx)))
    }

    pub fn apply_autofixes(&self, canvas: &Canvas, issues: &[ComplianceIssue]) -> AutofixOutcome {
        autofix::interpret(canvas, issues)
    }

    /// Alternate check and fix until the canvas is clean, a pass changes
    /// nothing, or `max_rounds` passes have been applied.
    pub fn fix_until_clean(&self, canvas: &Canvas, max_rounds: usize) -> Result<FixLoop, PipelineError> {
        let mut current = canvas.clone();
        let mut rounds = 0;

        loop {
            let report = self.check_compliance(&current)?;
            if report.passed || rounds >= max_rounds {
                return Ok(FixLoop {
                    canvas: current,
                    rounds,
                    converged: report.passed,
                    remaining: report.issues,
                });
            }

            let next = autofix::apply_autofixes(&current, &report.issues);
            rounds += 1;
            if next == current {
                tracing::debug!(rounds, remaining = report.issues.len(), "autofix made no progress");
                return Ok(FixLoop {
                    canvas: current,
                    rounds,
                    converged: false,
                    remaining: report.issues,
                });
            }
            current = next;
        }
    }

    pub fn render(&self, canvas: &Canvas, output: OutputFormat) -> Result<Vec<u8>, PipelineError> {
        self.validate_canvas(canvas)?;
        let renderer = Renderer::new(self.assets.as_ref(), self.fonts.as_ref());
        Ok(renderer.render(canvas, output)?)
    }

    /// Render `canvas` into `dir` and return its manifest.
    ///
    /// Compliance is recorded in the manifest, not enforced.
    pub fn export(
        &self,
        canvas: &Canvas,
        output: OutputFormat,
        dir: &Path,
        inline: bool,
    ) -> Result<RenderedCreative, PipelineError> {
        let compliance = self.check_compliance(canvas)?;
        let bytes = self.render(canvas, output)?;

        let filename = artifact_name(canvas.format, output);
        let path = write_artifact(dir, &filename, &bytes)?;

        let job_hash = compute_job_hash(
            &self.profile.id,
            &self.profile.profile_version,
            canvas,
            ENGINE_VERSION,
        )?;

        let mut creative = RenderedCreative {
            id: Uuid::new_v4().to_string(),
            profile_id: self.profile.id.clone(),
            profile_version: self.profile.profile_version.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            format: canvas.format,
            output_format: output,
            content_type: output.content_type().to_string(),
            size: [canvas.width, canvas.height],
            filename,
            path,
            created_at: Utc::now(),
            compliance,
            canvas_hash: canvas_fingerprint(canvas)?,
            content_hash: sha256_hex(&bytes),
            job_hash,
            manifest_hash: String::new(), // computed last
            data_base64: inline.then(|| base64::engine::general_purpose::STANDARD.encode(&bytes)),
        };
        creative.manifest_hash = compute_manifest_hash(&creative)?;

        tracing::info!(
            format = %creative.format,
            path = %creative.path.display(),
            bytes = bytes.len(),
            passed = creative.compliance.passed,
            "exported creative"
        );
        Ok(creative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::canvas::{Element, ElementKind, TextBody};
    use crate::compliance::IssueCode;
    use crate::fonts::BlockFont;
    use crate::geometry::Rect;

    fn pipeline() -> CreativePipeline {
        CreativePipeline::new(BrandProfile::default())
            .unwrap()
            .with_assets(MemoryAssets::new())
            .with_fonts(BlockFont)
    }

    fn square_with(elements: Vec<Element>) -> Canvas {
        let mut canvas = Canvas::new(Format::Square, 1080, 1080);
        canvas.elements = elements;
        canvas
    }

    fn text(id: &str, rect: Rect, body: TextBody) -> Element {
        Element::new(id, rect, 1, ElementKind::Text(body))
    }

    #[test]
    fn test_rejects_newer_profile() {
        let profile = BrandProfile { engine_min_version: "99.0.0".into(), ..BrandProfile::default() };
        assert!(matches!(
            CreativePipeline::new(profile),
            Err(PipelineError::Config(ConfigError::EngineVersionMismatch(..)))
        ));
    }

    #[test]
    fn test_validate_canvas() {
        let p = pipeline();
        let wrong_size = Canvas::new(Format::Square, 1080, 1920);
        assert!(matches!(p.check_compliance(&wrong_size), Err(PipelineError::InvalidCanvas(_))));

        let dup = square_with(vec![
            text("a", Rect::new(200, 200, 100, 100), TextBody::new("x", 48)),
            text("a", Rect::new(300, 300, 100, 100), TextBody::new("y", 48)),
        ]);
        assert!(matches!(p.check_compliance(&dup), Err(PipelineError::InvalidCanvas(_))));

        let mut profile = BrandProfile::default();
        profile.formats.remove(&Format::Checkout);
        let p = CreativePipeline::new(profile).unwrap().with_fonts(BlockFont);
        assert!(matches!(
            p.check_compliance(&Canvas::new(Format::Checkout, 1200, 900)),
            Err(PipelineError::Config(ConfigError::UnknownFormat(Format::Checkout)))
        ));
    }

    #[test]
    fn test_render_validates_canvas() {
        let p = pipeline();
        let wrong_size = Canvas::new(Format::Square, 100, 100);
        assert!(matches!(p.render(&wrong_size, OutputFormat::Png), Err(PipelineError::InvalidCanvas(_))));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            p.export(&wrong_size, OutputFormat::Jpg, dir.path(), false),
            Err(PipelineError::InvalidCanvas(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let jpg = p.render(&square_with(vec![]), OutputFormat::Jpg).unwrap();
        assert!(jpg.starts_with(&[0xFF, 0xD8, 0xFF]));
    }

    #[test]
    fn test_extreme_bounds_reported_not_panicking() {
        let p = pipeline();
        let json = r#"{"format": "SQUARE", "width": 1080, "height": 1080, "elements": [
            {"id": "far", "type": "text", "text": "x", "font_size": 48,
             "bounds": {"x": 2147483600, "y": 200, "width": 100, "height": 10}}
        ]}"#;
        let canvas = Canvas::from_json(json).unwrap();
        let report = p.check_compliance(&canvas).unwrap();
        assert_eq!(report.count(IssueCode::SafeZone), 1);

        let fixed = p.fix_until_clean(&canvas, DEFAULT_FIX_ROUNDS).unwrap();
        assert!(fixed.converged);
        assert_eq!(fixed.canvas.element("far").unwrap().bounds.x, 1080 - 150 - 100);
        assert!(p.render(&canvas, OutputFormat::Png).is_ok());
    }

    #[test]
    fn test_fix_until_clean_converges() {
        let p = pipeline();
        let canvas = square_with(vec![text("headline", Rect::new(10, 200, 400, 100), TextBody::new("Hello", 30))]);

        let result = p.fix_until_clean(&canvas, DEFAULT_FIX_ROUNDS).unwrap();
        assert!(result.converged);
        assert_eq!(result.rounds, 1);
        assert!(result.remaining.is_empty());
        let el = result.canvas.element("headline").unwrap();
        assert_eq!(el.bounds.x, 150);
        assert_eq!(el.text().unwrap().font_size, 48);
    }

    #[test]
    fn test_fix_until_clean_stops_without_progress() {
        let p = pipeline();
        let canvas = square_with(vec![text("body", Rect::new(200, 200, 400, 100), TextBody::new("Totally free", 48))]);

        let result = p.fix_until_clean(&canvas, 10).unwrap();
        assert!(!result.converged);
        assert_eq!(result.rounds, 1);
        assert_eq!(result.remaining[0].code, IssueCode::BannedCopy);
        assert_eq!(result.canvas, canvas);
    }

    #[test]
    fn test_fix_until_clean_zero_rounds_only_checks() {
        let p = pipeline();
        let canvas = square_with(vec![text("headline", Rect::new(10, 200, 400, 100), TextBody::new("Hello", 64))]);
        let result = p.fix_until_clean(&canvas, 0).unwrap();
        assert_eq!(result.rounds, 0);
        assert!(!result.converged);
        assert_eq!(result.canvas, canvas);
    }

    #[test]
    fn test_export_manifest() {
        let p = pipeline();
        let dir = tempfile::tempdir().unwrap();
        let canvas = square_with(vec![text("headline", Rect::new(150, 150, 780, 83), TextBody::new("Hello", 64))]);

        let creative = p.export(&canvas, OutputFormat::Png, dir.path(), true).unwrap();
        assert_eq!(creative.filename, "export_SQUARE.png");
        assert_eq!(creative.content_type, "image/png");
        assert_eq!(creative.path, dir.path().join("export_SQUARE.png"));
        assert!(creative.compliance.passed);

        let written = std::fs::read(&creative.path).unwrap();
        assert_eq!(creative.content_hash, sha256_hex(&written));
        let inline = base64::engine::general_purpose::STANDARD
            .decode(creative.data_base64.as_deref().unwrap())
            .unwrap();
        assert_eq!(inline, written);
        assert_eq!(creative.manifest_hash.len(), 64);
    }
}
