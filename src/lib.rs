//! AIRC Core - Retail Creative Layout, Compliance, Autofix and Render
//!
//! # Ground Rules
//! 1. The Canvas Is Truth
//! 2. Profiles Are Contracts
//! 3. Compliance Reports, Autofix Proposes
//! 4. Deterministic Layouts
//! 5. Manifests Enable Reproduction
//! 6. Agents Suggest, Engine Enforces

pub mod geometry;
pub mod contrast;
pub mod canvas;
pub mod config;
pub mod assets;
pub mod compliance;
pub mod autofix;
pub mod layout;
pub mod fonts;
pub mod imaging;
pub mod render;
pub mod copy;
pub mod hashing;
pub mod pipeline;

pub use geometry::{Rect, Margins, intersects_margin, estimate_text_height};
pub use contrast::{contrast_ratio, passes_aa};
pub use canvas::{Canvas, Element, ElementKind, Format, Color, TextBody, ImageBody};
pub use config::{BrandProfile, ConfigError, FormatSpec, RuleSet};
pub use assets::{AssetResolver, TextRecognizer, FsAssetResolver, MemoryAssets, NoOcr};
pub use compliance::{ComplianceEngine, ComplianceIssue, ComplianceReport, IssueCode, Autofix, Severity};
pub use autofix::{apply_autofixes, AutofixOutcome};
pub use layout::{suggest_layouts, merge_suggestions, LayoutRequest, ContentInputs};
pub use fonts::{FontProvider, BlockFont, SystemFont};
pub use render::{OutputFormat, RenderError, Renderer};
pub use copy::rewrite_banned_copy;
pub use hashing::{canonical_json, canvas_fingerprint, compute_manifest_hash, compute_job_hash};
pub use pipeline::{CreativePipeline, FixLoop, PipelineError, RenderedCreative};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
