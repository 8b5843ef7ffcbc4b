//! Brand Profile - Format Registry and Rule Configuration
//!
//! A profile is a JSON document. Every field has a default so an empty `{}`
//! yields the built-in profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::canvas::Format;
use crate::geometry::Margins;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Format not configured: {0}")]
    UnknownFormat(Format),

    #[error("Invalid banned copy pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Profile {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),
}

/// Canvas size and safe zone for one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub width: i32,
    pub height: i32,
    pub safe_zone: Margins,
}

/// Minimum font sizes, keyed by reserved element id plus the disclaimer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinFontSizes {
    #[serde(default = "default_min_headline")]
    pub headline: u32,
    #[serde(default = "default_min_subhead")]
    pub subhead: u32,
    #[serde(default = "default_min_value")]
    pub value: u32,
    #[serde(default = "default_min_drinkaware")]
    pub drinkaware: u32,
}

fn default_min_headline() -> u32 { 48 }
fn default_min_subhead() -> u32 { 28 }
fn default_min_value() -> u32 { 36 }
fn default_min_drinkaware() -> u32 { 18 }

impl Default for MinFontSizes {
    fn default() -> Self {
        Self {
            headline: default_min_headline(),
            subhead: default_min_subhead(),
            value: default_min_value(),
            drinkaware: default_min_drinkaware(),
        }
    }
}

impl MinFontSizes {
    /// Minimum for a reserved element id (`headline`, `subhead`, `value`).
    pub fn for_reserved_id(&self, id: &str) -> Option<u32> {
        match id {
            "headline" => Some(self.headline),
            "subhead" => Some(self.subhead),
            "value" => Some(self.value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default = "default_banned_patterns")]
    pub banned_copy_patterns: Vec<String>,
    #[serde(default = "default_drinkaware_text")]
    pub drinkaware_text: String,
    #[serde(default)]
    pub min_font_sizes: MinFontSizes,
    #[serde(default = "default_packshot_limit")]
    pub max_packshots: usize,
}

fn default_banned_patterns() -> Vec<String> {
    [
        r"\bfree\b",
        r"\bwin\b|\bcompetition\b|\bcontest\b",
        r"\bprice\b|\b£\s*\d|\d+\.\d{2}",
        r"\bsustainable\b|\beco\b|\bgreen\b|\benvironment\b",
        r"\bclinically\s+proven\b|\bguarantee\b",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_drinkaware_text() -> String { "Drinkaware.co.uk".to_string() }
fn default_packshot_limit() -> usize { 3 }

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            banned_copy_patterns: default_banned_patterns(),
            drinkaware_text: default_drinkaware_text(),
            min_font_sizes: MinFontSizes::default(),
            max_packshots: default_packshot_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandProfile {
    #[serde(default = "default_profile_id")]
    pub id: String,
    #[serde(default = "default_version")]
    pub profile_version: String,
    #[serde(default = "default_version")]
    pub engine_min_version: String,
    #[serde(default = "default_formats")]
    pub formats: BTreeMap<Format, FormatSpec>,
    #[serde(default)]
    pub rules: RuleSet,
}

fn default_profile_id() -> String { "builtin".to_string() }
fn default_version() -> String { "1.0.0".to_string() }

fn default_formats() -> BTreeMap<Format, FormatSpec> {
    let story = FormatSpec { width: 1080, height: 1920, safe_zone: Margins::new(250, 50, 250, 50) };
    BTreeMap::from([
        (Format::FbStory, story),
        (Format::IgStory, story),
        (Format::Square, FormatSpec { width: 1080, height: 1080, safe_zone: Margins::uniform(150) }),
        (Format::Landscape, FormatSpec { width: 1200, height: 628, safe_zone: Margins::uniform(200) }),
        (Format::Checkout, FormatSpec { width: 1200, height: 900, safe_zone: Margins::uniform(200) }),
    ])
}

impl Default for BrandProfile {
    fn default() -> Self {
        Self {
            id: default_profile_id(),
            profile_version: default_version(),
            engine_min_version: default_version(),
            formats: default_formats(),
            rules: RuleSet::default(),
        }
    }
}

impl BrandProfile {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn format(&self, format: Format) -> Result<&FormatSpec, ConfigError> {
        self.formats.get(&format).ok_or(ConfigError::UnknownFormat(format))
    }

    /// Reject profiles written for a newer engine.
    pub fn check_engine_version(&self, engine_version: &str) -> Result<(), ConfigError> {
        let engine = semver::Version::parse(engine_version)
            .map_err(|_| ConfigError::InvalidVersion(engine_version.to_string()))?;
        let min = semver::Version::parse(&self.engine_min_version)
            .map_err(|_| ConfigError::InvalidVersion(self.engine_min_version.clone()))?;

        if engine < min {
            return Err(ConfigError::EngineVersionMismatch(
                self.id.clone(),
                self.engine_min_version.clone(),
                engine_version.to_string(),
            ));
        }
        Ok(())
    }
}
