//! AIRC CLI - Bridge interface for the editor backend
//!
//! Commands: formats, suggest, check, fix, render, rewrite, remove-bg
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 when a canvas has compliance issues

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use airc_core::{
    imaging, render, rewrite_banned_copy,
    pipeline::DEFAULT_FIX_ROUNDS,
    BrandProfile, Canvas, CreativePipeline, FsAssetResolver, LayoutRequest, OutputFormat,
};

#[derive(Parser)]
#[command(name = "airc-cli")]
#[command(about = "AIRC CLI - Retail Creative Layout, Compliance and Render")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Brand profile JSON (built-in profile when omitted)
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Root directory for relative and /static/assets/ image references
    #[arg(short, long)]
    assets_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured formats
    Formats,

    /// Suggest layouts for a content request
    Suggest {
        /// JSON payload (LayoutRequest), or @file
        #[arg(long)]
        payload: String,

        /// Extra externally generated layouts (JSON), appended after the built-in ones
        #[arg(long)]
        suggestion: Vec<String>,
    },

    /// Check a canvas against the brand rules
    Check {
        /// Canvas JSON, or @file
        #[arg(short, long)]
        canvas: String,
    },

    /// Apply autofixes until the canvas is clean
    Fix {
        /// Canvas JSON, or @file
        #[arg(short, long)]
        canvas: String,

        #[arg(long, default_value_t = DEFAULT_FIX_ROUNDS)]
        rounds: usize,
    },

    /// Render a canvas to an image file
    Render {
        /// Canvas JSON, or @file
        #[arg(short, long)]
        canvas: String,

        #[arg(long, value_enum, default_value = "png")]
        output: OutputArg,

        #[arg(long, default_value = "exports")]
        out_dir: PathBuf,

        /// Include the encoded image as base64 in the output
        #[arg(long)]
        inline: bool,
    },

    /// Rewrite banned claims in a line of copy
    Rewrite {
        text: String,
    },

    /// Make the near-white background of a packshot transparent
    RemoveBg {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value_t = imaging::DEFAULT_WHITE_THRESHOLD)]
        threshold: u8,

        /// Shrink to fit within WIDTHxHEIGHT after removal
        #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
        fit: Option<Vec<u32>>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputArg {
    Png,
    Jpg,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Png => OutputFormat::Png,
            OutputArg::Jpg => OutputFormat::Jpg,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    print_json(&serde_json::json!({
        "success": false,
        "error": error.to_string(),
    }));
    ExitCode::FAILURE
}

/// Inline JSON, or the contents of a file when prefixed with `@`.
fn read_payload(arg: &str) -> Result<String, String> {
    match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e)),
        None => Ok(arg.to_string()),
    }
}

fn parse_canvas(arg: &str) -> Result<Canvas, String> {
    let json = read_payload(arg)?;
    Canvas::from_json(&json).map_err(|e| format!("Invalid canvas: {}", e))
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let profile = match &cli.profile {
        Some(path) => match BrandProfile::load(path) {
            Ok(p) => p,
            Err(e) => return fail(e),
        },
        None => BrandProfile::default(),
    };

    let assets = match &cli.assets_dir {
        Some(dir) => FsAssetResolver::with_root(dir),
        None => FsAssetResolver::new(),
    };

    let pipeline = match CreativePipeline::new(profile) {
        Ok(p) => p.with_assets(assets),
        Err(e) => return fail(e),
    };

    match cli.command {
        Commands::Formats => {
            let formats: Vec<_> = pipeline.profile().formats
                .iter()
                .map(|(format, spec)| serde_json::json!({
                    "format": format,
                    "width": spec.width,
                    "height": spec.height,
                    "safe_zone": spec.safe_zone,
                }))
                .collect();
            print_json(&formats);
            ExitCode::SUCCESS
        }

        Commands::Suggest { payload, suggestion } => {
            let request: LayoutRequest = match read_payload(&payload)
                .and_then(|json| serde_json::from_str(&json).map_err(|e| format!("Invalid payload: {}", e)))
            {
                Ok(r) => r,
                Err(e) => return fail(e),
            };

            match pipeline.suggest_layouts(&request) {
                Ok(candidates) => {
                    let candidates = pipeline.merge_suggestions(candidates, &suggestion);
                    print_json(&serde_json::json!({ "candidates": candidates }));
                    ExitCode::SUCCESS
                }
                Err(e) => fail(e),
            }
        }

        Commands::Check { canvas } => {
            let canvas = match parse_canvas(&canvas) {
                Ok(c) => c,
                Err(e) => return fail(e),
            };

            match pipeline.check_compliance(&canvas) {
                Ok(report) => {
                    print_json(&report);
                    if report.passed {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2) // Compliance issues
                    }
                }
                Err(e) => fail(e),
            }
        }

        Commands::Fix { canvas, rounds } => {
            let canvas = match parse_canvas(&canvas) {
                Ok(c) => c,
                Err(e) => return fail(e),
            };

            match pipeline.fix_until_clean(&canvas, rounds) {
                Ok(result) => {
                    print_json(&result);
                    if result.converged {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2)
                    }
                }
                Err(e) => fail(e),
            }
        }

        Commands::Render { canvas, output, out_dir, inline } => {
            let canvas = match parse_canvas(&canvas) {
                Ok(c) => c,
                Err(e) => return fail(e),
            };

            match pipeline.export(&canvas, output.into(), &out_dir, inline) {
                Ok(creative) => {
                    print_json(&serde_json::json!({
                        "success": true,
                        "creative": creative,
                    }));
                    ExitCode::SUCCESS
                }
                Err(e) => fail(e),
            }
        }

        Commands::Rewrite { text } => {
            print_json(&serde_json::json!({
                "original": text,
                "rewritten": rewrite_banned_copy(&text),
            }));
            ExitCode::SUCCESS
        }

        Commands::RemoveBg { input, output, threshold, fit } => {
            match remove_background(&input, &output, threshold, fit.as_deref()) {
                Ok((width, height)) => {
                    print_json(&serde_json::json!({
                        "success": true,
                        "output": output,
                        "size": [width, height],
                    }));
                    ExitCode::SUCCESS
                }
                Err(e) => fail(e),
            }
        }
    }
}

fn remove_background(
    input: &Path,
    output: &Path,
    threshold: u8,
    fit: Option<&[u32]>,
) -> Result<(u32, u32), String> {
    let bytes = fs::read(input).map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;
    let decoded = imaging::decode_rgba(&bytes).map_err(|e| format!("Unreadable image: {}", e))?;

    let mut cleaned = imaging::remove_near_white_background(&decoded, threshold);
    if let Some([max_w, max_h]) = fit {
        cleaned = imaging::resize_fit(&cleaned, *max_w, *max_h);
    }

    let png = render::encode(&cleaned, OutputFormat::Png).map_err(|e| e.to_string())?;
    let dir = output.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = output
        .file_name()
        .ok_or_else(|| format!("Invalid output path {}", output.display()))?
        .to_string_lossy();
    render::write_artifact(dir, &name, &png).map_err(|e| e.to_string())?;

    Ok(cleaned.dimensions())
}
