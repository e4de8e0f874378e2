//! # Postcraft Export
//!
//! Exports posts from a saved project file to PNG, JPEG or ZIP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use postcraft_core::brandkit::resolve_assets;
use postcraft_core::{BrandKit, FontCatalog, Post, PostId, PostSize};
use postcraft_renderer::{DirectorySink, ExportConfig, ExportPipeline, ImageFormat};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Post size presets.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SizePreset {
    Square,
    Portrait,
    Story,
    Landscape,
}

impl From<SizePreset> for PostSize {
    fn from(preset: SizePreset) -> Self {
        match preset {
            SizePreset::Square => Self::SQUARE,
            SizePreset::Portrait => Self::PORTRAIT,
            SizePreset::Story => Self::STORY,
            SizePreset::Landscape => Self::LANDSCAPE,
        }
    }
}

/// Output formats for single-post exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
}

impl From<FormatArg> for ImageFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Png => Self::Png,
            FormatArg::Jpeg => Self::Jpeg,
        }
    }
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "postcraft-export")]
#[command(about = "Export Postcraft posts to PNG, JPEG or ZIP")]
#[command(version)]
struct Args {
    /// Project file containing the posts.
    project: PathBuf,

    /// Export a single post by id.
    #[arg(long, conflicts_with = "carousel")]
    post: Option<String>,

    /// Export every slide of a carousel as a ZIP.
    #[arg(long)]
    carousel: Option<String>,

    /// Image format for single-post exports.
    #[arg(long, value_enum, default_value = "png")]
    format: FormatArg,

    /// Post size; overrides the size stored in the project.
    #[arg(long, value_enum)]
    size: Option<SizePreset>,

    /// Prefix for output file names.
    #[arg(long, env = "POSTCRAFT_PROJECT_NAME")]
    project_name: Option<String>,

    /// Supersampling factor.
    #[arg(long, default_value = "2.0")]
    pixel_ratio: f32,

    /// JPEG quality (1-100).
    #[arg(long, default_value = "95")]
    quality: u8,

    /// Extra font directories.
    #[arg(long = "font-dir", env = "POSTCRAFT_FONT_DIRS", value_delimiter = ',')]
    font_dirs: Vec<PathBuf>,

    /// Font families available locally; these are never fetched.
    #[arg(long = "local-font", value_delimiter = ',')]
    local_fonts: Vec<String>,

    /// Output directory.
    #[arg(long, env = "POSTCRAFT_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,
}

/// Saved project layout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    #[serde(default)]
    name: Option<String>,
    posts: Vec<Post>,
    #[serde(default)]
    size: Option<PostSize>,
    #[serde(default)]
    brand_kit: Option<BrandKit>,
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,postcraft_renderer=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,postcraft_renderer=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

async fn load_project(path: &Path) -> anyhow::Result<ProjectFile> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut project: ProjectFile = serde_json::from_str(&json)
        .with_context(|| format!("Invalid project file {}", path.display()))?;

    if let Some(kit) = &project.brand_kit {
        project.posts = project
            .posts
            .iter()
            .map(|post| resolve_assets(post, &kit.assets))
            .collect();
    }
    Ok(project)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let project = load_project(&args.project).await?;
    let size = args
        .size
        .map(PostSize::from)
        .or(project.size)
        .unwrap_or(PostSize::SQUARE);
    let format = ImageFormat::from(args.format);

    let mut catalog = FontCatalog::default();
    for family in &args.local_fonts {
        catalog.add_local(family.trim());
    }
    tracing::debug!(
        posts = project.posts.len(),
        local_fonts = catalog.families().count(),
        "project loaded"
    );

    let config = ExportConfig {
        pixel_ratio: args.pixel_ratio,
        jpeg_quality: args.quality,
        project_name: args.project_name.or(project.name),
        font_dirs: args.font_dirs,
        ..ExportConfig::default()
    };
    let sink = Arc::new(DirectorySink::new(&args.out_dir));
    let pipeline = ExportPipeline::with_defaults(config, sink);

    let report = if let Some(id) = &args.post {
        let id = PostId::from(id.as_str());
        let post = project
            .posts
            .iter()
            .find(|p| p.id == id)
            .with_context(|| format!("No post with id {id}"))?;
        pipeline.export_post(post, size, &catalog, format).await?
    } else if let Some(carousel) = &args.carousel {
        pipeline
            .export_carousel(&project.posts, carousel, size, &catalog)
            .await?
    } else {
        pipeline.export_posts(&project.posts, size, &catalog).await?
    };

    for warning in &report.warnings {
        tracing::warn!("{warning}");
    }
    for file in &report.files {
        println!("{}", args.out_dir.join(file).display());
    }
    Ok(())
}
