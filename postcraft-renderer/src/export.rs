//! Post export to PNG, JPEG and ZIP.
//!
//! Each export runs the same steps:
//!
//! 1. collect the font families the posts use and preload the remote ones;
//! 2. for each post, inline remote images, render it statically and mount
//!    it in the off-screen root;
//! 3. wait for the settle delay, then rasterize;
//! 4. unmount (always, via the mount guard);
//! 5. package one image or a ZIP of PNGs and hand it to the download sink.
//!
//! Batches are captured one post at a time. The first failure aborts the
//! batch and nothing is delivered.
//!
//! Image elements linked to brand assets should be refreshed with
//! [`postcraft_core::brandkit::resolve_assets`] before export.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use postcraft_core::color::Rgba;
use postcraft_core::{carousel_slides, FontCatalog, Post, PostSize};
use tracing::{debug, info, warn};

use crate::error::{RenderError, RenderResult};
use crate::fonts::{collect_font_families, preload_fonts, FontLoader, HttpFontLoader};
use crate::offscreen::OffscreenRoot;
use crate::package::{
    archive_name, batch_file_names, build_zip, carousel_archive_name, single_file_name,
    DownloadSink, ZIP_MIME,
};
use crate::raster::{ImageFormat, RasterOptions, Rasterizer, ResvgRasterizer};
use crate::resolve::{inline_remote_images, HttpImageFetcher, ImageFetcher};
use crate::static_render::StaticRenderer;

/// Configuration for exports.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Supersampling factor (default: 2.0).
    pub pixel_ratio: f32,
    /// JPEG quality 1-100 (default: 95).
    pub jpeg_quality: u8,
    /// Pause between mounting and capture (default: 150ms).
    pub settle_delay: Duration,
    /// Color JPEG output is flattened onto (default: white).
    pub matte: Rgba,
    /// Prefix for file names; ids and sequence numbers are used when unset.
    pub project_name: Option<String>,
    /// Extra directories scanned for fonts by the default rasterizer.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            jpeg_quality: 95,
            settle_delay: Duration::from_millis(150),
            matte: Rgba::rgb(255, 255, 255),
            project_name: None,
            font_dirs: Vec::new(),
        }
    }
}

/// What an export delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Delivered file names.
    pub files: Vec<String>,
    /// Non-fatal problems, such as fonts that fell back.
    pub warnings: Vec<String>,
}

/// Clears the busy flag when dropped.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> RenderResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RenderError::Busy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates font preload, off-screen rendering, rasterization,
/// packaging and delivery.
pub struct ExportPipeline {
    config: ExportConfig,
    rasterizer: Arc<dyn Rasterizer>,
    font_loader: Arc<dyn FontLoader>,
    image_fetcher: Arc<dyn ImageFetcher>,
    sink: Arc<dyn DownloadSink>,
    root: OffscreenRoot,
    busy: Arc<AtomicBool>,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl ExportPipeline {
    /// Create a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        config: ExportConfig,
        rasterizer: Arc<dyn Rasterizer>,
        font_loader: Arc<dyn FontLoader>,
        image_fetcher: Arc<dyn ImageFetcher>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            font_loader,
            image_fetcher,
            sink,
            root: OffscreenRoot::new(),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pipeline using resvg and HTTP for fonts and images.
    #[must_use]
    pub fn with_defaults(config: ExportConfig, sink: Arc<dyn DownloadSink>) -> Self {
        let client = reqwest::Client::new();
        let rasterizer = Arc::new(ResvgRasterizer::new(&config.font_dirs));
        Self::new(
            config,
            rasterizer,
            Arc::new(HttpFontLoader::new(client.clone())),
            Arc::new(HttpImageFetcher::new(client)),
            sink,
        )
    }

    /// Export configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Whether an export is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The off-screen root posts are mounted into.
    #[must_use]
    pub fn root(&self) -> &OffscreenRoot {
        &self.root
    }

    /// Export one post as a single image.
    ///
    /// # Errors
    ///
    /// Returns an error if another export is running, or if capture or
    /// delivery fails.
    pub async fn export_post(
        &self,
        post: &Post,
        size: PostSize,
        catalog: &FontCatalog,
        format: ImageFormat,
    ) -> RenderResult<ExportReport> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.single(post, size, catalog, format).await
    }

    /// Export posts: one post becomes a single PNG, several become a ZIP of
    /// PNGs named in order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Validation`] for an empty list and
    /// [`RenderError::Capture`] when a post fails; nothing is delivered then.
    pub async fn export_posts(
        &self,
        posts: &[Post],
        size: PostSize,
        catalog: &FontCatalog,
    ) -> RenderResult<ExportReport> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        match posts {
            [] => Err(RenderError::Validation("No posts to export".to_string())),
            [post] => self.single(post, size, catalog, ImageFormat::Png).await,
            _ => {
                let posts: Vec<&Post> = posts.iter().collect();
                let name = archive_name(self.config.project_name.as_deref());
                self.archive(&posts, size, catalog, name).await
            }
        }
    }

    /// Export the slides of one carousel, in slide order, as a ZIP.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Validation`] if no post belongs to the
    /// carousel, and [`RenderError::Capture`] when a slide fails.
    pub async fn export_carousel(
        &self,
        posts: &[Post],
        carousel_id: &str,
        size: PostSize,
        catalog: &FontCatalog,
    ) -> RenderResult<ExportReport> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        let slides = carousel_slides(posts, carousel_id);
        if slides.is_empty() {
            return Err(RenderError::Validation(format!(
                "Carousel {carousel_id} has no slides"
            )));
        }
        let name = carousel_archive_name(carousel_id, self.config.project_name.as_deref());
        self.archive(&slides, size, catalog, name).await
    }

    async fn single(
        &self,
        post: &Post,
        size: PostSize,
        catalog: &FontCatalog,
        format: ImageFormat,
    ) -> RenderResult<ExportReport> {
        info!(post = %post.id, ?format, "exporting post");
        let (options, warnings) = self.prepare([post], catalog, format).await;
        let bytes = self.capture(post, size, &options).await?;

        let file_name = single_file_name(post, self.config.project_name.as_deref(), format);
        self.sink.deliver(&file_name, format.mime(), bytes).await?;
        info!(file = %file_name, "export complete");
        Ok(ExportReport {
            files: vec![file_name],
            warnings,
        })
    }

    async fn archive(
        &self,
        posts: &[&Post],
        size: PostSize,
        catalog: &FontCatalog,
        archive: String,
    ) -> RenderResult<ExportReport> {
        info!(count = posts.len(), archive = %archive, "exporting batch");
        let (options, warnings) = self
            .prepare(posts.iter().copied(), catalog, ImageFormat::Png)
            .await;

        let names = batch_file_names(posts.iter().copied());
        let mut entries = Vec::with_capacity(posts.len());
        for (index, (post, name)) in posts.iter().zip(names).enumerate() {
            match self.capture(post, size, &options).await {
                Ok(bytes) => entries.push((name, bytes)),
                Err(err) => {
                    warn!(index, post = %post.id, error = %err, "batch export aborted");
                    return Err(RenderError::Capture {
                        index,
                        source: Box::new(err),
                    });
                }
            }
        }

        let zip = build_zip(&entries)?;
        self.sink.deliver(&archive, ZIP_MIME, zip).await?;
        info!(archive = %archive, entries = entries.len(), "export complete");
        Ok(ExportReport {
            files: vec![archive],
            warnings,
        })
    }

    async fn prepare<'a>(
        &self,
        posts: impl IntoIterator<Item = &'a Post>,
        catalog: &FontCatalog,
        format: ImageFormat,
    ) -> (RasterOptions, Vec<String>) {
        let families = collect_font_families(posts);
        let preload = preload_fonts(&families, catalog, self.font_loader.as_ref(), |family| {
            self.rasterizer.has_family(family)
        })
        .await;
        let options = RasterOptions {
            pixel_ratio: self.config.pixel_ratio,
            format,
            quality: self.config.jpeg_quality,
            fonts: Arc::from(preload.faces),
            matte: self.config.matte,
        };
        (options, preload.warnings)
    }

    async fn capture(
        &self,
        post: &Post,
        size: PostSize,
        options: &RasterOptions,
    ) -> RenderResult<Vec<u8>> {
        let post = inline_remote_images(post, self.image_fetcher.as_ref()).await?;
        let document = StaticRenderer::render(&post, size);
        let mounted = self.root.mount(&post.id, document)?;
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }
        let result = self.rasterizer.rasterize(mounted.document(), options).await;
        drop(mounted);
        debug!(post = %post.id, ok = result.is_ok(), "captured post");
        result
    }
}
