//! Rasterization of rendered posts.
//!
//! [`Rasterizer`] is the capture primitive the export pipeline depends on;
//! [`ResvgRasterizer`] implements it with resvg and tiny-skia.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use image::ImageEncoder;
use postcraft_core::color::Rgba;
use tracing::debug;
use usvg::fontdb;

use crate::error::{RenderError, RenderResult};
use crate::fonts::FontFace;
use crate::static_render::StaticDocument;

/// Raster output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless PNG with alpha.
    #[default]
    Png,
    /// JPEG, flattened onto the matte color.
    Jpeg,
}

impl ImageFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// MIME type.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(RenderError::Validation(format!(
                "Unsupported image format: {other}"
            ))),
        }
    }
}

/// Options for one capture.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Supersampling factor applied to the post dimensions.
    pub pixel_ratio: f32,
    /// Output format.
    pub format: ImageFormat,
    /// JPEG quality `1..=100`.
    pub quality: u8,
    /// Fonts loaded for this export.
    pub fonts: Arc<[FontFace]>,
    /// Color JPEG output is flattened onto.
    pub matte: Rgba,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            format: ImageFormat::Png,
            quality: 95,
            fonts: Arc::from(Vec::new()),
            matte: Rgba::rgb(255, 255, 255),
        }
    }
}

impl RasterOptions {
    /// Output pixel dimensions for a document.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn output_size(&self, doc: &StaticDocument) -> (u32, u32) {
        let ratio = self.pixel_ratio.max(0.1);
        (
            ((doc.width as f32 * ratio).round() as u32).max(1),
            ((doc.height as f32 * ratio).round() as u32).max(1),
        )
    }
}

/// Turns a rendered post into encoded image bytes.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Capture `doc` as an encoded image.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Raster`] or [`RenderError::Export`] if the
    /// document cannot be rasterized or encoded.
    async fn rasterize(&self, doc: &StaticDocument, options: &RasterOptions)
        -> RenderResult<Vec<u8>>;

    /// Whether `family` renders without loading extra faces.
    fn has_family(&self, _family: &str) -> bool {
        true
    }
}

/// Rasterizer backed by resvg.
#[derive(Clone)]
pub struct ResvgRasterizer {
    fonts: Arc<fontdb::Database>,
}

impl std::fmt::Debug for ResvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResvgRasterizer")
            .field("faces", &self.fonts.len())
            .finish()
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl ResvgRasterizer {
    /// Rasterizer using system fonts plus every font in `font_dirs`.
    #[must_use]
    pub fn new(font_dirs: &[PathBuf]) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            db.load_fonts_dir(dir);
        }
        debug!(faces = db.len(), "font database ready");
        Self { fonts: Arc::new(db) }
    }

    /// Whether the font database holds a face of `family`.
    #[must_use]
    pub fn contains_family(&self, family: &str) -> bool {
        let family = family.trim();
        self.fonts.faces().any(|face| {
            face.families
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(family))
        })
    }

    fn database_for(&self, faces: &[FontFace]) -> Arc<fontdb::Database> {
        if faces.is_empty() {
            return Arc::clone(&self.fonts);
        }
        let mut db = (*self.fonts).clone();
        for face in faces {
            db.load_font_data(face.data.clone());
        }
        Arc::new(db)
    }

    /// Rasterize synchronously.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing, rendering or encoding fails.
    pub fn rasterize_blocking(
        &self,
        doc: &StaticDocument,
        options: &RasterOptions,
    ) -> RenderResult<Vec<u8>> {
        let pixmap = self.render_pixmap(doc, options)?;
        match options.format {
            ImageFormat::Png => pixmap
                .encode_png()
                .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}"))),
            ImageFormat::Jpeg => encode_jpeg(&pixmap, options.matte, options.quality),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn render_pixmap(
        &self,
        doc: &StaticDocument,
        options: &RasterOptions,
    ) -> RenderResult<tiny_skia::Pixmap> {
        let opt = usvg::Options {
            fontdb: self.database_for(&options.fonts),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&doc.svg, &opt)
            .map_err(|e| RenderError::Raster(format!("SVG parsing failed: {e}")))?;

        let (px_w, px_h) = options.output_size(doc);
        let mut pixmap = tiny_skia::Pixmap::new(px_w, px_h)
            .ok_or_else(|| RenderError::Raster(format!("cannot allocate {px_w}x{px_h} pixmap")))?;

        let sx = px_w as f32 / tree.size().width();
        let sy = px_h as f32 / tree.size().height();
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );
        Ok(pixmap)
    }
}

#[async_trait]
impl Rasterizer for ResvgRasterizer {
    async fn rasterize(
        &self,
        doc: &StaticDocument,
        options: &RasterOptions,
    ) -> RenderResult<Vec<u8>> {
        let rasterizer = self.clone();
        let doc = doc.clone();
        let options = options.clone();
        tokio::task::spawn_blocking(move || rasterizer.rasterize_blocking(&doc, &options))
            .await
            .map_err(|e| RenderError::Raster(format!("rasterizer task failed: {e}")))?
    }

    fn has_family(&self, family: &str) -> bool {
        self.contains_family(family)
    }
}

/// Flatten premultiplied RGBA onto `matte` and encode as JPEG.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_jpeg(pixmap: &tiny_skia::Pixmap, matte: Rgba, quality: u8) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let matte_rgb = [f32::from(matte.r), f32::from(matte.g), f32::from(matte.b)];
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in pixmap.data().chunks_exact(4) {
        let inv = 1.0 - f32::from(pixel[3]) / 255.0;
        for (channel, matte_channel) in pixel[..3].iter().zip(matte_rgb) {
            // Premultiplied: color already carries its alpha.
            rgb.push(matte_channel.mul_add(inv, f32::from(*channel)).round().min(255.0) as u8);
        }
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder
        .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}
