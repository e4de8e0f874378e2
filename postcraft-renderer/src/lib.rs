//! # Postcraft Renderer
//!
//! Rendering and export for Postcraft posts.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │      Element → StyleDescriptor (style)      │
//! ├──────────────────────┬──────────────────────┤
//! │ Interactive canvas   │ Static renderer      │
//! │ (selection chrome,   │ (export, previews)   │
//! │  hit testing)        │                      │
//! ├──────────────────────┴──────────────────────┤
//! │ Export: fonts → mount → rasterize → package │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Both renderers share one descriptor per element, so the canvas and the
//! exported image agree on layout and styling.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod fonts;
pub mod interactive;
pub mod offscreen;
pub mod package;
pub mod qr;
pub mod raster;
pub mod resolve;
pub mod static_render;
pub mod style;
pub mod svg;
pub mod text;
pub mod view;

pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportPipeline, ExportReport};
pub use fonts::{FontFace, FontLoader, HttpFontLoader};
pub use offscreen::{MountedRoot, OffscreenRoot};
pub use package::{DirectorySink, Download, DownloadSink, MemorySink};
pub use raster::{ImageFormat, RasterOptions, Rasterizer, ResvgRasterizer};
pub use resolve::{FetchedImage, HttpImageFetcher, ImageFetcher};
pub use static_render::{StaticDocument, StaticRenderer};
pub use style::{describe_style, StyleDescriptor};
pub use view::RenderContext;

/// Postcraft renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
