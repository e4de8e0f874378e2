//! # Postcraft Core
//!
//! Editor logic for social-media post graphics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               postcraft-core                │
//! ├─────────────────────────────────────────────┤
//! │  Scene Model     │  Editing                 │
//! │  - Elements      │  - Layer stack ops       │
//! │  - Posts         │  - Selection / session   │
//! │  - Carousels     │  - Drag / resize         │
//! ├─────────────────────────────────────────────┤
//! │  Brand Kits      │  Assistant contract      │
//! │  - File format   │  - Layout suggestions    │
//! │  - Templates     │  - Background / palette  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Posts are immutable values: every edit swaps in a new element list, so
//! renderers can detect changes with [`Post::same_revision`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assist;
pub mod brandkit;
pub mod canvas;
pub mod color;
pub mod element;
pub mod error;
pub mod event;
pub mod font;
pub mod layers;
pub mod markup;
pub mod patch;
pub mod post;
pub mod session;

pub use assist::{DesignAssistant, GeneratedImage, LayoutRequest, TextSuggestion};
pub use brandkit::{BrandAsset, BrandKit, BrandKitLibrary, BrandKitRepository, LayoutTemplate};
pub use canvas::CanvasInteraction;
pub use element::{
    BackgroundElement, BlendMode, Border, BorderStyle, Element, ElementId, ElementType, Frame,
    GradientElement, ImageElement, ImageFilters, NewElement, QrCodeElement, ShapeElement,
    ShapeKind, TextAlign, TextElement, TextShadow, TextStroke, VerticalAlign,
};
pub use error::{EditorError, EditorResult};
pub use event::{PointerEvent, PointerPhase, PointerTarget};
pub use font::FontCatalog;
pub use layers::LayerDirection;
pub use patch::ElementPatch;
pub use post::{carousel_ids, carousel_slides, Post, PostId, PostSize};
pub use session::EditorSession;

/// Postcraft core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
