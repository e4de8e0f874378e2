//! Element views: the shared rendering contract.
//!
//! [`describe`] is a pure function from an element and its post context to a
//! style descriptor plus content. The static and interactive renderers both
//! paint the result, so their output differs only in interactive chrome.

use postcraft_core::markup::{self, Span};
use postcraft_core::{BackgroundElement, BrandAsset, Element, ElementId, PostSize};

use crate::qr::{self, QrMatrix};
use crate::style::{describe_style, StyleDescriptor, Visual};
use crate::text::{self, TextLine, TextMetrics};

/// Placeholder label for a QR code that failed to generate.
pub const QR_PLACEHOLDER: &str = "QR Code";

/// Ambient post context for describing elements.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Post dimensions.
    pub size: PostSize,
    /// Brand assets for resolving `assetId` links.
    pub assets: &'a [BrandAsset],
}

impl<'a> RenderContext<'a> {
    /// Context without brand assets.
    #[must_use]
    pub const fn new(size: PostSize) -> Self {
        Self { size, assets: &[] }
    }

    /// Attach brand assets.
    #[must_use]
    pub fn with_assets(self, assets: &'a [BrandAsset]) -> Self {
        Self { assets, ..self }
    }

    fn asset(&self, id: Option<&str>) -> Option<&'a str> {
        let id = id?;
        self.assets
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.data_url.as_str())
    }
}

/// Content painted inside an element box.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Laid-out text.
    Text {
        /// Parsed spans.
        spans: Vec<Span>,
        /// Lines after wrapping to the content box.
        lines: Vec<TextLine>,
    },
    /// Image source, cover-fit into the box.
    Image {
        /// Data URI or URL.
        src: String,
    },
    /// The style alone paints the box (gradients and shapes).
    Fill,
    /// QR module grid.
    QrCode(QrMatrix),
    /// Textual stand-in when content cannot be produced.
    Placeholder(String),
}

/// A described foreground element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
    /// Element id.
    pub id: ElementId,
    /// How the box looks.
    pub style: StyleDescriptor,
    /// What is painted in it.
    pub content: Content,
}

/// A described post background, painted cover-fit and centered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundView {
    /// Element id.
    pub id: ElementId,
    /// Image source; `None` paints the placeholder fill.
    pub src: Option<String>,
}

/// Describe the post background.
#[must_use]
pub fn describe_background(background: &BackgroundElement) -> BackgroundView {
    let src = background.src.trim();
    BackgroundView {
        id: background.id.clone(),
        src: (!src.is_empty()).then(|| src.to_string()),
    }
}

/// Describe a foreground element.
///
/// Returns `None` for the background; see [`describe_background`].
#[must_use]
pub fn describe(element: &Element, ctx: &RenderContext<'_>) -> Option<ElementView> {
    let style = describe_style(element)?;
    let content = match (element, &style.visual) {
        (Element::Text(text), Visual::Text(text_style)) => {
            let spans = markup::parse(&text.content);
            let inset = text_style.background.as_ref().map_or(0.0, |bg| bg.padding);
            let metrics = TextMetrics {
                font_size: text_style.font_size,
                letter_spacing: text_style.letter_spacing,
            };
            let max_width = (style.geometry.width - inset * 2.0).max(1.0);
            let lines = text::layout(&spans, metrics, max_width);
            Content::Text { spans, lines }
        }
        (Element::Image(image), _) => {
            let src = ctx
                .asset(image.asset_id.as_deref())
                .unwrap_or(image.src.as_str())
                .trim();
            if src.is_empty() {
                Content::Placeholder("Image".to_string())
            } else {
                Content::Image {
                    src: src.to_string(),
                }
            }
        }
        (Element::Qrcode(code), _) => qr::generate(&code.url).map_or_else(
            || Content::Placeholder(QR_PLACEHOLDER.to_string()),
            Content::QrCode,
        ),
        _ => Content::Fill,
    };

    Some(ElementView {
        id: element.id().clone(),
        style,
        content,
    })
}
