//! Style descriptors - backend-independent description of how an element
//! looks.
//!
//! A [`StyleDescriptor`] is computed once per element and consumed by every
//! render path. It can be emitted as CSS declarations for inspection, and the
//! SVG backend reads its fields directly.

use postcraft_core::color::clamp;
use postcraft_core::{
    BlendMode, Border, BorderStyle, Element, Frame, GradientElement, ImageElement, ImageFilters,
    QrCodeElement, ShapeElement, ShapeKind, TextAlign, TextElement, VerticalAlign,
};

/// Highlight color for accent spans when the element sets none.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#fbbf24";

/// Absolute box in post pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl BoxGeometry {
    /// Box center.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl From<&Frame> for BoxGeometry {
    fn from(frame: &Frame) -> Self {
        Self {
            x: frame.x,
            y: frame.y,
            width: frame.width.max(1.0),
            height: frame.height.max(1.0),
        }
    }
}

/// One CSS filter function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterFunction {
    /// Multiplier, neutral 1.
    Brightness(f32),
    /// Multiplier, neutral 1.
    Contrast(f32),
    /// Multiplier, neutral 1.
    Saturate(f32),
    /// Radius in px, neutral 0.
    Blur(f32),
    /// Amount `0..=1`, neutral 0.
    Grayscale(f32),
    /// Amount `0..=1`, neutral 0.
    Sepia(f32),
    /// Degrees, neutral 0.
    HueRotate(f32),
    /// Amount `0..=1`, neutral 0.
    Invert(f32),
}

impl FilterFunction {
    /// CSS function notation.
    #[must_use]
    pub fn to_css(self) -> String {
        match self {
            Self::Brightness(v) => format!("brightness({v})"),
            Self::Contrast(v) => format!("contrast({v})"),
            Self::Saturate(v) => format!("saturate({v})"),
            Self::Blur(v) => format!("blur({v}px)"),
            Self::Grayscale(v) => format!("grayscale({v})"),
            Self::Sepia(v) => format!("sepia({v})"),
            Self::HueRotate(v) => format!("hue-rotate({v}deg)"),
            Self::Invert(v) => format!("invert({v})"),
        }
    }

    /// Whether the function leaves pixels unchanged.
    #[must_use]
    pub fn is_identity(self) -> bool {
        match self {
            Self::Brightness(v) | Self::Contrast(v) | Self::Saturate(v) => {
                (v - 1.0).abs() < f32::EPSILON
            }
            Self::Blur(v)
            | Self::Grayscale(v)
            | Self::Sepia(v)
            | Self::HueRotate(v)
            | Self::Invert(v) => v.abs() < f32::EPSILON,
        }
    }
}

/// Image filter chain, always in the fixed order brightness, contrast,
/// saturate, blur, grayscale, sepia, hue-rotate, invert.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain(pub Vec<FilterFunction>);

impl FilterChain {
    /// Build the chain, substituting neutral values for unset filters.
    #[must_use]
    pub fn from_filters(filters: &ImageFilters) -> Self {
        Self(vec![
            FilterFunction::Brightness(filters.brightness.unwrap_or(1.0).max(0.0)),
            FilterFunction::Contrast(filters.contrast.unwrap_or(1.0).max(0.0)),
            FilterFunction::Saturate(filters.saturate.unwrap_or(1.0).max(0.0)),
            FilterFunction::Blur(filters.blur.unwrap_or(0.0).max(0.0)),
            FilterFunction::Grayscale(clamp(filters.grayscale.unwrap_or(0.0), 0.0, 1.0)),
            FilterFunction::Sepia(clamp(filters.sepia.unwrap_or(0.0), 0.0, 1.0)),
            FilterFunction::HueRotate(filters.hue_rotate.unwrap_or(0.0)),
            FilterFunction::Invert(clamp(filters.invert.unwrap_or(0.0), 0.0, 1.0)),
        ])
    }

    /// Space-separated CSS `filter` value.
    #[must_use]
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|f| f.to_css())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether every function is neutral.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.0.iter().all(|f| f.is_identity())
    }
}

/// Backdrop filter behind text, in the fixed order blur, brightness,
/// contrast, saturate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackdropFilter {
    /// Blur radius in px.
    pub blur: f32,
    /// Brightness multiplier.
    pub brightness: f32,
    /// Contrast multiplier.
    pub contrast: f32,
    /// Saturation multiplier.
    pub saturate: f32,
}

impl BackdropFilter {
    /// CSS `backdrop-filter` value.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "blur({}px) brightness({}) contrast({}) saturate({})",
            self.blur, self.brightness, self.contrast, self.saturate
        )
    }
}

/// One text shadow.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    /// Horizontal offset.
    pub dx: f32,
    /// Vertical offset.
    pub dy: f32,
    /// Blur radius.
    pub blur: f32,
    /// Color.
    pub color: String,
}

impl Shadow {
    /// CSS `text-shadow` item.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!("{}px {}px {}px {}", self.dx, self.dy, self.blur, self.color)
    }
}

/// Flex-column main-axis placement used for vertical alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    /// `flex-start`.
    Start,
    /// `center`.
    Center,
    /// `flex-end`.
    End,
}

impl Justify {
    /// CSS `justify-content` keyword.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Start => "flex-start",
            Self::Center => "center",
            Self::End => "flex-end",
        }
    }
}

impl From<VerticalAlign> for Justify {
    fn from(align: VerticalAlign) -> Self {
        match align {
            VerticalAlign::Top => Self::Start,
            VerticalAlign::Middle => Self::Center,
            VerticalAlign::Bottom => Self::End,
        }
    }
}

/// Pill/card behind text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBackground {
    /// Fill color.
    pub color: String,
    /// Inner padding in px.
    pub padding: f32,
    /// Corner radius in px.
    pub radius: f32,
}

/// Typography and effects for a text element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Primary family.
    pub font_family: String,
    /// Family for accent spans; inherits when `None`.
    pub accent_font_family: Option<String>,
    /// Size in px.
    pub font_size: f32,
    /// Primary color.
    pub color: String,
    /// Accent color.
    pub highlight_color: String,
    /// Horizontal alignment.
    pub align: TextAlign,
    /// Vertical placement.
    pub justify: Justify,
    /// Letter spacing in px.
    pub letter_spacing: f32,
    /// Line-height multiplier.
    pub line_height: f32,
    /// Shadows, topmost first: stroke emulation, then the user shadow.
    pub shadows: Vec<Shadow>,
    /// Pill/card background.
    pub background: Option<TextBackground>,
    /// Backdrop filter, when any backdrop value is set.
    pub backdrop: Option<BackdropFilter>,
}

/// Border line.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderLine {
    /// Width in px.
    pub width: f32,
    /// Style.
    pub style: BorderStyle,
    /// Color.
    pub color: String,
}

impl BorderLine {
    fn from_border(border: Option<&Border>) -> Self {
        border.map_or_else(
            || Self {
                width: 0.0,
                style: BorderStyle::Solid,
                color: "transparent".to_string(),
            },
            |b| Self {
                width: b.width.max(0.0),
                style: b.style,
                color: b.color.clone(),
            },
        )
    }

    /// CSS `border` shorthand.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!("{}px {} {}", self.width, self.style.as_css(), self.color)
    }

    /// Whether the border paints anything.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.width > 0.0
    }
}

/// Type-specific visual styling.
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// Text box.
    Text(TextStyle),
    /// Image fill.
    Image {
        /// Filter chain.
        filter: FilterChain,
        /// Border.
        border: BorderLine,
    },
    /// Linear gradient fill.
    Gradient {
        /// Start color.
        from: String,
        /// End color.
        to: String,
        /// CSS angle in degrees.
        angle: f32,
    },
    /// Solid shape.
    Shape {
        /// Fill color.
        fill: String,
        /// Fully rounded corners (circle).
        round: bool,
        /// Border.
        border: BorderLine,
    },
    /// QR code box.
    QrCode {
        /// Module color.
        foreground: String,
        /// Light color.
        background: String,
    },
}

/// How one element looks, independent of any render backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    /// Absolute box.
    pub geometry: BoxGeometry,
    /// Rotation in degrees, `0..360`.
    pub rotation: f32,
    /// Opacity `0..=1`.
    pub opacity: f32,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Type-specific styling.
    pub visual: Visual,
}

impl StyleDescriptor {
    /// CSS declarations equivalent to this descriptor.
    #[must_use]
    pub fn to_css(&self) -> Vec<(&'static str, String)> {
        let g = &self.geometry;
        let mut css = vec![
            ("position", "absolute".to_string()),
            ("left", format!("{}px", g.x)),
            ("top", format!("{}px", g.y)),
            ("width", format!("{}px", g.width)),
            ("height", format!("{}px", g.height)),
            ("transform", format!("rotate({}deg)", self.rotation)),
            ("opacity", self.opacity.to_string()),
        ];
        if self.blend_mode != BlendMode::Normal {
            css.push(("mix-blend-mode", self.blend_mode.as_css().to_string()));
        }

        match &self.visual {
            Visual::Text(text) => {
                css.extend([
                    ("display", "flex".to_string()),
                    ("flex-direction", "column".to_string()),
                    ("justify-content", text.justify.as_css().to_string()),
                    ("text-align", text_align_css(text.align).to_string()),
                    ("font-family", text.font_family.clone()),
                    ("font-size", format!("{}px", text.font_size)),
                    ("color", text.color.clone()),
                    ("letter-spacing", format!("{}px", text.letter_spacing)),
                    ("line-height", text.line_height.to_string()),
                ]);
                if !text.shadows.is_empty() {
                    let shadows: Vec<String> = text.shadows.iter().map(Shadow::to_css).collect();
                    css.push(("text-shadow", shadows.join(", ")));
                }
                if let Some(bg) = &text.background {
                    css.extend([
                        ("background-color", bg.color.clone()),
                        ("padding", format!("{}px", bg.padding)),
                        ("border-radius", format!("{}px", bg.radius)),
                    ]);
                }
                if let Some(backdrop) = &text.backdrop {
                    css.push(("backdrop-filter", backdrop.to_css()));
                }
            }
            Visual::Image { filter, border } => {
                css.extend([
                    ("object-fit", "cover".to_string()),
                    ("filter", filter.to_css()),
                    ("border", border.to_css()),
                ]);
            }
            Visual::Gradient { from, to, angle } => {
                css.push((
                    "background",
                    format!("linear-gradient({angle}deg, {from}, {to})"),
                ));
            }
            Visual::Shape {
                fill,
                round,
                border,
            } => {
                css.extend([
                    ("background-color", fill.clone()),
                    ("border", border.to_css()),
                    (
                        "border-radius",
                        if *round { "50%" } else { "0" }.to_string(),
                    ),
                ]);
            }
            Visual::QrCode { background, .. } => {
                css.push(("background-color", background.clone()));
            }
        }
        css
    }
}

const fn text_align_css(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "left",
        TextAlign::Center => "center",
        TextAlign::Right => "right",
    }
}

fn base(frame: &Frame, blend_mode: Option<BlendMode>, visual: Visual) -> StyleDescriptor {
    StyleDescriptor {
        geometry: BoxGeometry::from(frame),
        rotation: frame.normalized_rotation(),
        opacity: clamp(frame.opacity, 0.0, 1.0),
        blend_mode: blend_mode.unwrap_or_default(),
        visual,
    }
}

/// Stroke as four same-color shadows (N, S, E, W), then the user shadow.
fn text_shadows(text: &TextElement) -> Vec<Shadow> {
    let mut shadows = Vec::new();
    if let Some(stroke) = text.stroke.as_ref().filter(|s| s.width > 0.0) {
        let w = stroke.width;
        for (dx, dy) in [(0.0, -w), (0.0, w), (w, 0.0), (-w, 0.0)] {
            shadows.push(Shadow {
                dx,
                dy,
                blur: 0.0,
                color: stroke.color.clone(),
            });
        }
    }
    if let Some(shadow) = &text.shadow {
        shadows.push(Shadow {
            dx: shadow.offset_x,
            dy: shadow.offset_y,
            blur: shadow.blur.max(0.0),
            color: shadow.color.clone(),
        });
    }
    shadows
}

fn text_style(text: &TextElement) -> TextStyle {
    let background = text.background_color.as_ref().map(|color| TextBackground {
        color: color.clone(),
        padding: text.padding.unwrap_or(0.0).max(0.0),
        radius: text.border_radius.unwrap_or(0.0).max(0.0),
    });
    let has_backdrop = text.backdrop_blur.is_some()
        || text.backdrop_brightness.is_some()
        || text.backdrop_contrast.is_some()
        || text.backdrop_saturate.is_some();
    let backdrop = has_backdrop.then(|| BackdropFilter {
        blur: text.backdrop_blur.unwrap_or(0.0).max(0.0),
        brightness: text.backdrop_brightness.unwrap_or(1.0).max(0.0),
        contrast: text.backdrop_contrast.unwrap_or(1.0).max(0.0),
        saturate: text.backdrop_saturate.unwrap_or(1.0).max(0.0),
    });

    TextStyle {
        font_family: text.font_family.clone(),
        accent_font_family: text.accent_font_family.clone(),
        font_size: text.font_size.max(1.0),
        color: text.color.clone(),
        highlight_color: text
            .highlight_color
            .clone()
            .unwrap_or_else(|| DEFAULT_HIGHLIGHT_COLOR.to_string()),
        align: text.text_align,
        justify: Justify::from(text.vertical_align),
        letter_spacing: text.letter_spacing,
        line_height: if text.line_height > 0.0 {
            text.line_height
        } else {
            1.2
        },
        shadows: text_shadows(text),
        background,
        backdrop,
    }
}

fn image_style(image: &ImageElement) -> StyleDescriptor {
    base(
        &image.frame,
        image.blend_mode,
        Visual::Image {
            filter: FilterChain::from_filters(&image.filters),
            border: BorderLine::from_border(image.border.as_ref()),
        },
    )
}

fn gradient_style(gradient: &GradientElement) -> StyleDescriptor {
    base(
        &gradient.frame,
        gradient.blend_mode,
        Visual::Gradient {
            from: gradient.color1.clone(),
            to: gradient.color2.clone(),
            angle: gradient.angle,
        },
    )
}

fn shape_style(shape: &ShapeElement) -> StyleDescriptor {
    base(
        &shape.frame,
        shape.blend_mode,
        Visual::Shape {
            fill: shape.fill_color.clone(),
            round: shape.shape == ShapeKind::Circle,
            border: BorderLine::from_border(shape.border.as_ref()),
        },
    )
}

fn qrcode_style(qr: &QrCodeElement) -> StyleDescriptor {
    base(
        &qr.frame,
        None,
        Visual::QrCode {
            foreground: qr.fg_color.clone(),
            background: qr.bg_color.clone(),
        },
    )
}

/// Compute the style descriptor of a foreground element.
///
/// Returns `None` for the background, which is painted as a cover-fit
/// backdrop instead.
#[must_use]
pub fn describe_style(element: &Element) -> Option<StyleDescriptor> {
    match element {
        Element::Text(text) => Some(base(&text.frame, None, Visual::Text(text_style(text)))),
        Element::Image(image) => Some(image_style(image)),
        Element::Gradient(gradient) => Some(gradient_style(gradient)),
        Element::Shape(shape) => Some(shape_style(shape)),
        Element::Qrcode(qr) => Some(qrcode_style(qr)),
        Element::Background(_) => None,
    }
}
