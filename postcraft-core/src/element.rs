//! Post elements - the layered building blocks of a graphic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::post::PostSize;

/// Unique identifier for an element.
///
/// Ids are opaque strings so that layout templates can be namespaced under
/// the post they are instantiated into (`{post_id}-{template_id}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing id string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id namespaced under a post id.
    #[must_use]
    pub fn namespaced(&self, post_id: &str) -> Self {
        Self(format!("{post_id}-{}", self.0))
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Minimum width/height an element can be resized to.
pub const MIN_ELEMENT_SIZE: f32 = 20.0;

/// Position, size and interaction flags shared by every foreground element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Stable identifier.
    pub id: ElementId,
    /// X position (post pixels from left).
    pub x: f32,
    /// Y position (post pixels from top).
    pub y: f32,
    /// Width in post pixels.
    pub width: f32,
    /// Height in post pixels.
    pub height: f32,
    /// Rotation in degrees, any real value.
    #[serde(default)]
    pub rotation: f32,
    /// Opacity, `0.0..=1.0`.
    #[serde(default = "Frame::default_opacity")]
    pub opacity: f32,
    /// Suppresses drag/resize.
    #[serde(default)]
    pub locked: bool,
    /// Hidden elements are kept in the model but never painted.
    #[serde(default = "Frame::default_visible")]
    pub visible: bool,
    /// Display-name override for the layer list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Frame {
    const fn default_opacity() -> f32 {
        1.0
    }

    const fn default_visible() -> bool {
        true
    }

    /// A visible, unlocked, unrotated frame with a fresh id.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: ElementId::new(),
            x,
            y,
            width,
            height,
            rotation: 0.0,
            opacity: 1.0,
            locked: false,
            visible: true,
            name: None,
        }
    }

    /// Force size to at least one pixel and opacity into `0.0..=1.0`.
    pub fn sanitize(&mut self) {
        self.width = crate::color::clamp(self.width, 1.0, f32::MAX);
        self.height = crate::color::clamp(self.height, 1.0, f32::MAX);
        self.opacity = crate::color::clamp(self.opacity, 0.0, 1.0);
    }

    /// Rotation folded into `0.0..360.0`.
    #[must_use]
    pub fn normalized_rotation(&self) -> f32 {
        self.rotation.rem_euclid(360.0)
    }

    /// Box center in post coordinates.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point (in post coordinates) is within the rotated box.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let (cx, cy) = self.center();
        let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
        let dx = x - cx;
        let dy = y - cy;
        let local_x = dx * cos - dy * sin;
        let local_y = dx * sin + dy * cos;
        local_x.abs() <= self.width / 2.0 && local_y.abs() <= self.height / 2.0
    }
}

/// CSS `mix-blend-mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// CSS keyword.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
            Self::HardLight => "hard-light",
            Self::SoftLight => "soft-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical text alignment inside the element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Drop shadow behind text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShadow {
    /// Horizontal offset in px.
    pub offset_x: f32,
    /// Vertical offset in px.
    pub offset_y: f32,
    /// Blur radius in px.
    pub blur: f32,
    /// Shadow color.
    pub color: String,
}

/// Text outline, emulated with four offset shadows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStroke {
    /// Outline color.
    pub color: String,
    /// Outline width in px.
    pub width: f32,
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl BorderStyle {
    /// CSS keyword.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
        }
    }
}

/// Border around an image or shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    /// Line width in px.
    pub width: f32,
    /// Line style.
    #[serde(default)]
    pub style: BorderStyle,
    /// Line color.
    pub color: String,
}

/// Text content with typography and effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Box and flags.
    #[serde(flatten)]
    pub frame: Frame,
    /// Text, may contain `**accent**` spans.
    pub content: String,
    /// Primary font family.
    pub font_family: String,
    /// Font size in px.
    pub font_size: f32,
    /// Font family for accent spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_font_family: Option<String>,
    /// Primary text color.
    pub color: String,
    /// Color for accent spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    /// Horizontal alignment.
    #[serde(default)]
    pub text_align: TextAlign,
    /// Vertical alignment.
    #[serde(default)]
    pub vertical_align: VerticalAlign,
    /// Letter spacing in px.
    #[serde(default)]
    pub letter_spacing: f32,
    /// Unitless line-height multiplier.
    #[serde(default = "TextElement::default_line_height")]
    pub line_height: f32,
    /// Drop shadow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<TextShadow>,
    /// Outline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<TextStroke>,
    /// Pill/card background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Pill/card padding in px.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f32>,
    /// Pill/card corner radius in px.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f32>,
    /// Backdrop blur in px.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_blur: Option<f32>,
    /// Backdrop brightness multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_brightness: Option<f32>,
    /// Backdrop contrast multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_contrast: Option<f32>,
    /// Backdrop saturation multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_saturate: Option<f32>,
}

impl TextElement {
    const fn default_line_height() -> f32 {
        1.2
    }

    /// Plain text with default typography.
    #[must_use]
    pub fn new(frame: Frame, content: impl Into<String>) -> Self {
        Self {
            frame,
            content: content.into(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: 32.0,
            accent_font_family: None,
            color: "#ffffff".to_string(),
            highlight_color: None,
            text_align: TextAlign::Center,
            vertical_align: VerticalAlign::Middle,
            letter_spacing: 0.0,
            line_height: Self::default_line_height(),
            shadow: None,
            stroke: None,
            background_color: None,
            padding: None,
            border_radius: None,
            backdrop_blur: None,
            backdrop_brightness: None,
            backdrop_contrast: None,
            backdrop_saturate: None,
        }
    }
}

/// CSS filter bundle for images. `None` means the neutral value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ImageFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturate: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grayscale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sepia: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue_rotate: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert: Option<f32>,
}

/// Raster image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    /// Box and flags.
    #[serde(flatten)]
    pub frame: Frame,
    /// Data URI or URL.
    pub src: String,
    /// Reusable brand asset this image was placed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// Filter bundle.
    #[serde(default)]
    pub filters: ImageFilters,
    /// Optional border.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    /// Optional blend mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
}

/// Two-stop linear gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientElement {
    /// Box and flags.
    #[serde(flatten)]
    pub frame: Frame,
    /// Start color.
    pub color1: String,
    /// End color.
    pub color2: String,
    /// CSS angle in degrees (0 = towards top).
    pub angle: f32,
    /// Optional blend mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
}

/// Shape variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
}

/// Filled rectangle or circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    /// Box and flags.
    #[serde(flatten)]
    pub frame: Frame,
    /// Variant.
    pub shape: ShapeKind,
    /// Fill color.
    pub fill_color: String,
    /// Optional border.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    /// Optional blend mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
}

/// QR code generated at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeElement {
    /// Box and flags.
    #[serde(flatten)]
    pub frame: Frame,
    /// Encoded URL.
    pub url: String,
    /// Module color.
    pub fg_color: String,
    /// Quiet-zone and light-module color.
    pub bg_color: String,
}

/// Full-canvas backdrop image. Exactly one per post, always at the bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundElement {
    /// Stable identifier.
    pub id: ElementId,
    /// Data URI or URL; empty for a placeholder.
    #[serde(default)]
    pub src: String,
    /// Prompt used to generate the image, for regeneration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Image provider tag, for regeneration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl BackgroundElement {
    /// Empty placeholder background.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            id: ElementId::new(),
            src: String::new(),
            prompt: None,
            provider: None,
        }
    }
}

/// A post element, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Element {
    Text(TextElement),
    Image(ImageElement),
    Gradient(GradientElement),
    Shape(ShapeElement),
    Qrcode(QrCodeElement),
    Background(BackgroundElement),
}

/// Element discriminant without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ElementType {
    Text,
    Image,
    Gradient,
    Shape,
    Qrcode,
    Background,
}

/// Font family used when nothing else is specified.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

/// Placeholder URL for QR codes created without a target.
pub const DEFAULT_QR_URL: &str = "https://example.com";

/// What to construct in an Add operation.
#[derive(Debug, Clone, PartialEq)]
pub enum NewElement {
    /// Text with the given content (default copy when `None`).
    Text(Option<String>),
    /// Image from a source, optionally linked to a brand asset.
    Image {
        /// Data URI or URL.
        src: String,
        /// Brand asset id.
        asset_id: Option<String>,
    },
    /// Full-canvas overlay gradient.
    Gradient,
    /// Rectangle or circle.
    Shape(ShapeKind),
    /// QR code for a URL (placeholder when `None`).
    QrCode(Option<String>),
}

impl Element {
    /// Build a new element with type defaults, positioned for `size`.
    #[must_use]
    pub fn create(kind: NewElement, size: PostSize) -> Self {
        let (cx, cy) = (size.width / 2.0, size.height / 2.0);
        match kind {
            NewElement::Text(content) => Self::Text(TextElement::new(
                Frame::new(cx - 150.0, cy - 25.0, 300.0, 50.0),
                content.unwrap_or_else(|| "New text".to_string()),
            )),
            NewElement::Image { src, asset_id } => Self::Image(ImageElement {
                frame: Frame::new(cx - 150.0, cy - 150.0, 300.0, 300.0),
                src,
                asset_id,
                filters: ImageFilters::default(),
                border: None,
                blend_mode: None,
            }),
            NewElement::Gradient => Self::Gradient(GradientElement {
                frame: Frame::new(0.0, 0.0, size.width, size.height),
                color1: "rgba(0, 0, 0, 0)".to_string(),
                color2: "rgba(0, 0, 0, 0.8)".to_string(),
                angle: 180.0,
                blend_mode: None,
            }),
            NewElement::Shape(shape) => Self::Shape(ShapeElement {
                frame: Frame::new(cx - 100.0, cy - 100.0, 200.0, 200.0),
                shape,
                fill_color: "#3b82f6".to_string(),
                border: None,
                blend_mode: None,
            }),
            NewElement::QrCode(url) => Self::Qrcode(QrCodeElement {
                frame: Frame::new(cx - 100.0, cy - 100.0, 200.0, 200.0),
                url: url.unwrap_or_else(|| DEFAULT_QR_URL.to_string()),
                fg_color: "#000000".to_string(),
                bg_color: "#ffffff".to_string(),
            }),
        }
    }

    /// The element id.
    #[must_use]
    pub fn id(&self) -> &ElementId {
        match self {
            Self::Text(e) => &e.frame.id,
            Self::Image(e) => &e.frame.id,
            Self::Gradient(e) => &e.frame.id,
            Self::Shape(e) => &e.frame.id,
            Self::Qrcode(e) => &e.frame.id,
            Self::Background(bg) => &bg.id,
        }
    }

    /// Discriminant.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Text(_) => ElementType::Text,
            Self::Image(_) => ElementType::Image,
            Self::Gradient(_) => ElementType::Gradient,
            Self::Shape(_) => ElementType::Shape,
            Self::Qrcode(_) => ElementType::Qrcode,
            Self::Background(_) => ElementType::Background,
        }
    }

    /// Box and flags; `None` for the background.
    #[must_use]
    pub const fn frame(&self) -> Option<&Frame> {
        match self {
            Self::Text(e) => Some(&e.frame),
            Self::Image(e) => Some(&e.frame),
            Self::Gradient(e) => Some(&e.frame),
            Self::Shape(e) => Some(&e.frame),
            Self::Qrcode(e) => Some(&e.frame),
            Self::Background(_) => None,
        }
    }

    /// Mutable box and flags; `None` for the background.
    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        match self {
            Self::Text(e) => Some(&mut e.frame),
            Self::Image(e) => Some(&mut e.frame),
            Self::Gradient(e) => Some(&mut e.frame),
            Self::Shape(e) => Some(&mut e.frame),
            Self::Qrcode(e) => Some(&mut e.frame),
            Self::Background(_) => None,
        }
    }

    /// Whether this is the post background.
    #[must_use]
    pub const fn is_background(&self) -> bool {
        matches!(self, Self::Background(_))
    }

    /// Backgrounds are always visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.frame().map_or(true, |f| f.visible)
    }

    /// Backgrounds are never locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.frame().is_some_and(|f| f.locked)
    }

    /// Replace the id, keeping everything else.
    #[must_use]
    pub fn with_id(mut self, id: ElementId) -> Self {
        match &mut self {
            Self::Background(bg) => bg.id = id,
            other => {
                if let Some(frame) = other.frame_mut() {
                    frame.id = id;
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_default_is_centered() {
        let element = Element::create(NewElement::Text(None), PostSize::SQUARE);
        let frame = element.frame().expect("text has a frame");
        assert!((frame.x - 390.0).abs() < f32::EPSILON);
        assert!((frame.y - 515.0).abs() < f32::EPSILON);
        assert!((frame.width - 300.0).abs() < f32::EPSILON);
        assert!((frame.height - 50.0).abs() < f32::EPSILON);
        assert!(frame.x >= 0.0 && frame.x + frame.width <= 1080.0);
    }

    #[test]
    fn test_serde_uses_type_tag_and_camel_case() {
        let element = Element::create(NewElement::Text(Some("Hi".into())), PostSize::SQUARE);
        let json = serde_json::to_value(&element).expect("serialize");
        assert_eq!(json["type"], "text");
        assert_eq!(json["fontFamily"], "Inter");
        assert_eq!(json["textAlign"], "center");
        assert!(json.get("frame").is_none(), "frame is flattened");

        let back: Element = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, element);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let json = serde_json::json!({
            "type": "shape",
            "id": "s1",
            "x": 10, "y": 20, "width": 30, "height": 40,
            "shape": "circle",
            "fillColor": "#ff0000"
        });
        let element: Element = serde_json::from_value(json).expect("deserialize");
        assert!(element.is_visible());
        assert!(!element.is_locked());
        assert_eq!(element.id().as_str(), "s1");
        let frame = element.frame().expect("frame");
        assert!((frame.opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_background_has_no_frame() {
        let bg = Element::Background(BackgroundElement::placeholder());
        assert!(bg.frame().is_none());
        assert!(bg.is_visible());
        assert!(!bg.is_locked());
        assert_eq!(bg.element_type(), ElementType::Background);
    }

    #[test]
    fn test_contains_point_respects_rotation() {
        let mut frame = Frame::new(0.0, 0.0, 200.0, 20.0);
        assert!(frame.contains_point(190.0, 10.0));
        frame.rotation = 90.0;
        // Rotated about its center, the box now spans x 90..110, y -90..110.
        assert!(!frame.contains_point(190.0, 10.0));
        assert!(frame.contains_point(100.0, -80.0));
    }

    #[test]
    fn test_normalized_rotation() {
        let mut frame = Frame::new(0.0, 0.0, 10.0, 10.0);
        frame.rotation = -90.0;
        assert!((frame.normalized_rotation() - 270.0).abs() < f32::EPSILON);
        frame.rotation = 720.0;
        assert!(frame.normalized_rotation().abs() < f32::EPSILON);
    }

    #[test]
    fn test_namespaced_id() {
        let id = ElementId::from("title");
        assert_eq!(id.namespaced("post-1").as_str(), "post-1-title");
    }
}
