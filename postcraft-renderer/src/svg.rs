//! SVG backend for element views.
//!
//! Every element is wrapped in a group carrying its rotation (about the box
//! center), opacity and blend mode; the body is painted in post pixels.

use std::fmt::Write;

use postcraft_core::color::parse_color;
use postcraft_core::{BorderStyle, PostSize, TextAlign};

use crate::qr::QrMatrix;
use crate::style::{BorderLine, BoxGeometry, FilterChain, Justify, TextStyle, Visual};
use crate::text::TextLine;
use crate::view::{BackgroundView, Content, ElementView};

/// Fill used where an image or code is missing.
pub const PLACEHOLDER_FILL: &str = "#e5e7eb";

/// Baseline offset below the vertical middle of a line box, in em.
const BASELINE_SHIFT: f32 = 0.35;

/// Incremental SVG document writer.
#[derive(Debug)]
pub struct SvgBuilder {
    svg: String,
    next_def: usize,
}

impl SvgBuilder {
    /// Open a document sized to the post.
    #[must_use]
    pub fn new(size: PostSize) -> Self {
        let (w, h) = size.pixels();
        let mut svg = String::with_capacity(8192);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        );
        Self { svg, next_def: 0 }
    }

    fn def_id(&mut self, kind: &str) -> String {
        self.next_def += 1;
        format!("pc-{kind}-{}", self.next_def)
    }

    /// Append raw markup.
    pub fn raw(&mut self, markup: &str) {
        self.svg.push_str(markup);
    }

    /// Paint the background cover-fit over the whole post.
    pub fn background(&mut self, view: &BackgroundView, size: PostSize) {
        let (w, h) = size.pixels();
        let id = escape_xml(view.id.as_str());
        match &view.src {
            Some(src) => {
                let _ = write!(
                    self.svg,
                    "<image data-id=\"{id}\" x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"xMidYMid slice\" xlink:href=\"{}\"/>",
                    escape_xml(src),
                );
            }
            None => {
                let _ = write!(
                    self.svg,
                    "<rect data-id=\"{id}\" x=\"0\" y=\"0\" width=\"{w}\" height=\"{h}\" fill=\"{PLACEHOLDER_FILL}\"/>",
                );
            }
        }
    }

    /// Paint one foreground element.
    pub fn element(&mut self, view: &ElementView) {
        let style = &view.style;
        let g = style.geometry;
        let (cx, cy) = g.center();

        let _ = write!(self.svg, "<g data-id=\"{}\"", escape_xml(view.id.as_str()));
        if style.rotation.abs() > f32::EPSILON {
            let _ = write!(
                self.svg,
                " transform=\"rotate({} {cx} {cy})\"",
                style.rotation
            );
        }
        if style.opacity < 1.0 {
            let _ = write!(self.svg, " opacity=\"{}\"", style.opacity);
        }
        if style.blend_mode != postcraft_core::BlendMode::Normal {
            let _ = write!(
                self.svg,
                " style=\"mix-blend-mode:{}\"",
                style.blend_mode.as_css()
            );
        }
        self.svg.push('>');

        match (&style.visual, &view.content) {
            (_, Content::Placeholder(label)) => self.placeholder(g, label),
            (Visual::Text(text), Content::Text { lines, .. }) => self.text(g, text, lines),
            (Visual::Image { filter, border }, Content::Image { src }) => {
                self.image(g, filter, src);
                self.border(g, border, false);
            }
            (Visual::Gradient { from, to, angle }, _) => self.gradient(g, from, to, *angle),
            (
                Visual::Shape {
                    fill,
                    round,
                    border,
                },
                _,
            ) => {
                self.shape(g, fill, *round);
                self.border(g, border, *round);
            }
            (
                Visual::QrCode {
                    foreground,
                    background,
                },
                Content::QrCode(matrix),
            ) => self.qr_code(g, foreground, background, matrix),
            // Content that does not match its visual paints nothing.
            _ => {}
        }

        self.svg.push_str("</g>");
    }

    fn image(&mut self, g: BoxGeometry, filter: &FilterChain, src: &str) {
        let clip = self.def_id("clip");
        let _ = write!(
            self.svg,
            "<defs><clipPath id=\"{clip}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/></clipPath></defs>",
            g.x, g.y, g.width, g.height,
        );
        let _ = write!(
            self.svg,
            "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid slice\" clip-path=\"url(#{clip})\"",
            g.x, g.y, g.width, g.height,
        );
        if !filter.is_identity() {
            let _ = write!(self.svg, " filter=\"{}\"", filter.to_css());
        }
        let _ = write!(self.svg, " xlink:href=\"{}\"/>", escape_xml(src));
    }

    fn shape(&mut self, g: BoxGeometry, fill: &str, round: bool) {
        let paint = color_attrs("fill", fill);
        if round {
            let (cx, cy) = g.center();
            let _ = write!(
                self.svg,
                "<ellipse cx=\"{cx}\" cy=\"{cy}\" rx=\"{}\" ry=\"{}\"{paint}/>",
                g.width / 2.0,
                g.height / 2.0,
            );
        } else {
            let _ = write!(
                self.svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{paint}/>",
                g.x, g.y, g.width, g.height,
            );
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn qr_code(&mut self, g: BoxGeometry, foreground: &str, background: &str, matrix: &QrMatrix) {
        let _ = write!(
            self.svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{}/>",
            g.x,
            g.y,
            g.width,
            g.height,
            color_attrs("fill", background),
        );
        let n = matrix.width() as f32;
        let (mw, mh) = (g.width / n, g.height / n);
        let mut path = String::new();
        for row in 0..matrix.width() {
            for col in 0..matrix.width() {
                if matrix.is_dark(col, row) {
                    let (x, y) = (g.x + col as f32 * mw, g.y + row as f32 * mh);
                    let _ = write!(path, "M{x} {y}h{mw}v{mh}h{}z", -mw);
                }
            }
        }
        let _ = write!(
            self.svg,
            "<path d=\"{path}\" shape-rendering=\"crispEdges\"{}/>",
            color_attrs("fill", foreground),
        );
    }

    fn placeholder(&mut self, g: BoxGeometry, label: &str) {
        let (cx, cy) = g.center();
        let font_size = (g.height / 4.0).clamp(8.0, 14.0);
        let _ = write!(
            self.svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{PLACEHOLDER_FILL}\" stroke=\"#9ca3af\" stroke-width=\"1\"/>",
            g.x, g.y, g.width, g.height,
        );
        let _ = write!(
            self.svg,
            "<text x=\"{cx}\" y=\"{cy}\" font-size=\"{font_size}\" fill=\"#6b7280\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"sans-serif\">{}</text>",
            escape_xml(label),
        );
    }

    fn border(&mut self, g: BoxGeometry, border: &BorderLine, round: bool) {
        if !border.is_visible() {
            return;
        }
        let w = border.width;
        let stroke = color_attrs("stroke", &border.color);
        let dash = match border.style {
            BorderStyle::Solid => String::new(),
            BorderStyle::Dashed => format!(" stroke-dasharray=\"{} {}\"", w * 3.0, w * 2.0),
            BorderStyle::Dotted => format!(
                " stroke-dasharray=\"0 {}\" stroke-linecap=\"round\"",
                w * 2.0
            ),
        };
        // Strokes are centered on the path; inset by half the width to stay inside the box.
        let (x, y) = (g.x + w / 2.0, g.y + w / 2.0);
        let (bw, bh) = ((g.width - w).max(0.0), (g.height - w).max(0.0));
        if round {
            let (cx, cy) = g.center();
            let _ = write!(
                self.svg,
                "<ellipse cx=\"{cx}\" cy=\"{cy}\" rx=\"{}\" ry=\"{}\" fill=\"none\" stroke-width=\"{w}\"{stroke}{dash}/>",
                bw / 2.0,
                bh / 2.0,
            );
        } else {
            let _ = write!(
                self.svg,
                "<rect x=\"{x}\" y=\"{y}\" width=\"{bw}\" height=\"{bh}\" fill=\"none\" stroke-width=\"{w}\"{stroke}{dash}/>",
            );
        }
    }

    fn gradient(&mut self, g: BoxGeometry, from: &str, to: &str, angle: f32) {
        let id = self.def_id("grad");
        let (x1, y1, x2, y2) = gradient_line(g, angle);
        let _ = write!(
            self.svg,
            "<defs><linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\"><stop offset=\"0\"{}/><stop offset=\"1\"{}/></linearGradient></defs>",
            color_attrs("stop-color", from),
            color_attrs("stop-color", to),
        );
        let _ = write!(
            self.svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"url(#{id})\"/>",
            g.x, g.y, g.width, g.height,
        );
    }

    fn text(&mut self, g: BoxGeometry, style: &TextStyle, lines: &[TextLine]) {
        let inset = style.background.as_ref().map_or(0.0, |bg| bg.padding);
        if let Some(bg) = &style.background {
            let _ = write!(
                self.svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\"{}/>",
                g.x,
                g.y,
                g.width,
                g.height,
                bg.radius,
                color_attrs("fill", &bg.color),
            );
        }

        let content = BoxGeometry {
            x: g.x + inset,
            y: g.y + inset,
            width: (g.width - inset * 2.0).max(0.0),
            height: (g.height - inset * 2.0).max(0.0),
        };

        // Shadows are listed topmost first; paint bottom-up, text last.
        for shadow in style.shadows.iter().rev() {
            if shadow.blur > 0.0 {
                let id = self.def_id("blur");
                let _ = write!(
                    self.svg,
                    "<defs><filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feGaussianBlur stdDeviation=\"{}\"/></filter></defs><g filter=\"url(#{id})\">",
                    shadow.blur / 2.0,
                );
                self.text_lines(content, style, lines, (shadow.dx, shadow.dy), Some(&shadow.color));
                self.svg.push_str("</g>");
            } else {
                self.text_lines(content, style, lines, (shadow.dx, shadow.dy), Some(&shadow.color));
            }
        }
        self.text_lines(content, style, lines, (0.0, 0.0), None);
    }

    #[allow(clippy::cast_precision_loss)]
    fn text_lines(
        &mut self,
        content: BoxGeometry,
        style: &TextStyle,
        lines: &[TextLine],
        offset: (f32, f32),
        color_override: Option<&str>,
    ) {
        let line_box = style.font_size * style.line_height;
        let total = line_box * lines.len() as f32;
        let top = match style.justify {
            Justify::Start => content.y,
            Justify::Center => content.y + (content.height - total) / 2.0,
            Justify::End => content.y + content.height - total,
        };
        let (anchor, x) = match style.align {
            TextAlign::Left => ("start", content.x),
            TextAlign::Center => ("middle", content.x + content.width / 2.0),
            TextAlign::Right => ("end", content.x + content.width),
        };
        let x = x + offset.0;
        let family = font_family_attr(&style.font_family);

        for (index, line) in lines.iter().enumerate() {
            if line.runs.is_empty() {
                continue;
            }
            let baseline = top
                + line_box * index as f32
                + line_box / 2.0
                + style.font_size * BASELINE_SHIFT
                + offset.1;
            let _ = write!(
                self.svg,
                "<text x=\"{x}\" y=\"{baseline}\" text-anchor=\"{anchor}\" font-family=\"{family}\" font-size=\"{}\"",
                style.font_size,
            );
            if style.letter_spacing.abs() > f32::EPSILON {
                let _ = write!(self.svg, " letter-spacing=\"{}\"", style.letter_spacing);
            }
            let _ = write!(
                self.svg,
                "{} xml:space=\"preserve\">",
                color_attrs("fill", color_override.unwrap_or(&style.color)),
            );
            for run in &line.runs {
                let text = escape_xml(&run.text);
                if run.accent {
                    self.svg.push_str("<tspan");
                    if let Some(accent_family) = &style.accent_font_family {
                        let _ =
                            write!(self.svg, " font-family=\"{}\"", font_family_attr(accent_family));
                    }
                    if color_override.is_none() {
                        self.svg.push_str(&color_attrs("fill", &style.highlight_color));
                    }
                    let _ = write!(self.svg, ">{text}</tspan>");
                } else {
                    let _ = write!(self.svg, "<tspan>{text}</tspan>");
                }
            }
            self.svg.push_str("</text>");
        }
    }

    /// Close the document.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.svg.push_str("</svg>");
        self.svg
    }
}

/// Start and end points of a CSS linear gradient over a box.
///
/// The gradient line passes through the box center at `angle` (0 = towards
/// the top, clockwise) and is long enough for the corners to hit the end
/// colors.
#[must_use]
pub fn gradient_line(g: BoxGeometry, angle: f32) -> (f32, f32, f32, f32) {
    let (sin, cos) = angle.to_radians().sin_cos();
    let length = (g.width * sin).abs() + (g.height * cos).abs();
    let (cx, cy) = g.center();
    let (dx, dy) = (sin * length / 2.0, -cos * length / 2.0);
    (cx - dx, cy - dy, cx + dx, cy + dy)
}

/// Paint attributes for a color, e.g. ` fill="#112233" fill-opacity="0.5"`.
///
/// Unrecognized notations pass through verbatim.
#[must_use]
pub fn color_attrs(attribute: &str, color: &str) -> String {
    let opacity_attribute = if attribute == "stop-color" {
        "stop-opacity".to_string()
    } else {
        format!("{attribute}-opacity")
    };
    match parse_color(color) {
        Some(rgba) if rgba.is_transparent() && attribute != "stop-color" => {
            format!(" {attribute}=\"none\"")
        }
        Some(rgba) if rgba.a < 1.0 => format!(
            " {attribute}=\"{}\" {opacity_attribute}=\"{}\"",
            rgba.to_hex(),
            rgba.a
        ),
        Some(rgba) => format!(" {attribute}=\"{}\"", rgba.to_hex()),
        None => format!(" {attribute}=\"{}\"", escape_xml(color)),
    }
}

fn font_family_attr(family: &str) -> String {
    escape_xml(&format!("'{}', sans-serif", family.replace('\'', "")))
}

/// Escape special XML characters.
#[must_use]
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
