//! Interactive canvas view.
//!
//! Paints exactly what the static renderer paints, then adds selection
//! chrome on top: an outline around the selected element and a resize
//! handle at its bottom-right corner when it is unlocked. Pointer positions
//! are mapped back to [`PointerTarget`]s for the canvas interaction model.

use std::fmt::Write;

use postcraft_core::{ElementId, Frame, PointerTarget, Post};

use crate::static_render::paint;
use crate::view::RenderContext;

/// Selection outline color.
pub const SELECTION_COLOR: &str = "#3b82f6";

/// Side length of the square resize handle, in post pixels.
pub const HANDLE_SIZE: f32 = 16.0;

/// Render `post` with chrome for `selection`.
#[must_use]
pub fn render(post: &Post, ctx: &RenderContext<'_>, selection: Option<&ElementId>) -> String {
    let mut builder = paint(post, ctx);
    if let Some(frame) = selection.and_then(|id| selected_frame(post, id)) {
        builder.raw(&chrome(frame));
    }
    builder.finish()
}

fn selected_frame<'a>(post: &'a Post, id: &ElementId) -> Option<&'a Frame> {
    post.get(id)
        .and_then(|element| element.frame())
        .filter(|frame| frame.visible)
}

fn chrome(frame: &Frame) -> String {
    let (cx, cy) = frame.center();
    let mut svg = String::new();
    let _ = write!(
        svg,
        "<g class=\"selection\" transform=\"rotate({} {cx} {cy})\">",
        frame.normalized_rotation()
    );
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{SELECTION_COLOR}\" stroke-width=\"2\"/>",
        frame.x, frame.y, frame.width, frame.height,
    );
    if !frame.locked {
        let half = HANDLE_SIZE / 2.0;
        let _ = write!(
            svg,
            "<rect class=\"resize-handle\" x=\"{}\" y=\"{}\" width=\"{HANDLE_SIZE}\" height=\"{HANDLE_SIZE}\" fill=\"#ffffff\" stroke=\"{SELECTION_COLOR}\" stroke-width=\"2\"/>",
            frame.x + frame.width - half,
            frame.y + frame.height - half,
        );
    }
    svg.push_str("</g>");
    svg
}

/// Whether (`x`, `y`) lies on the resize handle of `frame`.
#[must_use]
pub fn on_resize_handle(frame: &Frame, x: f32, y: f32) -> bool {
    if frame.locked || !frame.visible {
        return false;
    }
    // Undo the rotation about the box center to test in the box's own axes.
    let (cx, cy) = frame.center();
    let (sin, cos) = (-frame.rotation.to_radians()).sin_cos();
    let (dx, dy) = (x - cx, y - cy);
    let local_x = cx + dx * cos - dy * sin;
    let local_y = cy + dx * sin + dy * cos;
    let half = HANDLE_SIZE / 2.0;
    (local_x - (frame.x + frame.width)).abs() <= half
        && (local_y - (frame.y + frame.height)).abs() <= half
}

/// Map a pointer position to what it landed on.
///
/// The selected element's handle wins, then the topmost visible element,
/// then the background; anything off the post is the bare canvas.
#[must_use]
pub fn hit_target(
    post: &Post,
    ctx: &RenderContext<'_>,
    x: f32,
    y: f32,
    selection: Option<&ElementId>,
) -> PointerTarget {
    if let Some(id) = selection {
        if selected_frame(post, id).is_some_and(|frame| on_resize_handle(frame, x, y)) {
            return PointerTarget::ResizeHandle(id.clone());
        }
    }
    match post.element_at(x, y, ctx.size) {
        Some(id) if *id == post.background().id => PointerTarget::Background,
        Some(id) => PointerTarget::Element(id.clone()),
        None => PointerTarget::Canvas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_render::StaticRenderer;
    use postcraft_core::{layers, Element, NewElement, PostSize, ShapeKind};

    const CTX: RenderContext<'static> = RenderContext::new(PostSize::SQUARE);

    fn post_with_shape() -> (Post, ElementId) {
        let shape = Element::create(NewElement::Shape(ShapeKind::Rectangle), PostSize::SQUARE);
        let id = shape.id().clone();
        (layers::add(&Post::new(), shape), id)
    }

    #[test]
    fn test_without_selection_matches_static_output() {
        let (post, _) = post_with_shape();
        let interactive = render(&post, &CTX, None);
        let static_doc = StaticRenderer::render(&post, PostSize::SQUARE);
        assert_eq!(interactive, static_doc.svg);
    }

    #[test]
    fn test_chrome_is_additive() {
        let (post, id) = post_with_shape();
        let interactive = render(&post, &CTX, Some(&id));
        let static_svg = StaticRenderer::render(&post, PostSize::SQUARE).svg;
        let body = static_svg.trim_end_matches("</svg>");
        assert!(interactive.starts_with(body));
        assert!(interactive.contains("class=\"selection\""));
        assert!(interactive.contains("class=\"resize-handle\""));
    }

    #[test]
    fn test_locked_selection_has_no_handle() {
        let (post, id) = post_with_shape();
        let post = layers::toggle_lock(&post, &id);
        let svg = render(&post, &CTX, Some(&id));
        assert!(svg.contains("class=\"selection\""));
        assert!(!svg.contains("resize-handle"));
    }

    #[test]
    fn test_hit_target_layers() {
        let (post, id) = post_with_shape();
        // Shape spans 440..640 on both axes.
        assert_eq!(
            hit_target(&post, &CTX, 500.0, 500.0, None),
            PointerTarget::Element(id.clone())
        );
        assert_eq!(
            hit_target(&post, &CTX, 10.0, 10.0, None),
            PointerTarget::Background
        );
        assert_eq!(
            hit_target(&post, &CTX, -5.0, 10.0, None),
            PointerTarget::Canvas
        );
        assert_eq!(
            hit_target(&post, &CTX, 640.0, 640.0, Some(&id)),
            PointerTarget::ResizeHandle(id.clone())
        );
        // Without selection the corner is just the element.
        assert_eq!(
            hit_target(&post, &CTX, 640.0, 640.0, None),
            PointerTarget::Element(id)
        );
    }

    #[test]
    fn test_handle_follows_rotation() {
        let mut frame = Frame::new(0.0, 0.0, 100.0, 100.0);
        assert!(on_resize_handle(&frame, 100.0, 100.0));
        frame.rotation = 90.0;
        // Rotating 90° clockwise about (50, 50) carries (100, 100) to (0, 100).
        assert!(on_resize_handle(&frame, 0.0, 100.0));
        assert!(!on_resize_handle(&frame, 100.0, 100.0));
    }
}
