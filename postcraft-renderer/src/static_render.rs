//! Static renderer: a post as a non-interactive SVG document for export.
//!
//! Output depends only on the post value and the render context, so
//! repeated renders of the same post are byte-identical.

use postcraft_core::{Post, PostSize};
use tracing::debug;

use crate::svg::SvgBuilder;
use crate::view::{describe, describe_background, RenderContext};

/// A rendered post, sized to the post's pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDocument {
    /// Width in post pixels.
    pub width: u32,
    /// Height in post pixels.
    pub height: u32,
    /// SVG markup.
    pub svg: String,
}

/// Renders posts without selection or handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRenderer;

impl StaticRenderer {
    /// Render `post` at `size`.
    #[must_use]
    pub fn render(post: &Post, size: PostSize) -> StaticDocument {
        Self::render_with(post, &RenderContext::new(size))
    }

    /// Render with an explicit context (e.g. brand assets).
    #[must_use]
    pub fn render_with(post: &Post, ctx: &RenderContext<'_>) -> StaticDocument {
        let (width, height) = ctx.size.pixels();
        let svg = paint(post, ctx).finish();
        debug!(post = %post.id, bytes = svg.len(), "rendered static post");
        StaticDocument { width, height, svg }
    }
}

/// Paint the background, then visible foreground elements bottom-up.
pub(crate) fn paint(post: &Post, ctx: &RenderContext<'_>) -> SvgBuilder {
    let mut builder = SvgBuilder::new(ctx.size);
    builder.background(&describe_background(post.background()), ctx.size);
    for element in post.foreground().iter().rev().filter(|e| e.is_visible()) {
        if let Some(view) = describe(element, ctx) {
            builder.element(&view);
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use postcraft_core::{layers, Element, NewElement, ShapeKind};

    fn post_with_two_shapes() -> (Post, String, String) {
        let post = Post::new();
        let bottom = Element::create(NewElement::Shape(ShapeKind::Rectangle), PostSize::SQUARE);
        let top = Element::create(NewElement::Shape(ShapeKind::Circle), PostSize::SQUARE);
        let (bottom_id, top_id) = (bottom.id().to_string(), top.id().to_string());
        let post = layers::add(&post, bottom);
        let post = layers::add(&post, top);
        (post, bottom_id, top_id)
    }

    #[test]
    fn test_document_matches_post_size() {
        let doc = StaticRenderer::render(&Post::new(), PostSize::PORTRAIT);
        assert_eq!((doc.width, doc.height), (1080, 1350));
        assert!(doc.svg.contains("height=\"1350\""));
    }

    #[test]
    fn test_topmost_element_is_painted_last() {
        let (post, bottom_id, top_id) = post_with_two_shapes();
        assert_eq!(post.elements()[0].id().as_str(), top_id);

        let doc = StaticRenderer::render(&post, PostSize::SQUARE);
        let background = doc.svg.find(post.background().id.as_str()).expect("bg");
        let bottom = doc.svg.find(&bottom_id).expect("bottom");
        let top = doc.svg.find(&top_id).expect("top");
        assert!(background < bottom && bottom < top);
    }

    #[test]
    fn test_hidden_elements_are_skipped() {
        let (post, bottom_id, top_id) = post_with_two_shapes();
        let post = layers::toggle_visibility(&post, &bottom_id.as_str().into());
        let doc = StaticRenderer::render(&post, PostSize::SQUARE);
        assert!(!doc.svg.contains(&bottom_id));
        assert!(doc.svg.contains(&top_id));
    }

    #[test]
    fn test_render_is_deterministic() {
        let (post, _, _) = post_with_two_shapes();
        let a = StaticRenderer::render(&post, PostSize::SQUARE);
        let b = StaticRenderer::render(&post.clone(), PostSize::SQUARE);
        assert_eq!(a, b);
    }
}
