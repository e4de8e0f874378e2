//! Posts - ordered element stacks that export to one image each.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BackgroundElement, EditorError, EditorResult, Element, ElementId};

/// Unique identifier for a post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    /// Create a new unique post ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Pixel dimensions of a post.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostSize {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl PostSize {
    /// 1080×1080 feed post.
    pub const SQUARE: Self = Self::new(1080.0, 1080.0);
    /// 1080×1350 portrait feed post.
    pub const PORTRAIT: Self = Self::new(1080.0, 1350.0);
    /// 1080×1920 story.
    pub const STORY: Self = Self::new(1080.0, 1920.0);
    /// 1200×628 link preview.
    pub const LANDSCAPE: Self = Self::new(1200.0, 628.0);

    /// Custom dimensions.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whole-pixel dimensions, at least 1×1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixels(&self) -> (u32, u32) {
        (
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }
}

impl Default for PostSize {
    fn default() -> Self {
        Self::SQUARE
    }
}

/// One exportable graphic.
///
/// Elements are ordered topmost first; the background is always last.
/// The element list is shared copy-on-write: every edit produces a new
/// list, so [`Post::same_revision`] tells whether anything changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PostDocument")]
pub struct Post {
    /// Post identifier.
    pub id: PostId,
    elements: Arc<Vec<Element>>,
    /// Extracted color palette.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    /// Carousel group id, shared by all slides of a carousel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carousel_id: Option<String>,
    /// Position within the carousel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDocument {
    id: PostId,
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    palette: Option<Vec<String>>,
    #[serde(default)]
    carousel_id: Option<String>,
    #[serde(default)]
    slide_index: Option<u32>,
}

impl From<PostDocument> for Post {
    fn from(doc: PostDocument) -> Self {
        Self {
            id: doc.id,
            elements: Arc::new(normalize(doc.elements)),
            palette: doc.palette,
            carousel_id: doc.carousel_id,
            slide_index: doc.slide_index,
        }
    }
}

/// Keep exactly one background and move it to the bottom of the stack.
fn normalize(elements: Vec<Element>) -> Vec<Element> {
    let mut background = None;
    let mut foreground = Vec::with_capacity(elements.len());
    for element in elements {
        if element.is_background() {
            if background.is_none() {
                background = Some(element);
            } else {
                tracing::debug!("Dropping extra background {}", element.id());
            }
        } else {
            foreground.push(element);
        }
    }
    foreground.push(
        background.unwrap_or_else(|| Element::Background(BackgroundElement::placeholder())),
    );
    foreground
}

impl Post {
    /// Create a post holding only a placeholder background.
    #[must_use]
    pub fn new() -> Self {
        Self::with_background(BackgroundElement::placeholder())
    }

    /// Create a post holding only the given background.
    #[must_use]
    pub fn with_background(background: BackgroundElement) -> Self {
        Self {
            id: PostId::new(),
            elements: Arc::new(vec![Element::Background(background)]),
            palette: None,
            carousel_id: None,
            slide_index: None,
        }
    }

    /// Create a post from an element list, restoring the background invariant.
    #[must_use]
    pub fn from_elements(id: PostId, elements: Vec<Element>) -> Self {
        Self {
            id,
            elements: Arc::new(normalize(elements)),
            palette: None,
            carousel_id: None,
            slide_index: None,
        }
    }

    /// Same post with a replaced element list.
    #[must_use]
    pub fn with_elements(&self, elements: Vec<Element>) -> Self {
        Self {
            elements: Arc::new(normalize(elements)),
            ..self.clone()
        }
    }

    /// Copy of this post with a new palette.
    ///
    /// The copy gets a fresh element list, so it counts as a new revision.
    #[must_use]
    pub fn with_palette(&self, palette: Vec<String>) -> Self {
        Self {
            palette: Some(palette),
            ..self.with_elements(self.elements.to_vec())
        }
    }

    /// Whether both values share the same element list allocation.
    #[must_use]
    pub fn same_revision(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.elements, &other.elements)
    }

    /// All elements, topmost first, background last.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Elements above the background, topmost first.
    #[must_use]
    pub fn foreground(&self) -> &[Element] {
        &self.elements[..self.elements.len() - 1]
    }

    /// The background element.
    #[must_use]
    pub fn background(&self) -> &BackgroundElement {
        match self.elements.last() {
            Some(Element::Background(bg)) => bg,
            _ => unreachable!("post always ends with its background"),
        }
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Position of an element in the stack.
    #[must_use]
    pub fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    /// Whether this post is a carousel slide.
    #[must_use]
    pub fn is_carousel(&self) -> bool {
        self.carousel_id.is_some()
    }

    /// Find the element at the given post coordinates.
    ///
    /// Returns the topmost visible foreground element, else the background
    /// when the point is on the canvas.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32, size: PostSize) -> Option<&ElementId> {
        if x < 0.0 || y < 0.0 || x > size.width || y > size.height {
            return None;
        }
        self.foreground()
            .iter()
            .find(|e| e.frame().is_some_and(|f| f.visible && f.contains_point(x, y)))
            .map_or(Some(&self.background().id), |e| Some(e.id()))
    }

    /// Serialize the post to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> EditorResult<String> {
        serde_json::to_string(self).map_err(EditorError::Serialization)
    }

    /// Deserialize a post from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        serde_json::from_str(json).map_err(EditorError::Serialization)
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}

/// Slides of one carousel in display order.
///
/// Sorting is stable, so slides sharing a `slide_index` keep list order.
#[must_use]
pub fn carousel_slides<'a>(posts: &'a [Post], carousel_id: &str) -> Vec<&'a Post> {
    let mut slides: Vec<&Post> = posts
        .iter()
        .filter(|p| p.carousel_id.as_deref() == Some(carousel_id))
        .collect();
    slides.sort_by_key(|p| p.slide_index.unwrap_or(u32::MAX));
    slides
}

/// Distinct carousel ids in first-seen order.
#[must_use]
pub fn carousel_ids(posts: &[Post]) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for id in posts.iter().filter_map(|p| p.carousel_id.as_deref()) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
