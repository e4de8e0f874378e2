//! Contract with the AI design assistant.
//!
//! The assistant proposes text layouts in percentage coordinates, generates
//! background images and extracts palettes. This module turns its answers
//! into real elements and posts; the assistant itself lives elsewhere.

use async_trait::async_trait;
use base64::Engine;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::{self, readable_text_on};
use crate::element::DEFAULT_FONT_FAMILY;
use crate::{
    BackgroundElement, EditorError, EditorResult, Element, ElementPatch, Frame, Post, PostSize,
    TextAlign, TextElement,
};

/// How much copy to generate per slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLevel {
    /// Headline only.
    Minimal,
    /// Headline and a supporting line.
    #[default]
    Balanced,
    /// Headline, body and call to action.
    Detailed,
}

/// Input for one layout suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    /// Background image (data URI or URL).
    pub image_src: String,
    /// Subject of the post.
    pub topic: String,
    /// Amount of copy.
    #[serde(default)]
    pub content_level: ContentLevel,
}

/// A proposed text element. Geometry is in percent of the post size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSuggestion {
    /// Copy, may contain `**accent**` markup.
    pub text: String,
    /// Left edge, `0..=100`.
    pub x: f32,
    /// Top edge, `0..=100`.
    pub y: f32,
    /// Width, `0..=100`.
    #[serde(default = "TextSuggestion::default_width")]
    pub width: f32,
    /// Height, `0..=100`.
    #[serde(default = "TextSuggestion::default_height")]
    pub height: f32,
    /// Suggested font family.
    #[serde(default)]
    pub font_family: Option<String>,
    /// Suggested font size in post pixels.
    #[serde(default)]
    pub font_size: Option<f32>,
    /// Suggested text color.
    #[serde(default)]
    pub color: Option<String>,
    /// Suggested alignment.
    #[serde(default)]
    pub text_align: Option<TextAlign>,
}

impl TextSuggestion {
    const fn default_width() -> f32 {
        80.0
    }

    const fn default_height() -> f32 {
        15.0
    }
}

/// A generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// MIME type, e.g. `image/png`.
    pub mime: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    /// Encode as a base64 data URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.mime)
    }
}

/// External AI services used by the editor.
#[async_trait]
pub trait DesignAssistant: Send + Sync {
    /// Propose text elements for an image and topic.
    async fn suggest_layout(&self, request: &LayoutRequest) -> EditorResult<Vec<TextSuggestion>>;

    /// Generate an image for a prompt.
    async fn generate_image(&self, prompt: &str, provider: Option<&str>)
        -> EditorResult<GeneratedImage>;

    /// Extract dominant colors from an image.
    async fn extract_palette(&self, image_src: &str) -> EditorResult<Vec<String>>;
}

/// Convert one suggestion to a text element in post pixels.
#[must_use]
pub fn suggestion_to_element(
    suggestion: &TextSuggestion,
    size: PostSize,
    palette: Option<&[String]>,
) -> Element {
    let pct = |value: f32, total: f32| color::clamp(value, 0.0, 100.0) / 100.0 * total;
    let frame = Frame::new(
        pct(suggestion.x, size.width),
        pct(suggestion.y, size.height),
        pct(suggestion.width, size.width).max(crate::element::MIN_ELEMENT_SIZE),
        pct(suggestion.height, size.height).max(crate::element::MIN_ELEMENT_SIZE),
    );

    let mut text = TextElement::new(frame, suggestion.text.clone());
    text.font_family = suggestion
        .font_family
        .clone()
        .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string());
    if let Some(font_size) = suggestion.font_size {
        text.font_size = font_size.max(1.0);
    }
    text.color = suggestion.color.clone().unwrap_or_else(|| {
        palette
            .and_then(<[String]>::first)
            .map_or("#ffffff", |bg| readable_text_on(bg))
            .to_string()
    });
    if let Some(align) = suggestion.text_align {
        text.text_align = align;
    }
    Element::Text(text)
}

/// One request that could not be turned into a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    /// Position in the request list.
    pub index: usize,
    /// What went wrong.
    pub message: String,
}

/// Posts built from layout suggestions, plus the requests that failed.
#[derive(Debug, Clone, Default)]
pub struct GeneratedPosts {
    /// Successfully built posts, in request order.
    pub posts: Vec<Post>,
    /// Failed requests.
    pub failures: Vec<GenerationFailure>,
}

/// Build one post per request.
///
/// Suggestions are requested concurrently and reassembled in request order.
/// Several successful posts form a carousel. Failed requests are reported
/// next to the posts that did succeed.
///
/// # Errors
///
/// Returns [`EditorError::Validation`] before any request is issued if there
/// are no requests or a topic is blank, and [`EditorError::Generation`] if
/// every request failed.
pub async fn build_posts(
    assistant: &dyn DesignAssistant,
    requests: &[LayoutRequest],
    size: PostSize,
) -> EditorResult<GeneratedPosts> {
    if requests.is_empty() {
        return Err(EditorError::Validation(
            "Select at least one image".to_string(),
        ));
    }
    if requests.iter().any(|r| r.topic.trim().is_empty()) {
        return Err(EditorError::Validation("Topic is required".to_string()));
    }

    let answers = join_all(requests.iter().map(|r| assistant.suggest_layout(r))).await;

    let mut generated = GeneratedPosts::default();
    for (index, (request, answer)) in requests.iter().zip(answers).enumerate() {
        match answer {
            Ok(suggestions) => {
                let mut elements: Vec<Element> = suggestions
                    .iter()
                    .map(|s| suggestion_to_element(s, size, None))
                    .collect();
                elements.push(Element::Background(BackgroundElement {
                    src: request.image_src.clone(),
                    ..BackgroundElement::placeholder()
                }));
                generated
                    .posts
                    .push(Post::from_elements(crate::PostId::new(), elements));
            }
            Err(e) => {
                tracing::warn!("Layout suggestion {index} failed: {e}");
                generated.failures.push(GenerationFailure {
                    index,
                    message: e.to_string(),
                });
            }
        }
    }

    if generated.posts.is_empty() {
        let message = generated
            .failures
            .first()
            .map_or_else(String::new, |f| f.message.clone());
        return Err(EditorError::Generation(message));
    }
    if generated.posts.len() > 1 {
        let carousel_id = Uuid::new_v4().to_string();
        for (slide, post) in (0_u32..).zip(generated.posts.iter_mut()) {
            post.carousel_id = Some(carousel_id.clone());
            post.slide_index = Some(slide);
        }
    }
    Ok(generated)
}

/// Regenerate a post's background from its stored prompt.
///
/// # Errors
///
/// Returns [`EditorError::Validation`] if the background has no prompt, or
/// the assistant's error if generation fails; the post is unchanged then.
pub async fn regenerate_background(assistant: &dyn DesignAssistant, post: &Post) -> EditorResult<Post> {
    let background = post.background();
    let Some(prompt) = background.prompt.as_deref() else {
        return Err(EditorError::Validation(
            "Background has no prompt to regenerate from".to_string(),
        ));
    };
    let image = assistant
        .generate_image(prompt, background.provider.as_deref())
        .await?;
    crate::layers::update(
        post,
        &background.id,
        &ElementPatch::new().set("src", image.to_data_uri()),
    )
}

/// Extract the background palette and store it on the post.
///
/// # Errors
///
/// Returns the assistant's error; the post is unchanged then.
pub async fn extract_palette(assistant: &dyn DesignAssistant, post: &Post) -> EditorResult<Post> {
    let palette = assistant.extract_palette(&post.background().src).await?;
    Ok(post.with_palette(palette))
}
