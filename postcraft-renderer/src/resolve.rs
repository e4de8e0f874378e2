//! Remote image inlining.
//!
//! The rasterizer never reads remote content itself. Before capture, every
//! image source that is not already a data URI is fetched and rewritten as
//! one.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use postcraft_core::{Element, Post};
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// Fetched image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    /// MIME type.
    pub mime: String,
    /// Raw bytes.
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    /// `data:` URI with base64 payload.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Fetches remote images.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the image at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Network`] if the image cannot be fetched.
    async fn fetch(&self, url: &str) -> RenderResult<FetchedImage>;
}

/// Fetches images over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Fetcher sharing `client`.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> RenderResult<FetchedImage> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map_or_else(|| guess_mime(url).to_string(), |v| v.trim().to_string());
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedImage { mime, bytes })
    }
}

fn guess_mime(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "image/png"
    }
}

/// Whether `src` needs fetching before capture.
#[must_use]
pub fn is_remote(src: &str) -> bool {
    let src = src.trim();
    src.starts_with("http://") || src.starts_with("https://")
}

fn image_source_mut(element: &mut Element) -> Option<&mut String> {
    match element {
        Element::Image(image) => Some(&mut image.src),
        Element::Background(background) => Some(&mut background.src),
        _ => None,
    }
}

/// Rewrite remote image sources in `post` as data URIs.
///
/// Each distinct URL is fetched once. Returns the input post unchanged when
/// nothing is remote.
///
/// # Errors
///
/// Returns the first fetch failure.
pub async fn inline_remote_images(post: &Post, fetcher: &dyn ImageFetcher) -> RenderResult<Post> {
    let mut elements = post.elements().to_vec();
    let mut cache: HashMap<String, String> = HashMap::new();
    let mut changed = false;

    for element in &mut elements {
        let Some(src) = image_source_mut(element) else {
            continue;
        };
        if !is_remote(src) {
            continue;
        }
        let url = src.trim().to_string();
        let data_uri = if let Some(hit) = cache.get(&url) {
            hit.clone()
        } else {
            debug!(%url, "inlining remote image");
            let fetched = fetcher
                .fetch(&url)
                .await
                .map_err(|e| RenderError::Network(format!("{url}: {e}")))?;
            let data_uri = fetched.to_data_uri();
            cache.insert(url, data_uri.clone());
            data_uri
        };
        *src = data_uri;
        changed = true;
    }

    Ok(if changed {
        post.with_elements(elements)
    } else {
        post.clone()
    })
}
