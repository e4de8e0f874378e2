//! Font collection and preloading for export.
//!
//! Every family referenced by the exported posts is made available before
//! rasterizing. Local families are skipped; the rest are fetched through a
//! [`FontLoader`]. A failed load never aborts the export: the family falls
//! back to the default typeface and a warning is reported.

use async_trait::async_trait;
use futures::future::join_all;
use postcraft_core::markup;
use postcraft_core::{Element, FontCatalog, Post};
use tracing::{debug, info, warn};

use crate::error::{RenderError, RenderResult};

/// Default stylesheet endpoint for remote fonts.
pub const GOOGLE_FONTS_CSS: &str = "https://fonts.googleapis.com/css2";

/// Font bytes for one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    /// Family name as requested.
    pub family: String,
    /// TrueType/OpenType data.
    pub data: Vec<u8>,
}

/// Loads fonts that are not locally available.
#[async_trait]
pub trait FontLoader: Send + Sync {
    /// Fetch the font data for `family`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Font`] if the family cannot be loaded.
    async fn load(&self, family: &str) -> RenderResult<FontFace>;
}

/// Fetches fonts from a Google Fonts compatible CSS endpoint.
#[derive(Debug, Clone)]
pub struct HttpFontLoader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFontLoader {
    /// Loader using [`GOOGLE_FONTS_CSS`].
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, GOOGLE_FONTS_CSS)
    }

    /// Loader using a custom stylesheet endpoint.
    #[must_use]
    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    async fn fetch(&self, family: &str) -> RenderResult<Vec<u8>> {
        let stylesheet_url = url::Url::parse_with_params(
            &self.endpoint,
            &[("family", family), ("display", "swap")],
        )
        .map_err(|e| RenderError::Network(e.to_string()))?;

        // Without a browser user agent the endpoint serves TrueType sources.
        let css = self
            .client
            .get(stylesheet_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let font_url = first_font_url(&css)
            .ok_or_else(|| RenderError::Network("stylesheet has no font source".to_string()))?;
        debug!(family, %font_url, "fetching font");

        let bytes = self
            .client
            .get(font_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FontLoader for HttpFontLoader {
    async fn load(&self, family: &str) -> RenderResult<FontFace> {
        let data = self.fetch(family).await.map_err(|e| RenderError::Font {
            family: family.to_string(),
            message: e.to_string(),
        })?;
        Ok(FontFace {
            family: family.to_string(),
            data,
        })
    }
}

/// The first `url(...)` source in a stylesheet.
#[must_use]
pub fn first_font_url(css: &str) -> Option<&str> {
    let start = css.find("url(")? + "url(".len();
    let rest = &css[start..];
    let end = rest.find(')')?;
    let url = rest[..end].trim().trim_matches(|c| c == '\'' || c == '"');
    (!url.is_empty()).then_some(url)
}

/// Font families used by `posts`, de-duplicated case-insensitively in
/// first-seen order.
///
/// Accent fonts count only when the content actually has an accent span.
#[must_use]
pub fn collect_font_families<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Vec<String> {
    let mut families: Vec<String> = Vec::new();
    let mut push = |family: &str| {
        let family = family.trim();
        if !family.is_empty() && !families.iter().any(|f| f.eq_ignore_ascii_case(family)) {
            families.push(family.to_string());
        }
    };

    for post in posts {
        for element in post.elements() {
            if let Element::Text(text) = element {
                push(&text.font_family);
                if let Some(accent) = &text.accent_font_family {
                    if markup::has_accent(&text.content) {
                        push(accent);
                    }
                }
            }
        }
    }
    families
}

/// Outcome of preloading.
#[derive(Debug, Clone, Default)]
pub struct FontPreload {
    /// Faces fetched for this export.
    pub faces: Vec<FontFace>,
    /// Non-fatal load failures, one per family.
    pub warnings: Vec<String>,
}

/// Make every family in `families` available.
///
/// Generic families are never loaded. Catalog families are skipped only when
/// `installed` reports them present; otherwise they are loaded like any
/// other family. Remote loads run concurrently and are all awaited before
/// returning.
pub async fn preload_fonts(
    families: &[String],
    catalog: &FontCatalog,
    loader: &dyn FontLoader,
    installed: impl Fn(&str) -> bool,
) -> FontPreload {
    let remote: Vec<&String> = families
        .iter()
        .filter(|f| !FontCatalog::is_generic(f))
        .filter(|f| {
            let listed = catalog.is_local(f);
            let local = listed && installed(f.as_str());
            if listed && !local {
                debug!(family = %f, "catalog font not installed, loading it");
            }
            !local
        })
        .collect();
    debug!(
        total = families.len(),
        remote = remote.len(),
        "preloading fonts"
    );
    if remote.is_empty() {
        return FontPreload::default();
    }

    let results = join_all(remote.iter().map(|family| loader.load(family))).await;

    let mut preload = FontPreload::default();
    for (family, result) in remote.into_iter().zip(results) {
        match result {
            Ok(face) => preload.faces.push(face),
            Err(err) => {
                warn!(%family, error = %err, "font failed to load, using fallback");
                preload
                    .warnings
                    .push(format!("Font '{family}' could not be loaded; using a fallback typeface"));
            }
        }
    }
    info!(
        loaded = preload.faces.len(),
        failed = preload.warnings.len(),
        "fonts preloaded"
    );
    preload
}
