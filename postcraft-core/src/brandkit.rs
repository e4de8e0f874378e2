//! Brand kits: reusable fonts, palettes, layout templates and image assets.
//!
//! The export file is a JSON document:
//!
//! ```text
//! { id, name, styleGuide, fonts[], palette[], layouts[], assets[] }
//! ```
//!
//! `layouts[].elements` use the live element format with ids that are not
//! namespaced by any post. `assets[].dataUrl` embeds image bytes.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{EditorError, EditorResult, Element, ElementId, Post, PostId};

/// A saved element stack used to seed new posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTemplate {
    /// Template identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Elements with template-relative ids.
    pub elements: Vec<Element>,
}

/// A reusable image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandAsset {
    /// Asset identifier, referenced by image elements.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Image bytes as a data URI.
    pub data_url: String,
}

/// A named bundle of brand resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandKit {
    /// Kit identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form voice/style notes passed to content generation.
    #[serde(default)]
    pub style_guide: String,
    /// Font families.
    #[serde(default)]
    pub fonts: Vec<String>,
    /// Colors.
    #[serde(default)]
    pub palette: Vec<String>,
    /// Layout templates.
    #[serde(default)]
    pub layouts: Vec<LayoutTemplate>,
    /// Image assets.
    #[serde(default)]
    pub assets: Vec<BrandAsset>,
}

impl BrandKit {
    /// Create an empty kit.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            style_guide: String::new(),
            fonts: Vec::new(),
            palette: Vec::new(),
            layouts: Vec::new(),
            assets: Vec::new(),
        }
    }

    /// Serialize to the export file format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> EditorResult<String> {
        serde_json::to_string_pretty(self).map_err(EditorError::Serialization)
    }

    /// Parse an export file, assigning a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidFormat`] if the document is not JSON,
    /// lacks a string `name`, lacks an array `layouts`, or has malformed
    /// entries.
    pub fn import(json: &str) -> EditorResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| EditorError::InvalidFormat(format!("not JSON: {e}")))?;
        if !value.get("name").is_some_and(Value::is_string) {
            return Err(EditorError::InvalidFormat("missing name".to_string()));
        }
        if !value.get("layouts").is_some_and(Value::is_array) {
            return Err(EditorError::InvalidFormat("missing layouts".to_string()));
        }
        let mut value = value;
        if let Value::Object(map) = &mut value {
            // Imports always get a new identity; tolerate files without one.
            map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        serde_json::from_value(value).map_err(|e| EditorError::InvalidFormat(e.to_string()))
    }

    /// Find an asset by id.
    #[must_use]
    pub fn asset(&self, id: &str) -> Option<&BrandAsset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Save a post's element stack as a template, stripping the post prefix
    /// from element ids.
    pub fn add_layout_from_post(&mut self, name: impl Into<String>, post: &Post) -> &LayoutTemplate {
        let prefix = format!("{}-", post.id);
        let elements = post
            .elements()
            .iter()
            .map(|element| {
                let raw = element.id().as_str();
                let relative = raw.strip_prefix(&prefix).unwrap_or(raw);
                element.clone().with_id(ElementId::from(relative))
            })
            .collect();
        self.layouts.push(LayoutTemplate {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            elements,
        });
        &self.layouts[self.layouts.len() - 1]
    }
}

/// Point an image element at its asset's current data URI.
fn resolve_asset(element: &mut Element, assets: &[BrandAsset]) -> bool {
    let Element::Image(image) = element else {
        return false;
    };
    let Some(asset) = image
        .asset_id
        .as_deref()
        .and_then(|id| assets.iter().find(|a| a.id == id))
    else {
        return false;
    };
    if image.src == asset.data_url {
        return false;
    }
    image.src.clone_from(&asset.data_url);
    true
}

/// Elements of a template, namespaced under `post_id` with assets resolved.
#[must_use]
pub fn instantiate_layout(
    template: &LayoutTemplate,
    post_id: &PostId,
    assets: &[BrandAsset],
) -> Vec<Element> {
    template
        .elements
        .iter()
        .map(|element| {
            let id = element.id().namespaced(post_id.as_str());
            let mut element = element.clone().with_id(id);
            resolve_asset(&mut element, assets);
            element
        })
        .collect()
}

/// Refresh asset-linked image sources. Returns the input when nothing changed.
#[must_use]
pub fn resolve_assets(post: &Post, assets: &[BrandAsset]) -> Post {
    let mut elements = post.elements().to_vec();
    let mut changed = false;
    for element in &mut elements {
        changed |= resolve_asset(element, assets);
    }
    if changed {
        post.with_elements(elements)
    } else {
        post.clone()
    }
}

/// Persistence collaborator for brand kits.
pub trait BrandKitRepository: Send + Sync {
    /// Load every saved kit.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Storage`] if the backing store fails.
    fn load_all(&self) -> EditorResult<Vec<BrandKit>>;

    /// Insert or replace a kit.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Storage`] if the backing store fails.
    fn save(&self, kit: &BrandKit) -> EditorResult<()>;

    /// Delete a kit by id.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Storage`] if the backing store fails.
    fn delete(&self, id: &str) -> EditorResult<()>;
}

/// In-process repository.
#[derive(Debug, Clone, Default)]
pub struct MemoryBrandKitRepository {
    kits: Arc<RwLock<Vec<BrandKit>>>,
}

impl MemoryBrandKitRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BrandKitRepository for MemoryBrandKitRepository {
    fn load_all(&self) -> EditorResult<Vec<BrandKit>> {
        Ok(self
            .kits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, kit: &BrandKit) -> EditorResult<()> {
        let mut kits = self.kits.write().unwrap_or_else(PoisonError::into_inner);
        match kits.iter_mut().find(|k| k.id == kit.id) {
            Some(slot) => *slot = kit.clone(),
            None => kits.push(kit.clone()),
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> EditorResult<()> {
        self.kits
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|k| k.id != id);
        Ok(())
    }
}

/// The user's brand kits, backed by a repository.
pub struct BrandKitLibrary {
    kits: Vec<BrandKit>,
    repository: Box<dyn BrandKitRepository>,
}

impl std::fmt::Debug for BrandKitLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrandKitLibrary")
            .field("kits", &self.kits.len())
            .finish_non_exhaustive()
    }
}

impl BrandKitLibrary {
    /// Load all kits from a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    pub fn load(repository: Box<dyn BrandKitRepository>) -> EditorResult<Self> {
        let kits = repository.load_all()?;
        tracing::debug!("Loaded {} brand kits", kits.len());
        Ok(Self { kits, repository })
    }

    /// All kits.
    #[must_use]
    pub fn kits(&self) -> &[BrandKit] {
        &self.kits
    }

    /// Find a kit by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BrandKit> {
        self.kits.iter().find(|k| k.id == id)
    }

    /// Insert or replace a kit and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the library is unchanged then.
    pub fn save(&mut self, kit: BrandKit) -> EditorResult<()> {
        self.repository.save(&kit)?;
        match self.kits.iter_mut().find(|k| k.id == kit.id) {
            Some(slot) => *slot = kit,
            None => self.kits.push(kit),
        }
        Ok(())
    }

    /// Delete a kit.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub fn remove(&mut self, id: &str) -> EditorResult<()> {
        self.repository.delete(id)?;
        self.kits.retain(|k| k.id != id);
        Ok(())
    }

    /// Import an export file as a new kit.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidFormat`] for malformed files; nothing is
    /// added in that case.
    pub fn import_file(&mut self, json: &str) -> EditorResult<&BrandKit> {
        let kit = BrandKit::import(json)?;
        let id = kit.id.clone();
        self.save(kit)?;
        tracing::info!("Imported brand kit {id}");
        Ok(&self.kits[self.kits.len() - 1])
    }

    /// Export a kit to its file format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_file(&self, id: &str) -> EditorResult<Option<String>> {
        self.get(id).map(BrandKit::to_json).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frame, ImageElement, ImageFilters, NewElement, PostSize};

    fn image_with_asset(id: &str, asset: &str) -> Element {
        let mut frame = Frame::new(0.0, 0.0, 100.0, 100.0);
        frame.id = ElementId::from(id);
        Element::Image(ImageElement {
            frame,
            src: "data:image/png;base64,OLD".to_string(),
            asset_id: Some(asset.to_string()),
            filters: ImageFilters::default(),
            border: None,
            blend_mode: None,
        })
    }

    fn sample_kit() -> BrandKit {
        let mut kit = BrandKit::new("Acme");
        kit.style_guide = "Friendly, short sentences.".to_string();
        kit.fonts = vec!["Montserrat".to_string()];
        kit.palette = vec!["#111827".to_string(), "#fbbf24".to_string()];
        kit.assets.push(BrandAsset {
            id: "logo".to_string(),
            name: "Logo".to_string(),
            data_url: "data:image/png;base64,NEW".to_string(),
        });
        kit.layouts.push(LayoutTemplate {
            id: "l1".to_string(),
            name: "Headline".to_string(),
            elements: vec![
                Element::create(NewElement::Text(Some("Title".into())), PostSize::SQUARE)
                    .with_id(ElementId::from("title")),
                image_with_asset("logo-img", "logo"),
            ],
        });
        kit
    }

    #[test]
    fn test_round_trip_with_fresh_id() {
        let kit = sample_kit();
        let json = kit.to_json().expect("export");
        let imported = BrandKit::import(&json).expect("import");
        assert_ne!(imported.id, kit.id);
        assert_eq!(imported.layouts, kit.layouts);
        assert_eq!(imported.palette, kit.palette);
        assert_eq!(imported.name, kit.name);
        assert_eq!(imported.assets, kit.assets);
    }

    #[test]
    fn test_import_rejects_missing_layouts() {
        let err = BrandKit::import(r#"{"name":"X"}"#).expect_err("invalid");
        assert!(matches!(err, EditorError::InvalidFormat(_)));
        assert!(err.to_string().contains("Invalid brand kit format"));
    }

    #[test]
    fn test_import_rejects_non_string_name_and_garbage() {
        assert!(BrandKit::import(r#"{"name":5,"layouts":[]}"#).is_err());
        assert!(BrandKit::import("not json").is_err());
        assert!(BrandKit::import(r#"{"name":"X","layouts":[{"bogus":true}]}"#).is_err());
    }

    #[test]
    fn test_import_minimal_file() {
        let kit = BrandKit::import(r#"{"name":"Min","layouts":[]}"#).expect("import");
        assert_eq!(kit.name, "Min");
        assert!(kit.fonts.is_empty());
        assert!(!kit.id.is_empty());
    }

    #[test]
    fn test_instantiate_namespaces_and_resolves() {
        let kit = sample_kit();
        let post_id = PostId::from("post9");
        let elements = instantiate_layout(&kit.layouts[0], &post_id, &kit.assets);
        assert_eq!(elements[0].id().as_str(), "post9-title");
        assert_eq!(elements[1].id().as_str(), "post9-logo-img");
        match &elements[1] {
            Element::Image(img) => assert_eq!(img.src, "data:image/png;base64,NEW"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_resolve_assets_keeps_revision_when_unchanged() {
        let kit = sample_kit();
        let post = Post::from_elements(PostId::from("p"), vec![image_with_asset("i", "logo")]);
        let resolved = resolve_assets(&post, &kit.assets);
        assert!(!resolved.same_revision(&post));
        let again = resolve_assets(&resolved, &kit.assets);
        assert!(again.same_revision(&resolved));
    }

    #[test]
    fn test_layout_from_post_strips_prefix() {
        let mut kit = BrandKit::new("K");
        let post = Post::from_elements(
            PostId::from("p1"),
            vec![image_with_asset("p1-hero", "logo")],
        );
        let template = kit.add_layout_from_post("Hero", &post).clone();
        assert_eq!(template.elements[0].id().as_str(), "hero");
        assert_eq!(template.elements.len(), 2);
    }

    #[test]
    fn test_library_import_and_export() {
        let repo = MemoryBrandKitRepository::new();
        let mut library = BrandKitLibrary::load(Box::new(repo.clone())).expect("load");
        assert!(library.import_file(r#"{"name":"X"}"#).is_err());
        assert!(library.kits().is_empty());

        let json = sample_kit().to_json().expect("json");
        let id = library.import_file(&json).expect("import").id.clone();
        assert_eq!(repo.load_all().expect("repo").len(), 1);

        let exported = library.export_file(&id).expect("export").expect("present");
        assert!(exported.contains("\"styleGuide\""));
        assert!(library.export_file("nope").expect("export").is_none());

        library.remove(&id).expect("remove");
        assert!(repo.load_all().expect("repo").is_empty());
    }
}
