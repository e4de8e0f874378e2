//! Partial element updates.
//!
//! An [`ElementPatch`] is a JSON object merged into the serialized element:
//! keys overwrite, `null` clears optional attributes, `id` and `type` are
//! never touched. The result is a new element; the input is left as is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EditorResult, Element};

/// Keys a patch may never change.
const PROTECTED_KEYS: [&str; 2] = ["id", "type"];

/// A partial set of element attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPatch(Map<String, Value>);

impl ElementPatch {
    /// Empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one attribute (camelCase wire name).
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Clear an optional attribute.
    #[must_use]
    pub fn clear(mut self, key: &str) -> Self {
        self.0.insert(key.to_string(), Value::Null);
        self
    }

    /// Move to a position.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self::new().set("x", x).set("y", y)
    }

    /// Resize to dimensions.
    #[must_use]
    pub fn size(width: f32, height: f32) -> Self {
        Self::new().set("width", width).set("height", height)
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge into `element`, producing a new element.
    ///
    /// Frame values are sanitized afterwards: sizes below one pixel become
    /// one, opacity is clamped into `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged attributes no longer form a valid
    /// element (e.g. a required attribute was cleared or mistyped).
    pub fn apply(&self, element: &Element) -> EditorResult<Element> {
        let mut value = serde_json::to_value(element)?;
        if let Value::Object(map) = &mut value {
            for (key, patch_value) in &self.0 {
                if PROTECTED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                if patch_value.is_null() {
                    map.remove(key);
                } else {
                    map.insert(key.clone(), patch_value.clone());
                }
            }
        }
        let mut patched: Element = serde_json::from_value(value)?;
        if let Some(frame) = patched.frame_mut() {
            frame.sanitize();
        }
        Ok(patched)
    }
}

impl From<Map<String, Value>> for ElementPatch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, NewElement, PostSize};

    fn text() -> Element {
        Element::create(NewElement::Text(Some("Hello".into())), PostSize::SQUARE)
    }

    #[test]
    fn test_position_patch() {
        let element = text();
        let moved = ElementPatch::position(10.0, 20.0).apply(&element).expect("apply");
        let frame = moved.frame().expect("frame");
        assert!((frame.x - 10.0).abs() < f32::EPSILON);
        assert!((frame.y - 20.0).abs() < f32::EPSILON);
        assert_eq!(moved.id(), element.id());
        // Source untouched.
        assert!((element.frame().expect("frame").x - 390.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_out_of_range_frame_values_are_clamped() {
        let patched = ElementPatch::new()
            .set("width", -50)
            .set("height", 0)
            .set("opacity", 7)
            .apply(&text())
            .expect("apply");
        let frame = patched.frame().expect("frame");
        assert!((frame.width - 1.0).abs() < f32::EPSILON);
        assert!((frame.height - 1.0).abs() < f32::EPSILON);
        assert!((frame.opacity - 1.0).abs() < f32::EPSILON);

        let faded = ElementPatch::new()
            .set("opacity", -0.5)
            .apply(&text())
            .expect("apply");
        assert!(faded.frame().expect("frame").opacity.abs() < f32::EPSILON);
    }

    #[test]
    fn test_protected_keys_ignored() {
        let element = text();
        let patched = ElementPatch::new()
            .set("id", "other")
            .set("type", "image")
            .set("content", "Changed")
            .apply(&element)
            .expect("apply");
        assert_eq!(patched.id(), element.id());
        match patched {
            Element::Text(t) => assert_eq!(t.content, "Changed"),
            other => panic!("type changed: {other:?}"),
        }
    }

    #[test]
    fn test_null_clears_optional() {
        let element = ElementPatch::new()
            .set("highlightColor", "#ff0000")
            .apply(&text())
            .expect("set");
        let cleared = ElementPatch::new()
            .clear("highlightColor")
            .apply(&element)
            .expect("clear");
        match cleared {
            Element::Text(t) => assert!(t.highlight_color.is_none()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_patch_is_error() {
        let result = ElementPatch::new().set("fontSize", "big").apply(&text());
        assert!(result.is_err());
        let result = ElementPatch::new().clear("content").apply(&text());
        assert!(result.is_err());
    }

    #[test]
    fn test_nested_patch() {
        let image = Element::create(
            NewElement::Image {
                src: "data:image/png;base64,AAAA".into(),
                asset_id: None,
            },
            PostSize::SQUARE,
        );
        let patched = ElementPatch::new()
            .set("filters", serde_json::json!({ "brightness": 1.2 }))
            .apply(&image)
            .expect("apply");
        match patched {
            Element::Image(img) => assert_eq!(img.filters.brightness, Some(1.2)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
