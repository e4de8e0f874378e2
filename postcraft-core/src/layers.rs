//! Layer stack operations.
//!
//! Every function takes a post and returns the post to keep. An unknown id,
//! or an operation the background is exempt from, gives back the input
//! unchanged (same revision); otherwise the element list is replaced.

use serde::{Deserialize, Serialize};

use crate::{markup, EditorError, EditorResult, Element, ElementId, ElementPatch, Post};

/// Offset applied to a duplicated element, in post pixels.
pub const DUPLICATE_OFFSET: f32 = 20.0;

/// Max characters of text content shown as a layer name.
const NAME_PREVIEW_CHARS: usize = 20;

/// Direction for a one-step move in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerDirection {
    /// Towards the top of the stack (index 0).
    Up,
    /// Towards the background.
    Down,
}

/// Index of a foreground element, `None` for unknown ids and the background.
fn foreground_index(post: &Post, id: &ElementId) -> Option<usize> {
    post.foreground().iter().position(|e| e.id() == id)
}

/// Insert an element directly above the background.
#[must_use]
pub fn add(post: &Post, element: Element) -> Post {
    if element.is_background() {
        return post.clone();
    }
    let mut elements = post.elements().to_vec();
    let background_index = elements.len() - 1;
    elements.insert(background_index, element);
    post.with_elements(elements)
}

/// Delete an element. The background cannot be removed.
#[must_use]
pub fn remove(post: &Post, id: &ElementId) -> Post {
    let Some(index) = foreground_index(post, id) else {
        return post.clone();
    };
    let mut elements = post.elements().to_vec();
    elements.remove(index);
    post.with_elements(elements)
}

/// Clone an element with a fresh id, offset by [`DUPLICATE_OFFSET`], placed
/// directly above the source.
///
/// Returns the new post and the clone's id.
#[must_use]
pub fn duplicate(post: &Post, id: &ElementId) -> (Post, Option<ElementId>) {
    let Some(index) = foreground_index(post, id) else {
        return (post.clone(), None);
    };
    let new_id = ElementId::new();
    let mut clone = post.elements()[index].clone().with_id(new_id.clone());
    if let Some(frame) = clone.frame_mut() {
        frame.x += DUPLICATE_OFFSET;
        frame.y += DUPLICATE_OFFSET;
        frame.name = frame.name.take().map(|name| format!("{name} copy"));
    }

    let mut elements = post.elements().to_vec();
    elements.insert(index, clone);
    (post.with_elements(elements), Some(new_id))
}

/// Drag-and-drop reorder: take `source` out, insert it before `destination`.
///
/// The background may be the destination (moves `source` to the bottom of
/// the foreground) but never the source.
#[must_use]
pub fn reorder(post: &Post, source: &ElementId, destination: &ElementId) -> Post {
    if source == destination {
        return post.clone();
    }
    let (Some(from), Some(_)) = (foreground_index(post, source), post.index_of(destination)) else {
        return post.clone();
    };

    let mut elements = post.elements().to_vec();
    let moved = elements.remove(from);
    let Some(to) = elements.iter().position(|e| e.id() == destination) else {
        return post.clone();
    };
    elements.insert(to, moved);
    post.with_elements(elements)
}

/// Swap an element with its neighbour. No-op at either end of the foreground.
#[must_use]
pub fn move_one_step(post: &Post, id: &ElementId, direction: LayerDirection) -> Post {
    let Some(index) = foreground_index(post, id) else {
        return post.clone();
    };
    let target = match direction {
        LayerDirection::Up if index > 0 => index - 1,
        LayerDirection::Down if index + 1 < post.foreground().len() => index + 1,
        _ => return post.clone(),
    };
    let mut elements = post.elements().to_vec();
    elements.swap(index, target);
    post.with_elements(elements)
}

fn update_frame(post: &Post, id: &ElementId, f: impl FnOnce(&mut crate::Frame)) -> Post {
    let Some(index) = foreground_index(post, id) else {
        return post.clone();
    };
    let mut elements = post.elements().to_vec();
    if let Some(frame) = elements[index].frame_mut() {
        f(frame);
    }
    post.with_elements(elements)
}

/// Flip the visibility flag. The background is always visible.
#[must_use]
pub fn toggle_visibility(post: &Post, id: &ElementId) -> Post {
    update_frame(post, id, |frame| frame.visible = !frame.visible)
}

/// Flip the lock flag. The background is never locked.
#[must_use]
pub fn toggle_lock(post: &Post, id: &ElementId) -> Post {
    update_frame(post, id, |frame| frame.locked = !frame.locked)
}

/// Set a display-name override.
///
/// # Errors
///
/// Returns [`EditorError::Validation`] if the name is blank.
pub fn rename(post: &Post, id: &ElementId, name: &str) -> EditorResult<Post> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EditorError::Validation(
            "Layer name cannot be empty".to_string(),
        ));
    }
    Ok(update_frame(post, id, |frame| frame.name = Some(name.to_string())))
}

/// Merge a patch into one element.
///
/// # Errors
///
/// Returns an error if the patch produces an invalid element.
pub fn update(post: &Post, id: &ElementId, patch: &ElementPatch) -> EditorResult<Post> {
    let Some(index) = post.index_of(id) else {
        return Ok(post.clone());
    };
    if patch.is_empty() {
        return Ok(post.clone());
    }
    let mut elements = post.elements().to_vec();
    elements[index] = patch.apply(&elements[index])?;
    Ok(post.with_elements(elements))
}

/// Name shown in the layer list.
#[must_use]
pub fn display_name(element: &Element) -> String {
    if let Some(name) = element.frame().and_then(|f| f.name.as_deref()) {
        return name.to_string();
    }
    match element {
        Element::Text(text) => {
            let plain = markup::strip(&text.content);
            let plain = plain.trim();
            if plain.is_empty() {
                return "Text".to_string();
            }
            let mut preview: String = plain.chars().take(NAME_PREVIEW_CHARS).collect();
            if plain.chars().count() > NAME_PREVIEW_CHARS {
                preview.push('…');
            }
            preview
        }
        Element::Image(_) => "Image".to_string(),
        Element::Gradient(_) => "Gradient".to_string(),
        Element::Shape(_) => "Shape".to_string(),
        Element::Qrcode(_) => "QR Code".to_string(),
        Element::Background(_) => "Background".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Frame, PostId, TextElement};

    fn text(id: &str) -> Element {
        let mut frame = Frame::new(100.0, 100.0, 300.0, 50.0);
        frame.id = ElementId::from(id);
        Element::Text(TextElement::new(frame, id))
    }

    fn post(ids: &[&str]) -> Post {
        Post::from_elements(PostId::from("p"), ids.iter().map(|id| text(id)).collect())
    }

    fn order(post: &Post) -> Vec<&str> {
        post.foreground().iter().map(|e| e.id().as_str()).collect()
    }

    fn background_id(post: &Post) -> ElementId {
        post.background().id.clone()
    }

    #[test]
    fn test_add_goes_above_background() {
        let base = post(&["a"]);
        let added = add(&base, text("b"));
        assert_eq!(order(&added), vec!["a", "b"]);
        assert!(added.elements().last().is_some_and(Element::is_background));
    }

    #[test]
    fn test_remove_and_background_exempt() {
        let base = post(&["a", "b"]);
        let removed = remove(&base, &ElementId::from("a"));
        assert_eq!(order(&removed), vec!["b"]);

        let same = remove(&base, &background_id(&base));
        assert!(same.same_revision(&base));

        let missing = remove(&base, &ElementId::from("zzz"));
        assert!(missing.same_revision(&base));
    }

    #[test]
    fn test_duplicate_offsets_and_is_adjacent() {
        let base = post(&["a", "b", "c"]);
        let (dup, new_id) = duplicate(&base, &ElementId::from("b"));
        let new_id = new_id.expect("duplicated");
        assert_ne!(new_id.as_str(), "b");
        let ids = order(&dup);
        assert_eq!(ids, vec!["a", new_id.as_str(), "b", "c"]);

        let frame = dup.get(&new_id).and_then(Element::frame).expect("clone");
        assert!((frame.x - 120.0).abs() < f32::EPSILON);
        assert!((frame.y - 120.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_duplicate_background_is_noop() {
        let base = post(&["a"]);
        let (same, id) = duplicate(&base, &background_id(&base));
        assert!(id.is_none());
        assert!(same.same_revision(&base));
    }

    #[test]
    fn test_reorder_inserts_before_destination() {
        let base = post(&["a", "b", "c", "d"]);
        let down = reorder(&base, &ElementId::from("a"), &ElementId::from("c"));
        assert_eq!(order(&down), vec!["b", "a", "c", "d"]);

        let up = reorder(&base, &ElementId::from("d"), &ElementId::from("b"));
        assert_eq!(order(&up), vec!["a", "d", "b", "c"]);

        let bottom = reorder(&base, &ElementId::from("a"), &background_id(&base));
        assert_eq!(order(&bottom), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_reorder_noops() {
        let base = post(&["a", "b"]);
        let bg = background_id(&base);
        assert!(reorder(&base, &bg, &ElementId::from("a")).same_revision(&base));
        assert!(reorder(&base, &ElementId::from("a"), &ElementId::from("a")).same_revision(&base));
        assert!(reorder(&base, &ElementId::from("x"), &ElementId::from("a")).same_revision(&base));
    }

    #[test]
    fn test_move_one_step_bounds() {
        let base = post(&["a", "b", "c"]);
        let up = move_one_step(&base, &ElementId::from("b"), LayerDirection::Up);
        assert_eq!(order(&up), vec!["b", "a", "c"]);
        let down = move_one_step(&base, &ElementId::from("b"), LayerDirection::Down);
        assert_eq!(order(&down), vec!["a", "c", "b"]);

        assert!(move_one_step(&base, &ElementId::from("a"), LayerDirection::Up).same_revision(&base));
        assert!(
            move_one_step(&base, &ElementId::from("c"), LayerDirection::Down).same_revision(&base)
        );
    }

    #[test]
    fn test_toggles_are_involutions() {
        let base = post(&["a"]);
        let id = ElementId::from("a");
        let hidden = toggle_visibility(&base, &id);
        assert!(!hidden.get(&id).expect("a").is_visible());
        assert_eq!(toggle_visibility(&hidden, &id), base);

        let locked = toggle_lock(&base, &id);
        assert!(locked.get(&id).expect("a").is_locked());
        assert_eq!(toggle_lock(&locked, &id), base);

        assert!(toggle_lock(&base, &background_id(&base)).same_revision(&base));
    }

    #[test]
    fn test_rename() {
        let base = post(&["a"]);
        let id = ElementId::from("a");
        let renamed = rename(&base, &id, "  Headline ").expect("rename");
        assert_eq!(display_name(renamed.get(&id).expect("a")), "Headline");
        assert!(matches!(
            rename(&base, &id, "   "),
            Err(EditorError::Validation(_))
        ));
    }

    #[test]
    fn test_display_names() {
        let mut long = TextElement::new(Frame::new(0.0, 0.0, 1.0, 1.0), "A **very** long headline for a post");
        assert_eq!(display_name(&Element::Text(long.clone())), "A very long headline…");
        long.content = "**Sale**".to_string();
        assert_eq!(display_name(&Element::Text(long)), "Sale");
        assert_eq!(display_name(&post(&[]).elements()[0]), "Background");
    }

    #[test]
    fn test_update_merges_patch() {
        let base = post(&["a"]);
        let id = ElementId::from("a");
        let moved = update(&base, &id, &ElementPatch::position(5.0, 6.0)).expect("update");
        let frame = moved.get(&id).and_then(Element::frame).expect("frame");
        assert!((frame.x - 5.0).abs() < f32::EPSILON);
        assert!(update(&base, &ElementId::from("nope"), &ElementPatch::position(1.0, 1.0))
            .expect("noop")
            .same_revision(&base));
    }
}
