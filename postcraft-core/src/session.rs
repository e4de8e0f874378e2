//! Editor session state.
//!
//! The session owns the post list, the active post, and the selection. It
//! replaces global application state: every editor instance holds its own
//! session. Edits replace the affected [`Post`] with a new value.

use crate::brandkit::{self, BrandKit, LayoutTemplate};
use crate::layers::{self, LayerDirection};
use crate::{
    EditorResult, Element, ElementId, ElementPatch, FontCatalog, NewElement, Post, PostId,
    PostSize,
};

/// Editing context for one user working on a set of posts.
#[derive(Debug, Clone)]
pub struct EditorSession {
    posts: Vec<Post>,
    active_post: Option<PostId>,
    selection: Option<ElementId>,
    /// Pixel size new posts and elements are laid out for.
    pub post_size: PostSize,
    /// Brand kit applied to new content.
    pub brand_kit: Option<BrandKit>,
    /// Fonts available without a network fetch.
    pub fonts: FontCatalog,
}

impl EditorSession {
    /// Create an empty session.
    #[must_use]
    pub fn new(post_size: PostSize) -> Self {
        Self {
            posts: Vec::new(),
            active_post: None,
            selection: None,
            post_size,
            brand_kit: None,
            fonts: FontCatalog::default(),
        }
    }

    /// All posts in creation order.
    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Get a post by ID.
    #[must_use]
    pub fn post(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| &p.id == id)
    }

    /// The post being edited.
    #[must_use]
    pub fn active_post(&self) -> Option<&Post> {
        self.active_post.as_ref().and_then(|id| self.post(id))
    }

    /// Switch the edited post. Clears the selection when it changes.
    pub fn set_active_post(&mut self, id: &PostId) {
        if self.post(id).is_none() || self.active_post.as_ref() == Some(id) {
            return;
        }
        self.active_post = Some(id.clone());
        self.selection = None;
    }

    /// Create a post with a placeholder background and make it active.
    pub fn create_post(&mut self) -> PostId {
        let post = Post::new();
        let id = post.id.clone();
        self.posts.push(post);
        self.set_active_post(&id);
        tracing::debug!("Created post {id}");
        id
    }

    /// Append existing posts (e.g. generated ones). The first becomes active
    /// when nothing is.
    pub fn insert_posts(&mut self, posts: Vec<Post>) {
        let first = posts.first().map(|p| p.id.clone());
        self.posts.extend(posts);
        if self.active_post.is_none() {
            if let Some(id) = first {
                self.set_active_post(&id);
            }
        }
    }

    /// Delete one post.
    pub fn delete_post(&mut self, id: &PostId) {
        self.posts.retain(|p| &p.id != id);
        self.forget_missing_active();
    }

    /// Delete every slide of a carousel.
    pub fn delete_carousel(&mut self, carousel_id: &str) {
        self.posts
            .retain(|p| p.carousel_id.as_deref() != Some(carousel_id));
        self.forget_missing_active();
    }

    fn forget_missing_active(&mut self) {
        if let Some(active) = &self.active_post {
            if !self.posts.iter().any(|p| &p.id == active) {
                self.active_post = None;
                self.selection = None;
            }
        }
    }

    /// Currently selected element.
    #[must_use]
    pub fn selection(&self) -> Option<&ElementId> {
        self.selection.as_ref()
    }

    /// Select an element of a post, making the post active.
    pub fn select(&mut self, post_id: &PostId, id: &ElementId) {
        if self.post(post_id).and_then(|p| p.get(id)).is_none() {
            return;
        }
        self.set_active_post(post_id);
        self.selection = Some(id.clone());
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.selection = None;
    }

    /// Replace one post with the result of `f`.
    fn replace_post<F>(&mut self, post_id: &PostId, f: F) -> EditorResult<Option<&Post>>
    where
        F: FnOnce(&Post) -> EditorResult<Post>,
    {
        let Some(index) = self.posts.iter().position(|p| &p.id == post_id) else {
            return Ok(None);
        };
        let updated = f(&self.posts[index])?;
        self.posts[index] = updated;
        Ok(Some(&self.posts[index]))
    }

    /// Merge partial attributes into an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch produces an invalid element.
    pub fn update_element(
        &mut self,
        post_id: &PostId,
        id: &ElementId,
        patch: &ElementPatch,
    ) -> EditorResult<()> {
        self.replace_post(post_id, |post| layers::update(post, id, patch))?;
        Ok(())
    }

    /// Add a new element above the background and select it.
    pub fn add_element(&mut self, post_id: &PostId, kind: NewElement) -> Option<ElementId> {
        let element = Element::create(kind, self.post_size);
        let id = element.id().clone();
        let added = self
            .replace_post(post_id, |post| Ok(layers::add(post, element)))
            .ok()
            .flatten()
            .is_some();
        if !added {
            return None;
        }
        self.select(post_id, &id);
        tracing::debug!("Added element {id} to post {post_id}");
        Some(id)
    }

    /// Delete an element; clears the selection if it was selected.
    pub fn remove_element(&mut self, post_id: &PostId, id: &ElementId) {
        let _ = self.replace_post(post_id, |post| Ok(layers::remove(post, id)));
        let still_present = self.post(post_id).and_then(|p| p.get(id)).is_some();
        if !still_present && self.selection.as_ref() == Some(id) {
            self.selection = None;
        }
    }

    /// Duplicate an element and select the copy.
    pub fn duplicate_element(&mut self, post_id: &PostId, id: &ElementId) -> Option<ElementId> {
        let mut new_id = None;
        let _ = self.replace_post(post_id, |post| {
            let (updated, created) = layers::duplicate(post, id);
            new_id = created;
            Ok(updated)
        });
        if let Some(created) = &new_id {
            self.select(post_id, created);
        }
        new_id
    }

    /// Drag-and-drop reorder within a post.
    pub fn reorder_elements(&mut self, post_id: &PostId, source: &ElementId, destination: &ElementId) {
        let _ = self.replace_post(post_id, |post| Ok(layers::reorder(post, source, destination)));
    }

    /// Move an element one slot up or down.
    pub fn move_element(&mut self, post_id: &PostId, id: &ElementId, direction: LayerDirection) {
        let _ = self.replace_post(post_id, |post| Ok(layers::move_one_step(post, id, direction)));
    }

    /// Show/hide an element.
    pub fn toggle_visibility(&mut self, post_id: &PostId, id: &ElementId) {
        let _ = self.replace_post(post_id, |post| Ok(layers::toggle_visibility(post, id)));
    }

    /// Lock/unlock an element.
    pub fn toggle_lock(&mut self, post_id: &PostId, id: &ElementId) {
        let _ = self.replace_post(post_id, |post| Ok(layers::toggle_lock(post, id)));
    }

    /// Give an element a display name.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name.
    pub fn rename_element(&mut self, post_id: &PostId, id: &ElementId, name: &str) -> EditorResult<()> {
        self.replace_post(post_id, |post| layers::rename(post, id, name))?;
        Ok(())
    }

    /// Store an extracted palette on a post.
    pub fn set_palette(&mut self, post_id: &PostId, palette: Vec<String>) {
        if let Some(post) = self.posts.iter_mut().find(|p| &p.id == post_id) {
            *post = post.with_palette(palette);
        }
    }

    /// Replace a post's foreground with a layout template.
    ///
    /// The post keeps its own background unless the template carries one.
    /// Asset references resolve against the active brand kit.
    pub fn apply_layout(&mut self, post_id: &PostId, template: &LayoutTemplate) {
        let assets = self
            .brand_kit
            .as_ref()
            .map(|kit| kit.assets.clone())
            .unwrap_or_default();
        let _ = self.replace_post(post_id, |post| {
            let mut elements = brandkit::instantiate_layout(template, &post.id, &assets);
            if !elements.iter().any(Element::is_background) {
                elements.push(Element::Background(post.background().clone()));
            }
            Ok(post.with_elements(elements))
        });
        if self
            .selection
            .as_ref()
            .is_some_and(|sel| self.post(post_id).and_then(|p| p.get(sel)).is_none())
        {
            self.selection = None;
        }
    }

    /// Replace a whole post value (e.g. after background regeneration).
    pub fn replace(&mut self, post: Post) {
        if let Some(slot) = self.posts.iter_mut().find(|p| p.id == post.id) {
            *slot = post;
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(PostSize::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_text_selects_and_centers() {
        let mut session = EditorSession::new(PostSize::SQUARE);
        let post_id = session.create_post();
        let id = session
            .add_element(&post_id, NewElement::Text(None))
            .expect("added");
        assert_eq!(session.selection(), Some(&id));

        let frame = session
            .post(&post_id)
            .and_then(|p| p.get(&id))
            .and_then(Element::frame)
            .cloned()
            .expect("frame");
        assert!((frame.x - (540.0 - 150.0)).abs() < f32::EPSILON);
        assert!((frame.y - (540.0 - 25.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_add_to_unknown_post_is_noop() {
        let mut session = EditorSession::default();
        assert!(session
            .add_element(&PostId::from("missing"), NewElement::Gradient)
            .is_none());
        assert!(session.selection().is_none());
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut session = EditorSession::default();
        let post_id = session.create_post();
        let id = session
            .add_element(&post_id, NewElement::Shape(crate::ShapeKind::Circle))
            .expect("added");
        session.remove_element(&post_id, &id);
        assert!(session.selection().is_none());
    }

    #[test]
    fn test_remove_other_keeps_selection() {
        let mut session = EditorSession::default();
        let post_id = session.create_post();
        let a = session.add_element(&post_id, NewElement::Gradient).expect("a");
        let b = session.add_element(&post_id, NewElement::Gradient).expect("b");
        session.remove_element(&post_id, &a);
        assert_eq!(session.selection(), Some(&b));
    }

    #[test]
    fn test_duplicate_selects_copy() {
        let mut session = EditorSession::default();
        let post_id = session.create_post();
        let id = session
            .add_element(&post_id, NewElement::QrCode(None))
            .expect("added");
        let copy = session.duplicate_element(&post_id, &id).expect("copy");
        assert_ne!(copy, id);
        assert_eq!(session.selection(), Some(&copy));
    }

    #[test]
    fn test_switching_post_clears_selection() {
        let mut session = EditorSession::default();
        let first = session.create_post();
        session.add_element(&first, NewElement::Gradient);
        let second = session.create_post();
        assert_eq!(session.active_post().map(|p| &p.id), Some(&second));
        assert!(session.selection().is_none());
    }

    #[test]
    fn test_delete_carousel() {
        let mut session = EditorSession::default();
        let mut slides = Vec::new();
        for i in 0..3 {
            let mut post = Post::new();
            post.carousel_id = Some("c1".to_string());
            post.slide_index = Some(i);
            slides.push(post);
        }
        session.insert_posts(slides);
        let single = session.create_post();
        session.delete_carousel("c1");
        assert_eq!(session.posts().len(), 1);
        assert_eq!(session.posts()[0].id, single);
    }

    #[test]
    fn test_delete_active_post_resets_state() {
        let mut session = EditorSession::default();
        let post_id = session.create_post();
        session.add_element(&post_id, NewElement::Gradient);
        session.delete_post(&post_id);
        assert!(session.active_post().is_none());
        assert!(session.selection().is_none());
    }

    #[test]
    fn test_update_changes_revision_only_when_applied() {
        let mut session = EditorSession::default();
        let post_id = session.create_post();
        let id = session.add_element(&post_id, NewElement::Gradient).expect("id");
        let before = session.post(&post_id).cloned().expect("post");

        session
            .update_element(&post_id, &ElementId::from("ghost"), &ElementPatch::position(1.0, 1.0))
            .expect("noop");
        assert!(session.post(&post_id).expect("post").same_revision(&before));

        session
            .update_element(&post_id, &id, &ElementPatch::new().set("angle", 45.0))
            .expect("update");
        assert!(!session.post(&post_id).expect("post").same_revision(&before));
    }

    #[test]
    fn test_set_palette_is_a_new_revision() {
        let mut session = EditorSession::default();
        let post_id = session.create_post();
        let before = session.post(&post_id).cloned().expect("post");

        session.set_palette(&post_id, vec!["#000000".to_string()]);
        let after = session.post(&post_id).expect("post");
        assert_eq!(after.palette.as_deref(), Some(&["#000000".to_string()][..]));
        assert!(!after.same_revision(&before));
        assert_eq!(after.elements(), before.elements());
    }
}
